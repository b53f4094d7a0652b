// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::Zeroable;

use super::buffers::{
    accumulation_sizes, create_empty_storage_buffer, create_output_texture,
    create_storage_buffer, create_uniform_buffer, update_uniform_buffer,
};
use super::error::RenderError;
use super::layouts::{KernelLayouts, OUTPUT_IMAGE_BINDING, SCENE_BUFFER_LABELS};
use super::slots::{ResourceVersions, Versioned};
use crate::camera::camera::CameraUniform;
use crate::constants::MAX_FRAMES_IN_FLIGHT;
use crate::scene::SceneStore;

/// Immutable per scene version; replaced wholesale on upload.
pub struct SceneBuffers {
    buffers: [wgpu::Buffer; 7],
}

impl SceneBuffers {
    fn upload(device: &wgpu::Device, store: &SceneStore) -> Self {
        let data = store.gpu_data();
        let [spheres, materials, lights, triangles, vertices, indices, meshes] =
            SCENE_BUFFER_LABELS;
        Self {
            buffers: [
                create_storage_buffer(device, &data.spheres, spheres),
                create_storage_buffer(device, &data.materials, materials),
                create_storage_buffer(device, &data.lights, lights),
                create_storage_buffer(device, &data.triangles, triangles),
                create_storage_buffer(device, &data.vertices, vertices),
                create_storage_buffer(device, &data.indices, indices),
                create_storage_buffer(device, &data.meshes, meshes),
            ],
        }
    }
}

pub struct OutputImage {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// Colour sum and sample count. Always created, cleared and bound as a pair.
pub struct AccumulationBuffers {
    pub color: wgpu::Buffer,
    pub count: wgpu::Buffer,
    pub width: u32,
    pub height: u32,
}

impl AccumulationBuffers {
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.clear_buffer(&self.color, 0, None);
        encoder.clear_buffer(&self.count, 0, None);
    }
}

struct CameraSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct BoundGroups {
    scene: wgpu::BindGroup,
    accumulation: wgpu::BindGroup,
    versions: ResourceVersions,
}

/// Owns every GPU buffer and image the kernel reads or writes.
pub struct ResourceManager {
    layouts: KernelLayouts,
    output_format: wgpu::TextureFormat,
    scene: Versioned<SceneBuffers>,
    output: Versioned<OutputImage>,
    accumulation: Versioned<AccumulationBuffers>,
    camera_slots: Vec<CameraSlot>,
    bound: Option<BoundGroups>,
}

impl ResourceManager {
    pub fn new(
        device: &wgpu::Device,
        store: &SceneStore,
        width: u32,
        height: u32,
        output_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let layouts = KernelLayouts::new(device, output_format);
        let scene = allocate(device, "scene buffers", || SceneBuffers::upload(device, store))?;
        let output = create_output_image(device, width, height, output_format)?;
        let accumulation = create_accumulation_buffers(device, width, height)?;

        let camera_slots = allocate(device, "camera uniforms", || {
            (0..MAX_FRAMES_IN_FLIGHT)
                .map(|slot| {
                    let buffer = create_uniform_buffer(
                        device,
                        &CameraUniform::zeroed(),
                        &format!("camera uniform {slot}"),
                    );
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some(&format!("camera bind group {slot}")),
                        layout: &layouts.camera,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: buffer.as_entire_binding(),
                        }],
                    });
                    CameraSlot { buffer, bind_group }
                })
                .collect::<Vec<_>>()
        })?;

        let mut manager = Self {
            layouts,
            output_format,
            scene: Versioned::new(scene),
            output: Versioned::new(output),
            accumulation: Versioned::new(accumulation),
            camera_slots,
            bound: None,
        };
        manager.rebind_descriptors(device)?;
        Ok(manager)
    }

    /// Replaces every scene buffer. Bind groups are stale until
    /// [`rebind_descriptors`](Self::rebind_descriptors).
    pub fn upload_scene_buffers(
        &mut self,
        device: &wgpu::Device,
        store: &SceneStore,
    ) -> Result<(), RenderError> {
        let buffers = allocate(device, "scene buffers", || SceneBuffers::upload(device, store))?;
        self.scene.replace(buffers);
        log::debug!("Scene buffers uploaded (version {})", self.scene.version());
        Ok(())
    }

    /// Recreates the output image and accumulation buffers at the new size and
    /// rebinds. Waits for the device first so no submitted frame still uses them.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<ResourceVersions, RenderError> {
        device.poll(wgpu::Maintain::Wait);
        let output = create_output_image(device, width, height, self.output_format)?;
        let accumulation = create_accumulation_buffers(device, width, height)?;
        self.output.replace(output);
        self.accumulation.replace(accumulation);
        log::debug!("Resized output and accumulation to {width}x{height}");
        self.rebind_descriptors(device)
    }

    pub fn rebind_descriptors(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<ResourceVersions, RenderError> {
        let versions = self.versions();
        let (scene, accumulation) = allocate(device, "bind groups", || {
            let mut entries: Vec<wgpu::BindGroupEntry> = self
                .scene
                .buffers
                .iter()
                .enumerate()
                .map(|(binding, buffer)| wgpu::BindGroupEntry {
                    binding: binding as u32,
                    resource: buffer.as_entire_binding(),
                })
                .collect();
            entries.push(wgpu::BindGroupEntry {
                binding: OUTPUT_IMAGE_BINDING,
                resource: wgpu::BindingResource::TextureView(&self.output.view),
            });
            let scene = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("scene bind group"),
                layout: &self.layouts.scene,
                entries: &entries,
            });
            let accumulation = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("accumulation bind group"),
                layout: &self.layouts.accumulation,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.accumulation.color.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.accumulation.count.as_entire_binding(),
                    },
                ],
            });
            (scene, accumulation)
        })?;
        self.bound = Some(BoundGroups {
            scene,
            accumulation,
            versions,
        });
        Ok(versions)
    }

    pub fn write_camera(&self, queue: &wgpu::Queue, slot: usize, uniform: &CameraUniform) {
        update_uniform_buffer(queue, &self.camera_slots[slot].buffer, uniform);
    }

    pub fn versions(&self) -> ResourceVersions {
        ResourceVersions {
            scene: self.scene.version(),
            output: self.output.version(),
            accumulation: self.accumulation.version(),
        }
    }

    pub fn bound_versions(&self) -> ResourceVersions {
        self.bound
            .as_ref()
            .map(|groups| groups.versions)
            .unwrap_or_default()
    }

    pub fn layouts(&self) -> &KernelLayouts {
        &self.layouts
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn output(&self) -> &OutputImage {
        &self.output
    }

    pub fn accumulation(&self) -> &AccumulationBuffers {
        &self.accumulation
    }

    pub fn camera_bind_group(&self, slot: usize) -> &wgpu::BindGroup {
        &self.camera_slots[slot].bind_group
    }

    /// `None` until the first successful rebind.
    pub fn scene_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bound.as_ref().map(|groups| &groups.scene)
    }

    pub fn accumulation_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bound.as_ref().map(|groups| &groups.accumulation)
    }
}

pub fn create_output_image(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<OutputImage, RenderError> {
    let (texture, view) = allocate(device, "output image", || {
        create_output_texture(device, width, height, format, "output image")
    })?;
    Ok(OutputImage {
        texture,
        view,
        width,
        height,
    })
}

/// New buffers are zero-filled by wgpu, so creation doubles as the reset.
pub fn create_accumulation_buffers(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> Result<AccumulationBuffers, RenderError> {
    let (color_size, count_size) = accumulation_sizes(width, height);
    let (color, count) = allocate(device, "accumulation buffers", || {
        (
            create_empty_storage_buffer(device, color_size, "accumulation color"),
            create_empty_storage_buffer(device, count_size, "accumulation count"),
        )
    })?;
    Ok(AccumulationBuffers {
        color,
        count,
        width,
        height,
    })
}

/// Runs `create` inside out-of-memory and validation error scopes and turns a
/// captured error into a fatal [`RenderError::Allocation`].
fn allocate<T>(
    device: &wgpu::Device,
    resource: &str,
    create: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match out_of_memory.or(validation) {
        Some(err) => Err(RenderError::Allocation {
            resource: resource.to_string(),
            message: err.to_string(),
        }),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::material::Material;
    use crate::scene::primitives::Sphere;
    use glam::Vec3;

    fn headless() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
    }

    fn read_back(device: &wgpu::Device, queue: &wgpu::Queue, buffer: &wgpu::Buffer) -> Vec<u8> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback"),
            size: buffer.size(),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, buffer.size());
        queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        slice.map_async(wgpu::MapMode::Read, |result| result.unwrap());
        device.poll(wgpu::Maintain::Wait);
        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        bytes
    }

    fn scene() -> SceneStore {
        let mut store = SceneStore::new();
        let lamp = store.add_material(Material::emissive([1.0; 3], 5.0));
        store.add_sphere(Sphere::new(Vec3::ZERO, 1.0, lamp));
        store
    }

    #[test]
    fn test_resize_twice_is_idempotent_and_zeroed() {
        let Some((device, queue)) = headless() else {
            return;
        };
        let format = wgpu::TextureFormat::Rgba8Unorm;
        let mut resources = ResourceManager::new(&device, &scene(), 16, 8, format).unwrap();

        let first = resources.resize(&device, 64, 32).unwrap();
        let sizes = (
            resources.accumulation().color.size(),
            resources.accumulation().count.size(),
        );
        assert_eq!(sizes, accumulation_sizes(64, 32));

        // Dirty the buffers, then resize to the same size again.
        queue.write_buffer(&resources.accumulation().color, 0, &[0xAB; 64]);
        queue.write_buffer(&resources.accumulation().count, 0, &[0xCD; 64]);
        let second = resources.resize(&device, 64, 32).unwrap();

        let accumulation = resources.accumulation();
        assert_eq!((accumulation.color.size(), accumulation.count.size()), sizes);
        assert!(read_back(&device, &queue, &accumulation.color).iter().all(|&b| b == 0));
        assert!(read_back(&device, &queue, &accumulation.count).iter().all(|&b| b == 0));
        assert_eq!(resources.output().width, 64);
        assert_eq!(resources.output().height, 32);

        assert!(second.accumulation > first.accumulation);
        assert!(second.output > first.output);
        assert_eq!(second.scene, first.scene);
        assert_eq!(resources.bound_versions(), resources.versions());
    }

    #[test]
    fn test_upload_marks_bindings_stale_until_rebind() {
        let Some((device, _queue)) = headless() else {
            return;
        };
        let mut resources =
            ResourceManager::new(&device, &scene(), 8, 8, wgpu::TextureFormat::Rgba8Unorm)
                .unwrap();
        assert_eq!(resources.bound_versions(), resources.versions());

        resources.upload_scene_buffers(&device, &SceneStore::new()).unwrap();
        assert_ne!(resources.bound_versions(), resources.versions());

        resources.rebind_descriptors(&device).unwrap();
        assert_eq!(resources.bound_versions(), resources.versions());
        assert!(resources.scene_bind_group().is_some());
    }

    #[test]
    fn test_oversized_allocation_is_fatal() {
        let Some((device, _queue)) = headless() else {
            return;
        };
        let huge = device.limits().max_buffer_size.saturating_add(1);
        let result = allocate(&device, "huge", || {
            create_empty_storage_buffer(&device, huge, "huge")
        });
        assert!(matches!(result, Err(RenderError::Allocation { .. })));
    }
}
