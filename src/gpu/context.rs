use anyhow::{Result, bail};
use std::sync::{Arc, Mutex};
use winit::window::Window;

pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub adapter: wgpu::Adapter,
    device_lost: Arc<Mutex<Option<String>>>,
}

impl GpuContext {
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self> {
        // Push constants and storage textures rule out the GL backend.
        let backends = wgpu::Backends::VULKAN | wgpu::Backends::METAL | wgpu::Backends::DX12;
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No suitable GPU adapter found. PathTracer requires Vulkan, Metal, or DX12."
            )
        })?;

        let info = adapter.get_info();
        log::info!("Using GPU: {} (backend: {:?})", info.name, info.backend);

        let adapter_features = adapter.features();
        if !adapter_features.contains(wgpu::Features::PUSH_CONSTANTS) {
            bail!("GPU adapter {} does not support push constants", info.name);
        }
        let limits = adapter.limits();
        if (limits.max_push_constant_size as usize)
            < std::mem::size_of::<crate::render::accumulator::PushConstants>()
        {
            bail!(
                "GPU adapter push constant limit {} is too small",
                limits.max_push_constant_size
            );
        }
        let required_features = wgpu::Features::PUSH_CONSTANTS
            | (adapter_features & wgpu::Features::BGRA8UNORM_STORAGE);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("PathTracer Device"),
                required_features,
                required_limits: limits,
                ..Default::default()
            },
            None,
        ))?;

        let device_lost = Arc::new(Mutex::new(None));
        let lost = device_lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("GPU device lost ({reason:?}): {message}");
            if let Ok(mut slot) = lost.lock() {
                *slot = Some(message);
            }
        });

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        if !surface_caps.usages.contains(wgpu::TextureUsages::COPY_DST) {
            bail!("Surface does not accept copies (usages {:?})", surface_caps.usages);
        }
        let surface_format = choose_surface_format(&surface_caps.formats, device.features())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No surface format usable as a storage image: {:?}",
                    surface_caps.formats
                )
            })?;
        log::info!("Surface format: {surface_format:?}");

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::COPY_DST,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            adapter,
            device_lost,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    /// Reason reported by the driver if the device has been lost.
    pub fn device_lost(&self) -> Option<String> {
        self.device_lost.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn width(&self) -> u32 {
        self.surface_config.width
    }

    pub fn height(&self) -> u32 {
        self.surface_config.height
    }
}

/// The output image is copied straight into the surface, so the surface format
/// must also be a storage-image format: `Rgba8Unorm`, or `Bgra8Unorm` when the
/// device allows BGRA storage. sRGB formats are never storage-capable.
pub fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    features: wgpu::Features,
) -> Option<wgpu::TextureFormat> {
    let bgra_storage = features.contains(wgpu::Features::BGRA8UNORM_STORAGE);
    formats
        .iter()
        .copied()
        .find(|f| *f == wgpu::TextureFormat::Rgba8Unorm)
        .or_else(|| {
            formats
                .iter()
                .copied()
                .find(|f| bgra_storage && *f == wgpu::TextureFormat::Bgra8Unorm)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn test_prefers_rgba() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm, TextureFormat::Rgba8Unorm];
        assert_eq!(
            choose_surface_format(&formats, wgpu::Features::BGRA8UNORM_STORAGE),
            Some(TextureFormat::Rgba8Unorm)
        );
    }

    #[test]
    fn test_bgra_needs_storage_feature() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats, wgpu::Features::empty()), None);
        assert_eq!(
            choose_surface_format(&formats, wgpu::Features::BGRA8UNORM_STORAGE),
            Some(TextureFormat::Bgra8Unorm)
        );
    }
}
