use wgpu::util::DeviceExt;

use crate::constants::{ACCUM_COLOR_BYTES_PER_PIXEL, ACCUM_COUNT_BYTES_PER_PIXEL};

/// Upload view of a slice: GPU storage buffers cannot be empty, so an empty
/// slice becomes a single zeroed element the kernel never indexes.
pub fn padded<T: bytemuck::Pod>(data: &[T]) -> std::borrow::Cow<'_, [T]> {
    if data.is_empty() {
        std::borrow::Cow::Owned(vec![T::zeroed()])
    } else {
        std::borrow::Cow::Borrowed(data)
    }
}

/// Device-local, read-only storage buffer for one scene array.
pub fn create_storage_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    data: &[T],
    label: &str,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&padded(data)),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn create_uniform_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    data: &T,
    label: &str,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(data),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Zero-initialised read-write storage buffer (wgpu guarantees zeroed contents
/// on creation).
pub fn create_empty_storage_buffer(device: &wgpu::Device, size: u64, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    })
}

pub fn update_uniform_buffer<T: bytemuck::Pod>(
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    data: &T,
) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(data));
}

pub fn dispatch_size(dimension: u32, workgroup_size: u32) -> u32 {
    dimension.div_ceil(workgroup_size)
}

/// Byte sizes of the colour-sum and sample-count buffers.
pub fn accumulation_sizes(width: u32, height: u32) -> (u64, u64) {
    let pixels = width as u64 * height as u64;
    (
        pixels * ACCUM_COLOR_BYTES_PER_PIXEL,
        pixels * ACCUM_COUNT_BYTES_PER_PIXEL,
    )
}

/// Storage image the kernel writes and the frame copies to the surface.
pub fn create_output_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    (texture, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_size_rounds_up() {
        assert_eq!(dispatch_size(1, 16), 1);
        assert_eq!(dispatch_size(16, 16), 1);
        assert_eq!(dispatch_size(17, 16), 2);
        assert_eq!(dispatch_size(1080, 16), 68);
    }

    #[test]
    fn test_accumulation_sizes() {
        assert_eq!(accumulation_sizes(800, 600), (7_680_000, 1_920_000));
        assert_eq!(accumulation_sizes(1920, 1080), (33_177_600, 8_294_400));
    }

    #[test]
    fn test_padded_only_when_empty() {
        let empty: [u32; 0] = [];
        assert_eq!(padded(&empty).as_ref(), &[0u32]);
        assert_eq!(padded(&[7u32, 8]).as_ref(), &[7, 8]);
    }
}
