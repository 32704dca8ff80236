//! Texture resources for CPU-built data.
//!
//! Clustered lighting fills plain byte buffers on the CPU and pushes them
//! into textures whole, once per frame. [`TextureDevice`] and [`GpuTexture`]
//! are that seam: create a texture of a given size and format, then replace
//! its full contents. The same device hands out the uniform buffers the
//! shaders read alongside. [`WgpuTextureDevice`] backs it with a real device,
//! [`CpuTextureDevice`] keeps the bytes in memory for headless runs.

use crate::buffer::{CpuBuffer, GpuBuffer, WgpuBuffer};
use crate::error::{HelioError, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
}

impl TextureFormat {
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub fn new(label: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.bytes_per_texel()
    }

    /// Size in bytes of one full upload.
    pub fn byte_len(&self) -> usize {
        self.bytes_per_row() as usize * self.height as usize
    }

    /// `(1 / width, 1 / height)`, for texel-center addressing in shaders.
    pub fn inv_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }
}

/// What the device can do, as far as CPU-built light textures care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    pub max_texture_dimension_2d: u32,
    /// RGBA32F textures can be sampled with filtering.
    pub float_textures_filterable: bool,
    pub max_sampled_textures: u32,
}

impl Default for DeviceCaps {
    /// The lowest common denominator: 4096 textures, 8-bit data only.
    fn default() -> Self {
        Self {
            max_texture_dimension_2d: 4096,
            float_textures_filterable: false,
            max_sampled_textures: 16,
        }
    }
}

impl DeviceCaps {
    pub fn from_wgpu(device: &wgpu::Device) -> Self {
        let limits = device.limits();
        Self {
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            float_textures_filterable: device
                .features()
                .contains(wgpu::Features::FLOAT32_FILTERABLE),
            max_sampled_textures: limits.max_sampled_textures_per_shader_stage,
        }
    }

    /// Fails when `desc` does not fit the device.
    pub fn check(&self, desc: &TextureDesc) -> Result<()> {
        let max = self.max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(HelioError::TextureTooLarge {
                label: desc.label.clone(),
                width: desc.width,
                height: desc.height,
                max,
            });
        }
        Ok(())
    }
}

/// A 2D texture whose contents are replaced wholesale.
pub trait GpuTexture {
    fn desc(&self) -> &TextureDesc;

    /// Replaces the whole texture with `data` (row-major, tightly packed).
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

pub trait TextureDevice {
    type Texture: GpuTexture;
    type Buffer: GpuBuffer;

    fn caps(&self) -> DeviceCaps;

    fn create_texture(&self, desc: TextureDesc) -> Result<Self::Texture>;

    /// A `UNIFORM | COPY_DST` buffer of `size` bytes.
    fn create_uniform_buffer(&self, label: &str, size: usize) -> Result<Self::Buffer>;
}

fn check_upload(desc: &TextureDesc, data: &[u8]) -> Result<()> {
    if data.len() != desc.byte_len() {
        return Err(HelioError::UploadSizeMismatch {
            label: desc.label.clone(),
            expected: desc.byte_len(),
            actual: data.len(),
        });
    }
    Ok(())
}

// ── CPU backend ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CpuTextureDevice {
    pub caps: DeviceCaps,
}

impl CpuTextureDevice {
    pub fn new(caps: DeviceCaps) -> Self {
        Self { caps }
    }
}

#[derive(Debug, Clone)]
pub struct CpuTexture {
    desc: TextureDesc,
    data: Vec<u8>,
    uploads: u32,
}

impl CpuTexture {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of successful [`GpuTexture::write`] calls.
    pub fn uploads(&self) -> u32 {
        self.uploads
    }
}

impl GpuTexture for CpuTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        check_upload(&self.desc, data)?;
        self.data.copy_from_slice(data);
        self.uploads += 1;
        Ok(())
    }
}

impl TextureDevice for CpuTextureDevice {
    type Texture = CpuTexture;
    type Buffer = CpuBuffer;

    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<CpuTexture> {
        self.caps.check(&desc)?;
        let data = vec![0; desc.byte_len()];
        Ok(CpuTexture {
            desc,
            data,
            uploads: 0,
        })
    }

    fn create_uniform_buffer(&self, label: &str, size: usize) -> Result<CpuBuffer> {
        Ok(CpuBuffer::new(label, size))
    }
}

// ── wgpu backend ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct WgpuTextureDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    caps: DeviceCaps,
}

impl WgpuTextureDevice {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let caps = DeviceCaps::from_wgpu(&device);
        Self { device, queue, caps }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

pub struct WgpuTexture {
    desc: TextureDesc,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    queue: Arc<wgpu::Queue>,
}

impl WgpuTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

impl GpuTexture for WgpuTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        check_upload(&self.desc, data)?;
        let size = wgpu::Extent3d {
            width: self.desc.width,
            height: self.desc.height,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.desc.bytes_per_row()),
                rows_per_image: Some(self.desc.height),
            },
            size,
        );
        Ok(())
    }
}

impl TextureDevice for WgpuTextureDevice {
    type Texture = WgpuTexture;
    type Buffer = WgpuBuffer;

    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<WgpuTexture> {
        self.caps.check(&desc)?;
        log::debug!(
            "Creating texture '{}' {}x{} {:?}",
            desc.label,
            desc.width,
            desc.height,
            desc.format
        );

        // Sampled with textureLoad / nearest filtering, no mips
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format.to_wgpu(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(WgpuTexture {
            desc,
            texture,
            view,
            queue: self.queue.clone(),
        })
    }

    fn create_uniform_buffer(&self, label: &str, size: usize) -> Result<WgpuBuffer> {
        log::debug!("Creating uniform buffer '{}' ({} bytes)", label, size);
        Ok(WgpuBuffer::new(&self.device, self.queue.clone(), label, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_device_rejects_oversized_textures() {
        let device = CpuTextureDevice::default();
        let err = device
            .create_texture(TextureDesc::new("Big", 4097, 1, TextureFormat::Rgba8Unorm))
            .unwrap_err();
        assert!(matches!(err, HelioError::TextureTooLarge { width: 4097, max: 4096, .. }));
    }

    #[test]
    fn cpu_texture_write_replaces_contents() {
        let device = CpuTextureDevice::default();
        let mut tex = device
            .create_texture(TextureDesc::new("Small", 2, 1, TextureFormat::Rgba8Unorm))
            .unwrap();
        assert_eq!(tex.data(), &[0; 8]);

        tex.write(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(tex.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(tex.uploads(), 1);

        let err = tex.write(&[0; 4]).unwrap_err();
        assert!(matches!(err, HelioError::UploadSizeMismatch { expected: 8, actual: 4, .. }));
        assert_eq!(tex.uploads(), 1);
    }

    #[test]
    fn float_formats_are_wider() {
        let desc = TextureDesc::new("F", 8, 255, TextureFormat::Rgba32Float);
        assert_eq!(desc.bytes_per_row(), 128);
        assert_eq!(desc.byte_len(), 128 * 255);
        assert_eq!(TextureFormat::Rgba16Float.bytes_per_texel(), 8);
    }
}
