//! Uniform buffers behind the same device seam as the textures.

use crate::error::{HelioError, Result};
use crate::texture::TextureDevice;
use bytemuck::Pod;
use std::marker::PhantomData;
use std::sync::Arc;

/// A fixed-size buffer whose contents are replaced wholesale.
pub trait GpuBuffer {
    fn label(&self) -> &str;

    fn size(&self) -> usize;

    /// Replaces the whole buffer with `data`.
    fn write(&mut self, data: &[u8]) -> Result<()>;
}

fn check_write(label: &str, size: usize, data: &[u8]) -> Result<()> {
    if data.len() != size {
        return Err(HelioError::UploadSizeMismatch {
            label: label.to_string(),
            expected: size,
            actual: data.len(),
        });
    }
    Ok(())
}

/// A uniform buffer holding exactly one `T`, rewritten whole.
pub struct UniformBuffer<T, B> {
    buffer: B,
    _phantom: PhantomData<T>,
}

impl<T: Pod, B: GpuBuffer> UniformBuffer<T, B> {
    pub fn new<D>(device: &D, label: &str) -> Result<Self>
    where
        D: TextureDevice<Buffer = B>,
    {
        let buffer = device.create_uniform_buffer(label, std::mem::size_of::<T>())?;
        Ok(Self {
            buffer,
            _phantom: PhantomData,
        })
    }

    pub fn write(&mut self, value: &T) -> Result<()> {
        self.buffer.write(bytemuck::bytes_of(value))
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}

// ── CPU backend ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CpuBuffer {
    label: String,
    data: Vec<u8>,
    writes: u32,
}

impl CpuBuffer {
    pub(crate) fn new(label: &str, size: usize) -> Self {
        Self {
            label: label.to_string(),
            data: vec![0; size],
            writes: 0,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of successful [`GpuBuffer::write`] calls.
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl GpuBuffer for CpuBuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        check_write(&self.label, self.data.len(), data)?;
        self.data.copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }
}

// ── wgpu backend ─────────────────────────────────────────────────────────────

pub struct WgpuBuffer {
    label: String,
    size: usize,
    buffer: wgpu::Buffer,
    queue: Arc<wgpu::Queue>,
}

impl WgpuBuffer {
    pub(crate) fn new(device: &wgpu::Device, queue: Arc<wgpu::Queue>, label: &str, size: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            label: label.to_string(),
            size,
            buffer,
            queue,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

impl GpuBuffer for WgpuBuffer {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> usize {
        self.size
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        check_write(&self.label, self.size, data)?;
        self.queue.write_buffer(&self.buffer, 0, data);
        Ok(())
    }
}
