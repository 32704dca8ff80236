//! Helio core types shared by the lighting crates.

pub mod bounds;
pub mod buffer;
pub mod error;
pub mod float_packing;
pub mod texture;

pub use bounds::Aabb;
pub use buffer::{CpuBuffer, GpuBuffer, UniformBuffer, WgpuBuffer};
pub use error::{HelioError, Result};
pub use texture::{
    CpuTexture, CpuTextureDevice, DeviceCaps, GpuTexture, TextureDesc, TextureDevice,
    TextureFormat, WgpuTexture, WgpuTextureDevice,
};
