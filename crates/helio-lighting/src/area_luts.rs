//! Precomputed lookup tables for area light shading.
//!
//! The asset is little-endian: an `i16` major and `i16` minor version
//! followed by two `64 x 64` RGBA tables of `f32`. Only version 0.1 exists.

use crate::Result;
use half::f16;
use helio_core::{DeviceCaps, GpuTexture, TextureDesc, TextureDevice, TextureFormat};

/// Width and height of each table.
pub const LUT_SIZE: u32 = 64;

const LUT_FLOATS: usize = (LUT_SIZE * LUT_SIZE * 4) as usize;
const HEADER_BYTES: usize = 4;
const ASSET_BYTES: usize = HEADER_BYTES + 2 * LUT_FLOATS * 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AreaLutError {
    #[error("area light LUT data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unsupported area light LUT version {major}.{minor}")]
    UnsupportedVersion { major: i16, minor: i16 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaLightLuts {
    pub lut1: Vec<f32>,
    pub lut2: Vec<f32>,
}

fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl AreaLightLuts {
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, AreaLutError> {
        if bytes.len() < HEADER_BYTES {
            return Err(AreaLutError::Truncated {
                expected: ASSET_BYTES,
                actual: bytes.len(),
            });
        }

        let major = i16::from_le_bytes([bytes[0], bytes[1]]);
        let minor = i16::from_le_bytes([bytes[2], bytes[3]]);
        if (major, minor) != (0, 1) {
            return Err(AreaLutError::UnsupportedVersion { major, minor });
        }

        if bytes.len() < ASSET_BYTES {
            return Err(AreaLutError::Truncated {
                expected: ASSET_BYTES,
                actual: bytes.len(),
            });
        }

        let (lut1, lut2) = bytes[HEADER_BYTES..ASSET_BYTES].split_at(LUT_FLOATS * 4);
        Ok(Self {
            lut1: read_f32s(lut1),
            lut2: read_f32s(lut2),
        })
    }

    /// Like [`parse`](Self::parse), but logs the failure and returns `None`
    /// so area lights are simply left out.
    pub fn load(bytes: &[u8]) -> Option<Self> {
        match Self::parse(bytes) {
            Ok(luts) => {
                log::debug!("Loaded area light LUTs ({} bytes)", bytes.len());
                Some(luts)
            }
            Err(err) => {
                log::warn!("{err}, area lights disabled");
                None
            }
        }
    }

    /// Full float when the device can filter it, half float otherwise.
    pub fn texture_format(caps: &DeviceCaps) -> TextureFormat {
        if caps.float_textures_filterable {
            TextureFormat::Rgba32Float
        } else {
            TextureFormat::Rgba16Float
        }
    }

    /// Texel data of one table in `format`.
    pub fn texel_bytes(table: &[f32], format: TextureFormat) -> Vec<u8> {
        match format {
            TextureFormat::Rgba32Float => bytemuck::cast_slice(table).to_vec(),
            TextureFormat::Rgba16Float => {
                let halves: Vec<f16> = table.iter().map(|&v| f16::from_f32(v)).collect();
                bytemuck::cast_slice(&halves).to_vec()
            }
            // values outside [0, 1] saturate
            TextureFormat::Rgba8Unorm => table
                .iter()
                .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        }
    }

    /// Creates and fills both LUT textures.
    pub fn upload<D: TextureDevice>(&self, device: &D) -> Result<(D::Texture, D::Texture)> {
        let format = Self::texture_format(&device.caps());
        let create = |label: &str, table: &[f32]| -> Result<D::Texture> {
            let mut texture = device.create_texture(TextureDesc::new(label, LUT_SIZE, LUT_SIZE, format))?;
            texture.write(&Self::texel_bytes(table, format))?;
            Ok(texture)
        };
        Ok((
            create("Area Light LUT 1", &self.lut1)?,
            create("Area Light LUT 2", &self.lut2)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_core::CpuTextureDevice;

    fn asset(major: i16, minor: i16) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ASSET_BYTES);
        bytes.extend_from_slice(&major.to_le_bytes());
        bytes.extend_from_slice(&minor.to_le_bytes());
        for i in 0..2 * LUT_FLOATS {
            bytes.extend_from_slice(&(i as f32 * 0.25).to_le_bytes());
        }
        bytes
    }

    #[test]
    fn parses_version_0_1() {
        let luts = AreaLightLuts::parse(&asset(0, 1)).unwrap();
        assert_eq!(luts.lut1.len(), LUT_FLOATS);
        assert_eq!(luts.lut1[3], 0.75);
        assert_eq!(luts.lut2[0], LUT_FLOATS as f32 * 0.25);
    }

    #[test]
    fn rejects_other_versions() {
        assert_eq!(
            AreaLightLuts::parse(&asset(1, 0)),
            Err(AreaLutError::UnsupportedVersion { major: 1, minor: 0 })
        );
        assert!(AreaLightLuts::load(&asset(0, 2)).is_none());
    }

    #[test]
    fn rejects_truncated_data() {
        let mut bytes = asset(0, 1);
        bytes.truncate(100);
        assert!(matches!(
            AreaLightLuts::parse(&bytes),
            Err(AreaLutError::Truncated { actual: 100, .. })
        ));
        assert!(AreaLightLuts::load(&[0]).is_none());
    }

    #[test]
    fn uploads_half_float_without_float_filtering() {
        let luts = AreaLightLuts::parse(&asset(0, 1)).unwrap();
        let device = CpuTextureDevice::default();
        let (lut1, _) = luts.upload(&device).unwrap();
        assert_eq!(lut1.desc().format, TextureFormat::Rgba16Float);
        // 0.25 as f16
        assert_eq!(&lut1.data()[2..4], &f16::from_f32(0.25).to_le_bytes());
    }
}
