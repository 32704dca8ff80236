//! Per-light data rows for the light textures.
//!
//! Row `i` of each texture describes the light with grid index `i`. Fields
//! that tolerate 8 bits (flags, color, cone angles, shadow bias, cookie
//! data) always live in the RGBA8 texture. Positions, directions, matrices
//! and area axes go to an RGBA32F texture when the device can sample one,
//! otherwise they are packed into extra RGBA8 texels.

use super::collect::{ClusterBounds, CompressionLimits, COMPRESSION_EPSILON, MAX_LIGHTS};
use super::config::ClusteredLightingConfig;
use super::layout::{texel8, texel8_row_width, texel_float};
use crate::lights::{CookieChannel, Light, LightKind, LightMask};
use glam::{Vec3, Vec4};
use helio_core::float_packing::{float_to_bytes, float_to_bytes_range, float_to_mantissa_exponent};
use helio_core::{DeviceCaps, TextureDesc, TextureFormat};

/// Shadow bias is stored over this range.
pub const SHADOW_BIAS_RANGE: (f32, f32) = (-1.0, 20.0);

/// Range of the rotation and translation part of stored projection matrices.
pub const PROJ_MATRIX_RANGE: (f32, f32) = (-2.0, 2.0);

/// Which texture carries the high precision light fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightTextureFormat {
    Unorm8,
    Float,
}

impl LightTextureFormat {
    /// Float needs filterable float textures and room to bind both light
    /// textures next to everything else.
    pub fn select(caps: &DeviceCaps) -> Self {
        if caps.float_textures_filterable && caps.max_sampled_textures > 8 {
            LightTextureFormat::Float
        } else {
            LightTextureFormat::Unorm8
        }
    }
}

/// Maps a cosine or direction component from `[-1, 1]` into `[0, 1)`.
fn signed_to_unit(value: f32) -> f32 {
    value * (0.5 - COMPRESSION_EPSILON) + 0.5
}

/// CPU side contents of the light textures.
#[derive(Debug, Clone)]
pub struct LightsBuffer {
    format: LightTextureFormat,
    width8: u32,
    data8: Vec<u8>,
    data_float: Vec<f32>,

    bounds_min: Vec3,
    inv_bounds_delta: Vec3,
    inv_max_color_value: f32,
    inv_max_attenuation: f32,

    shadows_enabled: bool,
    cookies_enabled: bool,
    area_lights_enabled: bool,
    gamma_correction: bool,
}

impl LightsBuffer {
    pub fn new(format: LightTextureFormat) -> Self {
        let width8 = texel8_row_width(format);
        let data_float = match format {
            LightTextureFormat::Float => vec![0.0; (texel_float::COUNT as usize) * MAX_LIGHTS * 4],
            LightTextureFormat::Unorm8 => Vec::new(),
        };
        let defaults = ClusteredLightingConfig::default();

        Self {
            format,
            width8,
            data8: vec![0; width8 as usize * MAX_LIGHTS * 4],
            data_float,
            bounds_min: Vec3::ZERO,
            inv_bounds_delta: Vec3::ONE,
            inv_max_color_value: 1.0,
            inv_max_attenuation: 1.0,
            shadows_enabled: defaults.shadows_enabled,
            cookies_enabled: defaults.cookies_enabled,
            area_lights_enabled: defaults.area_lights_enabled,
            gamma_correction: defaults.gamma_correction,
        }
    }

    pub fn format(&self) -> LightTextureFormat {
        self.format
    }

    pub fn set_features(&mut self, config: &ClusteredLightingConfig) {
        self.shadows_enabled = config.shadows_enabled;
        self.cookies_enabled = config.cookies_enabled;
        self.area_lights_enabled = config.area_lights_enabled;
        self.gamma_correction = config.gamma_correction;
    }

    pub fn set_bounds(&mut self, bounds: &ClusterBounds) {
        self.bounds_min = bounds.min;
        self.inv_bounds_delta = bounds.inv_delta();
    }

    pub fn set_compression_ranges(&mut self, limits: &CompressionLimits) {
        self.inv_max_color_value = limits.inv_max_color_value();
        self.inv_max_attenuation = limits.inv_max_attenuation();
    }

    pub fn texture8_desc(&self, label: &str) -> TextureDesc {
        TextureDesc::new(
            format!("{label} Lights 8bit"),
            self.width8,
            MAX_LIGHTS as u32,
            TextureFormat::Rgba8Unorm,
        )
    }

    pub fn texture_float_desc(&self, label: &str) -> Option<TextureDesc> {
        (self.format == LightTextureFormat::Float).then(|| {
            TextureDesc::new(
                format!("{label} Lights Float"),
                texel_float::COUNT,
                MAX_LIGHTS as u32,
                TextureFormat::Rgba32Float,
            )
        })
    }

    /// `(1/float_width, 1/float_height, 1/8bit_width, 1/8bit_height)`.
    /// The float half is zero without a float texture.
    pub fn inv_size(&self) -> Vec4 {
        let rows = 1.0 / MAX_LIGHTS as f32;
        let float = match self.format {
            LightTextureFormat::Float => [1.0 / texel_float::COUNT as f32, rows],
            LightTextureFormat::Unorm8 => [0.0, 0.0],
        };
        Vec4::new(float[0], float[1], 1.0 / self.width8 as f32, rows)
    }

    pub fn data8(&self) -> &[u8] {
        &self.data8
    }

    /// Empty without a float texture.
    pub fn data_float(&self) -> &[f32] {
        &self.data_float
    }

    /// Four bytes of the given texel in row `index` of the 8-bit texture.
    pub fn texel8(&self, index: u8, offset: u32) -> &[u8] {
        let start = self.texel8_start(index, offset);
        &self.data8[start..start + 4]
    }

    /// Four floats of the given texel in row `index` of the float texture.
    pub fn texel_float(&self, index: u8, offset: u32) -> &[f32] {
        let start = (index as usize * texel_float::COUNT as usize + offset as usize) * 4;
        &self.data_float[start..start + 4]
    }

    fn texel8_start(&self, index: u8, offset: u32) -> usize {
        (index as usize * self.width8 as usize + offset as usize) * 4
    }

    fn texel8_mut(&mut self, index: u8, offset: u32) -> &mut [u8] {
        let start = self.texel8_start(index, offset);
        &mut self.data8[start..start + 4]
    }

    fn write_float(&mut self, index: u8, offset: u32, value: Vec4) {
        let start = (index as usize * texel_float::COUNT as usize + offset as usize) * 4;
        self.data_float[start..start + 4].copy_from_slice(&value.to_array());
    }

    fn clear_row(&mut self, index: u8) {
        let start = self.texel8_start(index, 0);
        let len = self.width8 as usize * 4;
        self.data8[start..start + len].fill(0);

        if self.format == LightTextureFormat::Float {
            let row = texel_float::COUNT as usize * 4;
            let start = index as usize * row;
            self.data_float[start..start + row].fill(0.0);
        }
    }

    /// Encodes `light` into row `index`. Row 0 is reserved and ignored.
    pub fn add_light_data(&mut self, light: &Light, index: u8) {
        if index == 0 || index as usize >= MAX_LIGHTS {
            return;
        }
        self.clear_row(index);

        let is_spot = light.kind == LightKind::Spot;
        let atlas = light.atlas.as_ref();
        let cast_shadows = self.shadows_enabled && light.cast_shadows && atlas.is_some();
        let cookie = if self.cookies_enabled && atlas.is_some() {
            light.cookie.as_ref()
        } else {
            None
        };
        let is_area = self.area_lights_enabled && light.shape.is_area();

        self.add_flags(light, index, is_spot, cast_shadows);
        self.add_color(light, index, cookie.is_some());
        if is_spot {
            self.add_spot_angles(light, index);
        }
        if cast_shadows {
            self.add_shadow_bias(light, index);
        }
        if let Some(cookie) = cookie {
            self.add_cookie(cookie.intensity, cookie.channel, index);
        }

        // spot lights project through a matrix, omni lights through their atlas slot
        let matrix = match (is_spot, atlas) {
            (true, Some(atlas)) if cast_shadows => Some(atlas.shadow_matrix),
            (true, Some(atlas)) if cookie.is_some() => Some(atlas.cookie_matrix),
            _ => None,
        };
        let viewport = match atlas {
            Some(atlas) if !is_spot && (cast_shadows || cookie.is_some()) => Some(atlas.viewport),
            _ => None,
        };

        let position = light.position();
        let direction = light.spot_direction();
        let area_axes = is_area.then(|| light.area_half_axes());

        match self.format {
            LightTextureFormat::Float => {
                self.write_float(
                    index,
                    texel_float::POSITION_RANGE,
                    position.extend(light.attenuation_end),
                );
                if is_spot {
                    self.write_float(index, texel_float::SPOT_DIRECTION, direction.extend(0.0));
                }
                if let Some(matrix) = matrix {
                    let cols = matrix.to_cols_array_2d();
                    for (i, col) in cols.iter().enumerate() {
                        self.write_float(index, texel_float::PROJ_MAT_0 + i as u32, Vec4::from_array(*col));
                    }
                }
                if let Some(viewport) = viewport {
                    self.write_float(
                        index,
                        texel_float::ATLAS_VIEWPORT,
                        Vec4::new(viewport.x, viewport.y, viewport.z / 3.0, 0.0),
                    );
                }
                if let Some((half_width, half_height)) = area_axes {
                    self.write_float(index, texel_float::AREA_DATA_WIDTH, half_width.extend(0.0));
                    self.write_float(index, texel_float::AREA_DATA_HEIGHT, half_height.extend(0.0));
                }
            }
            LightTextureFormat::Unorm8 => {
                let normalized = (position - self.bounds_min) * self.inv_bounds_delta;
                float_to_bytes(normalized.x, self.texel8_mut(index, texel8::POSITION_X));
                float_to_bytes(normalized.y, self.texel8_mut(index, texel8::POSITION_Y));
                float_to_bytes(normalized.z, self.texel8_mut(index, texel8::POSITION_Z));

                let range = light.attenuation_end * self.inv_max_attenuation;
                float_to_bytes(range, self.texel8_mut(index, texel8::RANGE));

                if is_spot {
                    float_to_bytes(signed_to_unit(direction.x), self.texel8_mut(index, texel8::SPOT_DIRECTION_X));
                    float_to_bytes(signed_to_unit(direction.y), self.texel8_mut(index, texel8::SPOT_DIRECTION_Y));
                    float_to_bytes(signed_to_unit(direction.z), self.texel8_mut(index, texel8::SPOT_DIRECTION_Z));
                }

                if let Some(matrix) = matrix {
                    let (min, max) = PROJ_MATRIX_RANGE;
                    for (i, value) in matrix.to_cols_array().into_iter().enumerate() {
                        let texel = self.texel8_mut(index, texel8::PROJ_MAT_00 + i as u32);
                        if i < 12 {
                            float_to_bytes_range(value, min, max, texel);
                        } else {
                            float_to_mantissa_exponent(value, texel);
                        }
                    }
                }

                if let Some(viewport) = viewport {
                    let texel = self.texel8_mut(index, texel8::ATLAS_VIEWPORT_A);
                    float_to_bytes(viewport.x, &mut texel[0..2]);
                    float_to_bytes(viewport.y, &mut texel[2..4]);
                    let texel = self.texel8_mut(index, texel8::ATLAS_VIEWPORT_B);
                    float_to_bytes(viewport.z / 3.0, &mut texel[0..2]);
                }

                if let Some((half_width, half_height)) = area_axes {
                    let axes = [
                        (texel8::AREA_DATA_WIDTH_X, half_width),
                        (texel8::AREA_DATA_HEIGHT_X, half_height),
                    ];
                    for (first, axis) in axes {
                        for (i, value) in axis.to_array().into_iter().enumerate() {
                            float_to_mantissa_exponent(value, self.texel8_mut(index, first + i as u32));
                        }
                    }
                }
            }
        }
    }

    fn add_flags(&mut self, light: &Light, index: u8, is_spot: bool, cast_shadows: bool) {
        let shadow_intensity = if cast_shadows {
            (light.shadow.intensity.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            0
        };
        let texel = self.texel8_mut(index, texel8::FLAGS);
        texel[0] = if is_spot { 255 } else { 0 };
        texel[1] = light.shape.index() * 64;
        texel[2] = light.falloff.index() * 255;
        texel[3] = shadow_intensity;
    }

    fn add_color(&mut self, light: &Light, index: u8, has_cookie: bool) {
        let color = light.color(self.gamma_correction) * self.inv_max_color_value;

        let texel = self.texel8_mut(index, texel8::COLOR_A);
        float_to_bytes(color.x, &mut texel[0..2]);
        float_to_bytes(color.y, &mut texel[2..4]);

        let texel = self.texel8_mut(index, texel8::COLOR_B);
        float_to_bytes(color.z, &mut texel[0..2]);
        texel[2] = if has_cookie { 255 } else { 0 };

        let dynamic = light.mask.contains(LightMask::AFFECT_DYNAMIC);
        let lightmapped = light.mask.contains(LightMask::AFFECT_LIGHTMAPPED);
        texel[3] = match (dynamic, lightmapped) {
            (true, true) => 127,
            (false, true) => 255,
            _ => 0,
        };
    }

    fn add_spot_angles(&mut self, light: &Light, index: u8) {
        let inner = signed_to_unit(light.inner_cone_cos());
        let outer = signed_to_unit(light.outer_cone_cos());
        let texel = self.texel8_mut(index, texel8::SPOT_ANGLES);
        float_to_bytes(inner, &mut texel[0..2]);
        float_to_bytes(outer, &mut texel[2..4]);
    }

    fn add_shadow_bias(&mut self, light: &Light, index: u8) {
        let (min, max) = SHADOW_BIAS_RANGE;
        let bias = light.shadow.bias;
        let normal_bias = light.shadow.normal_bias;
        let texel = self.texel8_mut(index, texel8::SHADOW_BIAS);
        float_to_bytes_range(bias, min, max, &mut texel[0..2]);
        float_to_bytes(normal_bias, &mut texel[2..4]);
    }

    fn add_cookie(&mut self, intensity: f32, channel: CookieChannel, index: u8) {
        let texel = self.texel8_mut(index, texel8::COOKIE_A);
        texel[0] = (intensity.clamp(0.0, 1.0) * 255.0).floor() as u8;
        texel[1] = if channel == CookieChannel::Rgb { 255 } else { 0 };

        let mask = match channel {
            CookieChannel::Rgb => return,
            CookieChannel::R => [255, 0, 0, 0],
            CookieChannel::G => [0, 255, 0, 0],
            CookieChannel::B => [0, 0, 255, 0],
            CookieChannel::A => [0, 0, 0, 255],
        };
        self.texel8_mut(index, texel8::COOKIE_B).copy_from_slice(&mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{Cookie, LightAtlasData, LightShape, ShadowParams};
    use glam::{Mat4, Quat};
    use helio_core::float_packing::{bytes_to_float, bytes_to_float_range, mantissa_exponent_to_float};
    use helio_core::Aabb;

    const EPS4: f32 = 1.0e-6;
    const EPS2: f32 = 1.0 / 65025.0 + 1.0e-6;

    fn buffer(format: LightTextureFormat, config: &ClusteredLightingConfig) -> LightsBuffer {
        let mut buffer = LightsBuffer::new(format);
        buffer.set_features(config);
        buffer.set_bounds(&ClusterBounds::from_aabb(Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0))));
        buffer.set_compression_ranges(&CompressionLimits {
            max_attenuation: 20.0,
            max_color_value: 4.0,
        });
        buffer
    }

    #[test]
    fn format_selection() {
        let mut caps = DeviceCaps::default();
        assert_eq!(LightTextureFormat::select(&caps), LightTextureFormat::Unorm8);
        caps.float_textures_filterable = true;
        assert_eq!(LightTextureFormat::select(&caps), LightTextureFormat::Float);
        caps.max_sampled_textures = 8;
        assert_eq!(LightTextureFormat::select(&caps), LightTextureFormat::Unorm8);
    }

    #[test]
    fn texture_sizes() {
        let buffer = LightsBuffer::new(LightTextureFormat::Float);
        let desc = buffer.texture8_desc("World");
        assert_eq!((desc.width, desc.height), (7, 255));
        assert_eq!(buffer.data8().len(), desc.byte_len());
        let desc = buffer.texture_float_desc("World").unwrap();
        assert_eq!((desc.width, desc.height), (8, 255));
        assert_eq!(buffer.data_float().len() * 4, desc.byte_len());

        let buffer = LightsBuffer::new(LightTextureFormat::Unorm8);
        assert_eq!(buffer.texture8_desc("World").width, 36);
        assert!(buffer.texture_float_desc("World").is_none());
        assert_eq!(buffer.inv_size(), Vec4::new(0.0, 0.0, 1.0 / 36.0, 1.0 / 255.0));
    }

    #[test]
    fn omni_light_8bit_round_trip() {
        let config = ClusteredLightingConfig::default().with_gamma_correction(false);
        let mut buffer = buffer(LightTextureFormat::Unorm8, &config);
        let light = Light::omni(Vec3::new(2.5, -7.0, 0.1), 6.0)
            .with_color(Vec3::new(1.0, 0.25, 0.5), 2.0)
            .with_mask(LightMask::AFFECT_DYNAMIC | LightMask::AFFECT_LIGHTMAPPED);
        buffer.add_light_data(&light, 3);

        assert_eq!(buffer.texel8(3, texel8::FLAGS), &[0, 0, 0, 0]);

        let color_a = buffer.texel8(3, texel8::COLOR_A);
        let color_b = buffer.texel8(3, texel8::COLOR_B);
        assert!((bytes_to_float(&color_a[0..2]) * 4.0 - 2.0).abs() < EPS2 * 4.0);
        assert!((bytes_to_float(&color_a[2..4]) * 4.0 - 0.5).abs() < EPS2 * 4.0);
        assert!((bytes_to_float(&color_b[0..2]) * 4.0 - 1.0).abs() < EPS2 * 4.0);
        assert_eq!(color_b[2..4], [0, 127]);

        let x = bytes_to_float(buffer.texel8(3, texel8::POSITION_X)) * 20.0 - 10.0;
        let y = bytes_to_float(buffer.texel8(3, texel8::POSITION_Y)) * 20.0 - 10.0;
        let z = bytes_to_float(buffer.texel8(3, texel8::POSITION_Z)) * 20.0 - 10.0;
        assert!((Vec3::new(x, y, z) - light.position()).length() < 1e-4);

        let range = bytes_to_float(buffer.texel8(3, texel8::RANGE)) * 20.0;
        assert!((range - 6.0).abs() < 1e-4);

        // no atlas slot, so nothing projected
        assert_eq!(buffer.texel8(3, texel8::ATLAS_VIEWPORT_A), &[0, 0, 0, 0]);
    }

    #[test]
    fn shadowed_spot_light_8bit() {
        let config = ClusteredLightingConfig::default();
        let mut buffer = buffer(LightTextureFormat::Unorm8, &config);

        let shadow_matrix = Mat4::from_cols_array(&[
            0.5, 0.0, 0.0, 0.0, //
            0.0, 0.5, 0.0, 0.0, //
            0.0, 0.0, -1.0, -1.0, //
            0.25, -0.75, 12.0, 1500.0,
        ]);
        let rotation = Quat::from_rotation_x(0.7);
        let light = Light::spot(Vec3::ZERO, rotation, 5.0, 20.0, 35.0)
            .with_shadows(ShadowParams {
                bias: 0.4,
                normal_bias: 0.3,
                intensity: 0.5,
            })
            .with_atlas(LightAtlasData {
                shadow_matrix,
                ..Default::default()
            });
        buffer.add_light_data(&light, 1);

        assert_eq!(buffer.texel8(1, texel8::FLAGS), &[255, 0, 0, 128]);

        let angles = buffer.texel8(1, texel8::SPOT_ANGLES);
        let inner = bytes_to_float(&angles[0..2]);
        let outer = bytes_to_float(&angles[2..4]);
        assert!((inner - signed_to_unit(20f32.to_radians().cos())).abs() < EPS2);
        assert!((outer - signed_to_unit(35f32.to_radians().cos())).abs() < EPS2);

        let bias = buffer.texel8(1, texel8::SHADOW_BIAS);
        assert!((bytes_to_float_range(&bias[0..2], -1.0, 20.0) - 0.4).abs() < 21.0 * EPS2);
        assert!((bytes_to_float(&bias[2..4]) - 0.3).abs() < EPS2);

        let decode_dir = |offset| bytes_to_float(buffer.texel8(1, offset)) * 2.0 - 1.0;
        let direction = Vec3::new(
            decode_dir(texel8::SPOT_DIRECTION_X),
            decode_dir(texel8::SPOT_DIRECTION_Y),
            decode_dir(texel8::SPOT_DIRECTION_Z),
        );
        assert!((direction - light.spot_direction()).length() < 1e-4);

        let expected = shadow_matrix.to_cols_array();
        for (i, value) in expected.iter().enumerate() {
            let texel = buffer.texel8(1, texel8::PROJ_MAT_00 + i as u32);
            let decoded = if i < 12 {
                bytes_to_float_range(texel, -2.0, 2.0)
            } else {
                mantissa_exponent_to_float(texel)
            };
            assert!((decoded - value).abs() <= value.abs() * 1e-4 + 1e-5, "entry {i}");
        }
    }

    #[test]
    fn omni_cookie_viewport_and_mask() {
        let config = ClusteredLightingConfig::default().with_cookies(true).with_shadows(false);
        let mut buffer = buffer(LightTextureFormat::Unorm8, &config);
        let light = Light::omni(Vec3::ZERO, 2.0)
            .with_mask(LightMask::AFFECT_LIGHTMAPPED)
            .with_shadows(ShadowParams::default())
            .with_cookie(Cookie {
                intensity: 0.5,
                channel: CookieChannel::G,
            })
            .with_atlas(LightAtlasData {
                viewport: Vec4::new(0.25, 0.5, 0.375, 0.375),
                ..Default::default()
            });
        buffer.add_light_data(&light, 2);

        // shadows disabled by config
        assert_eq!(buffer.texel8(2, texel8::FLAGS)[3], 0);
        assert_eq!(buffer.texel8(2, texel8::SHADOW_BIAS), &[0, 0, 0, 0]);

        assert_eq!(buffer.texel8(2, texel8::COLOR_B)[2..4], [255, 255]);
        assert_eq!(buffer.texel8(2, texel8::COOKIE_A), &[127, 0, 0, 0]);
        assert_eq!(buffer.texel8(2, texel8::COOKIE_B), &[0, 255, 0, 0]);

        let a = buffer.texel8(2, texel8::ATLAS_VIEWPORT_A);
        let b = buffer.texel8(2, texel8::ATLAS_VIEWPORT_B);
        assert!((bytes_to_float(&a[0..2]) - 0.25).abs() < EPS2);
        assert!((bytes_to_float(&a[2..4]) - 0.5).abs() < EPS2);
        assert!((bytes_to_float(&b[0..2]) - 0.125).abs() < EPS2);
    }

    #[test]
    fn cookie_needs_atlas_slot() {
        let config = ClusteredLightingConfig::default().with_cookies(true);
        let mut buffer = buffer(LightTextureFormat::Unorm8, &config);
        let light = Light::omni(Vec3::ZERO, 2.0).with_cookie(Cookie::default());
        buffer.add_light_data(&light, 1);
        assert_eq!(buffer.texel8(1, texel8::COLOR_B)[2], 0);
        assert_eq!(buffer.texel8(1, texel8::COOKIE_A), &[0, 0, 0, 0]);
    }

    #[test]
    fn area_light_axes() {
        let config = ClusteredLightingConfig::default().with_area_lights(true);
        let mut light = Light::omni(Vec3::ZERO, 3.0).with_shape(LightShape::Rect);
        light.world_transform = Mat4::from_scale(Vec3::new(3.0, 1.0, 5.0));

        let mut buffer8 = buffer(LightTextureFormat::Unorm8, &config);
        buffer8.add_light_data(&light, 4);
        assert_eq!(buffer8.texel8(4, texel8::FLAGS)[1], 64);
        let width_x = mantissa_exponent_to_float(buffer8.texel8(4, texel8::AREA_DATA_WIDTH_X));
        let height_z = mantissa_exponent_to_float(buffer8.texel8(4, texel8::AREA_DATA_HEIGHT_Z));
        assert!((width_x + 1.5).abs() < 1e-4);
        assert!((height_z - 2.5).abs() < 1e-4);

        let mut buffer_f = buffer(LightTextureFormat::Float, &config);
        buffer_f.add_light_data(&light, 4);
        assert_eq!(buffer_f.texel_float(4, texel_float::AREA_DATA_WIDTH), &[-1.5, 0.0, 0.0, 0.0]);
        assert_eq!(buffer_f.texel_float(4, texel_float::AREA_DATA_HEIGHT), &[0.0, 0.0, 2.5, 0.0]);
    }

    #[test]
    fn float_path_stores_raw_values() {
        let config = ClusteredLightingConfig::default();
        let mut buffer = buffer(LightTextureFormat::Float, &config);
        let cookie_matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let light = Light::spot(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, 7.0, 10.0, 20.0)
            .with_cookie(Cookie::default())
            .with_atlas(LightAtlasData {
                cookie_matrix,
                ..Default::default()
            });

        // cookies are off in the default config
        buffer.add_light_data(&light, 5);
        assert_eq!(buffer.texel_float(5, texel_float::POSITION_RANGE), &[1.0, 2.0, 3.0, 7.0]);
        assert_eq!(buffer.texel_float(5, texel_float::SPOT_DIRECTION), &[0.0, -1.0, 0.0, 0.0]);
        assert_eq!(buffer.texel_float(5, texel_float::PROJ_MAT_3), &[0.0, 0.0, 0.0, 0.0]);

        buffer.set_features(&config.clone().with_cookies(true));
        buffer.add_light_data(&light, 5);
        assert_eq!(buffer.texel_float(5, texel_float::PROJ_MAT_3), &[1.0, 2.0, 3.0, 1.0]);
        assert_eq!(buffer.texel_float(5, texel_float::PROJ_MAT_0), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn rows_are_rewritten_from_scratch() {
        let config = ClusteredLightingConfig::default();
        let mut buffer = buffer(LightTextureFormat::Unorm8, &config);
        let spot = Light::spot(Vec3::ZERO, Quat::IDENTITY, 1.0, 10.0, 20.0);
        buffer.add_light_data(&spot, 1);
        assert_ne!(buffer.texel8(1, texel8::SPOT_ANGLES), &[0, 0, 0, 0]);

        buffer.add_light_data(&Light::omni(Vec3::ZERO, 1.0), 1);
        assert_eq!(buffer.texel8(1, texel8::SPOT_ANGLES), &[0, 0, 0, 0]);
        assert_eq!(buffer.texel8(1, texel8::SPOT_DIRECTION_Y), &[0, 0, 0, 0]);

        // the sentinel row is never written
        buffer.add_light_data(&spot, 0);
        assert!(buffer.data8()[..36 * 4].iter().all(|&b| b == 0));
    }

    #[test]
    fn brightest_and_farthest_light_keeps_its_values() {
        let config = ClusteredLightingConfig::default();
        let light = Light::omni(Vec3::ZERO, 100.0).with_color(Vec3::ONE, 100.0);
        let lights = vec![light.clone()];
        let mut pool = crate::clustered::ClusterLightPool::new();
        pool.collect(&lights);
        let limits = CompressionLimits::evaluate(&pool, &lights, config.gamma_correction);

        let mut buffer = buffer(LightTextureFormat::Unorm8, &config);
        buffer.set_compression_ranges(&limits);
        buffer.add_light_data(&light, 1);

        let range = bytes_to_float(buffer.texel8(1, texel8::RANGE)) * limits.max_attenuation;
        assert!((range - 100.0).abs() < 1e-3, "range decoded as {range}");

        let color_a = buffer.texel8(1, texel8::COLOR_A);
        let red = bytes_to_float(&color_a[0..2]) * limits.max_color_value;
        assert!((red - 100.0).abs() < 0.01, "red decoded as {red}");
    }
}
