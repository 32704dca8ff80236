//! Per-light texel layout of the light data textures.
//!
//! Each light owns one row. The tables below are the only place texel
//! offsets are defined: the encoder writes through the host constants and
//! the shader reads through the defines generated from the same entries.

use super::config::ClusteredLightingConfig;
use super::lights_buffer::LightTextureFormat;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Shader specialization constant value
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderDefine {
    Bool(bool),
    U32(u32),
    F32(f32),
}

impl ShaderDefine {
    fn wgsl_type(&self) -> &'static str {
        match self {
            ShaderDefine::Bool(_) => "bool",
            ShaderDefine::U32(_) => "u32",
            ShaderDefine::F32(_) => "f32",
        }
    }

    fn wgsl_value(&self) -> String {
        match self {
            ShaderDefine::Bool(v) => v.to_string(),
            ShaderDefine::U32(v) => format!("{v}u"),
            ShaderDefine::F32(v) => format!("{v:?}"),
        }
    }
}

macro_rules! texel_layout {
    (
        $(#[$meta:meta])*
        pub mod $name:ident, prefix = $prefix:literal {
            $($(#[$field_meta:meta])* $field:ident = $value:expr,)*
        }
    ) => {
        $(#[$meta])*
        pub mod $name {
            $($(#[$field_meta])* pub const $field: u32 = $value;)*

            /// Prefix of the generated shader define names.
            pub const PREFIX: &str = $prefix;

            /// Every offset by name, in declaration order.
            pub const ENTRIES: &[(&str, u32)] = &[$((stringify!($field), $field),)*];
        }
    };
}

texel_layout! {
    /// Texel offsets within a row of the 8-bit light texture.
    ///
    /// Offsets below `COUNT_ALWAYS` are stored in 8 bits in both modes; the
    /// rest are only used when the float texture is unavailable.
    pub mod texel8, prefix = "CLUSTER_TEXTURE_8_" {
        FLAGS = 0,
        COLOR_A = 1,
        COLOR_B = 2,
        SPOT_ANGLES = 3,
        SHADOW_BIAS = 4,
        COOKIE_A = 5,
        COOKIE_B = 6,
        COUNT_ALWAYS = 7,

        POSITION_X = 7,
        POSITION_Y = 8,
        POSITION_Z = 9,
        RANGE = 10,
        /// One full texel per direction component, finer than the 2-byte
        /// cone cosines.
        SPOT_DIRECTION_X = 11,
        SPOT_DIRECTION_Y = 12,
        SPOT_DIRECTION_Z = 13,

        /// Spot lights store a projection matrix, omni lights the atlas
        /// viewport, so the two share texels.
        PROJ_MAT_00 = 14,
        ATLAS_VIEWPORT_A = 14,
        PROJ_MAT_01 = 15,
        ATLAS_VIEWPORT_B = 15,
        PROJ_MAT_02 = 16,
        PROJ_MAT_03 = 17,
        PROJ_MAT_10 = 18,
        PROJ_MAT_11 = 19,
        PROJ_MAT_12 = 20,
        PROJ_MAT_13 = 21,
        PROJ_MAT_20 = 22,
        PROJ_MAT_21 = 23,
        PROJ_MAT_22 = 24,
        PROJ_MAT_23 = 25,
        PROJ_MAT_30 = 26,
        PROJ_MAT_31 = 27,
        PROJ_MAT_32 = 28,
        PROJ_MAT_33 = 29,

        AREA_DATA_WIDTH_X = 30,
        AREA_DATA_WIDTH_Y = 31,
        AREA_DATA_WIDTH_Z = 32,
        AREA_DATA_HEIGHT_X = 33,
        AREA_DATA_HEIGHT_Y = 34,
        AREA_DATA_HEIGHT_Z = 35,

        COUNT = 36,
    }
}

texel_layout! {
    /// Texel offsets within a row of the float light texture.
    pub mod texel_float, prefix = "CLUSTER_TEXTURE_F_" {
        POSITION_RANGE = 0,
        SPOT_DIRECTION = 1,
        PROJ_MAT_0 = 2,
        ATLAS_VIEWPORT = 2,
        PROJ_MAT_1 = 3,
        PROJ_MAT_2 = 4,
        PROJ_MAT_3 = 5,
        AREA_DATA_WIDTH = 6,
        AREA_DATA_HEIGHT = 7,
        COUNT = 8,
    }
}

/// Width in texels of the 8-bit light texture for the given format.
pub fn texel8_row_width(format: LightTextureFormat) -> u32 {
    match format {
        LightTextureFormat::Float => texel8::COUNT_ALWAYS,
        LightTextureFormat::Unorm8 => texel8::COUNT,
    }
}

/// Shader defines describing the active light texture layout and features.
pub fn shader_defines(
    format: LightTextureFormat,
    config: &ClusteredLightingConfig,
) -> HashMap<String, ShaderDefine> {
    let mut defines = HashMap::new();

    defines.insert(
        "CLUSTER_TEXTURE_FLOAT".to_string(),
        ShaderDefine::Bool(format == LightTextureFormat::Float),
    );
    defines.insert(
        "CLUSTER_TEXTURE_8BIT".to_string(),
        ShaderDefine::Bool(format == LightTextureFormat::Unorm8),
    );
    defines.insert("CLUSTER_SHADOWS".to_string(), ShaderDefine::Bool(config.shadows_enabled));
    defines.insert("CLUSTER_COOKIES".to_string(), ShaderDefine::Bool(config.cookies_enabled));
    defines.insert(
        "CLUSTER_AREALIGHTS".to_string(),
        ShaderDefine::Bool(config.area_lights_enabled),
    );

    for (name, offset) in texel8::ENTRIES {
        defines.insert(format!("{}{}", texel8::PREFIX, name), ShaderDefine::U32(*offset));
    }
    for (name, offset) in texel_float::ENTRIES {
        defines.insert(format!("{}{}", texel_float::PREFIX, name), ShaderDefine::U32(*offset));
    }

    defines
}

/// Renders defines as WGSL module-scope constants, sorted by name.
pub fn wgsl_constants(defines: &HashMap<String, ShaderDefine>) -> String {
    let mut names: Vec<&String> = defines.keys().collect();
    names.sort();

    let mut out = String::new();
    for name in names {
        let value = &defines[name];
        // Writing into a String cannot fail
        let _ = writeln!(out, "const {}: {} = {};", name, value.wgsl_type(), value.wgsl_value());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_8bit_fields_come_first() {
        for (name, offset) in texel8::ENTRIES {
            let always = matches!(
                *name,
                "FLAGS" | "COLOR_A" | "COLOR_B" | "SPOT_ANGLES" | "SHADOW_BIAS" | "COOKIE_A" | "COOKIE_B"
            );
            if always {
                assert!(*offset < texel8::COUNT_ALWAYS, "{name}");
            } else {
                assert!(*offset >= texel8::COUNT_ALWAYS, "{name}");
            }
            assert!(*offset <= texel8::COUNT);
        }
        for (_, offset) in texel_float::ENTRIES {
            assert!(*offset <= texel_float::COUNT);
        }
    }

    #[test]
    fn defines_mirror_host_offsets() {
        let config = ClusteredLightingConfig::default().with_cookies(true);
        let defines = shader_defines(LightTextureFormat::Unorm8, &config);

        assert_eq!(defines["CLUSTER_TEXTURE_8BIT"], ShaderDefine::Bool(true));
        assert_eq!(defines["CLUSTER_TEXTURE_FLOAT"], ShaderDefine::Bool(false));
        assert_eq!(defines["CLUSTER_COOKIES"], ShaderDefine::Bool(true));
        assert_eq!(
            defines["CLUSTER_TEXTURE_8_PROJ_MAT_33"],
            ShaderDefine::U32(texel8::PROJ_MAT_33)
        );
        assert_eq!(
            defines["CLUSTER_TEXTURE_F_AREA_DATA_HEIGHT"],
            ShaderDefine::U32(texel_float::AREA_DATA_HEIGHT)
        );
        assert_eq!(
            defines.len(),
            5 + texel8::ENTRIES.len() + texel_float::ENTRIES.len()
        );
    }

    #[test]
    fn wgsl_rendering() {
        let mut defines = HashMap::new();
        defines.insert("B".to_string(), ShaderDefine::U32(7));
        defines.insert("A".to_string(), ShaderDefine::Bool(true));
        defines.insert("C".to_string(), ShaderDefine::F32(0.5));
        assert_eq!(
            wgsl_constants(&defines),
            "const A: bool = true;\nconst B: u32 = 7u;\nconst C: f32 = 0.5;\n"
        );
    }

    #[test]
    fn row_width_depends_on_format() {
        assert_eq!(texel8_row_width(LightTextureFormat::Float), 7);
        assert_eq!(texel8_row_width(LightTextureFormat::Unorm8), 36);
    }
}
