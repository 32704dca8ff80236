//! Helio Lighting - clustered world-space light grid
//!
//! Assigns every local light to the cells of a world-space grid and packs
//! light parameters into textures a forward shader can read, so one draw
//! call can be lit by hundreds of lights.

pub mod area_luts;
pub mod clustered;
pub mod lights;

pub use area_luts::{AreaLightLuts, AreaLutError};
pub use clustered::{
    ClusterUniforms, ClusteredLightingConfig, LightTextureFormat, ShaderDefine, WorldClusters,
};
pub use lights::{
    Cookie, CookieChannel, FalloffMode, Light, LightAtlasData, LightKind, LightMask, LightShape,
    ShadowParams,
};

use helio_core::HelioError;

/// Result type for lighting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the light grid
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cluster texture {width}x{height} exceeds the device limit of {max}")]
    ClusterTextureTooLarge { width: u64, height: u64, max: u32 },

    #[error("invalid clustered lighting configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Core(#[from] HelioError),
}
