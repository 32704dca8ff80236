//! Per-frame light collection and the two scene-wide ranges derived from it:
//! the world bounds the grid spans and the limits used to normalize light
//! values for 8-bit storage.

use crate::lights::{Light, LightKind, LightMask};
use glam::Vec3;
use helio_core::Aabb;

/// Light indices are stored in single bytes and 0 means "no light".
pub const MAX_LIGHTS: usize = 255;

/// Relative margin on the compression limits so the largest value
/// normalizes below 1. Also the floor of a limit when every value is 0.
pub const COMPRESSION_EPSILON: f32 = 0.000_001;

/// Grows `max` by [`COMPRESSION_EPSILON`] relative to its magnitude, which
/// stays several ULPs wide at any f32 scale.
fn inflate(max: f32) -> f32 {
    max * (1.0 + COMPRESSION_EPSILON) + COMPRESSION_EPSILON
}

/// A light taking part in this frame's grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterLight {
    /// Index into the frame's light list. `None` only for the sentinel.
    pub source: Option<usize>,
    pub aabb: Aabb,
}

impl ClusterLight {
    const SENTINEL: ClusterLight = ClusterLight {
        source: None,
        aabb: Aabb {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        },
    };
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub collected: usize,
    /// Lights that qualified but did not fit under [`MAX_LIGHTS`].
    pub dropped: usize,
}

/// Whether a light takes part in clustered lighting this frame.
pub fn is_clustered(light: &Light) -> bool {
    light.enabled
        && light.kind != LightKind::Directional
        && light.visible_this_frame
        && light.intensity > 0.0
        && light
            .mask
            .intersects(LightMask::AFFECT_DYNAMIC | LightMask::AFFECT_LIGHTMAPPED)
        && !(light.kind == LightKind::Spot && light.outer_cone_angle == 0.0)
}

/// The frame's clustered lights, index 0 reserved.
///
/// Storage is kept between frames and overwritten in place.
#[derive(Debug, Clone)]
pub struct ClusterLightPool {
    lights: Vec<ClusterLight>,
}

impl Default for ClusterLightPool {
    fn default() -> Self {
        Self {
            lights: vec![ClusterLight::SENTINEL],
        }
    }
}

impl ClusterLightPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the pool from `lights`, in input order.
    pub fn collect(&mut self, lights: &[Light]) -> CollectStats {
        self.lights.truncate(1);
        let mut dropped = 0;

        for (source, light) in lights.iter().enumerate() {
            if !is_clustered(light) {
                continue;
            }
            if self.lights.len() >= MAX_LIGHTS {
                dropped += 1;
                continue;
            }
            self.lights.push(ClusterLight {
                source: Some(source),
                aabb: light.bounding_box(),
            });
        }

        CollectStats {
            collected: self.len(),
            dropped,
        }
    }

    /// Number of collected lights, sentinel excluded.
    pub fn len(&self) -> usize {
        self.lights.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collected lights with their 1-based grid index.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &ClusterLight)> + '_ {
        // the pool never exceeds MAX_LIGHTS entries, so the index fits a byte
        self.lights.iter().enumerate().skip(1).map(|(i, l)| (i as u8, l))
    }

    /// Collected lights paired with their source light.
    pub fn sources<'a>(
        &'a self,
        lights: &'a [Light],
    ) -> impl Iterator<Item = (u8, &'a ClusterLight, &'a Light)> + 'a {
        self.iter()
            .filter_map(move |(i, l)| l.source.and_then(|s| lights.get(s)).map(|src| (i, l, src)))
    }
}

/// World-space box the grid spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub delta: Vec3,
}

impl Default for ClusterBounds {
    fn default() -> Self {
        Self::from_aabb(Aabb::UNIT)
    }
}

impl ClusterBounds {
    pub fn from_aabb(aabb: Aabb) -> Self {
        Self {
            min: aabb.min,
            max: aabb.max,
            delta: (aabb.max - aabb.min).max(Vec3::ZERO),
        }
    }

    /// Union of every collected light's box, or the unit box without lights.
    pub fn evaluate(pool: &ClusterLightPool) -> Self {
        pool.iter()
            .map(|(_, light)| light.aabb)
            .reduce(|a, b| a.union(&b))
            .map(Self::from_aabb)
            .unwrap_or_default()
    }

    /// `1 / delta` per axis, 0 where the bounds are flat.
    pub fn inv_delta(&self) -> Vec3 {
        let inv = |d: f32| if d > 0.0 { 1.0 / d } else { 0.0 };
        Vec3::new(inv(self.delta.x), inv(self.delta.y), inv(self.delta.z))
    }
}

/// Scales that bring attenuation ranges and colors into `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionLimits {
    pub max_attenuation: f32,
    pub max_color_value: f32,
}

impl Default for CompressionLimits {
    fn default() -> Self {
        Self {
            max_attenuation: COMPRESSION_EPSILON,
            max_color_value: COMPRESSION_EPSILON,
        }
    }
}

impl CompressionLimits {
    pub fn evaluate(pool: &ClusterLightPool, lights: &[Light], gamma_correction: bool) -> Self {
        let mut max_attenuation = 0.0f32;
        let mut max_color_value = 0.0f32;

        for (_, _, light) in pool.sources(lights) {
            max_attenuation = max_attenuation.max(light.attenuation_end);
            max_color_value = max_color_value.max(light.color(gamma_correction).max_element());
        }

        Self {
            max_attenuation: inflate(max_attenuation),
            max_color_value: inflate(max_color_value),
        }
    }

    pub fn inv_max_attenuation(&self) -> f32 {
        1.0 / self.max_attenuation
    }

    pub fn inv_max_color_value(&self) -> f32 {
        1.0 / self.max_color_value
    }
}
