use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3, Vec4};
use helio_core::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Omni,
    Spot,
}

/// Emitter shape. Anything but `Punctual` is an area light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightShape {
    #[default]
    Punctual,
    Rect,
    Disk,
    Sphere,
}

impl LightShape {
    pub fn index(self) -> u8 {
        match self {
            LightShape::Punctual => 0,
            LightShape::Rect => 1,
            LightShape::Disk => 2,
            LightShape::Sphere => 3,
        }
    }

    pub fn is_area(self) -> bool {
        self != LightShape::Punctual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FalloffMode {
    #[default]
    Linear,
    InverseSquared,
}

impl FalloffMode {
    pub fn index(self) -> u8 {
        match self {
            FalloffMode::Linear => 0,
            FalloffMode::InverseSquared => 1,
        }
    }
}

bitflags! {
    /// Which geometry a light affects.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LightMask: u32 {
        const AFFECT_DYNAMIC = 1;
        const AFFECT_LIGHTMAPPED = 2;
        const BAKE = 4;
    }
}

impl Default for LightMask {
    fn default() -> Self {
        LightMask::AFFECT_DYNAMIC
    }
}

/// Texture channel(s) a cookie reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookieChannel {
    #[default]
    Rgb,
    R,
    G,
    B,
    A,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cookie {
    /// 0..1
    pub intensity: f32,
    pub channel: CookieChannel,
}

impl Default for Cookie {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            channel: CookieChannel::Rgb,
        }
    }
}

/// Shadow parameters as resolved by the shadow renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    pub bias: f32,
    pub normal_bias: f32,
    pub intensity: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            bias: -0.0005,
            normal_bias: 0.0,
            intensity: 1.0,
        }
    }
}

/// The light's slot in the shadow / cookie atlas, present only when the
/// atlas allocator found room for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightAtlasData {
    /// `xy` offset and `z` size of the slot in normalized atlas space. Omni
    /// lights lay their six faces out in a 3x3 grid inside the slot.
    pub viewport: Vec4,
    /// Spot light shadow matrix, world to atlas.
    pub shadow_matrix: Mat4,
    /// Spot light cookie matrix, world to atlas.
    pub cookie_matrix: Mat4,
}

impl Default for LightAtlasData {
    fn default() -> Self {
        Self {
            viewport: Vec4::new(0.0, 0.0, 1.0, 1.0),
            shadow_matrix: Mat4::IDENTITY,
            cookie_matrix: Mat4::IDENTITY,
        }
    }
}

/// A scene light as seen by clustered lighting.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub shape: LightShape,
    pub falloff: FalloffMode,
    pub mask: LightMask,
    pub enabled: bool,
    /// Set by visibility culling each frame.
    pub visible_this_frame: bool,
    pub intensity: f32,
    /// Distance at which the light contributes nothing.
    pub attenuation_end: f32,
    /// Color times intensity, gamma space.
    pub final_color: Vec3,
    /// Color times intensity, linear space.
    pub linear_final_color: Vec3,
    /// Spot lights shine down their local -Y axis.
    pub world_transform: Mat4,
    /// Degrees.
    pub inner_cone_angle: f32,
    /// Degrees.
    pub outer_cone_angle: f32,
    pub cast_shadows: bool,
    pub shadow: ShadowParams,
    pub cookie: Option<Cookie>,
    pub atlas: Option<LightAtlasData>,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Omni,
            shape: LightShape::Punctual,
            falloff: FalloffMode::Linear,
            mask: LightMask::default(),
            enabled: true,
            visible_this_frame: true,
            intensity: 1.0,
            attenuation_end: 10.0,
            final_color: Vec3::ONE,
            linear_final_color: Vec3::ONE,
            world_transform: Mat4::IDENTITY,
            inner_cone_angle: 40.0,
            outer_cone_angle: 45.0,
            cast_shadows: false,
            shadow: ShadowParams::default(),
            cookie: None,
            atlas: None,
        }
    }
}

impl Light {
    pub fn omni(position: Vec3, range: f32) -> Self {
        Self {
            kind: LightKind::Omni,
            attenuation_end: range,
            world_transform: Mat4::from_translation(position),
            ..Default::default()
        }
    }

    pub fn spot(position: Vec3, rotation: Quat, range: f32, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            attenuation_end: range,
            world_transform: Mat4::from_rotation_translation(rotation, position),
            inner_cone_angle: inner_angle,
            outer_cone_angle: outer_angle,
            ..Default::default()
        }
    }

    pub fn directional(rotation: Quat) -> Self {
        Self {
            kind: LightKind::Directional,
            world_transform: Mat4::from_quat(rotation),
            ..Default::default()
        }
    }

    /// Sets the gamma-space color and derives both final colors.
    pub fn with_color(mut self, color: Vec3, intensity: f32) -> Self {
        self.intensity = intensity;
        self.final_color = color * intensity;
        self.linear_final_color = color.powf(2.2) * intensity;
        self
    }

    pub fn with_shape(mut self, shape: LightShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_falloff(mut self, falloff: FalloffMode) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn with_mask(mut self, mask: LightMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_shadows(mut self, shadow: ShadowParams) -> Self {
        self.cast_shadows = true;
        self.shadow = shadow;
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn with_atlas(mut self, atlas: LightAtlasData) -> Self {
        self.atlas = Some(atlas);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.world_transform.w_axis.truncate()
    }

    /// Normalized world-space direction a spot light points at.
    pub fn spot_direction(&self) -> Vec3 {
        (-self.world_transform.y_axis.truncate()).normalize_or_zero()
    }

    pub fn inner_cone_cos(&self) -> f32 {
        self.inner_cone_angle.to_radians().cos()
    }

    pub fn outer_cone_cos(&self) -> f32 {
        self.outer_cone_angle.to_radians().cos()
    }

    /// Color in the space the shader lights in.
    pub fn color(&self, gamma_correction: bool) -> Vec3 {
        if gamma_correction {
            self.linear_final_color
        } else {
            self.final_color
        }
    }

    /// World-space half-width and half-height axes of an area light.
    pub fn area_half_axes(&self) -> (Vec3, Vec3) {
        (
            self.world_transform.transform_vector3(Vec3::new(-0.5, 0.0, 0.0)),
            self.world_transform.transform_vector3(Vec3::new(0.0, 0.0, 0.5)),
        )
    }

    /// World-space box enclosing everything the light can reach.
    ///
    /// Spot lights use a box around their cone; everything else a cube of
    /// `attenuation_end` around the position. Directional lights have no
    /// finite volume and are never clustered.
    pub fn bounding_box(&self) -> Aabb {
        let range = self.attenuation_end;
        match self.kind {
            LightKind::Spot => {
                let side = (self.outer_cone_angle.to_radians().sin() * range).abs();
                let local = Aabb::from_center_half_extents(
                    Vec3::new(0.0, -range * 0.5, 0.0),
                    Vec3::new(side, range * 0.5, side),
                );
                local.transform(&self.world_transform)
            }
            LightKind::Omni | LightKind::Directional => {
                Aabb::from_center_half_extents(self.position(), Vec3::splat(range))
            }
        }
    }
}
