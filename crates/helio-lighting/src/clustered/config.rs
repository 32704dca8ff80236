use glam::UVec3;

/// Settings of a clustered lighting grid.
///
/// Cheap to pass every frame. Only a change of `cells` or
/// `max_lights_per_cell` rebuilds the cluster texture.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteredLightingConfig {
    /// Number of cells along each world axis.
    pub cells: UVec3,
    /// Rounded up to a multiple of 4 when the layout is built.
    pub max_lights_per_cell: u32,
    pub shadows_enabled: bool,
    pub cookies_enabled: bool,
    pub area_lights_enabled: bool,
    /// Encode the linear final color instead of the gamma-space one.
    pub gamma_correction: bool,
}

impl Default for ClusteredLightingConfig {
    fn default() -> Self {
        Self {
            cells: UVec3::new(10, 3, 10),
            max_lights_per_cell: 255,
            shadows_enabled: true,
            cookies_enabled: false,
            area_lights_enabled: false,
            gamma_correction: true,
        }
    }
}

impl ClusteredLightingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cells(mut self, cells: UVec3) -> Self {
        self.cells = cells;
        self
    }

    pub fn with_max_lights_per_cell(mut self, max_lights_per_cell: u32) -> Self {
        self.max_lights_per_cell = max_lights_per_cell;
        self
    }

    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows_enabled = enabled;
        self
    }

    pub fn with_cookies(mut self, enabled: bool) -> Self {
        self.cookies_enabled = enabled;
        self
    }

    pub fn with_area_lights(mut self, enabled: bool) -> Self {
        self.area_lights_enabled = enabled;
        self
    }

    pub fn with_gamma_correction(mut self, enabled: bool) -> Self {
        self.gamma_correction = enabled;
        self
    }
}
