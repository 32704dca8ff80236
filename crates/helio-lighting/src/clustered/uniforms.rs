use super::collect::{ClusterBounds, CompressionLimits};
use super::grid::ClusterLayout;
use glam::{Vec3, Vec4};

/// Cluster uniform data – must match the WGSL `ClusterUniforms` struct (144 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ClusterUniforms {
    pub cells: [f32; 3],
    pub pixels_per_cell: f32,
    /// Cell counts minus one, for clamping.
    pub cells_max: [f32; 3],
    /// 1.0 when no light was collected.
    pub cluster_skip: f32,
    pub cells_dot: [f32; 3],
    _pad0: f32,
    pub bounds_min: [f32; 3],
    _pad1: f32,
    pub bounds_delta: [f32; 3],
    _pad2: f32,
    /// `cells / bounds_delta`, 0 on flat axes.
    pub cells_count_by_bounds_size: [f32; 3],
    _pad3: f32,
    /// `(width, 1 / width, 1 / height)` of the cluster texture.
    pub cluster_texture_size: [f32; 3],
    _pad4: f32,
    /// `(1/float_w, 1/float_h, 1/8bit_w, 1/8bit_h)`
    pub lights_texture_inv_size: [f32; 4],
    /// `(max_attenuation, max_color_value)`
    pub compression_limits: [f32; 2],
    _pad5: [f32; 2],
}

impl ClusterUniforms {
    /// Without a layout every grid field is zero and the shader is told to
    /// skip clustered lighting.
    pub fn new(
        layout: Option<&ClusterLayout>,
        bounds: &ClusterBounds,
        limits: &CompressionLimits,
        lights_texture_inv_size: Vec4,
        skip: bool,
    ) -> Self {
        let mut uniforms = Self {
            cells: [0.0; 3],
            pixels_per_cell: 0.0,
            cells_max: [0.0; 3],
            cluster_skip: if skip || layout.is_none() { 1.0 } else { 0.0 },
            cells_dot: [0.0; 3],
            _pad0: 0.0,
            bounds_min: bounds.min.to_array(),
            _pad1: 0.0,
            bounds_delta: bounds.delta.to_array(),
            _pad2: 0.0,
            cells_count_by_bounds_size: [0.0; 3],
            _pad3: 0.0,
            cluster_texture_size: [0.0; 3],
            _pad4: 0.0,
            lights_texture_inv_size: lights_texture_inv_size.to_array(),
            compression_limits: [limits.max_attenuation, limits.max_color_value],
            _pad5: [0.0; 2],
        };

        if let Some(layout) = layout {
            let cells = layout.cells().as_vec3();
            let width = layout.width() as f32;
            uniforms.cells = cells.to_array();
            uniforms.pixels_per_cell = layout.pixels_per_cell() as f32;
            uniforms.cells_max = layout.cells_minus_one().as_vec3().to_array();
            uniforms.cells_dot = layout.cells_dot().to_array();
            uniforms.cells_count_by_bounds_size = (cells * bounds.inv_delta()).to_array();
            uniforms.cluster_texture_size = [width, 1.0 / width, 1.0 / layout.height() as f32];
        }

        uniforms
    }

    /// Texel index of the first texel of the cell containing `position`,
    /// computed the way the shader does.
    pub fn cell_texel(&self, position: Vec3) -> u32 {
        let cell = ((position - Vec3::from(self.bounds_min))
            * Vec3::from(self.cells_count_by_bounds_size))
        .floor()
        .clamp(Vec3::ZERO, Vec3::from(self.cells_max));
        cell.dot(Vec3::from(self.cells_dot)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;
    use helio_core::Aabb;

    #[test]
    fn layout_is_std140_friendly() {
        assert_eq!(std::mem::size_of::<ClusterUniforms>(), 144);
        assert_eq!(std::mem::size_of::<ClusterUniforms>() % 16, 0);
    }

    #[test]
    fn fields_from_layout() {
        let layout = ClusterLayout::new(UVec3::new(10, 3, 10), 255, 4096).unwrap();
        let bounds = ClusterBounds::from_aabb(Aabb::new(Vec3::ZERO, Vec3::new(20.0, 6.0, 40.0)));
        let limits = CompressionLimits::default();
        let u = ClusterUniforms::new(Some(&layout), &bounds, &limits, Vec4::ZERO, false);

        assert_eq!(u.cells, [10.0, 3.0, 10.0]);
        assert_eq!(u.cells_max, [9.0, 2.0, 9.0]);
        assert_eq!(u.pixels_per_cell, 64.0);
        assert_eq!(u.cells_dot, [64.0, 6400.0, 640.0]);
        assert_eq!(u.cells_count_by_bounds_size, [0.5, 0.5, 0.25]);
        assert_eq!(u.cluster_texture_size, [192.0, 1.0 / 192.0, 0.01]);
        assert_eq!(u.cluster_skip, 0.0);

        // (2.5, 5.9, 39.0) lies in cell (1, 2, 9)
        let texel = u.cell_texel(Vec3::new(2.5, 5.9, 39.0));
        assert_eq!(texel as usize, layout.cell_index(1, 2, 9) * 64);
    }

    #[test]
    fn no_layout_skips() {
        let u = ClusterUniforms::new(
            None,
            &ClusterBounds::default(),
            &CompressionLimits::default(),
            Vec4::ZERO,
            false,
        );
        assert_eq!(u.cluster_skip, 1.0);
        assert_eq!(u.cells, [0.0; 3]);
    }
}
