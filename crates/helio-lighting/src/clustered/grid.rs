//! World-space cell grid and the cluster index texture it fills.

use super::collect::ClusterBounds;
use crate::{Error, Result};
use glam::{IVec3, UVec3, Vec3};
use helio_core::{Aabb, TextureDesc, TextureFormat};

/// Light indices packed per texel (one per RGBA8 channel).
pub const LIGHTS_PER_PIXEL: u32 = 4;

/// Cell counts, per-cell capacity and the cluster texture size they imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterLayout {
    cells: UVec3,
    max_lights_per_cell: u32,
    pixels_per_cell: u32,
    width: u32,
    height: u32,
}

impl ClusterLayout {
    /// Fails if any cell count or the capacity is zero, or if the texture
    /// would not fit in `max_texture_size` in either dimension.
    pub fn new(cells: UVec3, max_lights_per_cell: u32, max_texture_size: u32) -> Result<Self> {
        if cells.min_element() == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "cluster grid needs at least one cell per axis, got {cells}"
            )));
        }
        if max_lights_per_cell == 0 {
            return Err(Error::InvalidConfiguration(
                "max lights per cell must be at least 1".to_string(),
            ));
        }

        let max_lights_per_cell = max_lights_per_cell.div_ceil(LIGHTS_PER_PIXEL) * LIGHTS_PER_PIXEL;
        let pixels_per_cell = max_lights_per_cell / LIGHTS_PER_PIXEL;

        let num_cells = cells.x as u64 * cells.y as u64 * cells.z as u64;
        let total_pixels = pixels_per_cell as u64 * num_cells;

        // whole cells per row
        let ppc = pixels_per_cell as u64;
        let width = ((total_pixels as f64).sqrt().ceil() as u64).div_ceil(ppc) * ppc;
        let height = total_pixels.div_ceil(width);

        let max = max_texture_size as u64;
        if width > max || height > max {
            return Err(Error::ClusterTextureTooLarge {
                width,
                height,
                max: max_texture_size,
            });
        }

        Ok(Self {
            cells,
            max_lights_per_cell,
            pixels_per_cell,
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn cells(&self) -> UVec3 {
        self.cells
    }

    pub fn cells_minus_one(&self) -> UVec3 {
        self.cells - UVec3::ONE
    }

    pub fn num_cells(&self) -> usize {
        (self.cells.x * self.cells.y * self.cells.z) as usize
    }

    /// Capacity after rounding up to whole texels.
    pub fn max_lights_per_cell(&self) -> u32 {
        self.max_lights_per_cell
    }

    pub fn pixels_per_cell(&self) -> u32 {
        self.pixels_per_cell
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dotted with integer cell coordinates, gives the cell's first texel.
    pub fn cells_dot(&self) -> Vec3 {
        let ppc = self.pixels_per_cell as f32;
        Vec3::new(
            ppc,
            (self.cells.x * self.cells.z) as f32 * ppc,
            self.cells.x as f32 * ppc,
        )
    }

    /// Flattened cell index, Y over Z over X.
    pub fn cell_index(&self, x: u32, y: u32, z: u32) -> usize {
        (x + self.cells.x * (z + y * self.cells.z)) as usize
    }

    pub fn texture_desc(&self, label: impl Into<String>) -> TextureDesc {
        TextureDesc::new(label, self.width, self.height, TextureFormat::Rgba8Unorm)
    }
}

/// Per-cell light index lists, stored the way the cluster texture holds them.
#[derive(Debug, Clone)]
pub struct ClusterGrid {
    layout: ClusterLayout,
    clusters: Vec<u8>,
    counts: Vec<u32>,
    overflow: bool,
}

impl ClusterGrid {
    pub fn new(layout: ClusterLayout) -> Self {
        let bytes = layout.width as usize * layout.height as usize * LIGHTS_PER_PIXEL as usize;
        Self {
            layout,
            clusters: vec![0; bytes],
            counts: vec![0; layout.num_cells()],
            overflow: false,
        }
    }

    pub fn layout(&self) -> &ClusterLayout {
        &self.layout
    }

    /// RGBA8 contents of the cluster texture.
    pub fn clusters(&self) -> &[u8] {
        &self.clusters
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Whether a light was turned away from a full cell since the last clear.
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    pub fn clear(&mut self) {
        self.clusters.fill(0);
        self.counts.fill(0);
        self.overflow = false;
    }

    /// Inclusive range of cells a world-space box touches.
    ///
    /// Cells are closed intervals: a box ending exactly on a cell boundary
    /// belongs to both neighbours, a box strictly inside a cell to that cell
    /// alone.
    pub fn light_cell_range(&self, aabb: &Aabb, bounds: &ClusterBounds) -> (UVec3, UVec3) {
        let scale = self.layout.cells.as_vec3() * bounds.inv_delta();
        let cell_min = (aabb.min - bounds.min) * scale;
        let cell_max = (aabb.max - bounds.min) * scale;

        let limit = self.layout.cells_minus_one().as_ivec3();
        let lo = (cell_min.ceil().as_ivec3() - IVec3::ONE).clamp(IVec3::ZERO, limit);
        let hi = cell_max.floor().as_ivec3().clamp(IVec3::ZERO, limit);

        (lo.as_uvec3(), hi.as_uvec3())
    }

    /// Appends light `index` to every cell the box touches. Full cells keep
    /// their contents and set the overflow flag.
    pub fn add_light(&mut self, index: u8, aabb: &Aabb, bounds: &ClusterBounds) {
        let (lo, hi) = self.light_cell_range(aabb, bounds);
        let capacity = self.layout.max_lights_per_cell;
        let stride = (self.layout.pixels_per_cell * LIGHTS_PER_PIXEL) as usize;

        for x in lo.x..=hi.x {
            for z in lo.z..=hi.z {
                for y in lo.y..=hi.y {
                    let cell = self.layout.cell_index(x, y, z);
                    let count = self.counts[cell];
                    if count < capacity {
                        self.clusters[stride * cell + count as usize] = index;
                        self.counts[cell] = count + 1;
                    } else {
                        self.overflow = true;
                    }
                }
            }
        }
    }

    /// Light indices stored in a cell, in insertion order.
    pub fn cell_lights(&self, cell: usize) -> &[u8] {
        let stride = (self.layout.pixels_per_cell * LIGHTS_PER_PIXEL) as usize;
        let start = stride * cell;
        &self.clusters[start..start + self.counts[cell] as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min: Vec3, max: Vec3) -> ClusterBounds {
        ClusterBounds::from_aabb(Aabb::new(min, max))
    }

    #[test]
    fn default_grid_layout() {
        let layout = ClusterLayout::new(UVec3::new(10, 3, 10), 255, 4096).unwrap();
        assert_eq!(layout.max_lights_per_cell(), 256);
        assert_eq!(layout.pixels_per_cell(), 64);
        assert_eq!(layout.width(), 192);
        assert_eq!(layout.height(), 100);
        assert_eq!(layout.width() % layout.pixels_per_cell(), 0);
    }

    #[test]
    fn capacity_rounds_to_texels() {
        let layout = ClusterLayout::new(UVec3::ONE, 5, 4096).unwrap();
        assert_eq!(layout.max_lights_per_cell(), 8);
        assert_eq!(layout.pixels_per_cell(), 2);
        assert_eq!((layout.width(), layout.height()), (2, 1));
    }

    #[test]
    fn oversized_layout_is_rejected() {
        let err = ClusterLayout::new(UVec3::new(128, 64, 64), 256, 4096).unwrap_err();
        assert!(matches!(err, Error::ClusterTextureTooLarge { max: 4096, .. }));

        let err = ClusterLayout::new(UVec3::new(4, 0, 4), 8, 4096).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn dot_vector_matches_cell_index() {
        let layout = ClusterLayout::new(UVec3::new(5, 3, 4), 12, 4096).unwrap();
        let dot = layout.cells_dot();
        for y in 0..3 {
            for z in 0..4 {
                for x in 0..5 {
                    let texel = Vec3::new(x as f32, y as f32, z as f32).dot(dot) as usize;
                    assert_eq!(texel, layout.cell_index(x, y, z) * layout.pixels_per_cell() as usize);
                }
            }
        }
    }

    #[test]
    fn box_inside_one_cell_maps_to_it() {
        let grid = ClusterGrid::new(ClusterLayout::new(UVec3::splat(4), 4, 4096).unwrap());
        let b = bounds(Vec3::ZERO, Vec3::splat(4.0));
        let aabb = Aabb::new(Vec3::new(1.2, 0.1, 3.5), Vec3::new(1.8, 0.9, 3.9));
        assert_eq!(
            grid.light_cell_range(&aabb, &b),
            (UVec3::new(1, 0, 3), UVec3::new(1, 0, 3))
        );
    }

    #[test]
    fn touching_boundary_includes_both_neighbours() {
        let grid = ClusterGrid::new(ClusterLayout::new(UVec3::splat(4), 4, 4096).unwrap());
        let b = bounds(Vec3::ZERO, Vec3::splat(4.0));
        let aabb = Aabb::new(Vec3::new(2.0, 0.5, 0.5), Vec3::new(2.5, 3.0, 0.5));
        let (lo, hi) = grid.light_cell_range(&aabb, &b);
        assert_eq!(lo, UVec3::new(1, 0, 0));
        assert_eq!(hi, UVec3::new(2, 3, 0));
    }

    #[test]
    fn full_cell_stops_growing() {
        let mut grid = ClusterGrid::new(ClusterLayout::new(UVec3::splat(2), 4, 4096).unwrap());
        let b = bounds(Vec3::ZERO, Vec3::splat(2.0));
        let aabb = Aabb::new(Vec3::splat(0.2), Vec3::splat(0.4));
        for index in 1..=6 {
            grid.add_light(index, &aabb, &b);
        }
        assert!(grid.overflowed());
        assert_eq!(grid.cell_lights(0), &[1, 2, 3, 4]);
        // neighbouring cell untouched
        assert_eq!(grid.clusters()[4..8], [0, 0, 0, 0]);

        grid.clear();
        assert!(!grid.overflowed());
        assert!(grid.cell_lights(0).is_empty());
    }
}
