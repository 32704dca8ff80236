//! Clustered world-space lighting.
//!
//! The world box around all active lights is split into a regular grid of
//! cells. Each frame every light is assigned to the cells its bounding box
//! touches, and its parameters are packed into per-light texture rows.
//! Shaders find the cell of a fragment from the uniforms, read the light
//! indices stored for that cell, and fetch each light's row.
//!
//! [`WorldClusters::update`] runs the whole pipeline in order:
//!
//! 1. apply the grid configuration (only when it changed)
//! 2. collect the lights that take part
//! 3. evaluate the world bounds
//! 4. evaluate the compression limits
//! 5. encode light data
//! 6. fill the cells
//! 7. upload textures and refresh uniforms

pub mod collect;
pub mod config;
pub mod grid;
pub mod layout;
pub mod lights_buffer;
pub mod report;
pub mod textures;
pub mod uniforms;

pub use collect::{
    ClusterBounds, ClusterLight, ClusterLightPool, CollectStats, CompressionLimits, MAX_LIGHTS,
};
pub use config::ClusteredLightingConfig;
pub use grid::{ClusterGrid, ClusterLayout};
pub use layout::ShaderDefine;
pub use lights_buffer::{LightTextureFormat, LightsBuffer};
pub use report::ReportLimiter;
pub use textures::ClusterTextures;
pub use uniforms::ClusterUniforms;

use crate::lights::Light;
use crate::Result;
use glam::UVec3;
use helio_core::{TextureDevice, UniformBuffer};
use std::collections::HashMap;

pub type ClusterUniformBuffer<D> = UniformBuffer<ClusterUniforms, <D as TextureDevice>::Buffer>;

/// A clustered light grid and the textures it feeds.
pub struct WorldClusters<D: TextureDevice> {
    name: String,
    config: ClusteredLightingConfig,
    max_texture_size: u32,

    /// `(cells, max_lights_per_cell)` the current grid was built for.
    applied: Option<(UVec3, u32)>,
    /// Last configuration that failed, so it is reported once.
    rejected: Option<(UVec3, u32)>,
    grid: Option<ClusterGrid>,

    pool: ClusterLightPool,
    stats: CollectStats,
    bounds: ClusterBounds,
    limits: CompressionLimits,
    lights_buffer: LightsBuffer,
    textures: ClusterTextures<D>,
    uniforms: ClusterUniforms,
    uniform_buffer: ClusterUniformBuffer<D>,

    light_cap_reports: ReportLimiter,
    cell_overflow_reports: ReportLimiter,
}

impl<D: TextureDevice> WorldClusters<D> {
    pub fn new(name: impl Into<String>, device: D) -> Result<Self> {
        let name = name.into();
        let caps = device.caps();
        let format = LightTextureFormat::select(&caps);
        let lights_buffer = LightsBuffer::new(format);
        let uniform_buffer = UniformBuffer::new(&device, &format!("{name} Cluster Uniforms"))?;
        let textures = ClusterTextures::new(device, &name, &lights_buffer)?;
        let bounds = ClusterBounds::default();
        let limits = CompressionLimits::default();
        let uniforms = ClusterUniforms::new(None, &bounds, &limits, lights_buffer.inv_size(), true);

        log::info!("World clusters '{}' created, light texture format {:?}", name, format);

        Ok(Self {
            name,
            config: ClusteredLightingConfig::default(),
            max_texture_size: caps.max_texture_dimension_2d,
            applied: None,
            rejected: None,
            grid: None,
            pool: ClusterLightPool::new(),
            stats: CollectStats::default(),
            bounds,
            limits,
            lights_buffer,
            textures,
            uniforms,
            uniform_buffer,
            light_cap_reports: ReportLimiter::default(),
            cell_overflow_reports: ReportLimiter::default(),
        })
    }

    /// Rebuilds the grid for this frame's lights and uploads the result.
    ///
    /// A grid configuration that does not fit the device is returned as an
    /// error on the frame it is first applied. The frame still completes
    /// with the last valid grid, or with clustered lighting skipped if there
    /// never was one.
    ///
    /// Every stage runs even when an upload fails. The first error of the
    /// frame is returned.
    pub fn update(&mut self, lights: &[Light], config: &ClusteredLightingConfig) -> Result<()> {
        let config_result = self.configure(config);

        self.collect_lights(lights);
        self.bounds = ClusterBounds::evaluate(&self.pool);
        self.limits = CompressionLimits::evaluate(&self.pool, lights, config.gamma_correction);
        self.encode_lights(lights);
        self.fill_cells();

        self.uniforms = ClusterUniforms::new(
            self.grid.as_ref().map(ClusterGrid::layout),
            &self.bounds,
            &self.limits,
            self.lights_buffer.inv_size(),
            self.pool.is_empty(),
        );
        let upload_result = self.textures.upload(self.grid.as_ref(), &self.lights_buffer);
        let uniform_result = self.uniform_buffer.write(&self.uniforms);

        if let Err(err) = &upload_result {
            log::error!("World clusters '{}': texture upload failed: {}", self.name, err);
        }
        if let Err(err) = &uniform_result {
            log::error!("World clusters '{}': uniform upload failed: {}", self.name, err);
        }

        config_result?;
        upload_result?;
        uniform_result?;
        Ok(())
    }

    fn configure(&mut self, config: &ClusteredLightingConfig) -> Result<()> {
        self.config = config.clone();
        self.lights_buffer.set_features(config);

        let wanted = (config.cells, config.max_lights_per_cell);
        if self.rejected.is_some_and(|rejected| rejected != wanted) {
            self.rejected = None;
        }
        if self.applied == Some(wanted) || self.rejected == Some(wanted) {
            return Ok(());
        }

        match ClusterLayout::new(config.cells, config.max_lights_per_cell, self.max_texture_size) {
            Ok(layout) => {
                log::info!(
                    "World clusters '{}': {} cells, {} lights per cell, cluster texture {}x{}",
                    self.name,
                    layout.cells(),
                    layout.max_lights_per_cell(),
                    layout.width(),
                    layout.height()
                );
                self.grid = Some(ClusterGrid::new(layout));
                self.applied = Some(wanted);
                self.rejected = None;
                Ok(())
            }
            Err(err) => {
                log::error!("World clusters '{}': {}", self.name, err);
                self.rejected = Some(wanted);
                Err(err)
            }
        }
    }

    fn collect_lights(&mut self, lights: &[Light]) {
        self.stats = self.pool.collect(lights);
        if self.stats.dropped > 0 {
            self.light_cap_reports.warn(format!(
                "World clusters '{}': too many lights, {} of them dropped (limit {}).",
                self.name,
                self.stats.dropped,
                MAX_LIGHTS - 1
            ));
        }
    }

    fn encode_lights(&mut self, lights: &[Light]) {
        self.lights_buffer.set_bounds(&self.bounds);
        self.lights_buffer.set_compression_ranges(&self.limits);
        for (index, _, light) in self.pool.sources(lights) {
            self.lights_buffer.add_light_data(light, index);
        }
    }

    fn fill_cells(&mut self) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };

        grid.clear();
        for (index, light) in self.pool.iter() {
            grid.add_light(index, &light.aabb, &self.bounds);
        }

        if grid.overflowed() {
            self.cell_overflow_reports.warn(format!(
                "World clusters '{}': a cell holds more than {} lights, some are ignored. \
                 Raise max lights per cell or use more cells.",
                self.name,
                grid.layout().max_lights_per_cell()
            ));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ClusteredLightingConfig {
        &self.config
    }

    pub fn grid(&self) -> Option<&ClusterGrid> {
        self.grid.as_ref()
    }

    pub fn lights(&self) -> &ClusterLightPool {
        &self.pool
    }

    pub fn collect_stats(&self) -> CollectStats {
        self.stats
    }

    pub fn dropped_lights(&self) -> usize {
        self.stats.dropped
    }

    pub fn bounds(&self) -> &ClusterBounds {
        &self.bounds
    }

    pub fn compression_limits(&self) -> &CompressionLimits {
        &self.limits
    }

    pub fn lights_buffer(&self) -> &LightsBuffer {
        &self.lights_buffer
    }

    pub fn textures(&self) -> &ClusterTextures<D> {
        &self.textures
    }

    pub fn uniforms(&self) -> &ClusterUniforms {
        &self.uniforms
    }

    /// GPU copy of [`uniforms`](Self::uniforms), rewritten every update.
    pub fn uniform_buffer(&self) -> &ClusterUniformBuffer<D> {
        &self.uniform_buffer
    }

    pub fn light_texture_format(&self) -> LightTextureFormat {
        self.lights_buffer.format()
    }

    /// Defines the lighting shaders must be compiled with.
    pub fn shader_defines(&self) -> HashMap<String, ShaderDefine> {
        layout::shader_defines(self.lights_buffer.format(), &self.config)
    }

    /// Warnings logged so far for dropped lights and full cells.
    pub fn reported_warnings(&self) -> u32 {
        self.light_cap_reports.reported() + self.cell_overflow_reports.reported()
    }
}
