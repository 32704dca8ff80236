use super::grid::ClusterGrid;
use super::lights_buffer::LightsBuffer;
use crate::Result;
use helio_core::{GpuTexture, TextureDevice};

/// Owns the textures clustered lighting samples and pushes CPU data into them.
pub struct ClusterTextures<D: TextureDevice> {
    device: D,
    name: String,
    cluster: Option<D::Texture>,
    lights8: D::Texture,
    lights_float: Option<D::Texture>,
}

impl<D: TextureDevice> ClusterTextures<D> {
    /// Creates the light textures. The cluster texture waits for a layout.
    pub fn new(device: D, name: &str, lights: &LightsBuffer) -> Result<Self> {
        let lights8 = device.create_texture(lights.texture8_desc(name))?;
        let lights_float = lights
            .texture_float_desc(name)
            .map(|desc| device.create_texture(desc))
            .transpose()?;

        Ok(Self {
            device,
            name: name.to_string(),
            cluster: None,
            lights8,
            lights_float,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn cluster(&self) -> Option<&D::Texture> {
        self.cluster.as_ref()
    }

    pub fn lights8(&self) -> &D::Texture {
        &self.lights8
    }

    pub fn lights_float(&self) -> Option<&D::Texture> {
        self.lights_float.as_ref()
    }

    /// Uploads this frame's buffers, recreating the cluster texture first if
    /// the grid's size changed. Every texture is written even if an earlier
    /// one fails, and the first error is returned.
    pub fn upload(&mut self, grid: Option<&ClusterGrid>, lights: &LightsBuffer) -> Result<()> {
        let cluster = match grid {
            Some(grid) => self.upload_cluster(grid),
            None => Ok(()),
        };
        let lights8 = self.lights8.write(lights.data8());
        let lights_float = match self.lights_float.as_mut() {
            Some(texture) => texture.write(bytemuck::cast_slice(lights.data_float())),
            None => Ok(()),
        };

        cluster?;
        lights8?;
        lights_float?;
        Ok(())
    }

    fn upload_cluster(&mut self, grid: &ClusterGrid) -> Result<()> {
        let desc = grid.layout().texture_desc(format!("{} Clusters", self.name));
        let stale = self
            .cluster
            .as_ref()
            .map_or(true, |texture| texture.desc() != &desc);
        if stale {
            log::debug!(
                "Cluster texture for '{}' resized to {}x{}",
                self.name,
                desc.width,
                desc.height
            );
            self.cluster = Some(self.device.create_texture(desc)?);
        }
        if let Some(cluster) = self.cluster.as_mut() {
            cluster.write(grid.clusters())?;
        }
        Ok(())
    }
}
