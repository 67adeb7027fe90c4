//! Layer properties and the signatures derived from them.

use crate::config::ConfigFile;
use crate::coord::TileCoord;
use crate::mesh::{DecodeOptions, ElevationDecoder};
use crate::provider::UrlTemplate;

use super::error::LayerError;

/// Loading mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TerrainMode {
    /// One mesh per visible tile, driven by the external tile grid.
    #[default]
    Tiled,
    /// A single mesh for one raster covering `bounds`.
    Single,
}

/// Configuration surface of a terrain layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainProps {
    /// Elevation raster source. The layer stays idle until this is set.
    pub elevation_data: Option<UrlTemplate>,
    /// Texture raster source.
    pub texture: Option<UrlTemplate>,
    pub mesh_max_error: f32,
    pub elevation_decoder: ElevationDecoder,
    /// World bounds of the single mesh, `[min_x, min_y, max_x, max_y]`.
    pub bounds: Option<[f64; 4]>,
    /// Fallback color for untextured meshes.
    pub color: [u8; 3],
    pub wireframe: bool,
    pub material: bool,
    pub tile_size: u32,
    pub min_zoom: u8,
    /// `None` means unbounded.
    pub max_zoom: Option<u8>,
    pub extent: Option<[f64; 4]>,
    /// Concurrency cap the tile grid should honour.
    pub max_requests: usize,
    pub mode: TerrainMode,
    /// Raster addressed by the single mesh.
    pub single_tile: Option<TileCoord>,
}

impl Default for TerrainProps {
    fn default() -> Self {
        Self {
            elevation_data: None,
            texture: None,
            mesh_max_error: 4.0,
            elevation_decoder: ElevationDecoder::default(),
            bounds: None,
            color: [255, 255, 255],
            wireframe: false,
            material: true,
            tile_size: 512,
            min_zoom: 0,
            max_zoom: None,
            extent: None,
            max_requests: 6,
            mode: TerrainMode::Tiled,
            single_tile: None,
        }
    }
}

impl TerrainProps {
    /// Translate the `[terrain]` section of a config file into props.
    pub fn from_config(config: &ConfigFile) -> Result<Self, LayerError> {
        let terrain = &config.terrain;
        let elevation_data = terrain
            .elevation_url
            .as_deref()
            .map(str::parse::<UrlTemplate>)
            .transpose()?;
        let texture = terrain
            .texture_url
            .as_deref()
            .map(str::parse::<UrlTemplate>)
            .transpose()?;

        Ok(Self {
            elevation_data,
            texture,
            mesh_max_error: terrain.mesh_max_error,
            elevation_decoder: terrain.elevation_decoder,
            color: terrain.color,
            min_zoom: terrain.min_zoom,
            max_zoom: terrain.max_zoom,
            ..Self::default()
        })
    }

    /// Reject configurations that can never load a tile.
    pub fn validate(&self) -> Result<(), LayerError> {
        if let Some(max_zoom) = self.max_zoom {
            if self.min_zoom > max_zoom {
                return Err(LayerError::InvalidConfig(format!(
                    "min_zoom {} is above max_zoom {}",
                    self.min_zoom, max_zoom
                )));
            }
        }
        if !self.mesh_max_error.is_finite() || self.mesh_max_error < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "mesh_max_error must be a finite value >= 0, got {}",
                self.mesh_max_error
            )));
        }
        if !self.elevation_decoder.is_finite() {
            return Err(LayerError::InvalidConfig(
                "elevation decoder coefficients must be finite".to_string(),
            ));
        }
        if self.tile_size == 0 || self.max_requests == 0 {
            return Err(LayerError::InvalidConfig(
                "tile_size and max_requests must be positive".to_string(),
            ));
        }
        if let Some(bounds) = self.bounds {
            if bounds.iter().any(|v| !v.is_finite()) {
                return Err(LayerError::InvalidConfig(format!(
                    "bounds must be finite, got {:?}",
                    bounds
                )));
            }
        }
        Ok(())
    }

    /// Whether tiles at zoom `z` are loaded at all.
    pub fn in_zoom_range(&self, z: u8) -> bool {
        z >= self.min_zoom && self.max_zoom.map_or(true, |max| z <= max)
    }

    /// Fresh decode options for one call.
    pub fn decode_options(&self, bounds: Option<[f64; 4]>) -> DecodeOptions {
        DecodeOptions {
            bounds,
            mesh_max_error: self.mesh_max_error,
            elevation_decoder: self.elevation_decoder,
        }
    }

    /// Signature of the fields that invalidate tiled results.
    pub fn update_triggers(&self) -> UpdateTriggers {
        UpdateTriggers {
            elevation_data: trigger_string(&self.elevation_data),
            texture: trigger_string(&self.texture),
            mesh_max_error: self.mesh_max_error.to_bits(),
            elevation_decoder: self.elevation_decoder.to_bits(),
        }
    }

    /// Signature of the fields that invalidate the single mesh.
    pub fn single_signature(&self) -> SingleSignature {
        SingleSignature {
            triggers: self.update_triggers(),
            bounds: self.bounds.map(|b| b.map(f64::to_bits)),
            tile: self.single_tile,
        }
    }
}

fn trigger_string(template: &Option<UrlTemplate>) -> String {
    template
        .as_ref()
        .map(UrlTemplate::to_trigger_string)
        .unwrap_or_default()
}

/// Structural signature of everything a cached tile result depends on.
///
/// Float fields are compared by bit pattern so the signature can be hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UpdateTriggers {
    pub elevation_data: String,
    pub texture: String,
    pub mesh_max_error: u32,
    pub elevation_decoder: [u32; 4],
}

impl UpdateTriggers {
    /// Whether the data source differs, which forces a full reset.
    pub fn data_source_changed(&self, other: &UpdateTriggers) -> bool {
        self.elevation_data != other.elevation_data
    }
}

/// Signature of a single-mesh load.
///
/// The texture is part of the signature because its bytes travel with the
/// mesh load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SingleSignature {
    pub triggers: UpdateTriggers,
    pub bounds: Option<[u64; 4]>,
    pub tile: Option<TileCoord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> TerrainProps {
        TerrainProps {
            elevation_data: Some(UrlTemplate::new("https://e.example.com/{z}/{x}/{y}.png").unwrap()),
            ..TerrainProps::default()
        }
    }

    #[test]
    fn test_defaults() {
        let props = TerrainProps::default();
        assert_eq!(props.mesh_max_error, 4.0);
        assert_eq!(props.color, [255, 255, 255]);
        assert_eq!(props.tile_size, 512);
        assert_eq!(props.max_requests, 6);
        assert_eq!(props.mode, TerrainMode::Tiled);
        assert!(props.material);
        assert!(!props.wireframe);
        assert!(props.validate().is_ok());
    }

    #[test]
    fn test_zoom_range() {
        let mut props = props();
        props.min_zoom = 3;
        props.max_zoom = Some(8);
        assert!(!props.in_zoom_range(2));
        assert!(props.in_zoom_range(3));
        assert!(props.in_zoom_range(8));
        assert!(!props.in_zoom_range(9));

        props.max_zoom = None;
        assert!(props.in_zoom_range(24));
    }

    #[test]
    fn test_validate_rejects_inverted_zoom() {
        let mut props = props();
        props.min_zoom = 10;
        props.max_zoom = Some(5);
        assert!(matches!(props.validate(), Err(LayerError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_error() {
        let mut props = props();
        props.mesh_max_error = f32::INFINITY;
        assert!(props.validate().is_err());
        props.mesh_max_error = -0.5;
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_triggers_ignore_render_only_fields() {
        let base = props();
        let mut changed = base.clone();
        changed.color = [0, 0, 0];
        changed.wireframe = true;
        changed.max_requests = 2;
        changed.min_zoom = 4;
        assert_eq!(base.update_triggers(), changed.update_triggers());
    }

    #[test]
    fn test_triggers_track_reload_fields() {
        let base = props();

        let mut error = base.clone();
        error.mesh_max_error = 8.0;
        assert_ne!(base.update_triggers(), error.update_triggers());
        assert!(!base.update_triggers().data_source_changed(&error.update_triggers()));

        let mut decoder = base.clone();
        decoder.elevation_decoder = ElevationDecoder::terrarium();
        assert_ne!(base.update_triggers(), decoder.update_triggers());

        let mut texture = base.clone();
        texture.texture = Some("a/{z};b/{z}".parse().unwrap());
        assert_eq!(texture.update_triggers().texture, "a/{z};b/{z}");

        let mut source = base.clone();
        source.elevation_data = Some(UrlTemplate::new("https://other/{z}/{x}/{y}.png").unwrap());
        assert!(base.update_triggers().data_source_changed(&source.update_triggers()));
    }

    #[test]
    fn test_single_signature_tracks_bounds() {
        let mut a = props();
        a.mode = TerrainMode::Single;
        a.bounds = Some([0.0, 0.0, 1.0, 1.0]);
        let mut b = a.clone();
        b.bounds = Some([0.0, 0.0, 2.0, 1.0]);
        assert_ne!(a.single_signature(), b.single_signature());
        assert_eq!(a.single_signature(), a.clone().single_signature());
    }

    #[test]
    fn test_from_config() {
        let mut config = ConfigFile::default();
        config.terrain.texture_url = Some("https://t.example.com/{z}/{x}/{y}.jpg".to_string());
        config.terrain.min_zoom = 5;
        config.terrain.max_zoom = Some(11);

        let props = TerrainProps::from_config(&config).unwrap();
        assert!(props.elevation_data.is_some());
        assert!(props.texture.is_some());
        assert_eq!(props.elevation_decoder, ElevationDecoder::terrarium());
        assert_eq!(props.min_zoom, 5);
        assert_eq!(props.max_zoom, Some(11));
        assert_eq!(props.tile_size, 512);
    }
}
