//! `section.key` addressing for the `config get|set|list` commands.

use std::path::PathBuf;
use std::str::FromStr;

use crate::mesh::ElevationDecoder;

use super::file::{
    format_color, non_empty, parse_color, parse_optional, parse_value, ConfigError, ConfigFile,
};

/// A single configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    TerrainElevationUrl,
    TerrainTextureUrl,
    TerrainElevationDecoder,
    TerrainMeshMaxError,
    TerrainMinZoom,
    TerrainMaxZoom,
    TerrainColor,
    HttpTimeoutSecs,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::TerrainElevationUrl,
            ConfigKey::TerrainTextureUrl,
            ConfigKey::TerrainElevationDecoder,
            ConfigKey::TerrainMeshMaxError,
            ConfigKey::TerrainMinZoom,
            ConfigKey::TerrainMaxZoom,
            ConfigKey::TerrainColor,
            ConfigKey::HttpTimeoutSecs,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::TerrainElevationUrl
            | ConfigKey::TerrainTextureUrl
            | ConfigKey::TerrainElevationDecoder
            | ConfigKey::TerrainMeshMaxError
            | ConfigKey::TerrainMinZoom
            | ConfigKey::TerrainMaxZoom
            | ConfigKey::TerrainColor => "terrain",
            ConfigKey::HttpTimeoutSecs => "http",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::TerrainElevationUrl => "elevation_url",
            ConfigKey::TerrainTextureUrl => "texture_url",
            ConfigKey::TerrainElevationDecoder => "elevation_decoder",
            ConfigKey::TerrainMeshMaxError => "mesh_max_error",
            ConfigKey::TerrainMinZoom => "min_zoom",
            ConfigKey::TerrainMaxZoom => "max_zoom",
            ConfigKey::TerrainColor => "color",
            ConfigKey::HttpTimeoutSecs => "timeout_secs",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let terrain = &config.terrain;
        match self {
            ConfigKey::TerrainElevationUrl => terrain.elevation_url.clone().unwrap_or_default(),
            ConfigKey::TerrainTextureUrl => terrain.texture_url.clone().unwrap_or_default(),
            ConfigKey::TerrainElevationDecoder => terrain.elevation_decoder.to_string(),
            ConfigKey::TerrainMeshMaxError => terrain.mesh_max_error.to_string(),
            ConfigKey::TerrainMinZoom => terrain.min_zoom.to_string(),
            ConfigKey::TerrainMaxZoom => terrain.max_zoom.map(|z| z.to_string()).unwrap_or_default(),
            ConfigKey::TerrainColor => format_color(terrain.color),
            ConfigKey::HttpTimeoutSecs => config.http.timeout_secs.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let name = self.name();
        let terrain = &mut config.terrain;
        match self {
            ConfigKey::TerrainElevationUrl => terrain.elevation_url = non_empty(value),
            ConfigKey::TerrainTextureUrl => terrain.texture_url = non_empty(value),
            ConfigKey::TerrainElevationDecoder => {
                terrain.elevation_decoder = parse_value::<ElevationDecoder>(&name, value)?
            }
            ConfigKey::TerrainMeshMaxError => {
                let error: f32 = parse_value(&name, value)?;
                if !error.is_finite() || error < 0.0 {
                    return Err(ConfigError::InvalidValue {
                        key: name,
                        value: value.to_string(),
                        message: "must be a finite value >= 0".to_string(),
                    });
                }
                terrain.mesh_max_error = error;
            }
            ConfigKey::TerrainMinZoom => terrain.min_zoom = parse_value(&name, value)?,
            ConfigKey::TerrainMaxZoom => terrain.max_zoom = parse_optional(&name, value)?,
            ConfigKey::TerrainColor => terrain.color = parse_color(&name, value)?,
            ConfigKey::HttpTimeoutSecs => config.http.timeout_secs = parse_value(&name, value)?,
            ConfigKey::LoggingLevel => {
                config.logging.level = non_empty(value).ok_or_else(|| ConfigError::InvalidValue {
                    key: name.clone(),
                    value: value.to_string(),
                    message: "level must not be empty".to_string(),
                })?
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = non_empty(value).map(PathBuf::from)
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
        assert!("terrain.unknown".parse::<ConfigKey>().is_err());
        assert!("mesh_max_error".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::TerrainMeshMaxError.set(&mut config, "12.5").unwrap();
        assert_eq!(ConfigKey::TerrainMeshMaxError.get(&config), "12.5");

        ConfigKey::TerrainElevationDecoder.set(&mut config, "mapbox").unwrap();
        assert_eq!(config.terrain.elevation_decoder, ElevationDecoder::mapbox());

        ConfigKey::TerrainColor.set(&mut config, "0,128,255").unwrap();
        assert_eq!(ConfigKey::TerrainColor.get(&config), "0,128,255");
    }

    #[test]
    fn test_empty_value_clears_optional() {
        let mut config = ConfigFile::default();
        ConfigKey::TerrainMaxZoom.set(&mut config, "").unwrap();
        assert_eq!(config.terrain.max_zoom, None);
        assert_eq!(ConfigKey::TerrainMaxZoom.get(&config), "");

        ConfigKey::TerrainElevationUrl.set(&mut config, "  ").unwrap();
        assert_eq!(config.terrain.elevation_url, None);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::TerrainMeshMaxError.set(&mut config, "-1").is_err());
        assert!(ConfigKey::TerrainMinZoom.set(&mut config, "x").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "").is_err());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_sections_group_in_order() {
        let sections: Vec<&str> = ConfigKey::all().iter().map(|k| k.section()).collect();
        let mut deduped = sections.clone();
        deduped.dedup();
        assert_eq!(deduped, vec!["terrain", "http", "logging"]);
    }
}
