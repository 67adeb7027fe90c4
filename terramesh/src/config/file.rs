use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::mesh::ElevationDecoder;
use crate::provider::DEFAULT_TIMEOUT_SECS;

/// Name of the configuration file inside [`config_directory`].
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// AWS open terrain tiles, Terrarium encoding.
pub const DEFAULT_ELEVATION_URL: &str =
    "https://s3.amazonaws.com/elevation-tiles-prod/terrarium/{z}/{x}/{y}.png";

/// Errors from reading, writing or editing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// `[terrain]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSettings {
    /// Elevation raster URL template; `;` separates alternatives.
    pub elevation_url: Option<String>,
    /// Texture raster URL template; `;` separates alternatives.
    pub texture_url: Option<String>,
    pub elevation_decoder: ElevationDecoder,
    pub mesh_max_error: f32,
    pub min_zoom: u8,
    pub max_zoom: Option<u8>,
    /// Fallback color for untextured tiles.
    pub color: [u8; 3],
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            elevation_url: Some(DEFAULT_ELEVATION_URL.to_string()),
            texture_url: None,
            elevation_decoder: ElevationDecoder::terrarium(),
            mesh_max_error: 4.0,
            min_zoom: 0,
            max_zoom: Some(15),
            color: [255, 255, 255],
        }
    }
}

/// `[http]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Directory for daily log files; `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub terrain: TerrainSettings,
    pub http: HttpSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("terrain")) {
            let terrain = &mut config.terrain;
            if let Some(value) = section.get("elevation_url") {
                terrain.elevation_url = non_empty(value);
            }
            if let Some(value) = section.get("texture_url") {
                terrain.texture_url = non_empty(value);
            }
            parse_into(section, "terrain", "elevation_decoder", &mut terrain.elevation_decoder)?;
            parse_into(section, "terrain", "mesh_max_error", &mut terrain.mesh_max_error)?;
            parse_into(section, "terrain", "min_zoom", &mut terrain.min_zoom)?;
            if let Some(value) = section.get("max_zoom") {
                terrain.max_zoom = parse_optional("terrain.max_zoom", value)?;
            }
            if let Some(value) = section.get("color") {
                terrain.color = parse_color("terrain.color", value)?;
            }
        }

        if let Some(section) = ini.section(Some("http")) {
            parse_into(section, "http", "timeout_secs", &mut config.http.timeout_secs)?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(value) = section.get("level") {
                if let Some(level) = non_empty(value) {
                    config.logging.level = level;
                }
            }
            if let Some(value) = section.get("directory") {
                config.logging.directory = non_empty(value).map(PathBuf::from);
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let terrain = &self.terrain;

        ini.with_section(Some("terrain"))
            .set("elevation_url", terrain.elevation_url.clone().unwrap_or_default())
            .set("texture_url", terrain.texture_url.clone().unwrap_or_default())
            .set("elevation_decoder", terrain.elevation_decoder.to_string())
            .set("mesh_max_error", terrain.mesh_max_error.to_string())
            .set("min_zoom", terrain.min_zoom.to_string())
            .set(
                "max_zoom",
                terrain.max_zoom.map(|z| z.to_string()).unwrap_or_default(),
            )
            .set("color", format_color(terrain.color));

        ini.with_section(Some("http"))
            .set("timeout_secs", self.http.timeout_secs.to_string());

        ini.with_section(Some("logging"))
            .set("level", self.logging.level.clone())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );

        ini
    }
}

/// `~/.terramesh`, or `./.terramesh` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".terramesh")
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

pub(super) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub(super) fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: e.to_string(),
        })
}

pub(super) fn parse_optional<T>(key: &str, value: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(value) {
        Some(value) => parse_value(key, &value).map(Some),
        None => Ok(None),
    }
}

pub(super) fn parse_color(key: &str, value: &str) -> Result<[u8; 3], ConfigError> {
    let channels: Vec<u8> = value
        .split(',')
        .map(|c| parse_value(key, c))
        .collect::<Result<_, _>>()?;
    channels
        .try_into()
        .map_err(|channels: Vec<u8>| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: format!("expected 3 channels, got {}", channels.len()),
        })
}

pub(super) fn format_color(color: [u8; 3]) -> String {
    format!("{},{},{}", color[0], color[1], color[2])
}

fn parse_into<T>(
    section: &Properties,
    section_name: &str,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = section.get(key) {
        if non_empty(value).is_some() {
            *target = parse_value(&format!("{}.{}", section_name, key), value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(
            config.terrain.elevation_url.as_deref(),
            Some(DEFAULT_ELEVATION_URL)
        );
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ConfigFile::default();
        config.terrain.texture_url = Some("https://a.example.com/{z}/{x}/{y}.jpg".to_string());
        config.terrain.elevation_decoder = ElevationDecoder::mapbox();
        config.terrain.max_zoom = None;
        config.terrain.color = [10, 20, 30];
        config.http.timeout_secs = 5;
        config.logging.directory = Some(PathBuf::from("/var/log/terramesh"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[terrain]\nmesh_max_error = 10\nmin_zoom = 5\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.terrain.mesh_max_error, 10.0);
        assert_eq!(config.terrain.min_zoom, 5);
        assert_eq!(config.terrain.max_zoom, Some(15));
        assert_eq!(config.http, HttpSettings::default());
    }

    #[test]
    fn test_invalid_value_names_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[terrain]\nmin_zoom = high\n").unwrap();

        match ConfigFile::load_from(&path) {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "terrain.min_zoom"),
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("c", "1, 2,3").unwrap(), [1, 2, 3]);
        assert!(parse_color("c", "1,2").is_err());
        assert!(parse_color("c", "1,2,300").is_err());
    }

    #[test]
    fn test_config_file_path_ends_with_name() {
        assert!(config_file_path().ends_with(".terramesh/config.ini"));
    }
}
