//! Configuration file management.
//!
//! Settings live in an INI file at `~/.terramesh/config.ini`. A missing file
//! means defaults; CLI arguments override file values when specified.
//!
//! ```ini
//! [terrain]
//! elevation_url = https://s3.amazonaws.com/elevation-tiles-prod/terrarium/{z}/{x}/{y}.png
//! texture_url =
//! elevation_decoder = terrarium
//! mesh_max_error = 4
//! min_zoom = 0
//! max_zoom = 15
//! color = 255,255,255
//!
//! [http]
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! directory =
//! ```

mod file;
mod keys;

pub use file::{
    config_directory, config_file_path, ConfigError, ConfigFile, HttpSettings, LoggingSettings,
    TerrainSettings, CONFIG_FILE_NAME, DEFAULT_ELEVATION_URL,
};
pub use keys::ConfigKey;
