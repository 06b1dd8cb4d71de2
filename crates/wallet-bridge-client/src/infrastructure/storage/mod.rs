//! Storage infrastructure: the client settings file.
//!
//! The `settings` sub-module reads the TOML file that tells the CLI where
//! the backend lives, and writes a default one on request.  A missing file
//! is not an error; the built-in defaults apply.

pub mod settings;

pub use settings::{default_settings_path, load_settings, save_settings, Settings, SettingsError};
