//! Documented configuration pattern
//!
//! Config structs describe their fields once through `documented_config!`;
//! the generated impl writes a TOML file where every line carries its
//! description as a trailing comment, so a freshly created config file
//! doubles as its own reference.
//!
//! Fields with serde defaults are always populated, so every field is
//! written uncommented.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata about a configuration field
#[derive(Debug, Clone)]
pub struct ConfigFieldMeta {
    pub name: &'static str,
    /// TOML-serialized default value, or None if serialization failed
    pub default_value: Option<String>,
    pub description: &'static str,
}

/// Trait for configs with documented defaults
///
/// Implemented by the `documented_config!` macro.
pub trait DocumentedConfig: Sized + Default {
    fn field_metadata() -> Vec<ConfigFieldMeta>;

    /// TOML-serialized value for a specific field
    fn get_field_value(&self, field_name: &str) -> String;

    fn default_config_path() -> Result<PathBuf>;

    /// Save config with an inline description next to every value
    fn save_with_documentation(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        let mut output = String::new();
        for field in Self::field_metadata() {
            let value = self.get_field_value(field.name);
            match field.default_value {
                Some(default) if default != value => output.push_str(&format!(
                    "{} = {}  # {} (default: {})\n",
                    field.name, value, field.description, default
                )),
                _ => output.push_str(&format!(
                    "{} = {}  # {}\n",
                    field.name, value, field.description
                )),
            }
        }

        fs::write(path, output).with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Load from `path`, writing a documented default file when none exists
    fn load_from_path_documented(path: &Path) -> Result<Self>
    where
        for<'de> Self: serde::de::Deserialize<'de>,
    {
        if !path.exists() {
            let config = Self::default();
            config.save_with_documentation(path)?;
            return Ok(config);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Generate a `DocumentedConfig` implementation
///
/// ```ignore
/// documented_config!(MarkcutConfig {
///     fields: [
///         target_window_class, "Window class substring of the video player",
///     ],
///     config_path: paths::config_file_path(),
/// });
/// ```
#[macro_export]
macro_rules! documented_config {
    (
        $config_name:ident {
            fields: [
                $($field:ident, $desc:expr),* $(,)?
            ],
            config_path: $path:expr $(,)?
        }
    ) => {
        impl $crate::common::config::DocumentedConfig for $config_name {
            fn field_metadata() -> Vec<$crate::common::config::ConfigFieldMeta> {
                let default_config = Self::default();
                vec![
                    $(
                        $crate::common::config::ConfigFieldMeta {
                            name: stringify!($field),
                            default_value: toml::Value::try_from(&default_config.$field)
                                .map(|v| v.to_string())
                                .ok(),
                            description: $desc,
                        },
                    )*
                ]
            }

            fn get_field_value(&self, field_name: &str) -> String {
                match field_name {
                    $(
                        stringify!($field) => {
                            toml::Value::try_from(&self.$field)
                                .map(|v| v.to_string())
                                .unwrap_or_else(|_| format!("{:?}", self.$field))
                        }
                    )*
                    _ => String::new(),
                }
            }

            fn default_config_path() -> anyhow::Result<std::path::PathBuf> {
                $path
            }
        }
    };
}
