//! # Configuration Collaborator
//!
//! Supplies each registered component with an opaque configuration
//! tree at registration time. The kernel asks its
//! [`ConfigurationProvider`] for a [`ConfigNode`] keyed by component
//! name; the provider never fails and returns an empty node when no
//! configuration exists for the component.
//!
//! Providers included here: [`NullConfiguration`] (always empty, the
//! kernel default), [`MemoryConfiguration`] (built programmatically),
//! and [`FileConfiguration`] (a single document keyed by component
//! name, JSON always, YAML/TOML behind the `yaml-config` /
//! `toml-config` features).

pub mod error;

pub use error::ConfigError;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// An opaque configuration tree attached to a component model.
///
/// Backed by a JSON value regardless of the source format. The empty
/// node is `null`; accessors on missing children return empty nodes
/// or `None` rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode(Value);

impl ConfigNode {
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    /// Child subtree by key; empty node if absent.
    pub fn child(&self, key: &str) -> ConfigNode {
        match self.0.get(key) {
            Some(value) => ConfigNode(value.clone()),
            None => ConfigNode::empty(),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Deserialize the whole node into a typed settings struct.
    pub fn deserialize_into<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(self.0.clone())
            .map_err(|e| ConfigError::Deserialization(e.to_string()))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Supplies configuration trees keyed by component name.
///
/// Implementations must never fail; a component without configuration
/// gets an empty node.
pub trait ConfigurationProvider: Send + Sync {
    fn configuration(&self, component: &str) -> ConfigNode;
}

/// Provider with no configuration at all. The kernel default.
#[derive(Debug, Default)]
pub struct NullConfiguration;

impl ConfigurationProvider for NullConfiguration {
    fn configuration(&self, _component: &str) -> ConfigNode {
        ConfigNode::empty()
    }
}

/// Programmatically built configuration, one node per component name.
#[derive(Debug, Default)]
pub struct MemoryConfiguration {
    nodes: HashMap<String, ConfigNode>,
}

impl MemoryConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a component's configuration value, replacing any previous one.
    pub fn set<T: Serialize>(mut self, component: &str, value: T) -> Result<Self, ConfigError> {
        let value = serde_json::to_value(value)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;
        self.nodes
            .insert(component.to_string(), ConfigNode::from_value(value));
        Ok(self)
    }
}

impl ConfigurationProvider for MemoryConfiguration {
    fn configuration(&self, component: &str) -> ConfigNode {
        self.nodes.get(component).cloned().unwrap_or_default()
    }
}

/// Configuration loaded from a single document whose top-level keys
/// are component names.
#[derive(Debug)]
pub struct FileConfiguration {
    nodes: HashMap<String, ConfigNode>,
}

impl FileConfiguration {
    /// Load the document at `path`, picking the format from the file
    /// extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.to_path_buf() })?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root = Self::parse(&data, format).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        let nodes = match root {
            Value::Object(map) => map
                .into_iter()
                .map(|(name, value)| (name, ConfigNode::from_value(value)))
                .collect(),
            Value::Null => HashMap::new(),
            _ => {
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    message: "top-level document must be a table of component names".to_string(),
                });
            }
        };
        Ok(Self { nodes })
    }

    fn parse(data: &str, format: ConfigFormat) -> Result<Value, String> {
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| e.to_string()),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| e.to_string()),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                let value: toml::Value = toml::from_str(data).map_err(|e| e.to_string())?;
                serde_json::to_value(value).map_err(|e| e.to_string())
            }
        }
    }
}

impl ConfigurationProvider for FileConfiguration {
    fn configuration(&self, component: &str) -> ConfigNode {
        self.nodes.get(component).cloned().unwrap_or_default()
    }
}
