use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read running config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse running config '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Service restrictions recorded for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceLists {
    pub removed_services: Vec<String>,
    pub hidden_services: Vec<String>,
}

impl ServiceLists {
    pub fn is_removed(&self, service: &str) -> bool {
        self.removed_services.iter().any(|s| s == service)
    }

    pub fn is_hidden(&self, service: &str) -> bool {
        self.hidden_services.iter().any(|s| s == service)
    }
}

/// The document written by the last successful reconfigure.
///
/// A missing file is a fresh install, not an error: every query then
/// yields empty lists.
#[derive(Debug, Clone, Default)]
pub struct RunningConfig {
    document: Option<Value>,
}

impl RunningConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_str(content)?;
        Ok(Self {
            document: Some(document),
        })
    }

    /// Lists stored under `package_key`. A document without that key is
    /// read from its top level instead.
    pub fn service_lists(&self, package_key: &str) -> ServiceLists {
        let Some(document) = &self.document else {
            return ServiceLists::default();
        };
        let section = document.get(package_key).unwrap_or(document);
        ServiceLists {
            removed_services: string_list(section, "removed_services"),
            hidden_services: string_list(section, "hidden_services"),
        }
    }
}

fn string_list(section: &Value, field: &str) -> Vec<String> {
    section
        .get(field)
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
        .unwrap_or_default()
}

/// Maps a product's name to the package name its configuration is
/// stored under.
#[derive(Debug, Clone)]
pub struct PackageAliases {
    aliases: HashMap<String, String>,
}

impl Default for PackageAliases {
    fn default() -> Self {
        let mut aliases = HashMap::new();
        // opscode installs use the private-chef cookbook attributes
        aliases.insert("opscode".to_string(), "private-chef".to_string());
        Self { aliases }
    }
}

impl PackageAliases {
    pub fn insert(&mut self, name: &str, package: &str) {
        self.aliases.insert(name.to_string(), package.to_string());
    }

    pub fn package_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn config_key(&self, name: &str) -> String {
        self.package_name(name).replace('-', "_")
    }
}
