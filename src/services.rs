use crate::paths::Paths;
use std::fs;
use std::path::PathBuf;

/// View over the supervision tree: `sv/` holds one directory per
/// configured service, `service/` holds activation links for the
/// enabled ones.
///
/// Nothing is cached; every call rescans the filesystem. A missing tree
/// reads as no services.
#[derive(Debug, Clone)]
pub struct ServiceDirectory {
    sv_path: PathBuf,
    service_path: PathBuf,
}

impl ServiceDirectory {
    pub fn new(paths: &Paths) -> Self {
        Self {
            sv_path: paths.sv_path(),
            service_path: paths.service_path(),
        }
    }

    /// Every configured service, sorted by name.
    pub fn list_services(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.sv_path) else {
            return Vec::new();
        };
        let mut services: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| !name.starts_with('.'))
            .collect();
        services.sort();
        services
    }

    pub fn is_enabled(&self, service: &str) -> bool {
        fs::symlink_metadata(self.service_path.join(service))
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }
}
