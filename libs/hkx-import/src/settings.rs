//! Importer settings file and converter location.
//!
//! Settings come from an optional TOML file; the command line overrides
//! individual values. Platform-specific converter lookup happens here, once,
//! so the pipeline itself only ever sees a resolved executable path.
//!
//! ```toml
//! converter_dir = "/opt/hkx-tools"
//! timeout_secs = 60
//! max_workers = 8
//! tiling_factor = 250.0
//! offset = [-5000.0, 0.0, -4000.0]
//! ```

use crate::converter::{ArgumentMode, ProcessConverter};
use crate::error::ImportError;
use config::constants::{converter_platform, ImportConfig, CONVERTER_BINARY_STEM};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values read from the settings file. Anything left out falls back to the
/// defaults in [`config::constants`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImporterSettings {
    /// Explicit converter executable; wins over `converter_dir`.
    pub converter_path: Option<PathBuf>,
    /// Directory holding the per-platform converter builds.
    pub converter_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub max_workers: Option<usize>,
    /// False for converter builds that only accept the file path.
    pub forward_placement: Option<bool>,
    pub tiling_factor: Option<f64>,
    pub offset: Option<[f64; 3]>,
}

impl ImporterSettings {
    /// Parses settings from TOML text.
    ///
    /// # Examples
    /// ```
    /// use hkx_import::settings::ImporterSettings;
    /// let settings = ImporterSettings::from_toml_str("max_workers = 4").unwrap();
    /// assert_eq!(settings.max_workers, Some(4));
    /// assert!(ImporterSettings::from_toml_str("max_wrokers = 4").is_err());
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self, ImportError> {
        toml::from_str(raw).map_err(|e| ImportError::settings(e.to_string()))
    }

    /// Reads and parses a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ImportError::settings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Validated numeric settings with defaults filled in.
    pub fn import_config(&self) -> Result<ImportConfig, ImportError> {
        let defaults = ImportConfig::default();
        ImportConfig::new(
            self.tiling_factor.unwrap_or(defaults.tiling_factor),
            self.offset.unwrap_or(defaults.offset),
            self.timeout_secs.unwrap_or(defaults.timeout_secs),
            self.max_workers.unwrap_or(defaults.max_workers),
        )
        .map_err(|e| ImportError::settings(e.to_string()))
    }

    pub fn argument_mode(&self) -> ArgumentMode {
        match self.forward_placement {
            Some(false) => ArgumentMode::PathOnly,
            _ => ArgumentMode::WithPlacement,
        }
    }

    /// Resolves the converter executable for the running platform.
    ///
    /// Order: `converter_path`, then `converter_dir`, then the directory the
    /// importer binary lives in.
    pub fn resolve_converter(&self) -> Result<PathBuf, ImportError> {
        if let Some(path) = &self.converter_path {
            return Ok(path.clone());
        }

        let dir = match &self.converter_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .ok_or_else(|| ImportError::settings("cannot locate the importer directory"))?,
        };

        platform_converter_path(&dir, std::env::consts::OS).ok_or_else(|| {
            ImportError::settings(format!(
                "no converter build for platform '{}'",
                std::env::consts::OS
            ))
        })
    }

    /// Builds the process converter these settings describe.
    pub fn process_converter(&self) -> Result<ProcessConverter, ImportError> {
        let config = self.import_config()?;
        let executable = self.resolve_converter()?;
        ensure_executable(&executable);
        Ok(ProcessConverter::new(executable)
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_mode(self.argument_mode()))
    }
}

/// Converter path inside `dir` for platform `os`.
///
/// # Examples
/// ```
/// use hkx_import::settings::platform_converter_path;
/// use std::path::Path;
///
/// assert_eq!(
///     platform_converter_path(Path::new("/opt/hkx"), "linux").unwrap(),
///     Path::new("/opt/hkx/linux-x64/BlenderConverter")
/// );
/// assert!(platform_converter_path(Path::new("/opt/hkx"), "macos").is_none());
/// ```
pub fn platform_converter_path(dir: &Path, os: &str) -> Option<PathBuf> {
    let (subdir, suffix) = converter_platform(os)?;
    Some(dir.join(subdir).join(format!("{CONVERTER_BINARY_STEM}{suffix}")))
}

/// Adds the executable bits to the converter if it exists without them.
/// Failures are logged; launching will report the real problem.
#[cfg(unix)]
pub fn ensure_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return;
    };
    let mut permissions = metadata.permissions();
    if permissions.mode() & 0o111 == 0o111 {
        return;
    }
    permissions.set_mode(permissions.mode() | 0o111);
    match std::fs::set_permissions(path, permissions) {
        Ok(()) => log::debug!("marked {} executable", path.display()),
        Err(err) => log::warn!("could not mark {} executable: {err}", path.display()),
    }
}

#[cfg(not(unix))]
pub fn ensure_executable(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use config::constants::{DEFAULT_OFFSET, DEFAULT_TILING_FACTOR};

    #[test]
    fn empty_file_uses_defaults() {
        let settings = ImporterSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ImporterSettings::default());
        let config = settings.import_config().unwrap();
        assert_eq!(config.tiling_factor, DEFAULT_TILING_FACTOR);
        assert_eq!(config.offset, DEFAULT_OFFSET);
        assert_eq!(settings.argument_mode(), ArgumentMode::WithPlacement);
    }

    #[test]
    fn full_file_parses() {
        let raw = r#"
            converter_path = "/opt/hkx/linux-x64/BlenderConverter"
            timeout_secs = 30
            max_workers = 2
            forward_placement = false
            tiling_factor = 125.0
            offset = [1.0, 2.0, 3.0]
        "#;
        let settings = ImporterSettings::from_toml_str(raw).unwrap();
        let config = settings.import_config().unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.offset, [1.0, 2.0, 3.0]);
        assert_eq!(settings.argument_mode(), ArgumentMode::PathOnly);
        assert_eq!(
            settings.resolve_converter().unwrap(),
            PathBuf::from("/opt/hkx/linux-x64/BlenderConverter")
        );
    }

    #[test]
    fn invalid_values_are_settings_errors() {
        let settings = ImporterSettings::from_toml_str("timeout_secs = 0").unwrap();
        let err = settings.import_config().unwrap_err();
        assert_eq!(err.kind(), "SettingsError");

        assert!(ImporterSettings::from_toml_str("offset = [1.0, 2.0]").is_err());
    }

    #[test]
    fn converter_dir_resolves_per_platform() {
        let settings = ImporterSettings {
            converter_dir: Some(PathBuf::from("/opt/hkx")),
            ..Default::default()
        };
        let resolved = settings.resolve_converter();
        match std::env::consts::OS {
            "linux" | "windows" => assert!(resolved.unwrap().starts_with("/opt/hkx")),
            _ => assert!(resolved.is_err()),
        }
    }

    #[test]
    fn windows_build_has_exe_suffix() {
        let path = platform_converter_path(Path::new("tools"), "windows").unwrap();
        assert_eq!(path, Path::new("tools").join("win-x64").join("BlenderConverter.exe"));
    }

    #[test]
    fn load_missing_file() {
        let err = ImporterSettings::load("/no/such/settings.toml").unwrap_err();
        assert!(err.to_string().contains("settings.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn ensure_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BlenderConverter");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        ensure_executable(&path);
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
