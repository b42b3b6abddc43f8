//! # Import Errors
//!
//! Every error is scoped to the file that produced it; none of them abort
//! sibling files in the same batch.

use crate::scene::SceneError;
use hkx_geometry::GeometryError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while importing one collision file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The converter executable is missing or could not be started.
    #[error(
        "Converter {} could not be started for {}: {source}",
        converter.display(),
        path.display()
    )]
    ConverterLaunch {
        path: PathBuf,
        converter: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but its output is not a usable geometry document.
    #[error("Converter output for {} is unusable: {message}", path.display())]
    ConverterOutput { path: PathBuf, message: String },

    /// The converter did not finish within its time limit.
    #[error("Converter timed out after {}s on {}", timeout.as_secs_f64(), path.display())]
    ConverterTimeout { path: PathBuf, timeout: Duration },

    /// A decoded record could not be turned into a mesh.
    #[error("Malformed record in {}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: GeometryError,
    },

    /// Exclusive access to the target group name could not be obtained.
    #[error("Scene conflict while reconciling '{stem}'")]
    SceneConflict { stem: String },

    /// The host scene rejected an operation.
    #[error("Scene operation failed: {0}")]
    Scene(#[from] SceneError),

    /// Settings could not be read or are invalid.
    #[error("Settings error: {message}")]
    Settings { message: String },
}

impl ImportError {
    /// Creates a converter output error.
    pub fn output(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConverterOutput {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a settings error.
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Returns true if running the failed step again may succeed once the
    /// competing reconciliation finishes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SceneConflict { .. })
    }

    /// Short kind name used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConverterLaunch { .. } => "ConverterLaunchError",
            Self::ConverterOutput { .. } => "ConverterOutputError",
            Self::ConverterTimeout { .. } => "ConverterTimeoutError",
            Self::MalformedRecord { .. } => "MalformedRecordError",
            Self::SceneConflict { .. } => "SceneConflictError",
            Self::Scene(_) => "SceneError",
            Self::Settings { .. } => "SettingsError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::output("/tmp/corrupt.hkrb", "expected value at line 1 column 1");
        assert!(err.to_string().contains("corrupt.hkrb"));
        assert!(err.to_string().contains("line 1"));

        let err = ImportError::ConverterTimeout {
            path: PathBuf::from("slow.hksc"),
            timeout: Duration::from_secs(2),
        };
        assert!(err.to_string().contains("2s"));
    }

    #[test]
    fn test_only_scene_conflict_is_retryable() {
        assert!(ImportError::SceneConflict { stem: "rock".into() }.is_retryable());
        assert!(!ImportError::output("a", "b").is_retryable());
        assert!(!ImportError::Scene(SceneError::NameTaken("rock".into())).is_retryable());
    }

    #[test]
    fn test_kind_names() {
        let launch = ImportError::ConverterLaunch {
            path: PathBuf::from("a.hksc"),
            converter: PathBuf::from("missing"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(launch.kind(), "ConverterLaunchError");
        let malformed = ImportError::MalformedRecord {
            path: PathBuf::from("a.hksc"),
            source: GeometryError::malformed("hkpBoxShape", "bad"),
        };
        assert_eq!(malformed.kind(), "MalformedRecordError");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImportError>();
    }
}
