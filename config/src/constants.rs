//! # Configuration Constants
//!
//! Centralized constants for the collision import pipeline.
//!
//! ## Categories
//!
//! - **Converter**: Placement defaults, timeouts, binary naming
//! - **Shapes**: Shape kinds whose topology is derived locally
//! - **Precision**: Floating-point tolerances for hull construction
//! - **Concurrency**: Worker bounds and scene lock timeouts

use std::fmt;

// =============================================================================
// CONVERTER CONSTANTS
// =============================================================================

/// Default tiling scale factor forwarded to the converter.
///
/// The factor controls how large terrain assets are partitioned. Its
/// semantics belong to the converter; the importer only forwards it.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_TILING_FACTOR;
///
/// let user_factor: Option<f64> = None;
/// assert_eq!(user_factor.unwrap_or(DEFAULT_TILING_FACTOR), 250.0);
/// ```
pub const DEFAULT_TILING_FACTOR: f64 = 250.0;

/// Default spatial offset `(x, y, z)` forwarded to the converter.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_OFFSET;
///
/// let [x, y, z] = DEFAULT_OFFSET;
/// assert_eq!((x, y, z), (-5000.0, 0.0, -4000.0));
/// ```
pub const DEFAULT_OFFSET: [f64; 3] = [-5000.0, 0.0, -4000.0];

/// Wall-clock limit for a single converter run, in seconds.
///
/// A run that exceeds it is killed and reported as a timeout for that file
/// only.
pub const CONVERTER_TIMEOUT_SECS: u64 = 120;

/// File stem of the converter executable.
pub const CONVERTER_BINARY_STEM: &str = "BlenderConverter";

/// Converter sub-directory and executable suffix per platform name.
///
/// Platform names follow `std::env::consts::OS`.
///
/// # Example
///
/// ```rust
/// use config::constants::converter_platform;
///
/// assert_eq!(converter_platform("linux"), Some(("linux-x64", "")));
/// assert_eq!(converter_platform("windows"), Some(("win-x64", ".exe")));
/// assert_eq!(converter_platform("haiku"), None);
/// ```
pub fn converter_platform(os: &str) -> Option<(&'static str, &'static str)> {
    match os {
        "linux" => Some(("linux-x64", "")),
        "windows" => Some(("win-x64", ".exe")),
        _ => None,
    }
}

/// File extensions (lowercase, without dot) of the collision assets the
/// converter understands.
pub const COLLISION_EXTENSIONS: [&str; 3] = ["hksc", "hkrb", "hktmrb"];

/// Returns true if `extension` names a collision asset, ignoring ASCII case.
///
/// # Example
///
/// ```rust
/// use config::constants::is_collision_extension;
///
/// assert!(is_collision_extension("hkrb"));
/// assert!(is_collision_extension("HKSC"));
/// assert!(!is_collision_extension("bfres"));
/// ```
pub fn is_collision_extension(extension: &str) -> bool {
    COLLISION_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
}

// =============================================================================
// SHAPE CONSTANTS
// =============================================================================

/// Shape kinds stored natively as a convex point cloud.
///
/// The converter emits only the hull-defining points for these, so the
/// importer derives their topology with a convex hull.
pub const HULL_SHAPE_KINDS: [&str; 2] = ["hkpConvexVerticesShape", "hkpBoxShape"];

/// Returns true if `shape_name` is one of [`HULL_SHAPE_KINDS`].
///
/// Matching is exact and case-sensitive.
#[inline]
pub fn is_hull_kind(shape_name: &str) -> bool {
    HULL_SHAPE_KINDS.contains(&shape_name)
}

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Relative tolerance for hull plane tests.
///
/// Scaled by the extent of the point cloud, so assets placed thousands of
/// units from the origin keep the same effective precision.
///
/// # Example
///
/// ```rust
/// use config::constants::{hull_tolerance, HULL_EPSILON};
///
/// assert_eq!(hull_tolerance(0.0), HULL_EPSILON);
/// assert!(hull_tolerance(5000.0) > hull_tolerance(1.0));
/// ```
pub const HULL_EPSILON: f64 = 1e-9;

/// Absolute hull tolerance for a point cloud whose largest absolute
/// coordinate is `max_abs_coordinate`.
#[inline]
pub fn hull_tolerance(max_abs_coordinate: f64) -> f64 {
    HULL_EPSILON * (1.0 + max_abs_coordinate.abs())
}

// =============================================================================
// CONCURRENCY CONSTANTS
// =============================================================================

/// Upper bound on concurrent converter processes in one batch.
pub const MAX_IMPORT_WORKERS: usize = 16;

/// How long a reconciliation waits for exclusive scene access before
/// reporting a conflict, in milliseconds.
pub const SCENE_LOCK_TIMEOUT_MS: u64 = 30_000;

/// Number of workers to use for a batch of `file_count` files.
///
/// One worker per file, clamped to `1..=max_workers`.
///
/// # Example
///
/// ```rust
/// use config::constants::worker_count;
///
/// assert_eq!(worker_count(5, 16), 5);
/// assert_eq!(worker_count(40, 16), 16);
/// assert_eq!(worker_count(0, 16), 1);
/// ```
pub fn worker_count(file_count: usize, max_workers: usize) -> usize {
    file_count.clamp(1, max_workers.max(1))
}

// =============================================================================
// VALIDATED SNAPSHOT
// =============================================================================

/// Immutable snapshot of the numeric settings one import batch runs with.
///
/// # Examples
/// ```
/// use config::constants::ImportConfig;
/// let config = ImportConfig::default();
/// assert_eq!(config.tiling_factor, 250.0);
/// assert!(config.max_workers >= 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportConfig {
    /// Tiling factor forwarded to the converter.
    pub tiling_factor: f64,
    /// Offset forwarded to the converter.
    pub offset: [f64; 3],
    /// Converter run limit in seconds.
    pub timeout_secs: u64,
    /// Upper bound on concurrent workers.
    pub max_workers: usize,
}

impl ImportConfig {
    /// Builds a configuration, rejecting values the pipeline cannot honour.
    ///
    /// # Examples
    /// ```
    /// use config::constants::{ConfigError, ImportConfig};
    /// let cfg = ImportConfig::new(100.0, [0.0, 0.0, 0.0], 30, 4).expect("valid config");
    /// assert_eq!(cfg.max_workers, 4);
    /// assert_eq!(
    ///     ImportConfig::new(f64::NAN, [0.0; 3], 30, 4).unwrap_err(),
    ///     ConfigError::InvalidTilingFactor
    /// );
    /// ```
    pub fn new(
        tiling_factor: f64,
        offset: [f64; 3],
        timeout_secs: u64,
        max_workers: usize,
    ) -> Result<Self, ConfigError> {
        if !tiling_factor.is_finite() {
            return Err(ConfigError::InvalidTilingFactor);
        }
        if offset.iter().any(|component| !component.is_finite()) {
            return Err(ConfigError::InvalidOffset);
        }
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if max_workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(Self {
            tiling_factor,
            offset,
            timeout_secs,
            max_workers,
        })
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            tiling_factor: DEFAULT_TILING_FACTOR,
            offset: DEFAULT_OFFSET,
            timeout_secs: CONVERTER_TIMEOUT_SECS,
            max_workers: MAX_IMPORT_WORKERS,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Tiling factor is NaN or infinite.
    InvalidTilingFactor,
    /// An offset component is NaN or infinite.
    InvalidOffset,
    /// Timeout is zero.
    InvalidTimeout,
    /// Worker bound is zero.
    InvalidWorkers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTilingFactor => write!(f, "tiling factor must be finite"),
            ConfigError::InvalidOffset => write!(f, "offset components must be finite"),
            ConfigError::InvalidTimeout => write!(f, "converter timeout must be positive"),
            ConfigError::InvalidWorkers => write!(f, "max_workers must be >= 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
