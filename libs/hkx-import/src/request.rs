//! Conversion requests and the trigger adapter that builds them.

use config::constants::{is_collision_extension, DEFAULT_OFFSET, DEFAULT_TILING_FACTOR};
use std::io;
use std::path::{Path, PathBuf};

/// One file to convert, with the placement parameters forwarded to the
/// converter.
///
/// # Examples
/// ```
/// use hkx_import::ConversionRequest;
/// let request = ConversionRequest::new("/assets/rock.hksc");
/// assert_eq!(request.stem(), "rock");
/// assert_eq!(request.tiling_factor, 250.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub source_path: PathBuf,
    pub tiling_factor: f64,
    pub offset: [f64; 3],
}

impl ConversionRequest {
    /// Creates a request with the default tiling factor and offset.
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self::with_placement(source_path, DEFAULT_TILING_FACTOR, DEFAULT_OFFSET)
    }

    pub fn with_placement(
        source_path: impl Into<PathBuf>,
        tiling_factor: f64,
        offset: [f64; 3],
    ) -> Self {
        Self {
            source_path: source_path.into(),
            tiling_factor,
            offset,
        }
    }

    /// Identity key of the file in the scene: its base name without the
    /// final extension.
    pub fn stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The importer's trigger surface: a directory, the files picked in it and
/// the two placement parameters applied to the whole batch.
///
/// # Examples
/// ```
/// use hkx_import::request::ImportTrigger;
/// let trigger = ImportTrigger::new("/assets")
///     .with_files(["rock.hksc", "tree.hkrb"])
///     .with_placement(100.0, [0.0, 0.0, 0.0]);
/// let requests = trigger.requests();
/// assert_eq!(requests.len(), 2);
/// assert_eq!(requests[1].source_path, std::path::Path::new("/assets/tree.hkrb"));
/// assert_eq!(requests[1].tiling_factor, 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImportTrigger {
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
    pub tiling_factor: f64,
    pub offset: [f64; 3],
}

impl ImportTrigger {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            files: Vec::new(),
            tiling_factor: DEFAULT_TILING_FACTOR,
            offset: DEFAULT_OFFSET,
        }
    }

    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn with_placement(mut self, tiling_factor: f64, offset: [f64; 3]) -> Self {
        self.tiling_factor = tiling_factor;
        self.offset = offset;
        self
    }

    /// One request per picked file, in pick order. Relative file names are
    /// resolved against the trigger's directory.
    pub fn requests(&self) -> Vec<ConversionRequest> {
        self.files
            .iter()
            .map(|file| {
                ConversionRequest::with_placement(
                    self.directory.join(file),
                    self.tiling_factor,
                    self.offset,
                )
            })
            .collect()
    }
}

/// Returns true if `path` has a collision asset extension.
pub fn is_collision_asset(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_collision_extension)
}

/// Lists the collision assets directly inside `directory`, sorted by path.
pub fn collect_collision_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && is_collision_asset(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
