use super::{decode_output, Converter};
use crate::error::ImportError;
use crate::request::ConversionRequest;
use hkx_geometry::GeometryRecord;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Converter that answers from canned stdout instead of a process.
///
/// Output still goes through [`decode_output`], so corrupt documents fail
/// exactly like they would from the real converter. Paths without an entry
/// fail the way the converter does on a missing file.
///
/// # Examples
/// ```
/// use hkx_import::converter::{Converter, InMemoryConverter};
/// use hkx_import::ConversionRequest;
///
/// let mut converter = InMemoryConverter::default();
/// converter.insert("rock.hksc", "[]");
/// assert!(converter.convert(&ConversionRequest::new("rock.hksc")).unwrap().is_empty());
/// assert!(converter.convert(&ConversionRequest::new("tree.hksc")).is_err());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryConverter {
    outputs: HashMap<PathBuf, Vec<u8>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl InMemoryConverter {
    /// Registers the stdout produced for `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, stdout: impl Into<Vec<u8>>) {
        self.outputs.insert(path.into(), stdout.into());
    }

    /// Makes every conversion take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of conversions observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Converter for InMemoryConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<Vec<GeometryRecord>, ImportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let result = match self.outputs.get(&request.source_path) {
            Some(stdout) => decode_output(&request.source_path, stdout),
            None => Err(ImportError::output(
                &request.source_path,
                "converter exited with status 1: file not found",
            )),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
