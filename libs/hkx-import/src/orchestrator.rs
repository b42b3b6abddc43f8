//! Batch import: fan files out to workers, join, report.
//!
//! Each file runs convert → build → refine → reconcile on one worker. The
//! converter call is where the time goes, so files run in parallel; scene
//! mutation goes through [`SceneReconciler`], one file at a time.

use crate::converter::Converter;
use crate::error::ImportError;
use crate::reconcile::{ImportGroup, NamedMesh, SceneReconciler};
use crate::request::ConversionRequest;
use crate::scene::HostScene;
use config::constants::{worker_count, MAX_IMPORT_WORKERS};
use hkx_geometry::{build, refine};
use rayon::prelude::*;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal state of one file in a batch.
#[derive(Debug)]
pub struct ImportOutcome {
    pub source: PathBuf,
    pub result: Result<ImportGroup, ImportError>,
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-file outcomes of one batch, in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ImportOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &ImportError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (&o.source, err)))
    }

    pub fn is_complete_success(&self) -> bool {
        !self.outcomes.is_empty() && self.succeeded() == self.total()
    }

    /// End-of-batch status: one summary line, then one line per failed file.
    ///
    /// # Examples
    /// ```
    /// use hkx_import::BatchReport;
    /// assert_eq!(BatchReport::default().status_message(), "Imported 0 of 0 collision files");
    /// ```
    pub fn status_message(&self) -> String {
        let mut message = format!(
            "Imported {} of {} collision files",
            self.succeeded(),
            self.total()
        );
        for (source, err) in self.failures() {
            let _ = write!(message, "\n  {}: {} ({})", source.display(), err.kind(), err);
        }
        message
    }
}

/// Drives whole batches through the pipeline.
///
/// # Examples
/// ```
/// use hkx_import::converter::InMemoryConverter;
/// use hkx_import::scene::InMemoryScene;
/// use hkx_import::{ConversionRequest, ImportOrchestrator};
///
/// let mut converter = InMemoryConverter::default();
/// converter.insert("rock.hksc", "[]");
/// let mut orchestrator = ImportOrchestrator::new(converter, InMemoryScene::default());
///
/// let report = orchestrator.import_all(&[
///     ConversionRequest::new("rock.hksc"),
///     ConversionRequest::new("missing.hksc"),
/// ]);
/// assert_eq!(report.succeeded(), 1);
/// assert!(!report.outcomes[1].is_success());
/// ```
pub struct ImportOrchestrator<C, S> {
    converter: C,
    reconciler: SceneReconciler<S>,
    max_workers: usize,
}

impl<C, S> ImportOrchestrator<C, S>
where
    C: Converter,
    S: HostScene + Send,
{
    pub fn new(converter: C, scene: S) -> Self {
        Self {
            converter,
            reconciler: SceneReconciler::new(scene),
            max_workers: MAX_IMPORT_WORKERS,
        }
    }

    /// Caps the number of files converted at once.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.reconciler = self.reconciler.with_lock_timeout(timeout);
        self
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn reconciler(&self) -> &SceneReconciler<S> {
        &self.reconciler
    }

    pub fn into_scene(self) -> S {
        self.reconciler.into_scene()
    }

    /// Imports every request and returns one outcome per request, in
    /// request order. All workers have finished when this returns.
    ///
    /// Batches on one orchestrator never overlap; each call is one batch for
    /// the reconciler's same-batch name matching.
    pub fn import_all(&mut self, requests: &[ConversionRequest]) -> BatchReport {
        self.reconciler.begin_batch();
        let this: &Self = self;
        let workers = worker_count(requests.len(), this.max_workers);
        log::info!("importing {} files on {workers} workers", requests.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("hkx-import-{i}"))
            .build();

        let outcomes = match pool {
            Ok(pool) => pool.install(|| this.run_batch(requests)),
            Err(err) => {
                log::warn!("could not start import workers ({err}), using the shared pool");
                this.run_batch(requests)
            }
        };

        let report = BatchReport { outcomes };
        log::info!("{}", report.status_message());
        report
    }

    fn run_batch(&self, requests: &[ConversionRequest]) -> Vec<ImportOutcome> {
        requests
            .par_iter()
            .map(|request| ImportOutcome {
                source: request.source_path.clone(),
                result: self.import_one(request),
            })
            .collect()
    }

    /// Runs the full pipeline for one file on the calling thread.
    pub fn import_one(&self, request: &ConversionRequest) -> Result<ImportGroup, ImportError> {
        let result = self.prepare(request).and_then(|meshes| {
            let stem = request.stem();
            match self.reconciler.reconcile(&stem, &meshes) {
                Err(err) if err.is_retryable() => {
                    log::warn!("{err}, retrying once");
                    self.reconciler.reconcile(&stem, &meshes)
                }
                other => other,
            }
        });

        match &result {
            Ok(group) => log::info!(
                "{}: group '{}' with {} meshes",
                request.source_path.display(),
                group.name,
                group.mesh_count()
            ),
            Err(err) => log::error!("{}: {err}", request.source_path.display()),
        }
        result
    }

    /// Read phase: convert, rebuild and refine. Touches no shared state.
    fn prepare(&self, request: &ConversionRequest) -> Result<Vec<NamedMesh>, ImportError> {
        let records = self.converter.convert(request)?;

        records
            .into_iter()
            .map(|record| -> Result<NamedMesh, ImportError> {
                let buffer = build(&record).map_err(|source| ImportError::MalformedRecord {
                    path: request.source_path.clone(),
                    source,
                })?;
                let buffer = refine(buffer, &record.shape_name);
                log::debug!("{} created", record.shape_name);
                Ok(NamedMesh {
                    name: record.shape_name,
                    buffer,
                })
            })
            .collect()
    }
}
