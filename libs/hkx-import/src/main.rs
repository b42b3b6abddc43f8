//! `hkx-import`: import collision assets through the external converter.
//!
//! ```text
//! hkx-import assets/ --converter tools/linux-x64/BlenderConverter
//! hkx-import rock.hksc tree.hkrb --tiling-factor 125 --offset -2500 0 -2000
//! ```
//!
//! Exit status is 0 when every file imported, 2 when some did and 1 when
//! none did (or there was nothing to import).

use clap::Parser;
use hkx_import::request::{collect_collision_files, is_collision_asset};
use hkx_import::scene::InMemoryScene;
use hkx_import::settings::ImporterSettings;
use hkx_import::{BatchReport, ConversionRequest, ImportError, ImportOrchestrator};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "hkx-import", version, about = "Import collision assets into a scene")]
struct Args {
    /// Collision files, or directories to scan for .hksc/.hkrb/.hktmrb files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Converter executable. Defaults to the platform build next to this binary.
    #[arg(long)]
    converter: Option<PathBuf>,

    /// TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    tiling_factor: Option<f64>,

    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    offset: Option<Vec<f64>>,

    /// Converter timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum files converted at once.
    #[arg(long)]
    workers: Option<usize>,

    /// Pass only the file path to the converter (older converter builds).
    #[arg(long)]
    path_only: bool,
}

impl Args {
    /// Settings file values with command-line overrides applied.
    fn settings(&self) -> Result<ImporterSettings, ImportError> {
        let mut settings = match &self.config {
            Some(path) => ImporterSettings::load(path)?,
            None => ImporterSettings::default(),
        };

        if let Some(converter) = &self.converter {
            settings.converter_path = Some(converter.clone());
        }
        if let Some(tiling_factor) = self.tiling_factor {
            settings.tiling_factor = Some(tiling_factor);
        }
        if let Some(offset) = &self.offset {
            if let [x, y, z] = offset[..] {
                settings.offset = Some([x, y, z]);
            }
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = Some(timeout);
        }
        if let Some(workers) = self.workers {
            settings.max_workers = Some(workers);
        }
        if self.path_only {
            settings.forward_placement = Some(false);
        }
        Ok(settings)
    }

    /// Expands directories into the collision files they contain.
    fn source_files(&self) -> Result<Vec<PathBuf>, ImportError> {
        let mut files = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                let found = collect_collision_files(input).map_err(|e| {
                    ImportError::settings(format!("cannot scan {}: {e}", input.display()))
                })?;
                log::debug!("{}: {} collision files", input.display(), found.len());
                files.extend(found);
            } else {
                if !is_collision_asset(input) {
                    log::warn!("{} does not look like a collision file", input.display());
                }
                files.push(input.clone());
            }
        }
        Ok(files)
    }
}

fn run(args: &Args) -> Result<ExitCode, ImportError> {
    let settings = args.settings()?;
    let config = settings.import_config()?;
    let converter = settings.process_converter()?;
    log::debug!("using converter {}", converter.executable().display());

    let requests: Vec<ConversionRequest> = args
        .source_files()?
        .into_iter()
        .map(|path| ConversionRequest::with_placement(path, config.tiling_factor, config.offset))
        .collect();
    if requests.is_empty() {
        log::error!("no collision files to import");
        return Ok(ExitCode::from(exit_status(&BatchReport::default())));
    }

    let mut orchestrator = ImportOrchestrator::new(converter, InMemoryScene::default())
        .with_max_workers(config.max_workers);
    let report = orchestrator.import_all(&requests);
    println!("{}", report.status_message());

    let scene = orchestrator.into_scene();
    for outcome in &report.outcomes {
        if let Ok(group) = &outcome.result {
            let faces: usize = scene
                .objects_in(&group.name)
                .iter()
                .map(|object| object.mesh.face_count())
                .sum();
            println!("  {}: {} meshes, {faces} faces", group.name, group.mesh_count());
        }
    }

    Ok(ExitCode::from(exit_status(&report)))
}

/// 0 when every file imported, 2 when only some did, 1 when none did or the
/// batch was empty.
fn exit_status(report: &BatchReport) -> u8 {
    match report.succeeded() {
        0 => 1,
        n if n == report.total() => 0,
        _ => 2,
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let started = std::time::Instant::now();
    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(1)
        }
    };
    log::debug!("finished in {:.2?}", started.elapsed());
    code
}
