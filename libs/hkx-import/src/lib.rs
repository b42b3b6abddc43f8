//! # HKX Import
//!
//! Concurrent import of collision assets into a host scene.
//!
//! ## Architecture
//!
//! ```text
//! ImportTrigger → ConversionRequest* → ImportOrchestrator (one worker per file)
//!     worker: Converter → GeometryRecord* → build → refine → SceneReconciler
//!     join:   BatchReport (one ImportOutcome per file)
//! ```
//!
//! Conversion and geometry run in parallel and share nothing. Every scene
//! mutation goes through the [`SceneReconciler`], which applies one file's
//! replace-on-reimport at a time.
//!
//! ## Usage
//!
//! ```rust
//! use hkx_import::converter::InMemoryConverter;
//! use hkx_import::request::ImportTrigger;
//! use hkx_import::scene::InMemoryScene;
//! use hkx_import::ImportOrchestrator;
//!
//! let mut converter = InMemoryConverter::default();
//! converter.insert("/assets/rock.hksc", "[]");
//!
//! let trigger = ImportTrigger::new("/assets").with_files(["rock.hksc"]);
//! let mut orchestrator = ImportOrchestrator::new(converter, InMemoryScene::default());
//! let report = orchestrator.import_all(&trigger.requests());
//!
//! assert!(report.is_complete_success());
//! let scene = orchestrator.into_scene();
//! assert!(scene.group_by_name("rock").is_some());
//! ```

pub mod converter;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod request;
pub mod scene;
pub mod settings;

pub use error::ImportError;
pub use orchestrator::{BatchReport, ImportOrchestrator, ImportOutcome};
pub use reconcile::{ImportGroup, SceneReconciler};
pub use request::ConversionRequest;
