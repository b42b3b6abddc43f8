//! Converter invocation.
//!
//! The converter is a black box: it receives a collision file path (and,
//! in newer builds, the placement parameters) and prints a JSON array of
//! geometry records on stdout. This module launches it and turns that
//! output into validated [`GeometryRecord`]s.

mod memory;
mod process;

pub use memory::InMemoryConverter;
pub use process::ProcessConverter;

use crate::error::ImportError;
use crate::request::ConversionRequest;
use hkx_geometry::GeometryRecord;
use std::path::Path;

/// Runs the converter for one request.
///
/// Implementations hold no state shared between invocations, so a batch can
/// call `convert` from many threads at once.
pub trait Converter: Send + Sync {
    fn convert(&self, request: &ConversionRequest) -> Result<Vec<GeometryRecord>, ImportError>;
}

/// Which positional arguments the converter build accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgumentMode {
    /// `<exe> <file_path>`
    PathOnly,
    /// `<exe> <file_path> <tiling_factor> <offset_x> <offset_y> <offset_z>`
    #[default]
    WithPlacement,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes converter stdout into validated records.
///
/// # Errors
///
/// [`ImportError::ConverterOutput`] if the bytes are not a JSON array of
/// records or any record references a vertex it does not have.
///
/// # Examples
/// ```
/// use hkx_import::converter::decode_output;
/// use std::path::Path;
///
/// let json = br#"[{"Name":"hkpBoxShape","Vertices":[],"Edges":[],"Primitives":[]}]"#;
/// let records = decode_output(Path::new("rock.hksc"), json).unwrap();
/// assert_eq!(records[0].shape_name, "hkpBoxShape");
/// assert!(decode_output(Path::new("rock.hksc"), b"Unhandled exception").is_err());
/// ```
pub fn decode_output(source: &Path, stdout: &[u8]) -> Result<Vec<GeometryRecord>, ImportError> {
    let body = stdout.strip_prefix(UTF8_BOM).unwrap_or(stdout);

    let records: Vec<GeometryRecord> = serde_json::from_slice(body)
        .map_err(|err| {
            ImportError::output(source, format!("invalid geometry document: {err}"))
        })?;

    for record in &records {
        record
            .validate()
            .map_err(|err| ImportError::output(source, err.to_string()))?;
    }

    Ok(records)
}
