//! Process converter against small shell scripts standing in for the real
//! executable.
#![cfg(unix)]

use hkx_import::converter::{ArgumentMode, Converter, ProcessConverter};
use hkx_import::scene::InMemoryScene;
use hkx_import::settings::ensure_executable;
use hkx_import::{ConversionRequest, ImportError, ImportOrchestrator};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// Writing a script while another test thread forks can leave the file open
// in the child and fail the exec with ETXTBSY, so these tests run one at a time.
static SERIAL: parking_lot::Mutex<()> = parking_lot::const_mutex(());

const BOX_DOCUMENT: &str = r#"[{"Name":"hkpBoxShape","Vertices":[
{"X":0.0,"Y":0.0,"Z":0.0},{"X":1.0,"Y":0.0,"Z":0.0},{"X":0.0,"Y":1.0,"Z":0.0},{"X":1.0,"Y":1.0,"Z":0.0},
{"X":0.0,"Y":0.0,"Z":1.0},{"X":1.0,"Y":0.0,"Z":1.0},{"X":0.0,"Y":1.0,"Z":1.0},{"X":1.0,"Y":1.0,"Z":1.0}
],"Edges":[],"Primitives":[]}]"#;

/// Writes an executable script named `BlenderConverter` into `dir`.
fn script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("BlenderConverter");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    ensure_executable(&path);
    path
}

fn request(dir: &Path, name: &str) -> ConversionRequest {
    ConversionRequest::new(dir.join(name))
}

#[test]
fn valid_output_decodes() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let exe = script(&dir, &format!("cat <<'EOF'\n{BOX_DOCUMENT}\nEOF"));

    let records = ProcessConverter::new(exe)
        .convert(&request(dir.path(), "rock.hksc"))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].shape_name, "hkpBoxShape");
    assert_eq!(records[0].vertex_count(), 8);
}

#[test]
fn corrupt_output_is_output_error() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let exe = script(&dir, "echo 'Unhandled exception: bad header'");

    let err = ProcessConverter::new(exe)
        .convert(&request(dir.path(), "corrupt.hkrb"))
        .unwrap_err();
    assert_eq!(err.kind(), "ConverterOutputError");
}

#[test]
fn nonzero_exit_carries_stderr() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let exe = script(&dir, "echo '[]'\necho 'cannot open file' >&2\nexit 3");

    let err = ProcessConverter::new(exe)
        .convert(&request(dir.path(), "rock.hksc"))
        .unwrap_err();
    assert_eq!(err.kind(), "ConverterOutputError");
    assert!(err.to_string().contains("cannot open file"));
}

#[test]
fn hung_converter_times_out() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let exe = script(&dir, "exec sleep 30");

    let started = Instant::now();
    let err = ProcessConverter::new(exe)
        .with_timeout(Duration::from_millis(200))
        .convert(&request(dir.path(), "slow.hksc"))
        .unwrap_err();

    assert!(matches!(err, ImportError::ConverterTimeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn timeout_kills_processes_the_converter_started() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("left-behind");
    let body = format!("(sleep 1; touch '{}') &\nsleep 30", marker.display());
    let exe = script(&dir, &body);

    let started = Instant::now();
    let err = ProcessConverter::new(exe)
        .with_timeout(Duration::from_millis(200))
        .convert(&request(dir.path(), "slow.hksc"))
        .unwrap_err();
    assert!(matches!(err, ImportError::ConverterTimeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));

    // The background job would have touched the marker after one second.
    std::thread::sleep(Duration::from_millis(1500));
    assert!(!marker.exists());
}

#[test]
fn lingering_stderr_holder_does_not_stall_clean_exit() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let exe = script(&dir, "(exec sleep 30 >/dev/null) &\necho '[]'");

    let started = Instant::now();
    let records = ProcessConverter::new(exe)
        .with_timeout(Duration::from_secs(20))
        .convert(&request(dir.path(), "rock.hksc"))
        .unwrap();
    assert!(records.is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn placement_is_forwarded_as_arguments() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("args.txt");
    let exe = script(&dir, &format!("echo \"$@\" > '{}'\necho '[]'", log.display()));

    ProcessConverter::new(&exe)
        .convert(&ConversionRequest::with_placement(
            dir.path().join("rock.hksc"),
            125.0,
            [1.0, -2.0, 3.5],
        ))
        .unwrap();
    let args = std::fs::read_to_string(&log).unwrap();
    let source = dir.path().join("rock.hksc");
    let expected = format!("{} 125.0 1.0 -2.0 3.5", source.display());
    assert_eq!(args.trim(), expected);

    ProcessConverter::new(&exe)
        .with_mode(ArgumentMode::PathOnly)
        .convert(&request(dir.path(), "rock.hksc"))
        .unwrap();
    let args = std::fs::read_to_string(&log).unwrap();
    assert_eq!(args.trim(), dir.path().join("rock.hksc").display().to_string());
}

#[test]
fn batch_through_real_process() {
    let _serial = SERIAL.lock();
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "case \"$1\" in\n  *corrupt*) echo 'garbage' ;;\n  *) cat <<'EOF'\n{BOX_DOCUMENT}\nEOF\n  ;;\nesac"
    );
    let exe = script(&dir, &body);

    let requests: Vec<_> = ["a.hksc", "b.hkrb", "corrupt.hkrb"]
        .iter()
        .map(|name| request(dir.path(), name))
        .collect();
    let mut orchestrator =
        ImportOrchestrator::new(ProcessConverter::new(exe), InMemoryScene::default());
    let report = orchestrator.import_all(&requests);

    assert_eq!(report.succeeded(), 2);
    let scene = orchestrator.into_scene();
    assert_eq!(scene.objects_in("a")[0].mesh.face_count(), 12);
    assert_eq!(scene.objects_in("b")[0].mesh.face_count(), 12);
    assert!(scene.group_by_name("corrupt").is_none());
}
