// SPDX-License-Identifier: MIT OR Apache-2.0

use epdprep_core::config::ConvConfig;
use epdprep_core::features::{convert_directory, convert_file, EngineStatus, FeatureEngine};
use epdprep_core::{PrepError, Result};
use ndarray::{array, Array2};
use ndarray_npy::read_npy;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writes a three-feature table with one row per input line
struct FakeEngine {
    calls: RefCell<Vec<PathBuf>>,
    status: EngineStatus,
    write_table: bool,
}

impl FakeEngine {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            status: EngineStatus::success(),
            write_table: true,
        }
    }
}

impl FeatureEngine for FakeEngine {
    fn convert(&self, input: &Path, output: &Path) -> Result<EngineStatus> {
        self.calls.borrow_mut().push(input.to_path_buf());
        if self.write_table {
            let mut table = String::from("f0 f1 f2 label\n");
            for (i, _) in fs::read_to_string(input)?.lines().enumerate() {
                table.push_str(&format!("{i} 0.5 -1 9\n"));
            }
            fs::write(output, table)?;
        }
        Ok(self.status.clone())
    }
}

fn setup(dir: &Path) -> ConvConfig {
    let input_path = dir.join("suites");
    fs::create_dir_all(&input_path).unwrap();
    fs::write(input_path.join("a.epd"), "p1\np2\n").unwrap();
    fs::write(input_path.join("b.epd"), "p1\n").unwrap();
    fs::write(input_path.join("notes.txt"), "ignored\n").unwrap();
    ConvConfig {
        input_path,
        output_path: dir.join("feats"),
        ..ConvConfig::default()
    }
}

#[test]
fn converts_matching_files_and_removes_tables() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let engine = FakeEngine::new();

    let report = convert_directory(&engine, &config).unwrap();
    assert!(report.is_success());
    assert_eq!(report.total(), 2);
    assert_eq!(engine.calls.borrow().len(), 2);

    let npy_path = config.output_path.join("a.epd.xie.npy");
    assert!(npy_path.is_file());
    assert!(!config.output_path.join("a.epd.feats").exists());
    assert!(!config.output_path.join("b.epd.feats").exists());

    let features: Array2<f32> = read_npy(&npy_path).unwrap();
    assert_eq!(features, array![[0.0, 0.5, -1.0], [1.0, 0.5, -1.0]]);
}

#[test]
fn width_check_rejects_schema_drift() {
    let dir = TempDir::new().unwrap();
    let config = ConvConfig {
        feature_width: Some(4),
        ..setup(dir.path())
    };
    let engine = FakeEngine::new();

    let report = convert_directory(&engine, &config).unwrap();
    assert_eq!(report.failed.len(), 2);
    assert!(matches!(
        report.failed[0].1,
        PrepError::FeatureWidth { expected: 4, found: 3 }
    ));
    // the table is still cleaned up
    assert!(!config.output_path.join("a.epd.feats").exists());
    assert!(!config.output_path.join("a.epd.xie.npy").exists());
}

#[test]
fn missing_table_is_fatal_for_that_file() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let engine = FakeEngine {
        write_table: false,
        status: EngineStatus::failure("exit status: 3"),
        ..FakeEngine::new()
    };

    let err = convert_file(&engine, &config.input_path.join("a.epd"), &config).unwrap_err();
    match err {
        PrepError::EngineNoOutput { path, status } => {
            assert_eq!(path, config.output_path.join("a.epd.feats"));
            assert_eq!(status, "exit status: 3");
        }
        other => panic!("expected missing output, got {other:?}"),
    }
}

#[test]
fn failed_engine_still_cleans_up() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    fs::create_dir_all(&config.output_path).unwrap();
    let engine = FakeEngine {
        status: EngineStatus::failure("exit status: 1"),
        ..FakeEngine::new()
    };

    let err = convert_file(&engine, &config.input_path.join("b.epd"), &config).unwrap_err();
    assert!(matches!(err, PrepError::EngineFailed { .. }));
    assert!(!config.output_path.join("b.epd.feats").exists());
}

#[test]
fn stale_table_is_not_taken_as_output() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    fs::create_dir_all(&config.output_path).unwrap();
    let stale = config.output_path.join("a.epd.feats");
    fs::write(&stale, "f0 label\n42 0\n").unwrap();
    let engine = FakeEngine {
        write_table: false,
        ..FakeEngine::new()
    };

    let err = convert_file(&engine, &config.input_path.join("a.epd"), &config).unwrap_err();
    assert!(matches!(err, PrepError::EngineNoOutput { .. }));
    assert!(!stale.exists());
    assert!(!config.output_path.join("a.epd.xie.npy").exists());
}
