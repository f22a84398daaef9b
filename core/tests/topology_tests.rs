// SPDX-License-Identifier: MIT OR Apache-2.0

use epdprep_core::topology::{read_shape, reinit_file, reinit_network, GroupShape};
use epdprep_core::PrepError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use tempfile::TempDir;

/// One layer, three (2, 3) groups, followed by trailing text
const ONE_LAYER: &str = "1\n\
2 \n3 \n0.5 -0.25 1 \n2 3 4 \n\
2 \n3 \n1 1 1 \n1 0 1 \n\
2 \n3 \n0 0 0 \n9 9 9 \n\
trailing notes\nkept as is";

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[test]
fn single_layer_keeps_mask_and_shape() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut out = Vec::new();
    let layers = reinit_network(ONE_LAYER.as_bytes(), &mut out, &mut rng).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(layers.len(), 1);
    assert!(layers[0].iter().all(|g| *g == GroupShape { input_size: 2, output_size: 3 }));

    let src = lines(ONE_LAYER);
    let dst = lines(&out);
    assert_eq!(src.len(), dst.len());

    // header lines are bare integers
    assert_eq!(dst[0], "1");
    assert_eq!(&dst[1..3], &["2", "3"]);

    // group 0: same shape, fresh values within the Glorot range
    let r = (6.0f64 / 5.0).sqrt();
    for row in &dst[3..5] {
        let values: Vec<f64> = row.split(' ').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| v.abs() <= r));
    }
    assert_ne!(&dst[3..5], &src[3..5]);

    // group 1 is copied byte for byte, trailing spaces included
    assert!(out.contains("2\n3\n1 1 1 \n1 0 1 \n2\n3\n"));

    // group 2 regenerated
    assert_eq!(dst[9], "2");
    assert_eq!(dst[11].split(' ').count(), 3);
    assert_ne!(&dst[11..13], &src[11..13]);

    assert!(out.ends_with("trailing notes\nkept as is"));
}

#[test]
fn hidden_layers_use_normal_draws() {
    let src = "2\n\
        3\n2\n1 1\n1 1\n1 1\n\
        3\n2\n1 1\n1 1\n1 1\n\
        1\n2\n0 0\n\
        2\n1\n5\n5\n\
        2\n1\n7\n7\n\
        1\n1\n3\n";
    let mut rng = StdRng::seed_from_u64(3);
    let mut out = Vec::new();
    reinit_network(src.as_bytes(), &mut out, &mut rng).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(read_shape(out.as_bytes()).unwrap(), read_shape(src.as_bytes()).unwrap());
    assert_eq!(out.lines().count(), src.lines().count());
    // weights of the first layer have six decimals
    let first = out.lines().nth(3).unwrap();
    assert!(first.split(' ').all(|v| v.split('.').nth(1).map(str::len) == Some(6)));
}

#[test]
fn repeated_reinit_keeps_structure() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("eval.net");
    fs::write(&original, ONE_LAYER).unwrap();
    let expected = read_shape(ONE_LAYER.as_bytes()).unwrap();

    let mut current = original;
    for i in 0..3 {
        let next = dir.path().join(format!("gen{i}.net"));
        let layers = reinit_file(&current, &next, None).unwrap();
        assert_eq!(layers, expected);
        let written = fs::read_to_string(&next).unwrap();
        assert_eq!(read_shape(written.as_bytes()).unwrap(), expected);
        current = next;
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("eval.net");
    fs::write(&src, ONE_LAYER).unwrap();

    let a = dir.path().join("a.net");
    let b = dir.path().join("b.net");
    reinit_file(&src, &a, Some(11)).unwrap();
    reinit_file(&src, &b, Some(11)).unwrap();
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn oversized_declaration_is_a_topology_error() {
    let mut rng = StdRng::seed_from_u64(3);

    // hidden layer whose gated width overflows
    let src = "2\n1\n4611686018427387904\nrow\n";
    let err = reinit_network(src.as_bytes(), &mut Vec::new(), &mut rng).unwrap_err();
    assert!(matches!(err, PrepError::Topology { line: 3, .. }));

    // huge row count with too few rows fails on the missing rows
    let src = "1\n18446744073709551615\n1\nrow\n";
    let err = reinit_network(src.as_bytes(), &mut Vec::new(), &mut rng).unwrap_err();
    assert!(matches!(err, PrepError::Topology { line: 5, .. }));

    // output layer too large to allocate
    let src = "1\n1\n4611686018427387904\nrow\n";
    let err = reinit_network(src.as_bytes(), &mut Vec::new(), &mut rng).unwrap_err();
    assert!(matches!(err, PrepError::Topology { line: 3, .. }));
}
