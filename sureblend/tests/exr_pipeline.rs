//! End-to-end runs over a directory of EXR files.

mod support;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use support::{CountingStore, init_tracing, write_renders};
use sureblend::{
    AuxChannels, CheckpointSet, ExrStore, GaussianDenoiser, ImageDimensions, Outcome, Pipeline,
    PipelineConfig, RiskConfig,
};

const SCENE: &str = "attic";
const COUNTS: [u32; 3] = [4, 16, 64];

fn dims() -> ImageDimensions {
    ImageDimensions::new(8, 6)
}

fn config() -> PipelineConfig {
    PipelineConfig {
        aux: AuxChannels::Albedo,
        risk: RiskConfig {
            seed: Some(42),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn file_contents(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            (name, fs::read(&path).unwrap())
        })
        .collect()
}

fn run(store: &CountingStore<ExrStore>, set: &CheckpointSet) -> sureblend::RunReport {
    let mut pipeline =
        Pipeline::new(store, Box::new(GaussianDenoiser::default()), config()).unwrap();
    pipeline.run(set).unwrap()
}

#[test]
fn test_run_over_exr_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = CountingStore::new(ExrStore::new(dir.path()));
    write_renders(&store, SCENE, dims(), &COUNTS, 5);

    let set = CheckpointSet::discover(dir.path()).unwrap();
    assert_eq!(set.scene, SCENE);
    assert_eq!(set.sample_counts, COUNTS.to_vec());

    let report = run(&store, &set);
    assert_eq!(report.blended_count(), COUNTS.len());

    for name in [
        "attic_000004spp.gauss_alb.exr",
        "attic_000004spp.gauss_alb.sure.exr",
        "attic_000016spp.gauss_alb.gb.l2.weights.exr",
        "attic_000064spp.ours.gauss_alb.gb.exr",
        "attic_000064spp.ours.gauss_alb.gb.diff.exr",
    ] {
        assert!(dir.path().join(name).is_file(), "missing {name}");
    }

    let text = report.to_string();
    assert!(text.starts_with("spp\tours\tdenoiser\tmc\n"));
    assert_eq!(text.lines().count(), 1 + COUNTS.len());

    let Outcome::Blended { mse_noisy, .. } = report.get(64).unwrap().outcome else {
        panic!("reference checkpoint was skipped");
    };
    assert_eq!(mse_noisy, 0.0);
}

#[test]
fn test_second_run_does_not_rewrite_artifacts() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = CountingStore::new(ExrStore::new(dir.path()));
    write_renders(&store, SCENE, dims(), &COUNTS, 5);
    let set = CheckpointSet::discover(dir.path()).unwrap();

    let first = run(&store, &set);
    let before = file_contents(dir.path());
    let saves = store.saves();

    let second = run(&store, &set);
    assert_eq!(store.saves(), saves);
    assert_eq!(file_contents(dir.path()), before);
    assert_eq!(first, second);
}
