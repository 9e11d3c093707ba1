#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use shapemock::adapters::type_graph::TypeGraph;
use shapemock::config::Settings;
use shapemock::Mocker;
use std::path::Path;

/// Seeds used by property-style tests.
pub const SEEDS: u64 = 100;

pub fn mocker() -> Mocker {
    Mocker::new(Settings::default())
}

/// Mocker resolving external references against `root`.
pub fn mocker_with_reference_root(root: &Path) -> Mocker {
    let mut settings = Settings::default();
    settings.references.root = root.to_path_buf();
    Mocker::new(settings)
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn graph(yaml: &str) -> TypeGraph {
    serde_yaml::from_str(yaml).expect("test type graph should parse")
}
