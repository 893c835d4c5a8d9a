#![allow(dead_code)]

mod mocks;

use std::{env::temp_dir, path::PathBuf};

use rand::distr::{Alphanumeric, SampleString};

pub use mocks::{MockFile, MockSource};

/// A path in the temp directory that no other test uses.
pub fn temp_path(extension: &str) -> PathBuf {
    let file_name = Alphanumeric.sample_string(&mut rand::rng(), 16);
    temp_dir().join(format!("{file_name}.{extension}"))
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
