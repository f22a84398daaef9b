// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feature conversion configuration

use crate::{PrepError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for converting a directory of EPD files into feature arrays
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConvConfig {
    /// Engine executable invoked as `<engine> conv_file <input> <output>`
    pub engine: PathBuf,
    /// Only file names containing this string are converted
    pub input_ext: String,
    /// Extension appended to the input file name for the array file
    pub output_ext: String,
    /// Directory holding the EPD files
    pub input_path: PathBuf,
    /// Directory receiving the intermediate tables and the arrays
    pub output_path: PathBuf,
    /// Expected number of feature columns, label column excluded
    pub feature_width: Option<usize>,
}

impl Default for ConvConfig {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("./giraffe"),
            input_ext: ".epd".to_string(),
            output_ext: ".xie".to_string(),
            input_path: PathBuf::from("tests/testsuites"),
            output_path: PathBuf::from("tests/feat_ext_files"),
            feature_width: None,
        }
    }
}

impl ConvConfig {
    /// Load a TOML config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PrepError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| PrepError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
