//! `KEY=VALUE` configuration for the projection command.
//!
//! ```
//! use quadsnap::config::ProjectConfig;
//!
//! let config = ProjectConfig::from_pairs([("iters", "5"), ("preserveQuality", "true")]).unwrap();
//! assert_eq!(config.iters, 5);
//! assert!(config.preserve_quality);
//! assert!(config.treat_sharp_feature_as_regular);
//! ```

use std::fmt;
use std::path::PathBuf;

use crate::algo::driver::DriverOptions;
use crate::algo::label::{FeaturePolicy, LabelOptions, DEFAULT_COS_ANGLE};
use crate::error::{MeshError, Result};

/// Keys understood by [`ProjectConfig::set`].
pub const KEYS: [&str; 12] = [
    "orig",
    "input",
    "output",
    "iters",
    "preserveQuality",
    "preserveSharpFeature",
    "treatSharpFeatureAsRegular",
    "treatCornerAsRegular",
    "cosangle",
    "snapshots",
    "faces",
    "sequential",
];

/// Settings for one projection run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Reference surface file.
    pub orig: PathBuf,
    /// Mesh to smooth and project.
    pub input: PathBuf,
    /// Result file.
    pub output: PathBuf,
    /// Number of rounds.
    pub iters: usize,
    /// Smooth after projecting instead of before.
    pub preserve_quality: bool,
    /// Keep sharp boundary vertices fixed.
    pub preserve_sharp_feature: bool,
    /// Let sharp boundary vertices slide like regular ones.
    pub treat_sharp_feature_as_regular: bool,
    /// Let corners slide like regular boundary vertices.
    pub treat_corner_as_regular: bool,
    /// Cosine threshold for sharp turns and creases.
    pub cos_angle: f64,
    /// Prefix for per-round snapshots, if any.
    pub snapshots: Option<String>,
    /// Faces-only side file.
    pub faces: PathBuf,
    /// Run passes on a single thread.
    pub sequential: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            orig: PathBuf::from("tri.vtk"),
            input: PathBuf::from("quad.vtk"),
            output: PathBuf::from("out.vtk"),
            iters: 1,
            preserve_quality: false,
            preserve_sharp_feature: false,
            treat_sharp_feature_as_regular: true,
            treat_corner_as_regular: false,
            cos_angle: DEFAULT_COS_ANGLE,
            snapshots: None,
            faces: PathBuf::from("out_Face.vtk"),
            sequential: false,
        }
    }
}

/// Split `KEY=VALUE` at the first `=`.
pub fn parse_pair(arg: &str) -> Result<(String, String)> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| MeshError::argument(arg, "", "expected KEY=VALUE"))
}

impl ProjectConfig {
    /// Apply `pairs` on top of the defaults.
    ///
    /// Unknown keys are logged and ignored.
    pub fn from_pairs<P, K, V>(pairs: P) -> Result<Self>
    where
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            config.set(key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    /// Apply one setting. Returns `false` if `key` is not recognized.
    ///
    /// An empty value leaves the current setting alone. Boolean keys are
    /// true only for `true`, except `treatSharpFeatureAsRegular`, which is
    /// false only for `false`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        if !KEYS.contains(&key) {
            log::warn!("ignoring unknown argument '{}={}'", key, value);
            return Ok(false);
        }
        if value.is_empty() {
            return Ok(true);
        }

        match key {
            "orig" => self.orig = PathBuf::from(value),
            "input" => self.input = PathBuf::from(value),
            "output" => self.output = PathBuf::from(value),
            "faces" => self.faces = PathBuf::from(value),
            "snapshots" => self.snapshots = Some(value.to_string()),
            "iters" => {
                self.iters = value
                    .parse()
                    .map_err(|_| MeshError::argument(key, value, "must be a non-negative integer"))?
            }
            "cosangle" => {
                let cos_angle: f64 = value
                    .parse()
                    .map_err(|_| MeshError::argument(key, value, "must be a number"))?;
                if !(cos_angle > -1.0 && cos_angle <= 1.0) {
                    return Err(MeshError::argument(key, value, "must be in (-1, 1]"));
                }
                self.cos_angle = cos_angle;
            }
            "preserveQuality" => self.preserve_quality = value == "true",
            "preserveSharpFeature" => self.preserve_sharp_feature = value == "true",
            "treatSharpFeatureAsRegular" => self.treat_sharp_feature_as_regular = value != "false",
            "treatCornerAsRegular" => self.treat_corner_as_regular = value == "true",
            "sequential" => self.sequential = value == "true",
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// The vertex movement policy these settings describe.
    pub fn policy(&self) -> FeaturePolicy {
        FeaturePolicy::default()
            .with_preserve_sharp_feature(self.preserve_sharp_feature)
            .with_sharp_feature_as_regular(self.treat_sharp_feature_as_regular)
            .with_corner_as_regular(self.treat_corner_as_regular)
    }

    /// Driver options for these settings.
    pub fn to_driver_options(&self) -> Result<DriverOptions> {
        let label = LabelOptions::with_cos_angle(self.cos_angle)
            .map_err(|_| MeshError::argument("cosangle", &self.cos_angle.to_string(), "must be in (-1, 1]"))?;
        Ok(DriverOptions::default()
            .with_iterations(self.iters)
            .with_preserve_quality(self.preserve_quality)
            .with_policy(self.policy())
            .with_label_options(label)
            .with_parallel(!self.sequential))
    }
}

impl fmt::Display for ProjectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "orig = {}", self.orig.display())?;
        writeln!(f, "input = {}", self.input.display())?;
        writeln!(f, "output = {}", self.output.display())?;
        writeln!(f, "iters = {}", self.iters)?;
        writeln!(f, "cosangle = {}", self.cos_angle)?;
        writeln!(f, "preserveQuality = {}", self.preserve_quality)?;
        writeln!(f, "preserveSharpFeature = {}", self.preserve_sharp_feature)?;
        writeln!(f, "treatSharpFeatureAsRegular = {}", self.treat_sharp_feature_as_regular)?;
        writeln!(f, "treatCornerAsRegular = {}", self.treat_corner_as_regular)?;
        if let Some(prefix) = &self.snapshots {
            writeln!(f, "snapshots = {}", prefix)?;
        }
        writeln!(f, "faces = {}", self.faces.display())?;
        write!(f, "sequential = {}", self.sequential)
    }
}
