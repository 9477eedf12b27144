//! Configuration of the mAP accumulator.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VocEvalError};
use crate::metrics::ap::ApMethod;
use crate::threshold::validate_threshold;

/// Default IoU threshold for a detection to count as a match.
pub const DEFAULT_OVP_THRESH: f64 = 0.5;

/// Name of the aggregate slot reported by the accumulator.
pub const MAP_NAME: &str = "mAP";

fn default_ovp_thresh() -> f64 {
    DEFAULT_OVP_THRESH
}

/// Settings for [`MApMetric`](crate::accumulator::MApMetric).
///
/// Every field has a default, so a partial JSON document such as
/// `{"use_difficult": true}` deserializes into a usable config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MApConfig {
    /// Minimum IoU for a detection to match a ground truth.
    #[serde(default = "default_ovp_thresh")]
    pub ovp_thresh: f64,
    /// Score difficult ground truths like any other instance.
    #[serde(default)]
    pub use_difficult: bool,
    /// Display names indexed by class id. `None` reports a single mAP value.
    #[serde(default)]
    pub class_names: Option<Vec<String>>,
    /// Precision-recall integration strategy.
    #[serde(default)]
    pub method: ApMethod,
}

impl Default for MApConfig {
    fn default() -> Self {
        Self {
            ovp_thresh: DEFAULT_OVP_THRESH,
            use_difficult: false,
            class_names: None,
            method: ApMethod::Continuous,
        }
    }
}

impl MApConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for the PASCAL VOC 2007 11-point metric.
    pub fn voc07() -> Self {
        Self::default().with_method(ApMethod::Voc07)
    }

    pub fn with_ovp_thresh(mut self, ovp_thresh: f64) -> Self {
        self.ovp_thresh = ovp_thresh;
        self
    }

    pub fn with_use_difficult(mut self, use_difficult: bool) -> Self {
        self.use_difficult = use_difficult;
        self
    }

    pub fn with_class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_method(mut self, method: ApMethod) -> Self {
        self.method = method;
        self
    }

    /// Check the config for values the accumulator cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreshold` if `ovp_thresh` is outside [0.0, 1.0] and
    /// `InvalidConfig` if a class name is empty or reuses the `mAP` slot name.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.ovp_thresh)?;

        if let Some(names) = &self.class_names {
            for (class_id, name) in names.iter().enumerate() {
                if name.trim().is_empty() {
                    return Err(VocEvalError::InvalidConfig(format!(
                        "Class name for id {} is empty",
                        class_id
                    )));
                }
                if name == MAP_NAME {
                    return Err(VocEvalError::InvalidConfig(format!(
                        "Class name for id {} collides with the '{}' aggregate",
                        class_id, MAP_NAME
                    )));
                }
            }
        }

        Ok(())
    }

    /// Names of the reported slots: one per class plus the trailing `mAP`.
    pub fn output_names(&self) -> Vec<String> {
        match &self.class_names {
            Some(names) => names
                .iter()
                .cloned()
                .chain(std::iter::once(MAP_NAME.to_string()))
                .collect(),
            None => vec![MAP_NAME.to_string()],
        }
    }
}
