//! Animation configuration
//!
//! How group markers are spelled depends on the asset pipeline, so it is data,
//! not code. The defaults match the common `"<group>: <marker>"` style, e.g.
//! `"idle: start"` or `"attack1: loop stop"`.

use ember_core::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConvention {
    /// Text between the group name and the marker name.
    pub separator: String,
    pub start: String,
    pub stop: String,
    pub loop_start: String,
    pub loop_stop: String,
}

impl Default for MarkerConvention {
    fn default() -> Self {
        Self {
            separator: ": ".to_string(),
            start: "start".to_string(),
            stop: "stop".to_string(),
            loop_start: "loop start".to_string(),
            loop_stop: "loop stop".to_string(),
        }
    }
}

impl MarkerConvention {
    /// Full key text of `marker` in `group`.
    #[must_use]
    pub fn key(&self, group: &str, marker: &str) -> String {
        format!("{group}{}{marker}", self.separator)
    }

    /// Marker part of `text` if it belongs to `group`.
    #[must_use]
    pub fn marker_of<'a>(&self, text: &'a str, group: &str) -> Option<&'a str> {
        text.strip_prefix(group)?.strip_prefix(self.separator.as_str())
    }
}

/// Per-entity animation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub markers: MarkerConvention,
    /// Name of the node whose movement is extracted as root motion.
    pub accum_root: Option<String>,
    /// Per-axis share of the root's movement turned into displacement, each in `[0, 1]`.
    pub accumulate: [f32; 3],
    /// Initial playback speed multiplier.
    pub speed: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            markers: MarkerConvention::default(),
            accum_root: None,
            accumulate: [0.0; 3],
            speed: 1.0,
        }
    }
}

impl AnimationSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn accumulate(&self) -> Vec3 {
        Vec3::from_array(self.accumulate).clamp(Vec3::ZERO, Vec3::ONE)
    }
}
