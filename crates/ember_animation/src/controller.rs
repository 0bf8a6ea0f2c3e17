use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::tracks::{KeyframeCursor, KeyframeTrack};

/// Which part of a node's transform a controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Clone)]
pub enum ChannelData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerValue {
    Vector3(Vec3),
    Quaternion(Quat),
}

/// Drives one transform channel of one named node.
///
/// The constructors pair each [`TargetPath`] with the matching track type,
/// so a translation controller always samples a `Vec3`.
#[derive(Debug, Clone)]
pub struct NodeController {
    target: String,
    path: TargetPath,
    data: ChannelData,
}

impl NodeController {
    #[must_use]
    pub fn translation(target: impl Into<String>, track: KeyframeTrack<Vec3>) -> Self {
        Self {
            target: target.into(),
            path: TargetPath::Translation,
            data: ChannelData::Vector3(track),
        }
    }

    #[must_use]
    pub fn rotation(target: impl Into<String>, track: KeyframeTrack<Quat>) -> Self {
        Self {
            target: target.into(),
            path: TargetPath::Rotation,
            data: ChannelData::Quaternion(track),
        }
    }

    #[must_use]
    pub fn scale(target: impl Into<String>, track: KeyframeTrack<Vec3>) -> Self {
        Self {
            target: target.into(),
            path: TargetPath::Scale,
            data: ChannelData::Vector3(track),
        }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> TargetPath {
        self.path
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &ChannelData {
        &self.data
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        match &self.data {
            ChannelData::Vector3(t) => t.is_valid(),
            ChannelData::Quaternion(t) => t.is_valid(),
        }
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> Option<ControllerValue> {
        match &self.data {
            ChannelData::Vector3(t) => t.sample(time).map(ControllerValue::Vector3),
            ChannelData::Quaternion(t) => t.sample(time).map(ControllerValue::Quaternion),
        }
    }

    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<ControllerValue> {
        match &self.data {
            ChannelData::Vector3(t) => t.sample_with_cursor(time, cursor).map(ControllerValue::Vector3),
            ChannelData::Quaternion(t) => {
                t.sample_with_cursor(time, cursor).map(ControllerValue::Quaternion)
            }
        }
    }

    /// Node translation at `time`, for translation controllers only.
    #[must_use]
    pub fn translation_at(&self, time: f32) -> Option<Vec3> {
        match (&self.data, self.path) {
            (ChannelData::Vector3(t), TargetPath::Translation) => t.sample(time),
            _ => None,
        }
    }
}
