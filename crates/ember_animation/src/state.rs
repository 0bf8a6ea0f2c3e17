//! Per-group playback state
//!
//! An [`AnimState`] walks one group's window of the marker timeline. Time only
//! moves forward; every key reached on the way is reported to the listener and
//! then interpreted (loop start, loop stop, stop). Rewinding to the loop start
//! is the only backwards jump.

use std::sync::Arc;

use ember_scene::{NodeHandle, Scene};
use glam::Vec3;

use crate::animation::TextKeyListener;
use crate::controller::{ControllerValue, TargetPath};
use crate::keyframes::KeyframeSet;
use crate::settings::MarkerConvention;
use crate::tracks::KeyframeCursor;

/// Public snapshot of a group's playback.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimInfo {
    pub playing: bool,
    /// 0 at the start marker, 1 at the stop marker.
    pub complete: f32,
    pub start: String,
    pub stop: String,
    pub loop_count: usize,
    pub time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyOutcome {
    Continue,
    Rewound,
    Finished,
}

#[derive(Debug, Clone)]
pub(crate) struct ControllerBinding {
    pub controller: usize,
    pub node: NodeHandle,
    pub cursor: KeyframeCursor,
    /// Translation of the accumulation root; its accumulated part is not shown visually.
    pub compensate: bool,
}

/// Reference position of the movement group's accumulation root.
#[derive(Debug, Clone)]
pub(crate) struct RootMotion {
    pub group: String,
    pub controller: usize,
    pub last_position: Vec3,
}

impl RootMotion {
    fn sample(&self, source: &KeyframeSet, time: f32, accumulate: Vec3) -> Vec3 {
        source
            .controllers()
            .get(self.controller)
            .and_then(|c| c.translation_at(time))
            .unwrap_or(Vec3::ZERO)
            * accumulate
    }

    /// Displacement since the previous call, advancing the reference position.
    pub fn step(&mut self, source: &KeyframeSet, time: f32, accumulate: Vec3) -> Vec3 {
        let position = self.sample(source, time, accumulate);
        let delta = position - self.last_position;
        self.last_position = position;
        delta
    }

    pub fn reset(&mut self, source: &KeyframeSet, time: f32, accumulate: Vec3) {
        self.last_position = self.sample(source, time, accumulate);
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AnimState {
    pub source: Arc<KeyframeSet>,
    pub start_key: usize,
    pub loop_start_key: usize,
    pub stop_key: usize,
    pub next_key: usize,
    pub time: f32,
    pub playing: bool,
    pub loop_count: usize,
    pub bindings: Vec<ControllerBinding>,
}

impl AnimState {
    /// Resolves `group`'s `start`..`stop` window in `source`.
    ///
    /// Returns `None` when either marker is missing or both sit at the same time.
    /// Keys at or before the starting time are consumed silently.
    pub fn reset(
        source: &Arc<KeyframeSet>,
        group: &str,
        start: &str,
        stop: &str,
        start_fraction: f32,
        loops: usize,
        markers: &MarkerConvention,
    ) -> Option<Self> {
        let keys = source.text_keys();

        let mut start_key = keys.find(&markers.key(group, start));
        if start_key.is_none() && start == markers.loop_start {
            start_key = keys.find(&markers.key(group, &markers.start));
        }
        let start_key = start_key?;
        let stop_key = keys.find_from(start_key, &markers.key(group, stop))?;

        let start_time = keys.get(start_key)?.time;
        let stop_time = keys.get(stop_key)?.time;
        if stop_time <= start_time {
            return None;
        }

        let time = start_time + start_fraction.clamp(0.0, 1.0) * (stop_time - start_time);

        let loop_start_text = markers.key(group, &markers.loop_start);
        let mut loop_start_key = start_key;
        let mut next_key = start_key;
        while next_key < stop_key {
            let Some(key) = keys.get(next_key) else { break };
            if key.time > time {
                break;
            }
            if key.text() == loop_start_text {
                loop_start_key = next_key;
            }
            next_key += 1;
        }

        Some(Self {
            source: Arc::clone(source),
            start_key,
            loop_start_key,
            stop_key,
            next_key,
            time,
            playing: true,
            loop_count: loops,
            bindings: Vec::new(),
        })
    }

    /// Resolves every controller of the source against nodes under `root`.
    pub fn bind(&mut self, scene: &Scene, root: Option<NodeHandle>, accum_root: Option<&str>) {
        self.bindings.clear();
        let Some(root) = root else { return };

        for (index, controller) in self.source.controllers().iter().enumerate() {
            let Some(node) = scene.find_node_by_name(root, controller.target()) else {
                continue;
            };
            self.bindings.push(ControllerBinding {
                controller: index,
                node,
                cursor: KeyframeCursor::default(),
                compensate: controller.path() == TargetPath::Translation
                    && accum_root == Some(controller.target()),
            });
        }
    }

    fn key_time(&self, index: usize) -> f32 {
        self.source.text_keys().get(index).map_or(self.time, |k| k.time)
    }

    #[must_use]
    pub fn start_time(&self) -> f32 {
        self.key_time(self.start_key)
    }

    #[must_use]
    pub fn stop_time(&self) -> f32 {
        self.key_time(self.stop_key)
    }

    pub fn info(&self, group: &str, markers: &MarkerConvention) -> AnimInfo {
        let marker_name = |index: usize| {
            self.source
                .text_keys()
                .get(index)
                .and_then(|k| markers.marker_of(k.text(), group))
                .unwrap_or_default()
                .to_string()
        };

        let (start, stop) = (self.start_time(), self.stop_time());
        let complete = if stop > start {
            ((self.time - start) / (stop - start)).clamp(0.0, 1.0)
        } else {
            1.0
        };

        AnimInfo {
            playing: self.playing,
            complete,
            start: marker_name(self.start_key),
            stop: marker_name(self.stop_key),
            loop_count: self.loop_count,
            time: self.time,
        }
    }

    /// Interprets a key that playback just reached.
    fn handle_key(&mut self, index: usize, group: &str, markers: &MarkerConvention) -> KeyOutcome {
        let Some(key) = self.source.text_keys().get(index).copied() else {
            return KeyOutcome::Continue;
        };
        let Some(marker) = markers.marker_of(key.text(), group) else {
            return KeyOutcome::Continue;
        };

        if marker == markers.loop_start {
            self.loop_start_key = index;
            return KeyOutcome::Continue;
        }

        let is_stop = index == self.stop_key;
        if !is_stop && marker != markers.loop_stop {
            return KeyOutcome::Continue;
        }

        if self.loop_count > 0 {
            let loop_start_time = self.key_time(self.loop_start_key);
            if loop_start_time < key.time {
                self.loop_count -= 1;
                self.time = loop_start_time;
                self.next_key = self.loop_start_key + 1;
                return KeyOutcome::Rewound;
            }
            // an empty loop section would never consume time
            self.loop_count = 0;
        }

        if is_stop {
            self.time = key.time;
            self.playing = false;
            return KeyOutcome::Finished;
        }
        KeyOutcome::Continue
    }

    /// Advances by `dt`, firing every key reached on the way.
    ///
    /// Returns the root motion gathered by `motion` over all intermediate
    /// steps, so looping never produces a backwards jump.
    pub fn run(
        &mut self,
        dt: f32,
        group: &str,
        markers: &MarkerConvention,
        listener: &mut dyn TextKeyListener,
        mut motion: Option<&mut RootMotion>,
        accumulate: Vec3,
    ) -> Vec3 {
        let mut movement = Vec3::ZERO;
        let mut target = self.time + dt.max(0.0);

        while self.playing {
            let Some(key) = self.source.text_keys().get(self.next_key).copied() else {
                break;
            };
            if key.time > target {
                break;
            }

            let remaining = target - key.time;
            self.time = key.time;
            if let Some(m) = motion.as_deref_mut() {
                movement += m.step(&self.source, self.time, accumulate);
            }

            let index = self.next_key;
            self.next_key += 1;

            log::trace!("Group '{group}' reached '{}' at {:.3}", key.text(), key.time);
            if !listener.on_text_key(group, key.text()) {
                log::debug!("Group '{group}' stopped by listener at '{}'", key.text());
                self.playing = false;
                return movement;
            }

            match self.handle_key(index, group, markers) {
                KeyOutcome::Continue => {}
                KeyOutcome::Rewound => {
                    target = self.time + remaining;
                    if let Some(m) = motion.as_deref_mut() {
                        m.reset(&self.source, self.time, accumulate);
                    }
                }
                KeyOutcome::Finished => return movement,
            }
        }

        if self.playing {
            self.time = target;
            if let Some(m) = motion.as_deref_mut() {
                movement += m.step(&self.source, self.time, accumulate);
            }
        }
        movement
    }

    /// Samples every bound controller at the current time and writes the nodes.
    pub fn apply(&mut self, scene: &mut Scene, accumulate: Vec3) {
        for binding in &mut self.bindings {
            let Some(controller) = self.source.controllers().get(binding.controller) else {
                continue;
            };
            let Some(value) = controller.sample_with_cursor(self.time, &mut binding.cursor) else {
                continue;
            };
            let Some(node) = scene.get_node_mut(binding.node) else {
                continue;
            };

            match (controller.path(), value) {
                (TargetPath::Translation, ControllerValue::Vector3(v)) => {
                    node.transform.position = if binding.compensate {
                        v * (Vec3::ONE - accumulate)
                    } else {
                        v
                    };
                }
                (TargetPath::Scale, ControllerValue::Vector3(v)) => node.transform.scale = v,
                (TargetPath::Rotation, ControllerValue::Quaternion(q)) => node.transform.rotation = q,
                _ => continue,
            }
            node.transform.mark_dirty();
        }
    }
}
