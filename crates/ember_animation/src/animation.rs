use std::collections::BTreeMap;
use std::sync::Arc;

use ember_core::{EmberError, Result};
use ember_scene::{NodeHandle, Scene};
use glam::Vec3;

use crate::controller::TargetPath;
use crate::keyframes::KeyframeSet;
use crate::settings::{AnimationSettings, MarkerConvention};
use crate::state::{AnimInfo, AnimState, RootMotion};
use crate::velocity::calc_anim_velocity;

/// Receives every text key an animation group reaches.
///
/// `key` is the full key text, e.g. `"attack: hit"` or `"soundgen: left"`.
/// Returning `false` stops the group on that key.
pub trait TextKeyListener {
    fn on_text_key(&mut self, group: &str, key: &str) -> bool;
}

impl<F> TextKeyListener for F
where
    F: FnMut(&str, &str) -> bool,
{
    fn on_text_key(&mut self, group: &str, key: &str) -> bool {
        self(group, key)
    }
}

/// Listener that lets every group play through.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreKeys;

impl TextKeyListener for IgnoreKeys {
    fn on_text_key(&mut self, _group: &str, _key: &str) -> bool {
        true
    }
}

/// Source of shared keyframe sets, typically a cache keyed by model name.
pub trait KeyframeProvider {
    fn keyframes(&self, name: &str) -> Result<Arc<KeyframeSet>>;
}

/// Per-entity animation component.
///
/// Owns the ordered list of animation sources, one [`AnimState`] per playing
/// group, and the root motion bookkeeping of the movement group. Controllers
/// are bound to nodes under the object root set with
/// [`set_object_root`](Self::set_object_root).
pub struct Animation {
    markers: MarkerConvention,
    accum_root_name: Option<String>,
    accumulate: Vec3,
    speed_mult: f32,
    anim_velocity: f32,

    object_root: Option<NodeHandle>,
    sources: Vec<Arc<KeyframeSet>>,
    states: BTreeMap<String, AnimState>,
    movement: Option<RootMotion>,
}

impl Animation {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        let accumulate = settings.accumulate();
        Self {
            markers: settings.markers,
            accum_root_name: settings.accum_root,
            accumulate,
            speed_mult: settings.speed,
            anim_velocity: 0.0,
            object_root: None,
            sources: Vec::new(),
            states: BTreeMap::new(),
            movement: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn markers(&self) -> &MarkerConvention {
        &self.markers
    }

    #[inline]
    #[must_use]
    pub fn object_root(&self) -> Option<NodeHandle> {
        self.object_root
    }

    /// Sets the instance this component animates and rebinds every live group.
    pub fn set_object_root(&mut self, scene: &Scene, root: NodeHandle) {
        self.object_root = Some(root);
        let accum_root = self.accum_root_name.as_deref();
        for state in self.states.values_mut() {
            state.bind(scene, self.object_root, accum_root);
        }
    }

    /// Node named `name` under the object root.
    #[must_use]
    pub fn node(&self, scene: &Scene, name: &str) -> Option<NodeHandle> {
        scene.find_node_by_name(self.object_root?, name)
    }

    // ========================================================================
    // Sources
    // ========================================================================

    /// Appends the keyframes of `model`; later sources take precedence.
    pub fn add_anim_source(&mut self, provider: &dyn KeyframeProvider, model: &str) -> Result<()> {
        let set = provider.keyframes(model)?;
        self.add_keyframe_set(set);
        Ok(())
    }

    pub fn add_keyframe_set(&mut self, set: Arc<KeyframeSet>) {
        log::debug!(
            "Adding animation source '{}' ({} keys, {} controllers)",
            set.name(),
            set.text_keys().len(),
            set.controllers().len()
        );
        self.sources.push(set);
    }

    /// Drops every source and every playback state built from them.
    pub fn clear_anim_sources(&mut self) {
        self.states.clear();
        self.sources.clear();
        self.movement = None;
        self.anim_velocity = 0.0;
    }

    #[inline]
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn has_animation(&self, group: &str) -> bool {
        self.sources.iter().any(|s| s.has_group(group, &self.markers))
    }

    // ========================================================================
    // Speed & accumulation
    // ========================================================================

    /// Per-axis share of the accumulation root's movement reported as root motion.
    pub fn set_accumulation(&mut self, accumulate: Vec3) {
        self.accumulate = accumulate.clamp(Vec3::ZERO, Vec3::ONE);
    }

    #[inline]
    #[must_use]
    pub fn accumulation(&self) -> Vec3 {
        self.accumulate
    }

    /// Plays the movement group so that it covers `speed` units per second.
    ///
    /// Without a moving group the multiplier falls back to 1.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed_mult = if self.anim_velocity > f32::EPSILON {
            speed / self.anim_velocity
        } else {
            1.0
        };
    }

    pub fn set_speed_multiplier(&mut self, mult: f32) {
        self.speed_mult = mult.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_mult
    }

    /// Natural speed of the current movement group, in units per second.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.anim_velocity
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Starts `group` between its `start` and `stop` markers.
    ///
    /// Sources are searched newest first. On failure the group's previous state
    /// is left untouched. Returns whether the group produces root motion.
    pub fn play(
        &mut self,
        scene: &Scene,
        group: &str,
        start: &str,
        stop: &str,
        start_fraction: f32,
        loops: usize,
    ) -> Result<bool> {
        let found = self.sources.iter().enumerate().rev().find_map(|(index, source)| {
            AnimState::reset(source, group, start, stop, start_fraction, loops, &self.markers)
                .map(|state| (index, state))
        });

        let Some((source_index, mut state)) = found else {
            log::warn!("Cannot play '{group}': no source has markers '{start}'..'{stop}'");
            return Err(EmberError::InvalidMarkerRange {
                group: group.to_string(),
                start: start.to_string(),
                stop: stop.to_string(),
            });
        };

        state.bind(scene, self.object_root, self.accum_root_name.as_deref());

        let motion = self.root_motion_for(group, source_index, &state);
        let moves = motion.is_some();
        match motion {
            Some((velocity, controller)) => {
                self.anim_velocity = velocity;
                let mut root_motion = RootMotion {
                    group: group.to_string(),
                    controller,
                    last_position: Vec3::ZERO,
                };
                root_motion.reset(&state.source, state.time, self.accumulate);
                self.movement = Some(root_motion);
            }
            None => {
                if self.movement.as_ref().is_some_and(|m| m.group == group) {
                    self.movement = None;
                }
            }
        }

        log::debug!(
            "Playing '{group}' from '{}' ({start}..{stop}, loops {loops}, root motion {moves})",
            state.source.name()
        );
        self.states.insert(group.to_string(), state);
        Ok(moves)
    }

    /// Velocity and accumulation-root controller if `group` should drive root motion.
    fn root_motion_for(&self, group: &str, source_index: usize, state: &AnimState) -> Option<(f32, usize)> {
        let accum_name = self.accum_root_name.as_deref()?;
        if self.accumulate == Vec3::ZERO {
            return None;
        }
        let controller = state.source.find_controller(accum_name, TargetPath::Translation)?;

        // a source without movement for this group may share it with an older one
        self.sources[..=source_index].iter().rev().find_map(|source| {
            let ctrl = source.find_controller(accum_name, TargetPath::Translation)?;
            let velocity = calc_anim_velocity(
                source.text_keys(),
                &source.controllers()[ctrl],
                self.accumulate,
                group,
                &self.markers,
            );
            (velocity > 0.0).then_some((velocity, controller))
        })
    }

    /// Stops and forgets `group`. Returns `false` if it was not active.
    pub fn disable(&mut self, group: &str) -> bool {
        if self.movement.as_ref().is_some_and(|m| m.group == group) {
            self.movement = None;
        }
        self.states.remove(group).is_some()
    }

    #[must_use]
    pub fn get_info(&self, group: &str) -> Option<AnimInfo> {
        self.states.get(group).map(|s| s.info(group, &self.markers))
    }

    #[must_use]
    pub fn is_playing(&self, group: &str) -> bool {
        self.states.get(group).is_some_and(|s| s.playing)
    }

    /// Advances every playing group by `dt` and poses the bound nodes.
    ///
    /// Returns the root motion of the movement group for this frame; the caller
    /// applies it to the entity exactly once.
    pub fn advance(&mut self, scene: &mut Scene, dt: f32, listener: &mut dyn TextKeyListener) -> Vec3 {
        let dt = dt * self.speed_mult;
        let mut movement = Vec3::ZERO;

        for (group, state) in &mut self.states {
            if !state.playing {
                continue;
            }
            let motion = self.movement.as_mut().filter(|m| m.group == *group);
            movement += state.run(dt, group, &self.markers, listener, motion, self.accumulate);
        }

        for state in self.states.values_mut() {
            state.apply(scene, self.accumulate);
        }
        movement
    }
}
