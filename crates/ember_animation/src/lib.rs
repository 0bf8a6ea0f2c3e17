//! Marker-driven keyframe animation for Ember.
//!
//! Animation sources ([`KeyframeSet`]) carry a text key timeline and per-node
//! controllers. The [`Animation`] component plays named groups between their
//! markers, loops them, reports every key it passes and extracts root motion
//! from the accumulation root.

mod values;
pub mod animation;
pub mod controller;
pub mod keyframes;
pub mod settings;
pub mod state;
pub mod text_keys;
pub mod tracks;
pub mod velocity;

pub use animation::{Animation, IgnoreKeys, KeyframeProvider, TextKeyListener};
pub use controller::{ChannelData, ControllerValue, NodeController, TargetPath};
pub use keyframes::KeyframeSet;
pub use settings::{AnimationSettings, MarkerConvention};
pub use state::AnimInfo;
pub use text_keys::{TextKey, TextKeyMap};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
pub use velocity::{calc_anim_velocity, find_group_start};
