//! Marker-derived helpers that need no animation state.

use glam::Vec3;

use crate::controller::NodeController;
use crate::settings::MarkerConvention;
use crate::text_keys::TextKeyMap;

/// Position of the start marker of `group`, if the timeline has one.
#[must_use]
pub fn find_group_start(keys: &TextKeyMap, group: &str, markers: &MarkerConvention) -> Option<usize> {
    keys.find(&markers.key(group, &markers.start))
}

/// Average accumulated speed of `group`'s movement, in units per second.
///
/// Measured over the loop section when the group has one (`loop start` ..
/// `loop stop`), otherwise over `start` .. `stop`. Returns `0.0` when the
/// window is empty or the controller does not drive a translation.
#[must_use]
pub fn calc_anim_velocity(
    keys: &TextKeyMap,
    controller: &NodeController,
    accumulate: Vec3,
    group: &str,
    markers: &MarkerConvention,
) -> f32 {
    let start = markers.key(group, &markers.start);
    let loop_start = markers.key(group, &markers.loop_start);
    let loop_stop = markers.key(group, &markers.loop_stop);
    let stop = markers.key(group, &markers.stop);

    let mut start_time = None;
    let mut stop_time = None;
    for key in keys.iter() {
        let text = key.text();
        if text == loop_start {
            start_time = Some(key.time);
        } else if text == start && start_time.is_none() {
            start_time = Some(key.time);
        } else if text == loop_stop || text == stop {
            stop_time = Some(key.time);
            break;
        }
    }

    let (Some(start_time), Some(stop_time)) = (start_time, stop_time) else {
        return 0.0;
    };
    if stop_time <= start_time {
        return 0.0;
    }

    let (Some(start_pos), Some(end_pos)) = (
        controller.translation_at(start_time),
        controller.translation_at(stop_time),
    ) else {
        return 0.0;
    };
    (start_pos * accumulate).distance(end_pos * accumulate) / (stop_time - start_time)
}
