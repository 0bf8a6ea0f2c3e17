use serde::{Deserialize, Serialize};

use crate::values::Interpolatable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last keyframe interval a track was sampled in.
///
/// Playback is mostly monotonic, so the next sample is almost always within a
/// few frames of the last one.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    /// For `CubicSpline`, three entries per key: in-tangent, value, out-tangent.
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Number of values a well-formed track of this mode must carry.
    #[must_use]
    pub fn expected_value_count(&self) -> usize {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.times.len() * 3,
            _ => self.times.len(),
        }
    }

    /// Non-empty, strictly increasing finite times and a matching value count.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.times.is_empty()
            && self.values.len() == self.expected_value_count()
            && self.times.iter().all(|t| t.is_finite())
            && self.times.windows(2).all(|w| w[0] < w[1])
    }

    /// Stateless sample. Times outside the track clamp to the first/last key.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        if self.times.is_empty() {
            return None;
        }
        let next_idx = self.times.partition_point(|&t| t <= time);
        let idx = next_idx.saturating_sub(1);
        self.sample_at_frame(idx, time)
    }

    /// Sample using a cursor: O(1) for forward playback, binary search after jumps.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> Option<T> {
        let len = self.times.len();
        if len == 0 {
            return None;
        }
        if len == 1 {
            return self.get_value_at(0);
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found_index = if time >= t_curr {
            // forward scan
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    if time >= self.times[len - 1] {
                        res = Some(len - 1);
                    }
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // backward scan, e.g. after a loop rewind
            let mut res = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                if i < offset {
                    break;
                }
                let idx = i - offset;
                if time >= self.times[idx] {
                    res = Some(idx);
                    break;
                }
            }
            res
        };

        let final_index = found_index.unwrap_or_else(|| {
            let next_idx = self.times.partition_point(|&t| t <= time);
            next_idx.saturating_sub(1)
        });
        cursor.last_index = final_index;

        self.sample_at_frame(final_index, time)
    }

    fn get_value_at(&self, index: usize) -> Option<T> {
        match self.interpolation {
            InterpolationMode::CubicSpline => self.values.get(index * 3 + 1).copied(),
            _ => self.values.get(index).copied(),
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> Option<T> {
        let len = self.times.len();
        if index >= len - 1 {
            return self.get_value_at(len - 1);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => self.get_value_at(index),
            InterpolationMode::Linear => {
                let v0 = self.get_value_at(index)?;
                let v1 = self.get_value_at(next_idx)?;
                Some(T::interpolate_linear(v0, v1, t))
            }
            InterpolationMode::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;

                let v0 = *self.values.get(i_prev + 1)?;
                let out_tangent0 = *self.values.get(i_prev + 2)?;
                let in_tangent1 = *self.values.get(i_next)?;
                let v1 = *self.values.get(i_next + 1)?;

                Some(T::interpolate_cubic(v0, out_tangent0, in_tangent1, v1, t, dt))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_survives_rewind() {
        let track = KeyframeTrack::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![0.0_f32, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
            InterpolationMode::Linear,
        );
        let mut cursor = KeyframeCursor::default();

        assert_eq!(track.sample_with_cursor(5.5, &mut cursor), Some(55.0));
        // a loop rewind jumps further back than the local scan reaches
        assert_eq!(track.sample_with_cursor(0.5, &mut cursor), Some(5.0));
        assert_eq!(cursor.last_index, 0);
    }

    #[test]
    fn test_validity() {
        let ok = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 1.0], InterpolationMode::Linear);
        let unsorted = KeyframeTrack::new(vec![1.0, 0.0], vec![0.0_f32, 1.0], InterpolationMode::Linear);
        let short_cubic =
            KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 1.0], InterpolationMode::CubicSpline);

        assert!(ok.is_valid());
        assert!(!unsorted.is_valid());
        assert!(!short_cubic.is_valid());
        assert_eq!(KeyframeTrack::<f32>::new(vec![], vec![], InterpolationMode::Step).sample(0.0), None);
    }
}
