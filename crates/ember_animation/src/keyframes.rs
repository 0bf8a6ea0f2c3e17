use crate::controller::{NodeController, TargetPath};
use crate::settings::MarkerConvention;
use crate::text_keys::TextKeyMap;

/// Everything one animation source contributes: its marker timeline and the
/// controllers that move individual nodes.
///
/// Immutable once built and shared as `Arc<KeyframeSet>` by every animation
/// component that loaded the same source.
#[derive(Debug, Clone, Default)]
pub struct KeyframeSet {
    name: String,
    text_keys: TextKeyMap,
    controllers: Vec<NodeController>,
}

impl KeyframeSet {
    #[must_use]
    pub fn new(name: impl Into<String>, text_keys: TextKeyMap, controllers: Vec<NodeController>) -> Self {
        Self {
            name: name.into(),
            text_keys,
            controllers,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn text_keys(&self) -> &TextKeyMap {
        &self.text_keys
    }

    #[inline]
    #[must_use]
    pub fn controllers(&self) -> &[NodeController] {
        &self.controllers
    }

    /// Index of the controller driving `path` of the node named `target`.
    #[must_use]
    pub fn find_controller(&self, target: &str, path: TargetPath) -> Option<usize> {
        self.controllers
            .iter()
            .position(|c| c.target() == target && c.path() == path)
    }

    /// Whether this source defines both the start and the stop marker of `group`.
    #[must_use]
    pub fn has_group(&self, group: &str, markers: &MarkerConvention) -> bool {
        let Some(start) = self.text_keys.find(&markers.key(group, &markers.start)) else {
            return false;
        };
        self.text_keys
            .find_from(start, &markers.key(group, &markers.stop))
            .is_some()
    }
}
