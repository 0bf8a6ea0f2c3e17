//! Text key timelines
//!
//! A [`TextKeyMap`] is the marker timeline embedded in an animation source:
//! `(time, text)` pairs sorted by time, plus an index from text to positions so
//! markers can be located without scanning. Keys sharing a time keep their
//! declaration order.

use ember_core::interner::{self, Symbol};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// One marker on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextKey {
    pub time: f32,
    pub name: Symbol,
}

impl TextKey {
    #[inline]
    #[must_use]
    pub fn text(&self) -> &'static str {
        interner::resolve(self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextKeyMap {
    keys: Vec<TextKey>,
    index: FxHashMap<Symbol, SmallVec<[usize; 2]>>,
}

impl TextKeyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a timeline from unsorted `(time, text)` pairs.
    ///
    /// Keys with a non-finite time are dropped.
    pub fn from_keys<S: AsRef<str>>(keys: impl IntoIterator<Item = (f32, S)>) -> Self {
        let mut sorted: Vec<TextKey> = keys
            .into_iter()
            .filter_map(|(time, text)| {
                if time.is_finite() {
                    Some(TextKey {
                        time,
                        name: interner::intern(text.as_ref()),
                    })
                } else {
                    log::warn!("Dropping text key '{}' with invalid time", text.as_ref());
                    None
                }
            })
            .collect();
        sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut map = Self {
            keys: sorted,
            index: FxHashMap::default(),
        };
        map.rebuild_index();
        map
    }

    /// Inserts a key after any existing keys with the same time.
    pub fn insert(&mut self, time: f32, text: &str) {
        if !time.is_finite() {
            return;
        }
        let at = self.keys.partition_point(|k| k.time <= time);
        self.keys.insert(
            at,
            TextKey {
                time,
                name: interner::intern(text),
            },
        );
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, key) in self.keys.iter().enumerate() {
            self.index.entry(key.name).or_default().push(i);
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TextKey> {
        self.keys.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextKey> {
        self.keys.iter()
    }

    /// Positions of every key with exactly this text, ascending.
    #[must_use]
    pub fn positions(&self, text: &str) -> &[usize] {
        interner::get(text)
            .and_then(|sym| self.index.get(&sym))
            .map_or(&[][..], |p| p.as_slice())
    }

    /// First key with this text.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<usize> {
        self.positions(text).first().copied()
    }

    /// First key with this text at or after position `from`.
    #[must_use]
    pub fn find_from(&self, from: usize, text: &str) -> Option<usize> {
        let positions = self.positions(text);
        let at = positions.partition_point(|&p| p < from);
        positions.get(at).copied()
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        !self.positions(text).is_empty()
    }
}
