// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bidirectional link tables.
//!
//! A [`Relation`] holds the authoritative forward links from sources to
//! targets and a reverse index from targets back to sources. Every change
//! goes through [`Relation::set`], which rewrites both sides together, so the
//! two can never disagree.

use std::collections::HashMap;
use std::fmt;

use crate::store::Handle;

/// Many-to-many links from `A` entities to `B` entities.
pub struct Relation<A, B> {
    forward: HashMap<Handle<A>, Vec<Handle<B>>>,
    reverse: HashMap<Handle<B>, Vec<Handle<A>>>,
}

impl<A, B> Default for Relation<A, B> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }
}

impl<A, B> fmt::Debug for Relation<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("sources", &self.forward.len())
            .field("targets", &self.reverse.len())
            .finish()
    }
}

impl<A, B> Relation<A, B> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all links of `source` with `targets`, mirroring the change in
    /// the reverse index. Duplicate targets are collapsed, order is kept.
    pub fn set(&mut self, source: Handle<A>, targets: impl IntoIterator<Item = Handle<B>>) {
        let mut next: Vec<Handle<B>> = Vec::new();
        for target in targets {
            if !next.contains(&target) {
                next.push(target);
            }
        }

        let previous = self.forward.remove(&source).unwrap_or_default();
        if previous == next {
            if !next.is_empty() {
                self.forward.insert(source, next);
            }
            return;
        }

        for target in &previous {
            if next.contains(target) {
                continue;
            }
            if let Some(sources) = self.reverse.get_mut(target) {
                sources.retain(|&s| s != source);
                if sources.is_empty() {
                    self.reverse.remove(target);
                }
            }
        }

        for &target in &next {
            if previous.contains(&target) {
                continue;
            }
            self.reverse.entry(target).or_default().push(source);
        }

        if !next.is_empty() {
            self.forward.insert(source, next);
        }
    }

    /// Link `source` to at most one target.
    pub fn set_one(&mut self, source: Handle<A>, target: Option<Handle<B>>) {
        self.set(source, target);
    }

    /// Drop every link of `source`.
    pub fn clear_source(&mut self, source: Handle<A>) {
        self.set(source, None);
    }

    /// Drop every link pointing at `target`.
    pub fn clear_target(&mut self, target: Handle<B>) {
        let sources = self.reverse.get(&target).cloned().unwrap_or_default();
        for source in sources {
            let remaining: Vec<Handle<B>> = self
                .targets(source)
                .iter()
                .copied()
                .filter(|&t| t != target)
                .collect();
            self.set(source, remaining);
        }
    }

    /// Targets linked from `source`, in the order they were set.
    #[must_use]
    pub fn targets(&self, source: Handle<A>) -> &[Handle<B>] {
        self.forward.get(&source).map_or(&[], Vec::as_slice)
    }

    /// First target linked from `source`.
    #[must_use]
    pub fn target(&self, source: Handle<A>) -> Option<Handle<B>> {
        self.targets(source).first().copied()
    }

    /// Sources linking to `target`, in the order the links were made.
    #[must_use]
    pub fn sources(&self, target: Handle<B>) -> &[Handle<A>] {
        self.reverse.get(&target).map_or(&[], Vec::as_slice)
    }

    /// Number of sources with at least one link.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Whether the forward and reverse sides describe the same link set.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let forward_links: usize = self.forward.values().map(Vec::len).sum();
        let reverse_links: usize = self.reverse.values().map(Vec::len).sum();

        forward_links == reverse_links
            && self.forward.iter().all(|(source, targets)| {
                targets
                    .iter()
                    .all(|target| self.sources(*target).contains(source))
            })
    }
}
