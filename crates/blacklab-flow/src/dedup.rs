// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded set of recently processed provider message ids.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use blacklab_core::MessageId;

/// Remembers the last `capacity` message ids, evicting the oldest first.
pub struct DedupCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    seen: HashSet<MessageId>,
    order: VecDeque<MessageId>,
}

impl DedupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Records `id`. Returns `false` if it was already present.
    pub fn claim(&self, id: &MessageId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !inner.seen.insert(id.clone()) {
            return false;
        }
        inner.order.push_back(id.clone());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.seen.remove(&oldest);
            }
        }
        true
    }

    /// Forgets `id` so a redelivery is processed again.
    pub fn release(&self, id: &MessageId) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.seen.remove(id) {
            inner.order.retain(|held| held != id);
        }
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .seen
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
