//! In-flight poll ids
//!
//! Open and close run several chat calls between checking the store and
//! changing it. A claim keeps a second request for the same id out of that
//! window until the first one finishes.

use parking_lot::Mutex;
use std::collections::HashSet;

/// Poll ids with an operation in progress
#[derive(Debug, Default)]
pub struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or `None` if another request holds it
    pub fn claim(&self, id: &str) -> Option<Claim<'_>> {
        if !self.ids.lock().insert(id.to_string()) {
            return None;
        }
        Some(Claim {
            owner: self,
            id: id.to_string(),
        })
    }

    #[cfg(test)]
    fn is_claimed(&self, id: &str) -> bool {
        self.ids.lock().contains(id)
    }
}

/// Held for the duration of one operation; released on drop
#[derive(Debug)]
pub struct Claim<'a> {
    owner: &'a InFlight,
    id: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.owner.ids.lock().remove(&self.id);
    }
}
