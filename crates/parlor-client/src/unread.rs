use std::collections::HashMap;

use parlor_shared::{ActiveConversation, UserId};

/// Per-peer count of direct messages received while that peer was not open.
///
/// Counts only go up, through [`UnreadCounters::increment`] or a backend
/// [`UnreadCounters::merge`]; the single way down is [`UnreadCounters::reset`]
/// when the peer's conversation is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadCounters {
    counts: HashMap<UserId, u32>,
}

impl UnreadCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count shown for `peer`; the open conversation always reads zero.
    pub fn get(&self, peer: &UserId, active: &ActiveConversation) -> u32 {
        if active.is_peer(peer) {
            return 0;
        }
        self.counts.get(peer).copied().unwrap_or(0)
    }

    /// Stored value, ignoring the active-conversation rule.
    pub fn stored(&self, peer: &UserId) -> u32 {
        self.counts.get(peer).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, peer: &UserId) -> u32 {
        let count = self.counts.entry(peer.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn reset(&mut self, peer: &UserId) {
        self.counts.insert(peer.clone(), 0);
    }

    /// Merge the backend's counts. A refresh can race with messages counted
    /// locally, so a peer never drops below what we already hold; the open
    /// peer stays at zero.
    pub fn merge(&mut self, counts: HashMap<UserId, u32>, active: &ActiveConversation) {
        for (peer, count) in counts {
            let local = self.counts.entry(peer).or_insert(0);
            *local = (*local).max(count);
        }
        if let Some(peer) = active.peer() {
            self.counts.insert(peer.clone(), 0);
        }
    }
}
