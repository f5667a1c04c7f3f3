//! ---
//! gw_section: "05-dispatch"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "First-seen bookkeeping per transmitter."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::collections::HashSet;

use d7gw_sinks::TransmitterId;

/// Transmitters whose birth intents have already been emitted.
///
/// Membership only grows; there is no removal and no expiry.
#[derive(Debug, Default, Clone)]
pub struct TransmitterStateTracker {
    known: HashSet<TransmitterId>,
}

impl TransmitterStateTracker {
    /// Tracker with no known transmitters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the transmitter's birth has been emitted.
    pub fn is_known(&self, transmitter: TransmitterId) -> bool {
        self.known.contains(&transmitter)
    }

    /// Returns `true` if the transmitter was unseen until now.
    pub fn mark_known(&mut self, transmitter: TransmitterId) -> bool {
        self.known.insert(transmitter)
    }

    /// Number of known transmitters.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// True before the first birth.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}
