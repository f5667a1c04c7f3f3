//! ---
//! gw_section: "03-publish-bus"
//! gw_subsection: "module"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Publish intents and the boundary towards the publish bus."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{PublishError, PublishIntent, Result};

/// Boundary towards a publish-bus client.
///
/// Implementations must not block: a publish either queues the intent or
/// fails immediately. Delivery acknowledgement is the client's concern.
pub trait Publisher: Send + Sync {
    /// Queue an intent for delivery.
    fn publish(&self, intent: &PublishIntent) -> Result<()>;
    /// Human-readable publisher name for logging/metrics.
    fn name(&self) -> &'static str;
}

/// In-memory publisher backed by a mutex protected queue.
#[derive(Clone)]
pub struct InMemoryPublisher {
    queue: Arc<Mutex<VecDeque<PublishIntent>>>,
    connected: Arc<AtomicBool>,
}

impl InMemoryPublisher {
    /// Create a connected in-memory publisher.
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulate the bus going up or down.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Pop the oldest queued intent.
    pub fn recv(&self) -> Option<PublishIntent> {
        self.queue.lock().pop_front()
    }

    /// Take every queued intent, oldest first.
    pub fn drain(&self) -> Vec<PublishIntent> {
        self.queue.lock().drain(..).collect()
    }

    /// Number of queued intents.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Default for InMemoryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for InMemoryPublisher {
    fn publish(&self, intent: &PublishIntent) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(PublishError::Disconnected);
        }
        self.queue.lock().push_back(intent.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
