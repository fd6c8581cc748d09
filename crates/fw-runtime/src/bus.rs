//! Synchronous single-handler-per-topic publish/subscribe registry.
//!
//! Decouples the arm-intent producer (input capture) from the
//! placement/detonation consumer. Each topic holds at most one handler;
//! registering again replaces it. Emitting runs the handler on the caller's
//! stack and hands back whatever it returns. Handler errors are part of that
//! return value and are never swallowed here.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

/// A named bus channel.
pub type Topic = &'static str;

/// Topics wired by the coordinator.
pub mod topics {
    use super::Topic;

    /// Input capture asks for an arming session to begin.
    pub const ARM_INTENT: Topic = "arm-intent";
    /// Arming completed and validated; the device may be placed.
    pub const DEVICE_READY_FOR_PLACEMENT: Topic = "device-ready-for-placement";
}

type HandlerFn<C, P, R> = dyn FnMut(&mut C, P) -> R;

/// Topic registry. `C` is the context handed to handlers at emit time,
/// `P` the payload and `R` the handler result.
pub struct EventBus<C, P, R = ()> {
    handlers: HashMap<Topic, Box<HandlerFn<C, P, R>>>,
}

impl<C, P, R> fmt::Debug for EventBus<C, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut topics: Vec<_> = self.handlers.keys().collect();
        topics.sort();
        f.debug_struct("EventBus").field("topics", &topics).finish()
    }
}

impl<C, P, R> Default for EventBus<C, P, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P, R> EventBus<C, P, R> {
    /// An empty bus.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Bind `handler` to `topic`, replacing any previous handler.
    /// Returns true if a handler was replaced.
    pub fn register(&mut self, topic: Topic, handler: impl FnMut(&mut C, P) -> R + 'static) -> bool {
        let replaced = self.handlers.insert(topic, Box::new(handler)).is_some();
        if replaced {
            debug!(topic, "bus handler replaced");
        }
        replaced
    }

    /// Remove the handler bound to `topic`.
    pub fn unregister(&mut self, topic: Topic) -> bool {
        self.handlers.remove(topic).is_some()
    }

    /// Whether `topic` has a handler.
    pub fn is_bound(&self, topic: Topic) -> bool {
        self.handlers.contains_key(topic)
    }

    /// Invoke the handler bound to `topic`. `None` if nothing is bound.
    pub fn emit(&mut self, ctx: &mut C, topic: Topic, payload: P) -> Option<R> {
        match self.handlers.get_mut(topic) {
            Some(handler) => {
                trace!(topic, "bus emit");
                Some(handler(ctx, payload))
            }
            None => {
                trace!(topic, "bus emit with no handler");
                None
            }
        }
    }
}
