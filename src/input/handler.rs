use crate::{
    input::events::{EventKind, MapEvent},
    prelude::HashMap,
};
use std::collections::VecDeque;

/// Listener invoked for every processed event of the kind it registered for
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queues map events and fans them out to registered listeners
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event kind
    listeners: HashMap<EventKind, Vec<EventCallback>>,
    /// Event queue for processing
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Process all queued events in emission order
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(&event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    /// Number of queued, unprocessed events
    pub fn pending(&self) -> usize {
        self.event_queue.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listener_kinds", &self.listeners.keys().collect::<Vec<_>>())
            .field("queued", &self.pending())
            .finish()
    }
}
