use std::collections::HashMap;
use std::rc::Rc;

use crate::Result;
use crate::dom::NodeId;
use crate::page::Page;

/// Keyboard fields of a synthetic `keydown`/`keyup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInit {
    pub key: String,
    pub is_composing: bool,
}

impl KeyInit {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_composing: false,
        }
    }

    pub fn enter() -> Self {
        Self::new("Enter")
    }

    /// Marks the key as part of an IME composition sequence.
    pub fn composing(mut self) -> Self {
        self.is_composing = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Capturing,
    AtTarget,
    Bubbling,
}

#[derive(Debug, Clone)]
pub struct EventState {
    event_type: String,
    target: NodeId,
    current_target: NodeId,
    phase: EventPhase,
    key: Option<KeyInit>,
    cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId, cancelable: bool) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            phase: EventPhase::AtTarget,
            key: None,
            cancelable,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub(crate) fn keyboard(event_type: &str, target: NodeId, key: KeyInit) -> Self {
        let mut event = Self::new(event_type, target, true);
        event.key = Some(key);
        event
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// `None` for non-keyboard events.
    pub fn key(&self) -> Option<&str> {
        self.key.as_ref().map(|key| key.key.as_str())
    }

    pub fn is_composing(&self) -> bool {
        self.key.as_ref().is_some_and(|key| key.is_composing)
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub(crate) fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn enter(&mut self, node: NodeId, phase: EventPhase) {
        self.current_target = node;
        self.phase = phase;
    }
}

/// Callback registered with [`Page::add_event_listener`].
///
/// Listeners take `&self`: a listener may trigger a dispatch that reaches
/// itself again (a hook pressing Enter, say), so any state it keeps needs
/// interior mutability.
pub trait EventListener {
    fn handle_event(&self, page: &mut Page, event: &mut EventState) -> Result<()>;
}

impl<F> EventListener for F
where
    F: Fn(&mut Page, &mut EventState) -> Result<()>,
{
    fn handle_event(&self, page: &mut Page, event: &mut EventState) -> Result<()> {
        self(page, event)
    }
}

#[derive(Clone)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) handler: Rc<dyn EventListener>,
}

#[derive(Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    pub(crate) fn add(&mut self, node_id: NodeId, event: String, listener: Listener) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(listener);
    }

    /// Snapshot of listeners for one phase; later registrations do not run in
    /// the dispatch that is already under way.
    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn len(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for ListenerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .map
            .values()
            .flat_map(|events| events.values())
            .map(Vec::len)
            .sum::<usize>();
        f.debug_struct("ListenerStore")
            .field("listeners", &count)
            .finish()
    }
}
