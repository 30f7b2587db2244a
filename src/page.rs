use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeId, truncate_chars};
use crate::events::{EventListener, EventPhase, EventState, KeyInit, Listener, ListenerStore};
use crate::html::parse_html;
use crate::{Error, Result};

const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_GROW_SIZE: usize = 32 * 1024 * 1024;

type HookFn = Rc<dyn Fn(&mut Page) -> Result<()>>;
type TimerCallback = Box<dyn FnOnce(&mut Page) -> Result<()>>;

/// A value published on the page's window object.
#[derive(Clone)]
pub enum GlobalValue {
    Function(HookFn),
    Value(String),
}

impl GlobalValue {
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl fmt::Debug for GlobalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// How a form submission was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPath {
    /// `requestSubmit()`: validation plus a cancelable `submit` event.
    RequestSubmit,
    /// `submit()`: no validation, no event.
    Direct,
    /// Enter pressed in a text field of the form.
    Implicit,
    /// Activation of a submit button owned by the form.
    SubmitButton,
}

/// Observable side effects, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    HookInvoked { name: String },
    Clicked { target: String },
    Submitted { form: String, path: SubmitPath },
    SubmitBlocked { form: String, invalid: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    callback: TimerCallback,
}

#[derive(Debug)]
struct TraceState {
    enabled: bool,
    events: bool,
    timers: bool,
    listener: bool,
    logs: VecDeque<String>,
    log_limit: usize,
}

impl Default for TraceState {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            timers: true,
            listener: true,
            logs: VecDeque::new(),
            log_limit: 10_000,
        }
    }
}

pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    globals: HashMap<String, GlobalValue>,
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    timer_step_limit: usize,
    next_timer_id: i64,
    next_task_order: i64,
    active_element: Option<NodeId>,
    request_submit_supported: bool,
    actions: Vec<PageAction>,
    trace: TraceState,
    enter_submit_installed: bool,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("nodes", &self.dom.nodes.len())
            .field("listeners", &self.listeners)
            .field("globals", &self.globals)
            .field("pending_timers", &self.task_queue.len())
            .field("now_ms", &self.now_ms)
            .field("actions", &self.actions)
            .finish()
    }
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            globals: HashMap::new(),
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
            active_element: None,
            request_submit_supported: true,
            actions: Vec::new(),
            trace: TraceState::default(),
            enter_submit_installed: false,
        })
    }

    pub fn document(&self) -> NodeId {
        self.dom.root
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace.logs).into()
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace.timers = enabled;
    }

    pub fn set_trace_listener(&mut self, enabled: bool) {
        self.trace.listener = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.log_limit = max_entries;
        let overflow = self.trace.logs.len().saturating_sub(max_entries);
        self.trace.logs.drain(..overflow);
        Ok(())
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::InvalidConfig(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    /// Models browsers without `HTMLFormElement.requestSubmit`.
    pub fn set_request_submit_supported(&mut self, supported: bool) {
        self.request_submit_supported = supported;
    }

    pub fn request_submit_supported(&self) -> bool {
        self.request_submit_supported
    }

    // Window globals.

    pub fn define_global_fn<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut Page) -> Result<()> + 'static,
    {
        self.globals
            .insert(name.to_string(), GlobalValue::Function(Rc::new(f)));
    }

    pub fn define_global_value(&mut self, name: &str, value: impl Into<String>) {
        self.globals
            .insert(name.to_string(), GlobalValue::Value(value.into()));
    }

    pub fn remove_global(&mut self, name: &str) -> Option<GlobalValue> {
        self.globals.remove(name)
    }

    pub fn global(&self, name: &str) -> Option<&GlobalValue> {
        self.globals.get(name)
    }

    /// Calls the global `name` with no arguments if it is callable.
    /// Returns `None` when it is missing or not a function.
    pub fn call_global(&mut self, name: &str) -> Option<Result<()>> {
        let GlobalValue::Function(f) = self.globals.get(name)?.clone() else {
            return None;
        };
        self.actions.push(PageAction::HookInvoked {
            name: name.to_string(),
        });
        self.trace_listener_line(format!("[global] call {name}"));
        Some(stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || f(self)))
    }

    // Listeners.

    pub fn add_event_listener<L>(
        &mut self,
        selector: &str,
        event: &str,
        capture: bool,
        listener: L,
    ) -> Result<()>
    where
        L: EventListener + 'static,
    {
        let target = self.select_one(selector)?;
        self.add_listener_rc(target, event, capture, Rc::new(listener));
        Ok(())
    }

    pub fn add_document_listener<L>(&mut self, event: &str, capture: bool, listener: L)
    where
        L: EventListener + 'static,
    {
        self.add_listener_rc(self.dom.root, event, capture, Rc::new(listener));
    }

    pub(crate) fn add_listener_rc(
        &mut self,
        node: NodeId,
        event: &str,
        capture: bool,
        handler: Rc<dyn EventListener>,
    ) {
        self.listeners
            .add(node, event.to_string(), Listener { capture, handler });
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.listeners.len(node, event)
    }

    pub(crate) fn mark_enter_submit_installed(&mut self) -> Result<()> {
        if self.enter_submit_installed {
            return Err(Error::AlreadyInstalled);
        }
        self.enter_submit_installed = true;
        Ok(())
    }

    // Queries.

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.dom.query_selector(selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.dom.text_content(node)
    }

    pub fn value(&self, node: NodeId) -> Result<String> {
        self.dom.value(node)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.dom.set_attr(node, name, value)
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.dom.remove_attr(node, name)
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.dom.disabled(node)
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) -> Result<()> {
        self.dom.set_disabled(node, disabled)
    }

    pub fn is_form(&self, node: NodeId) -> bool {
        self.dom.has_tag(node, "form")
    }

    pub fn form_owner(&self, node: NodeId) -> Option<NodeId> {
        self.dom.form_owner(node)
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// `#id` when the element has an id, else its tag name.
    pub fn label(&self, node: NodeId) -> String {
        if let Some(id) = self.dom.attr(node, "id") {
            if !id.is_empty() {
                return format!("#{id}");
            }
        }
        self.dom
            .tag_name(node)
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| {
                if node == self.dom.root {
                    "document".to_string()
                } else {
                    format!("node-{}", node.0)
                }
            })
    }

    // Observations.

    pub fn actions(&self) -> &[PageAction] {
        &self.actions
    }

    pub fn take_actions(&mut self) -> Vec<PageAction> {
        std::mem::take(&mut self.actions)
    }

    pub fn submissions(&self) -> Vec<(String, SubmitPath)> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                PageAction::Submitted { form, path } => Some((form.clone(), *path)),
                _ => None,
            })
            .collect()
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_disabled(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.disabled(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("disabled={expected}"),
                actual: format!("disabled={actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    // User actions.

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        let tag = self.dom.tag_name(target).unwrap_or_default().to_ascii_lowercase();
        if tag != "input" && tag != "textarea" {
            return Err(Error::Runtime(format!(
                "type_text target {selector} is <{tag}>, expected input or textarea"
            )));
        }
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input", false)?;
        Ok(())
    }

    pub fn focus(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.focus_node(target)
    }

    pub fn blur(&mut self) -> Result<()> {
        let Some(current) = self.active_element.take() else {
            return Ok(());
        };
        self.dispatch_event(current, "blur", false)?;
        Ok(())
    }

    pub(crate) fn focus_node(&mut self, node: NodeId) -> Result<()> {
        if self.dom.disabled(node) || self.active_element == Some(node) {
            return Ok(());
        }
        self.blur()?;
        self.active_element = Some(node);
        self.dispatch_event(node, "focus", false)?;
        Ok(())
    }

    /// Dispatches `keydown` at the focused element (falling back to `body`,
    /// then the document) and runs the native default when not prevented.
    pub fn key_down(&mut self, key: KeyInit) -> Result<EventState> {
        let target = self.keyboard_target();
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.key_down_node(target, key)
        })
    }

    /// Focuses `selector`, then dispatches `keydown` and `keyup`.
    pub fn press_key(&mut self, selector: &str, key: KeyInit) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.focus_node(target)?;
            self.key_down_node(target, key.clone())?;
            let keyup = EventState::keyboard("keyup", target, key);
            self.dispatch(keyup)?;
            Ok(())
        })
    }

    pub fn press_enter(&mut self, selector: &str) -> Result<()> {
        self.press_key(selector, KeyInit::enter())
    }

    fn keyboard_target(&self) -> NodeId {
        self.active_element
            .or_else(|| self.dom.query_selector("body").ok().flatten())
            .unwrap_or(self.dom.root)
    }

    fn key_down_node(&mut self, target: NodeId, key: KeyInit) -> Result<EventState> {
        let is_enter = key.key == "Enter" && !key.is_composing;
        let keydown = self.dispatch(EventState::keyboard("keydown", target, key))?;
        if is_enter && !keydown.default_prevented() {
            self.run_enter_default(target)?;
        }
        Ok(keydown)
    }

    fn run_enter_default(&mut self, target: NodeId) -> Result<()> {
        let is_link = self.dom.has_tag(target, "a") && self.dom.attr(target, "href").is_some();
        if self.dom.has_tag(target, "button") || is_link {
            return self.click_node(target);
        }
        if is_implicit_submission_field(&self.dom, target) {
            if let Some(form) = self.dom.form_owner(target) {
                self.trace_event_line(format!(
                    "[event] implicit submission form={}",
                    self.label(form)
                ));
                self.request_submit_node(form, SubmitPath::Implicit)?;
            }
        }
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.click_node(target))
    }

    pub(crate) fn click_node(&mut self, target: NodeId) -> Result<()> {
        if self.dom.disabled(target) {
            self.trace_event_line(format!(
                "[event] click ignored target={} disabled=true",
                self.label(target)
            ));
            return Ok(());
        }

        self.actions.push(PageAction::Clicked {
            target: self.label(target),
        });
        let click = self.dispatch_event(target, "click", true)?;
        if click.default_prevented() {
            return Ok(());
        }

        if is_submit_control(&self.dom, target) {
            if let Some(form) = self.dom.form_owner(target) {
                self.request_submit_node(form, SubmitPath::SubmitButton)?;
            }
        }
        Ok(())
    }

    pub fn request_submit(&mut self, selector: &str) -> Result<()> {
        let form = self.select_form(selector)?;
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.request_submit_node(form, SubmitPath::RequestSubmit)
        })
    }

    pub fn submit_form(&mut self, selector: &str) -> Result<()> {
        let form = self.select_form(selector)?;
        self.submit_form_node(form)
    }

    fn select_form(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        if !self.is_form(target) {
            return Err(Error::Runtime(format!(
                "{selector} is <{}>, expected form",
                self.dom.tag_name(target).unwrap_or_default()
            )));
        }
        Ok(target)
    }

    /// Validates, dispatches a cancelable `submit`, and records the
    /// submission unless a listener prevented it.
    pub(crate) fn request_submit_node(&mut self, form: NodeId, path: SubmitPath) -> Result<()> {
        if let Some(invalid) = self.first_invalid_control(form) {
            self.dispatch_event(invalid, "invalid", false)?;
            self.actions.push(PageAction::SubmitBlocked {
                form: self.label(form),
                invalid: self.label(invalid),
            });
            return Ok(());
        }

        let submit = self.dispatch_event(form, "submit", true)?;
        if submit.default_prevented() {
            self.trace_event_line(format!(
                "[event] submit canceled form={}",
                self.label(form)
            ));
            return Ok(());
        }
        self.actions.push(PageAction::Submitted {
            form: self.label(form),
            path,
        });
        Ok(())
    }

    /// `form.submit()`: no validation, no `submit` event.
    pub(crate) fn submit_form_node(&mut self, form: NodeId) -> Result<()> {
        self.actions.push(PageAction::Submitted {
            form: self.label(form),
            path: SubmitPath::Direct,
        });
        Ok(())
    }

    fn first_invalid_control(&self, form: NodeId) -> Option<NodeId> {
        self.dom.form_controls(form).into_iter().find(|control| {
            self.dom.required(*control)
                && !self.dom.disabled(*control)
                && takes_text_value(&self.dom, *control)
                && self.dom.value(*control).is_ok_and(|value| value.is_empty())
        })
    }

    // Event dispatch.

    pub(crate) fn dispatch(&mut self, mut event: EventState) -> Result<EventState> {
        let target = event.target();
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        let (ancestors, _) = path.split_at(path.len() - 1);

        for node in ancestors {
            event.enter(*node, EventPhase::Capturing);
            self.invoke_listeners(*node, &mut event, true)?;
            if event.propagation_stopped() {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        event.enter(target, EventPhase::AtTarget);
        for capture in [true, false] {
            self.invoke_listeners(target, &mut event, capture)?;
            if event.propagation_stopped() {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        for node in ancestors.iter().rev() {
            event.enter(*node, EventPhase::Bubbling);
            self.invoke_listeners(*node, &mut event, false)?;
            if event.propagation_stopped() {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn dispatch_event(
        &mut self,
        target: NodeId,
        event_type: &str,
        cancelable: bool,
    ) -> Result<EventState> {
        self.dispatch(EventState::new(event_type, target, cancelable))
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut EventState,
        capture: bool,
    ) -> Result<()> {
        let listeners = self.listeners.get(node_id, event.event_type(), capture);
        for listener in listeners {
            if self.trace.enabled && self.trace.events {
                let phase = if capture { "capture" } else { "bubble" };
                self.trace_event_line(format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type(),
                    self.label(event.target()),
                    self.label(event.current_target()),
                    phase,
                    event.default_prevented()
                ));
            }
            listener.handler.handle_event(self, event)?;
        }
        Ok(())
    }

    // Timers.

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    /// Schedules a one-shot callback `delay_ms` after the current virtual time.
    pub fn set_timeout<F>(&mut self, delay_ms: i64, callback: F) -> i64
    where
        F: FnOnce(&mut Page) -> Result<()> + 'static,
    {
        let delay_ms = delay_ms.max(0);
        let due_at = self.now_ms.saturating_add(delay_ms);
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            callback: Box::new(callback),
        });
        self.trace_timer_line(format!(
            "[timer] schedule timeout id={id} due_at={due_at} delay_ms={delay_ms}"
        ));
        id
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Runtime(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        self.advance_time_to(self.now_ms.saturating_add(delta_ms))
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.now_ms {
            return Err(Error::Runtime(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.now_ms
            )));
        }
        let from = self.now_ms;
        // Each timer observes its own due time as "now".
        let ran = self.run_timer_queue(Some(target_ms))?;
        self.now_ms = target_ms;
        self.trace_timer_line(format!(
            "[timer] advance from={from} to={target_ms} ran_due={ran}"
        ));
        Ok(())
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_timer_queue(Some(self.now_ms))?;
        self.trace_timer_line(format!(
            "[timer] run_due now_ms={} ran={ran}",
            self.now_ms
        ));
        Ok(ran)
    }

    /// Runs every pending timer, moving the clock forward as needed.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.now_ms;
        let ran = self.run_timer_queue(None)?;
        self.trace_timer_line(format!(
            "[timer] flush from={from} to={} ran={ran}",
            self.now_ms
        ));
        Ok(())
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.next_task_index(due_limit) {
            steps += 1;
            if steps > self.timer_step_limit {
                return Err(Error::Runtime(format!(
                    "timer queue exceeded max task steps: limit={}, now_ms={}, pending_tasks={}",
                    self.timer_step_limit,
                    self.now_ms,
                    self.task_queue.len()
                )));
            }
            let task = self.task_queue.remove(next_idx);
            if task.due_at > self.now_ms {
                self.now_ms = task.due_at;
            }
            self.trace_timer_line(format!(
                "[timer] run id={} due_at={} now_ms={}",
                task.id, task.due_at, self.now_ms
            ));
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || (task.callback)(self))?;
        }
        Ok(steps)
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| due_limit.is_none_or(|limit| task.due_at <= limit))
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    // Tracing.

    fn trace_event_done(&mut self, event: &EventState, outcome: &str) {
        if !(self.trace.enabled && self.trace.events) {
            return;
        }
        self.trace_event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type(),
            self.label(event.target()),
            outcome,
            event.default_prevented()
        ));
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace.events {
            self.trace_line(line);
        }
    }

    fn trace_timer_line(&mut self, line: String) {
        if self.trace.timers {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_listener_line(&mut self, line: String) {
        if self.trace.listener {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace.enabled {
            return;
        }
        tracing::debug!(target: "enter_submit", "{line}");
        if self.trace.logs.len() >= self.trace.log_limit {
            self.trace.logs.pop_front();
        }
        self.trace.logs.push_back(line);
    }
}

fn input_type(dom: &Dom, node_id: NodeId) -> String {
    dom.attr(node_id, "type")
        .unwrap_or_else(|| "text".into())
        .to_ascii_lowercase()
}

fn is_submit_control(dom: &Dom, node_id: NodeId) -> bool {
    if dom.has_tag(node_id, "button") {
        return dom
            .attr(node_id, "type")
            .map(|kind| kind.eq_ignore_ascii_case("submit"))
            .unwrap_or(true);
    }
    dom.has_tag(node_id, "input")
        && matches!(input_type(dom, node_id).as_str(), "submit" | "image")
}

fn is_implicit_submission_field(dom: &Dom, node_id: NodeId) -> bool {
    dom.has_tag(node_id, "input")
        && matches!(
            input_type(dom, node_id).as_str(),
            "text"
                | "password"
                | "email"
                | "search"
                | "tel"
                | "url"
                | "number"
                | "date"
                | "datetime-local"
                | "month"
                | "time"
                | "week"
        )
}

fn takes_text_value(dom: &Dom, node_id: NodeId) -> bool {
    if dom.has_tag(node_id, "textarea") || dom.has_tag(node_id, "select") {
        return true;
    }
    dom.has_tag(node_id, "input")
        && !matches!(
            input_type(dom, node_id).as_str(),
            "checkbox" | "radio" | "submit" | "button" | "reset" | "image" | "hidden" | "file"
        )
}
