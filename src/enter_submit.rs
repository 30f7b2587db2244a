use std::cell::Cell;
use std::rc::Rc;

use crate::config::EnterSubmitConfig;
use crate::dom::NodeId;
use crate::events::{EventListener, EventState};
use crate::js_regex::Regex;
use crate::page::{Page, SubmitPath};
use crate::Result;

/// Which branch of the trigger policy handled an Enter press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The page's login hook was called (whether or not it failed).
    Hook,
    /// A login form was submitted.
    Form(SubmitPath),
    /// A login button was clicked.
    Button,
    /// Nothing on the page looked like a login affordance.
    Nothing,
}

#[derive(Debug, Clone, Copy)]
enum TriggerStrategy {
    Hook,
    Form,
    Button,
}

const TRIGGER_ORDER: [TriggerStrategy; 3] = [
    TriggerStrategy::Hook,
    TriggerStrategy::Form,
    TriggerStrategy::Button,
];

/// Capture-phase `keydown` listener that turns Enter into a login attempt.
///
/// At most one attempt runs per debounce window. The window starts at the
/// first accepted Enter and is closed by a one-shot page timer; further Enter
/// presses inside it still have their default action prevented but trigger
/// nothing. Composing keystrokes and other keys pass through untouched.
#[derive(Debug)]
pub struct EnterSubmit {
    config: EnterSubmitConfig,
    label_pattern: Regex,
    fired: Rc<Cell<bool>>,
}

impl EnterSubmit {
    pub fn new(config: EnterSubmitConfig) -> Result<Self> {
        config.validate()?;
        let label_pattern = config.compile_label_pattern()?;
        Ok(Self {
            config,
            label_pattern,
            fired: Rc::new(Cell::new(false)),
        })
    }

    /// Installs a listener with the default heuristics on `page`.
    pub fn install(page: &mut Page) -> Result<Rc<Self>> {
        Self::install_with(page, EnterSubmitConfig::default())
    }

    pub fn install_with(page: &mut Page, config: EnterSubmitConfig) -> Result<Rc<Self>> {
        let listener = Rc::new(Self::new(config)?);
        page.mark_enter_submit_installed()?;
        let root = page.document();
        page.add_listener_rc(root, "keydown", true, listener.clone());
        page.trace_listener_line(format!(
            "[enter] installed debounce_ms={}",
            listener.config.debounce_ms
        ));
        Ok(listener)
    }

    pub fn config(&self) -> &EnterSubmitConfig {
        &self.config
    }

    /// True while a debounce window is open.
    pub fn is_fired(&self) -> bool {
        self.fired.get()
    }

    fn on_key_down(&self, page: &mut Page, event: &mut EventState) {
        if event.is_composing() {
            return;
        }
        if event.key() != Some("Enter") {
            return;
        }
        event.prevent_default();

        if self.fired.get() {
            page.trace_listener_line("[enter] debounced".into());
            return;
        }
        self.fired.set(true);
        let fired = Rc::clone(&self.fired);
        let timer_id = page.set_timeout(self.config.debounce_ms, move |page: &mut Page| {
            fired.set(false);
            page.trace_listener_line("[enter] rearmed".into());
            Ok(())
        });
        page.trace_listener_line(format!(
            "[enter] armed timer={timer_id} until={}",
            page.now_ms().saturating_add(self.config.debounce_ms)
        ));

        match self.trigger(page) {
            Ok(outcome) => {
                page.trace_listener_line(format!("[enter] trigger outcome={outcome:?}"));
            }
            Err(err) => {
                page.trace_listener_line(format!("[enter] trigger failed (ignored): {err}"));
            }
        }
    }

    /// Runs the trigger policy once, ignoring the debounce window.
    pub fn trigger(&self, page: &mut Page) -> Result<TriggerOutcome> {
        for strategy in TRIGGER_ORDER {
            if let Some(outcome) = self.attempt(strategy, page)? {
                return Ok(outcome);
            }
        }
        Ok(TriggerOutcome::Nothing)
    }

    fn attempt(
        &self,
        strategy: TriggerStrategy,
        page: &mut Page,
    ) -> Result<Option<TriggerOutcome>> {
        match strategy {
            TriggerStrategy::Hook => Ok(self.call_hook(page)),
            TriggerStrategy::Form => self.submit_login_form(page),
            TriggerStrategy::Button => self.click_login_button(page),
        }
    }

    fn call_hook(&self, page: &mut Page) -> Option<TriggerOutcome> {
        let name = self.config.hook_name.as_str();
        if let Err(err) = page.call_global(name)? {
            page.trace_listener_line(format!("[enter] hook {name} failed (ignored): {err}"));
        }
        Some(TriggerOutcome::Hook)
    }

    fn submit_login_form(&self, page: &mut Page) -> Result<Option<TriggerOutcome>> {
        let Some(form) = self.find_login_form(page)? else {
            return Ok(None);
        };
        let path = if page.request_submit_supported() {
            page.request_submit_node(form, SubmitPath::RequestSubmit)?;
            SubmitPath::RequestSubmit
        } else {
            page.submit_form_node(form)?;
            SubmitPath::Direct
        };
        Ok(Some(TriggerOutcome::Form(path)))
    }

    fn find_login_form(&self, page: &Page) -> Result<Option<NodeId>> {
        let owner = page
            .query_selector(&self.config.password_selector)?
            .and_then(|password| page.form_owner(password));
        if owner.is_some() {
            return Ok(owner);
        }
        for selector in &self.config.form_fallbacks {
            // A `#loginForm` that is not a form does not end the search: the
            // next fallback (the first `form` on the page) is submitted instead.
            if let Some(form) = page.query_selector(selector)?.filter(|node| page.is_form(*node)) {
                return Ok(Some(form));
            }
        }
        Ok(None)
    }

    /// Clears `disabled` on the found button and clicks it.
    ///
    /// `set_disabled` only fails for non-element nodes. Both the button
    /// selector and the label scan yield elements, so the ignored error
    /// branch is never taken for a real candidate.
    fn click_login_button(&self, page: &mut Page) -> Result<Option<TriggerOutcome>> {
        let Some(button) = self.find_login_button(page)? else {
            return Ok(None);
        };
        if let Err(err) = page.set_disabled(button, false) {
            page.trace_listener_line(format!(
                "[enter] enabling {} failed (ignored): {err}",
                page.label(button)
            ));
        }
        page.click_node(button)?;
        Ok(Some(TriggerOutcome::Button))
    }

    fn find_login_button(&self, page: &Page) -> Result<Option<NodeId>> {
        if let Some(button) = page.query_selector(&self.config.button_selector)? {
            return Ok(Some(button));
        }
        let candidates = page.query_selector_all(&self.config.button_scan_selector)?;
        Ok(candidates.into_iter().find(|candidate| {
            let label = button_label(page, *candidate);
            matches!(self.label_pattern.is_match(&label), Ok(true))
        }))
    }
}

impl EventListener for EnterSubmit {
    fn handle_event(&self, page: &mut Page, event: &mut EventState) -> Result<()> {
        self.on_key_down(page, event);
        Ok(())
    }
}

/// `(textContent || value || "").trim()`
fn button_label(page: &Page, node: NodeId) -> String {
    let text = page.text_content(node);
    let raw = if !text.is_empty() {
        text
    } else {
        page.value(node).unwrap_or_default()
    };
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageAction;

    #[test]
    fn trigger_order_is_hook_form_button() {
        let order = TRIGGER_ORDER.map(|strategy| format!("{strategy:?}"));
        assert_eq!(order, ["Hook", "Form", "Button"]);
    }

    #[test]
    fn button_label_prefers_text_over_value() -> Result<()> {
        let page = Page::from_html(
            r#"
            <button id='a' value='login'>Sign in</button>
            <input id='b' type='submit' value=' Login '>
            <button id='c' value='login'>   </button>
            "#,
        )?;
        let a = page.get_element_by_id("a").expect("a exists");
        let b = page.get_element_by_id("b").expect("b exists");
        let c = page.get_element_by_id("c").expect("c exists");
        assert_eq!(button_label(&page, a), "Sign in");
        assert_eq!(button_label(&page, b), "Login");
        // Whitespace-only text is truthy, so value is never consulted.
        assert_eq!(button_label(&page, c), "");
        Ok(())
    }

    #[test]
    fn trigger_without_any_affordance_does_nothing() -> Result<()> {
        let mut page = Page::from_html("<p>welcome</p>")?;
        let listener = EnterSubmit::new(EnterSubmitConfig::default())?;
        assert_eq!(listener.trigger(&mut page)?, TriggerOutcome::Nothing);
        assert!(page.actions().is_empty());
        Ok(())
    }

    #[test]
    fn non_form_login_form_fallback_is_skipped() -> Result<()> {
        let mut page = Page::from_html(
            r#"
            <div id='loginForm'></div>
            <form id='real'><input name='user'></form>
            "#,
        )?;
        let listener = EnterSubmit::new(EnterSubmitConfig::default())?;
        assert_eq!(
            listener.trigger(&mut page)?,
            TriggerOutcome::Form(SubmitPath::RequestSubmit)
        );
        assert_eq!(
            page.take_actions(),
            vec![PageAction::Submitted {
                form: "#real".into(),
                path: SubmitPath::RequestSubmit,
            }]
        );
        Ok(())
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = EnterSubmit::new(EnterSubmitConfig::default().with_debounce_ms(-5))
            .expect_err("config should be rejected");
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
    }

    #[test]
    fn second_install_on_same_page_fails() -> Result<()> {
        let mut page = Page::from_html("<p>x</p>")?;
        EnterSubmit::install(&mut page)?;
        let err = EnterSubmit::install(&mut page).expect_err("second install should fail");
        assert_eq!(err, crate::Error::AlreadyInstalled);
        assert_eq!(page.listener_count(page.document(), "keydown"), 1);
        Ok(())
    }

    #[test]
    fn failed_config_does_not_consume_install_slot() -> Result<()> {
        let mut page = Page::from_html("<p>x</p>")?;
        assert!(
            EnterSubmit::install_with(&mut page, EnterSubmitConfig::default().with_hook_name(""))
                .is_err()
        );
        EnterSubmit::install(&mut page)?;
        Ok(())
    }
}
