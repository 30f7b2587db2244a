//! Enter-to-login shim for a deterministic in-memory page.
//!
//! [`EnterSubmit`] listens for `keydown` on the document root during the
//! capture phase and turns an Enter keypress into one login attempt per
//! debounce window: a page-provided `doLogin` hook, the login form, or the
//! login button, in that order. [`Page`] supplies the document, event dispatch,
//! native form and click behavior and a virtual clock to run it against.
//!
//! ```
//! use enter_submit::{EnterSubmit, Page, PageAction, SubmitPath};
//!
//! let mut page = Page::from_html(
//!     r#"<form id='login'><input id='pw' type='password'></form>"#,
//! )?;
//! EnterSubmit::install(&mut page)?;
//! page.press_enter("#pw")?;
//! assert_eq!(
//!     page.take_actions(),
//!     vec![PageAction::Submitted {
//!         form: "#login".into(),
//!         path: SubmitPath::RequestSubmit,
//!     }]
//! );
//! # Ok::<(), enter_submit::Error>(())
//! ```

mod config;
mod dom;
mod enter_submit;
mod events;
mod html;
mod js_regex;
mod page;
mod selector;

pub use config::EnterSubmitConfig;
pub use dom::NodeId;
pub use enter_submit::{EnterSubmit, TriggerOutcome};
pub use events::{EventListener, EventPhase, EventState, KeyInit};
pub use page::{GlobalValue, Page, PageAction, PendingTimer, SubmitPath};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("enter listener already installed on this page")]
    AlreadyInstalled,
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("hook {name} failed: {message}")]
    HookFailed { name: String, message: String },
    #[error("assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}")]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl Error {
    /// Convenience for hook implementations that want to report a failure.
    pub fn hook(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests;
