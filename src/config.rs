use crate::js_regex::{Regex, RegexBuilder};
use crate::selector::parse_selector_groups;
use crate::{Error, Result};

pub const DEFAULT_DEBOUNCE_MS: i64 = 800;
pub const DEFAULT_HOOK_NAME: &str = "doLogin";
pub const DEFAULT_PASSWORD_SELECTOR: &str = r#"input[type="password"], #password"#;
pub const DEFAULT_FORM_FALLBACKS: [&str; 2] = ["#loginForm", "form"];
pub const DEFAULT_BUTTON_SELECTOR: &str = r#"#loginBtn, button[type="submit"], .login-btn, [data-action="login"], button[name="login"]"#;
pub const DEFAULT_BUTTON_SCAN_SELECTOR: &str =
    r#"button, input[type="button"], input[type="submit"]"#;
pub const DEFAULT_LABEL_PATTERN: &str = "登录|login";

/// Tunables for [`crate::EnterSubmit`].
///
/// `Default` reproduces the stock login heuristics. Every selector is checked
/// by [`EnterSubmitConfig::validate`] before a listener is installed, so a bad
/// selector surfaces at install time instead of being swallowed on keypress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnterSubmitConfig {
    pub debounce_ms: i64,
    pub hook_name: String,
    pub password_selector: String,
    pub form_fallbacks: Vec<String>,
    pub button_selector: String,
    pub button_scan_selector: String,
    /// Matched case-insensitively against a button's trimmed label.
    pub label_pattern: String,
}

impl Default for EnterSubmitConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            hook_name: DEFAULT_HOOK_NAME.to_string(),
            password_selector: DEFAULT_PASSWORD_SELECTOR.to_string(),
            form_fallbacks: DEFAULT_FORM_FALLBACKS
                .iter()
                .map(|selector| selector.to_string())
                .collect(),
            button_selector: DEFAULT_BUTTON_SELECTOR.to_string(),
            button_scan_selector: DEFAULT_BUTTON_SCAN_SELECTOR.to_string(),
            label_pattern: DEFAULT_LABEL_PATTERN.to_string(),
        }
    }
}

impl EnterSubmitConfig {
    pub fn with_debounce_ms(mut self, debounce_ms: i64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_hook_name(mut self, hook_name: impl Into<String>) -> Self {
        self.hook_name = hook_name.into();
        self
    }

    pub fn with_password_selector(mut self, selector: impl Into<String>) -> Self {
        self.password_selector = selector.into();
        self
    }

    pub fn with_form_fallbacks<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.form_fallbacks = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_button_selector(mut self, selector: impl Into<String>) -> Self {
        self.button_selector = selector.into();
        self
    }

    pub fn with_button_scan_selector(mut self, selector: impl Into<String>) -> Self {
        self.button_scan_selector = selector.into();
        self
    }

    pub fn with_label_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.label_pattern = pattern.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms < 0 {
            return Err(Error::InvalidConfig(format!(
                "debounce_ms must be non-negative (got {})",
                self.debounce_ms
            )));
        }
        if self.hook_name.trim().is_empty() {
            return Err(Error::InvalidConfig("hook_name must not be empty".into()));
        }
        for selector in std::iter::once(&self.password_selector)
            .chain(self.form_fallbacks.iter())
            .chain([&self.button_selector, &self.button_scan_selector])
        {
            parse_selector_groups(selector)?;
        }
        self.compile_label_pattern()?;
        Ok(())
    }

    pub(crate) fn compile_label_pattern(&self) -> Result<Regex> {
        Ok(RegexBuilder::new(&self.label_pattern)
            .case_insensitive(true)
            .build()?)
    }
}
