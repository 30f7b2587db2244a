use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorPseudoClass {
    Disabled,
    Enabled,
    Not(Vec<Vec<SelectorPart>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
    pub(crate) pseudo_classes: Vec<SelectorPseudoClass>,
}

impl SelectorStep {
    pub(crate) fn id_only(&self) -> Option<&str> {
        if !self.universal
            && self.tag.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
        {
            self.id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to previous (left) selector part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let tokens = tokenize_selector(selector)?;
    let mut steps = Vec::new();
    let mut pending_combinator: Option<SelectorCombinator> = None;

    for token in tokens {
        let combinator = match token.as_str() {
            ">" => Some(SelectorCombinator::Child),
            "+" => Some(SelectorCombinator::AdjacentSibling),
            "~" => Some(SelectorCombinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending_combinator = Some(combinator);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    Ok(steps)
}

/// Splits on `sep` bytes that sit outside brackets, parens and quotes.
/// Combinator bytes are emitted as their own tokens when `keep_combinators`.
fn split_top_level(
    selector: &str,
    is_sep: impl Fn(char) -> bool,
    keep_combinators: bool,
) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '\'' | '"' if bracket_depth > 0 || paren_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                if paren_depth == 0 {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                paren_depth -= 1;
                current.push(ch);
            }
            '>' | '+' | '~' if keep_combinators && bracket_depth == 0 && paren_depth == 0 => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
                parts.push(ch.to_string());
            }
            ch if is_sep(ch) && bracket_depth == 0 && paren_depth == 0 => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                } else if !keep_combinators {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || paren_depth != 0 || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    } else if !keep_combinators {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(parts)
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    split_top_level(selector, |ch| ch == ',', false)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    split_top_level(selector, |ch| ch.is_ascii_whitespace(), true)
}

/// Byte cursor over one compound selector such as `button.primary[type="submit"]`.
struct StepScanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> StepScanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn ident(&mut self) -> Option<&'a str> {
        let src = self.src;
        let rest = src.get(self.pos..)?;
        let len = rest.bytes().take_while(|b| is_ident_byte(*b)).count();
        if len == 0 {
            return None;
        }
        self.pos += len;
        rest.get(..len)
    }

    /// Text between `open` at the cursor and its matching `close`. Quoted
    /// runs are skipped while counting.
    fn delimited(&mut self, open: u8, close: u8) -> Option<&'a str> {
        if self.peek()? != open {
            return None;
        }
        let src = self.src;
        let start = self.pos + 1;
        let mut depth = 1usize;
        let mut quote = None;
        for (offset, b) in src.bytes().skip(start).enumerate() {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                continue;
            }
            if b == b'\'' || b == b'"' {
                quote = Some(b);
            } else if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    self.pos = start + offset + 1;
                    return src.get(start..start + offset);
                }
            }
        }
        None
    }
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let unsupported = || Error::UnsupportedSelector(part.to_string());
    if part.is_empty() {
        return Err(unsupported());
    }

    let mut scanner = StepScanner { src: part, pos: 0 };
    let mut step = SelectorStep::default();
    while let Some(byte) = scanner.peek() {
        match byte {
            b'*' if scanner.pos == 0 => {
                step.universal = true;
                scanner.pos += 1;
            }
            b'#' => {
                scanner.pos += 1;
                let id = scanner.ident().ok_or_else(unsupported)?;
                if step.id.replace(id.to_string()).is_some() {
                    return Err(unsupported());
                }
            }
            b'.' => {
                scanner.pos += 1;
                let class_name = scanner.ident().ok_or_else(unsupported)?;
                step.classes.push(class_name.to_string());
            }
            b'[' => {
                let condition = scanner
                    .delimited(b'[', b']')
                    .and_then(parse_attr_condition)
                    .ok_or_else(unsupported)?;
                step.attrs.push(condition);
            }
            b':' => {
                scanner.pos += 1;
                let pseudo = parse_pseudo_class(&mut scanner).ok_or_else(unsupported)?;
                step.pseudo_classes.push(pseudo);
            }
            // A type selector can only open the compound.
            _ if scanner.pos == 0 => {
                let tag = scanner.ident().ok_or_else(unsupported)?;
                step.tag = Some(tag.to_ascii_lowercase());
            }
            _ => return Err(unsupported()),
        }
    }
    Ok(step)
}

fn parse_pseudo_class(scanner: &mut StepScanner<'_>) -> Option<SelectorPseudoClass> {
    match scanner.ident()? {
        "disabled" => Some(SelectorPseudoClass::Disabled),
        "enabled" => Some(SelectorPseudoClass::Enabled),
        "not" => {
            let inner = scanner.delimited(b'(', b')')?.trim();
            if inner.is_empty() {
                return None;
            }
            parse_selector_groups(inner)
                .ok()
                .map(SelectorPseudoClass::Not)
        }
        _ => None,
    }
}

/// `key` or `key=value`, where the value may be single or double quoted.
fn parse_attr_condition(body: &str) -> Option<SelectorAttrCondition> {
    let body = body.trim();
    let (key, value) = match body.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.trim())),
        None => (body, None),
    };
    if key.is_empty() || !key.bytes().all(is_ident_byte) {
        return None;
    }
    let key = key.to_ascii_lowercase();
    Some(match value {
        None => SelectorAttrCondition::Exists { key },
        Some(raw) => SelectorAttrCondition::Eq {
            key,
            value: unquote(raw).to_string(),
        },
    })
}

fn unquote(raw: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|q| raw.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(raw)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}
