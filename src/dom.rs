use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::iter;

use crate::selector::{
    SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorPseudoClass, SelectorStep,
    parse_selector_groups,
};
use crate::{Error, Result};

/// Handle to a node in a [`crate::Page`] document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// Element state. `value`, `disabled` and `required` mirror their attributes
/// and are kept in step by [`Dom::set_attr`] and [`Dom::remove_attr`].
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) disabled: bool,
    pub(crate) required: bool,
}

impl Element {
    fn new(tag_name: String, attrs: HashMap<String, String>) -> Self {
        Self {
            value: attrs.get("value").cloned().unwrap_or_default(),
            disabled: attrs.contains_key("disabled"),
            required: attrs.contains_key("required"),
            tag_name,
            attrs,
        }
    }

    fn reflect(&mut self, name: &str, value: Option<&str>) {
        match name {
            "value" => self.value = value.unwrap_or_default().to_string(),
            "disabled" => self.disabled = value.is_some(),
            "required" => self.required = value.is_some(),
            _ => {}
        }
    }

    fn has_class(&self, class_name: &str) -> bool {
        self.attrs
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn push_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let id_attr = attrs.get("id").filter(|id| !id.is_empty()).cloned();
        let node = self.push_node(parent, NodeType::Element(Element::new(tag_name, attrs)));
        if let Some(id_attr) = id_attr {
            // getElementById returns the first element in tree order.
            self.id_index.entry(id_attr).or_insert(node);
        }
        node
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(parent, NodeType::Text(text))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node_id: NodeId, op: &str) -> Result<&mut Element> {
        match self.nodes.get_mut(node_id.0).map(|node| &mut node.node_type) {
            Some(NodeType::Element(element)) => Ok(element),
            _ => Err(Error::Runtime(format!("{op} target is not an element"))),
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn has_tag(&self, node_id: NodeId, tag: &str) -> bool {
        self.tag_name(node_id)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0).and_then(|node| node.parent)
    }

    /// Proper ancestors, nearest first.
    pub(crate) fn ancestors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.parent(node_id), |node| self.parent(*node))
    }

    /// `node_id` and everything below it in tree order.
    fn subtree(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![node_id];
        iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(self.nodes[node.0].children.iter().rev().copied());
            Some(node)
        })
    }

    fn preceding_element_siblings(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let siblings = self
            .parent(node_id)
            .map(|parent| self.nodes[parent.0].children.as_slice())
            .unwrap_or_default();
        let pos = siblings
            .iter()
            .position(|id| *id == node_id)
            .unwrap_or_default();
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .filter(|sibling| self.element(*sibling).is_some())
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        self.subtree(node_id)
            .filter_map(|node| match &self.nodes[node.0].node_type {
                NodeType::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn value(&self, node_id: NodeId) -> Result<String> {
        self.element(node_id)
            .map(|element| element.value.clone())
            .ok_or_else(|| Error::Runtime("value target is not an element".into()))
    }

    pub(crate) fn set_value(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        self.element_mut(node_id, "value")?.value = value.to_string();
        Ok(())
    }

    /// A textarea's initial value is its text content.
    pub(crate) fn initialize_form_control_values(&mut self) {
        for node in self.all_element_nodes() {
            if self.has_tag(node, "textarea") {
                let text = self.text_content(node);
                if let Ok(element) = self.element_mut(node, "value") {
                    element.value = text;
                }
            }
        }
    }

    pub(crate) fn disabled(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|e| e.disabled)
    }

    pub(crate) fn set_disabled(&mut self, node_id: NodeId, disabled: bool) -> Result<()> {
        if disabled {
            self.set_attr(node_id, "disabled", "")
        } else {
            self.remove_attr(node_id, "disabled")
        }
    }

    pub(crate) fn required(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some_and(|e| e.required)
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(name).cloned())
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(node_id, "setAttribute")?;
        element.reflect(&name, Some(value));
        element.attrs.insert(name.clone(), value.to_string());
        if name == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn remove_attr(&mut self, node_id: NodeId, name: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(node_id, "removeAttribute")?;
        element.reflect(&name, None);
        element.attrs.remove(&name);
        if name == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Matches in document order; a node matching several groups appears once.
    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        if let [single] = groups.as_slice() {
            if let [part] = single.as_slice() {
                if let Some(id) = part.step.id_only() {
                    return Ok(self.by_id(id).into_iter().collect());
                }
            }
        }

        let mut seen = HashSet::new();
        Ok(self
            .all_element_nodes()
            .into_iter()
            .filter(|node| groups.iter().any(|parts| self.matches_parts(*node, parts)))
            .filter(|node| seen.insert(*node))
            .collect())
    }

    pub(crate) fn find_ancestor_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors(node_id).find(|node| self.has_tag(*node, tag))
    }

    pub(crate) fn is_form_associated(&self, node_id: NodeId) -> bool {
        const FORM_ASSOCIATED: [&str; 7] = [
            "input", "button", "select", "textarea", "fieldset", "output", "object",
        ];
        FORM_ASSOCIATED
            .iter()
            .any(|tag| self.has_tag(node_id, tag))
    }

    /// Form owner of a form-associated element: the `form` attribute when it
    /// names a form, otherwise the nearest ancestor form.
    pub(crate) fn form_owner(&self, node_id: NodeId) -> Option<NodeId> {
        if !self.is_form_associated(node_id) {
            return None;
        }
        match self.attr(node_id, "form") {
            Some(form_id) => self
                .by_id(&form_id)
                .filter(|candidate| self.has_tag(*candidate, "form")),
            None => self.find_ancestor_by_tag(node_id, "form"),
        }
    }

    pub(crate) fn form_controls(&self, form: NodeId) -> Vec<NodeId> {
        self.all_element_nodes()
            .into_iter()
            .filter(|node| self.form_owner(*node) == Some(form))
            .collect()
    }

    fn rebuild_id_index(&mut self) {
        let mut index = HashMap::new();
        for node in self.all_element_nodes() {
            if let Some(id) = self.attr(node, "id").filter(|id| !id.is_empty()) {
                index.entry(id).or_insert(node);
            }
        }
        self.id_index = index;
    }

    pub(crate) fn all_element_nodes(&self) -> Vec<NodeId> {
        self.subtree(self.root)
            .filter(|node| self.element(*node).is_some())
            .collect()
    }

    /// Right-to-left match of a compound selector chain against `node_id`.
    fn matches_parts(&self, node_id: NodeId, parts: &[SelectorPart]) -> bool {
        let Some((last, rest)) = parts.split_last() else {
            return false;
        };
        if !self.matches_step(node_id, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        let combinator = last.combinator.unwrap_or(SelectorCombinator::Descendant);
        match combinator {
            SelectorCombinator::Child => self
                .parent(node_id)
                .is_some_and(|parent| self.matches_parts(parent, rest)),
            SelectorCombinator::Descendant => self
                .ancestors(node_id)
                .any(|ancestor| self.matches_parts(ancestor, rest)),
            SelectorCombinator::AdjacentSibling => self
                .preceding_element_siblings(node_id)
                .next()
                .is_some_and(|sibling| self.matches_parts(sibling, rest)),
            SelectorCombinator::GeneralSibling => self
                .preceding_element_siblings(node_id)
                .any(|sibling| self.matches_parts(sibling, rest)),
        }
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };
        let tag_ok = step
            .tag
            .as_ref()
            .is_none_or(|tag| element.tag_name.eq_ignore_ascii_case(tag));
        let id_ok = step
            .id
            .as_ref()
            .is_none_or(|id| element.attrs.get("id") == Some(id));
        if !(tag_ok && id_ok) {
            return false;
        }
        if !step.classes.iter().all(|class_name| element.has_class(class_name)) {
            return false;
        }
        let attrs_ok = step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
            SelectorAttrCondition::Eq { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|actual| attr_value_matches(key, actual, value)),
        });
        attrs_ok
            && step.pseudo_classes.iter().all(|pseudo| match pseudo {
                SelectorPseudoClass::Disabled => element.disabled,
                SelectorPseudoClass::Enabled => !element.disabled,
                SelectorPseudoClass::Not(inner) => {
                    !inner.iter().any(|parts| self.matches_parts(node_id, parts))
                }
            })
    }

    /// Serializes `node_id` with attributes sorted, for assertion messages.
    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node_id, &mut out);
        out
    }

    fn write_node(&self, node_id: NodeId, out: &mut String) {
        let node = &self.nodes[node_id.0];
        let element = match &node.node_type {
            NodeType::Text(text) => {
                out.push_str(text);
                return;
            }
            NodeType::Document => None,
            NodeType::Element(element) => Some(element),
        };
        if let Some(element) = element {
            let mut attrs = element.attrs.iter().collect::<Vec<_>>();
            attrs.sort();
            let _ = write!(out, "<{}", element.tag_name);
            for (name, value) in attrs {
                let _ = write!(out, " {name}=\"{value}\"");
            }
            out.push('>');
        }
        for child in &node.children {
            self.write_node(*child, out);
        }
        if let Some(element) = element {
            let _ = write!(out, "</{}>", element.tag_name);
        }
    }
}

/// Enumerated attributes such as `type` compare ASCII case-insensitively.
fn attr_value_matches(key: &str, actual: &str, expected: &str) -> bool {
    const CASE_INSENSITIVE_ATTRS: [&str; 2] = ["type", "method"];
    if CASE_INSENSITIVE_ATTRS.contains(&key) {
        actual.eq_ignore_ascii_case(expected)
    } else {
        actual == expected
    }
}

/// First `max_chars` characters of `value`, with `...` when cut.
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
