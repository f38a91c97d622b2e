// src/dom.rs
//! Headless stand-in for the browser document and window.
//!
//! Markup is parsed once with `scraper` and the element tree keeps its shape
//! from then on. What a page script can change (classes, attributes, form
//! values, text, inline style) lives in per-element state keyed by the
//! tree's node ids. Selectors match against the markup as loaded.
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Vertical layout position of an element, since there is no layout engine.
pub const OFFSET_TOP_ATTR: &str = "data-offset-top";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid selector '{selector}': {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

/// Parses a CSS selector, keeping the offending text in the error.
pub fn parse_selector(source: &str) -> Result<Selector, SelectorError> {
    Selector::parse(source).map_err(|e| SelectorError {
        selector: source.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(ego_tree::NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

#[derive(Debug, Clone, Default)]
struct ElementState {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    value: String,
    text: String,
    emphasis: Option<String>,
    style: BTreeMap<String, String>,
}

impl ElementState {
    fn from_markup(node: NodeRef<'_, Node>, element: ElementRef<'_>) -> Self {
        let markup = element.value();
        let attributes: BTreeMap<String, String> = markup
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let classes = attributes
            .get("class")
            .map(|list| list.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        // Form controls start out holding their `value` attribute.
        let value = attributes.get("value").cloned().unwrap_or_default();
        let text: String = node
            .children()
            .filter_map(|child| child.value().as_text().map(|t| &**t))
            .collect();
        Self {
            tag: markup.name().to_string(),
            classes,
            attributes,
            value,
            text: text.trim().to_string(),
            emphasis: None,
            style: BTreeMap::new(),
        }
    }

    fn sync_class_attribute(&mut self) {
        self.attributes
            .insert("class".to_string(), self.classes.join(" "));
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
    body: NodeId,
    elements: HashMap<NodeId, ElementState>,
    scroll_y: f64,
    last_scroll: Option<ScrollBehavior>,
    focused: Option<NodeId>,
    alerts: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::parse("")
    }
}

impl Document {
    /// Parses a full page (or a body fragment; the parser adds the rest).
    pub fn parse(markup: &str) -> Self {
        Self::from_html(Html::parse_document(markup))
    }

    pub fn from_html(html: Html) -> Self {
        let mut elements = HashMap::new();
        let mut body = None;
        for node in html.tree.root().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let id = NodeId(node.id());
            if body.is_none() && element.value().name() == "body" {
                body = Some(id);
            }
            elements.insert(id, ElementState::from_markup(node, element));
        }
        let body = body.unwrap_or_else(|| NodeId(html.root_element().id()));
        Self {
            html,
            body,
            elements,
            scroll_y: 0.0,
            last_scroll: None,
            focused: None,
            alerts: Vec::new(),
        }
    }

    /// The `body` element.
    pub const fn root(&self) -> NodeId {
        self.body
    }

    /// Number of elements, including `html`, `head` and `body`.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn tree_node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id.0)
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.tree_node(id).and_then(ElementRef::wrap)
    }

    fn state(&self, id: NodeId) -> Option<&ElementState> {
        self.elements.get(&id)
    }

    fn state_mut(&mut self, id: NodeId) -> Option<&mut ElementState> {
        self.elements.get_mut(&id)
    }

    // --- Tree navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree_node(id)?
            .parent()
            .filter(|parent| parent.value().is_element())
            .map(|parent| NodeId(parent.id()))
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree_node(id)
            .into_iter()
            .flat_map(|node| node.children())
            .filter(|child| child.value().is_element())
            .map(|child| NodeId(child.id()))
            .collect()
    }

    /// Elements under `scope` (excluding it) in document order.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        self.tree_node(scope)
            .into_iter()
            .flat_map(|node| node.descendants().skip(1))
            .filter(|node| node.value().is_element())
            .map(|node| NodeId(node.id()))
            .collect()
    }

    /// True if `other` is `id` itself or one of its descendants.
    pub fn contains(&self, id: NodeId, other: NodeId) -> bool {
        other == id || self.ancestors(other).any(|ancestor| ancestor == id)
    }

    /// Ancestor elements from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.tree_node(id)
            .into_iter()
            .flat_map(|node| node.ancestors())
            .filter(|node| node.value().is_element())
            .map(|node| NodeId(node.id()))
    }

    // --- Queries ---

    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.element(id)
            .is_some_and(|element| selector.matches(&element))
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().id() == Some(element_id))
            .map(|element| NodeId(element.id()))
    }

    pub fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        self.html
            .select(selector)
            .next()
            .map(|element| NodeId(element.id()))
    }

    pub fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .select(selector)
            .map(|element| NodeId(element.id()))
            .collect()
    }

    pub fn query_selector_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.element(scope)?
            .select(selector)
            .next()
            .map(|element| NodeId(element.id()))
    }

    /// The node itself or its nearest ancestor matching `selector`.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.matches(n, selector))
    }

    // --- Element state ---

    pub fn tag(&self, id: NodeId) -> &str {
        self.state(id).map_or("", |state| state.tag.as_str())
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "id")
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.state(id)
            .is_some_and(|state| state.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(state) = self.state_mut(id) {
            if !state.classes.iter().any(|c| c == class) {
                state.classes.push(class.to_string());
                state.sync_class_attribute();
            }
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(state) = self.state_mut(id) {
            state.classes.retain(|c| c != class);
            state.sync_class_attribute();
        }
    }

    /// Flips `class` and reports whether it is now present.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            self.has_class(id, class)
        }
    }

    pub fn class_name(&self, id: NodeId) -> String {
        self.state(id)
            .map(|state| state.classes.join(" "))
            .unwrap_or_default()
    }

    pub fn set_class_name(&mut self, id: NodeId, class_list: &str) {
        if let Some(state) = self.state_mut(id) {
            state.classes = class_list.split_whitespace().map(str::to_string).collect();
            state.sync_class_attribute();
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.state(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if name == "class" {
            self.set_class_name(id, value);
        } else if let Some(state) = self.state_mut(id) {
            state.attributes.insert(name, value.to_string());
        }
    }

    pub fn value(&self, id: NodeId) -> &str {
        self.state(id).map_or("", |state| state.value.as_str())
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(state) = self.state_mut(id) {
            state.value = value.to_string();
        }
    }

    pub fn text(&self, id: NodeId) -> &str {
        self.state(id).map_or("", |state| state.text.as_str())
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(state) = self.state_mut(id) {
            state.text = text.to_string();
            state.emphasis = None;
        }
    }

    /// Sets `lead` followed by an emphasized `strong` run.
    pub fn set_rich_text(&mut self, id: NodeId, lead: &str, strong: &str) {
        if let Some(state) = self.state_mut(id) {
            state.text = format!("{lead}{strong}");
            state.emphasis = Some(strong.to_string());
        }
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let Some(state) = self.state(id) else {
            return String::new();
        };
        match &state.emphasis {
            Some(strong) => {
                let lead = state.text.strip_suffix(strong.as_str()).unwrap_or(&state.text);
                format!("{lead}<strong>{strong}</strong>")
            }
            None => state.text.clone(),
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.state(id)?.style.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(state) = self.state_mut(id) {
            state.style.insert(property.to_string(), value.to_string());
        }
    }

    /// Distance from the page top, read from `data-offset-top`.
    pub fn offset_top(&self, id: NodeId) -> f64 {
        self.attribute(id, OFFSET_TOP_ATTR)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|offset| offset.is_finite())
            .unwrap_or(0.0)
    }

    // --- Window state ---

    pub const fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub const fn last_scroll(&self) -> Option<ScrollBehavior> {
        self.last_scroll
    }

    pub fn scroll_to(&mut self, y: f64, behavior: ScrollBehavior) {
        self.scroll_y = y.max(0.0);
        self.last_scroll = Some(behavior);
    }

    /// Aligns the top edge of `id` with the top of the viewport.
    pub fn scroll_into_view(&mut self, id: NodeId, behavior: ScrollBehavior) {
        let top = self.offset_top(id);
        self.scroll_to(top, behavior);
    }

    pub const fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn set_focus(&mut self, id: Option<NodeId>) {
        self.focused = id;
    }

    /// Records a blocking user notice.
    pub fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Short human label such as `button#heroBookBtn.btn`.
    pub fn describe(&self, id: NodeId) -> String {
        let mut label = self.tag(id).to_string();
        if let Some(element_id) = self.element_id(id) {
            label.push('#');
            label.push_str(element_id);
        }
        if let Some(state) = self.state(id) {
            for class in &state.classes {
                label.push('.');
                label.push_str(class);
            }
        }
        label
    }
}
