// src/events.rs
//! Event vocabulary and the binding table every controller registers into.
use crate::dom::NodeId;
use crate::sanitize::FieldKind;
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Click,
    Input,
    Paste,
    Change,
    Focus,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Node(NodeId),
}

impl EventTarget {
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Window => None,
            Self::Node(id) => Some(id),
        }
    }
}

impl From<NodeId> for EventTarget {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub target: EventTarget,
    /// Clipboard text for `paste`.
    pub data: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, target: impl Into<EventTarget>) -> Self {
        Self {
            kind,
            target: target.into(),
            data: None,
        }
    }

    pub fn click(target: impl Into<EventTarget>) -> Self {
        Self::new(EventKind::Click, target)
    }

    pub fn paste(target: NodeId, text: &str) -> Self {
        Self {
            data: Some(text.to_string()),
            ..Self::new(EventKind::Paste, target)
        }
    }

    pub fn scroll() -> Self {
        Self::new(EventKind::Scroll, EventTarget::Window)
    }
}

/// The behaviour unit a handler belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Unit {
    #[strum(serialize = "modal")]
    Modal,
    #[strum(serialize = "navigation")]
    Navigation,
    #[strum(serialize = "date-range")]
    DateRange,
    #[strum(serialize = "sanitizer")]
    Sanitizer,
    #[strum(serialize = "header-shadow")]
    HeaderShadow,
}

/// Every callback the page wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    OpenModal,
    OpenModalFromMobileMenu,
    CloseModal,
    CloseModalOnBackdrop,
    ToggleNav,
    CloseNavFromLink,
    CloseNavOnOutsideClick,
    SmoothScrollToFragment,
    ScrollToServices,
    ShowSelectedDate,
    PromptForDate,
    ResetDateField,
    ResetDateFieldOnBackdrop,
    SanitizeInput(FieldKind),
    GuardPaste(FieldKind),
    UpdateHeaderShadow,
}

impl Handler {
    pub const fn unit(self) -> Unit {
        match self {
            Self::OpenModal
            | Self::OpenModalFromMobileMenu
            | Self::CloseModal
            | Self::CloseModalOnBackdrop => Unit::Modal,
            Self::ToggleNav
            | Self::CloseNavFromLink
            | Self::CloseNavOnOutsideClick
            | Self::SmoothScrollToFragment
            | Self::ScrollToServices => Unit::Navigation,
            Self::ShowSelectedDate
            | Self::PromptForDate
            | Self::ResetDateField
            | Self::ResetDateFieldOnBackdrop => Unit::DateRange,
            Self::SanitizeInput(_) | Self::GuardPaste(_) => Unit::Sanitizer,
            Self::UpdateHeaderShadow => Unit::HeaderShadow,
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenModal => f.write_str("open-modal"),
            Self::OpenModalFromMobileMenu => f.write_str("open-modal-from-mobile-menu"),
            Self::CloseModal => f.write_str("close-modal"),
            Self::CloseModalOnBackdrop => f.write_str("close-modal-on-backdrop"),
            Self::ToggleNav => f.write_str("toggle-nav"),
            Self::CloseNavFromLink => f.write_str("close-nav-from-link"),
            Self::CloseNavOnOutsideClick => f.write_str("close-nav-on-outside-click"),
            Self::SmoothScrollToFragment => f.write_str("smooth-scroll-to-fragment"),
            Self::ScrollToServices => f.write_str("scroll-to-services"),
            Self::ShowSelectedDate => f.write_str("show-selected-date"),
            Self::PromptForDate => f.write_str("prompt-for-date"),
            Self::ResetDateField => f.write_str("reset-date-field"),
            Self::ResetDateFieldOnBackdrop => f.write_str("reset-date-field-on-backdrop"),
            Self::SanitizeInput(kind) => write!(f, "sanitize-input({kind})"),
            Self::GuardPaste(kind) => write!(f, "guard-paste({kind})"),
            Self::UpdateHeaderShadow => f.write_str("update-header-shadow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub target: EventTarget,
    pub kind: EventKind,
    pub handler: Handler,
}

/// Ordered `(target, event) -> handler` rows, filled once at start-up.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    rows: Vec<Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, target: impl Into<EventTarget>, kind: EventKind, handler: Handler) {
        let target = target.into();
        tracing::trace!(?target, %kind, %handler, "binding registered");
        self.rows.push(Binding {
            target,
            kind,
            handler,
        });
    }

    /// Listeners on `target` for `kind`, in registration order.
    pub fn for_event(
        &self,
        target: EventTarget,
        kind: EventKind,
    ) -> impl Iterator<Item = &Binding> + '_ {
        self.rows
            .iter()
            .filter(move |b| b.target == target && b.kind == kind)
    }

    pub fn handlers(&self) -> impl Iterator<Item = Handler> + '_ {
        self.rows.iter().map(|b| b.handler)
    }

    pub fn contains(&self, handler: Handler) -> bool {
        self.rows.iter().any(|b| b.handler == handler)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a BindingTable {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
