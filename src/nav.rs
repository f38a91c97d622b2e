// src/nav.rs
//! Mobile menu state and in-page scrolling.
use crate::dom::{Document, NodeId, ScrollBehavior};
use crate::events::{BindingTable, EventKind, EventTarget, Handler};
use crate::page::PageContract;
use scraper::Selector;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NavState {
    Open,
    Closed,
}

/// Icon shown on the mobile menu button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MenuGlyph {
    #[strum(serialize = "bars")]
    Bars,
    #[strum(serialize = "close")]
    Close,
}

impl MenuGlyph {
    pub const fn for_state(state: NavState) -> Self {
        match state {
            NavState::Open => Self::Close,
            NavState::Closed => Self::Bars,
        }
    }

    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Bars => "fas fa-bars",
            Self::Close => "fas fa-times",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavController {
    nav: Option<NodeId>,
    button: Option<NodeId>,
    icon: Option<NodeId>,
    services_section_id: String,
    open_class: String,
    nav_selector: Selector,
    button_selector: Selector,
}

impl NavController {
    pub fn attach(doc: &Document, contract: &PageContract, table: &mut BindingTable) -> Self {
        let nav = doc.get_element_by_id(&contract.mobile_nav_id);
        let button = doc.get_element_by_id(&contract.mobile_menu_button_id);
        let icon = button.and_then(|b| doc.query_selector_within(b, &contract.menu_icon));

        match (nav, button) {
            (Some(_), Some(button)) => {
                table.bind(button, EventKind::Click, Handler::ToggleNav);
            }
            _ => tracing::warn!("mobile menu incomplete; toggle and outside-click close skipped"),
        }
        if nav.is_some() {
            for link in doc.query_selector_all(&contract.mobile_nav_links) {
                table.bind(link, EventKind::Click, Handler::CloseNavFromLink);
            }
        }
        if let Some(services) = doc.get_element_by_id(&contract.services_button_id) {
            table.bind(services, EventKind::Click, Handler::ScrollToServices);
        }
        if nav.is_some() && button.is_some() {
            table.bind(EventTarget::Window, EventKind::Click, Handler::CloseNavOnOutsideClick);
        }
        for link in doc.query_selector_all(&contract.nav_links) {
            table.bind(link, EventKind::Click, Handler::SmoothScrollToFragment);
        }

        Self {
            nav,
            button,
            icon,
            services_section_id: contract.services_section_id.clone(),
            open_class: contract.open_class.clone(),
            nav_selector: contract.mobile_nav.clone(),
            button_selector: contract.mobile_menu_button.clone(),
        }
    }

    /// `None` when the page has no mobile nav.
    pub fn state(&self, doc: &Document) -> Option<NavState> {
        self.nav.map(|nav| {
            if doc.has_class(nav, &self.open_class) {
                NavState::Open
            } else {
                NavState::Closed
            }
        })
    }

    pub fn glyph(&self, doc: &Document) -> Option<MenuGlyph> {
        let icon = self.icon?;
        let class_name = doc.class_name(icon);
        [MenuGlyph::Bars, MenuGlyph::Close]
            .into_iter()
            .find(|g| g.class_name() == class_name)
    }

    fn show_glyph(&self, doc: &mut Document, state: NavState) {
        if let Some(icon) = self.icon {
            doc.set_class_name(icon, MenuGlyph::for_state(state).class_name());
        }
    }

    pub fn toggle(&mut self, doc: &mut Document) {
        let Some(nav) = self.nav else {
            return;
        };
        let state = if doc.toggle_class(nav, &self.open_class) {
            NavState::Open
        } else {
            NavState::Closed
        };
        tracing::debug!(%state, "mobile nav toggled");
        self.show_glyph(doc, state);
    }

    pub fn close(&mut self, doc: &mut Document) {
        let Some(nav) = self.nav else {
            return;
        };
        doc.remove_class(nav, &self.open_class);
        self.show_glyph(doc, NavState::Closed);
    }

    /// Window click: closes an open menu unless the click was inside the
    /// menu or on its button.
    pub fn on_outside_click(&mut self, doc: &mut Document, target: EventTarget) {
        if self.state(doc) != Some(NavState::Open) || self.button.is_none() {
            return;
        }
        let inside = target.node().is_some_and(|node| {
            doc.closest(node, &self.nav_selector).is_some()
                || doc.closest(node, &self.button_selector).is_some()
        });
        if !inside {
            tracing::debug!("click outside mobile nav");
            self.close(doc);
        }
    }

    pub fn scroll_to_services(&self, doc: &mut Document) {
        scroll_to_section(doc, &self.services_section_id);
    }
}

/// Smoothly brings the section with `id` to the top of the viewport.
/// Returns `false` when no such section exists.
pub fn scroll_to_section(doc: &mut Document, id: &str) -> bool {
    match doc.get_element_by_id(id) {
        Some(section) => {
            doc.scroll_into_view(section, ScrollBehavior::Smooth);
            true
        }
        None => {
            tracing::debug!(%id, "scroll target not found");
            false
        }
    }
}

/// Fragment part of an in-page link (`#about` gives `about`).
pub fn fragment_of(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Handles a nav link click whose default navigation was already
/// suppressed.
pub fn smooth_scroll_from_link(doc: &mut Document, link: NodeId) -> bool {
    let target = doc.attribute(link, "href").and_then(fragment_of).map(str::to_string);
    match target {
        Some(id) => scroll_to_section(doc, &id),
        None => false,
    }
}
