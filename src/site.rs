// src/site.rs
//! The page runtime: initializes every behaviour and routes events through
//! the binding table the way the browser's event loop would.
use crate::config::Config;
use crate::date_range::{DateRangeEnforcer, HelpText};
use crate::dom::{parse_selector, Document, NodeId, ScrollBehavior, SelectorError};
use crate::events::{BindingTable, Event, EventKind, EventTarget, Handler};
use crate::header::{HeaderShadow, ShadowLevel};
use crate::modal::{ModalController, ModalVisibility};
use crate::nav::{self, MenuGlyph, NavController, NavState};
use crate::page::PageContract;
use crate::sanitize::InputSanitizer;
use chrono::NaiveDate;
use scraper::Selector;
use std::collections::VecDeque;

/// What happened while one event was dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    pub event: Event,
    pub handlers: Vec<Handler>,
    pub default_prevented: bool,
}

/// Observable page state after some interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub modal: ModalVisibility,
    pub nav: Option<NavState>,
    pub glyph: Option<MenuGlyph>,
    pub date_value: Option<String>,
    pub help: HelpText,
    pub help_text: Option<String>,
    pub header_shadow: Option<ShadowLevel>,
    pub scroll_y: f64,
    pub alerts: Vec<String>,
}

pub struct Site {
    document: Document,
    bindings: BindingTable,
    contract: PageContract,
    fragment_links: Selector,
    modal: ModalController,
    nav: NavController,
    dates: DateRangeEnforcer,
    sanitizer: InputSanitizer,
    header: HeaderShadow,
}

impl Site {
    /// Runs the page's load-time setup against `document`.
    ///
    /// # Errors
    /// Returns `SelectorError` if a selector in `config.elements` is malformed.
    pub fn initialize(
        mut document: Document,
        config: &Config,
        today: NaiveDate,
    ) -> Result<Self, SelectorError> {
        let contract = PageContract::from_elements(&config.elements)?;
        let mut bindings = BindingTable::new();

        let modal = ModalController::attach(&document, &contract, &mut bindings);
        let nav = NavController::attach(&document, &contract, &mut bindings);
        let dates = DateRangeEnforcer::attach(
            &mut document,
            &contract,
            &config.date,
            &config.messages,
            today,
            &mut bindings,
        );
        let sanitizer =
            InputSanitizer::attach(&mut document, &contract, &config.messages, &mut bindings);
        let header = HeaderShadow::attach(&document, &contract, &config.header, &mut bindings);

        tracing::info!(
            bindings = bindings.len(),
            nodes = document.len(),
            %today,
            "page initialized"
        );

        Ok(Self {
            document,
            bindings,
            contract,
            fragment_links: parse_selector(r##"a[href^="#"]"##)?,
            modal,
            nav,
            dates,
            sanitizer,
            header,
        })
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub const fn contract(&self) -> &PageContract {
        &self.contract
    }

    pub const fn modal(&self) -> &ModalController {
        &self.modal
    }

    pub const fn nav(&self) -> &NavController {
        &self.nav
    }

    pub const fn dates(&self) -> &DateRangeEnforcer {
        &self.dates
    }

    pub const fn sanitizer(&self) -> &InputSanitizer {
        &self.sanitizer
    }

    pub fn element(&self, id: &str) -> Option<NodeId> {
        self.document.get_element_by_id(id)
    }

    /// Dispatches `event` and everything it causes, each to completion
    /// before the next.
    pub fn dispatch(&mut self, event: Event) -> Vec<DispatchRecord> {
        let mut queue = VecDeque::from([event]);
        let mut records = Vec::new();
        while let Some(next) = queue.pop_front() {
            records.push(self.dispatch_one(next, &mut queue));
        }
        records
    }

    fn propagation_path(&self, event: &Event) -> Vec<EventTarget> {
        let bubbles = matches!(
            event.kind,
            EventKind::Click | EventKind::Input | EventKind::Paste | EventKind::Change
        );
        match event.target {
            EventTarget::Window => vec![EventTarget::Window],
            EventTarget::Node(node) if bubbles => std::iter::once(node)
                .chain(self.document.ancestors(node))
                .map(EventTarget::Node)
                .chain(std::iter::once(EventTarget::Window))
                .collect(),
            EventTarget::Node(node) => vec![EventTarget::Node(node)],
        }
    }

    fn dispatch_one(&mut self, event: Event, queue: &mut VecDeque<Event>) -> DispatchRecord {
        let scroll_before = self.document.scroll_y();
        let mut handlers = Vec::new();
        let mut prevented = false;

        for current in self.propagation_path(&event) {
            let listeners: Vec<Handler> = self
                .bindings
                .for_event(current, event.kind)
                .map(|b| b.handler)
                .collect();
            for handler in listeners {
                tracing::debug!(%handler, kind = %event.kind, "running handler");
                self.run(handler, &event, current, &mut prevented);
                handlers.push(handler);
            }
        }

        if !prevented {
            self.default_action(&event, queue);
        }
        if event.kind != EventKind::Scroll && self.document.scroll_y() != scroll_before {
            queue.push_back(Event::scroll());
        }

        DispatchRecord {
            event,
            handlers,
            default_prevented: prevented,
        }
    }

    fn run(&mut self, handler: Handler, event: &Event, current: EventTarget, prevented: &mut bool) {
        let doc = &mut self.document;
        match handler {
            Handler::OpenModal => self.modal.open(doc),
            Handler::OpenModalFromMobileMenu => {
                self.modal.open(doc);
                self.nav.close(doc);
            }
            Handler::CloseModal => self.modal.close(doc),
            Handler::CloseModalOnBackdrop => {
                if self.modal.is_backdrop(event.target) {
                    self.modal.close(doc);
                }
            }
            Handler::ToggleNav => self.nav.toggle(doc),
            Handler::CloseNavFromLink => self.nav.close(doc),
            Handler::CloseNavOnOutsideClick => self.nav.on_outside_click(doc, event.target),
            Handler::SmoothScrollToFragment => {
                *prevented = true;
                if let Some(link) = current.node() {
                    nav::smooth_scroll_from_link(doc, link);
                }
            }
            Handler::ScrollToServices => self.nav.scroll_to_services(doc),
            Handler::ShowSelectedDate => self.dates.on_change(doc),
            Handler::PromptForDate => self.dates.on_focus(doc),
            Handler::ResetDateField => self.dates.reset(doc),
            Handler::ResetDateFieldOnBackdrop => {
                if self.modal.is_backdrop(event.target) {
                    self.dates.reset(doc);
                }
            }
            Handler::SanitizeInput(kind) => {
                if let Some(field) = current.node() {
                    self.sanitizer.on_input(doc, field, kind);
                }
            }
            Handler::GuardPaste(kind) => {
                let clipboard = event.data.as_deref().unwrap_or_default();
                if !self.sanitizer.on_paste(doc, kind, clipboard) {
                    *prevented = true;
                }
            }
            Handler::UpdateHeaderShadow => self.header.on_scroll(doc),
        }
    }

    fn default_action(&mut self, event: &Event, queue: &mut VecDeque<Event>) {
        let Some(target) = event.target.node() else {
            return;
        };
        match event.kind {
            EventKind::Paste => {
                let Some(text) = event.data.as_deref() else {
                    return;
                };
                let mut value = self.document.value(target).to_string();
                value.push_str(text);
                self.document.set_value(target, &value);
                queue.push_back(Event::new(EventKind::Input, target));
            }
            EventKind::Click => {
                // Unhandled in-page links jump without animation.
                let Some(link) = self.document.closest(target, &self.fragment_links) else {
                    return;
                };
                let section = self
                    .document
                    .attribute(link, "href")
                    .and_then(nav::fragment_of)
                    .and_then(|id| self.document.get_element_by_id(id));
                if let Some(section) = section {
                    self.document.scroll_into_view(section, ScrollBehavior::Instant);
                }
            }
            _ => {}
        }
    }

    // --- User gestures ---

    pub fn click(&mut self, target: impl Into<EventTarget>) -> Vec<DispatchRecord> {
        self.dispatch(Event::click(target))
    }

    pub fn focus(&mut self, field: NodeId) -> Vec<DispatchRecord> {
        self.document.set_focus(Some(field));
        self.dispatch(Event::new(EventKind::Focus, field))
    }

    /// Types `text` one keystroke at a time.
    pub fn type_text(&mut self, field: NodeId, text: &str) -> Vec<DispatchRecord> {
        let mut records = Vec::new();
        for c in text.chars() {
            let mut value = self.document.value(field).to_string();
            value.push(c);
            self.document.set_value(field, &value);
            records.extend(self.dispatch(Event::new(EventKind::Input, field)));
        }
        records
    }

    pub fn paste(&mut self, field: NodeId, clipboard: &str) -> Vec<DispatchRecord> {
        self.dispatch(Event::paste(field, clipboard))
    }

    /// Sets a field's value the way a picker would, then fires `change`.
    pub fn change_value(&mut self, field: NodeId, value: &str) -> Vec<DispatchRecord> {
        self.document.set_value(field, value);
        self.dispatch(Event::new(EventKind::Change, field))
    }

    pub fn scroll_to(&mut self, y: f64) -> Vec<DispatchRecord> {
        self.document.scroll_to(y, ScrollBehavior::Instant);
        self.dispatch(Event::scroll())
    }

    pub fn snapshot(&self) -> Snapshot {
        let doc = &self.document;
        let help_node = self
            .dates
            .input()
            .and_then(|input| doc.parent(input))
            .and_then(|parent| doc.query_selector_within(parent, &self.contract.date_help));
        Snapshot {
            modal: self.modal.visibility(),
            nav: self.nav.state(doc),
            glyph: self.nav.glyph(doc),
            date_value: self.dates.value(doc).map(str::to_string),
            help: self.dates.help_state(),
            help_text: help_node.map(|node| doc.text(node).to_string()),
            header_shadow: self.header.level(doc),
            scroll_y: doc.scroll_y(),
            alerts: doc.alerts().to_vec(),
        }
    }
}
