// src/modal.rs
use crate::dom::{Document, NodeId};
use crate::events::{BindingTable, EventKind, EventTarget, Handler};
use crate::page::PageContract;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ModalVisibility {
    Shown,
    Hidden,
}

impl ModalVisibility {
    const fn display_value(self) -> &'static str {
        match self {
            Self::Shown => "block",
            Self::Hidden => "none",
        }
    }
}

/// Owns the booking dialog's visibility.
#[derive(Debug, Clone)]
pub struct ModalController {
    modal: Option<NodeId>,
    visibility: ModalVisibility,
}

impl ModalController {
    pub fn attach(doc: &Document, contract: &PageContract, table: &mut BindingTable) -> Self {
        let modal = doc.get_element_by_id(&contract.modal_id);
        let Some(modal_node) = modal else {
            tracing::warn!(id = %contract.modal_id, "no booking modal on page; modal triggers skipped");
            return Self {
                modal: None,
                visibility: ModalVisibility::Hidden,
            };
        };

        let openers = [
            (&contract.book_button_id, Handler::OpenModal),
            (&contract.hero_book_button_id, Handler::OpenModal),
            (&contract.mobile_book_button_id, Handler::OpenModalFromMobileMenu),
        ];
        for (id, handler) in openers {
            match doc.get_element_by_id(id) {
                Some(button) => table.bind(button, EventKind::Click, handler),
                None => tracing::debug!(%id, "booking button absent"),
            }
        }
        if let Some(close) = doc.query_selector(&contract.close) {
            table.bind(close, EventKind::Click, Handler::CloseModal);
        }
        table.bind(EventTarget::Window, EventKind::Click, Handler::CloseModalOnBackdrop);

        let visibility = if doc.style(modal_node, "display") == Some("block") {
            ModalVisibility::Shown
        } else {
            ModalVisibility::Hidden
        };
        Self { modal, visibility }
    }

    pub const fn visibility(&self) -> ModalVisibility {
        self.visibility
    }

    pub fn is_open(&self) -> bool {
        self.visibility == ModalVisibility::Shown
    }

    /// True when the click landed on the dimmed backdrop itself.
    pub fn is_backdrop(&self, target: EventTarget) -> bool {
        self.modal.is_some() && target.node() == self.modal
    }

    pub fn open(&mut self, doc: &mut Document) {
        self.set(doc, ModalVisibility::Shown);
    }

    pub fn close(&mut self, doc: &mut Document) {
        self.set(doc, ModalVisibility::Hidden);
    }

    fn set(&mut self, doc: &mut Document, visibility: ModalVisibility) {
        let Some(modal) = self.modal else {
            return;
        };
        if self.visibility != visibility {
            tracing::debug!(%visibility, "booking modal");
        }
        self.visibility = visibility;
        doc.set_style(modal, "display", visibility.display_value());
    }
}
