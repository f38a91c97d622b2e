// src/header.rs
use crate::config::HeaderSettings;
use crate::dom::{Document, NodeId};
use crate::events::{BindingTable, EventKind, EventTarget, Handler};
use crate::page::PageContract;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ShadowLevel {
    Resting,
    Raised,
}

impl ShadowLevel {
    /// No hysteresis: strictly past the threshold raises the shadow.
    pub fn for_offset(scroll_y: f64, threshold: f64) -> Self {
        if scroll_y > threshold {
            Self::Raised
        } else {
            Self::Resting
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeaderShadow {
    header: Option<NodeId>,
    settings: HeaderSettings,
}

impl HeaderShadow {
    pub fn attach(
        doc: &Document,
        contract: &PageContract,
        settings: &HeaderSettings,
        table: &mut BindingTable,
    ) -> Self {
        let header = doc.query_selector(&contract.header);
        if header.is_some() {
            table.bind(EventTarget::Window, EventKind::Scroll, Handler::UpdateHeaderShadow);
        } else {
            tracing::warn!("no page header; shadow effect skipped");
        }
        Self {
            header,
            settings: settings.clone(),
        }
    }

    pub fn on_scroll(&self, doc: &mut Document) {
        let Some(header) = self.header else {
            return;
        };
        let level = ShadowLevel::for_offset(doc.scroll_y(), self.settings.shadow_threshold);
        let shadow = match level {
            ShadowLevel::Resting => &self.settings.resting_shadow,
            ShadowLevel::Raised => &self.settings.raised_shadow,
        };
        doc.set_style(header, "box-shadow", shadow);
    }

    /// Level currently painted on the header, if the effect has run.
    pub fn level(&self, doc: &Document) -> Option<ShadowLevel> {
        let shadow = doc.style(self.header?, "box-shadow")?;
        if shadow == self.settings.raised_shadow {
            Some(ShadowLevel::Raised)
        } else if shadow == self.settings.resting_shadow {
            Some(ShadowLevel::Resting)
        } else {
            None
        }
    }
}
