// src/sanitize.rs
//! Character-set filtering for the name and phone fields.
//!
//! Typing is only ever filtered; pasted text is checked as a whole and
//! refused when any character falls outside the field's set.
use crate::config::Messages;
use crate::dom::{Document, NodeId};
use crate::events::{BindingTable, EventKind, Handler};
use crate::page::PageContract;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Name,
    Phone,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("pasted text contains characters not allowed in a {kind} field")]
pub struct PasteRejected {
    pub kind: FieldKind,
}

/// The whitespace class of browser regular expressions: Unicode
/// `White_Space` without NEL (U+0085), plus the BOM (U+FEFF).
pub fn is_form_whitespace(c: char) -> bool {
    match c {
        '\u{85}' => false,
        '\u{FEFF}' => true,
        _ => c.is_whitespace(),
    }
}

impl FieldKind {
    pub fn allows(self, c: char) -> bool {
        match self {
            Self::Name => c.is_ascii_alphabetic() || is_form_whitespace(c),
            Self::Phone => {
                c.is_ascii_digit() || is_form_whitespace(c) || matches!(c, '+' | '-' | '(' | ')')
            }
        }
    }

    /// Drops disallowed characters, keeping the rest in order.
    pub fn sanitize(self, text: &str) -> String {
        text.chars().filter(|&c| self.allows(c)).collect()
    }

    /// Pasted text must be non-empty and made only of allowed characters.
    pub fn validate_paste(self, text: &str) -> Result<(), PasteRejected> {
        if !text.is_empty() && text.chars().all(|c| self.allows(c)) {
            Ok(())
        } else {
            Err(PasteRejected { kind: self })
        }
    }

    /// `inputmode` hint for on-screen keyboards.
    pub const fn input_mode(self) -> Option<&'static str> {
        match self {
            Self::Name => None,
            Self::Phone => Some("tel"),
        }
    }

    pub fn rejection_notice(self, messages: &Messages) -> &str {
        match self {
            Self::Name => &messages.name_paste_rejected,
            Self::Phone => &messages.phone_paste_rejected,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputSanitizer {
    fields: Vec<(NodeId, FieldKind)>,
    messages: Messages,
}

impl InputSanitizer {
    pub fn attach(
        doc: &mut Document,
        contract: &PageContract,
        messages: &Messages,
        table: &mut BindingTable,
    ) -> Self {
        let mut fields = Vec::new();
        for (selector, kind) in [
            (&contract.name_fields, FieldKind::Name),
            (&contract.phone_fields, FieldKind::Phone),
        ] {
            for node in doc.query_selector_all(selector) {
                table.bind(node, EventKind::Input, Handler::SanitizeInput(kind));
                table.bind(node, EventKind::Paste, Handler::GuardPaste(kind));
                if let Some(mode) = kind.input_mode() {
                    doc.set_attribute(node, "inputmode", mode);
                }
                fields.push((node, kind));
            }
        }
        tracing::debug!(fields = fields.len(), "input sanitizer attached");
        Self {
            fields,
            messages: messages.clone(),
        }
    }

    pub fn fields(&self) -> &[(NodeId, FieldKind)] {
        &self.fields
    }

    pub fn on_input(&self, doc: &mut Document, field: NodeId, kind: FieldKind) {
        let current = doc.value(field);
        let cleaned = kind.sanitize(current);
        if cleaned != current {
            tracing::debug!(%kind, dropped = current.chars().count() - cleaned.chars().count(), "filtered input");
            doc.set_value(field, &cleaned);
        }
    }

    /// Returns `false` when the paste must be cancelled.
    pub fn on_paste(&self, doc: &mut Document, kind: FieldKind, clipboard: &str) -> bool {
        match kind.validate_paste(clipboard) {
            Ok(()) => true,
            Err(rejected) => {
                tracing::debug!(%rejected, "paste refused");
                doc.alert(kind.rejection_notice(&self.messages));
                false
            }
        }
    }
}
