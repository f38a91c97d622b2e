// src/date_range.rs
use crate::config::{DateSettings, Messages};
use crate::dom::{Document, NodeId};
use crate::events::{BindingTable, EventKind, EventTarget, Handler};
use crate::page::PageContract;
use chrono::{Months, NaiveDate};
use std::fmt::Write;
use thiserror::Error;

const ATTR_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateInputError {
    #[error("'{0}' is not a date in YYYY-MM-DD form")]
    Unparsable(String),
    #[error("{date} is outside the bookable range {min} to {max}")]
    OutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },
}

/// Inclusive range of bookable days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateRange {
    /// From `today` through the same day `months_ahead` calendar months later.
    ///
    /// Days that do not exist in the target month clamp to its last day,
    /// so January 31st plus three months is April 30th.
    pub fn starting(today: NaiveDate, months_ahead: u32) -> Self {
        let max = today
            .checked_add_months(Months::new(months_ahead))
            .unwrap_or(NaiveDate::MAX);
        Self { min: today, max }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.min..=self.max).contains(&date)
    }

    pub fn min_attr(&self) -> String {
        self.min.format(ATTR_DATE_FORMAT).to_string()
    }

    pub fn max_attr(&self) -> String {
        self.max.format(ATTR_DATE_FORMAT).to_string()
    }

    /// Parses a date-field value and checks it against the range.
    pub fn accept(&self, value: &str) -> Result<NaiveDate, DateInputError> {
        let date = parse_date_value(value)?;
        if self.contains(date) {
            Ok(date)
        } else {
            Err(DateInputError::OutOfRange {
                date,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub fn parse_date_value(value: &str) -> Result<NaiveDate, DateInputError> {
    NaiveDate::parse_from_str(value.trim(), ATTR_DATE_FORMAT)
        .map_err(|_| DateInputError::Unparsable(value.to_string()))
}

/// Long US-style rendering, e.g. `Monday, November 2, 2026`.
///
/// Falls back to `YYYY-MM-DD` when `format` is not a usable strftime string.
pub fn format_long_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!(%format, "unusable date display format");
        return date.format(ATTR_DATE_FORMAT).to_string();
    }
    out
}

/// What the help line under the date field currently says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpText {
    Idle,
    Prompt,
    Selected(NaiveDate),
}

impl std::fmt::Display for HelpText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Prompt => f.write_str("prompt"),
            Self::Selected(date) => write!(f, "selected {}", date.format(ATTR_DATE_FORMAT)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateRangeEnforcer {
    input: Option<NodeId>,
    help: Option<NodeId>,
    range: DateRange,
    help_state: HelpText,
    display_format: String,
    messages: Messages,
}

impl DateRangeEnforcer {
    pub fn attach(
        doc: &mut Document,
        contract: &PageContract,
        settings: &DateSettings,
        messages: &Messages,
        today: NaiveDate,
        table: &mut BindingTable,
    ) -> Self {
        let range = DateRange::starting(today, settings.months_ahead);

        // The generic booking field only gets a lower bound.
        if let Some(field) = doc.query_selector(&contract.date_field) {
            doc.set_attribute(field, "min", &range.min_attr());
        }

        let input = doc.get_element_by_id(&contract.date_input_id);
        let mut help = None;
        if let Some(input) = input {
            doc.set_attribute(input, "min", &range.min_attr());
            doc.set_attribute(input, "max", &range.max_attr());
            help = doc
                .parent(input)
                .and_then(|parent| doc.query_selector_within(parent, &contract.date_help));

            table.bind(input, EventKind::Change, Handler::ShowSelectedDate);
            table.bind(input, EventKind::Focus, Handler::PromptForDate);

            // Closing the booking modal must also clear the chosen day.
            if let Some(close) = doc.query_selector(&contract.close) {
                table.bind(close, EventKind::Click, Handler::ResetDateField);
            }
            if doc.get_element_by_id(&contract.modal_id).is_some() {
                table.bind(EventTarget::Window, EventKind::Click, Handler::ResetDateFieldOnBackdrop);
            }
            tracing::debug!(min = %range.min, max = %range.max, help = help.is_some(), "date range applied");
        } else {
            tracing::warn!(id = %contract.date_input_id, "no appointment date field; date enforcement skipped");
        }

        Self {
            input,
            help,
            range,
            help_state: HelpText::Idle,
            display_format: settings.display_format.clone(),
            messages: messages.clone(),
        }
    }

    pub const fn range(&self) -> DateRange {
        self.range
    }

    pub const fn input(&self) -> Option<NodeId> {
        self.input
    }

    pub const fn help_state(&self) -> HelpText {
        self.help_state
    }

    pub fn value<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        self.input.map(|input| doc.value(input))
    }

    /// A page without a help line stays `Idle`.
    fn render_help(&mut self, doc: &mut Document, state: HelpText) {
        let Some(help) = self.help else {
            return;
        };
        self.help_state = state;
        match state {
            HelpText::Idle => {
                doc.set_text(help, &self.messages.date_idle);
                doc.set_style(help, "color", &self.messages.idle_color);
            }
            HelpText::Prompt => {
                doc.set_text(help, &self.messages.date_prompt);
                doc.set_style(help, "color", &self.messages.idle_color);
            }
            HelpText::Selected(date) => {
                let pretty = format_long_date(date, &self.display_format);
                doc.set_rich_text(help, &self.messages.date_selected_lead, &pretty);
                doc.set_style(help, "color", &self.messages.selected_color);
            }
        }
    }

    /// `change` on the date field.
    pub fn on_change(&mut self, doc: &mut Document) {
        let Some(input) = self.input else {
            return;
        };
        let value = doc.value(input).to_string();
        if value.is_empty() {
            return;
        }
        match self.range.accept(&value) {
            Ok(date) => self.render_help(doc, HelpText::Selected(date)),
            Err(e) => {
                // The picker would never have produced this value.
                tracing::debug!(error = %e, "date value refused");
                doc.set_value(input, "");
                self.render_help(doc, HelpText::Idle);
            }
        }
    }

    /// `focus` on the date field.
    pub fn on_focus(&mut self, doc: &mut Document) {
        let Some(input) = self.input else {
            return;
        };
        if self.help.is_some() && doc.value(input).is_empty() {
            self.render_help(doc, HelpText::Prompt);
        }
    }

    /// Clears the field and restores the neutral help line. Safe to repeat.
    pub fn reset(&mut self, doc: &mut Document) {
        let Some(input) = self.input else {
            return;
        };
        self.render_help(doc, HelpText::Idle);
        doc.set_value(input, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn three_month_window_is_inclusive() {
        let range = DateRange::starting(ymd(2026, 10, 19), 3);
        assert_eq!(range.max, ymd(2027, 1, 19));
        assert!(range.contains(ymd(2026, 10, 19)));
        assert!(range.contains(ymd(2027, 1, 19)));
        assert!(!range.contains(ymd(2026, 10, 18)));
        assert!(!range.contains(ymd(2027, 1, 20)));
        assert_eq!(range.min_attr(), "2026-10-19");
        assert_eq!(range.max_attr(), "2027-01-19");
    }

    #[test]
    fn month_end_clamps() {
        assert_eq!(DateRange::starting(ymd(2027, 1, 31), 3).max, ymd(2027, 4, 30));
        assert_eq!(DateRange::starting(ymd(2027, 11, 30), 3).max, ymd(2028, 2, 29));
    }

    #[test]
    fn accept_reports_why() {
        let range = DateRange::starting(ymd(2026, 10, 19), 3);
        assert_eq!(range.accept("2026-11-02"), Ok(ymd(2026, 11, 2)));
        assert!(matches!(range.accept("2027-02-01"), Err(DateInputError::OutOfRange { .. })));
        assert!(matches!(range.accept("11/02/2026"), Err(DateInputError::Unparsable(_))));
    }

    #[test]
    fn long_format_matches_locale_style() {
        assert_eq!(
            format_long_date(ymd(2026, 11, 2), &DateSettings::default().display_format),
            "Monday, November 2, 2026"
        );
    }

    #[test]
    fn unusable_format_falls_back_to_iso() {
        assert_eq!(format_long_date(ymd(2026, 11, 2), "%A, %Q"), "2026-11-02");
    }
}
