// src/script.rs
//! Interaction scripts: a list of user gestures replayed against a [`Site`].
//!
//! ```toml
//! [[step]]
//! action = "click"
//! target = "#heroBookBtn"
//!
//! [[step]]
//! action = "paste"
//! target = 'input[name="name"]'
//! text = "John Smith"
//! ```
use crate::dom::NodeId;
use crate::events::EventTarget;
use crate::dom::{parse_selector, SelectorError};
use crate::site::{DispatchRecord, Site, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

const WINDOW_TARGET: &str = "window";

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("I/O error reading script: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse script (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Step {step}: invalid target selector: {source}")]
    BadSelector {
        step: usize,
        #[source]
        source: SelectorError,
    },
    #[error("Step {step}: no element matches '{selector}'")]
    TargetNotFound { step: usize, selector: String },
    #[error("Step {step}: '{action}' needs an element target, not the window")]
    WindowNotAllowed { step: usize, action: &'static str },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Click { target: String },
    Focus { target: String },
    Type { target: String, text: String },
    Paste { target: String, text: String },
    Change { target: String, value: String },
    Scroll { y: f64 },
}

impl Step {
    const fn action(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Focus { .. } => "focus",
            Self::Type { .. } => "type",
            Self::Paste { .. } => "paste",
            Self::Change { .. } => "change",
            Self::Scroll { .. } => "scroll",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click { target } | Self::Focus { target } => {
                write!(f, "{} {target}", self.action())
            }
            Self::Type { target, text } | Self::Paste { target, text } => {
                write!(f, "{} {text:?} into {target}", self.action())
            }
            Self::Change { target, value } => write!(f, "change {target} to {value:?}"),
            Self::Scroll { y } => write!(f, "scroll to {y}"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml_str(source: &str) -> Result<Self, ScriptError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Outcome of one replayed step.
#[derive(Debug, Clone)]
pub struct StepTrace {
    pub index: usize,
    pub step: Step,
    pub dispatched: Vec<DispatchRecord>,
    pub snapshot: Snapshot,
}

fn resolve(site: &Site, step: usize, target: &str) -> Result<EventTarget, ScriptError> {
    if target.trim().eq_ignore_ascii_case(WINDOW_TARGET) {
        return Ok(EventTarget::Window);
    }
    let selector =
        parse_selector(target).map_err(|source| ScriptError::BadSelector { step, source })?;
    site.document()
        .query_selector(&selector)
        .map(EventTarget::Node)
        .ok_or_else(|| ScriptError::TargetNotFound {
            step,
            selector: target.to_string(),
        })
}

fn resolve_field(
    site: &Site,
    step: usize,
    target: &str,
    action: &'static str,
) -> Result<NodeId, ScriptError> {
    resolve(site, step, target)?
        .node()
        .ok_or(ScriptError::WindowNotAllowed { step, action })
}

/// Replays every step in order. Steps are numbered from 1.
pub fn run(site: &mut Site, script: &Script) -> Result<Vec<StepTrace>, ScriptError> {
    let mut traces = Vec::with_capacity(script.steps.len());
    for (i, step) in script.steps.iter().enumerate() {
        let index = i + 1;
        tracing::debug!(index, %step, "replaying step");
        let dispatched = match step {
            Step::Click { target } => {
                let target = resolve(site, index, target)?;
                site.click(target)
            }
            Step::Focus { target } => {
                let field = resolve_field(site, index, target, step.action())?;
                site.focus(field)
            }
            Step::Type { target, text } => {
                let field = resolve_field(site, index, target, step.action())?;
                site.type_text(field, text)
            }
            Step::Paste { target, text } => {
                let field = resolve_field(site, index, target, step.action())?;
                site.paste(field, text)
            }
            Step::Change { target, value } => {
                let field = resolve_field(site, index, target, step.action())?;
                site.change_value(field, value)
            }
            Step::Scroll { y } => site.scroll_to(*y),
        };
        traces.push(StepTrace {
            index,
            step: step.clone(),
            dispatched,
            snapshot: site.snapshot(),
        });
    }
    Ok(traces)
}
