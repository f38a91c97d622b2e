// src/lib.rs
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

// --- Declare modules ---
mod config;
pub mod date_range;
pub mod dom;
pub mod events;
pub mod header;
pub mod modal;
pub mod nav;
pub mod page;
pub mod sanitize;
pub mod script;
mod site;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, ConfigError, DateSettings, Elements, HeaderSettings,
    Messages, StandardColor, Theme,
};
pub use date_range::{format_long_date, DateInputError, DateRange, HelpText};
pub use dom::{parse_selector, Document, NodeId, ScrollBehavior, SelectorError};
pub use events::{Binding, BindingTable, Event, EventKind, EventTarget, Handler, Unit};
pub use header::ShadowLevel;
pub use modal::ModalVisibility;
pub use nav::{MenuGlyph, NavState};
pub use page::{load_page, parse_page, reference_page, PageContract, PageError};
pub use sanitize::{FieldKind, PasteRejected};
pub use script::{Script, ScriptError, Step, StepTrace};
pub use scraper::Selector;
pub use site::{DispatchRecord, Site, Snapshot};

/// Today's calendar date in the local time zone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct AppService {
    pub config: Config,
    pub config_path: PathBuf,
}

impl AppService {
    /// Loads (or creates) the configuration file.
    /// # Errors
    /// Returns `anyhow::Error` if the config path cannot be determined or the file is invalid.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// The HTML page at `page`, or the built-in reference page.
    pub fn load_page(&self, page: Option<&Path>) -> Result<Document> {
        match page {
            Some(path) => crate::page::load_page(path)
                .with_context(|| format!("Failed to load page {path:?}")),
            None => Ok(reference_page()),
        }
    }

    /// Loads a page and runs its start-up wiring.
    pub fn open_site(&self, page: Option<&Path>, today: Option<NaiveDate>) -> Result<Site> {
        let document = self.load_page(page)?;
        let today = today.unwrap_or_else(local_today);
        Site::initialize(document, &self.config, today)
            .context("Invalid selector in [elements] configuration")
    }

    /// Replays the script at `script_path` against a freshly opened page.
    pub fn simulate(
        &self,
        script_path: &Path,
        page: Option<&Path>,
        today: Option<NaiveDate>,
    ) -> Result<Vec<StepTrace>> {
        let script = Script::load(script_path)
            .with_context(|| format!("Failed to read script {script_path:?}"))?;
        let mut site = self.open_site(page, today)?;
        Ok(script::run(&mut site, &script)?)
    }

    pub fn booking_window(&self, today: Option<NaiveDate>) -> DateRange {
        DateRange::starting(today.unwrap_or_else(local_today), self.config.date.months_ahead)
    }

    pub fn paste_notice(&self, kind: FieldKind) -> &str {
        kind.rejection_notice(&self.config.messages)
    }
}
