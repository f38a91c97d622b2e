//src/config.rs
use chrono::format::{Item, StrftimeItems};
use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "booking-page";
const CONFIG_ENV_VAR: &str = "BOOKING_PAGE_CONFIG_DIR"; // Environment variable name

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine configuration directory.")]
    CannotDetermineConfigDir,
    #[error("I/O error accessing config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file (TOML): {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config data (TOML): {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Invalid color name: {0}")]
    InvalidColor(String),
    #[error("Header shadow threshold must be a finite, non-negative number (got {0}).")]
    InvalidShadowThreshold(f64),
    #[error("Booking window must be at least one month (got {0}).")]
    InvalidBookingWindow(u32),
    #[error("Invalid date display format: '{0}'")]
    InvalidDateFormat(String),
}

// Define standard colors using strum for easy iteration/parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum StandardColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    DarkGrey,
    DarkRed,
    DarkGreen,
    DarkYellow,
    DarkBlue,
    DarkMagenta,
    DarkCyan,
    Grey,
}

// Helper to convert our enum to comfy_table::Color
impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Red => Self::Red,
            StandardColor::Green => Self::Green,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::White => Self::White,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::DarkCyan => Self::DarkCyan,
            StandardColor::Grey => Self::Grey,
        }
    }
}

pub fn parse_color(color_str: &str) -> Result<StandardColor, ConfigError> {
    StandardColor::iter()
        .find(|color| format!("{color:?}").eq_ignore_ascii_case(color_str))
        .ok_or_else(|| ConfigError::InvalidColor(color_str.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub header_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_color: "Green".to_string(),
        }
    }
}

/// Ids and selectors of the page elements the behaviours bind to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Elements {
    pub book_button_id: String,
    pub hero_book_button_id: String,
    pub mobile_book_button_id: String,
    pub modal_id: String,
    pub close_selector: String,
    pub mobile_menu_button_id: String,
    pub mobile_menu_button_selector: String,
    pub menu_icon_selector: String,
    pub mobile_nav_id: String,
    pub mobile_nav_selector: String,
    pub mobile_nav_links_selector: String,
    pub nav_links_selector: String,
    pub open_class: String,
    pub services_button_id: String,
    pub services_section_id: String,
    pub date_input_id: String,
    pub date_field_selector: String,
    pub date_help_selector: String,
    pub name_fields_selector: String,
    pub phone_fields_selector: String,
    pub header_selector: String,
}

impl Default for Elements {
    fn default() -> Self {
        Self {
            book_button_id: "bookAppointmentBtn".into(),
            hero_book_button_id: "heroBookBtn".into(),
            mobile_book_button_id: "mobileBookBtn".into(),
            modal_id: "appointmentModal".into(),
            close_selector: ".close".into(),
            mobile_menu_button_id: "mobileMenuBtn".into(),
            mobile_menu_button_selector: ".mobile-menu-btn".into(),
            menu_icon_selector: "i".into(),
            mobile_nav_id: "mobileNav".into(),
            mobile_nav_selector: ".mobile-nav".into(),
            mobile_nav_links_selector: ".mobile-nav a".into(),
            nav_links_selector: "nav a".into(),
            open_class: "active".into(),
            services_button_id: "servicesBtn".into(),
            services_section_id: "services".into(),
            date_input_id: "appointmentDate".into(),
            date_field_selector: r#"input[name="appointment_date"]"#.into(),
            date_help_selector: ".date-help".into(),
            name_fields_selector: r#"input[name="name"]"#.into(),
            phone_fields_selector: r#"input[type="tel"]"#.into(),
            header_selector: "header".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DateSettings {
    /// Calendar months after today that stay bookable.
    pub months_ahead: u32,
    /// chrono format for the confirmation text.
    pub display_format: String,
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            months_ahead: 3,
            display_format: "%A, %B %-d, %Y".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HeaderSettings {
    pub shadow_threshold: f64,
    pub resting_shadow: String,
    pub raised_shadow: String,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            shadow_threshold: 100.0,
            resting_shadow: "0 2px 10px rgba(0, 0, 0, 0.1)".into(),
            raised_shadow: "0 5px 15px rgba(0, 0, 0, 0.1)".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Messages {
    pub date_idle: String,
    pub date_prompt: String,
    pub date_selected_lead: String,
    pub idle_color: String,
    pub selected_color: String,
    pub name_paste_rejected: String,
    pub phone_paste_rejected: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            date_idle: "Tap to choose a date from calendar".into(),
            date_prompt: "📅 Tap to open calendar and select a date".into(),
            date_selected_lead: "✅ Selected: ".into(),
            idle_color: "var(--primary)".into(),
            selected_color: "var(--secondary)".into(),
            name_paste_rejected: "Please enter letters only for name field".into(),
            phone_paste_rejected: "Please enter numbers only for phone field".into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)] // Ensure defaults are used if fields are missing
pub struct Config {
    pub elements: Elements,
    pub date: DateSettings,
    pub header: HeaderSettings,
    pub messages: Messages,
    pub theme: Theme,
}

impl Config {
    /// Rejects values no page could honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.header.shadow_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidShadowThreshold(threshold));
        }
        if self.date.months_ahead == 0 {
            return Err(ConfigError::InvalidBookingWindow(self.date.months_ahead));
        }
        let format = &self.date.display_format;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(format.clone()));
        }
        parse_color(&self.theme.header_color)?;
        Ok(())
    }
}

/// Determines the path to the configuration file.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir_path = if let Ok(path_str) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path_str);
        if !path.is_dir() {
            tracing::warn!(
                "Environment variable {} points to '{}', which is not a directory. Trying to create it.",
                CONFIG_ENV_VAR,
                path.display()
            );
            fs::create_dir_all(&path)?;
        }
        path
    } else {
        let base_config_dir = dirs::config_dir().ok_or(ConfigError::CannotDetermineConfigDir)?;
        base_config_dir.join(APP_CONFIG_DIR)
    };

    if !config_dir_path.exists() {
        fs::create_dir_all(&config_dir_path)?;
    }

    Ok(config_dir_path.join(CONFIG_FILE_NAME))
}

/// Loads the configuration, writing the defaults out on first use.
pub fn load(config_path: &Path) -> Result<Config, ConfigError> {
    if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save(config_path, &default_config)?;
        tracing::info!(path = %config_path.display(), "wrote default configuration");
        Ok(default_config)
    }
}

pub fn save(config_path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)?;
        }
    }
    let config_content = toml::to_string_pretty(config)?;
    fs::write(config_path, config_content)?;
    Ok(())
}
