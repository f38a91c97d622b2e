// src/page.rs
//! Page markup: the element contract the behaviours rely on, HTML pages
//! loaded from disk, and the site's own reference page.
use crate::config::Elements;
use crate::dom::{parse_selector, Document, SelectorError};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

const REFERENCE_PAGE: &str = include_str!("reference_page.html");

#[derive(Error, Debug)]
pub enum PageError {
    #[error("I/O error reading page: {0}")]
    Io(#[from] std::io::Error),
    #[error("Element id '{0}' is used more than once.")]
    DuplicateId(String),
}

/// Parsed form of [`Elements`], resolved once per page.
#[derive(Debug, Clone)]
pub struct PageContract {
    pub book_button_id: String,
    pub hero_book_button_id: String,
    pub mobile_book_button_id: String,
    pub modal_id: String,
    pub close: Selector,
    pub mobile_menu_button_id: String,
    pub mobile_menu_button: Selector,
    pub menu_icon: Selector,
    pub mobile_nav_id: String,
    pub mobile_nav: Selector,
    pub mobile_nav_links: Selector,
    pub nav_links: Selector,
    pub open_class: String,
    pub services_button_id: String,
    pub services_section_id: String,
    pub date_input_id: String,
    pub date_field: Selector,
    pub date_help: Selector,
    pub name_fields: Selector,
    pub phone_fields: Selector,
    pub header: Selector,
}

impl PageContract {
    pub fn from_elements(elements: &Elements) -> Result<Self, SelectorError> {
        Ok(Self {
            book_button_id: elements.book_button_id.clone(),
            hero_book_button_id: elements.hero_book_button_id.clone(),
            mobile_book_button_id: elements.mobile_book_button_id.clone(),
            modal_id: elements.modal_id.clone(),
            close: parse_selector(&elements.close_selector)?,
            mobile_menu_button_id: elements.mobile_menu_button_id.clone(),
            mobile_menu_button: parse_selector(&elements.mobile_menu_button_selector)?,
            menu_icon: parse_selector(&elements.menu_icon_selector)?,
            mobile_nav_id: elements.mobile_nav_id.clone(),
            mobile_nav: parse_selector(&elements.mobile_nav_selector)?,
            mobile_nav_links: parse_selector(&elements.mobile_nav_links_selector)?,
            nav_links: parse_selector(&elements.nav_links_selector)?,
            open_class: elements.open_class.clone(),
            services_button_id: elements.services_button_id.clone(),
            services_section_id: elements.services_section_id.clone(),
            date_input_id: elements.date_input_id.clone(),
            date_field: parse_selector(&elements.date_field_selector)?,
            date_help: parse_selector(&elements.date_help_selector)?,
            name_fields: parse_selector(&elements.name_fields_selector)?,
            phone_fields: parse_selector(&elements.phone_fields_selector)?,
            header: parse_selector(&elements.header_selector)?,
        })
    }
}

/// Parses page markup. Element ids must be unique, since every behaviour
/// looks its elements up by id.
pub fn parse_page(markup: &str) -> Result<Document, PageError> {
    let html = Html::parse_document(markup);
    let mut seen = HashSet::new();
    for element in html.tree.nodes().filter_map(scraper::ElementRef::wrap) {
        if let Some(id) = element.value().id() {
            if !seen.insert(id.to_string()) {
                return Err(PageError::DuplicateId(id.to_string()));
            }
        }
    }
    if !html.errors.is_empty() {
        tracing::debug!(errors = html.errors.len(), "page markup parsed with recoverable errors");
    }
    Ok(Document::from_html(html))
}

pub fn load_page(path: &Path) -> Result<Document, PageError> {
    let markup = fs::read_to_string(path)?;
    parse_page(&markup)
}

/// The appointment site's own markup. Sections carry the offsets of a
/// typical desktop layout in `data-offset-top`.
pub fn reference_page() -> Document {
    Document::parse(REFERENCE_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_PAGE: &str = r##"
<header><nav><a href="#services">Services</a></nav></header>
<section id="services" data-offset-top="500"></section>
"##;

    #[test]
    fn parses_html_page() {
        let doc = parse_page(MINIMAL_PAGE).unwrap();
        let link = doc.query_selector(&parse_selector("nav a").unwrap()).unwrap();
        assert_eq!(doc.attribute(link, "href"), Some("#services"));
        let section = doc.get_element_by_id("services").unwrap();
        assert_eq!(doc.offset_top(section), 500.0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse_page(r#"<div id="x"></div><span id="x"></span>"#).unwrap_err();
        assert!(matches!(err, PageError::DuplicateId(id) if id == "x"));
    }

    #[test]
    fn reference_page_satisfies_default_contract() {
        let doc = reference_page();
        let contract = PageContract::from_elements(&Elements::default()).unwrap();
        for id in [
            &contract.book_button_id,
            &contract.hero_book_button_id,
            &contract.mobile_book_button_id,
            &contract.modal_id,
            &contract.mobile_menu_button_id,
            &contract.mobile_nav_id,
            &contract.services_button_id,
            &contract.services_section_id,
            &contract.date_input_id,
        ] {
            assert!(doc.get_element_by_id(id).is_some(), "missing #{id}");
        }
        assert!(doc.query_selector(&contract.close).is_some());
        assert!(doc.query_selector(&contract.header).is_some());
        assert_eq!(doc.query_selector_all(&contract.name_fields).len(), 1);
        assert_eq!(doc.query_selector_all(&contract.phone_fields).len(), 1);
        assert_eq!(doc.query_selector_all(&contract.mobile_nav_links).len(), 4);
        assert_eq!(doc.query_selector_all(&contract.nav_links).len(), 8);
        assert!(parse_page(REFERENCE_PAGE).is_ok());
    }

    #[test]
    fn bad_contract_selector_is_reported() {
        let elements = Elements {
            header_selector: "header >".into(),
            ..Elements::default()
        };
        let err = PageContract::from_elements(&elements).unwrap_err();
        assert_eq!(err.selector, "header >");
    }
}
