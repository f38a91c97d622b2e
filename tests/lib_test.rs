use anyhow::{Context, Result};
use booking_page_lib::{
    parse_page, parse_selector, reference_page, AppService, Config, EventKind, EventTarget,
    FieldKind, Handler, HelpText, MenuGlyph, ModalVisibility, NavState, NodeId, ScrollBehavior,
    ShadowLevel, Site,
};
use chrono::NaiveDate;
use std::fs;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

// Helper function to open the reference page on a fixed day
fn create_test_site() -> Result<Site> {
    Ok(Site::initialize(reference_page(), &Config::default(), today())?)
}

fn node(site: &Site, selector: &str) -> Result<NodeId> {
    let parsed = parse_selector(selector)?;
    site.document()
        .query_selector(&parsed)
        .with_context(|| format!("no element matches {selector}"))
}

fn element(site: &Site, id: &str) -> Result<NodeId> {
    site.element(id).with_context(|| format!("no element #{id}"))
}

#[test]
fn test_initial_wiring() -> Result<()> {
    let site = create_test_site()?;
    let doc = site.document();

    let date = element(&site, "appointmentDate")?;
    assert_eq!(doc.attribute(date, "min"), Some("2026-10-19"));
    assert_eq!(doc.attribute(date, "max"), Some("2027-01-19"));

    let phone = node(&site, r#"input[type="tel"]"#)?;
    assert_eq!(doc.attribute(phone, "inputmode"), Some("tel"));

    let snap = site.snapshot();
    assert_eq!(snap.modal, ModalVisibility::Hidden);
    assert_eq!(snap.nav, Some(NavState::Closed));
    assert_eq!(snap.glyph, Some(MenuGlyph::Bars));
    assert_eq!(snap.help, HelpText::Idle);
    assert_eq!(snap.header_shadow, None);

    let bindings = site.bindings();
    assert!(bindings.contains(Handler::ToggleNav));
    assert!(bindings.contains(Handler::UpdateHeaderShadow));
    assert!(bindings.contains(Handler::SanitizeInput(FieldKind::Name)));
    assert!(bindings.contains(Handler::GuardPaste(FieldKind::Phone)));
    assert_eq!(
        bindings
            .for_event(EventTarget::Window, EventKind::Click)
            .count(),
        3
    );
    Ok(())
}

#[test]
fn test_typing_filters_name_and_phone() -> Result<()> {
    let mut site = create_test_site()?;
    let name = node(&site, r#"input[name="name"]"#)?;
    let phone = node(&site, r#"input[type="tel"]"#)?;

    site.type_text(name, "John123");
    assert_eq!(site.document().value(name), "John");
    site.type_text(name, " Smith!");
    assert_eq!(site.document().value(name), "John Smith");

    site.type_text(phone, "555-abc");
    assert_eq!(site.document().value(phone), "555-");
    site.type_text(phone, "(0) 12+3");
    assert_eq!(site.document().value(phone), "555-(0) 12+3");

    assert!(site.document().alerts().is_empty());
    Ok(())
}

#[test]
fn test_paste_accepted_and_rejected() -> Result<()> {
    let mut site = create_test_site()?;
    let name = node(&site, r#"input[name="name"]"#)?;
    let phone = node(&site, r#"input[type="tel"]"#)?;

    let records = site.paste(name, "John Smith");
    assert_eq!(site.document().value(name), "John Smith");
    assert!(!records[0].default_prevented);
    assert_eq!(records[1].event.kind, EventKind::Input);
    assert!(site.document().alerts().is_empty());

    let records = site.paste(name, "123");
    assert!(records[0].default_prevented);
    assert_eq!(records.len(), 1);
    assert_eq!(site.document().value(name), "John Smith");
    assert_eq!(
        site.document().alerts(),
        ["Please enter letters only for name field"]
    );

    site.paste(phone, "555-abc");
    assert_eq!(site.document().value(phone), "");
    assert_eq!(
        site.document().alerts().last().map(String::as_str),
        Some("Please enter numbers only for phone field")
    );

    site.paste(phone, "(555) 123-4567");
    assert_eq!(site.document().value(phone), "(555) 123-4567");
    assert_eq!(site.document().alerts().len(), 2);
    Ok(())
}

#[test]
fn test_empty_paste_is_rejected() -> Result<()> {
    let mut site = create_test_site()?;
    let name = node(&site, r#"input[name="name"]"#)?;
    let records = site.paste(name, "");
    assert!(records[0].default_prevented);
    assert_eq!(site.document().alerts().len(), 1);
    Ok(())
}

#[test]
fn test_close_control_resets_date() -> Result<()> {
    let mut site = create_test_site()?;
    let hero = element(&site, "heroBookBtn")?;
    let date = element(&site, "appointmentDate")?;
    let close = node(&site, ".close")?;

    site.click(hero);
    assert!(site.modal().is_open());

    site.change_value(date, "2026-11-02");
    let snap = site.snapshot();
    assert_eq!(
        snap.help,
        HelpText::Selected(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap())
    );
    assert_eq!(
        snap.help_text.as_deref(),
        Some("✅ Selected: Monday, November 2, 2026")
    );

    site.click(close);
    let snap = site.snapshot();
    assert_eq!(snap.modal, ModalVisibility::Hidden);
    assert_eq!(snap.date_value.as_deref(), Some(""));
    assert_eq!(snap.help, HelpText::Idle);
    assert_eq!(
        snap.help_text.as_deref(),
        Some("Tap to choose a date from calendar")
    );

    // A second close changes nothing.
    site.click(close);
    assert_eq!(site.snapshot(), snap);
    Ok(())
}

#[test]
fn test_backdrop_click_closes_and_resets() -> Result<()> {
    let mut site = create_test_site()?;
    let open = element(&site, "bookAppointmentBtn")?;
    let modal = element(&site, "appointmentModal")?;
    let form = element(&site, "appointmentForm")?;
    let date = element(&site, "appointmentDate")?;

    site.click(open);
    site.change_value(date, "2026-12-24");

    // Clicks inside the dialog leave it alone.
    site.click(form);
    assert!(site.modal().is_open());
    assert_eq!(site.document().value(date), "2026-12-24");

    site.click(modal);
    assert!(!site.modal().is_open());
    assert_eq!(site.document().value(date), "");
    assert_eq!(site.dates().help_state(), HelpText::Idle);
    Ok(())
}

#[test]
fn test_date_outside_window_is_cleared() -> Result<()> {
    let mut site = create_test_site()?;
    let date = element(&site, "appointmentDate")?;

    site.change_value(date, "2027-01-20");
    assert_eq!(site.document().value(date), "");
    assert_eq!(site.dates().help_state(), HelpText::Idle);

    site.change_value(date, "2026-10-18");
    assert_eq!(site.document().value(date), "");

    site.change_value(date, "2027-01-19");
    assert_eq!(site.document().value(date), "2027-01-19");
    assert!(matches!(site.dates().help_state(), HelpText::Selected(_)));

    let range = site.dates().range();
    assert!(range.accept("2026-10-19").is_ok());
    assert!(range.accept("not a date").is_err());
    Ok(())
}

#[test]
fn test_focus_prompts_only_when_empty() -> Result<()> {
    let mut site = create_test_site()?;
    let date = element(&site, "appointmentDate")?;

    site.focus(date);
    let snap = site.snapshot();
    assert_eq!(snap.help, HelpText::Prompt);
    assert_eq!(
        snap.help_text.as_deref(),
        Some("📅 Tap to open calendar and select a date")
    );

    site.change_value(date, "2026-10-20");
    site.focus(date);
    assert!(matches!(site.dates().help_state(), HelpText::Selected(_)));
    Ok(())
}

#[test]
fn test_menu_toggle_and_outside_click() -> Result<()> {
    let mut site = create_test_site()?;
    let icon = node(&site, "#mobileMenuBtn i")?;
    let mobile_nav = element(&site, "mobileNav")?;
    let hero = element(&site, "home")?;

    // Clicking the icon inside the button toggles via bubbling.
    site.click(icon);
    assert_eq!(site.nav().state(site.document()), Some(NavState::Open));
    assert_eq!(site.nav().glyph(site.document()), Some(MenuGlyph::Close));

    site.click(mobile_nav);
    assert_eq!(site.nav().state(site.document()), Some(NavState::Open));

    site.click(hero);
    assert_eq!(site.nav().state(site.document()), Some(NavState::Closed));
    assert_eq!(site.nav().glyph(site.document()), Some(MenuGlyph::Bars));

    site.click(icon);
    site.click(icon);
    assert_eq!(site.nav().state(site.document()), Some(NavState::Closed));
    Ok(())
}

#[test]
fn test_mobile_link_closes_menu_and_scrolls() -> Result<()> {
    let mut site = create_test_site()?;
    let button = element(&site, "mobileMenuBtn")?;
    let about = node(&site, r##"#mobileNav a[href="#about"]"##)?;

    site.click(button);
    assert_eq!(site.nav().state(site.document()), Some(NavState::Open));

    let records = site.click(about);
    assert!(records[0].default_prevented);
    assert!(records[0].handlers.contains(&Handler::CloseNavFromLink));
    assert!(records[0].handlers.contains(&Handler::SmoothScrollToFragment));
    assert_eq!(records[1].event.kind, EventKind::Scroll);

    let snap = site.snapshot();
    assert_eq!(snap.nav, Some(NavState::Closed));
    assert_eq!(snap.glyph, Some(MenuGlyph::Bars));
    assert_eq!(snap.scroll_y, 1480.0);
    assert_eq!(site.document().last_scroll(), Some(ScrollBehavior::Smooth));
    assert_eq!(snap.header_shadow, Some(ShadowLevel::Raised));
    Ok(())
}

#[test]
fn test_mobile_book_button_opens_modal_and_closes_menu() -> Result<()> {
    let mut site = create_test_site()?;
    let button = element(&site, "mobileMenuBtn")?;
    let book = element(&site, "mobileBookBtn")?;

    site.click(button);
    site.click(book);
    let snap = site.snapshot();
    assert_eq!(snap.modal, ModalVisibility::Shown);
    assert_eq!(snap.nav, Some(NavState::Closed));
    assert_eq!(snap.glyph, Some(MenuGlyph::Bars));
    Ok(())
}

#[test]
fn test_services_button_scrolls() -> Result<()> {
    let mut site = create_test_site()?;
    let services = element(&site, "servicesBtn")?;
    site.click(services);
    assert_eq!(site.document().scroll_y(), 720.0);
    assert_eq!(site.document().last_scroll(), Some(ScrollBehavior::Smooth));
    Ok(())
}

#[test]
fn test_header_shadow_follows_scroll() -> Result<()> {
    let mut site = create_test_site()?;

    site.scroll_to(150.0);
    assert_eq!(site.snapshot().header_shadow, Some(ShadowLevel::Raised));
    let header = node(&site, "header")?;
    assert_eq!(
        site.document().style(header, "box-shadow"),
        Some("0 5px 15px rgba(0, 0, 0, 0.1)")
    );

    site.scroll_to(100.0);
    assert_eq!(site.snapshot().header_shadow, Some(ShadowLevel::Resting));

    site.scroll_to(0.0);
    assert_eq!(
        site.document().style(header, "box-shadow"),
        Some("0 2px 10px rgba(0, 0, 0, 0.1)")
    );
    Ok(())
}

const PAGE_WITHOUT_MOBILE_MENU: &str = r##"
<header><nav><a href="#about">About</a></nav></header>
<section id="about" data-offset-top="900"></section>
<footer data-offset-top="1500">
    <a id="footerAbout" href="#about"></a>
    <a id="footerMissing" href="#nowhere"></a>
</footer>
"##;

#[test]
fn test_partial_page_degrades_gracefully() -> Result<()> {
    let document = parse_page(PAGE_WITHOUT_MOBILE_MENU)?;
    let mut site = Site::initialize(document, &Config::default(), today())?;

    assert!(!site.bindings().contains(Handler::ToggleNav));
    assert!(!site.bindings().contains(Handler::OpenModal));
    assert!(site.bindings().contains(Handler::SmoothScrollToFragment));

    let snap = site.snapshot();
    assert_eq!(snap.nav, None);
    assert_eq!(snap.glyph, None);
    assert_eq!(snap.date_value, None);

    let link = node(&site, r##"nav a[href="#about"]"##)?;
    site.click(link);
    assert_eq!(site.document().scroll_y(), 900.0);
    assert_eq!(site.document().last_scroll(), Some(ScrollBehavior::Smooth));

    // Links outside any nav take the instant default jump.
    site.scroll_to(0.0);
    let footer_link = element(&site, "footerAbout")?;
    let records = site.click(footer_link);
    assert!(!records[0].default_prevented);
    assert_eq!(site.document().scroll_y(), 900.0);
    assert_eq!(site.document().last_scroll(), Some(ScrollBehavior::Instant));
    assert_eq!(site.snapshot().header_shadow, Some(ShadowLevel::Raised));

    let missing = element(&site, "footerMissing")?;
    site.click(missing);
    assert_eq!(site.document().scroll_y(), 900.0);
    Ok(())
}

#[test]
fn test_date_field_without_help_line() -> Result<()> {
    let document = parse_page(
        r#"<form><input type="date" id="appointmentDate" name="appointment_date"></form>"#,
    )?;
    let mut site = Site::initialize(document, &Config::default(), today())?;
    let date = element(&site, "appointmentDate")?;

    site.focus(date);
    assert_eq!(site.dates().help_state(), HelpText::Idle);

    site.change_value(date, "2026-11-02");
    assert_eq!(site.document().value(date), "2026-11-02");
    let snap = site.snapshot();
    assert_eq!(snap.help, HelpText::Idle);
    assert_eq!(snap.help_text, None);
    Ok(())
}

#[test]
fn test_unusable_display_format_falls_back_to_iso() -> Result<()> {
    let mut config = Config::default();
    config.date.display_format = "%A, %Q".into();
    let mut site = Site::initialize(reference_page(), &config, today())?;
    let date = element(&site, "appointmentDate")?;

    site.change_value(date, "2026-11-02");
    assert_eq!(
        site.snapshot().help_text.as_deref(),
        Some("✅ Selected: 2026-11-02")
    );
    Ok(())
}

#[test]
fn test_custom_messages_are_used() -> Result<()> {
    let mut config = Config::default();
    config.messages.name_paste_rejected = "Letters only, please".into();
    let mut site = Site::initialize(reference_page(), &config, today())?;
    let name = node(&site, r#"input[name="name"]"#)?;

    site.paste(name, "R2D2");
    assert_eq!(site.document().alerts(), ["Letters only, please"]);
    Ok(())
}

#[test]
fn test_simulate_script() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let script_path = dir.path().join("flow.toml");
    fs::write(
        &script_path,
        r##"
[[step]]
action = "click"
target = "#heroBookBtn"

[[step]]
action = "type"
target = 'input[name="name"]'
text = "Ann3 Lee"

[[step]]
action = "change"
target = "#appointmentDate"
value = "2026-11-02"

[[step]]
action = "click"
target = ".close"

[[step]]
action = "scroll"
y = 150.0
"##,
    )?;

    let service = AppService {
        config: Config::default(),
        config_path: dir.path().join("config.toml"),
    };
    let traces = service.simulate(&script_path, None, Some(today()))?;

    assert_eq!(traces.len(), 5);
    assert_eq!(traces[0].snapshot.modal, ModalVisibility::Shown);
    assert!(matches!(traces[2].snapshot.help, HelpText::Selected(_)));
    assert_eq!(traces[3].snapshot.modal, ModalVisibility::Hidden);
    assert_eq!(traces[3].snapshot.date_value.as_deref(), Some(""));
    assert_eq!(traces[4].snapshot.header_shadow, Some(ShadowLevel::Raised));
    assert_eq!(traces[4].index, 5);
    Ok(())
}

#[test]
fn test_script_target_errors() -> Result<()> {
    let mut site = create_test_site()?;
    let missing = booking_page_lib::Script::from_toml_str(
        "[[step]]\naction = \"click\"\ntarget = \"#doesNotExist\"\n",
    )?;
    let err = booking_page_lib::script::run(&mut site, &missing).unwrap_err();
    assert!(matches!(
        err,
        booking_page_lib::ScriptError::TargetNotFound { step: 1, .. }
    ));

    let window_paste = booking_page_lib::Script::from_toml_str(
        "[[step]]\naction = \"paste\"\ntarget = \"window\"\ntext = \"x\"\n",
    )?;
    let err = booking_page_lib::script::run(&mut site, &window_paste).unwrap_err();
    assert!(matches!(
        err,
        booking_page_lib::ScriptError::WindowNotAllowed { .. }
    ));
    Ok(())
}

#[test]
fn test_config_operations() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");

    let mut config = booking_page_lib::load_config_util(&path)?;
    assert_eq!(config, Config::default());
    config.date.months_ahead = 6;
    booking_page_lib::save_config_util(&path, &config)?;

    let reloaded = booking_page_lib::load_config_util(&path)?;
    assert_eq!(reloaded.date.months_ahead, 6);
    Ok(())
}
