use std::collections::HashMap;

use preisradar::consent::{
    AnalyticsConfig, CONSENT_KEY, ConsentState, MemoryPreferences, PreferenceStore, load_consent,
    record_consent,
};
use preisradar::filter::ListingRecord;
use preisradar::formatting::PLACEHOLDER;
use preisradar::indicator::{PriceSample, compute_indicator};
use preisradar::ui::{
    AGE_SELECT, CONSENT_STATUS, Effect, ListItem, MemorySurface, PI_AVG, PI_BADGE, PI_CURRENT,
    PI_HIGH, PI_LOW, PI_MARKER, PLAYERS_SELECT, Page, PageConfig, SEARCH_INPUT, THEME_SELECT,
    UiEvent,
};

fn item(target: &str, title: &str, attrs: &[(&str, &str)]) -> ListItem {
    ListItem {
        target: target.to_string(),
        record: ListingRecord::from_attributes(title, attrs),
    }
}

fn catalog() -> Vec<ListItem> {
    vec![
        item(
            "game-catan",
            "Catan",
            &[
                ("data-min-players", "3"),
                ("data-max-players", "4"),
                ("data-age", "10"),
                ("data-themes", "Handel,Strategie"),
            ],
        ),
        item(
            "game-azul",
            "Azul",
            &[
                ("data-min-players", "2"),
                ("data-max-players", "4"),
                ("data-age", "8"),
                ("data-themes", "Abstrakt,Familie"),
            ],
        ),
        item("game-wingspan", "Flügelschlag", &[("data-age", "abc")]),
    ]
}

fn surface() -> MemorySurface {
    MemorySurface::with_targets([
        "game-catan",
        "game-azul",
        "game-wingspan",
        PI_CURRENT,
        PI_AVG,
        PI_LOW,
        PI_HIGH,
        PI_BADGE,
        PI_MARKER,
        CONSENT_STATUS,
    ])
}

fn hidden(surface: &MemorySurface, target: &str) -> bool {
    surface.element(target).unwrap().hidden
}

#[test]
fn load_renders_indicator_and_shows_everything() {
    let mut page = Page::new(PageConfig {
        items: catalog(),
        price: Some(PriceSample::new(Some(45.0), Some(50.0))),
        ..PageConfig::default()
    });
    let mut surface = surface();
    let effects = page.run(&mut [UiEvent::Load].into_iter(), &mut surface);

    assert!(effects.is_empty());
    assert_eq!(surface.element(PI_BADGE).unwrap().text, "-10% vs. 7-Tage-Ø");
    assert!(surface.element(PI_BADGE).unwrap().classes.contains("green"));
    assert_eq!(surface.element(PI_LOW).unwrap().text, "45,00\u{a0}€");
    for target in ["game-catan", "game-azul", "game-wingspan"] {
        assert!(!hidden(&surface, target));
    }
}

#[test]
fn filter_inputs_combine() {
    let mut page = Page::new(PageConfig {
        items: catalog(),
        ..PageConfig::default()
    });
    let mut surface = surface();
    let events = vec![
        UiEvent::Load,
        UiEvent::input(PLAYERS_SELECT, "3"),
        UiEvent::input(AGE_SELECT, "12"),
    ];
    page.run(&mut events.into_iter(), &mut surface);

    assert!(!hidden(&surface, "game-catan"));
    assert!(!hidden(&surface, "game-azul"));
    // unknown player range hides the item once a count is chosen
    assert!(hidden(&surface, "game-wingspan"));

    page.handle(&mut surface, &UiEvent::input(PLAYERS_SELECT, "5"));
    assert!(hidden(&surface, "game-catan"));
    assert!(hidden(&surface, "game-azul"));

    page.handle(&mut surface, &UiEvent::input(PLAYERS_SELECT, ""));
    page.handle(&mut surface, &UiEvent::input(THEME_SELECT, "Familie"));
    assert!(hidden(&surface, "game-catan"));
    assert!(!hidden(&surface, "game-azul"));

    page.handle(&mut surface, &UiEvent::input(THEME_SELECT, ""));
    page.handle(&mut surface, &UiEvent::input(AGE_SELECT, "9"));
    assert!(hidden(&surface, "game-catan"));
    assert!(!hidden(&surface, "game-azul"));
}

#[test]
fn search_is_case_insensitive_substring() {
    let mut page = Page::new(PageConfig {
        items: catalog(),
        ..PageConfig::default()
    });
    let mut surface = surface();
    page.handle(&mut surface, &UiEvent::input(SEARCH_INPUT, "FLÜGEL"));
    assert!(hidden(&surface, "game-catan"));
    assert!(!hidden(&surface, "game-wingspan"));
    assert_eq!(page.criteria().search_term, "flügel");
}

#[test]
fn granted_consent_loads_analytics_once() {
    let mut prefs = MemoryPreferences::default();
    let analytics = AnalyticsConfig {
        tracking_id: Some("G-TEST".to_string()),
    };
    let mut page = Page::new(PageConfig {
        consent: load_consent(&prefs),
        analytics,
        ..PageConfig::default()
    });
    let mut surface = surface();

    assert!(page.handle(&mut surface, &UiEvent::Load).is_empty());
    let effects = page.handle(
        &mut surface,
        &UiEvent::ConsentChoice {
            state: ConsentState::Granted,
            from_settings: false,
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::PersistConsent(ConsentState::Granted),
            Effect::LoadAnalytics {
                tracking_id: "G-TEST".to_string()
            },
        ]
    );
    for effect in &effects {
        if let Effect::PersistConsent(state) = effect {
            record_consent(&mut prefs, *state);
        }
    }
    assert_eq!(prefs.get(CONSENT_KEY).as_deref(), Some("accepted"));
    assert!(surface.element(CONSENT_STATUS).unwrap().text.is_empty());

    let again = page.handle(
        &mut surface,
        &UiEvent::ConsentChoice {
            state: ConsentState::Granted,
            from_settings: true,
        },
    );
    assert_eq!(again, vec![Effect::PersistConsent(ConsentState::Granted)]);
}

#[test]
fn stored_consent_drives_analytics_on_load() {
    let prefs = MemoryPreferences::with_consent(ConsentState::Granted);
    let mut page = Page::new(PageConfig {
        consent: load_consent(&prefs),
        analytics: AnalyticsConfig {
            tracking_id: Some("G-TEST".to_string()),
        },
        ..PageConfig::default()
    });
    let effects = page.handle(&mut surface(), &UiEvent::Load);
    assert_eq!(
        effects,
        vec![Effect::LoadAnalytics {
            tracking_id: "G-TEST".to_string()
        }]
    );
}

#[test]
fn malformed_average_from_markup_degrades_to_placeholder() {
    let attrs: HashMap<String, String> = [
        ("data-current".to_string(), "45.00".to_string()),
        ("data-avg7".to_string(), "abc".to_string()),
    ]
    .into_iter()
    .collect();
    let result = compute_indicator(&PriceSample::from_attributes(&attrs));
    assert_eq!(result.delta_label(), PLACEHOLDER);
    assert_eq!(result.current_text.as_deref(), Some("45,00\u{a0}€"));

    let mut page = Page::new(PageConfig {
        price: Some(PriceSample::from_attributes(&attrs)),
        ..PageConfig::default()
    });
    let mut surface = surface();
    page.handle(&mut surface, &UiEvent::Load);
    assert_eq!(surface.element(PI_AVG).unwrap().text, PLACEHOLDER);
    assert_eq!(surface.element(PI_BADGE).unwrap().text, PLACEHOLDER);
    assert_eq!(
        surface
            .element(PI_MARKER)
            .unwrap()
            .styles
            .get("left")
            .map(String::as_str),
        Some("50.0%")
    );
}
