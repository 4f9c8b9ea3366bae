//! Page controller between the browser event system and the pure computations.
//!
//! Events arrive through an [`EventSource`]; results are written through a
//! [`Surface`]. Side effects that belong to external collaborators (storing
//! the consent value, injecting the analytics tag) are returned as
//! [`Effect`]s instead of being performed here.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::consent::{AnalyticsConfig, AnalyticsDecision, ConsentState, analytics_decision};
use crate::filter::{FilterCriteria, ListingRecord, is_visible};
use crate::formatting::PLACEHOLDER;
use crate::indicator::{IndicatorOptions, IndicatorResult, PriceSample, compute_indicator_with};

pub const SEARCH_INPUT: &str = "q";
pub const PLAYERS_SELECT: &str = "filter-players";
pub const AGE_SELECT: &str = "filter-age";
pub const THEME_SELECT: &str = "filter-theme";

pub const PI_CURRENT: &str = "pi-current";
pub const PI_AVG: &str = "pi-avg";
pub const PI_LOW: &str = "pi-low";
pub const PI_HIGH: &str = "pi-high";
pub const PI_BADGE: &str = "pi-badge";
pub const PI_MARKER: &str = "pi-marker";

pub const CONSENT_STATUS: &str = "consent-status";
pub const STATUS_SAVED: &str = "Einstellungen gespeichert.";
pub const STATUS_HIDE_AFTER: Duration = Duration::from_secs(3);

const TREND_COLORS: [&str; 4] = ["green", "orange", "red", "gray"];
const EMPTY_GAUGE_CLASS: &str = "empty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Load,
    /// A filter control changed; `control` is the element id.
    Input { control: String, value: String },
    ConsentChoice {
        state: ConsentState,
        from_settings: bool,
    },
}

impl UiEvent {
    pub fn input(control: &str, value: &str) -> Self {
        Self::Input {
            control: control.to_string(),
            value: value.to_string(),
        }
    }
}

pub trait EventSource {
    fn next_event(&mut self) -> Option<UiEvent>;
}

impl<I: Iterator<Item = UiEvent>> EventSource for I {
    fn next_event(&mut self) -> Option<UiEvent> {
        self.next()
    }
}

/// Output targets addressed by id. Every setter returns `false` when the
/// target does not exist; callers skip that update and carry on.
pub trait Surface {
    fn set_text(&mut self, target: &str, text: &str) -> bool;
    fn set_class(&mut self, target: &str, class: &str, enabled: bool) -> bool;
    fn set_style(&mut self, target: &str, property: &str, value: &str) -> bool;
    fn set_hidden(&mut self, target: &str, hidden: bool) -> bool;
    /// Fire-and-forget: hides `target` once `delay` has passed.
    fn hide_after(&mut self, target: &str, delay: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PersistConsent(ConsentState),
    LoadAnalytics { tracking_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub target: String,
    pub record: ListingRecord,
}

#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    pub items: Vec<ListItem>,
    pub price: Option<PriceSample>,
    pub options: IndicatorOptions,
    /// Stored consent, read once before the page starts.
    pub consent: ConsentState,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Default)]
struct FilterControls {
    search: String,
    players: String,
    age: String,
    theme: String,
}

#[derive(Debug)]
pub struct Page {
    items: Vec<ListItem>,
    price: Option<PriceSample>,
    options: IndicatorOptions,
    consent: ConsentState,
    analytics: AnalyticsConfig,
    analytics_loaded: bool,
    controls: FilterControls,
}

impl Page {
    pub fn new(config: PageConfig) -> Self {
        Self {
            items: config.items,
            price: config.price,
            options: config.options,
            consent: config.consent,
            analytics: config.analytics,
            analytics_loaded: false,
            controls: FilterControls::default(),
        }
    }

    pub const fn consent(&self) -> ConsentState {
        self.consent
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_inputs(
            &self.controls.search,
            &self.controls.players,
            &self.controls.age,
            &self.controls.theme,
        )
    }

    /// Drains `events`, returning the collected effects in order.
    pub fn run<E, S>(&mut self, events: &mut E, surface: &mut S) -> Vec<Effect>
    where
        E: EventSource + ?Sized,
        S: Surface + ?Sized,
    {
        let mut effects = Vec::new();
        while let Some(event) = events.next_event() {
            effects.extend(self.handle(surface, &event));
        }
        effects
    }

    pub fn handle<S: Surface + ?Sized>(&mut self, surface: &mut S, event: &UiEvent) -> Vec<Effect> {
        match event {
            UiEvent::Load => {
                if let Some(sample) = &self.price {
                    let result = compute_indicator_with(sample, &self.options);
                    render_indicator(surface, &result);
                }
                self.apply_filters(surface);
                self.analytics_effect().into_iter().collect()
            }
            UiEvent::Input { control, value } => {
                if self.update_control(control, value) {
                    self.apply_filters(surface);
                }
                Vec::new()
            }
            UiEvent::ConsentChoice {
                state,
                from_settings,
            } => {
                self.consent = *state;
                let mut effects = vec![Effect::PersistConsent(*state)];
                effects.extend(self.analytics_effect());
                if *from_settings {
                    show_status(surface, STATUS_SAVED);
                }
                effects
            }
        }
    }

    /// Returns the number of visible items.
    pub fn apply_filters<S: Surface + ?Sized>(&self, surface: &mut S) -> usize {
        let criteria = self.criteria();
        let mut visible = 0;
        for item in &self.items {
            let shown = is_visible(&item.record, &criteria);
            visible += usize::from(shown);
            if !surface.set_hidden(&item.target, !shown) {
                trace!(target = %item.target, "list item missing");
            }
        }
        debug!(visible, total = self.items.len(), "filters applied");
        visible
    }

    fn update_control(&mut self, control: &str, value: &str) -> bool {
        let slot = match control {
            SEARCH_INPUT => &mut self.controls.search,
            PLAYERS_SELECT => &mut self.controls.players,
            AGE_SELECT => &mut self.controls.age,
            THEME_SELECT => &mut self.controls.theme,
            _ => return false,
        };
        value.clone_into(slot);
        true
    }

    fn analytics_effect(&mut self) -> Option<Effect> {
        if self.analytics_loaded {
            return None;
        }
        match analytics_decision(self.consent, &self.analytics) {
            AnalyticsDecision::Load { tracking_id } => {
                self.analytics_loaded = true;
                Some(Effect::LoadAnalytics { tracking_id })
            }
            AnalyticsDecision::Suppress => None,
        }
    }
}

pub fn render_indicator<S: Surface + ?Sized>(surface: &mut S, result: &IndicatorResult) {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
    surface.set_text(PI_CURRENT, &text(&result.current_text));
    surface.set_text(PI_AVG, &text(&result.avg_text));
    surface.set_text(PI_LOW, &text(&result.low_text));
    surface.set_text(PI_HIGH, &text(&result.high_text));

    let color = result.trend.color();
    for target in [PI_BADGE, PI_MARKER] {
        for class in TREND_COLORS {
            surface.set_class(target, class, class == color);
        }
    }
    surface.set_text(PI_BADGE, result.delta_label());

    let left = result
        .gauge_label()
        .unwrap_or_else(|| format!("{}%", result.gauge_fill()));
    surface.set_style(PI_MARKER, "left", &left);
    surface.set_class(PI_MARKER, EMPTY_GAUGE_CLASS, result.gauge_percent.is_none());
}

fn show_status<S: Surface + ?Sized>(surface: &mut S, message: &str) {
    if surface.set_text(CONSENT_STATUS, message) {
        surface.set_hidden(CONSENT_STATUS, false);
        surface.hide_after(CONSENT_STATUS, STATUS_HIDE_AFTER);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub text: String,
    pub classes: BTreeSet<String>,
    pub styles: BTreeMap<String, String>,
    pub hidden: bool,
}

/// In-memory [`Surface`] with a fixed set of targets.
#[derive(Debug, Default)]
pub struct MemorySurface {
    elements: FxHashMap<String, Element>,
    pending_hides: Vec<(String, Duration)>,
}

impl MemorySurface {
    pub fn with_targets<'a>(targets: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            elements: targets
                .into_iter()
                .map(|id| (id.to_string(), Element::default()))
                .collect(),
            pending_hides: Vec::new(),
        }
    }

    pub fn element(&self, target: &str) -> Option<&Element> {
        self.elements.get(target)
    }

    pub fn pending_hides(&self) -> &[(String, Duration)] {
        &self.pending_hides
    }

    /// Runs every scheduled hide as if its delay had elapsed.
    pub fn elapse(&mut self) {
        for (target, _) in std::mem::take(&mut self.pending_hides) {
            self.set_hidden(&target, true);
        }
    }
}

impl Surface for MemorySurface {
    fn set_text(&mut self, target: &str, text: &str) -> bool {
        self.elements.get_mut(target).is_some_and(|element| {
            text.clone_into(&mut element.text);
            true
        })
    }

    fn set_class(&mut self, target: &str, class: &str, enabled: bool) -> bool {
        self.elements.get_mut(target).is_some_and(|element| {
            if enabled {
                element.classes.insert(class.to_string());
            } else {
                element.classes.remove(class);
            }
            true
        })
    }

    fn set_style(&mut self, target: &str, property: &str, value: &str) -> bool {
        self.elements.get_mut(target).is_some_and(|element| {
            element
                .styles
                .insert(property.to_string(), value.to_string());
            true
        })
    }

    fn set_hidden(&mut self, target: &str, hidden: bool) -> bool {
        self.elements.get_mut(target).is_some_and(|element| {
            element.hidden = hidden;
            true
        })
    }

    fn hide_after(&mut self, target: &str, delay: Duration) {
        self.pending_hides.push((target.to_string(), delay));
    }
}
