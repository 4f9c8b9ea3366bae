//! Analytics consent, read once at startup and passed in explicitly.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};

/// The single preference key the page persists.
pub const CONSENT_KEY: &str = "cookie-consent";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConsentState {
    #[default]
    Unset,
    Granted,
    Denied,
}

impl ConsentState {
    /// Interprets a stored preference. Both historical spellings are accepted;
    /// anything unrecognized counts as unset.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("accepted" | "granted") => Self::Granted,
            Some("declined" | "denied") => Self::Denied,
            _ => Self::Unset,
        }
    }

    pub const fn as_stored(self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::Granted => Some("accepted"),
            Self::Denied => Some("declined"),
        }
    }

    /// Whether the consent banner still needs an answer.
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Class set on the document root.
    pub const fn root_class(self) -> &'static str {
        match self {
            Self::Unset => "cookies-pending",
            Self::Granted => "cookies-accepted",
            Self::Denied => "cookies-declined",
        }
    }
}

impl fmt::Display for ConsentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored().unwrap_or("unset"))
    }
}

/// String-valued preference storage.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn with_consent(state: ConsentState) -> Self {
        let mut prefs = Self::default();
        if let Some(value) = state.as_stored() {
            prefs.set(CONSENT_KEY, value);
        }
        prefs
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

pub fn load_consent<P: PreferenceStore + ?Sized>(prefs: &P) -> ConsentState {
    let state = ConsentState::from_stored(prefs.get(CONSENT_KEY).as_deref());
    debug!(%state, "consent loaded");
    state
}

pub fn record_consent<P: PreferenceStore + ?Sized>(prefs: &mut P, state: ConsentState) {
    if let Some(value) = state.as_stored() {
        prefs.set(CONSENT_KEY, value);
        info!(%state, "consent recorded");
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub tracking_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsDecision {
    Load { tracking_id: String },
    Suppress,
}

/// Analytics load only with granted consent and a configured tracking id.
pub fn analytics_decision(consent: ConsentState, config: &AnalyticsConfig) -> AnalyticsDecision {
    match (consent, config.tracking_id.as_deref().map(str::trim)) {
        (ConsentState::Granted, Some(id)) if !id.is_empty() => AnalyticsDecision::Load {
            tracking_id: id.to_string(),
        },
        _ => AnalyticsDecision::Suppress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalyticsConfig {
        AnalyticsConfig {
            tracking_id: Some("G-TEST123".to_string()),
        }
    }

    #[test]
    fn both_spellings_are_understood() {
        assert_eq!(ConsentState::from_stored(Some("accepted")), ConsentState::Granted);
        assert_eq!(ConsentState::from_stored(Some("granted")), ConsentState::Granted);
        assert_eq!(ConsentState::from_stored(Some("declined")), ConsentState::Denied);
        assert_eq!(ConsentState::from_stored(Some("denied")), ConsentState::Denied);
        assert_eq!(ConsentState::from_stored(Some("maybe")), ConsentState::Unset);
        assert_eq!(ConsentState::from_stored(None), ConsentState::Unset);
    }

    #[test]
    fn only_unset_consent_is_pending() {
        assert!(ConsentState::Unset.is_pending());
        assert!(!ConsentState::Denied.is_pending());
        assert_eq!(ConsentState::Granted.root_class(), "cookies-accepted");
    }

    #[test]
    fn only_granted_consent_loads_analytics() {
        assert_eq!(
            analytics_decision(ConsentState::Granted, &config()),
            AnalyticsDecision::Load {
                tracking_id: "G-TEST123".to_string()
            }
        );
        assert_eq!(
            analytics_decision(ConsentState::Denied, &config()),
            AnalyticsDecision::Suppress
        );
        assert_eq!(
            analytics_decision(ConsentState::Unset, &config()),
            AnalyticsDecision::Suppress
        );
    }

    #[test]
    fn missing_tracking_id_suppresses_analytics() {
        let blank = AnalyticsConfig {
            tracking_id: Some("  ".to_string()),
        };
        assert_eq!(
            analytics_decision(ConsentState::Granted, &blank),
            AnalyticsDecision::Suppress
        );
        assert_eq!(
            analytics_decision(ConsentState::Granted, &AnalyticsConfig::default()),
            AnalyticsDecision::Suppress
        );
    }

    #[test]
    fn recorded_consent_is_read_back() {
        let mut prefs = MemoryPreferences::default();
        assert_eq!(load_consent(&prefs), ConsentState::Unset);
        record_consent(&mut prefs, ConsentState::Denied);
        assert_eq!(prefs.get(CONSENT_KEY).as_deref(), Some("declined"));
        record_consent(&mut prefs, ConsentState::Granted);
        assert_eq!(load_consent(&prefs), ConsentState::Granted);
    }

    #[test]
    fn unset_is_never_written() {
        let mut prefs = MemoryPreferences::with_consent(ConsentState::Denied);
        record_consent(&mut prefs, ConsentState::Unset);
        assert_eq!(load_consent(&prefs), ConsentState::Denied);
    }
}
