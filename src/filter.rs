use std::collections::BTreeSet;

use crate::attributes::Attributes;
use crate::numeric::parse_count;

pub const ATTR_MIN_PLAYERS: &str = "data-min-players";
pub const ATTR_MAX_PLAYERS: &str = "data-max-players";
pub const ATTR_AGE: &str = "data-age";
pub const ATTR_THEMES: &str = "data-themes";

const THEME_SEPARATOR: char = ',';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRecord {
    pub text: String,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub min_age: Option<u32>,
    pub themes: BTreeSet<String>,
}

impl ListingRecord {
    pub fn from_attributes<A: Attributes + ?Sized>(text: impl Into<String>, attrs: &A) -> Self {
        let themes = attrs
            .attr(ATTR_THEMES)
            .map(|raw| {
                raw.split(THEME_SEPARATOR)
                    .filter(|theme| !theme.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            text: text.into(),
            min_players: attrs.attr(ATTR_MIN_PLAYERS).and_then(parse_count),
            max_players: attrs.attr(ATTR_MAX_PLAYERS).and_then(parse_count),
            min_age: attrs.attr(ATTR_AGE).and_then(parse_count),
            themes,
        }
    }

    /// The data attributes read back by [`ListingRecord::from_attributes`].
    /// Unknown values are left out.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::with_capacity(4);
        if let Some(min) = self.min_players {
            attrs.push((ATTR_MIN_PLAYERS, min.to_string()));
        }
        if let Some(max) = self.max_players {
            attrs.push((ATTR_MAX_PLAYERS, max.to_string()));
        }
        if let Some(age) = self.min_age {
            attrs.push((ATTR_AGE, age.to_string()));
        }
        if !self.themes.is_empty() {
            let joined = self
                .themes
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            attrs.push((ATTR_THEMES, joined));
        }
        attrs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub player_count: Option<u32>,
    pub max_age: Option<u32>,
    pub theme: Option<String>,
}

impl FilterCriteria {
    /// Builds criteria from the raw values of the search box and the three
    /// select controls. Empty or unparseable controls impose no constraint.
    pub fn from_inputs(search: &str, players: &str, age: &str, theme: &str) -> Self {
        let theme = theme.trim();
        Self {
            search_term: search.to_lowercase(),
            player_count: parse_count(players),
            max_age: parse_count(age),
            theme: (!theme.is_empty()).then(|| theme.to_string()),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search_term.is_empty()
            && self.player_count.is_none()
            && self.max_age.is_none()
            && self.theme.is_none()
    }
}

pub fn is_visible(record: &ListingRecord, criteria: &FilterCriteria) -> bool {
    text_matches(record, &criteria.search_term)
        && players_match(record, criteria.player_count)
        && age_matches(record, criteria.max_age)
        && theme_matches(record, criteria.theme.as_deref())
}

/// Visibility of every record, in order. Nothing is cached between passes.
pub fn visibility(records: &[ListingRecord], criteria: &FilterCriteria) -> Vec<bool> {
    records
        .iter()
        .map(|record| is_visible(record, criteria))
        .collect()
}

fn text_matches(record: &ListingRecord, term: &str) -> bool {
    term.is_empty() || record.text.to_lowercase().contains(&term.to_lowercase())
}

fn players_match(record: &ListingRecord, player_count: Option<u32>) -> bool {
    let Some(count) = player_count else {
        return true;
    };
    match (record.min_players, record.max_players) {
        (Some(min), Some(max)) => (min..=max).contains(&count),
        _ => false,
    }
}

fn age_matches(record: &ListingRecord, max_age: Option<u32>) -> bool {
    let Some(max_age) = max_age else {
        return true;
    };
    record.min_age.is_some_and(|age| age <= max_age)
}

fn theme_matches(record: &ListingRecord, theme: Option<&str>) -> bool {
    theme.is_none_or(|theme| record.themes.contains(theme))
}
