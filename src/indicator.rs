//! Current-vs-average price indicator.
//!
//! [`compute_indicator`] turns a [`PriceSample`] into display strings, a
//! [`TrendCategory`] and a gauge position. Each output field degrades on its
//! own: an unknown average hides the delta and the trend but still renders
//! the current price and the gauge.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::attributes::Attributes;
use crate::formatting::{
    CurrencyStyle, PLACEHOLDER, format_currency, format_delta_label, format_gauge_percent,
};
use crate::numeric::{money, money_from_json, parse_money};

pub const ATTR_CURRENT: &str = "data-current";
pub const ATTR_AVG7: &str = "data-avg7";
pub const ATTR_HISTORY: &str = "data-history";
pub const ATTR_TREND: &str = "data-trend";

const GOOD_RATIO: f64 = 0.95;
const HIGH_RATIO: f64 = 1.05;
const DEGENERATE_GAUGE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub min: Option<f64>,
    pub avg: Option<f64>,
}

impl HistoryPoint {
    pub fn value(&self) -> Option<f64> {
        self.min.and_then(money).or_else(|| self.avg.and_then(money))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSample {
    pub current: Option<f64>,
    pub seven_day_average: Option<f64>,
    pub history: Vec<HistoryPoint>,
    /// Classification supplied upstream; skips the ratio check when set.
    pub trend: Option<TrendCategory>,
}

impl PriceSample {
    pub fn new(current: Option<f64>, seven_day_average: Option<f64>) -> Self {
        Self {
            current,
            seven_day_average,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<HistoryPoint>) -> Self {
        self.history = history;
        self
    }

    /// Reads a sample from `data-current`, `data-avg7`, `data-history` and
    /// `data-trend`. Unusable values leave their field unknown.
    pub fn from_attributes<A: Attributes + ?Sized>(attrs: &A) -> Self {
        let current = attrs.attr(ATTR_CURRENT).and_then(parse_money);
        let seven_day_average = attrs.attr(ATTR_AVG7).and_then(parse_money);
        if current.is_none() {
            debug!(raw = ?attrs.attr(ATTR_CURRENT), "current price unknown");
        }
        if seven_day_average.is_none() {
            debug!(raw = ?attrs.attr(ATTR_AVG7), "7-day average unknown");
        }
        let history = attrs.attr(ATTR_HISTORY).map(parse_history).unwrap_or_default();
        let trend = attrs
            .attr(ATTR_TREND)
            .and_then(|raw| raw.parse::<TrendCategory>().ok())
            .filter(|trend| *trend != TrendCategory::Unknown);
        Self {
            current,
            seven_day_average,
            history,
            trend,
        }
    }
}

/// Parses a JSON array of `{ "min": .., "avg": .. }` objects. Anything else
/// discards the whole payload.
pub fn parse_history(raw: &str) -> Vec<HistoryPoint> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "discarding unparseable price history");
            return Vec::new();
        }
    };
    let Value::Array(entries) = parsed else {
        warn!("discarding price history that is not a list");
        return Vec::new();
    };

    let mut points = Vec::with_capacity(entries.len());
    for entry in &entries {
        let Value::Object(fields) = entry else {
            warn!("discarding price history with a non-object entry");
            return Vec::new();
        };
        points.push(HistoryPoint {
            min: fields.get("min").and_then(money_from_json),
            avg: fields.get("avg").and_then(money_from_json),
        });
    }
    points
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendCategory {
    Good,
    Ok,
    High,
    #[default]
    Unknown,
}

impl TrendCategory {
    pub fn classify(current: Option<f64>, seven_day_average: Option<f64>) -> Self {
        let (Some(current), Some(average)) = (
            current.and_then(money),
            seven_day_average.and_then(money),
        ) else {
            return Self::Unknown;
        };
        if average <= 0.0 {
            return Self::Unknown;
        }
        let ratio = current / average;
        if !ratio.is_finite() {
            return Self::Unknown;
        }
        if ratio <= GOOD_RATIO {
            Self::Good
        } else if ratio <= HIGH_RATIO {
            Self::Ok
        } else {
            Self::High
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Ok => "ok",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }

    /// Color class used by the badge and the gauge marker.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Good => "green",
            Self::Ok => "orange",
            Self::High => "red",
            Self::Unknown => "gray",
        }
    }
}

impl fmt::Display for TrendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trend category: {0}")]
pub struct UnknownTrend(String);

impl FromStr for TrendCategory {
    type Err = UnknownTrend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" | "green" => Ok(Self::Good),
            "ok" | "orange" => Ok(Self::Ok),
            "high" | "red" => Ok(Self::High),
            "unknown" => Ok(Self::Unknown),
            other => Err(UnknownTrend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GaugeScale {
    /// Position of the current price between the observed low and high.
    #[default]
    Range,
    /// Centered on the average; `half_width` percent of delta reaches either end.
    FixedWindow { half_width: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorOptions {
    pub currency: CurrencyStyle,
    pub gauge: GaugeScale,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorResult {
    pub current_text: Option<String>,
    pub avg_text: Option<String>,
    pub low_text: Option<String>,
    pub high_text: Option<String>,
    pub delta_text: Option<String>,
    pub delta_percent: Option<f64>,
    /// Gauge position in `[0, 100]`; `None` renders an empty gauge.
    pub gauge_percent: Option<f64>,
    pub trend: TrendCategory,
    #[serde(skip)]
    pub low: Option<f64>,
    #[serde(skip)]
    pub high: Option<f64>,
}

impl IndicatorResult {
    pub fn delta_label(&self) -> &str {
        self.delta_text.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Fill of the gauge bar; an empty gauge is drawn at 0%.
    pub fn gauge_fill(&self) -> f64 {
        self.gauge_percent.unwrap_or(0.0)
    }

    pub fn gauge_label(&self) -> Option<String> {
        self.gauge_percent.map(format_gauge_percent)
    }
}

pub fn compute_indicator(sample: &PriceSample) -> IndicatorResult {
    compute_indicator_with(sample, &IndicatorOptions::default())
}

pub fn compute_indicator_with(sample: &PriceSample, options: &IndicatorOptions) -> IndicatorResult {
    let current = sample.current.and_then(money);
    let average = sample.seven_day_average.and_then(money);
    let delta_percent = delta_percent(current, average);
    let (low, high) = price_range(current, &sample.history);

    let gauge_position = match options.gauge {
        GaugeScale::Range => range_position(current, low, high),
        GaugeScale::FixedWindow { half_width } => window_position(delta_percent, half_width),
    };

    let trend = sample
        .trend
        .unwrap_or_else(|| TrendCategory::classify(current, average));
    let currency = |value: Option<f64>| value.map(|v| format_currency(v, options.currency));

    IndicatorResult {
        current_text: currency(current),
        avg_text: currency(average),
        low_text: currency(low),
        high_text: currency(high),
        delta_text: delta_percent.map(|delta| format_delta_label(Some(delta))),
        delta_percent,
        gauge_percent: gauge_position.map(|pos| pos * 100.0),
        trend,
        low,
        high,
    }
}

fn delta_percent(current: Option<f64>, average: Option<f64>) -> Option<f64> {
    let (current, average) = (current?, average?);
    if average == 0.0 {
        return None;
    }
    let delta = (current - average) / average * 100.0;
    delta.is_finite().then_some(delta)
}

/// Low and high over the history values, or over `[current]` when the
/// history carries none.
fn price_range(current: Option<f64>, history: &[HistoryPoint]) -> (Option<f64>, Option<f64>) {
    let mut values = history.iter().filter_map(HistoryPoint::value).peekable();
    if values.peek().is_none() {
        return (current, current);
    }
    values.fold((None, None), |(low, high): (Option<f64>, Option<f64>), value| {
        (
            Some(low.map_or(value, |l| l.min(value))),
            Some(high.map_or(value, |h| h.max(value))),
        )
    })
}

fn range_position(current: Option<f64>, low: Option<f64>, high: Option<f64>) -> Option<f64> {
    let (current, low, high) = (current?, low?, high?);
    let span = high - low;
    if span <= 0.0 {
        return Some(DEGENERATE_GAUGE);
    }
    Some(((current - low) / span).clamp(0.0, 1.0))
}

fn window_position(delta_percent: Option<f64>, half_width: f64) -> Option<f64> {
    if !(half_width.is_finite() && half_width > 0.0) {
        return None;
    }
    let delta = delta_percent?;
    Some((0.5 + delta / (2.0 * half_width)).clamp(0.0, 1.0))
}
