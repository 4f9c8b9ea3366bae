use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::indicator::{HistoryPoint, PriceSample};
use crate::numeric::{money, parse_count};
use crate::site::content::{HistoryRow, Offer, PriceRules};

/// Days of history fed into the indicator's low/high range.
pub const GAUGE_HISTORY_DAYS: i64 = 90;

const DEFAULT_GOOD_THRESHOLD: f64 = 0.0;
const DEFAULT_OK_THRESHOLD: f64 = 9999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceRating {
    NoData,
    Below,
    Ok,
    Expensive,
}

impl PriceRating {
    pub fn from_average(average: Option<f64>, rules: Option<&PriceRules>) -> Self {
        let Some(average) = average else {
            return Self::NoData;
        };
        let Some(rules) = rules else {
            return Self::Ok;
        };
        let good = rules.good_threshold_eur.unwrap_or(DEFAULT_GOOD_THRESHOLD);
        let ok = rules.ok_threshold_eur.unwrap_or(DEFAULT_OK_THRESHOLD);
        if average < good {
            Self::Below
        } else if average <= ok {
            Self::Ok
        } else {
            Self::Expensive
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NoData => "keine Daten",
            Self::Below => "unter",
            Self::Ok => "ok",
            Self::Expensive => "teuer",
        }
    }

    pub const fn css_class(self) -> &'static str {
        match self {
            Self::NoData => "keine-daten",
            Self::Below => "unter",
            Self::Ok => "ok",
            Self::Expensive => "teuer",
        }
    }
}

/// Parses player counts like `"2-4"`, `"2–4 Spieler"` or `"3"`.
pub fn parse_players(raw: &str) -> (Option<u32>, Option<u32>) {
    let normalized = raw.trim().replace('–', "-");
    if let Some((low, high)) = normalized.split_once('-') {
        let low = low.trim();
        if low.is_empty() || !low.bytes().all(|b| b.is_ascii_digit()) {
            return (None, None);
        }
        return match (low.parse::<u32>().ok(), parse_count(high)) {
            (Some(min), Some(max)) => (Some(min), Some(max)),
            _ => (None, None),
        };
    }
    if !normalized.is_empty() && normalized.bytes().all(|b| b.is_ascii_digit()) {
        let count = normalized.parse().ok();
        return (count, count);
    }
    (None, None)
}

/// First number anywhere in the text: `"ab 10 Jahren"` gives 10.
pub fn parse_age(raw: &str) -> Option<u32> {
    let start = raw.find(|ch: char| ch.is_ascii_digit())?;
    parse_count(&raw[start..])
}

pub fn offer_prices(offers: &[Offer]) -> Vec<f64> {
    offers
        .iter()
        .filter_map(|offer| offer.price_eur.and_then(money))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}

/// Mean of the non-zero daily averages of the last `days` days, rounded to cents.
pub fn average_window(rows: &[HistoryRow], days: i64, today: NaiveDate) -> Option<f64> {
    let cutoff = window_start(today, days);
    let values: Vec<f64> = rows
        .iter()
        .filter(|row| row.date >= cutoff)
        .filter_map(|row| row.avg.and_then(money))
        .filter(|avg| *avg > 0.0)
        .collect();
    mean(&values).map(|avg| round_to(avg, 2))
}

/// Percent change of `value` against `reference`, one decimal.
pub fn delta_against(value: Option<f64>, reference: Option<f64>) -> Option<f64> {
    let (value, reference) = (value?, reference?);
    if reference == 0.0 {
        return None;
    }
    Some(round_to((value - reference) / reference * 100.0, 1))
}

#[derive(Debug, Clone, PartialEq)]
pub struct GamePricing {
    pub offer_count: usize,
    pub mean_price: Option<f64>,
    pub min_price: Option<f64>,
    pub rating: PriceRating,
    pub avg7: Option<f64>,
    pub avg30: Option<f64>,
    pub avg60: Option<f64>,
    pub avg90: Option<f64>,
    pub delta60: Option<f64>,
    pub sample: PriceSample,
}

impl GamePricing {
    /// The lowest current offer is the price the indicator compares.
    pub fn compute(
        offers: &[Offer],
        history: &[HistoryRow],
        rules: Option<&PriceRules>,
        today: NaiveDate,
    ) -> Self {
        let prices = offer_prices(offers);
        let mean_price = mean(&prices).map(|avg| round_to(avg, 2));
        let min_price = prices.iter().copied().reduce(f64::min);
        let avg7 = average_window(history, 7, today);
        let avg60 = average_window(history, 60, today);

        let gauge_cutoff = window_start(today, GAUGE_HISTORY_DAYS);
        let points = history
            .iter()
            .filter(|row| row.date >= gauge_cutoff)
            .map(|row| HistoryPoint {
                min: row.min,
                avg: row.avg,
            })
            .collect();

        Self {
            offer_count: prices.len(),
            mean_price,
            min_price,
            rating: PriceRating::from_average(mean_price, rules),
            avg7,
            avg30: average_window(history, 30, today),
            avg60,
            avg90: average_window(history, 90, today),
            delta60: delta_against(mean_price, avg60),
            sample: PriceSample::new(min_price, avg7).with_history(points),
        }
    }
}
