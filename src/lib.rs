//! Price indicator, listing filter and static site build for a board-game
//! deal site.

pub mod attributes;
pub mod cli;
pub mod consent;
pub mod error;
pub mod filter;
pub mod formatting;
pub mod indicator;
pub mod numeric;
pub mod output;
pub mod progress;
pub mod site;
pub mod summary;
pub mod ui;

pub use error::{PreisradarError, Result};
pub use filter::{FilterCriteria, ListingRecord, is_visible, visibility};
pub use indicator::{
    GaugeScale, IndicatorOptions, IndicatorResult, PriceSample, TrendCategory, compute_indicator,
    compute_indicator_with,
};
