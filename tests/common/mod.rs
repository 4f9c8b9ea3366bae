//! Shared fixtures for the integration tests.
//!
//! `SiteFixture::new()` lays out a small site checkout in a temporary
//! directory: three games, offers and price history for two of them, a hubs
//! file and one public asset.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use preisradar::consent::AnalyticsConfig;
use preisradar::indicator::IndicatorOptions;
use preisradar::site::{AffiliateConfig, SiteConfig};
use tempfile::TempDir;

pub const SITE_URL: &str = "https://example.org";

pub fn build_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 23).unwrap()
}

/// The caller must keep the fixture alive while the site directory is in use.
pub struct SiteFixture {
    pub dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };
        fixture.write_games();
        fixture.write_offers();
        fixture.write_history();
        fixture.write(
            "content/hubs.yaml",
            "hubs:\n  - title: Familienspiele\n    description: Für gemischte Runden.\n    slugs: [azul, catan]\n",
        );
        fixture.write("public/style.css", "body { margin: 0; }\n");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn out(&self) -> PathBuf {
        self.dir.path().join("dist")
    }

    pub fn config(&self) -> SiteConfig {
        SiteConfig {
            root: self.root().to_path_buf(),
            output_dir: self.out(),
            site_url: format!("{SITE_URL}/"),
            today: build_date(),
            analytics: AnalyticsConfig::default(),
            affiliate: AffiliateConfig::default(),
            indicator: IndicatorOptions::default(),
        }
    }

    pub fn read_output(&self, relative: &str) -> String {
        fs::read_to_string(self.out().join(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn write_games(&self) {
        self.write(
            "content/games/catan.yaml",
            r#"slug: catan
title: "Catan – Das Spiel"
players: "3-4"
age: 10
themes: [Strategie, Handel]
price_rules:
  good_threshold_eur: 30
  ok_threshold_eur: 45
search_queries: ["Catan Grundspiel"]
description: Siedeln, handeln, bauen.
disclosure: Enthält Affiliate-Links.
"#,
        );
        self.write(
            "content/games/azul.yaml",
            r#"slug: azul
title: Azul
players: "2-4"
age: "ab 8 Jahren"
themes: "Abstrakt, Familie"
"#,
        );
        self.write(
            "content/games/andor.yml",
            "slug: andor\ntitle: Die Legenden von Andor\nplayers: 2-4\nage: 10\nthemes: [Kooperativ]\n",
        );
        self.write("content/games/README.txt", "not a game\n");
    }

    fn write_offers(&self) {
        self.write(
            "data/offers/catan.json",
            r#"[
  {"title": "Catan Basisspiel", "price_eur": 39.9, "shipping_eur": 4.99, "total_eur": 44.89,
   "condition": "Neu", "shop": "eBay", "url": "https://www.ebay.de/itm/1"},
  {"title": "Catan gebraucht", "price_eur": 29.9, "condition": "Gebraucht"}
]"#,
        );
        self.write(
            "data/offers/azul.json",
            r#"[{"title": "Azul", "price_eur": 32.0}]"#,
        );
    }

    fn write_history(&self) {
        self.write(
            "data/history/catan.jsonl",
            concat!(
                "{\"date\": \"2025-07-01\", \"avg\": 40.0, \"min\": 38.0}\n",
                "{\"date\": \"2025-08-18\", \"avg\": 34.0, \"min\": 31.0}\n",
                "kaputt\n",
                "{\"date\": \"2025-08-20\", \"avg\": 36.0, \"min\": 33.0}\n",
            ),
        );
        self.write(
            "data/history/azul.jsonl",
            "{\"date\": \"2025-08-22\", \"avg\": 30.0, \"min\": 29.0}\n",
        );
    }
}
