use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PreisradarError, Result};

/// A YAML scalar that may be written as a number or as text (`3` or `"2-4"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Themes {
    List(Vec<String>),
    Joined(String),
}

impl Themes {
    pub fn names(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Joined(joined) => joined.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PriceRules {
    pub good_threshold_eur: Option<f64>,
    pub ok_threshold_eur: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Game {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub players: Option<Scalar>,
    #[serde(default)]
    pub age: Option<Scalar>,
    #[serde(default)]
    pub themes: Option<Themes>,
    #[serde(default)]
    pub price_rules: Option<PriceRules>,
    #[serde(default, alias = "search_terms")]
    pub search_queries: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub disclosure: String,
}

impl Game {
    /// Title without the edition suffix after ` –`.
    pub fn short_title(&self) -> &str {
        self.title
            .split(" –")
            .next()
            .unwrap_or(&self.title)
            .trim_end()
    }

    pub fn theme_names(&self) -> Vec<String> {
        self.themes.as_ref().map(Themes::names).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Offer {
    pub title: String,
    pub price_eur: Option<f64>,
    pub shipping_eur: Option<f64>,
    pub total_eur: Option<f64>,
    pub condition: Option<String>,
    pub shop: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hub {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slugs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HubsFile {
    #[serde(default)]
    hubs: Vec<Hub>,
}

/// Directory layout of a site checkout.
#[derive(Debug, Clone)]
pub struct ContentPaths {
    pub games: PathBuf,
    pub hubs: PathBuf,
    pub offers: PathBuf,
    pub history: PathBuf,
    pub public: PathBuf,
}

impl ContentPaths {
    pub fn under(root: &Path) -> Self {
        Self {
            games: root.join("content").join("games"),
            hubs: root.join("content").join("hubs.yaml"),
            offers: root.join("data").join("offers"),
            history: root.join("data").join("history"),
            public: root.join("public"),
        }
    }

    pub fn offers_for(&self, slug: &str) -> PathBuf {
        self.offers.join(format!("{slug}.json"))
    }

    pub fn history_for(&self, slug: &str) -> PathBuf {
        self.history.join(format!("{slug}.jsonl"))
    }
}

pub fn parse_game(text: &str, path: &Path) -> Result<Game> {
    let game: Game = serde_yml::from_str(text).map_err(|source| PreisradarError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    if game.slug.trim().is_empty() {
        return Err(PreisradarError::InvalidContent(format!(
            "{} has an empty slug",
            path.display()
        )));
    }
    Ok(game)
}

/// Loads every `*.yaml`/`*.yml` file in `dir`, sorted by file name.
pub fn load_games(dir: &Path) -> Result<Vec<Game>> {
    let entries = fs::read_dir(dir).map_err(|err| PreisradarError::io(dir, err))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| PreisradarError::io(dir, err))?.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_yaml {
            paths.push(path);
        }
    }
    paths.sort();

    let mut games = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path).map_err(|err| PreisradarError::io(&path, err))?;
        games.push(parse_game(&text, &path)?);
    }
    debug!(count = games.len(), dir = %dir.display(), "games loaded");
    Ok(games)
}

/// A missing offers file means no offers.
pub fn load_offers(path: &Path) -> Result<Vec<Offer>> {
    let Some(text) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&text).map_err(|source| PreisradarError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses JSON lines, skipping lines that are blank or malformed.
pub fn parse_history_lines(text: &str) -> Vec<HistoryRow> {
    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryRow>(line) {
            Ok(row) => rows.push(row),
            Err(err) => warn!(line = idx + 1, error = %err, "skipping history line"),
        }
    }
    rows
}

pub fn load_history(path: &Path) -> Result<Vec<HistoryRow>> {
    Ok(read_optional(path)?
        .map(|text| parse_history_lines(&text))
        .unwrap_or_default())
}

pub fn load_hubs(path: &Path) -> Result<Vec<Hub>> {
    let Some(text) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    let file: HubsFile = serde_yml::from_str(&text).map_err(|source| PreisradarError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.hubs)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PreisradarError::io(path, err)),
    }
}
