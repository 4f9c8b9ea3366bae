//! Static site build: content and price data in, HTML pages out.

pub mod content;
pub mod pricing;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tokio::task;
use tracing::{debug, info};

use crate::consent::AnalyticsConfig;
use crate::filter::ListingRecord;
use crate::indicator::{IndicatorOptions, TrendCategory, compute_indicator_with};
use crate::output::write_output_file;
use crate::progress::{ProgressState, Stage, StageOutcome};
use content::{ContentPaths, Game, Hub, HistoryRow, Offer};
use pricing::{GamePricing, parse_age, parse_players};
use render::{
    GamePageContext, HUBS_PAGE, LISTING_PAGE, LayoutContext, ListingEntry, render_game_page,
    render_home_page, render_hubs_page, render_layout, render_listing_page, render_sitemap,
};

const EBAY_SEARCH_URL: &str = "https://www.ebay.de/sch/i.html";
const DEFAULT_REFERENCE_ID: &str = "preisradar";
const TOP_DEALS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct AffiliateConfig {
    pub campaign_id: Option<String>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub site_url: String,
    pub today: NaiveDate,
    pub analytics: AnalyticsConfig,
    pub affiliate: AffiliateConfig,
    pub indicator: IndicatorOptions,
}

impl SiteConfig {
    fn site_url(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub slug: String,
    pub title: String,
    pub offers: usize,
    pub min_price: Option<f64>,
    pub mean_price: Option<f64>,
    pub avg7: Option<f64>,
    pub avg60: Option<f64>,
    pub delta60: Option<f64>,
    pub rating: &'static str,
    pub trend: TrendCategory,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub games: Vec<GameSummary>,
    pub pages_written: usize,
    pub assets_copied: usize,
    pub output_dir: PathBuf,
}

struct LoadedGame {
    game: Game,
    offers: Vec<Offer>,
    history: Vec<HistoryRow>,
}

struct LoadedSite {
    games: Vec<LoadedGame>,
    hubs: Vec<Hub>,
}

impl StageOutcome for LoadedSite {
    fn describe(&self) -> String {
        let offers: usize = self.games.iter().map(|entry| entry.offers.len()).sum();
        format!(
            "{} Spiele, {offers} Angebote, {} Hubs",
            self.games.len(),
            self.hubs.len()
        )
    }
}

impl StageOutcome for BuildReport {
    fn describe(&self) -> String {
        format!(
            "{} Seiten, {} Dateien nach {}",
            self.pages_written,
            self.assets_copied,
            self.output_dir.display()
        )
    }
}

/// eBay search link for a game's first search query, tagged with the
/// campaign when one is configured.
pub fn ebay_search_url(game: &Game, affiliate: &AffiliateConfig) -> String {
    let query = game
        .search_queries
        .first()
        .map_or(game.slug.as_str(), String::as_str);
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let mut link = format!("{EBAY_SEARCH_URL}?_nkw={encoded}");
    if let Some(campaign) = affiliate
        .campaign_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    {
        let reference = affiliate
            .reference_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_REFERENCE_ID);
        link.push_str(&format!(
            "&campid={campaign}&customid={reference}-{}",
            game.slug
        ));
    }
    link
}

pub fn listing_record(game: &Game) -> ListingRecord {
    let (min_players, max_players) = game
        .players
        .as_ref()
        .map_or((None, None), |players| parse_players(&players.as_text()));
    ListingRecord {
        text: game.short_title().to_string(),
        min_players,
        max_players,
        min_age: game.age.as_ref().and_then(|age| parse_age(&age.as_text())),
        themes: game.theme_names().into_iter().collect(),
    }
}

pub async fn build_site(config: &SiteConfig, progress: Option<&ProgressState>) -> Result<BuildReport> {
    let paths = ContentPaths::under(&config.root);

    let loaded = Stage::Load
        .run(progress, load_content(paths.clone()))
        .await?;
    Stage::Render
        .run(progress, render_site(config, &paths, loaded))
        .await
}

async fn load_content(paths: ContentPaths) -> Result<LoadedSite> {
    task::spawn_blocking(move || load_site(&paths))
        .await
        .context("content loader task failed")?
}

fn load_site(paths: &ContentPaths) -> Result<LoadedSite> {
    let games = content::load_games(&paths.games)
        .with_context(|| format!("failed to load games from {}", paths.games.display()))?;
    let mut loaded = Vec::with_capacity(games.len());
    for game in games {
        let offers = content::load_offers(&paths.offers_for(&game.slug))
            .with_context(|| format!("failed to load offers for {}", game.slug))?;
        let history = content::load_history(&paths.history_for(&game.slug))
            .with_context(|| format!("failed to load price history for {}", game.slug))?;
        loaded.push(LoadedGame {
            game,
            offers,
            history,
        });
    }
    let hubs = content::load_hubs(&paths.hubs).context("failed to load hubs")?;
    Ok(LoadedSite {
        games: loaded,
        hubs,
    })
}

async fn render_site(
    config: &SiteConfig,
    paths: &ContentPaths,
    loaded: LoadedSite,
) -> Result<BuildReport> {
    let site_url = config.site_url();
    let tracking_id = config.analytics.tracking_id.as_deref();
    let out = config.output_dir.as_path();
    let mut pages_written = 0;

    let assets_copied = {
        let public = paths.public.clone();
        let out = out.to_path_buf();
        task::spawn_blocking(move || copy_public(&public, &out))
            .await
            .context("asset copy task failed")??
    };

    let mut summaries = Vec::with_capacity(loaded.games.len());
    let mut lowest_prices: FxHashMap<&str, f64> = FxHashMap::default();
    for entry in &loaded.games {
        let game = &entry.game;
        let pricing = GamePricing::compute(
            &entry.offers,
            &entry.history,
            game.price_rules.as_ref(),
            config.today,
        );
        let indicator = compute_indicator_with(&pricing.sample, &config.indicator);
        let search_url = ebay_search_url(game, &config.affiliate);
        let page = render_game_page(&GamePageContext {
            game,
            offers: &entry.offers,
            pricing: &pricing,
            indicator: &indicator,
            search_url: &search_url,
        });
        let description = format!(
            "Preisradar, aktuelle Angebote und Deals für {}.",
            game.title
        );
        let canonical = format!("{site_url}/spiel/{}/", game.slug);
        let html = render_layout(&LayoutContext {
            title: &game.title,
            product_name: &game.title,
            meta_description: &description,
            canonical: Some(&canonical),
            content: &page,
            disclosure: &game.disclosure,
            site_url,
            tracking_id,
        });
        let path = out.join("spiel").join(&game.slug).join("index.html");
        write_output_file(&path, html.as_bytes()).await?;
        pages_written += 1;
        debug!(slug = %game.slug, trend = %indicator.trend, "game page written");

        if let Some(price) = pricing.min_price {
            lowest_prices.insert(game.slug.as_str(), price);
        }
        summaries.push(GameSummary {
            slug: game.slug.clone(),
            title: game.title.clone(),
            offers: pricing.offer_count,
            min_price: pricing.min_price,
            mean_price: pricing.mean_price,
            avg7: pricing.avg7,
            avg60: pricing.avg60,
            delta60: pricing.delta60,
            rating: pricing.rating.label(),
            trend: indicator.trend,
        });
    }

    let mut listing: Vec<ListingEntry<'_>> = loaded
        .games
        .iter()
        .map(|entry| ListingEntry {
            slug: entry.game.slug.as_str(),
            title: entry.game.short_title(),
            record: listing_record(&entry.game),
        })
        .collect();
    listing.sort_by_key(|entry| entry.title.to_lowercase());
    let listing_canonical = format!("{site_url}/{LISTING_PAGE}");
    let listing_html = render_layout(&LayoutContext {
        title: "Alle Brettspiel-Angebote",
        product_name: "Brettspiele",
        meta_description: "Aktuelle Angebote & Preisvergleich für Brettspiele.",
        canonical: Some(&listing_canonical),
        content: &render_listing_page(&listing),
        disclosure: "",
        site_url,
        tracking_id,
    });
    write_output_file(&out.join(LISTING_PAGE), listing_html.as_bytes()).await?;
    pages_written += 1;

    let mut deals: Vec<(&Game, f64)> = loaded
        .games
        .iter()
        .filter_map(|entry| {
            lowest_prices
                .get(entry.game.slug.as_str())
                .map(|price| (&entry.game, *price))
        })
        .collect();
    deals.sort_by(|a, b| a.1.total_cmp(&b.1));
    deals.truncate(TOP_DEALS);
    let home_canonical = format!("{site_url}/");
    let home_html = render_layout(&LayoutContext {
        title: "Brettspiel-Angebote & Preisvergleich",
        product_name: "Brettspiele",
        meta_description: "Brettspielpreisradar erklärt, wie du günstige Brettspiel-Angebote findest.",
        canonical: Some(&home_canonical),
        content: &render_home_page(loaded.games.len(), &deals),
        disclosure: "",
        site_url,
        tracking_id,
    });
    write_output_file(&out.join("index.html"), home_html.as_bytes()).await?;
    pages_written += 1;

    if !loaded.hubs.is_empty() {
        let hubs_html = render_layout(&LayoutContext {
            title: "Themen-Hubs",
            product_name: "Brettspiele",
            meta_description: "Themenübersichten zu Brettspielen.",
            canonical: None,
            content: &render_hubs_page(&loaded.hubs),
            disclosure: "",
            site_url,
            tracking_id,
        });
        write_output_file(&out.join(HUBS_PAGE), hubs_html.as_bytes()).await?;
        pages_written += 1;
    }

    let slugs: Vec<&str> = loaded
        .games
        .iter()
        .map(|entry| entry.game.slug.as_str())
        .collect();
    let sitemap = render_sitemap(site_url, &slugs, config.today);
    write_output_file(&out.join("sitemap.xml"), sitemap.as_bytes()).await?;

    info!(
        pages = pages_written,
        assets = assets_copied,
        output = %out.display(),
        "site build finished"
    );
    Ok(BuildReport {
        games: summaries,
        pages_written,
        assets_copied,
        output_dir: out.to_path_buf(),
    })
}

/// Copies `public/` into the output directory. A missing directory copies nothing.
fn copy_public(public: &Path, out: &Path) -> Result<usize> {
    if !public.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    let mut pending = vec![public.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to read entry in {}", dir.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let relative = path.strip_prefix(public).with_context(|| {
                format!("{} is outside {}", path.display(), public.display())
            })?;
            let target = out.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::copy(&path, &target)
                .with_context(|| format!("failed to copy {}", path.display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Removes a previous build. Refuses when the output directory is, or
/// contains, the site root, however either path is spelled.
pub async fn clean_output(config: &SiteConfig) -> Result<()> {
    let out = &config.output_dir;
    let resolved_out = match tokio::fs::canonicalize(out).await {
        Ok(path) => path,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to resolve {}", out.display()));
        }
    };
    let resolved_root = tokio::fs::canonicalize(&config.root)
        .await
        .with_context(|| format!("failed to resolve {}", config.root.display()))?;
    if resolved_root.starts_with(&resolved_out) {
        anyhow::bail!(
            "refusing to clean {}: it contains the site sources",
            out.display()
        );
    }
    match tokio::fs::remove_dir_all(&resolved_out).await {
        Ok(()) => {
            info!(output = %out.display(), "previous build removed");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to clean {}", out.display())),
    }
}
