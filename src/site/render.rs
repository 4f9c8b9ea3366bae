use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::consent::ConsentState;
use crate::filter::ListingRecord;
use crate::formatting::{
    CurrencyStyle, PLACEHOLDER, format_currency, format_optional_currency, format_trend,
};
use crate::indicator::{ATTR_AVG7, ATTR_CURRENT, ATTR_HISTORY, IndicatorResult};
use crate::site::content::{Game, Hub, Offer};
use crate::site::pricing::GamePricing;
use crate::ui::{
    AGE_SELECT, CONSENT_STATUS, PI_AVG, PI_BADGE, PI_CURRENT, PI_HIGH, PI_LOW, PI_MARKER,
    PLAYERS_SELECT, SEARCH_INPUT, THEME_SELECT,
};

pub const LISTING_PAGE: &str = "alle-spiele.html";
pub const HUBS_PAGE: &str = "hubs.html";
pub const MAX_OFFERS_SHOWN: usize = 8;

const PLAYER_OPTIONS: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
const AGE_OPTIONS: [u32; 7] = [6, 8, 10, 12, 14, 16, 18];
const SITE_NAME: &str = "Brettspielpreisradar";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub struct LayoutContext<'a> {
    pub(crate) title: &'a str,
    pub(crate) product_name: &'a str,
    pub(crate) meta_description: &'a str,
    pub(crate) canonical: Option<&'a str>,
    pub(crate) content: &'a str,
    pub(crate) disclosure: &'a str,
    pub(crate) site_url: &'a str,
    pub(crate) tracking_id: Option<&'a str>,
}

pub struct GamePageContext<'a> {
    pub(crate) game: &'a Game,
    pub(crate) offers: &'a [Offer],
    pub(crate) pricing: &'a GamePricing,
    pub(crate) indicator: &'a IndicatorResult,
    pub(crate) search_url: &'a str,
}

pub struct ListingEntry<'a> {
    pub(crate) slug: &'a str,
    pub(crate) title: &'a str,
    pub(crate) record: ListingRecord,
}

pub fn render_layout(context: &LayoutContext<'_>) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<!doctype html>\n<html lang=\"de\" class=\"{}\">\n<head>\n",
        ConsentState::Unset.root_class()
    ));
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{} | {SITE_NAME}</title>\n",
        escape_html(context.title)
    ));
    html.push_str(&format!(
        "<meta name=\"description\" content=\"{}\">\n",
        escape_html(context.meta_description)
    ));
    if let Some(canonical) = context.canonical {
        html.push_str(&format!(
            "<link rel=\"canonical\" href=\"{}\">\n",
            escape_html(canonical)
        ));
    }
    html.push_str(&format!(
        "<meta property=\"og:title\" content=\"{}\">\n",
        escape_html(context.product_name)
    ));
    html.push_str("<link rel=\"stylesheet\" href=\"/style.css\">\n");
    if let Some(id) = context.tracking_id {
        html.push_str(&format!(
            "<script>window.GA_TRACKING_ID = \"{}\";</script>\n",
            escape_html(id)
        ));
    }
    html.push_str("<script src=\"/main.js\" defer></script>\n");
    html.push_str("</head>\n<body>\n");

    html.push_str("<header class=\"site-header\">\n");
    html.push_str(&format!(
        "<a class=\"brand\" href=\"{}/\">{SITE_NAME}</a>\n",
        escape_html(context.site_url)
    ));
    html.push_str("<button id=\"nav-toggle\" aria-expanded=\"false\" aria-controls=\"main-nav\">Menü</button>\n");
    html.push_str("<nav id=\"main-nav\">\n");
    html.push_str(&format!("<a href=\"/{LISTING_PAGE}\">Alle Spiele</a>\n"));
    html.push_str(&format!("<a href=\"/{HUBS_PAGE}\">Themen</a>\n"));
    html.push_str("</nav>\n</header>\n");

    html.push_str("<main class=\"page\">\n");
    html.push_str(context.content);
    html.push_str("</main>\n");

    html.push_str("<footer class=\"footer\">\n");
    if !context.disclosure.is_empty() {
        html.push_str(&format!(
            "<p class=\"disclosure\">{}</p>\n",
            escape_html(context.disclosure)
        ));
    }
    html.push_str("<p>Preise inkl. MwSt., ggf. zzgl. Versand. Angaben ohne Gewähr.</p>\n");
    html.push_str("<button id=\"settings-accept\">Statistik erlauben</button>\n");
    html.push_str("<button id=\"settings-decline\">Statistik ablehnen</button>\n");
    html.push_str(&format!(
        "<p id=\"{CONSENT_STATUS}\" role=\"status\" hidden></p>\n"
    ));
    html.push_str("</footer>\n");

    html.push_str("<div id=\"cookie-banner\" class=\"cookie-banner\">\n");
    html.push_str("<p>Wir nutzen Cookies nur für anonyme Statistik, wenn du zustimmst.</p>\n");
    html.push_str("<button id=\"cookie-accept\">Zustimmen</button>\n");
    html.push_str("<button id=\"cookie-decline\">Ablehnen</button>\n");
    html.push_str("</div>\n");
    html.push_str("</body>\n</html>\n");
    html
}

pub fn render_game_page(context: &GamePageContext<'_>) -> String {
    let game = context.game;
    let pricing = context.pricing;
    let style = CurrencyStyle::Localized;

    let mut html = String::new();
    html.push_str("<article class=\"game\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&game.title)));
    if let Some(description) = &game.description {
        html.push_str(&format!(
            "<p class=\"lead\">{}</p>\n",
            escape_html(description)
        ));
    }
    html.push_str(&format!(
        "<p class=\"rating {}\">Preisbewertung: <strong>{}</strong> (Ø {})</p>\n",
        pricing.rating.css_class(),
        escape_html(pricing.rating.label()),
        format_optional_currency(pricing.mean_price, style)
    ));

    html.push_str(&render_indicator_block(pricing, context.indicator));

    html.push_str("<section class=\"averages\">\n<h2>Preisverlauf</h2>\n<dl>\n");
    for (label, value) in [
        ("Ø 30 Tage", pricing.avg30),
        ("Ø 60 Tage", pricing.avg60),
        ("Ø 90 Tage", pricing.avg90),
    ] {
        html.push_str(&format!(
            "<dt>{label}</dt><dd>{}</dd>\n",
            format_optional_currency(value, style)
        ));
    }
    html.push_str(&format!(
        "<dt>Aktuell vs. Ø 60 Tage</dt><dd>{}</dd>\n",
        format_trend(pricing.delta60)
    ));
    html.push_str("</dl>\n</section>\n");

    html.push_str(&render_offers(context.offers));
    html.push_str(&format!(
        "<p class=\"more\"><a href=\"{}\" rel=\"sponsored nofollow noopener\" target=\"_blank\">Weitere Angebote auf eBay</a></p>\n",
        escape_html(context.search_url)
    ));
    html.push_str("</article>\n");
    html
}

fn render_indicator_block(pricing: &GamePricing, indicator: &IndicatorResult) -> String {
    let sample = &pricing.sample;
    let history = serde_json::to_string(&sample.history).unwrap_or_else(|_| "[]".to_string());
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map_or_else(|| PLACEHOLDER.to_string(), escape_html)
    };
    let color = indicator.trend.color();
    let left = indicator
        .gauge_label()
        .unwrap_or_else(|| "0%".to_string());
    let empty = if indicator.gauge_percent.is_none() {
        " empty"
    } else {
        ""
    };

    let mut block = String::new();
    block.push_str(&format!(
        "<section class=\"pi\" id=\"price-indicator\" {ATTR_CURRENT}=\"{}\" {ATTR_AVG7}=\"{}\" {ATTR_HISTORY}=\"{}\" data-trend=\"{}\">\n",
        attr_number(sample.current),
        attr_number(sample.seven_day_average),
        escape_html(&history),
        indicator.trend
    ));
    block.push_str("<h2>Preisindikator</h2>\n");
    block.push_str(&format!(
        "<p>Aktuell <strong id=\"{PI_CURRENT}\">{}</strong> · Ø 7 Tage <span id=\"{PI_AVG}\">{}</span></p>\n",
        text(&indicator.current_text),
        text(&indicator.avg_text)
    ));
    block.push_str(&format!(
        "<span id=\"{PI_BADGE}\" class=\"badge {color}\">{}</span>\n",
        escape_html(indicator.delta_label())
    ));
    block.push_str("<div class=\"gauge\">\n");
    block.push_str(&format!(
        "<span id=\"{PI_LOW}\" class=\"gauge-low\">{}</span>\n",
        text(&indicator.low_text)
    ));
    block.push_str(&format!(
        "<div class=\"gauge-track\"><span id=\"{PI_MARKER}\" class=\"marker {color}{empty}\" style=\"left:{left}\"></span></div>\n"
    ));
    block.push_str(&format!(
        "<span id=\"{PI_HIGH}\" class=\"gauge-high\">{}</span>\n",
        text(&indicator.high_text)
    ));
    block.push_str("</div>\n</section>\n");
    block
}

fn render_offers(offers: &[Offer]) -> String {
    let style = CurrencyStyle::Localized;
    let mut section = String::new();
    section.push_str("<section class=\"offers\">\n<h2>Aktuelle Angebote</h2>\n");
    if offers.is_empty() {
        section.push_str("<p class=\"muted\">Zurzeit keine Angebote gefunden.</p>\n</section>\n");
        return section;
    }
    section.push_str("<table>\n<thead><tr><th>Angebot</th><th>Zustand</th><th>Preis</th><th>Versand</th><th>Gesamt</th><th></th></tr></thead>\n<tbody>\n");
    for offer in offers.iter().take(MAX_OFFERS_SHOWN) {
        section.push_str("<tr>");
        section.push_str(&format!("<td>{}</td>", escape_html(&offer.title)));
        section.push_str(&format!(
            "<td>{}</td>",
            escape_html(offer.condition.as_deref().unwrap_or(PLACEHOLDER))
        ));
        section.push_str(&format!(
            "<td class=\"num\">{}</td>",
            format_optional_currency(offer.price_eur, style)
        ));
        section.push_str(&format!(
            "<td class=\"num\">{}</td>",
            format_optional_currency(offer.shipping_eur, style)
        ));
        section.push_str(&format!(
            "<td class=\"num\">{}</td>",
            format_optional_currency(offer.total_eur, style)
        ));
        match &offer.url {
            Some(url) => section.push_str(&format!(
                "<td><a href=\"{}\" rel=\"sponsored nofollow noopener\" target=\"_blank\">{}</a></td>",
                escape_html(url),
                escape_html(offer.shop.as_deref().unwrap_or("Zum Angebot"))
            )),
            None => section.push_str("<td></td>"),
        }
        section.push_str("</tr>\n");
    }
    section.push_str("</tbody>\n</table>\n</section>\n");
    section
}

pub fn render_listing_page(entries: &[ListingEntry<'_>]) -> String {
    let themes: BTreeSet<&str> = entries
        .iter()
        .flat_map(|entry| entry.record.themes.iter().map(String::as_str))
        .collect();

    let mut html = String::new();
    html.push_str("<h1>Alle Brettspiel-Angebote</h1>\n");
    html.push_str("<form class=\"filters\" role=\"search\" onsubmit=\"return false\">\n");
    html.push_str(&format!(
        "<input id=\"{SEARCH_INPUT}\" type=\"search\" placeholder=\"Spiel suchen…\" autocomplete=\"off\">\n"
    ));
    html.push_str(&format!(
        "<select id=\"{PLAYERS_SELECT}\"><option value=\"\">Spieler</option>"
    ));
    for count in PLAYER_OPTIONS {
        html.push_str(&format!("<option value=\"{count}\">{count}</option>"));
    }
    html.push_str("</select>\n");
    html.push_str(&format!(
        "<select id=\"{AGE_SELECT}\"><option value=\"\">Alter</option>"
    ));
    for age in AGE_OPTIONS {
        html.push_str(&format!("<option value=\"{age}\">ab {age}</option>"));
    }
    html.push_str("</select>\n");
    html.push_str(&format!(
        "<select id=\"{THEME_SELECT}\"><option value=\"\">Thema</option>"
    ));
    for theme in &themes {
        let escaped = escape_html(theme);
        html.push_str(&format!("<option value=\"{escaped}\">{escaped}</option>"));
    }
    html.push_str("</select>\n</form>\n");

    html.push_str("<ul class=\"game-list\" data-list>\n");
    for entry in entries {
        html.push_str(&format!("<li id=\"{}\"", escape_html(&item_target(entry.slug))));
        for (name, value) in entry.record.attributes() {
            html.push_str(&format!(" {name}=\"{}\"", escape_html(&value)));
        }
        html.push_str(&format!(
            "><a href=\"/spiel/{}/\">{}</a></li>\n",
            escape_html(entry.slug),
            escape_html(entry.title)
        ));
    }
    html.push_str("</ul>\n");
    html
}

/// Element id of a game's list entry.
pub fn item_target(slug: &str) -> String {
    format!("game-{slug}")
}

pub fn render_hubs_page(hubs: &[Hub]) -> String {
    let mut html = String::new();
    html.push_str("<h1>Themen-Hubs</h1>\n<div class=\"grid two\">\n");
    for hub in hubs {
        html.push_str("<div class=\"card\">\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&hub.title)));
        if let Some(description) = &hub.description {
            html.push_str(&format!("<p>{}</p>\n", escape_html(description)));
        }
        html.push_str("<ul>\n");
        for slug in &hub.slugs {
            let escaped = escape_html(slug);
            html.push_str(&format!(
                "<li><a href=\"/spiel/{escaped}/\">{escaped}</a></li>\n"
            ));
        }
        html.push_str("</ul>\n</div>\n");
    }
    html.push_str("</div>\n");
    html
}

pub fn render_home_page(game_count: usize, deals: &[(&Game, f64)]) -> String {
    let mut html = String::new();
    html.push_str("<section class=\"hero\">\n");
    html.push_str("<h1>Brettspiel-Angebote &amp; Preisvergleich</h1>\n");
    html.push_str(&format!(
        "<p class=\"lead\">Wir beobachten die Preise von {game_count} Brettspielen und zeigen, ob sich der Kauf gerade lohnt.</p>\n"
    ));
    html.push_str(&format!(
        "<p><a class=\"button\" href=\"/{LISTING_PAGE}\">Alle Spiele ansehen</a></p>\n"
    ));
    html.push_str("</section>\n");
    if !deals.is_empty() {
        html.push_str("<section class=\"deals\">\n<h2>Top-Deals</h2>\n<ul>\n");
        for (game, price) in deals {
            html.push_str(&format!(
                "<li><a href=\"/spiel/{}/\">{}</a> ab {}</li>\n",
                escape_html(&game.slug),
                escape_html(game.short_title()),
                format_currency(*price, CurrencyStyle::Localized)
            ));
        }
        html.push_str("</ul>\n</section>\n");
    }
    html
}

pub fn render_sitemap(site_url: &str, slugs: &[&str], last_modified: NaiveDate) -> String {
    let mut locations = vec![
        format!("{site_url}/"),
        format!("{site_url}/{LISTING_PAGE}"),
        format!("{site_url}/{HUBS_PAGE}"),
    ];
    locations.extend(slugs.iter().map(|slug| format!("{site_url}/spiel/{slug}/")));

    let mut xml = String::new();
    xml.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));
    for loc in locations {
        xml.push_str(&format!(
            "<url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
            escape_html(&loc),
            last_modified.format("%Y-%m-%d")
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

fn attr_number(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{v:.2}"))
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
