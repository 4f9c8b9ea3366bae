use std::path::Path;

use chrono::{DateTime, Local};
use colored::Colorize;

use crate::formatting::{format_amount, format_trend};
use crate::indicator::{IndicatorResult, TrendCategory};
use crate::site::{BuildReport, GameSummary};

const COMPACT_ROWS: usize = 10;

pub struct SummaryContext<'a> {
    pub report: &'a BuildReport,
    pub run_started_at: &'a DateTime<Local>,
    pub summary_path: Option<&'a Path>,
    pub full_output: bool,
}

pub fn print_summary(context: &SummaryContext<'_>) {
    println!();
    print_summary_header(context);
    print_path_line(
        "Ausgabe",
        Some(context.report.output_dir.as_path()),
        "",
    );
    print_path_line(
        "Preis-CSV",
        context.summary_path,
        "nicht gespeichert (--save-summary)",
    );
    println!();
    println!("{}", "Preisübersicht".bold().bright_magenta());
    let table_width = print_game_table(&context.report.games, context.full_output);
    if table_width > 0 {
        println!("{}", "=".repeat(table_width).bright_cyan());
    }
}

fn print_summary_header(context: &SummaryContext<'_>) {
    println!(
        "{}",
        "==================== Preisradar Build ===================="
            .bold()
            .bright_cyan()
    );
    println!(
        "{} {}",
        "Gestartet".bright_yellow().bold(),
        context
            .run_started_at
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
            .bright_white()
    );
    let report = context.report;
    println!(
        "{} {} | {} | {}",
        "Umfang".bright_yellow().bold(),
        format!("Spiele: {}", report.games.len()).bright_white(),
        format!("Seiten: {}", report.pages_written).bright_white(),
        format!("Assets: {}", report.assets_copied).bright_white()
    );
}

fn print_path_line(label: &str, path: Option<&Path>, hint: &str) {
    let label_colored = label.bright_yellow().bold();
    match path {
        Some(path) => println!(
            "{} {}",
            label_colored,
            path.display().to_string().bright_white()
        ),
        None => println!("{} {}", label_colored, hint.bright_black()),
    }
}

fn print_game_table(games: &[GameSummary], full_output: bool) -> usize {
    if games.is_empty() {
        let message = "Keine Spiele gefunden.";
        println!("{}", message.bright_black());
        return message.chars().count();
    }

    let header = format!(
        "{:<24} | {:>6} | {:>8} | {:>8} | {:>8} | {:>7} | {:<11}",
        "Spiel", "Angeb.", "Min", "Ø 7T", "Ø 60T", "Δ 60T", "Bewertung"
    );
    let separator = "-------------------------+--------+----------+----------+----------+---------+------------";
    let mut max_width = header.chars().count().max(separator.len());
    println!("{}", header.bold().bright_white());
    println!("{}", separator.bright_black());

    let shown = if full_output { games.len() } else { COMPACT_ROWS };
    for game in games.iter().take(shown) {
        let line = format_game_row(game);
        max_width = max_width.max(line.chars().count());
        println!("{}", colorize_by_trend(&line, game.trend));
    }
    if games.len() > shown {
        let message = format!(
            "... {} weitere Spiele (--full-output zeigt alle).",
            games.len() - shown
        );
        max_width = max_width.max(message.chars().count());
        println!("{}", message.bright_black());
    }
    max_width
}

fn format_game_row(game: &GameSummary) -> String {
    let title: String = game.title.chars().take(24).collect();
    format!(
        "{:<24} | {:>6} | {:>8} | {:>8} | {:>8} | {:>7} | {:<11}",
        title,
        game.offers,
        format_amount(game.min_price),
        format_amount(game.avg7),
        format_amount(game.avg60),
        format_trend(game.delta60),
        game.rating
    )
}

fn colorize_by_trend(line: &str, trend: TrendCategory) -> colored::ColoredString {
    match trend {
        TrendCategory::Good => line.bright_green(),
        TrendCategory::Ok => line.yellow(),
        TrendCategory::High => line.bright_red(),
        TrendCategory::Unknown => line.bright_black(),
    }
}

/// Prints a single indicator computed from the command line.
pub fn print_indicator(result: &IndicatorResult) {
    let field = |label: &str, value: Option<&str>| {
        println!(
            "{:<10} {}",
            label.bright_yellow().bold(),
            value.unwrap_or("–").bright_white()
        );
    };
    field("Aktuell", result.current_text.as_deref());
    field("Ø 7 Tage", result.avg_text.as_deref());
    field("Tief", result.low_text.as_deref());
    field("Hoch", result.high_text.as_deref());
    field("Delta", Some(result.delta_label()));
    let gauge = result.gauge_label();
    field("Skala", gauge.as_deref());
    println!(
        "{:<10} {}",
        "Trend".bright_yellow().bold(),
        colorize_by_trend(result.trend.as_str(), result.trend)
    );
}
