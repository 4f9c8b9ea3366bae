use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use preisradar::cli::{BuildArgs, Cli, Commands, IndicatorArgs, gauge_scale, handle_completions};
use preisradar::consent::AnalyticsConfig;
use preisradar::formatting::CurrencyStyle;
use preisradar::indicator::{IndicatorOptions, PriceSample, compute_indicator_with, parse_history};
use preisradar::numeric::parse_money;
use preisradar::output::save_summary_csv;
use preisradar::progress::{ProgressState, Stage};
use preisradar::site::{AffiliateConfig, SiteConfig, build_site, clean_output};
use preisradar::summary::{SummaryContext, print_indicator, print_summary};

#[tokio::main]
async fn main() -> Result<()> {
    colored::control::set_override(true);
    init_tracing();

    match Cli::parse().command {
        Commands::Build(args) => run_build(args).await,
        Commands::Indicator(args) => run_indicator(&args),
        Commands::Completions {
            shell,
            output_dir,
            install,
        } => handle_completions(shell, output_dir, install),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn run_build(args: BuildArgs) -> Result<()> {
    let run_started_at = Local::now();
    let config = SiteConfig {
        root: args.root,
        output_dir: args.out,
        site_url: args.site_url,
        today: args.today.unwrap_or_else(|| run_started_at.date_naive()),
        analytics: AnalyticsConfig {
            tracking_id: args.tracking_id.filter(|id| !id.trim().is_empty()),
        },
        affiliate: AffiliateConfig {
            campaign_id: args.campaign_id,
            reference_id: args.reference_id,
        },
        indicator: IndicatorOptions {
            currency: CurrencyStyle::Localized,
            gauge: gauge_scale(args.gauge_window)?,
        },
    };
    debug!(?config, "build configuration");

    if args.clean {
        clean_output(&config).await?;
    }

    let progress = (!args.no_progress).then(|| ProgressState::new(true));
    let report = build_site(&config, progress.as_ref()).await?;

    let summary_path = match args.save_summary.as_deref() {
        Some(path) => {
            let save = save_summary_csv(&report.games, path, args.archive_csv);
            Some(Stage::Export.run(progress.as_ref(), save).await?)
        }
        None => None,
    };
    if let Some(progress) = progress.as_ref() {
        progress.clear();
    }

    print_summary(&SummaryContext {
        report: &report,
        run_started_at: &run_started_at,
        summary_path: summary_path.as_deref(),
        full_output: args.full_output,
    });
    Ok(())
}

fn run_indicator(args: &IndicatorArgs) -> Result<()> {
    let history = args.history.as_deref().map(parse_history).unwrap_or_default();
    let sample = PriceSample::new(
        args.current.as_deref().and_then(parse_money),
        args.avg7.as_deref().and_then(parse_money),
    )
    .with_history(history);
    let options = IndicatorOptions {
        currency: if args.plain {
            CurrencyStyle::Plain
        } else {
            CurrencyStyle::Localized
        },
        gauge: gauge_scale(args.gauge_window)?,
    };
    let result = compute_indicator_with(&sample, &options);

    if args.json {
        let json =
            serde_json::to_string_pretty(&result).context("failed to serialize indicator")?;
        println!("{json}");
    } else {
        print_indicator(&result);
    }
    Ok(())
}
