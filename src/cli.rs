use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate, generate_to};
use tracing::info;

use crate::indicator::GaugeScale;
use crate::output::DEFAULT_SUMMARY_PATH;

pub const DEFAULT_ROOT: &str = ".";
pub const DEFAULT_OUT_DIR: &str = "dist";
pub const DEFAULT_SITE_URL: &str = "https://brettspielpreisradar.de";

pub const SAVE_SUMMARY_HELP: &str = "Save the per-game price summary to the given CSV file (defaults to data/output/price_summary.csv when no path is provided). Use --archive-csv to store a .gz instead.";
pub const ARCHIVE_CSV_HELP: &str = "Archive the saved CSV summary into a .gz file.";

#[derive(Debug, Parser)]
#[command(
    name = "preisradar",
    about = "Build the board-game deal site and evaluate price indicators.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ROOT, help = "Site checkout containing content/, data/ and public/.")]
    pub root: PathBuf,
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_DIR, help = "Directory the site is written to.")]
    pub out: PathBuf,
    #[arg(long, env = "SITE_URL", default_value = DEFAULT_SITE_URL, help = "Public base URL used for canonical links and the sitemap.")]
    pub site_url: String,
    #[arg(long, env = "GA_TRACKING_ID", help = "Analytics measurement id; analytics stay off when unset.")]
    pub tracking_id: Option<String>,
    #[arg(long, env = "EPN_CAMPAIGN_ID", help = "eBay Partner Network campaign id for search links.")]
    pub campaign_id: Option<String>,
    #[arg(long, env = "EPN_REFERENCE_ID", help = "Custom reference prefix for search links.")]
    pub reference_id: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Build date for the rolling averages (defaults to today).")]
    pub today: Option<NaiveDate>,
    #[arg(long, value_name = "PERCENT", help = "Center the gauge on the average, reaching either end at this delta.")]
    pub gauge_window: Option<f64>,
    #[arg(long, help = "Remove the output directory before building.")]
    pub clean: bool,
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_SUMMARY_PATH,
        help = SAVE_SUMMARY_HELP
    )]
    pub save_summary: Option<PathBuf>,
    #[arg(long, help = ARCHIVE_CSV_HELP)]
    pub archive_csv: bool,
    #[arg(long, help = "Print every game in the summary table.")]
    pub full_output: bool,
    #[arg(long, help = "Disable progress spinner output.")]
    pub no_progress: bool,
}

#[derive(Debug, Args)]
pub struct IndicatorArgs {
    #[arg(long, help = "Current price in EUR (\"44,90\" and \"44.90\" both work).")]
    pub current: Option<String>,
    #[arg(long, help = "Seven-day average price in EUR.")]
    pub avg7: Option<String>,
    #[arg(long, help = "JSON array of {min, avg} history points.")]
    pub history: Option<String>,
    #[arg(long, help = "Use the plain currency format (\"1234,56 €\").")]
    pub plain: bool,
    #[arg(long, value_name = "PERCENT", help = "Center the gauge on the average, reaching either end at this delta.")]
    pub gauge_window: Option<f64>,
    #[arg(long, help = "Print the result as JSON.")]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the static site from content and price data.
    Build(BuildArgs),
    /// Compute the price indicator for the given values.
    Indicator(IndicatorArgs),
    /// Generate shell completion scripts, optionally installing them for the current user.
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for.")]
        shell: Shell,
        #[arg(
            long,
            value_name = "DIR",
            help = "Directory to write the completion script to."
        )]
        output_dir: Option<PathBuf>,
        #[arg(
            long,
            help = "Install the completion script into the default location for the selected shell."
        )]
        install: bool,
    },
}

pub fn gauge_scale(window: Option<f64>) -> Result<GaugeScale> {
    match window {
        None => Ok(GaugeScale::Range),
        Some(half_width) if half_width.is_finite() && half_width > 0.0 => {
            Ok(GaugeScale::FixedWindow { half_width })
        }
        Some(other) => Err(anyhow!("--gauge-window must be a positive number, got {other}")),
    }
}

/// Per-user completion directories, relative to `$HOME`. PowerShell has no
/// such directory and needs `--output-dir`.
const COMPLETION_DIRS: [(Shell, &str); 4] = [
    (Shell::Bash, ".local/share/bash-completion/completions"),
    (Shell::Zsh, ".local/share/zsh/site-functions"),
    (Shell::Fish, ".config/fish/completions"),
    (Shell::Elvish, ".config/elvish/lib/completions"),
];

/// Where `preisradar completions` sends the script.
#[derive(Debug, PartialEq, Eq)]
pub enum CompletionTarget {
    Stdout,
    Dir(PathBuf),
}

impl CompletionTarget {
    /// An explicit `--output-dir` wins over `--install`.
    pub fn resolve(
        shell: Shell,
        output_dir: Option<PathBuf>,
        install: bool,
        home: Option<&Path>,
    ) -> Result<Self> {
        if let Some(dir) = output_dir {
            return Ok(Self::Dir(dir));
        }
        if !install {
            return Ok(Self::Stdout);
        }
        let home = home.ok_or_else(|| {
            anyhow!("HOME is not set; pass --output-dir to choose where completions go")
        })?;
        COMPLETION_DIRS
            .iter()
            .find(|(candidate, _)| *candidate == shell)
            .map(|(_, relative)| Self::Dir(home.join(relative)))
            .ok_or_else(|| anyhow!("{shell} has no per-user completion directory; pass --output-dir"))
    }
}

pub fn handle_completions(shell: Shell, output_dir: Option<PathBuf>, install: bool) -> Result<()> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match CompletionTarget::resolve(shell, output_dir, install, home.as_deref())? {
        CompletionTarget::Stdout => {
            let mut stdout = io::stdout().lock();
            write_completions(shell, &mut stdout);
            stdout.flush().context("failed to flush completion output")
        }
        CompletionTarget::Dir(dir) => {
            let path = install_completions(shell, &dir)?;
            info!(%shell, path = %path.display(), "completions written");
            Ok(())
        }
    }
}

pub fn write_completions(shell: Shell, out: &mut impl Write) {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    generate(shell, &mut command, bin_name, out);
}

/// Writes the script for `shell` into `dir`, creating it first.
pub fn install_completions(shell: Shell, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create completion directory {}", dir.display()))?;
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    generate_to(shell, &mut command, bin_name, dir)
        .with_context(|| format!("failed to write {shell} completions to {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_defaults_and_bare_save_summary() {
        let cli = Cli::try_parse_from(["preisradar", "build", "--save-summary", "--today", "2025-08-23"]).unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.out, PathBuf::from(DEFAULT_OUT_DIR));
        assert_eq!(args.save_summary, Some(PathBuf::from(DEFAULT_SUMMARY_PATH)));
        assert_eq!(args.today, NaiveDate::from_ymd_opt(2025, 8, 23));
    }

    #[test]
    fn gauge_window_must_be_positive() {
        assert_eq!(gauge_scale(None).unwrap(), GaugeScale::Range);
        assert_eq!(
            gauge_scale(Some(10.0)).unwrap(),
            GaugeScale::FixedWindow { half_width: 10.0 }
        );
        assert!(gauge_scale(Some(0.0)).is_err());
    }

    #[test]
    fn completion_target_prefers_output_dir_then_install() {
        let home = Path::new("/home/spieler");
        assert_eq!(
            CompletionTarget::resolve(Shell::Zsh, None, false, Some(home)).unwrap(),
            CompletionTarget::Stdout
        );
        assert_eq!(
            CompletionTarget::resolve(Shell::Zsh, None, true, Some(home)).unwrap(),
            CompletionTarget::Dir(home.join(".local/share/zsh/site-functions"))
        );
        assert_eq!(
            CompletionTarget::resolve(Shell::Fish, Some(PathBuf::from("out")), true, None).unwrap(),
            CompletionTarget::Dir(PathBuf::from("out"))
        );
        assert!(CompletionTarget::resolve(Shell::Bash, None, true, None).is_err());
        assert!(CompletionTarget::resolve(Shell::PowerShell, None, true, Some(home)).is_err());
    }

    #[test]
    fn completions_name_the_subcommands() {
        let mut script = Vec::new();
        write_completions(Shell::Bash, &mut script);
        let script = String::from_utf8(script).unwrap();
        assert!(script.contains("preisradar"));
        assert!(script.contains("indicator"));

        let dir = tempfile::tempdir().unwrap();
        let path = install_completions(Shell::Fish, &dir.path().join("fish")).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(fs::read_to_string(path).unwrap().contains("gauge-window"));
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
