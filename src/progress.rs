use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICKS_BRAILLE: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";
const TICKS_ASCII: &str = "|/-\\ ";

/// Steps of `preisradar build`, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Render,
    Export,
}

impl Stage {
    pub const ALL: [Self; 3] = [Self::Load, Self::Render, Self::Export];

    const fn position(self) -> usize {
        match self {
            Self::Load => 1,
            Self::Render => 2,
            Self::Export => 3,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Load => "Inhalte laden",
            Self::Render => "Seiten erzeugen",
            Self::Export => "Preis-CSV speichern",
        }
    }

    fn heading(self) -> String {
        let counter = format!("[{}/{}]", self.position(), Self::ALL.len());
        format!(
            "{} {}",
            counter.bright_yellow().bold(),
            self.label().bright_cyan().bold()
        )
    }

    /// Awaits `fut` behind a spinner for this stage. Without a progress
    /// display the future runs as is. On success the spinner is replaced by
    /// what the stage produced.
    pub async fn run<T: StageOutcome>(
        self,
        progress: Option<&ProgressState>,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let Some(progress) = progress else {
            return fut.await;
        };
        let bar = progress.spinner(self.heading());
        let result = fut.await;
        bar.finish_with_message(finish_message(self, &result));
        result
    }
}

/// Short account of a finished stage, shown next to its heading.
pub trait StageOutcome {
    fn describe(&self) -> String;
}

impl StageOutcome for PathBuf {
    fn describe(&self) -> String {
        self.display().to_string()
    }
}

fn finish_message<T: StageOutcome>(stage: Stage, result: &Result<T>) -> String {
    let status = match result {
        Ok(outcome) => outcome.describe().bright_green().to_string(),
        Err(_) => "fehlgeschlagen".bright_red().bold().to_string(),
    };
    format!("{}: {status}", stage.heading())
}

pub struct ProgressState {
    multi: MultiProgress,
    style: ProgressStyle,
}

impl ProgressState {
    pub fn new(use_color: bool) -> Self {
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(15));
        let template = if use_color {
            "{spinner:.cyan.bold} {msg}"
        } else {
            "{spinner} {msg}"
        };
        let ticks = if is_dumb_term() { TICKS_ASCII } else { TICKS_BRAILLE };
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(ticks);
        Self { multi, style }
    }

    fn spinner(&self, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(self.style.clone());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }

    pub fn clear(&self) {
        let _ = self.multi.clear();
    }
}

fn is_dumb_term() -> bool {
    std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pages(usize);

    impl StageOutcome for Pages {
        fn describe(&self) -> String {
            format!("{} Seiten", self.0)
        }
    }

    #[test]
    fn heading_counts_every_stage() {
        let heading = Stage::Render.heading();
        assert!(heading.contains("[2/3]"));
        assert!(heading.contains("Seiten erzeugen"));
        assert!(Stage::Export.heading().contains("[3/3]"));
    }

    #[test]
    fn finish_message_reports_the_outcome() {
        let done = finish_message(Stage::Export, &Ok(PathBuf::from("data/output/prices.csv")));
        assert!(done.contains("Preis-CSV speichern"));
        assert!(done.contains("data/output/prices.csv"));

        let failed = finish_message::<Pages>(Stage::Render, &Err(anyhow::anyhow!("disk full")));
        assert!(failed.contains("fehlgeschlagen"));
    }

    #[tokio::test]
    async fn run_passes_results_through_with_and_without_display() {
        let bare = Stage::Load.run(None, async { Ok(Pages(3)) }).await.unwrap();
        assert_eq!(bare.0, 3);

        let progress = ProgressState::new(false);
        let shown = Stage::Render
            .run(Some(&progress), async { Ok(Pages(7)) })
            .await
            .unwrap();
        let failed: Result<PathBuf> = Stage::Export
            .run(Some(&progress), async { Err(anyhow::anyhow!("nope")) })
            .await;
        progress.clear();
        assert_eq!(shown.0, 7);
        assert!(failed.is_err());
    }
}
