use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::Writer;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tokio::fs;

use crate::formatting::format_amount;
use crate::site::GameSummary;

pub const DEFAULT_SUMMARY_PATH: &str = "data/output/price_summary.csv";

pub async fn write_output_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    slug: &'a str,
    title: &'a str,
    offers: usize,
    min_price: String,
    mean_price: String,
    avg7: String,
    avg60: String,
    delta60: String,
    rating: &'a str,
    trend: &'a str,
}

impl<'a> From<&'a GameSummary> for SummaryRow<'a> {
    fn from(summary: &'a GameSummary) -> Self {
        Self {
            slug: &summary.slug,
            title: &summary.title,
            offers: summary.offers,
            min_price: format_amount(summary.min_price),
            mean_price: format_amount(summary.mean_price),
            avg7: format_amount(summary.avg7),
            avg60: format_amount(summary.avg60),
            delta60: summary
                .delta60
                .map_or_else(|| "-".to_string(), |delta| format!("{delta:.1}")),
            rating: summary.rating,
            trend: summary.trend.as_str(),
        }
    }
}

pub fn serialize_summary(games: &[GameSummary]) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    for game in games {
        writer
            .serialize(SummaryRow::from(game))
            .with_context(|| format!("failed to serialize summary row for {}", game.slug))?;
    }
    finalize_writer(writer, "price summary writer")
}

fn finalize_writer(mut writer: Writer<Vec<u8>>, label: &str) -> Result<Vec<u8>> {
    writer
        .flush()
        .with_context(|| format!("failed to flush {label}"))?;
    writer
        .into_inner()
        .with_context(|| format!("failed to finalize {label}"))
}

pub fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .context("failed to compress CSV output")?;
    encoder.finish().context("failed to finish gzip stream")
}

/// `summary.csv` becomes `summary.csv.gz`.
pub fn archive_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Writes the per-game summary and returns the path actually written.
pub async fn save_summary_csv(games: &[GameSummary], path: &Path, archive: bool) -> Result<PathBuf> {
    let serialized = serialize_summary(games)?;
    if archive {
        let target = archive_path(path);
        write_output_file(&target, &gzip(&serialized)?).await?;
        Ok(target)
    } else {
        write_output_file(path, &serialized).await?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::TrendCategory;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn summary() -> GameSummary {
        GameSummary {
            slug: "catan".to_string(),
            title: "Catan".to_string(),
            offers: 3,
            min_price: Some(29.9),
            mean_price: Some(33.5),
            avg7: Some(31.0),
            avg60: None,
            delta60: Some(-4.3),
            rating: "ok",
            trend: TrendCategory::Good,
        }
    }

    #[test]
    fn summary_csv_has_header_and_formatted_amounts() {
        let bytes = serialize_summary(&[summary()]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("slug,title,offers,min_price,mean_price,avg7,avg60,delta60,rating,trend")
        );
        assert_eq!(lines.next(), Some("catan,Catan,3,29.90,33.50,31.00,-,-4.3,ok,good"));
    }

    #[test]
    fn gzip_round_trips() {
        let compressed = gzip(b"slug,title\n").unwrap();
        let mut decoded = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "slug,title\n");
    }

    #[tokio::test]
    async fn archived_summary_gets_gz_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary.csv");
        let written = save_summary_csv(&[summary()], &path, true).await.unwrap();
        assert_eq!(written, dir.path().join("out").join("summary.csv.gz"));
        assert!(written.exists());
        assert!(!path.exists());
    }
}
