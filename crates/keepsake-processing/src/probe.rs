//! Technical metadata probe.
//!
//! exiftool is asked for exactly five tag values in tab-separated form:
//! GPS latitude, GPS longitude, width, height and duration. `-n` keeps the
//! values numeric and `-T` prints `-` for a tag the file does not carry.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;

const ABSENT: &str = "-";
const FIELD_COUNT: usize = 5;

/// Parsed probe answer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Whole seconds, rounded up.
    pub duration_secs: Option<i32>,
}

#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeReport>;
}

pub struct ExifToolProbe {
    exiftool_path: PathBuf,
    timeout: Duration,
}

impl ExifToolProbe {
    pub fn new(exiftool_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            exiftool_path: exiftool_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MetadataProbe for ExifToolProbe {
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<ProbeReport> {
        let output = ToolCommand::new(&self.exiftool_path)
            .args([
                "-n",
                "-T",
                "-GPSLatitude",
                "-GPSLongitude",
                "-ImageWidth",
                "-ImageHeight",
                "-Duration",
            ])
            .arg(path.to_string_lossy())
            .timeout(self.timeout)
            .execute()
            .await?;

        parse_probe_line(&output.stdout).context("Failed to parse exiftool output")
    }
}

/// Parse the single tab-separated probe line.
pub fn parse_probe_line(output: &str) -> Result<ProbeReport> {
    let line = output
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| anyhow!("empty probe output"))?;

    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() != FIELD_COUNT {
        return Err(anyhow!(
            "expected {} fields, got {}: {:?}",
            FIELD_COUNT,
            fields.len(),
            line
        ));
    }

    Ok(ProbeReport {
        latitude: number(fields[0], "GPSLatitude")?,
        longitude: number(fields[1], "GPSLongitude")?,
        width: number(fields[2], "ImageWidth")?.map(|w| w.round() as i32),
        height: number(fields[3], "ImageHeight")?.map(|h| h.round() as i32),
        duration_secs: number(fields[4], "Duration")?.map(|d| d.ceil() as i32),
    })
}

fn number(field: &str, tag: &str) -> Result<Option<f64>> {
    let field = field.trim();
    if field.is_empty() || field == ABSENT {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("invalid {} value {:?}", tag, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let report = parse_probe_line("48.8584\t2.2945\t1920\t1080\t12.2\n").unwrap();
        assert_eq!(report.latitude, Some(48.8584));
        assert_eq!(report.longitude, Some(2.2945));
        assert_eq!(report.width, Some(1920));
        assert_eq!(report.height, Some(1080));
        assert_eq!(report.duration_secs, Some(13));
    }

    #[test]
    fn sentinel_means_absent() {
        let report = parse_probe_line("-\t-\t640\t480\t-").unwrap();
        assert_eq!(report.latitude, None);
        assert_eq!(report.longitude, None);
        assert_eq!(report.width, Some(640));
        assert_eq!(report.duration_secs, None);
    }

    #[test]
    fn whole_duration_is_not_rounded_up() {
        let report = parse_probe_line("-\t-\t-\t-\t7").unwrap();
        assert_eq!(report.duration_secs, Some(7));
    }

    #[test]
    fn wrong_field_count_is_an_error() {
        assert!(parse_probe_line("1\t2\t3\t4").is_err());
        assert!(parse_probe_line("1\t2\t3\t4\t5\t6").is_err());
        assert!(parse_probe_line("").is_err());
    }

    #[test]
    fn garbage_value_is_an_error() {
        assert!(parse_probe_line("north\t-\t-\t-\t-").is_err());
    }
}
