//! Release timeline export
//!
//! `Index;Release ID;Release Name;Date`, one row per release in timeline
//! order, indices starting at 1.

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::timeline::ReleaseTimeline;

pub const RELEASE_CSV_DELIMITER: &str = ";";

const HEADER: [&str; 4] = ["Index", "Release ID", "Release Name", "Date"];

/// Render the timeline as delimited text
pub fn format_release_csv(timeline: &ReleaseTimeline) -> String {
    let mut csv_content = String::new();
    csv_content.push_str(&HEADER.join(RELEASE_CSV_DELIMITER));
    csv_content.push('\n');

    for (position, release) in timeline.all().iter().enumerate() {
        let row = [
            (position + 1).to_string(),
            escape_field(&release.id),
            escape_field(&release.name),
            release.release_date.format("%Y-%m-%d").to_string(),
        ];
        csv_content.push_str(&row.join(RELEASE_CSV_DELIMITER));
        csv_content.push('\n');
    }

    csv_content
}

/// Write the timeline export to `path`
pub fn write_release_csv(timeline: &ReleaseTimeline, path: &Path) -> Result<()> {
    std::fs::write(path, format_release_csv(timeline))
        .with_context(|| format!("Failed to write release info to {}", path.display()))?;
    info!("Wrote {} releases to {}", timeline.len(), path.display());
    Ok(())
}

fn escape_field(value: &str) -> String {
    if value.contains(RELEASE_CSV_DELIMITER) || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Release;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn timeline() -> ReleaseTimeline {
        let mut timeline = ReleaseTimeline::new();
        timeline.add(Release::new("12315", "4.1.0", NaiveDate::from_ymd_opt(2012, 6, 6).unwrap(), true));
        timeline.add(Release::new("12314", "4.0.0", NaiveDate::from_ymd_opt(2011, 12, 7).unwrap(), true));
        timeline
    }

    #[test]
    fn test_format_release_csv() {
        let csv = format_release_csv(&timeline());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Index;Release ID;Release Name;Date");
        assert_eq!(lines[1], "1;12314;4.0.0;2011-12-07");
        assert_eq!(lines[2], "2;12315;4.1.0;2012-06-06");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a;b"), "\"a;b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_release_csv() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("releases.csv");

        write_release_csv(&timeline(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Index;Release ID;Release Name;Date\n"));
    }

    #[test]
    fn test_write_release_csv_to_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("releases.csv");
        assert!(write_release_csv(&timeline(), &path).is_err());
    }
}
