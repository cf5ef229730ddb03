use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

use anyhow::Result;

/// How many prior reports the sidebar surfaces.
pub const RECENT_LIMIT: usize = 5;

/// Shown when a run finished but the report artifact is not on disk.
pub const MISSING_REPORT_PLACEHOLDER: &str = "Report generated but file not found.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportEntry {
    pub name: String,
    pub stem: String,
}

/// The newest `limit` archived reports, modification time descending with
/// name as tiebreak. Directory listing order alone is not chronological.
/// A missing or unreadable directory is just an empty sidebar.
pub fn list_recent(dir: &Path, limit: usize) -> Vec<ReportEntry> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut reports: Vec<(SystemTime, String)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                return None;
            }
            let name = path.file_name()?.to_str()?.to_string();
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, name))
        })
        .collect();

    reports.sort_by(|a, b| b.cmp(a));
    reports.truncate(limit);
    reports
        .into_iter()
        .map(|(_, name)| ReportEntry {
            stem: name.trim_end_matches(".txt").to_string(),
            name,
        })
        .collect()
}

/// Read one archived report by file name. Names come back from the listing
/// endpoint, but they still travel through the client, so path traversal is
/// rejected here.
pub fn read_report(dir: &Path, name: &str) -> Result<String> {
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        anyhow::bail!("invalid report name: {name}");
    }
    if !name.ends_with(".txt") {
        anyhow::bail!("not a report file: {name}");
    }
    std::fs::read_to_string(dir.join(name))
        .map_err(|e| anyhow::anyhow!("could not read report {name}: {e}"))
}

/// The fixed-path artifact written by the research manager, read after each
/// run. Absence is not an error, just the placeholder.
pub async fn read_latest(report_file: &Path) -> String {
    match tokio::fs::read_to_string(report_file).await {
        Ok(contents) => contents,
        Err(_) => MISSING_REPORT_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn listing_caps_at_limit_and_skips_non_reports() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..7 {
            fs::write(dir.path().join(format!("financial_report_{i}.txt")), "r").unwrap();
        }
        fs::write(dir.path().join("notes.md"), "n").unwrap();

        let reports = list_recent(dir.path(), RECENT_LIMIT);
        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|r| r.name.ends_with(".txt")));
    }

    #[test]
    fn listing_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("older.txt"), "a").unwrap();
        sleep(Duration::from_millis(50));
        fs::write(dir.path().join("newer.txt"), "b").unwrap();

        let reports = list_recent(dir.path(), RECENT_LIMIT);
        assert_eq!(reports[0].name, "newer.txt");
        assert_eq!(reports[1].name, "older.txt");
        assert_eq!(reports[0].stem, "newer");
    }

    #[test]
    fn entries_parse_back_from_the_listing_json() {
        let entry = ReportEntry {
            name: "financial_report_1.txt".into(),
            stem: "financial_report_1".into(),
        };
        let json = serde_json::to_string(&vec![entry.clone()]).unwrap();
        let parsed: Vec<ReportEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![entry]);
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let reports = list_recent(Path::new("/nonexistent/finagent-reports"), RECENT_LIMIT);
        assert!(reports.is_empty());
    }

    #[test]
    fn read_report_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_report(dir.path(), "../etc/passwd.txt").is_err());
        assert!(read_report(dir.path(), "a/b.txt").is_err());
        assert!(read_report(dir.path(), "report.md").is_err());
    }

    #[test]
    fn read_report_returns_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("apple.txt"), "AAPL report").unwrap();
        assert_eq!(read_report(dir.path(), "apple.txt").unwrap(), "AAPL report");
    }

    #[tokio::test]
    async fn read_latest_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("financial_report.txt");
        assert_eq!(read_latest(&path).await, MISSING_REPORT_PLACEHOLDER);

        fs::write(&path, "the report").unwrap();
        assert_eq!(read_latest(&path).await, "the report");
    }
}
