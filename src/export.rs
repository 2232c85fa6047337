//! Output file writing and record summaries.

use crate::error::Result;
use crate::records::BusinessRecord;
use std::path::Path;
use tracing::{info, warn};

/// Write records as a pretty-printed JSON array, creating parent
/// directories as needed.
pub fn write_json(records: &[BusinessRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(records)?;
    std::fs::write(path, content)?;
    info!("saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Log the first few records so a run's output is inspectable without
/// opening the file.
pub fn log_sample(records: &[BusinessRecord]) {
    if records.is_empty() {
        warn!("no records scraped");
        return;
    }
    info!("sample output:");
    for (i, record) in records.iter().take(3).enumerate() {
        info!(
            "{}) {} | {} | {} | agent={}",
            i + 1,
            record.business_name,
            record.registration_id,
            record.status,
            record.agent_name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> BusinessRecord {
        BusinessRecord {
            business_name: name.to_string(),
            registration_id: "C-1".to_string(),
            status: "Active".to_string(),
            ..BusinessRecord::default()
        }
    }

    #[test]
    fn test_write_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");

        let records = vec![record("One"), record("Two")];
        write_json(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<BusinessRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_write_json_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/deep/output.json");

        write_json(&[record("X")], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_array_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");

        write_json(&[], &path).unwrap();
        let parsed: Vec<BusinessRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }
}
