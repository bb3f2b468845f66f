//! On-disk corpus: transcripts in, one quote file per unit out.

use super::models::{QuoteRecord, WorkUnit};
use crate::error::{PodquoteError, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const QUOTES_SUFFIX: &str = "_quotes.json";

/// Reads transcripts and reads/writes per-unit quote files.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    transcripts_dir: PathBuf,
    output_dir: PathBuf,
}

impl CorpusStore {
    pub fn new(transcripts_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            transcripts_dir: transcripts_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Quote file location for a unit.
    pub fn quotes_path(&self, unit_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", unit_id, QUOTES_SUFFIX))
    }

    /// Transcript location for a unit.
    pub fn transcript_path(&self, unit_id: &str) -> PathBuf {
        self.transcripts_dir.join(format!("{}.txt", unit_id))
    }

    fn unit(&self, unit_id: &str) -> WorkUnit {
        WorkUnit {
            unit_id: unit_id.to_string(),
            transcript_path: self.transcript_path(unit_id),
            quotes_path: self.quotes_path(unit_id),
        }
    }

    /// All `*.txt` transcripts, sorted by unit id.
    pub fn discover_units(&self) -> Result<Vec<WorkUnit>> {
        if !self.transcripts_dir.exists() {
            return Err(PodquoteError::InvalidInput(format!(
                "Transcripts directory not found: {}",
                self.transcripts_dir.display()
            )));
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.transcripts_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        debug!("Discovered {} transcripts in {:?}", ids.len(), self.transcripts_dir);
        Ok(ids.iter().map(|id| self.unit(id)).collect())
    }

    /// Units that have a quote file, sorted by unit id.
    pub fn units_with_quotes(&self) -> Result<Vec<WorkUnit>> {
        if !self.output_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.output_dir)? {
            let name = entry?.file_name();
            if let Some(id) = name.to_str().and_then(|n| n.strip_suffix(QUOTES_SUFFIX)) {
                ids.push(id.to_string());
            }
        }
        ids.sort();

        Ok(ids.iter().map(|id| self.unit(id)).collect())
    }

    pub fn read_transcript(&self, unit_id: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.transcript_path(unit_id))?)
    }

    pub fn has_quotes(&self, unit_id: &str) -> bool {
        self.quotes_path(unit_id).exists()
    }

    /// Load a unit's quotes; a missing file is an error.
    pub fn load_quotes(&self, unit_id: &str) -> Result<Vec<QuoteRecord>> {
        let path = self.quotes_path(unit_id);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PodquoteError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a unit's quotes wholesale.
    pub fn save_quotes(&self, unit_id: &str, quotes: &[QuoteRecord]) -> Result<()> {
        write_json_atomic(&self.quotes_path(unit_id), &quotes)
    }

    /// Remove a unit's quote file (destructive reset).
    pub fn remove_quotes(&self, unit_id: &str) -> Result<()> {
        let path = self.quotes_path(unit_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PodquoteError::persistence(&path, e)),
        }
    }

    /// Merge every quote file into one array, each record tagged with its unit.
    pub fn export_merged(&self, path: &Path) -> Result<usize> {
        #[derive(Serialize)]
        struct ExportedQuote<'a> {
            id: usize,
            unit_id: &'a str,
            #[serde(flatten)]
            quote: &'a QuoteRecord,
        }

        let units = self.units_with_quotes()?;
        let mut loaded = Vec::with_capacity(units.len());
        for unit in &units {
            loaded.push((unit.unit_id.as_str(), self.load_quotes(&unit.unit_id)?));
        }

        let exported: Vec<ExportedQuote> = loaded
            .iter()
            .flat_map(|(unit_id, quotes)| quotes.iter().map(move |q| (*unit_id, q)))
            .enumerate()
            .map(|(idx, (unit_id, quote))| ExportedQuote {
                id: idx + 1,
                unit_id,
                quote,
            })
            .collect();

        write_json_atomic(path, &exported)?;
        Ok(exported.len())
    }
}

/// Serialize to a temp file in the target directory, then rename over the target.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| PodquoteError::persistence(path, e))?;

    let json = serde_json::to_string_pretty(value)?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| PodquoteError::persistence(path, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PodquoteError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| PodquoteError::persistence(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CorpusStore {
        let transcripts = dir.path().join("transcripts");
        std::fs::create_dir_all(&transcripts).unwrap();
        CorpusStore::new(transcripts, dir.path().join("output"))
    }

    #[test]
    fn test_discover_units_sorted_txt_only() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for name in ["Brian_Chesky.txt", "Ada_Chen.txt", "notes.md"] {
            std::fs::write(dir.path().join("transcripts").join(name), "hi").unwrap();
        }

        let units = store.discover_units().unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.unit_id.as_str()).collect();
        assert_eq!(ids, vec!["Ada_Chen", "Brian_Chesky"]);
        assert!(units[0].quotes_path.ends_with("output/Ada_Chen_quotes.json"));
    }

    #[test]
    fn test_save_and_load_quotes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let quotes = vec![QuoteRecord::new("Talk to users.", "Ada Chen")];

        assert!(!store.has_quotes("Ada_Chen"));
        store.save_quotes("Ada_Chen", &quotes).unwrap();
        assert!(store.has_quotes("Ada_Chen"));
        assert_eq!(store.load_quotes("Ada_Chen").unwrap(), quotes);

        let listed = store.units_with_quotes().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].unit_id, "Ada_Chen");
    }

    #[test]
    fn test_export_merged_tags_units() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .save_quotes("A", &[QuoteRecord::new("one", "a"), QuoteRecord::new("two", "a")])
            .unwrap();
        store.save_quotes("B", &[QuoteRecord::new("three", "b")]).unwrap();

        let export_path = dir.path().join("output").join("quotes_complete.json");
        assert_eq!(store.export_merged(&export_path).unwrap(), 3);

        let merged: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
        assert_eq!(merged[2]["id"], 3);
        assert_eq!(merged[2]["unit_id"], "B");
        assert_eq!(merged[2]["text"], "three");
    }

    #[test]
    fn test_remove_missing_quotes_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.remove_quotes("nobody").is_ok());
    }
}
