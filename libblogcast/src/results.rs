//! Per-run audit files
//!
//! Every run writes `{keyword}_{timestamp}_raw.txt` with the unparsed model
//! output as soon as it arrives, and `{keyword}_{timestamp}.txt` with the
//! title and body once the article is built. Files are never rewritten; a
//! second run for the same keyword within one second gets a `-2` suffix.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::error::Result;
use crate::types::{file_stem, PostRecord};

#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A stem that no raw or record file in the directory uses yet
    pub fn reserve_stem(&self, keyword: &str, timestamp: &DateTime<Local>) -> String {
        let base = file_stem(keyword, timestamp);
        let taken = |stem: &str| {
            self.raw_path(stem).exists() || self.record_path(stem).exists()
        };
        if !taken(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let stem = format!("{}-{}", base, n);
            if !taken(&stem) {
                return stem;
            }
            n += 1;
        }
    }

    pub fn raw_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}_raw.txt", stem))
    }

    pub fn record_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", stem))
    }

    /// Write the raw model output
    pub fn write_raw(&self, stem: &str, raw: &str) -> Result<PathBuf> {
        let path = self.raw_path(stem);
        self.write_once(&path, raw)?;
        Ok(path)
    }

    /// Write keyword, timestamp, optional URL, title and body
    pub fn write_record(&self, stem: &str, record: &PostRecord) -> Result<PathBuf> {
        let path = self.record_path(stem);
        let mut content = format!(
            "keyword: {}\ntimestamp: {}\n",
            record.keyword,
            record.timestamp.to_rfc3339()
        );
        if let Some(url) = &record.url {
            content.push_str(&format!("url: {}\n", url));
        }
        content.push_str(&format!("\n{}\n\n{}\n", record.title, record.body));
        self.write_once(&path, &content)?;
        Ok(path)
    }

    fn write_once(&self, path: &Path, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(content.as_bytes())?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
