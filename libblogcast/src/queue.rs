//! Line-oriented keyword queue
//!
//! `keywords.txt` holds pending keywords, one per line; blank lines and lines
//! starting with `#` are ignored. Consumed keywords are removed from it and
//! appended to `used_keywords.txt`.
//!
//! The remove and the append are two separate writes. A crash between them
//! can drop or duplicate a keyword; [`KeywordQueue::mark_used`] checks the
//! used log before appending so a retried call does not log twice.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{QueueError, Result};
use crate::retry::RetryPolicy;
use crate::types::Keyword;

type ReadFn = fn(&Path) -> io::Result<String>;

#[derive(Debug, Clone)]
pub struct KeywordQueue {
    pending_path: PathBuf,
    used_path: PathBuf,
    retry: RetryPolicy,
    read: ReadFn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub used: usize,
    pub next: Option<String>,
}

impl KeywordQueue {
    pub fn new(pending_path: impl Into<PathBuf>, used_path: impl Into<PathBuf>) -> Self {
        Self {
            pending_path: pending_path.into(),
            used_path: used_path.into(),
            retry: RetryPolicy::fixed(3, std::time::Duration::from_secs(1)),
            read: read_file,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    fn with_reader(mut self, read: ReadFn) -> Self {
        self.read = read;
        self
    }

    pub fn pending_path(&self) -> &Path {
        &self.pending_path
    }

    pub fn used_path(&self) -> &Path {
        &self.used_path
    }

    /// Return the first pending keyword without consuming it.
    ///
    /// # Errors
    ///
    /// - `QueueError::FileMissing` if the keyword file does not exist
    /// - `QueueError::Empty` if it holds no usable keyword
    /// - `QueueError::Contention` if it stayed locked for every attempt
    pub fn load_next(&self) -> Result<Keyword> {
        let content = self.read_pending()?;
        let keyword = content
            .lines()
            .find_map(Keyword::from_line)
            .ok_or_else(|| QueueError::Empty(self.pending_path.clone()))?;
        debug!("Next keyword: {}", keyword);
        Ok(keyword)
    }

    /// All pending keywords in queue order
    pub fn pending(&self) -> Result<Vec<Keyword>> {
        let content = self.read_pending()?;
        Ok(content.lines().filter_map(Keyword::from_line).collect())
    }

    /// All logged keywords, oldest first. A missing log is an empty log.
    pub fn used(&self) -> Result<Vec<Keyword>> {
        match self.read_with_retry(&self.used_path) {
            Ok(content) => Ok(content.lines().filter_map(Keyword::from_line).collect()),
            Err(QueueError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.contention_or(&self.used_path, e).into()),
        }
    }

    pub fn was_used(&self, keyword: &Keyword) -> Result<bool> {
        Ok(self.used()?.contains(keyword))
    }

    /// Remove the first literal match of `keyword` from the queue and append
    /// one line to the used log.
    ///
    /// When the keyword is no longer queued (a keyword given on the command
    /// line, or a retry after a crash between the two writes) it is appended
    /// only if the used log does not already contain it.
    pub fn mark_used(&self, keyword: &Keyword) -> Result<()> {
        let removed = match self.remove_first(keyword) {
            Ok(()) => true,
            Err(QueueError::NotQueued(_)) | Err(QueueError::FileMissing(_)) => false,
            Err(e) => return Err(e.into()),
        };

        if !removed && self.was_used(keyword)? {
            info!("Keyword '{}' already in used log, not appending again", keyword);
            return Ok(());
        }

        self.retry
            .retry(
                "append used keyword",
                |_| append_line(&self.used_path, keyword.as_str()),
                QueueError::is_transient,
            )
            .map_err(|e| self.contention_or(&self.used_path, e))?;

        info!("Marked keyword as used: {}", keyword);
        Ok(())
    }

    /// Remove a keyword from the queue without logging it
    pub fn skip(&self, keyword: &Keyword) -> Result<()> {
        self.remove_first(keyword)?;
        info!("Skipped keyword: {}", keyword);
        Ok(())
    }

    /// Append keywords to the end of the queue, creating the file if needed.
    ///
    /// Returns how many lines were added; blanks and comments are dropped.
    pub fn add<I, S>(&self, keywords: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<Keyword> = keywords
            .into_iter()
            .filter_map(|k| Keyword::from_line(k.as_ref()))
            .collect();
        if lines.is_empty() {
            return Ok(0);
        }

        let needs_newline = match fs::read(&self.pending_path) {
            Ok(bytes) => bytes.last().is_some_and(|b| *b != b'\n'),
            Err(_) => false,
        };

        let mut block = String::new();
        if needs_newline {
            block.push('\n');
        }
        for keyword in &lines {
            block.push_str(keyword.as_str());
            block.push('\n');
        }

        self.retry
            .retry(
                "append keywords",
                |_| append_raw(&self.pending_path, &block),
                QueueError::is_transient,
            )
            .map_err(|e| self.contention_or(&self.pending_path, e))?;
        Ok(lines.len())
    }

    pub fn stats(&self) -> Result<QueueStats> {
        let pending: Vec<Keyword> = match self.read_pending() {
            Ok(content) => content.lines().filter_map(Keyword::from_line).collect(),
            Err(QueueError::FileMissing(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(QueueStats {
            pending: pending.len(),
            used: self.used()?.len(),
            next: pending.first().map(|k| k.as_str().to_string()),
        })
    }

    fn remove_first(&self, keyword: &Keyword) -> std::result::Result<(), QueueError> {
        let content = self.read_pending()?;

        let mut removed = false;
        let kept: Vec<&str> = content
            .lines()
            .filter(|line| {
                if !removed && line.trim() == keyword.as_str() {
                    removed = true;
                    false
                } else {
                    true
                }
            })
            .collect();

        if !removed {
            return Err(QueueError::NotQueued(keyword.as_str().to_string()));
        }

        let mut rewritten = kept.join("\n");
        if !kept.is_empty() {
            rewritten.push('\n');
        }

        self.retry
            .retry(
                "rewrite keyword file",
                |_| fs::write(&self.pending_path, &rewritten).map_err(QueueError::Io),
                QueueError::is_transient,
            )
            .map_err(|e| self.contention_or(&self.pending_path, e))
    }

    fn read_pending(&self) -> std::result::Result<String, QueueError> {
        match self.read_with_retry(&self.pending_path) {
            Ok(content) => Ok(content),
            Err(QueueError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                Err(QueueError::FileMissing(self.pending_path.clone()))
            }
            Err(e) => Err(self.contention_or(&self.pending_path, e)),
        }
    }

    fn read_with_retry(&self, path: &Path) -> std::result::Result<String, QueueError> {
        self.retry.retry(
            "read keyword file",
            |_| (self.read)(path).map_err(QueueError::Io),
            QueueError::is_transient,
        )
    }

    /// Report a transient error that outlived every attempt as contention on `path`
    fn contention_or(&self, path: &Path, error: QueueError) -> QueueError {
        if error.is_transient() {
            QueueError::Contention {
                path: path.to_path_buf(),
                attempts: self.retry.max_attempts,
            }
        } else {
            error
        }
    }
}

fn read_file(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

fn append_line(path: &Path, line: &str) -> std::result::Result<(), QueueError> {
    append_raw(path, &format!("{}\n", line))
}

fn append_raw(path: &Path, text: &str) -> std::result::Result<(), QueueError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}
