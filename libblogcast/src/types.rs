//! Core types for Blogcast

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A pending keyword: trimmed, non-empty, not a `#` comment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keyword(String);

impl Keyword {
    /// Build a keyword from one queue-file line, rejecting blanks and comments
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub subtitle: String,
    pub body: String,
}

impl Section {
    pub fn new(subtitle: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subtitle: subtitle.into(),
            body: body.into(),
        }
    }
}

/// Structured model output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArticle {
    pub title: String,
    pub intro: String,
    pub sections: Vec<Section>,
}

impl ParsedArticle {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.intro.is_empty() && self.sections.is_empty()
    }
}

/// What gets typed into the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum Article {
    Structured(ParsedArticle),
    /// No section structure was found: first line is the title, the rest is body
    Plain { title: String, body: String },
}

impl Article {
    pub fn title(&self) -> &str {
        match self {
            Article::Structured(parsed) => &parsed.title,
            Article::Plain { title, .. } => title,
        }
    }

    /// Everything below the title as plain text, sections separated by blank lines
    pub fn body_text(&self) -> String {
        match self {
            Article::Plain { body, .. } => body.clone(),
            Article::Structured(parsed) => {
                let mut blocks: Vec<&str> = Vec::new();
                if !parsed.intro.is_empty() {
                    blocks.push(&parsed.intro);
                }
                for section in &parsed.sections {
                    if !section.subtitle.is_empty() {
                        blocks.push(&section.subtitle);
                    }
                    if !section.body.is_empty() {
                        blocks.push(&section.body);
                    }
                }
                blocks.join("\n\n")
            }
        }
    }

    /// Short plain-text summary used for the related-posts cache
    pub fn summary(&self, max_chars: usize) -> String {
        let source = match self {
            Article::Structured(parsed) if !parsed.intro.is_empty() => parsed.intro.clone(),
            _ => self.body_text(),
        };
        let flat = source.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut.trim_end())
        }
    }
}

/// Result of one post, persisted once as `{keyword}_{timestamp}.txt`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub keyword: String,
    pub timestamp: DateTime<Local>,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
}

impl PostRecord {
    pub fn new(
        keyword: &Keyword,
        timestamp: DateTime<Local>,
        article: &Article,
        url: Option<String>,
    ) -> Self {
        Self {
            keyword: keyword.as_str().to_string(),
            timestamp,
            title: article.title().to_string(),
            body: article.body_text(),
            url,
        }
    }
}

/// `{keyword}_{YYYYmmdd_HHMMSS}` with the keyword made safe for file names
pub fn file_stem(keyword: &str, timestamp: &DateTime<Local>) -> String {
    format!(
        "{}_{}",
        sanitize_file_component(keyword),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// One line of `latest_posts.txt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedPost {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Media attached to a post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostMedia {
    pub thumbnail: Option<std::path::PathBuf>,
}

fn sanitize_file_component(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}
