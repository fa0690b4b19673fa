//! Cache of recently published posts used for cross-linking
//!
//! `latest_posts.txt` holds one `title|||url|||description` entry per line,
//! newest first. Malformed lines are skipped.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::RelatedPost;

const SEPARATOR: &str = "|||";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelatedPosts {
    posts: Vec<RelatedPost>,
}

impl RelatedPosts {
    /// Load the cache. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No related-posts cache at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(content: &str) -> Self {
        let posts = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let parsed = parse_line(line);
                if parsed.is_none() {
                    warn!("Skipping malformed latest_posts line: {}", line);
                }
                parsed
            })
            .collect();
        Self { posts }
    }

    pub fn posts(&self) -> &[RelatedPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Up to `count` most recent posts, skipping any with the given title
    pub fn pick(&self, count: usize, exclude_title: &str) -> Vec<RelatedPost> {
        self.posts
            .iter()
            .filter(|p| p.title != exclude_title)
            .take(count)
            .cloned()
            .collect()
    }

    /// Put `post` first, drop older entries with the same URL, keep at most `limit`
    pub fn record(&mut self, post: RelatedPost, limit: usize) {
        self.posts.retain(|p| p.url != post.url);
        self.posts.insert(0, post);
        self.posts.truncate(limit.max(1));
    }

    pub fn to_file_content(&self) -> String {
        self.posts
            .iter()
            .map(|p| format!("{}\n", format_line(p)))
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_file_content())?;
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<RelatedPost> {
    let mut parts = line.splitn(3, SEPARATOR);
    let title = parts.next()?.trim();
    let url = parts.next()?.trim();
    let description = parts.next().unwrap_or("").trim();
    if title.is_empty() || url.is_empty() {
        return None;
    }
    Some(RelatedPost {
        title: title.to_string(),
        url: url.to_string(),
        description: description.to_string(),
    })
}

fn format_line(post: &RelatedPost) -> String {
    let clean = |s: &str| s.replace(SEPARATOR, " ").replace(['\n', '\r'], " ");
    format!(
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        clean(&post.title),
        clean(&post.url),
        clean(&post.description)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn post(title: &str, url: &str) -> RelatedPost {
        RelatedPost {
            title: title.to_string(),
            url: url.to_string(),
            description: format!("about {title}"),
        }
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let cache = RelatedPosts::parse(
            "A|||https://a|||desc a\n\nno separators here\nB|||https://b\n|||https://c|||x\n",
        );
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.posts()[0].description, "desc a");
        assert_eq!(cache.posts()[1].description, "");
    }

    #[test]
    fn test_description_may_contain_pipes() {
        let cache = RelatedPosts::parse("A|||https://a|||x ||| y\n");
        assert_eq!(cache.posts()[0].description, "x ||| y");
    }

    #[test]
    fn test_pick_excludes_current_title() {
        let cache = RelatedPosts::parse("A|||u1|||\nB|||u2|||\nC|||u3|||\n");
        let picked: Vec<String> = cache.pick(2, "A").into_iter().map(|p| p.title).collect();
        assert_eq!(picked, vec!["B", "C"]);
        assert!(cache.pick(0, "").is_empty());
    }

    #[test]
    fn test_record_prepends_dedups_and_truncates() {
        let mut cache = RelatedPosts::default();
        cache.record(post("A", "u1"), 2);
        cache.record(post("B", "u2"), 2);
        cache.record(post("A again", "u1"), 2);
        cache.record(post("C", "u3"), 2);

        let titles: Vec<&str> = cache.posts().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A again"]);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache").join("latest_posts.txt");

        let mut cache = RelatedPosts::load(&path).unwrap();
        assert!(cache.is_empty());

        cache.record(
            RelatedPost {
                title: "multi\nline".to_string(),
                url: "https://blog/1".to_string(),
                description: "d".to_string(),
            },
            10,
        );
        cache.save(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "multi line|||https://blog/1|||d\n"
        );
        let reloaded = RelatedPosts::load(&path).unwrap();
        assert_eq!(reloaded.posts()[0].title, "multi line");
    }
}
