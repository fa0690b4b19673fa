//! Keyword queue behaviour across whole-file workflows

use anyhow::Result;
use libblogcast::error::{BlogcastError, QueueError};
use libblogcast::queue::KeywordQueue;
use libblogcast::retry::RetryPolicy;
use libblogcast::Keyword;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn queue(dir: &TempDir) -> KeywordQueue {
    KeywordQueue::new(
        dir.path().join("keywords.txt"),
        dir.path().join("used_keywords.txt"),
    )
    .with_retry(RetryPolicy::fixed(3, Duration::ZERO))
}

#[test]
fn test_fifo_round_trip_empties_queue() -> Result<()> {
    let dir = TempDir::new()?;
    let queue = queue(&dir);
    let keywords = ["서울 카페", "jeju trip", "부산 맛집", "gangneung beach", "여수 밤바다"];

    assert_eq!(queue.add(keywords)?, keywords.len());

    let mut consumed = Vec::new();
    for _ in 0..keywords.len() {
        let next = queue.load_next()?;
        queue.mark_used(&next)?;
        consumed.push(next.as_str().to_string());
    }

    assert_eq!(consumed, keywords);
    assert!(matches!(
        queue.load_next(),
        Err(BlogcastError::Queue(QueueError::Empty(_)))
    ));

    let used: Vec<String> = queue
        .used()?
        .into_iter()
        .map(|k| k.as_str().to_string())
        .collect();
    assert_eq!(used, keywords);
    Ok(())
}

#[test]
fn test_duplicates_are_consumed_one_per_call() -> Result<()> {
    let dir = TempDir::new()?;
    let queue = queue(&dir);
    fs::write(dir.path().join("keywords.txt"), "apple\napple\nbanana\n")?;
    let apple = Keyword::from_line("apple").unwrap();

    queue.mark_used(&apple)?;
    assert_eq!(queue.load_next()?, apple);
    queue.mark_used(&apple)?;
    assert_eq!(queue.load_next()?.as_str(), "banana");

    assert_eq!(
        fs::read_to_string(dir.path().join("used_keywords.txt"))?,
        "apple\napple\n"
    );
    Ok(())
}

#[test]
fn test_comments_survive_consumption() -> Result<()> {
    let dir = TempDir::new()?;
    let queue = queue(&dir);
    fs::write(
        dir.path().join("keywords.txt"),
        "# spring topics\nfirst\n\n# later\nsecond\n",
    )?;

    let next = queue.load_next()?;
    queue.mark_used(&next)?;

    assert_eq!(
        fs::read_to_string(dir.path().join("keywords.txt"))?,
        "# spring topics\n\n# later\nsecond\n"
    );
    let stats = queue.stats()?;
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.used, 1);
    assert_eq!(stats.next.as_deref(), Some("second"));
    Ok(())
}

#[test]
fn test_skip_does_not_log() -> Result<()> {
    let dir = TempDir::new()?;
    let queue = queue(&dir);
    queue.add(["one", "two"])?;

    queue.skip(&Keyword::from_line("one").unwrap())?;

    assert_eq!(queue.load_next()?.as_str(), "two");
    assert!(queue.used()?.is_empty());
    Ok(())
}
