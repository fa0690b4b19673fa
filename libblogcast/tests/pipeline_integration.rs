//! Posting cycle tests against the scripted generator and recording driver
//!
//! These tests verify complete cycles including:
//! - Keyword consumption and result files after a successful post
//! - Halting on missing inputs without touching the queue
//! - Degraded posting and stop requests
//! - Dry runs and keyword overrides

use anyhow::Result;
use libblogcast::config::Config;
use libblogcast::editor::selectors;
use libblogcast::editor::{Action, MockDriver};
use libblogcast::error::{BlogcastError, GenerationError, QueueError, TemplateError};
use libblogcast::generator::MockGenerator;
use libblogcast::{CancelToken, Pipeline, RunOutcome};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const POST_URL: &str = "https://blog.naver.com/tester/223000000042";

const LABELED_OUTPUT: &str = "제목
제주 여행 가이드
서론
제주를 소개합니다
소제목
첫째 날
본문
성산일출봉
소제목
둘째 날
본문
한라산";

/// Workspace with prompts and a keyword queue, plus a config pointing at it
fn setup(keywords: &str) -> Result<(TempDir, Config)> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::write(root.join("keywords.txt"), keywords)?;
    fs::write(root.join("prompt1.txt"), "Write a travel post about {keyword}.")?;
    fs::write(root.join("prompt2.txt"), "Keep it friendly.")?;

    let path = |name: &str| root.join(name).to_string_lossy().to_string();
    let mut config = Config::default();
    config.files.keywords = path("keywords.txt");
    config.files.used_keywords = path("used_keywords.txt");
    config.files.prompt1 = path("prompt1.txt");
    config.files.prompt2 = path("prompt2.txt");
    config.files.latest_posts = path("latest_posts.txt");
    config.files.results_dir = path("results");
    config.browser.blog_id = "tester".to_string();
    config.browser.element_timeout = "50ms".to_string();
    config.browser.step_delay = "0s".to_string();
    config.posting.thumbnail = false;
    config.posting.interval = "0s".to_string();
    config.retry.generation_backoff = "10ms".to_string();
    config.retry.file_backoff = "10ms".to_string();
    config.validate()?;

    Ok((temp_dir, config))
}

fn driver() -> MockDriver {
    MockDriver::new().with_redirect(selectors::CONFIRM_PUBLISH[0], POST_URL)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

fn result_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_successful_cycle_consumes_keyword() -> Result<()> {
    let (temp_dir, config) = setup("jeju\nbusan\n")?;
    let root = temp_dir.path().to_path_buf();
    let generator = MockGenerator::always(LABELED_OUTPUT);
    let prompts = generator.clone();
    let pipeline = Pipeline::new(config, Box::new(generator), CancelToken::new())?;
    let mut driver = driver();

    let outcome = pipeline.run_once(&mut driver, None).await?;

    match outcome {
        RunOutcome::Posted { keyword, url } => {
            assert_eq!(keyword.as_str(), "jeju");
            assert_eq!(url, POST_URL);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // Prompt carried the keyword
    assert!(prompts
        .last_prompt()
        .unwrap()
        .contains("Write a travel post about jeju."));

    // Queue advanced and the used log grew by one line
    assert_eq!(read(&root.join("keywords.txt")), "busan\n");
    assert_eq!(read(&root.join("used_keywords.txt")), "jeju\n");

    // Raw output and record share a stem
    let files = result_files(&root.join("results"));
    assert_eq!(files.len(), 2, "files: {:?}", files);
    assert!(files.iter().all(|f| f.starts_with("jeju_")));
    let record = files.iter().find(|f| !f.ends_with("_raw.txt")).unwrap();
    let content = read(&root.join("results").join(record));
    assert!(content.contains(&format!("url: {}", POST_URL)));
    assert!(content.contains("제주 여행 가이드"));

    // Published post is now a related-post candidate
    let cache = read(&root.join("latest_posts.txt"));
    assert!(cache.starts_with(&format!("제주 여행 가이드|||{}|||", POST_URL)));

    // Tags default to the keyword
    assert_eq!(driver.typed().last().map(String::as_str), Some("jeju"));
    Ok(())
}

#[tokio::test]
async fn test_transient_generation_errors_are_retried() -> Result<()> {
    let (_temp_dir, config) = setup("jeju\n")?;
    let generator = MockGenerator::failing_then(2, LABELED_OUTPUT);
    let calls = generator.clone();
    let pipeline = Pipeline::new(config, Box::new(generator), CancelToken::new())?;

    let outcome = pipeline.run_once(&mut driver(), None).await?;

    assert!(matches!(outcome, RunOutcome::Posted { .. }));
    assert_eq!(calls.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_retries_are_bounded() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    let generator = MockGenerator::failing_then(5, LABELED_OUTPUT);
    let calls = generator.clone();
    let pipeline = Pipeline::new(config, Box::new(generator), CancelToken::new())?;

    let err = pipeline.run_once(&mut driver(), None).await.unwrap_err();

    assert!(matches!(
        err,
        BlogcastError::Generation(GenerationError::Network(_))
    ));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(calls.call_count(), 3);
    assert_eq!(read(&temp_dir.path().join("keywords.txt")), "jeju\n");
    Ok(())
}

#[tokio::test]
async fn test_empty_model_output_halts_before_browser() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::scripted([Ok("   \n\n".to_string())])),
        CancelToken::new(),
    )?;
    let mut driver = driver();

    let err = pipeline.run_once(&mut driver, None).await.unwrap_err();

    assert!(err.is_missing_input());
    assert!(driver.actions().is_empty());
    assert_eq!(read(&temp_dir.path().join("keywords.txt")), "jeju\n");
    assert!(!temp_dir.path().join("used_keywords.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_template_halts() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    fs::remove_file(temp_dir.path().join("prompt2.txt"))?;
    let generator = MockGenerator::always(LABELED_OUTPUT);
    let calls = generator.clone();
    let pipeline = Pipeline::new(config, Box::new(generator), CancelToken::new())?;

    let err = pipeline.run_once(&mut driver(), None).await.unwrap_err();

    assert!(matches!(
        err,
        BlogcastError::Template(TemplateError::Missing(_))
    ));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(calls.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_queue_halts() -> Result<()> {
    let (_temp_dir, config) = setup("# nothing yet\n\n")?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        CancelToken::new(),
    )?;

    let err = pipeline.run_once(&mut driver(), None).await.unwrap_err();

    assert!(matches!(err, BlogcastError::Queue(QueueError::Empty(_))));
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_queue_file_halts() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    fs::remove_file(temp_dir.path().join("keywords.txt"))?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        CancelToken::new(),
    )?;

    let err = pipeline.run_once(&mut driver(), None).await.unwrap_err();

    assert!(matches!(err, BlogcastError::Queue(QueueError::FileMissing(_))));
    Ok(())
}

#[tokio::test]
async fn test_stop_request_is_an_outcome_not_an_error() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    let cancel = CancelToken::new();
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        cancel.clone(),
    )?;
    let mut driver = driver().with_stop_after(4, cancel.clone());

    let outcome = pipeline.run_once(&mut driver, None).await?;

    assert_eq!(outcome, RunOutcome::Stopped);
    assert_eq!(read(&temp_dir.path().join("keywords.txt")), "jeju\n");
    assert!(!driver
        .clicked()
        .contains(&selectors::CONFIRM_PUBLISH[0].to_string()));
    Ok(())
}

#[tokio::test]
async fn test_failed_publish_keeps_keyword_queued() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        CancelToken::new(),
    )?;
    let mut driver = driver().with_missing_chain(selectors::PUBLISH_BUTTON);

    let err = pipeline.run_once(&mut driver, None).await.unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert_eq!(read(&temp_dir.path().join("keywords.txt")), "jeju\n");
    // Raw output is kept for debugging, plus the failure screenshot request
    let files = result_files(&temp_dir.path().join("results"));
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_raw.txt"));
    assert!(matches!(driver.actions().last(), Some(Action::Screenshot(_))));
    Ok(())
}

#[tokio::test]
async fn test_dry_run_leaves_queue_and_browser_alone() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        CancelToken::new(),
    )?;

    let outcome = pipeline.dry_run(None).await?;

    let record = match outcome {
        RunOutcome::Drafted { keyword, record } => {
            assert_eq!(keyword.as_str(), "jeju");
            record
        }
        other => panic!("unexpected outcome: {:?}", other),
    };
    let content = read(&record);
    assert!(content.contains("제주 여행 가이드"));
    assert!(!content.contains("url:"));
    assert_eq!(read(&temp_dir.path().join("keywords.txt")), "jeju\n");
    assert!(!temp_dir.path().join("used_keywords.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_keyword_override_is_logged_once() -> Result<()> {
    let (temp_dir, config) = setup("jeju\n")?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        CancelToken::new(),
    )?;

    pipeline.run_once(&mut driver(), Some("  gangneung  ")).await?;
    pipeline.run_once(&mut driver(), Some("gangneung")).await?;

    assert_eq!(read(&temp_dir.path().join("keywords.txt")), "jeju\n");
    assert_eq!(read(&temp_dir.path().join("used_keywords.txt")), "gangneung\n");

    let err = pipeline.run_once(&mut driver(), Some("  ")).await.unwrap_err();
    assert_eq!(err.exit_code(), 3);
    Ok(())
}

#[tokio::test]
async fn test_related_posts_and_thumbnail_are_attached() -> Result<()> {
    let (temp_dir, mut config) = setup("jeju\n")?;
    config.posting.thumbnail = true;
    fs::write(
        temp_dir.path().join("latest_posts.txt"),
        "부산 맛집|||https://blog.naver.com/tester/1|||바다 앞 식당\n",
    )?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always(LABELED_OUTPUT)),
        CancelToken::new(),
    )?;
    let mut driver = driver();

    pipeline.run_once(&mut driver, None).await?;

    let typed = driver.typed();
    assert!(typed.contains(&"부산 맛집".to_string()));
    assert!(typed.contains(&"https://blog.naver.com/tester/1".to_string()));

    let upload = driver.actions().into_iter().find_map(|a| match a {
        Action::Upload { path, .. } => Some(path),
        _ => None,
    });
    let upload = upload.expect("thumbnail should be uploaded");
    assert!(upload.to_string_lossy().ends_with("_thumb.png"));
    assert!(upload.exists());

    // Newest first, older entry kept
    let cache = read(&temp_dir.path().join("latest_posts.txt"));
    let lines: Vec<&str> = cache.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("제주 여행 가이드|||"));
    assert!(lines[1].starts_with("부산 맛집|||"));
    Ok(())
}

#[tokio::test]
async fn test_unstructured_output_posts_as_plain_text() -> Result<()> {
    let (_temp_dir, config) = setup("jeju\n")?;
    let pipeline = Pipeline::new(
        config,
        Box::new(MockGenerator::always("# 제주 한 줄 요약\n그냥 본문 한 줄")),
        CancelToken::new(),
    )?;
    let mut driver = driver();

    pipeline.run_once(&mut driver, None).await?;

    let typed = driver.typed();
    assert_eq!(typed[0], "제주 한 줄 요약");
    assert_eq!(typed[1], "그냥 본문 한 줄");
    Ok(())
}
