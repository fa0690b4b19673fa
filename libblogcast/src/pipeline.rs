//! One posting cycle from keyword to published post
//!
//! The cycle order is fixed: pick keyword, compose prompt, generate, save the
//! raw output, parse, render a thumbnail, publish, save the record, consume
//! the keyword, update the related-posts cache. A stop request at any
//! checkpoint ends the cycle as [`RunOutcome::Stopped`] rather than an error.

use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::editor::EditorDriver;
use crate::error::{BlogcastError, GenerationError, Result};
use crate::generator::{self, ContentGenerator};
use crate::parser;
use crate::poster::{BlogPoster, PostDraft, PosterSettings};
use crate::prompt::PromptTemplates;
use crate::queue::KeywordQueue;
use crate::related::RelatedPosts;
use crate::results::ResultStore;
use crate::retry::RetryPolicy;
use crate::thumbnail::ThumbnailRenderer;
use crate::types::{Article, Keyword, PostMedia, PostRecord, RelatedPost};

const SUMMARY_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted { keyword: Keyword, url: String },
    /// Dry run finished: the article was generated and saved but not posted
    Drafted { keyword: Keyword, record: PathBuf },
    Stopped,
}

/// Output of the steps shared by real and dry runs
struct Generated {
    keyword: Keyword,
    timestamp: chrono::DateTime<Local>,
    /// Shared name of this run's result files
    stem: String,
    article: Article,
}

pub struct Pipeline {
    config: Config,
    queue: KeywordQueue,
    generator: Box<dyn ContentGenerator>,
    generation_retry: RetryPolicy,
    results: ResultStore,
    cancel: CancelToken,
}

impl Pipeline {
    pub fn new(
        config: Config,
        generator: Box<dyn ContentGenerator>,
        cancel: CancelToken,
    ) -> Result<Self> {
        let queue = KeywordQueue::new(
            config.files.keywords_path(),
            config.files.used_keywords_path(),
        )
        .with_retry(config.retry.file_policy()?);
        let generation_retry = config.retry.generation_policy()?;
        let results = ResultStore::new(config.files.results_dir_path());

        Ok(Self {
            config,
            queue,
            generator,
            generation_retry,
            results,
            cancel,
        })
    }

    pub fn queue(&self) -> &KeywordQueue {
        &self.queue
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run one full cycle against `driver`.
    ///
    /// `keyword_override` posts that keyword instead of the queue head.
    ///
    /// # Errors
    ///
    /// Missing inputs (queue file, keywords, templates, model output) and
    /// failed editor steps are returned as errors; a stop request is not.
    pub async fn run_once(
        &self,
        driver: &mut dyn EditorDriver,
        keyword_override: Option<&str>,
    ) -> Result<RunOutcome> {
        let span = info_span!("run", id = %Uuid::new_v4());
        let result = self
            .post_cycle(driver, keyword_override)
            .instrument(span)
            .await;
        stopped_as_outcome(result)
    }

    /// Generate, parse and save an article without touching the browser or the queue
    pub async fn dry_run(&self, keyword_override: Option<&str>) -> Result<RunOutcome> {
        let span = info_span!("dry_run", id = %Uuid::new_v4());
        let result = async {
            let generated = self.generate_article(keyword_override).await?;
            let record = PostRecord::new(
                &generated.keyword,
                generated.timestamp,
                &generated.article,
                None,
            );
            let path = self.results.write_record(&generated.stem, &record)?;
            info!("Dry run saved {}", path.display());
            Ok::<_, BlogcastError>(RunOutcome::Drafted {
                keyword: generated.keyword,
                record: path,
            })
        }
        .instrument(span)
        .await;
        stopped_as_outcome(result)
    }

    async fn post_cycle(
        &self,
        driver: &mut dyn EditorDriver,
        keyword_override: Option<&str>,
    ) -> Result<RunOutcome> {
        let poster = BlogPoster::new(PosterSettings::from_config(&self.config)?);
        let generated = self.generate_article(keyword_override).await?;
        let Generated {
            keyword,
            timestamp,
            stem,
            article,
        } = generated;

        self.cancel.checkpoint().await?;
        let thumbnail = self.render_thumbnail(&keyword, &stem);

        let related_cache = self.load_related();
        let related = related_cache.pick(self.config.posting.related_links, article.title());

        let draft = PostDraft {
            article,
            media: PostMedia { thumbnail },
            related,
            tags: self.config.posting.tags_for(keyword.as_str()),
        };

        let url = poster.publish(driver, &draft, &self.cancel).await?;

        let record = PostRecord::new(&keyword, timestamp, &draft.article, Some(url.clone()));
        match self.results.write_record(&stem, &record) {
            Ok(path) => debug!("Saved result to {}", path.display()),
            Err(e) => warn!("Post published but the result file was not written: {}", e),
        }

        self.queue.mark_used(&keyword)?;
        self.update_related(related_cache, &draft.article, &url);

        info!("Posted '{}' for keyword '{}'", draft.article.title(), keyword);
        Ok(RunOutcome::Posted { keyword, url })
    }

    async fn generate_article(&self, keyword_override: Option<&str>) -> Result<Generated> {
        self.cancel.checkpoint().await?;
        let keyword = match keyword_override {
            Some(k) => Keyword::from_line(k).ok_or_else(|| {
                BlogcastError::InvalidInput(format!("'{}' is not a usable keyword", k))
            })?,
            None => self.queue.load_next()?,
        };
        info!("Keyword: {}", keyword);

        let (first, second) = self.config.files.prompt_paths();
        let prompt = PromptTemplates::load(&first, &second)?.compose(&keyword);

        let backend = self.generator.as_ref();
        let cancel = &self.cancel;
        let prompt_ref = prompt.as_str();
        info!("Generating with {}", backend.name());
        let raw = self
            .generation_retry
            .retry_async(
                "Generation",
                |_| async move {
                    cancel.checkpoint().await?;
                    backend.generate(prompt_ref).await
                },
                generator::is_transient,
            )
            .await?;

        let timestamp = Local::now();
        let stem = self.results.reserve_stem(keyword.as_str(), &timestamp);
        let raw_path = self.results.write_raw(&stem, &raw)?;
        debug!("Saved raw output to {}", raw_path.display());

        let article = parser::to_article(&raw).ok_or(GenerationError::EmptyResponse)?;
        match &article {
            Article::Structured(parsed) => {
                info!("Parsed '{}' with {} sections", parsed.title, parsed.sections.len())
            }
            Article::Plain { title, .. } => {
                info!("No sections found, posting '{}' as plain text", title)
            }
        }

        Ok(Generated {
            keyword,
            timestamp,
            stem,
            article,
        })
    }

    fn render_thumbnail(&self, keyword: &Keyword, stem: &str) -> Option<PathBuf> {
        if !self.config.posting.thumbnail {
            return None;
        }
        let background = self
            .config
            .posting
            .thumbnail_background
            .as_deref()
            .map(crate::config::expand_path);
        let path = self.results.dir().join(format!("{}_thumb.png", stem));
        match ThumbnailRenderer::new(background).render_to(keyword.as_str(), &path) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Thumbnail skipped: {}", e);
                None
            }
        }
    }

    fn load_related(&self) -> RelatedPosts {
        let path = self.config.files.latest_posts_path();
        RelatedPosts::load(&path).unwrap_or_else(|e| {
            warn!("Could not read {}: {}", path.display(), e);
            RelatedPosts::default()
        })
    }

    fn update_related(&self, mut cache: RelatedPosts, article: &Article, url: &str) {
        cache.record(
            RelatedPost {
                title: article.title().to_string(),
                url: url.to_string(),
                description: article.summary(SUMMARY_CHARS),
            },
            self.config.posting.latest_posts_limit,
        );
        let path = self.config.files.latest_posts_path();
        if let Err(e) = cache.save(&path) {
            warn!("Could not update {}: {}", path.display(), e);
        }
    }
}

fn stopped_as_outcome(result: Result<RunOutcome>) -> Result<RunOutcome> {
    match result {
        Err(BlogcastError::Stopped) => {
            info!("Stop requested, ending the cycle");
            Ok(RunOutcome::Stopped)
        }
        other => other,
    }
}
