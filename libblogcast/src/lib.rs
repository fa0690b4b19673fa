//! Blogcast - keyword-driven blog posting through a real browser
//!
//! This library holds everything the `blog-*` tools share: the keyword queue,
//! prompt composition, parsing of model output, the content generator, the
//! editor driver and the pipeline that ties one posting cycle together.
//!
//! ```no_run
//! use libblogcast::{CancelToken, Config, Pipeline};
//! use libblogcast::editor::ChromeDriver;
//! use libblogcast::generator::create_generator;
//!
//! # async fn example() -> libblogcast::Result<()> {
//! let config = Config::load()?;
//! let generator = create_generator(&config.generator)?;
//! let mut driver = ChromeDriver::launch(&config.browser).await?;
//! let pipeline = Pipeline::new(config, generator, CancelToken::new())?;
//! let outcome = pipeline.run_once(&mut driver, None).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod editor;
pub mod error;
pub mod generator;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod poster;
pub mod prompt;
pub mod queue;
pub mod related;
pub mod results;
pub mod retry;
pub mod thumbnail;
pub mod types;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use config::Config;
pub use error::{BlogcastError, Result};
pub use pipeline::{Pipeline, RunOutcome};
pub use queue::KeywordQueue;
pub use types::{Article, Keyword, ParsedArticle, PostRecord, Section};
