//! Error types for Blogcast

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlogcastError>;

#[derive(Error, Debug)]
pub enum BlogcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Keyword queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Prompt template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Posting error: {0}")]
    Posting(#[from] PostingError),

    #[error("Thumbnail rendering failed: {0}")]
    Thumbnail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stopped by operator")]
    Stopped,
}

impl BlogcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BlogcastError::InvalidInput(_) => 3,
            BlogcastError::Stopped => 130,
            BlogcastError::Config(_) => 2,
            BlogcastError::Template(_) => 2,
            BlogcastError::Queue(QueueError::FileMissing(_) | QueueError::Empty(_)) => 2,
            BlogcastError::Generation(
                GenerationError::MissingApiKey(_) | GenerationError::EmptyResponse,
            ) => 2,
            BlogcastError::Queue(_) => 1,
            BlogcastError::Generation(_) => 1,
            BlogcastError::Browser(_) => 1,
            BlogcastError::Posting(_) => 1,
            BlogcastError::Thumbnail(_) => 1,
            BlogcastError::Io(_) => 1,
        }
    }

    /// Whether this error means a required input is missing and the whole
    /// run should halt rather than move on to the next keyword.
    pub fn is_missing_input(&self) -> bool {
        self.exit_code() == 2
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Keyword file not found: {}. Create it with one keyword per line.", .0.display())]
    FileMissing(PathBuf),

    #[error("No keywords left in {}. Add keywords to continue.", .0.display())]
    Empty(PathBuf),

    #[error("Keyword file {} is locked by another process (gave up after {attempts} attempts)", path.display())]
    Contention { path: PathBuf, attempts: u32 },

    #[error("Keyword not found in queue: {0}")]
    NotQueued(String),

    #[error("Keyword file IO failed: {0}")]
    Io(#[from] std::io::Error),
}

impl QueueError {
    /// Transient errors are worth another attempt after a short wait
    pub fn is_transient(&self) -> bool {
        matches!(self, QueueError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Prompt template not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read prompt template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    #[error("API key not set. Suggestion: export {0}=<your key>")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Unsupported generator provider: {0}")]
    UnsupportedProvider(String),
}

impl GenerationError {
    /// Network failures, rate limits and server-side errors are retried
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Network(_) | GenerationError::RateLimit(_) => true,
            GenerationError::Api { status, .. } => *status >= 500,
            GenerationError::MissingApiKey(_)
            | GenerationError::Decode(_)
            | GenerationError::EmptyResponse
            | GenerationError::UnsupportedProvider(_) => false,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("No element matched any of: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("DevTools protocol error: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum PostingError {
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: BrowserError,
    },

    #[error("Publish was not confirmed: {0}")]
    NotConfirmed(String),

    #[error("Article has no title")]
    EmptyArticle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = BlogcastError::InvalidInput("bad count".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_missing_inputs_halt_the_run() {
        let missing = BlogcastError::Queue(QueueError::FileMissing(PathBuf::from("keywords.txt")));
        let empty = BlogcastError::Queue(QueueError::Empty(PathBuf::from("keywords.txt")));
        let template = BlogcastError::Template(TemplateError::Missing(PathBuf::from("p1.txt")));
        let no_text = BlogcastError::Generation(GenerationError::EmptyResponse);

        for error in [missing, empty, template, no_text] {
            assert_eq!(error.exit_code(), 2, "{} should exit with 2", error);
            assert!(error.is_missing_input());
        }
    }

    #[test]
    fn test_exit_code_runtime_failures() {
        let browser = BlogcastError::Browser(BrowserError::ElementNotFound(".se-title".into()));
        assert_eq!(browser.exit_code(), 1);
        assert!(!browser.is_missing_input());

        let network = BlogcastError::Generation(GenerationError::Network("refused".into()));
        assert_eq!(network.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_stopped() {
        assert_eq!(BlogcastError::Stopped.exit_code(), 130);
    }

    #[test]
    fn test_queue_error_messages_are_actionable() {
        let missing = QueueError::FileMissing(PathBuf::from("/tmp/keywords.txt"));
        assert!(missing.to_string().contains("/tmp/keywords.txt"));
        assert!(missing.to_string().contains("one keyword per line"));

        let empty = QueueError::Empty(PathBuf::from("keywords.txt"));
        assert!(empty.to_string().contains("Add keywords"));
    }

    #[test]
    fn test_queue_error_transient_only_for_permission_denied() {
        let denied = QueueError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "locked",
        ));
        assert!(denied.is_transient());

        let other = QueueError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!other.is_transient());
        assert!(!QueueError::Empty(PathBuf::new()).is_transient());
    }

    #[test]
    fn test_generation_error_transience() {
        assert!(GenerationError::Network("timeout".into()).is_transient());
        assert!(GenerationError::RateLimit("429".into()).is_transient());
        assert!(GenerationError::Api { status: 503, message: "overloaded".into() }.is_transient());
        assert!(!GenerationError::Api { status: 400, message: "bad".into() }.is_transient());
        assert!(!GenerationError::EmptyResponse.is_transient());
        assert!(!GenerationError::MissingApiKey("GEMINI_API_KEY".into()).is_transient());
    }

    #[test]
    fn test_error_message_formatting_nested() {
        let error: BlogcastError = PostingError::Step {
            step: "type title",
            source: BrowserError::ElementNotFound(".se-documentTitle".to_string()),
        }
        .into();
        assert_eq!(
            error.to_string(),
            "Posting error: Step 'type title' failed: No element matched any of: .se-documentTitle"
        );
    }

    #[test]
    fn test_missing_api_key_suggests_env_var() {
        let error = GenerationError::MissingApiKey("GEMINI_API_KEY".to_string());
        assert!(error.to_string().contains("export GEMINI_API_KEY"));
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let config_error = ConfigError::MissingField("files.keywords".to_string());
        let error: BlogcastError = config_error.into();
        assert!(matches!(error, BlogcastError::Config(_)));
        assert_eq!(error.exit_code(), 2);
    }
}
