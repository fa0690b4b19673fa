//! blog-post - Generate and publish blog posts
//!
//! Unix-style tool that runs one or more posting cycles: take a keyword from
//! the queue, generate an article, and publish it through the blog editor.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use libblogcast::editor::{ChromeDriver, EditorDriver};
use libblogcast::generator::create_generator;
use libblogcast::{logging, BlogcastError, CancelToken, Config, Pipeline, Result, RunOutcome};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "blog-post")]
#[command(version)]
#[command(about = "Generate and publish blog posts from a keyword queue")]
#[command(long_about = "\
blog-post - Generate and publish blog posts from a keyword queue

DESCRIPTION:
    blog-post takes the next keyword from keywords.txt, asks the configured
    model for an article, and types it into the blog editor through a real
    Chrome session. The published URL is printed to stdout.

USAGE EXAMPLES:
    # Post the next keyword
    blog-post

    # Post three keywords, waiting posting.interval between them
    blog-post --count 3

    # Post a specific keyword (removed from the queue if present)
    blog-post --keyword \"제주 여행\"

    # Generate and save the article without opening a browser
    blog-post --dry-run --format json

SIGNALS:
    SIGINT, SIGTERM  Stop at the next step boundary
    SIGUSR1          Pause or resume

CONFIGURATION:
    Configuration file: ~/.config/blogcast/config.toml
    Override with BLOGCAST_CONFIG or --config.
    The API key is read from the variable named by generator.api_key_env.

EXIT CODES:
    0   - Success
    1   - Posting failed
    2   - Configuration or missing input (keywords, templates, API key)
    3   - Invalid input
    130 - Stopped by signal
")]
struct Cli {
    /// Number of posts to publish
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    /// Post this keyword instead of the queue head
    #[arg(short, long)]
    keyword: Option<String>,

    /// Generate and save the article without opening a browser
    #[arg(long)]
    dry_run: bool,

    /// Run Chrome without a window; the browser is closed on failure too
    #[arg(long)]
    headless: bool,

    /// Path to the configuration file
    #[arg(short, long, env = "BLOGCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(BlogcastError::InvalidInput(format!(
                "Invalid format '{}'. Must be 'text' or 'json'",
                s
            ))),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    logging::init_default(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.count == 0 {
        return Err(BlogcastError::InvalidInput(
            "--count must be at least 1".to_string(),
        ));
    }
    if cli.keyword.is_some() && cli.count > 1 {
        return Err(BlogcastError::InvalidInput(
            "--keyword posts a single article and cannot be combined with --count".to_string(),
        ));
    }
    let format = OutputFormat::parse(&cli.format)?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if cli.headless {
        config.browser.headless = true;
    }
    let headless = config.browser.headless;
    let interval = config.posting.interval()?;
    let browser_config = config.browser.clone();

    let cancel = CancelToken::new();
    setup_signal_handlers(&cancel)?;

    let generator = create_generator(&config.generator)?;
    let pipeline = Pipeline::new(config, generator, cancel.clone())?;

    if cli.dry_run {
        return post_loop(&pipeline, None, &cli, interval, format).await;
    }

    let mut driver = ChromeDriver::launch(&browser_config).await?;
    let result = post_loop(
        &pipeline,
        Some(&mut driver as &mut dyn EditorDriver),
        &cli,
        interval,
        format,
    )
    .await;

    match &result {
        Err(e) if !headless && !matches!(e, BlogcastError::Stopped) => {
            eprintln!("Posting failed: {}", e);
            eprintln!("The browser is left open for inspection. Press Ctrl-C to exit.");
            wait_for_stop(&cancel).await;
        }
        _ => {
            if let Err(e) = driver.close().await {
                warn!("Browser did not close cleanly: {}", e);
            }
        }
    }

    result
}

/// Run `cli.count` cycles, printing one line per finished post.
///
/// A failed cycle is logged and the loop moves on; its keyword stays queued.
/// Missing input or invalid input halts the loop, as does a stop request.
/// The last cycle failure is returned once every cycle has run.
async fn post_loop(
    pipeline: &Pipeline,
    mut driver: Option<&mut dyn EditorDriver>,
    cli: &Cli,
    interval: Duration,
    format: OutputFormat,
) -> Result<()> {
    let keyword = cli.keyword.as_deref();
    let mut last_failure = None;

    for run in 1..=cli.count {
        if run > 1 {
            info!("Waiting {:?} before the next post", interval);
            pipeline.cancel_token().sleep(interval).await?;
        }
        info!("Cycle {}/{}", run, cli.count);

        let result = match driver.as_mut() {
            Some(d) => pipeline.run_once(&mut **d, keyword).await,
            None => pipeline.dry_run(keyword).await,
        };

        match result {
            Ok(RunOutcome::Stopped) => return Err(BlogcastError::Stopped),
            Ok(outcome) => print_outcome(&outcome, format),
            Err(e) if e.is_missing_input() || matches!(e, BlogcastError::InvalidInput(_)) => {
                return Err(e)
            }
            Err(e) => {
                error!("Cycle {}/{} failed: {}", run, cli.count, e);
                last_failure = Some(e);
            }
        }
    }

    last_failure.map_or(Ok(()), Err)
}

fn print_outcome(outcome: &RunOutcome, format: OutputFormat) {
    match (outcome, format) {
        (RunOutcome::Posted { url, .. }, OutputFormat::Text) => println!("{}", url),
        (RunOutcome::Drafted { record, .. }, OutputFormat::Text) => {
            println!("{}", record.display())
        }
        (RunOutcome::Posted { keyword, url }, OutputFormat::Json) => println!(
            "{}",
            serde_json::json!({ "keyword": keyword.as_str(), "url": url })
        ),
        (RunOutcome::Drafted { keyword, record }, OutputFormat::Json) => println!(
            "{}",
            serde_json::json!({ "keyword": keyword.as_str(), "record": record })
        ),
        (RunOutcome::Stopped, _) => {}
    }
}

/// Stop on SIGINT/SIGTERM, toggle pause on SIGUSR1
fn setup_signal_handlers(cancel: &CancelToken) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGUSR1])?;

    let cancel = cancel.clone();
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping at the next step...");
                    cancel.stop();
                }
                SIGUSR1 => {
                    if cancel.toggle_pause() {
                        info!("Paused; send SIGUSR1 again to resume");
                    } else {
                        info!("Resumed");
                    }
                }
                _ => {}
            }
        }
    });

    Ok(())
}

async fn wait_for_stop(cancel: &CancelToken) {
    while !cancel.is_stopped() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
