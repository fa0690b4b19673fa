//! blog-queue - Manage the keyword queue
//!
//! Unix-style tool for inspecting and editing `keywords.txt` and the used log.

use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use libblogcast::{logging, BlogcastError, Config, Keyword, KeywordQueue, Result};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "blog-queue")]
#[command(version)]
#[command(about = "Manage the keyword queue")]
#[command(long_about = "\
blog-queue - Manage the keyword queue

DESCRIPTION:
    blog-queue lists, adds and skips keywords in keywords.txt and shows what
    has already been posted (used_keywords.txt). blog-post always takes the
    first keyword in the file.

COMMANDS:
    list    List pending keywords in posting order
    add     Append keywords (arguments, or one per line on stdin)
    skip    Remove a keyword without marking it used
    stats   Show pending and used counts and the next keyword
    used    List keywords that have been posted

USAGE EXAMPLES:
    # See what will be posted next
    blog-queue list

    # Queue two keywords
    blog-queue add \"제주 여행\" \"부산 맛집\"

    # Queue a whole file
    cat ideas.txt | blog-queue add

    # Machine-readable statistics
    blog-queue stats --format json

CONFIGURATION:
    Configuration file: ~/.config/blogcast/config.toml
    Override with BLOGCAST_CONFIG or --config.

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Configuration error or missing keyword file
    3 - Invalid input (unknown keyword, bad format)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "BLOGCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List pending keywords
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Append keywords to the queue
    Add {
        /// Keywords to add; read from stdin when omitted
        keywords: Vec<String>,
    },

    /// Remove a keyword without marking it used
    Skip {
        keyword: String,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List keywords that have been posted
    Used {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();

    logging::LoggingConfig::new(
        logging::LogFormat::Text,
        "warn".to_string(),
        cli.verbose,
    )
    .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let queue = KeywordQueue::new(
        config.files.keywords_path(),
        config.files.used_keywords_path(),
    )
    .with_retry(config.retry.file_policy()?);
    debug!("Queue file: {}", queue.pending_path().display());

    match cli.command {
        Commands::List { format } => cmd_list(&queue, &format),
        Commands::Add { keywords } => cmd_add(&queue, keywords),
        Commands::Skip { keyword } => cmd_skip(&queue, &keyword),
        Commands::Stats { format } => cmd_stats(&queue, &format),
        Commands::Used { format } => cmd_used(&queue, &format),
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(BlogcastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn cmd_list(queue: &KeywordQueue, format: &str) -> Result<()> {
    validate_format(format)?;
    print_keywords(&queue.pending()?, format);
    Ok(())
}

fn cmd_used(queue: &KeywordQueue, format: &str) -> Result<()> {
    validate_format(format)?;
    print_keywords(&queue.used()?, format);
    Ok(())
}

fn print_keywords(keywords: &[Keyword], format: &str) {
    if format == "json" {
        let list: Vec<&str> = keywords.iter().map(Keyword::as_str).collect();
        println!("{}", serde_json::json!(list));
    } else {
        for keyword in keywords {
            println!("{}", keyword);
        }
    }
}

fn cmd_add(queue: &KeywordQueue, keywords: Vec<String>) -> Result<()> {
    let keywords = if keywords.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<String>>>()?
    } else {
        keywords
    };

    let added = queue.add(&keywords)?;
    if added == 0 {
        return Err(BlogcastError::InvalidInput(
            "No keywords given (blank lines and # comments are ignored)".to_string(),
        ));
    }
    println!("Added {} keyword{}", added, if added == 1 { "" } else { "s" });
    Ok(())
}

fn cmd_skip(queue: &KeywordQueue, keyword: &str) -> Result<()> {
    let keyword = Keyword::from_line(keyword)
        .ok_or_else(|| BlogcastError::InvalidInput(format!("'{}' is not a keyword", keyword)))?;
    queue.skip(&keyword).map_err(|e| match e {
        BlogcastError::Queue(libblogcast::error::QueueError::NotQueued(k)) => {
            BlogcastError::InvalidInput(format!("'{}' is not in the queue", k))
        }
        other => other,
    })?;
    println!("Skipped {}", keyword);
    Ok(())
}

fn cmd_stats(queue: &KeywordQueue, format: &str) -> Result<()> {
    validate_format(format)?;
    let stats = queue.stats()?;

    if format == "json" {
        println!("{}", serde_json::json!(stats));
    } else {
        println!("Pending: {}", stats.pending);
        println!("Used: {}", stats.used);
        println!("Next: {}", stats.next.as_deref().unwrap_or("-"));
    }
    Ok(())
}
