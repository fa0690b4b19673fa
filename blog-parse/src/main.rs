//! blog-parse - Show how model output will be split into a post
//!
//! Reads raw model output (a `_raw.txt` result file, or stdin) and prints the
//! title, intro and sections that blog-post would type into the editor.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use libblogcast::parser::{self, Strategy};
use libblogcast::{logging, Article, BlogcastError, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "blog-parse")]
#[command(version)]
#[command(about = "Parse raw model output into a structured article")]
#[command(long_about = "\
blog-parse - Parse raw model output into a structured article

DESCRIPTION:
    blog-parse applies the same parser blog-post uses and prints the result.
    Labeled output (Title/Intro/Subtitle/Body or 제목/서론/소제목/본문) is tried
    first, then eight fixed lines, then blank-line separated paragraphs.
    Output without sections is shown as a plain article.

USAGE EXAMPLES:
    # Check a saved raw response
    blog-parse results/jeju_20260304_050607_raw.txt

    # Pipe model output and inspect the JSON
    cat response.txt | blog-parse --format json | jq .article.sections

EXIT CODES:
    0 - Success
    1 - Reading the input failed
    3 - Input has no usable title
")]
struct Cli {
    /// File with raw model output; reads stdin when omitted or '-'
    file: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ParseReport {
    strategy: Option<Strategy>,
    article: Article,
}

fn main() {
    let cli = Cli::parse();

    logging::init_default(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.format != "text" && cli.format != "json" {
        return Err(BlogcastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            cli.format
        )));
    }

    let raw = read_input(cli.file.as_ref())?;
    let report = build_report(&raw)?;
    debug!("Parsed with strategy {:?}", report.strategy);

    if cli.format == "json" {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| BlogcastError::InvalidInput(format!("Failed to encode JSON: {}", e)))?;
        println!("{}", json);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => {
            std::fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BlogcastError::InvalidInput(format!("File not found: {}", path.display()))
                } else {
                    BlogcastError::Io(e)
                }
            })
        }
        _ => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}

fn build_report(raw: &str) -> Result<ParseReport> {
    let strategy = parser::parse_with_strategy(raw).map(|(_, strategy)| strategy);
    let article = parser::to_article(raw).ok_or_else(|| {
        BlogcastError::InvalidInput("Input has no usable title".to_string())
    })?;
    Ok(ParseReport { strategy, article })
}

fn render_text(report: &ParseReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Title: {}\n", report.article.title()));
    if let Some(strategy) = report.strategy {
        out.push_str(&format!("Strategy: {}\n", strategy));
    }

    match &report.article {
        Article::Plain { body, .. } => {
            out.push_str("Layout: plain\n");
            if !body.is_empty() {
                out.push_str(&format!("\n{}\n", body));
            }
        }
        Article::Structured(parsed) => {
            out.push_str(&format!("Sections: {}\n", parsed.sections.len()));
            if !parsed.intro.is_empty() {
                out.push_str(&format!("\nIntro:\n{}\n", parsed.intro));
            }
            for (i, section) in parsed.sections.iter().enumerate() {
                out.push_str(&format!("\n[{}] {}\n", i + 1, section.subtitle));
                if !section.body.is_empty() {
                    out.push_str(&format!("{}\n", section.body));
                }
            }
        }
    }
    out
}
