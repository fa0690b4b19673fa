//! Normalize free-form model output into a title / intro / sections structure
//!
//! Three strategies are tried in order and the first one that produces a
//! non-empty title wins:
//!
//! 1. [`Strategy::Labeled`]: the text contains label lines such as `Title`,
//!    `Intro`, `Subtitle`, `Body` (or `제목`, `서론`, `소제목`, `본문`).
//! 2. [`Strategy::FixedLines`]: at least eight non-blank lines, read
//!    positionally as title, intro and three subtitle/body pairs.
//! 3. [`Strategy::Paragraphs`]: blank-line separated paragraphs.
//!
//! When the winning result has no sections, [`to_article`] falls back to a
//! plain article: the parsed title, with everything after it as body.

use serde::Serialize;

use crate::types::{Article, ParsedArticle, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Labeled,
    FixedLines,
    Paragraphs,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Labeled => write!(f, "labeled"),
            Strategy::FixedLines => write!(f, "fixed-lines"),
            Strategy::Paragraphs => write!(f, "paragraphs"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Title,
    Intro,
    Subtitle,
    Body,
}

const FIXED_LINE_COUNT: usize = 8;

/// Parse model output. Empty or blank input yields an empty article.
pub fn parse(raw: &str) -> ParsedArticle {
    parse_with_strategy(raw)
        .map(|(article, _)| article)
        .unwrap_or_default()
}

/// Parse model output and report which strategy produced the result
pub fn parse_with_strategy(raw: &str) -> Option<(ParsedArticle, Strategy)> {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let attempts: [(Strategy, fn(&[&str]) -> Option<ParsedArticle>); 3] = [
        (Strategy::Labeled, parse_labeled),
        (Strategy::FixedLines, parse_fixed_lines),
        (Strategy::Paragraphs, parse_paragraphs),
    ];

    attempts.into_iter().find_map(|(strategy, attempt)| {
        attempt(&lines)
            .filter(|article| !article.title.is_empty())
            .map(|article| (article, strategy))
    })
}

/// Turn model output into something postable.
///
/// Output without sections becomes a plain article that keeps the parsed
/// title and carries everything after it as the body. Returns `None` when
/// nothing usable was produced (no title at all).
pub fn to_article(raw: &str) -> Option<Article> {
    let parsed = parse(raw);
    if parsed.title.is_empty() {
        return None;
    }
    if !parsed.sections.is_empty() {
        return Some(Article::Structured(parsed));
    }

    Some(Article::Plain {
        title: parsed.title,
        body: parsed.intro,
    })
}

fn label_of(line: &str) -> Option<Label> {
    let cleaned = clean_heading(line);
    let cleaned = cleaned
        .trim_end_matches([':', '：'])
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    match cleaned.to_lowercase().as_str() {
        "title" | "제목" => Some(Label::Title),
        "intro" | "introduction" | "서론" | "도입" | "도입부" => Some(Label::Intro),
        "subtitle" | "소제목" => Some(Label::Subtitle),
        "body" | "본문" => Some(Label::Body),
        _ => None,
    }
}

/// Strip markdown heading markers and emphasis around a line
fn clean_heading(line: &str) -> String {
    let mut s = line.trim();
    s = s.trim_start_matches('#').trim();
    while s.len() >= 4 && s.starts_with("**") && s.ends_with("**") {
        s = s[2..s.len() - 2].trim();
    }
    s.to_string()
}

#[derive(Default)]
struct Block<'a> {
    subtitle: Vec<&'a str>,
    body: Vec<&'a str>,
}

fn parse_labeled(lines: &[&str]) -> Option<ParsedArticle> {
    if !lines.iter().any(|l| label_of(l).is_some()) {
        return None;
    }

    let mut title: Vec<&str> = Vec::new();
    let mut intro: Vec<&str> = Vec::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut active: Option<Label> = None;

    for &line in lines {
        if let Some(label) = label_of(line) {
            match label {
                Label::Subtitle => blocks.push(Block::default()),
                Label::Body if blocks.is_empty() => blocks.push(Block::default()),
                _ => {}
            }
            active = Some(label);
            continue;
        }

        match active {
            None => {}
            Some(Label::Title) => title.push(line),
            Some(Label::Intro) => intro.push(line),
            Some(Label::Subtitle) => {
                if let Some(block) = blocks.last_mut() {
                    block.subtitle.push(line);
                }
            }
            Some(Label::Body) => {
                if let Some(block) = blocks.last_mut() {
                    block.body.push(line);
                }
            }
        }
    }

    Some(ParsedArticle {
        title: join_words(&title),
        intro: join_lines(&intro),
        sections: blocks
            .into_iter()
            .map(|b| Section::new(join_words(&b.subtitle), join_lines(&b.body)))
            .collect(),
    })
}

fn parse_fixed_lines(lines: &[&str]) -> Option<ParsedArticle> {
    let content: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if content.len() < FIXED_LINE_COUNT {
        return None;
    }

    let mut sections: Vec<Section> = content[2..FIXED_LINE_COUNT]
        .chunks(2)
        .map(|pair| Section::new(clean_heading(pair[0]), pair[1]))
        .collect();

    let overflow = &content[FIXED_LINE_COUNT..];
    if let Some(last) = sections.last_mut() {
        for extra in overflow {
            last.body.push('\n');
            last.body.push_str(extra);
        }
    }

    Some(ParsedArticle {
        title: clean_heading(content[0]),
        intro: content[1].to_string(),
        sections,
    })
}

fn parse_paragraphs(lines: &[&str]) -> Option<ParsedArticle> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for &line in lines {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let mut paragraphs = paragraphs.into_iter();
    let first = paragraphs.next()?;
    let title = clean_heading(first[0]);

    let mut intro: Vec<&str> = first[1..].to_vec();
    if let Some(second) = paragraphs.next() {
        intro.extend(second);
    }
    let mut intro = join_lines(&intro);

    let rest: Vec<Vec<&str>> = paragraphs.collect();
    let mut sections: Vec<Section> = Vec::new();
    for pair in rest.chunks(2) {
        match pair {
            [subtitle, body] => sections.push(Section::new(
                clean_heading(&join_words(subtitle)),
                join_lines(body),
            )),
            [trailing] => {
                let text = join_lines(trailing);
                match sections.last_mut() {
                    Some(last) => {
                        last.body.push('\n');
                        last.body.push_str(&text);
                    }
                    None if intro.is_empty() => intro = text,
                    None => {
                        intro.push('\n');
                        intro.push_str(&text);
                    }
                }
            }
            _ => {}
        }
    }

    Some(ParsedArticle {
        title,
        intro,
        sections,
    })
}

fn join_words(lines: &[&str]) -> String {
    let words: Vec<String> = lines
        .iter()
        .map(|l| clean_heading(l))
        .filter(|l| !l.is_empty())
        .collect();
    words.join(" ")
}

fn join_lines(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}
