//! Highlight renderer
//!
//! `highlight` is a pure function of its inputs. Deferred rendering tags each
//! result with the edit generation it was requested at, and a `HighlightGate`
//! drops anything that arrives after a newer edit.

use std::time::Duration;

use quill_core::{QuillError, Result};
use serde::Serialize;
use tracing::debug;

use crate::search::find_matches;
use crate::syntax::{scan, Language, TokenClass};

/// Styling applied to one span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpanStyle {
    pub class: Option<TokenClass>,
    pub search_match: bool,
    pub dimmed: bool,
}

impl SpanStyle {
    pub fn is_plain(&self) -> bool {
        self.class.is_none() && !self.search_match && !self.dimmed
    }
}

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

/// Rendered output: spans concatenate back to the original content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Markup {
    pub spans: Vec<StyledSpan>,
}

impl Markup {
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn has_matches(&self) -> bool {
        self.spans.iter().any(|s| s.style.search_match)
    }

    /// HTML with escaped text; newlines are kept as-is
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for span in &self.spans {
            if span.style.is_plain() {
                escape_into(&mut html, &span.text);
                continue;
            }

            let mut classes = Vec::new();
            if let Some(class) = span.style.class {
                classes.push(class.css_class());
            }
            if span.style.search_match {
                classes.push("search-match");
            }
            if span.style.dimmed {
                classes.push("dimmed");
            }

            html.push_str("<span class=\"");
            html.push_str(&classes.join(" "));
            html.push_str("\">");
            escape_into(&mut html, &span.text);
            html.push_str("</span>");
        }
        html
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Render `content` into styled spans
pub fn highlight(content: &str, language: Option<Language>, term: &str, case_sensitive: bool) -> Markup {
    let Some(language) = language else {
        let spans = if content.is_empty() {
            Vec::new()
        } else {
            vec![StyledSpan { text: content.to_string(), style: SpanStyle::default() }]
        };
        return Markup { spans };
    };

    let chars: Vec<char> = content.chars().collect();
    let tokens = scan(content, language.descriptor()).tokens;
    let matches = find_matches(content, term, case_sensitive);
    let dim = !matches.is_empty();

    let mut cuts = vec![0, chars.len()];
    for token in &tokens {
        cuts.push(token.start);
        cuts.push(token.end);
    }
    for range in &matches {
        cuts.push(range.start);
        cuts.push(range.end);
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut spans: Vec<StyledSpan> = Vec::new();
    let mut token_idx = 0;
    let mut match_idx = 0;
    for window in cuts.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start == end {
            continue;
        }

        while token_idx < tokens.len() && tokens[token_idx].end <= start {
            token_idx += 1;
        }
        while match_idx < matches.len() && matches[match_idx].end <= start {
            match_idx += 1;
        }

        let class = tokens
            .get(token_idx)
            .filter(|t| t.start <= start)
            .map(|t| t.class);
        let search_match = matches.get(match_idx).is_some_and(|m| m.start <= start);
        let style = SpanStyle {
            class,
            search_match,
            dimmed: dim && !search_match && class.is_some(),
        };

        match spans.last_mut() {
            Some(last) if last.style == style => last.text.extend(&chars[start..end]),
            _ => spans.push(StyledSpan { text: chars[start..end].iter().collect(), style }),
        }
    }

    Markup { spans }
}

/// Edit generation a highlight was computed for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

/// Inputs for one deferred render
#[derive(Debug, Clone)]
pub struct HighlightRequest {
    pub generation: Generation,
    pub content: String,
    pub language: Option<Language>,
    pub term: String,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone)]
pub struct HighlightResult {
    pub generation: Generation,
    pub markup: Markup,
}

impl HighlightRequest {
    pub fn render(self) -> HighlightResult {
        let markup = highlight(&self.content, self.language, &self.term, self.case_sensitive);
        HighlightResult { generation: self.generation, markup }
    }

    /// Wait out `debounce`, then render on the blocking pool
    pub async fn render_deferred(self, debounce: Duration) -> Result<HighlightResult> {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }
        tokio::task::spawn_blocking(move || self.render())
            .await
            .map_err(|e| QuillError::Internal(format!("highlight task failed: {}", e)))
    }
}

/// Drops highlight results computed for an outdated generation
#[derive(Debug, Default)]
pub struct HighlightGate {
    latest: Generation,
}

impl HighlightGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Generation {
        self.latest
    }

    /// Record a committed edit
    pub fn observe(&mut self, generation: Generation) {
        if generation > self.latest {
            self.latest = generation;
        }
    }

    /// Accept `result` only if nothing newer has been committed
    pub fn accept(&mut self, result: HighlightResult) -> Option<Markup> {
        if result.generation < self.latest {
            debug!(
                "Discarding stale highlight (generation {} < {})",
                result.generation.0, self.latest.0
            );
            return None;
        }
        self.latest = result.generation;
        Some(result.markup)
    }
}
