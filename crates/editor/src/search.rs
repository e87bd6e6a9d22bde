//! Search and replace
//!
//! Matches are tracked per line: a line with several hits is one entry.
//! Replace-all sweeps the whole content left to right and never rescans text
//! it has just inserted.

use std::ops::Range;

use serde::Serialize;
use tracing::debug;

/// Find every non-overlapping occurrence of `term`, as char-offset ranges
pub fn find_matches(content: &str, term: &str, case_sensitive: bool) -> Vec<Range<usize>> {
    let haystack: Vec<char> = content.chars().collect();
    find_in_chars(&haystack, term, case_sensitive)
}

fn find_in_chars(haystack: &[char], term: &str, case_sensitive: bool) -> Vec<Range<usize>> {
    let needle: Vec<char> = term.chars().collect();
    let mut matches = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return matches;
    }

    let mut pos = 0;
    while pos + needle.len() <= haystack.len() {
        let window = &haystack[pos..pos + needle.len()];
        if window.iter().zip(&needle).all(|(a, b)| chars_match(*a, *b, case_sensitive)) {
            matches.push(pos..pos + needle.len());
            pos += needle.len();
        } else {
            pos += 1;
        }
    }
    matches
}

fn chars_match(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a == b || a.to_lowercase().eq(b.to_lowercase())
    }
}

/// Replace every occurrence of `term` in one forward sweep.
/// Returns the new content and the number of replacements.
pub fn replace_all(content: &str, term: &str, replacement: &str, case_sensitive: bool) -> (String, usize) {
    let chars: Vec<char> = content.chars().collect();
    let matches = find_in_chars(&chars, term, case_sensitive);
    if matches.is_empty() {
        return (content.to_string(), 0);
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for range in &matches {
        out.extend(&chars[last..range.start]);
        out.push_str(replacement);
        last = range.end;
    }
    out.extend(&chars[last..]);
    (out, matches.len())
}

/// One line containing at least one match; `line_number` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub line_number: usize,
}

/// A single-range edit produced by replace-one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceEdit {
    pub range: Range<usize>,
    pub text: String,
}

/// Search state: term, line matches and the current cursor
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    term: String,
    case_sensitive: bool,
    matches: Vec<SearchMatch>,
    cursor: Option<usize>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a search; the cursor lands on the first match if there is one
    pub fn search(&mut self, content: &str, term: &str, case_sensitive: bool) -> &[SearchMatch] {
        self.term = term.to_string();
        self.case_sensitive = case_sensitive;
        self.matches = content
            .split('\n')
            .enumerate()
            .filter(|(_, line)| !find_matches(line, term, case_sensitive).is_empty())
            .map(|(idx, _)| SearchMatch { line_number: idx + 1 })
            .collect();
        self.cursor = if self.matches.is_empty() { None } else { Some(0) };

        debug!("Search {:?}: {} matching lines", term, self.matches.len());
        &self.matches
    }

    /// Re-run the current search against updated content
    pub fn refresh(&mut self, content: &str) {
        if self.term.is_empty() {
            return;
        }
        let term = std::mem::take(&mut self.term);
        let cursor = self.cursor;
        self.search(content, &term, self.case_sensitive);
        if let Some(previous) = cursor {
            self.cursor = self.clamp_cursor(previous);
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<SearchMatch> {
        self.cursor.and_then(|i| self.matches.get(i).copied())
    }

    /// Advance to the next match, wrapping around
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.cursor = Some(self.cursor.map_or(0, |i| (i + 1) % len));
        self.current()
    }

    /// Step back to the previous match, wrapping around
    pub fn previous(&mut self) -> Option<SearchMatch> {
        let len = self.matches.len();
        if len == 0 {
            return None;
        }
        self.cursor = Some(self.cursor.map_or(len - 1, |i| (i + len - 1) % len));
        self.current()
    }

    /// Replace the first occurrence on the line of match `index`.
    /// The entry leaves the match list and the cursor is clamped back into range.
    pub fn replace_one(&mut self, content: &str, index: usize, replacement: &str) -> Option<ReplaceEdit> {
        let entry = *self.matches.get(index)?;
        let line_idx = entry.line_number - 1;

        let mut line_start = 0;
        let mut line_text = None;
        for (idx, line) in content.split('\n').enumerate() {
            if idx == line_idx {
                line_text = Some(line);
                break;
            }
            line_start += line.chars().count() + 1;
        }

        let edit = line_text
            .and_then(|line| find_matches(line, &self.term, self.case_sensitive).into_iter().next())
            .map(|hit| ReplaceEdit {
                range: line_start + hit.start..line_start + hit.end,
                text: replacement.to_string(),
            });

        self.matches.remove(index);
        self.cursor = self.clamp_cursor(self.cursor.unwrap_or(0));
        edit
    }

    /// Replace every occurrence of the current term and clear the match list
    pub fn replace_all(&mut self, content: &str, replacement: &str) -> (String, usize) {
        let result = replace_all(content, &self.term, replacement, self.case_sensitive);
        self.clear_matches();
        result
    }

    /// Drop matches but keep the term
    pub fn clear_matches(&mut self) {
        self.matches.clear();
        self.cursor = None;
    }

    pub fn clear(&mut self) {
        self.term.clear();
        self.clear_matches();
    }

    fn clamp_cursor(&self, cursor: usize) -> Option<usize> {
        if self.matches.is_empty() {
            None
        } else {
            Some(cursor.min(self.matches.len() - 1))
        }
    }
}
