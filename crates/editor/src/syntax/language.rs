//! Language descriptors
//!
//! Each supported language is a declarative table fed to the one generic
//! scanner. Adding a language means adding a descriptor, not a state machine.

use serde::{Deserialize, Serialize};

/// Block comment markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockComment {
    pub open: &'static str,
    pub close: &'static str,
}

/// Block-header rule: lines starting with one of `keywords` must end in `open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeaders {
    pub keywords: &'static [&'static str],
    pub open: char,
}

/// Everything the scanner needs to know about a language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageDescriptor {
    pub name: &'static str,
    pub line_comment: Option<&'static str>,
    pub block_comment: Option<BlockComment>,
    /// String delimiters; the longest one present wins
    pub string_delimiters: &'static [&'static str],
    /// Delimiters whose strings may span lines
    pub multiline_delimiters: &'static [&'static str],
    /// Identifier prefixes that may sit directly before a string, compared case-insensitively
    pub string_prefixes: &'static [&'static str],
    /// A prefix containing this char (either case) turns off escape checking
    pub raw_marker: Option<char>,
    /// Quote for single-char literals such as `'x'`; an unclosed one is an operator
    pub char_quote: Option<char>,
    /// Chars allowed after a backslash inside a string
    pub allowed_escapes: &'static [char],
    pub bracket_pairs: &'static [(char, char)],
    pub keywords: &'static [&'static str],
    pub block_headers: Option<BlockHeaders>,
    /// Flag indentation mixing tabs and spaces
    pub check_indentation: bool,
}

impl LanguageDescriptor {
    pub fn is_multiline(&self, delimiter: &str) -> bool {
        self.multiline_delimiters.contains(&delimiter)
    }

    pub fn is_string_prefix(&self, word: &str) -> bool {
        self.string_prefixes.iter().any(|p| p.eq_ignore_ascii_case(word))
    }

    /// Whether a string opened with `prefix` skips escape checks
    pub fn is_raw_prefix(&self, prefix: &str) -> bool {
        self.raw_marker
            .is_some_and(|marker| prefix.chars().any(|c| c.eq_ignore_ascii_case(&marker)))
    }

    pub fn is_allowed_escape(&self, ch: char) -> bool {
        self.allowed_escapes.contains(&ch)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word)
    }

    pub fn is_opener(&self, ch: char) -> bool {
        self.bracket_pairs.iter().any(|(open, _)| *open == ch)
    }

    pub fn is_closer(&self, ch: char) -> bool {
        self.bracket_pairs.iter().any(|(_, close)| *close == ch)
    }

    /// Whether `open` and `close` form a pair
    pub fn pairs(&self, open: char, close: char) -> bool {
        self.bracket_pairs.iter().any(|pair| *pair == (open, close))
    }
}

const BRACKETS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}')];

const C_STYLE_ESCAPES: &[char] = &[
    'n', 't', 'r', 'b', 'f', 'v', '0', '\\', '\'', '"', '`', 'x', 'u', '$',
];

const JAVASCRIPT: LanguageDescriptor = LanguageDescriptor {
    name: "javascript",
    line_comment: Some("//"),
    block_comment: Some(BlockComment { open: "/*", close: "*/" }),
    string_delimiters: &["\"", "'", "`"],
    multiline_delimiters: &["`"],
    string_prefixes: &[],
    raw_marker: None,
    char_quote: None,
    allowed_escapes: C_STYLE_ESCAPES,
    bracket_pairs: BRACKETS,
    keywords: &[
        "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
        "delete", "do", "else", "export", "extends", "false", "finally", "for", "function", "if",
        "import", "in", "instanceof", "let", "new", "null", "of", "return", "static", "super",
        "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while",
        "yield",
    ],
    block_headers: Some(BlockHeaders {
        keywords: &["if", "else", "for", "while", "function", "class", "switch", "try", "catch", "finally", "do"],
        open: '{',
    }),
    check_indentation: false,
};

const PYTHON: LanguageDescriptor = LanguageDescriptor {
    name: "python",
    line_comment: Some("#"),
    block_comment: None,
    string_delimiters: &["\"\"\"", "'''", "\"", "'"],
    multiline_delimiters: &["\"\"\"", "'''"],
    string_prefixes: &["r", "u", "b", "f", "br", "rb", "fr", "rf"],
    raw_marker: Some('r'),
    char_quote: None,
    allowed_escapes: &[
        'n', 't', 'r', 'b', 'f', 'v', 'a', '0', '\\', '\'', '"', 'x', 'u', 'U', 'N',
    ],
    bracket_pairs: BRACKETS,
    keywords: &[
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
        "try", "while", "with", "yield",
    ],
    block_headers: Some(BlockHeaders {
        keywords: &["if", "elif", "else", "for", "while", "def", "class", "try", "except", "finally", "with"],
        open: ':',
    }),
    check_indentation: true,
};

const RUST: LanguageDescriptor = LanguageDescriptor {
    name: "rust",
    line_comment: Some("//"),
    block_comment: Some(BlockComment { open: "/*", close: "*/" }),
    string_delimiters: &["\""],
    multiline_delimiters: &["\""],
    string_prefixes: &["b", "r", "br"],
    raw_marker: Some('r'),
    char_quote: Some('\''),
    allowed_escapes: &['n', 't', 'r', '0', '\\', '\'', '"', 'x', 'u'],
    bracket_pairs: BRACKETS,
    keywords: &[
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
        "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
        "true", "type", "unsafe", "use", "where", "while",
    ],
    block_headers: Some(BlockHeaders {
        keywords: &["if", "else", "for", "while", "loop", "match", "impl", "trait"],
        open: '{',
    }),
    check_indentation: false,
};

const JSON: LanguageDescriptor = LanguageDescriptor {
    name: "json",
    line_comment: None,
    block_comment: None,
    string_delimiters: &["\""],
    multiline_delimiters: &[],
    string_prefixes: &[],
    raw_marker: None,
    char_quote: None,
    allowed_escapes: &['"', '\\', '/', 'b', 'f', 'n', 'r', 't', 'u'],
    bracket_pairs: &[('[', ']'), ('{', '}')],
    keywords: &["true", "false", "null"],
    block_headers: None,
    check_indentation: false,
};

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Rust,
    Json,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::JavaScript, Language::Python, Language::Rust, Language::Json];

    /// The descriptor driving the scanner for this language
    pub fn descriptor(&self) -> &'static LanguageDescriptor {
        match self {
            Language::JavaScript => &JAVASCRIPT,
            Language::Python => &PYTHON,
            Language::Rust => &RUST,
            Language::Json => &JSON,
        }
    }

    /// Resolve a language identifier as reported by the file loader
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "javascript" | "js" | "typescript" | "ts" | "jsx" | "tsx" => Some(Language::JavaScript),
            "python" | "py" => Some(Language::Python),
            "rust" | "rs" => Some(Language::Rust),
            "json" => Some(Language::Json),
            _ => None,
        }
    }

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => Some(Language::JavaScript),
            "py" | "pyw" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            "json" => Some(Language::Json),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_and_extension() {
        assert_eq!(Language::from_id("JavaScript"), Some(Language::JavaScript));
        assert_eq!(Language::from_id("py"), Some(Language::Python));
        assert_eq!(Language::from_id("cobol"), None);
        assert_eq!(Language::from_extension(".RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("json"), Some(Language::Json));
        assert_eq!(Language::from_extension("txt"), None);
    }

    #[test]
    fn test_descriptor_pairs() {
        for language in Language::ALL {
            let desc = language.descriptor();
            assert_eq!(desc.name, language.name());
            for (open, close) in desc.bracket_pairs {
                assert!(desc.pairs(*open, *close));
                assert!(desc.is_opener(*open));
                assert!(desc.is_closer(*close));
            }
        }
        assert!(!Language::Json.descriptor().is_opener('('));
    }

    #[test]
    fn test_string_prefixes() {
        let python = Language::Python.descriptor();
        assert!(python.is_string_prefix("R"));
        assert!(python.is_string_prefix("Rb"));
        assert!(!python.is_string_prefix("x"));
        assert!(python.is_raw_prefix("bR"));
        assert!(!python.is_raw_prefix("f"));
        assert!(python.is_multiline("'''"));
        assert!(!python.is_multiline("'"));
        assert!(!Language::JavaScript.descriptor().is_raw_prefix("r"));
    }
}
