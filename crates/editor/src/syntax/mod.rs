//! Syntax scanning
//!
//! One generic scanner parameterized by per-language descriptors.

pub mod language;
pub mod scanner;

pub use language::{BlockComment, BlockHeaders, Language, LanguageDescriptor};
pub use scanner::{scan, ScanOutput, Token, TokenClass};
