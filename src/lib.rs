//! Configurable lexical scanner with nested contexts.
//!
//! The scanning engine lives in [`nestlex_lexer`] and is re-exported here.
//! [`config`] adds grammars declared in TOML files.

pub use nestlex_lexer::{
    base_rules, CompiledGrammar, Grammar, GrammarBuilder, LexerStream, PatternMatch, PatternSet,
    Result, Rule, StreamSnapshot, Token, Tokenizer, TokenizerError, Tokens, DEFAULT_CONTEXT,
    WHITESPACE,
};

pub use config::{load_grammar, load_tokenizer, parse_grammar, ConfigError};

pub mod config;
