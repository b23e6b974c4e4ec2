//! Scanning engine of `nestlex`.
//!
//! Rules are grouped into named contexts by a [`Grammar`]. Compiling the
//! grammar turns every context into a [`PatternSet`], an ordered alternation
//! where the first matching rule wins. A [`LexerStream`] scans a source text
//! with a stack of contexts: rules may enter another context, and exit rules
//! return to the parent.
//!
//! ```
//! use nestlex_lexer::{Grammar, Rule, Tokenizer, WHITESPACE};
//!
//! let grammar = Grammar::builder()
//!     .with_context(
//!         "main",
//!         [
//!             Rule::new("T_QUOTE", "\"").enters("string"),
//!             Rule::new("T_WORD", r"\w+"),
//!             Rule::new(WHITESPACE, r"\s+"),
//!         ],
//!     )
//!     .with_context(
//!         "string",
//!         [
//!             Rule::new("T_QUOTE", "\"").exit(),
//!             Rule::new("T_TEXT", r#"[^"]+"#),
//!         ],
//!     )
//!     .build();
//!
//! let mut stream = Tokenizer::new(&grammar)?.tokenize(r#"say "hello world""#);
//! let rules = stream
//!     .to_vec(true)?
//!     .iter()
//!     .map(|token| token.rule().to_string())
//!     .collect::<Vec<_>>();
//!
//! assert_eq!(rules, ["T_WORD", "T_QUOTE", "T_TEXT", "T_QUOTE"]);
//! # Ok::<(), nestlex_lexer::TokenizerError>(())
//! ```

pub use lexer::{
    error::{Result, StreamSnapshot, TokenizerError},
    LexerStream, Token, Tokenizer, Tokens,
};
pub use rules::{
    base_rules, CompiledGrammar, Grammar, GrammarBuilder, PatternMatch, PatternSet, Rule,
    DEFAULT_CONTEXT, WHITESPACE,
};

mod lexer;
mod rules;
