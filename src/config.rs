//! Declarative grammar files.
//!
//! A grammar file is TOML. Contexts are declared as an array of tables, each
//! with its rules in priority order:
//!
//! ```toml
//! root = "main"
//!
//! [[context]]
//! name = "main"
//! include_base = true
//! rules = [
//!     { name = "T_ENTER", pattern = '::enterState', enters = "sub" },
//! ]
//!
//! [[context]]
//! name = "sub"
//! rules = [
//!     { name = "T_EXIT", pattern = '::exitState', exit = true },
//!     { name = "T_PERCENT", pattern = '%%%' },
//! ]
//! ```

use nestlex_lexer::{base_rules, Grammar, Rule, Tokenizer, TokenizerError};

use serde::Deserialize;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read grammar file `{}`: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse grammar: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("grammar declares no context")]
    Empty,

    #[error(transparent)]
    Lexer(#[from] TokenizerError),
}

/// Contents of a grammar file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarFile {
    /// Context scanning starts in. Defaults to the first context.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default, rename = "context")]
    pub contexts: Vec<ContextDecl>,
}

/// One `[[context]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextDecl {
    pub name: String,
    /// Appends the base rules after `rules`, except for names declared already.
    #[serde(default)]
    pub include_base: bool,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl ContextDecl {
    fn into_rules(self) -> Vec<Rule> {
        let mut rules = self.rules;

        if self.include_base {
            let declared = rules
                .iter()
                .map(|rule| rule.name().to_string())
                .collect::<HashSet<_>>();
            rules.extend(
                base_rules()
                    .into_iter()
                    .filter(|rule| !declared.contains(rule.name())),
            );
        }

        rules
    }
}

impl GrammarFile {
    pub fn into_grammar(self) -> ConfigResult<Grammar> {
        if self.contexts.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut builder = Grammar::builder();
        if let Some(root) = self.root {
            builder.set_root(root);
        }
        for context in self.contexts {
            let name = context.name.clone();
            builder.add_context(name, context.into_rules());
        }

        Ok(builder.build())
    }
}

impl TryFrom<GrammarFile> for Grammar {
    type Error = ConfigError;

    fn try_from(file: GrammarFile) -> ConfigResult<Self> {
        file.into_grammar()
    }
}

/// Parses the TOML text of a grammar file. The grammar is not compiled.
pub fn parse_grammar(text: &str) -> ConfigResult<Grammar> {
    toml::from_str::<GrammarFile>(text)?.into_grammar()
}

/// Reads and parses a grammar file.
pub fn load_grammar(path: impl AsRef<Path>) -> ConfigResult<Grammar> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "loaded grammar file");
    parse_grammar(&text)
}

/// Reads a grammar file and compiles it.
pub fn load_tokenizer(path: impl AsRef<Path>) -> ConfigResult<Tokenizer> {
    Ok(Tokenizer::new(&load_grammar(path)?)?)
}
