use super::Token;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenizerError>;

/// Maximum number of characters of the remaining input kept in a
/// [`StreamSnapshot`].
const PREVIEW_LEN: usize = 24;

/// Errors raised while compiling rules or scanning input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizerError {
    /// The rule set is malformed. Raised when a grammar is compiled.
    #[error("invalid rule `{rule}` in context `{context}`: {reason}")]
    InvalidRule {
        context: String,
        rule: String,
        reason: String,
    },

    /// Input is left, but no rule of the active context matches it.
    #[error("{snapshot}: no matching rule found, but there is still content left")]
    NoMatch { snapshot: StreamSnapshot },

    /// The winning rule matched zero characters.
    #[error("{snapshot}: rule `{rule}` matched an empty string")]
    EmptyMatch {
        rule: String,
        snapshot: StreamSnapshot,
    },

    /// A token was produced that the caller did not allow.
    #[error(
        "{}: unexpected {} {:?}, expected one of [{}]",
        .snapshot,
        .token.rule(),
        .token.value(),
        .expected.join(", ")
    )]
    UnexpectedToken {
        token: Token,
        expected: Vec<String>,
        snapshot: StreamSnapshot,
    },
}

impl TokenizerError {
    pub(crate) fn invalid_rule(
        context: impl Into<String>,
        rule: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidRule {
            context: context.into(),
            rule: rule.into(),
            reason: reason.to_string(),
        }
    }

    /// State of the stream at the moment the error was raised. Not available
    /// for errors raised before scanning started.
    pub fn snapshot(&self) -> Option<&StreamSnapshot> {
        match self {
            Self::InvalidRule { .. } => None,
            Self::NoMatch { snapshot }
            | Self::EmptyMatch { snapshot, .. }
            | Self::UnexpectedToken { snapshot, .. } => Some(snapshot),
        }
    }
}

/// Diagnostic copy of the state of the stream that raised an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSnapshot {
    /// Name of the innermost active context.
    pub context: String,
    /// Number of active frames, 1 meaning only the root context.
    pub depth: usize,
    /// Byte offset of the cursor into the source.
    pub offset: usize,
    /// Line of the cursor, counted over the whole source.
    pub line: usize,
    /// Column of the cursor, counted over the whole source.
    pub column: usize,
    /// Start of the unconsumed input.
    pub preview: String,
}

impl StreamSnapshot {
    pub(crate) fn new(context: &str, depth: usize, source: &str, offset: usize) -> Self {
        let consumed = &source[..offset];
        let line = 1 + consumed.matches('\n').count();
        let column = match consumed.rsplit_once('\n') {
            Some((_, last_line)) => last_line.chars().count() + 1,
            None => consumed.chars().count() + 1,
        };

        Self {
            context: context.to_string(),
            depth,
            offset,
            line,
            column,
            preview: source[offset..].chars().take(PREVIEW_LEN).collect(),
        }
    }
}

impl std::fmt::Display for StreamSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[ERROR] ({}, {}) in `{}` at {:?}",
            self.line, self.column, self.context, self.preview
        )
    }
}
