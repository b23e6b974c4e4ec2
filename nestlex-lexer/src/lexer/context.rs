use super::{
    error::{Result, StreamSnapshot, TokenizerError},
    Token,
};
use crate::rules::{CompiledGrammar, ContextId};

/// One level of active scanning: a cursor into the source bound to the
/// pattern set of one context.
///
/// Positions of produced tokens are relative to the end of the previous token
/// produced by the same frame, so a new frame starts counting at line 1,
/// column 1.
#[derive(Debug, Clone)]
pub(crate) struct LexerContext {
    /// Context whose pattern set this frame scans with.
    context: ContextId,
    /// Byte offset of the unconsumed input. Only ever moves forward.
    cursor: usize,
    /// Token produced last by this frame, used for position bookkeeping.
    last_token: Option<Token>,
    /// Whether the parent exits as well once this frame exits.
    cascade_exit: bool,
}

/// Token found by [`LexerContext::forecast`], together with what is needed to
/// consume it.
#[derive(Debug, Clone)]
pub(crate) struct Forecast {
    pub(crate) token: Token,
    /// Context entered by the matched rule.
    pub(crate) enters: Option<ContextId>,
    /// Whether the matched rule exits the current context.
    pub(crate) exit: bool,
    /// Skipped whitespace and token text, in bytes.
    consumed: usize,
}

impl LexerContext {
    pub(crate) fn new(context: ContextId, cursor: usize, cascade_exit: bool) -> Self {
        Self {
            context,
            cursor,
            last_token: None,
            cascade_exit,
        }
    }

    pub(crate) fn context(&self) -> ContextId {
        self.context
    }

    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn cascade_exit(&self) -> bool {
        self.cascade_exit
    }

    /// Moves the cursor to where a nested frame stopped.
    pub(crate) fn resume_at(&mut self, cursor: usize) {
        debug_assert!(cursor >= self.cursor, "cursor moved backwards");
        self.cursor = cursor;
    }

    /// Position the next token starts at when no whitespace is skipped.
    fn next_position(&self) -> (usize, usize) {
        self.last_token
            .as_ref()
            .map_or((1, 1), |last| (last.end_line(), last.end_column() + 1))
    }

    /// Matches the next token without consuming it.
    ///
    /// Returns `None` when no input is left, after removing leading whitespace
    /// if `skip_whitespace` is set.
    ///
    /// # Fails
    ///
    /// When input is left, but no rule matches it or the matching rule matches
    /// the empty string.
    pub(crate) fn forecast(
        &self,
        source: &str,
        grammar: &CompiledGrammar,
        depth: usize,
        skip_whitespace: bool,
    ) -> Result<Option<Forecast>> {
        let context = grammar.context(self.context);
        let input = &source[self.cursor..];
        let snapshot = |skipped: usize| {
            StreamSnapshot::new(&context.name, depth, source, self.cursor + skipped)
        };

        let Some(found) = context.patterns.find(input, skip_whitespace) else {
            let rest = if skip_whitespace {
                crate::rules::pattern_set::split_whitespace(input).1
            } else {
                input
            };

            return if rest.is_empty() {
                Ok(None)
            } else {
                Err(TokenizerError::NoMatch {
                    snapshot: snapshot(input.len() - rest.len()),
                })
            };
        };

        if found.text.is_empty() {
            // nothing but whitespace left, and a rule accepts the empty string
            if found.skipped.len() == input.len() {
                return Ok(None);
            }

            return Err(TokenizerError::EmptyMatch {
                rule: found.rule.name().to_string(),
                snapshot: snapshot(found.skipped.len()),
            });
        }

        let (mut line, mut column) = self.next_position();
        if !found.rule.is_whitespace() && !found.skipped.is_empty() {
            match found.skipped.rsplit_once('\n') {
                Some((_, last_fragment)) => {
                    line += found.skipped.matches('\n').count();
                    column = 1 + last_fragment.chars().count();
                }
                None => column += found.skipped.chars().count(),
            }
        }

        Ok(Some(Forecast {
            token: Token::new(found.rule.name(), found.text, line, column),
            enters: context.targets[found.index],
            exit: found.rule.is_exit(),
            consumed: found.skipped.len() + found.text.len(),
        }))
    }

    /// Consumes a token previously returned by [`forecast`](Self::forecast)
    /// against the same state.
    pub(crate) fn advance(&mut self, forecast: &Forecast) {
        self.cursor += forecast.consumed;
        self.last_token = Some(forecast.token.clone());
    }
}
