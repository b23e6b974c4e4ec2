use self::{
    context::LexerContext,
    error::{Result, StreamSnapshot, TokenizerError},
};
use crate::rules::{CompiledGrammar, Grammar, Rule};

pub use self::token::Token;

use std::sync::Arc;
use tracing::{debug, trace};

mod context;
pub(crate) mod error;
mod token;

#[cfg(test)]
mod tests;

/// Creates [`LexerStream`]s from a grammar compiled once.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    grammar: Arc<CompiledGrammar>,
}

impl Tokenizer {
    /// Compiles `grammar`.
    ///
    /// # Fails
    ///
    /// When the grammar is invalid, see [`Grammar::compile`].
    pub fn new(grammar: &Grammar) -> Result<Self> {
        Ok(Self::from_compiled(grammar.compile()?))
    }

    /// Compiles a grammar consisting of a single context.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Result<Self> {
        Self::new(&Grammar::single(rules))
    }

    pub fn from_compiled(grammar: CompiledGrammar) -> Self {
        Self {
            grammar: Arc::new(grammar),
        }
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    /// Starts scanning `source` in the root context.
    pub fn tokenize(&self, source: impl Into<Arc<str>>) -> LexerStream {
        LexerStream::new(Arc::clone(&self.grammar), source)
    }
}

/// Pull-based token stream over one source text.
///
/// The stream keeps a stack of frames. The root frame scans with the root
/// context of the grammar; a matched rule that enters a context pushes a frame
/// and a matched exit rule pops back to the parent. All requests go to the
/// innermost frame.
#[derive(Debug, Clone)]
pub struct LexerStream {
    source: Arc<str>,
    grammar: Arc<CompiledGrammar>,
    /// Bottom of the frame stack, never popped.
    root: LexerContext,
    /// Frames entered on top of `root`, innermost last.
    nested: Vec<LexerContext>,
    /// Token returned by the last call to [`next`](Self::next).
    current: Option<Token>,
}

impl LexerStream {
    /// Creates a stream positioned at the start of `source`.
    pub fn new(grammar: Arc<CompiledGrammar>, source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            root: LexerContext::new(grammar.root(), 0, false),
            grammar,
            nested: Vec::new(),
            current: None,
        }
    }

    fn top(&self) -> &LexerContext {
        self.nested.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut LexerContext {
        self.nested.last_mut().unwrap_or(&mut self.root)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Unconsumed input of the innermost frame.
    pub fn remaining(&self) -> &str {
        &self.source[self.top().cursor()..]
    }

    /// Number of active frames, 1 when only the root context is active.
    pub fn depth(&self) -> usize {
        1 + self.nested.len()
    }

    /// Name of the innermost active context.
    pub fn context_name(&self) -> &str {
        &self.grammar.context(self.top().context()).name
    }

    /// Token returned by the last call to [`next`](Self::next), `None` before
    /// the first call and after exhaustion.
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Returns the next token without consuming it.
    ///
    /// # Fails
    ///
    /// When input is left, but no rule of the innermost context matches it.
    pub fn forecast(&self, skip_whitespace: bool) -> Result<Option<Token>> {
        Ok(self
            .top()
            .forecast(&self.source, &self.grammar, self.depth(), skip_whitespace)?
            .map(|forecast| forecast.token))
    }

    /// Like [`forecast`](Self::forecast), but fails when the token was not
    /// produced by one of the `allowed` rules.
    pub fn forecast_of<S: AsRef<str>>(
        &self,
        allowed: &[S],
        skip_whitespace: bool,
    ) -> Result<Option<Token>> {
        match self.forecast(skip_whitespace)? {
            Some(token) if !token.matches(allowed) => Err(self.unexpected(token, allowed)),
            token => Ok(token),
        }
    }

    /// Consumes and returns the next token, entering or exiting contexts as
    /// the matched rule requires.
    ///
    /// Returns `None` when the innermost frame has no input left. Running dry
    /// inside a nested context does not return to the parent.
    ///
    /// # Fails
    ///
    /// When input is left, but no rule of the innermost context matches it.
    pub fn next(&mut self, skip_whitespace: bool) -> Result<Option<Token>> {
        let depth = self.depth();
        let Some(forecast) =
            self.top().forecast(&self.source, &self.grammar, depth, skip_whitespace)?
        else {
            self.current = None;
            return Ok(None);
        };

        let frame = self.top_mut();
        frame.advance(&forecast);
        let cursor = frame.cursor();

        if let Some(target) = forecast.enters {
            debug!(
                from = %self.context_name(),
                to = %self.grammar.context(target).name,
                cascade = forecast.exit,
                "entering context"
            );
            self.nested.push(LexerContext::new(target, cursor, forecast.exit));
        } else if forecast.exit {
            self.exit_context(cursor);
        }

        trace!(token = %forecast.token, depth = self.depth(), "token");
        self.current = Some(forecast.token.clone());
        Ok(Some(forecast.token))
    }

    /// Like [`next`](Self::next), but fails when the token was not produced by
    /// one of the `allowed` rules. The token is consumed either way.
    pub fn next_of<S: AsRef<str>>(
        &mut self,
        allowed: &[S],
        skip_whitespace: bool,
    ) -> Result<Option<Token>> {
        match self.next(skip_whitespace)? {
            Some(token) if !token.matches(allowed) => Err(self.unexpected(token, allowed)),
            token => Ok(token),
        }
    }

    /// Pops the innermost frame and hands its cursor to the parent. Keeps
    /// popping while the popped frame cascades its exit, never popping the
    /// root.
    fn exit_context(&mut self, cursor: usize) {
        while let Some(frame) = self.nested.pop() {
            let name = &self.grammar.context(frame.context()).name;
            debug!(from = %name, cascade = frame.cascade_exit(), "exiting context");

            self.top_mut().resume_at(cursor);
            if !frame.cascade_exit() {
                break;
            }
        }
    }

    /// Returns to the start of the source in the root context, forgetting
    /// nested frames and positions.
    pub fn rewind(&mut self) {
        self.root = LexerContext::new(self.grammar.root(), 0, false);
        self.nested.clear();
        self.current = None;
    }

    /// Rewinds and collects all tokens.
    ///
    /// # Fails
    ///
    /// On the first error of [`next`](Self::next).
    pub fn to_vec(&mut self, skip_whitespace: bool) -> Result<Vec<Token>> {
        self.rewind();
        self.tokens(skip_whitespace).collect()
    }

    /// Iterator over the tokens left, stopping after exhaustion or the first
    /// error.
    pub fn tokens(&mut self, skip_whitespace: bool) -> Tokens<'_> {
        Tokens {
            stream: self,
            skip_whitespace,
            done: false,
        }
    }

    fn snapshot(&self) -> StreamSnapshot {
        StreamSnapshot::new(
            self.context_name(),
            self.depth(),
            &self.source,
            self.top().cursor(),
        )
    }

    fn unexpected<S: AsRef<str>>(&self, token: Token, allowed: &[S]) -> TokenizerError {
        TokenizerError::UnexpectedToken {
            token,
            expected: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
            snapshot: self.snapshot(),
        }
    }
}

/// Iterator returned by [`LexerStream::tokens`].
#[derive(Debug)]
pub struct Tokens<'s> {
    stream: &'s mut LexerStream,
    skip_whitespace: bool,
    done: bool,
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let item = self.stream.next(self.skip_whitespace).transpose();
        self.done = !matches!(item, Some(Ok(_)));
        item
    }
}
