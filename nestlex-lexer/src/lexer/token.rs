/// [`Token`] returned by the [`LexerStream`](super::LexerStream).
///
/// The start position is stored, the end position is derived from the value.
/// Lines and columns are 1-based and columns count `char`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// Name of the rule that matched.
    rule: String,
    /// Source string representation of the token, including embedded newlines.
    value: String,
    line: usize,
    column: usize,
}

impl Token {
    /// Creates a new [`Token`] starting at `line` and `column`.
    pub fn new(
        rule: impl Into<String>,
        value: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            rule: rule.into(),
            value: value.into(),
            line,
            column,
        }
    }

    /// Name of the rule the token was classified as.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Matched text, verbatim.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Number of lines the value spans.
    pub fn line_count(&self) -> usize {
        1 + self.value.matches('\n').count()
    }

    pub fn end_line(&self) -> usize {
        self.line + self.line_count() - 1
    }

    /// Column of the last character of the token.
    ///
    /// For a multi-line token this is the length of its last line, so a value
    /// ending in `'\n'` ends at column 0 of the following line.
    pub fn end_column(&self) -> usize {
        match self.value.rsplit_once('\n') {
            Some((_, last_line)) => last_line.chars().count(),
            None => self.column + self.value.chars().count() - 1,
        }
    }

    /// Returns whether the token was produced by one of the given rules.
    pub fn matches<S: AsRef<str>>(&self, rules: &[S]) -> bool {
        rules.iter().any(|rule| rule.as_ref() == self.rule)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{} {} {:?}",
            self.line,
            self.column,
            self.end_line(),
            self.end_column(),
            self.rule,
            self.value
        )
    }
}
