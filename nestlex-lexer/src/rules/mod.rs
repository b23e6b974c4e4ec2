//! Rules, the grammar registry that groups them into named contexts, and the
//! compiled form used while scanning.

use crate::lexer::error::{Result, TokenizerError};

pub use self::pattern_set::{PatternMatch, PatternSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub(crate) mod pattern_set;

/// Name of the rule matching runs of skippable whitespace.
pub const WHITESPACE: &str = "T_WHITESPACE";

/// Name of the context created by [`Grammar::single`].
pub const DEFAULT_CONTEXT: &str = "root";

/// Named pattern with optional context transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct Rule {
    /// Name the produced tokens are classified as, e.g. `T_STRING`.
    name: String,
    /// Regex body, without delimiters or anchors.
    pattern: String,
    /// Context entered when the rule matches.
    #[cfg_attr(feature = "serde", serde(default))]
    enters: Option<String>,
    /// Whether matching the rule exits the current context.
    #[cfg_attr(feature = "serde", serde(default))]
    exit: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            enters: None,
            exit: false,
        }
    }

    /// Enters `context` after the rule matched.
    pub fn enters(mut self, context: impl Into<String>) -> Self {
        self.enters = Some(context.into());
        self
    }

    /// Returns to the parent context after the rule matched.
    pub fn exit(mut self) -> Self {
        self.exit = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn entered_context(&self) -> Option<&str> {
        self.enters.as_deref()
    }

    pub fn is_exit(&self) -> bool {
        self.exit
    }

    pub fn is_whitespace(&self) -> bool {
        self.name == WHITESPACE
    }
}

/// Commonly needed rules: quoted strings, words and whitespace.
pub fn base_rules() -> Vec<Rule> {
    vec![
        Rule::new("T_DOUBLE_QUOTED_STRING", r#""(?:[^"\\]|\\.)*""#),
        Rule::new("T_SINGLE_QUOTED_STRING", r"'(?:[^'\\]|\\.)*'"),
        Rule::new("T_STRING", r"\w+"),
        Rule::new(WHITESPACE, r"\s+"),
    ]
}

/// Registry of named contexts, each with its ordered list of [`Rule`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    /// Context scanning starts in. Defaults to the first declared context.
    root: Option<String>,
    contexts: Vec<(String, Vec<Rule>)>,
}

impl Grammar {
    /// Creates a new [`GrammarBuilder`].
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    /// Grammar with a single context named [`DEFAULT_CONTEXT`].
    pub fn single(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self::builder()
            .with_context(DEFAULT_CONTEXT, rules)
            .build()
    }

    /// Name of the root context.
    pub fn root(&self) -> Option<&str> {
        self.root
            .as_deref()
            .or_else(|| self.contexts.first().map(|(name, _)| name.as_str()))
    }

    /// Contexts in declaration order.
    pub fn contexts(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.contexts
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    /// Validates the grammar and compiles the [`PatternSet`] of every context.
    ///
    /// # Fails
    ///
    /// When a context declares a rule name twice, a pattern is invalid regex, a
    /// context name is declared twice, a rule enters an undeclared context, or
    /// the root context is not declared.
    pub fn compile(&self) -> Result<CompiledGrammar> {
        let mut ids = HashMap::with_capacity(self.contexts.len());
        for (id, (name, _)) in self.contexts.iter().enumerate() {
            if ids.insert(name.as_str(), id).is_some() {
                return Err(TokenizerError::invalid_rule(
                    name.as_str(),
                    "",
                    "context is declared more than once",
                ));
            }
        }

        let root = match self.root() {
            Some(root) => *ids.get(root).ok_or_else(|| {
                TokenizerError::invalid_rule(root, "", "root context is not declared")
            })?,
            None => {
                return Err(TokenizerError::invalid_rule(
                    "",
                    "",
                    "grammar declares no context",
                ))
            }
        };

        let contexts = self
            .contexts
            .iter()
            .map(|(name, rules)| {
                let targets = rules
                    .iter()
                    .map(|rule| match rule.entered_context() {
                        Some(target) => ids.get(target).copied().map(Some).ok_or_else(|| {
                            TokenizerError::invalid_rule(
                                name.as_str(),
                                rule.name(),
                                format!("enters undeclared context `{target}`"),
                            )
                        }),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(CompiledContext {
                    name: name.clone(),
                    patterns: PatternSet::new(name, rules.clone())?,
                    targets,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            contexts = contexts.len(),
            root = %contexts[root].name,
            "compiled grammar"
        );

        Ok(CompiledGrammar { root, contexts })
    }
}

/// Builder struct for the [`Grammar`].
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    root: Option<String>,
    contexts: Vec<(String, Vec<Rule>)>,
}

impl GrammarBuilder {
    /// Creates a new [`GrammarBuilder`] without contexts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root context of the [`Grammar`].
    pub fn with_root(mut self, context: impl Into<String>) -> Self {
        self.set_root(context);
        self
    }

    /// Adds a context with its rules in priority order.
    pub fn with_context(
        mut self,
        context: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Self {
        self.add_context(context, rules);
        self
    }

    /// Sets the root context of the [`Grammar`].
    pub fn set_root(&mut self, context: impl Into<String>) {
        self.root = Some(context.into());
    }

    /// Adds a context with its rules in priority order.
    pub fn add_context(
        &mut self,
        context: impl Into<String>,
        rules: impl IntoIterator<Item = Rule>,
    ) {
        self.contexts.push((context.into(), rules.into_iter().collect()));
    }

    /// Builds the [`Grammar`]. Validation happens in [`Grammar::compile`].
    pub fn build(self) -> Grammar {
        Grammar {
            root: self.root,
            contexts: self.contexts,
        }
    }
}

/// Index of a context in a [`CompiledGrammar`].
pub(crate) type ContextId = usize;

/// [`Grammar`] with every context compiled and every transition resolved.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    root: ContextId,
    contexts: Vec<CompiledContext>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledContext {
    pub(crate) name: String,
    pub(crate) patterns: PatternSet,
    /// Context entered by each rule, indexed like the rules of `patterns`.
    pub(crate) targets: Vec<Option<ContextId>>,
}

impl CompiledGrammar {
    pub(crate) fn root(&self) -> ContextId {
        self.root
    }

    pub(crate) fn context(&self, id: ContextId) -> &CompiledContext {
        &self.contexts[id]
    }

    /// Name of the root context.
    pub fn root_name(&self) -> &str {
        &self.contexts[self.root].name
    }

    /// Compiled patterns of the context called `name`.
    pub fn pattern_set(&self, name: &str) -> Option<&PatternSet> {
        self.contexts
            .iter()
            .find(|context| context.name == name)
            .map(|context| &context.patterns)
    }
}

impl TryFrom<Grammar> for CompiledGrammar {
    type Error = TokenizerError;

    fn try_from(grammar: Grammar) -> Result<Self> {
        grammar.compile()
    }
}
