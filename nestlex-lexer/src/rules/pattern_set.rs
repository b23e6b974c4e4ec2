use super::Rule;
use crate::lexer::error::{Result, TokenizerError};

use regex::Regex;
use std::collections::HashSet;

/// Ordered set of rules compiled into a single anchored alternation.
///
/// Every rule becomes one capture group of the alternation. The regex engine
/// tries the branches left to right and stops at the first one that matches,
/// so declaration order decides between rules that could both match (first
/// match, not longest match).
#[derive(Debug, Clone)]
pub struct PatternSet {
    rules: Vec<Rule>,
    /// `None` for an empty rule list, which matches nothing.
    regex: Option<Regex>,
    /// Capture group index of the branch of each rule.
    groups: Vec<usize>,
}

/// Result of [`PatternSet::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'r, 's> {
    /// Index of the rule in declaration order.
    pub index: usize,
    pub rule: &'r Rule,
    /// Whitespace trimmed from the front of the input before matching.
    pub skipped: &'s str,
    /// Text matched by the rule.
    pub text: &'s str,
}

/// Characters dropped when whitespace is skipped.
pub(crate) fn is_skippable(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B')
}

/// Removes leading whitespace, returning the removed prefix and the rest.
fn alternation(branches: &[String]) -> String {
    format!("^(?:{})", branches.join("|"))
}

pub(crate) fn split_whitespace(input: &str) -> (&str, &str) {
    let rest = input.trim_start_matches(is_skippable);
    input.split_at(input.len() - rest.len())
}

impl PatternSet {
    /// Compiles the rules of `context`.
    ///
    /// # Fails
    ///
    /// When two rules share a name or a pattern is invalid regex.
    pub fn new(context: &str, rules: Vec<Rule>) -> Result<Self> {
        let mut names = HashSet::with_capacity(rules.len());
        let mut branches = Vec::with_capacity(rules.len());
        let mut groups = Vec::with_capacity(rules.len());
        // group 0 is the whole match
        let mut next_group = 1;

        for rule in &rules {
            if !names.insert(rule.name()) {
                return Err(TokenizerError::invalid_rule(
                    context,
                    rule.name(),
                    "duplicate rule name",
                ));
            }

            // Compiling every pattern on its own attributes errors to the rule and
            // tells how many groups the rule contributes to the alternation. The
            // bare pattern must compile so it cannot close its branch early.
            let branch = Regex::new(rule.pattern())
                .map_err(|err| TokenizerError::invalid_rule(context, rule.name(), err))?;

            groups.push(next_group);
            next_group += branch.captures_len();
            branches.push(format!("({})", rule.pattern()));
        }

        let regex = if rules.is_empty() {
            None
        } else {
            let regex = Regex::new(&alternation(&branches))
                .map_err(|err| Self::attribute(context, &rules, &branches, err))?;

            debug_assert_eq!(regex.captures_len(), next_group);
            Some(regex)
        };

        Ok(Self {
            rules,
            regex,
            groups,
        })
    }

    /// Blames the first rule whose branch breaks the alternation, e.g. by
    /// reusing a group name of an earlier rule.
    fn attribute(
        context: &str,
        rules: &[Rule],
        branches: &[String],
        err: regex::Error,
    ) -> TokenizerError {
        let culprit = (1..=branches.len())
            .find(|&end| Regex::new(&alternation(&branches[..end])).is_err())
            .map_or(rules.len() - 1, |end| end - 1);

        TokenizerError::invalid_rule(context, rules[culprit].name(), err)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Finds the first rule matching a prefix of `input`, after removing leading
    /// whitespace if `skip_whitespace` is set.
    ///
    /// Returns `None` when no rule matches. The match may be empty when a rule
    /// accepts the empty string.
    pub fn find<'s>(&self, input: &'s str, skip_whitespace: bool) -> Option<PatternMatch<'_, 's>> {
        let (skipped, subject) = if skip_whitespace {
            split_whitespace(input)
        } else {
            ("", input)
        };

        let captures = self.regex.as_ref()?.captures(subject)?;

        self.groups
            .iter()
            .enumerate()
            .find_map(|(index, &group)| {
                captures.get(group).map(|m| PatternMatch {
                    index,
                    rule: &self.rules[index],
                    skipped,
                    text: m.as_str(),
                })
            })
    }
}
