//! Query results and proof trees.

use pcc_core::{Flag, Span};
use pcc_ir::Term;

use crate::EngineError;

/// The truth value of a query's goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    True,
    False,
    Unknown,
}

/// A source position computed by the engine for one argument of a proven
/// pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub span: Span,
}

impl Locator {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

/// A derivation of one instance of a queried pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Proof {
    /// Classes of the rules that produced the conclusion.
    pub rule_classes: Vec<String>,
    /// The proven instance of the pattern.
    pub conclusion: Term,
    /// Locator sets computed for the conclusion. Each set is indexed by the
    /// pattern's argument positions; there is one set per distinct way the
    /// conclusion was derived.
    pub locators: Vec<Vec<Locator>>,
}

impl Proof {
    pub fn has_rule_class(&self, class: &str) -> bool {
        self.rule_classes.iter().any(|c| c == class)
    }

    /// The first rule class starting with `prefix`, with the prefix removed
    /// and surrounding whitespace trimmed.
    pub fn rule_class_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.rule_classes
            .iter()
            .find_map(|c| c.strip_prefix(prefix))
            .map(str::trim)
    }

    /// The locator of the argument at `index` in every locator set.
    pub fn locators_for(&self, index: usize) -> impl Iterator<Item = &Locator> {
        self.locators.iter().filter_map(move |set| set.get(index))
    }
}

/// Proofs found for one pattern together with the engine's messages about
/// the enumeration.
#[derive(Debug, Clone, Default)]
pub struct ProofEnumeration {
    pub proofs: Vec<Proof>,
    pub flags: Vec<Flag>,
}

/// The completed result of a query.
pub trait QueryResult {
    /// Conclusion of the query's goal.
    fn conclusion(&self) -> Conclusion;

    /// Enumerate proofs of `pattern`, at most `max_per_goal` for each goal
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern cannot be evaluated.
    fn enumerate_proofs(
        &self,
        pattern: &str,
        max_per_goal: usize,
    ) -> Result<ProofEnumeration, EngineError>;
}

/// A completed query together with the messages produced while starting it.
pub struct QueryOutcome {
    pub flags: Vec<Flag>,
    pub result: Box<dyn QueryResult>,
}

impl std::fmt::Debug for QueryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOutcome")
            .field("flags", &self.flags)
            .field("conclusion", &self.result.conclusion())
            .finish()
    }
}
