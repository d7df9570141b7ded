//! Lexer ATN configurations, and the two equality views used on them.
//!
//! A config has two distinct notions of "same": full equality (state, alt,
//! context, and action executor all equal) used when inserting into an
//! [`crate::atn_config_set::AtnConfigSet`], and DFA-state equality (context
//! ignored) used when comparing configs across DFA states so that configs
//! differing only in their call stack collapse into the same `DfaState`.
//! Rather than toggle a flag on the config (the source's `insideSet`
//! trick), each view gets its own newtype wrapper with its own `Hash`/`Eq`.

use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{lexer_action::LexerActionExecutor, prediction_context::PredictionContext};

#[derive(Debug, Clone)]
pub struct LexerAtnConfig {
    pub state: i32,
    pub alt: usize,
    pub context: PredictionContext,

    /// `true` once any `Predicate`/`PrecedencePredicate` transition has been
    /// traversed while building this config (propagated from the owning
    /// `AtnConfigSet.has_semantic_context`, tracked here only to ease
    /// debugging; the authoritative flag lives on the set).
    pub lexer_action_executor: Option<Arc<LexerActionExecutor>>,
    pub passed_through_non_greedy_decision: bool,
}

impl LexerAtnConfig {
    pub fn new(state: i32, alt: usize, context: PredictionContext) -> Self {
        Self {
            state,
            alt,
            context,
            lexer_action_executor: None,
            passed_through_non_greedy_decision: false,
        }
    }

    pub fn with_action_executor(mut self, executor: Option<Arc<LexerActionExecutor>>) -> Self {
        self.lexer_action_executor = executor;
        self
    }

    pub fn transition_to(&self, state: i32, non_greedy_decision: bool) -> Self {
        Self {
            state,
            alt: self.alt,
            context: self.context.clone(),
            lexer_action_executor: self.lexer_action_executor.clone(),
            passed_through_non_greedy_decision: self.passed_through_non_greedy_decision
                || non_greedy_decision,
        }
    }

    pub fn with_context(mut self, context: PredictionContext) -> Self {
        self.context = context;
        self
    }
}

/// Full equality: used as the hash-map key inside an `AtnConfigSet`.
#[derive(Clone, Copy)]
pub struct ByFullContext<'a>(pub &'a LexerAtnConfig);

impl PartialEq for ByFullContext<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.state == other.0.state
            && self.0.alt == other.0.alt
            && self.0.context == other.0.context
            && self.0.lexer_action_executor == other.0.lexer_action_executor
    }
}
impl Eq for ByFullContext<'_> {}
impl Hash for ByFullContext<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.state.hash(state);
        self.0.alt.hash(state);
        self.0.context.hash(state);
        self.0.lexer_action_executor.hash(state);
    }
}

/// DFA-state equality: context is ignored so configs differing only in
/// call stack compare equal when deciding whether two `AtnConfigSet`s
/// should intern to the same `DfaState`.
#[derive(Clone, Copy)]
pub struct ByDfaStateKey<'a>(pub &'a LexerAtnConfig);

impl PartialEq for ByDfaStateKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.state == other.0.state
            && self.0.alt == other.0.alt
            && self.0.lexer_action_executor == other.0.lexer_action_executor
    }
}
impl Eq for ByDfaStateKey<'_> {}
impl Hash for ByDfaStateKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.state.hash(state);
        self.0.alt.hash(state);
        self.0.lexer_action_executor.hash(state);
    }
}
