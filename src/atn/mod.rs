//! The in-memory ATN graph: states, transitions, and the per-grammar
//! tables the simulator needs (mode starts, rule stop states, token types,
//! decoded lexer actions).

pub mod deserializer;
pub mod state;
pub mod transition;

pub use deserializer::AtnDeserializer;
pub use state::{AtnState, StateType};
pub use transition::{Transition, TransitionKind};

use crate::lexer_action::LexerAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarType {
    Lexer,
    Parser,
}

/// Immutable once built. Owns every state in a flat arena indexed by state
/// number, so transitions and cross-references carry plain `i32` indices
/// rather than pointers/`Rc`s.
#[derive(Debug)]
pub struct Atn {
    pub grammar_type: GrammarType,
    pub max_token_type: i32,
    pub states: Vec<AtnState>,

    /// Index by rule: the rule's start state number.
    pub rule_to_start_state: Vec<i32>,
    /// Index by rule: the rule's stop state number.
    pub rule_to_stop_state: Vec<i32>,
    /// Index by rule (lexer grammars only): the token type the rule emits.
    pub rule_to_token_type: Vec<i32>,

    /// Index by mode: that mode's `TokenStart` state number.
    pub mode_to_start_state: Vec<i32>,

    /// Decision state numbers in serialization order; `decision_to_state[i]`
    /// is the state whose `decision == i`.
    pub decision_to_state: Vec<i32>,

    /// Decoded lexer actions, indexed exactly as referenced by `Action`
    /// transitions' `action_index`.
    pub lexer_actions: Vec<LexerAction>,
}

impl Atn {
    pub fn state(&self, n: i32) -> &AtnState {
        &self.states[n as usize]
    }

    pub fn state_mut(&mut self, n: i32) -> &mut AtnState {
        &mut self.states[n as usize]
    }

    pub fn rule_stop_state(&self, rule_index: i32) -> i32 {
        self.rule_to_stop_state[rule_index as usize]
    }

    /// The token type a `RuleStop` state's rule emits, or `TOKEN_INVALID`
    /// if the state does not belong to a known rule (should not happen for
    /// a well-formed lexer ATN).
    pub fn token_type_for_rule(&self, rule_index: i32) -> i32 {
        self.rule_to_token_type
            .get(rule_index as usize)
            .copied()
            .unwrap_or(crate::token::TOKEN_INVALID_TYPE)
    }
}
