//! Hand-built ATN fixtures for simulator-level tests. These bypass
//! `AtnDeserializer` entirely (it has its own unit tests against a wire
//! fixture) and construct `Atn`/`AtnState`/`Transition` directly through
//! the public API, the same way `dfa.rs`'s own unit tests do.

use atnlex::atn::GrammarType;
use atnlex::{Atn, AtnState, IntervalSet, LexerAction, LexerActions, StateType, Transition, TransitionKind};

pub struct AtnBuilder {
    states: Vec<AtnState>,
}

impl AtnBuilder {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Allocates a new state and returns its number.
    pub fn state(&mut self, ty: StateType, rule_index: i32) -> i32 {
        let n = self.states.len() as i32;
        self.states.push(AtnState::new(n, ty, rule_index));
        n
    }

    pub fn edge(&mut self, from: i32, to: i32, kind: TransitionKind) {
        self.states[from as usize].add_transition(Transition::new(to, kind));
    }

    pub fn mark_non_greedy(&mut self, state: i32) {
        self.states[state as usize].non_greedy = true;
    }

    pub fn build(
        self,
        rule_to_start_state: Vec<i32>,
        rule_to_token_type: Vec<i32>,
        mode_to_start_state: Vec<i32>,
        lexer_actions: Vec<LexerAction>,
    ) -> Atn {
        let mut rule_to_stop_state = vec![-1; rule_to_start_state.len()];
        for s in &self.states {
            if s.state_type == StateType::RuleStop {
                rule_to_stop_state[s.rule_index as usize] = s.state_number;
            }
        }
        let max_token_type = rule_to_token_type.iter().copied().max().unwrap_or(0);
        Atn {
            grammar_type: GrammarType::Lexer,
            max_token_type,
            states: self.states,
            rule_to_start_state,
            rule_to_stop_state,
            rule_to_token_type,
            mode_to_start_state,
            decision_to_state: Vec::new(),
            lexer_actions,
        }
    }
}

impl Default for AtnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn letters() -> IntervalSet {
    let mut s = IntervalSet::new();
    s.add_range('a' as i32, 'z' as i32 + 1);
    s.add_range('A' as i32, 'Z' as i32 + 1);
    s
}

pub fn digits() -> IntervalSet {
    let mut s = IntervalSet::new();
    s.add_range('0' as i32, '9' as i32 + 1);
    s
}

pub fn single(c: char) -> IntervalSet {
    IntervalSet::single(c as i32)
}

pub fn whitespace() -> IntervalSet {
    let mut s = IntervalSet::new();
    s.add_point(' ' as i32);
    s.add_point('\t' as i32);
    s
}

/// A minimal [`LexerActions`] host: predicates answer a fixed, settable
/// bool, custom actions just record which `(rule_index, action_index)`
/// pairs fired so tests can assert on them.
#[derive(Default)]
pub struct RecordingActions {
    pub predicate_answer: bool,
    pub fired: Vec<(i32, i32)>,
}

impl LexerActions for RecordingActions {
    fn sempred(&mut self, _rule_index: i32, _pred_index: i32) -> bool {
        self.predicate_answer
    }

    fn action(&mut self, rule_index: i32, action_index: i32) {
        self.fired.push((rule_index, action_index));
    }
}
