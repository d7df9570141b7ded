//! The in-memory NFA: one [`AtnState`] per state number, owning its
//! outgoing [`Transition`]s.

use super::transition::Transition;

/// Tag distinguishing the handful of state shapes the ATN graph can take.
/// Kept as a field on [`AtnState`] rather than as an enum-of-structs so the
/// deserializer can allocate a flat arena indexed by state number and patch
/// in cross-references (`loop_back_state`, `end_state`) after every state
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateType {
    Basic,
    RuleStart,
    BlockStart,
    PlusBlockStart,
    StarBlockStart,
    TokenStart,
    RuleStop,
    BlockEnd,
    StarLoopBack,
    StarLoopEntry,
    PlusLoopBack,
    LoopEnd,
}

pub const INVALID_STATE_NUMBER: i32 = -1;

#[derive(Debug, Clone)]
pub struct AtnState {
    pub state_number: i32,
    pub state_type: StateType,
    pub rule_index: i32,
    pub epsilon_only_transitions: bool,
    pub transitions: Vec<Transition>,

    /// Decision states carry a decision index (assigned in serialization
    /// order) and whether the decision is non-greedy.
    pub decision: i32,
    pub non_greedy: bool,

    /// `StarLoopEntry` only: true when this decision is the "continue the
    /// left-recursive rule" decision of a precedence rule.
    pub is_precedence_decision: bool,

    /// Back-references patched in during deserialization, all
    /// `INVALID_STATE_NUMBER` until then.
    pub loop_back_state: i32,
    pub end_state: i32,
    pub start_state: i32,
}

impl AtnState {
    pub fn new(state_number: i32, state_type: StateType, rule_index: i32) -> Self {
        Self {
            state_number,
            state_type,
            rule_index,
            epsilon_only_transitions: false,
            transitions: Vec::new(),
            decision: -1,
            non_greedy: false,
            is_precedence_decision: false,
            loop_back_state: INVALID_STATE_NUMBER,
            end_state: INVALID_STATE_NUMBER,
            start_state: INVALID_STATE_NUMBER,
        }
    }

    pub fn add_transition(&mut self, t: Transition) {
        if self.transitions.is_empty() {
            self.epsilon_only_transitions = t.is_epsilon();
        } else if self.epsilon_only_transitions != t.is_epsilon() {
            // Mixed epsilon/non-epsilon transitions out of one state are a
            // deserializer bug in the source ATN; the upstream runtimes
            // tolerate it by flipping the flag to false since at least one
            // outgoing edge now requires a real symbol.
            self.epsilon_only_transitions = false;
        }
        self.transitions.push(t);
    }

    pub fn is_decision_state(&self) -> bool {
        matches!(
            self.state_type,
            StateType::BlockStart
                | StateType::PlusBlockStart
                | StateType::StarBlockStart
                | StateType::StarLoopEntry
        ) || self.decision >= 0
    }
}
