//! Transition labels. Every transition carries a `target` state number; the
//! label itself determines whether it is epsilon, and what input (if any)
//! it matches.

use crate::interval_set::IntervalSet;

pub const MIN_CHAR_VALUE: i32 = 0;
pub const MAX_CHAR_VALUE: i32 = 0x10_FFFF;

#[derive(Debug, Clone)]
pub enum TransitionKind {
    Epsilon,
    Range { lo: i32, hi: i32 },
    Rule { follow_state: i32, rule_index: i32, precedence: i32 },
    Predicate { rule_index: i32, pred_index: i32, ctx_dependent: bool },
    Atom { symbol: i32 },
    Action { rule_index: i32, action_index: i32, ctx_dependent: bool },
    Set(IntervalSet),
    NotSet(IntervalSet),
    Wildcard,
    PrecedencePredicate { precedence: i32 },
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub target: i32,
    pub kind: TransitionKind,

    /// Set for `Rule` transitions synthesized as the epsilon "return" edge
    /// from a rule's stop state back to the caller's follow state. `-1`
    /// unless the callee is a precedence rule invoked at precedence 0, in
    /// which case it is the callee's rule index (see §4.1 step 8).
    pub outermost_precedence_return: i32,
}

impl Transition {
    pub fn new(target: i32, kind: TransitionKind) -> Self {
        Self { target, kind, outermost_precedence_return: -1 }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(
            self.kind,
            TransitionKind::Epsilon
                | TransitionKind::Rule { .. }
                | TransitionKind::Predicate { .. }
                | TransitionKind::Action { .. }
                | TransitionKind::PrecedencePredicate { .. }
        )
    }

    /// `true` if this transition accepts `symbol`, given the vocabulary
    /// bounds `[min_vocab, max_vocab]` used to interpret `Wildcard`/`NotSet`.
    pub fn matches(&self, symbol: i32, min_vocab: i32, max_vocab: i32) -> bool {
        match &self.kind {
            TransitionKind::Range { lo, hi } => symbol >= *lo && symbol < *hi,
            TransitionKind::Atom { symbol: s } => symbol == *s,
            TransitionKind::Set(set) => set.contains(symbol),
            TransitionKind::NotSet(set) => {
                symbol >= min_vocab && symbol <= max_vocab && !set.contains(symbol)
            }
            TransitionKind::Wildcard => symbol >= min_vocab && symbol <= max_vocab,
            _ => false,
        }
    }
}
