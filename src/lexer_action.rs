//! Lexer actions: the small typed enum of side effects a generated lexer's
//! grammar actions compile down to, plus the executor that runs a list of
//! them against a host capability.
//!
//! The upstream runtimes dispatch actions through virtual `execute(lexer)`
//! calls on a class hierarchy; here that collapses to one `match` over a
//! closed enum, which is both the idiomatic shape in Rust and exactly the
//! "typed enum" replacement suggested for this component.

use std::hash::{Hash, Hasher};

use crate::char_stream::CharStream;

/// One decoded lexer action. `IndexedCustom` wraps a `Custom` (or anything
/// else position-dependent) once its text offset has been frozen by
/// [`LexerActionExecutor::fix_offset_before_match`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LexerAction {
    Channel(i32),
    Custom { rule_index: i32, action_index: i32 },
    Mode(i32),
    More,
    PopMode,
    PushMode(i32),
    Skip,
    Type(i32),
    IndexedCustom { offset: usize, inner: Box<LexerAction> },
}

impl LexerAction {
    /// `true` for any action whose effect depends on *where* in the
    /// matched text it executes (currently only `Custom`, and transitively
    /// anything already wrapped in `IndexedCustom`).
    pub fn is_position_dependent(&self) -> bool {
        matches!(self, LexerAction::Custom { .. } | LexerAction::IndexedCustom { .. })
    }
}

/// Capability a generated lexer must provide so the executor can apply
/// actions: mutate mode/channel/type, push/pop the mode stack, and run a
/// custom action callback.
pub trait LexerActionHost {
    fn set_type(&mut self, token_type: i32);
    fn set_channel(&mut self, channel: i32);
    fn mode(&mut self, m: i32);
    fn push_mode(&mut self, m: i32);
    fn pop_mode(&mut self) -> i32;
    fn skip(&mut self);
    fn more(&mut self);
    fn custom_action(&mut self, rule_index: i32, action_index: i32);
}

/// Immutable ordered list of actions, with a precomputed hash so equal
/// executors (element-wise equal action lists) compare cheaply when used
/// as part of a `DfaState`'s identity.
#[derive(Debug, Clone)]
pub struct LexerActionExecutor {
    pub actions: Vec<LexerAction>,
    cached_hash: u64,
}

impl PartialEq for LexerActionExecutor {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
    }
}
impl Eq for LexerActionExecutor {}

impl Hash for LexerActionExecutor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash);
    }
}

fn hash_actions(actions: &[LexerAction]) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut h = DefaultHasher::new();
    actions.hash(&mut h);
    h.finish()
}

impl LexerActionExecutor {
    pub fn new(actions: Vec<LexerAction>) -> Self {
        let cached_hash = hash_actions(&actions);
        Self { actions, cached_hash }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// `append(None, x) == executor([x])`; `append(Some(e), x).actions == e.actions ++ [x]`.
    pub fn append(existing: Option<&LexerActionExecutor>, action: LexerAction) -> Self {
        let mut actions = existing.map(|e| e.actions.clone()).unwrap_or_default();
        actions.push(action);
        Self::new(actions)
    }

    /// Freezes the text offset of every position-dependent action that
    /// isn't already frozen. Returns the same executor (by value-equality,
    /// cheaply `Clone`d) if nothing needed wrapping, so repeated calls at
    /// different input positions for the same underlying action list still
    /// produce DFA-state-equal executors once the offsets match.
    pub fn fix_offset_before_match(&self, offset: usize) -> Self {
        let mut changed = false;
        let mut actions = Vec::with_capacity(self.actions.len());
        for a in &self.actions {
            if a.is_position_dependent() && !matches!(a, LexerAction::IndexedCustom { .. }) {
                changed = true;
                actions.push(LexerAction::IndexedCustom { offset, inner: Box::new(a.clone()) });
            } else {
                actions.push(a.clone());
            }
        }
        if changed { Self::new(actions) } else { self.clone() }
    }

    /// Runs every queued action in order. `start_index`/`stop_index` bound
    /// the matched text: `IndexedCustom` actions seek to `start_index +
    /// offset`; any other position-dependent action seeks to `stop_index`.
    /// The input is always left at `stop_index` once every action has run,
    /// regardless of whether a seek happened along the way.
    pub fn execute(
        &self,
        host: &mut dyn LexerActionHost,
        input: &mut dyn CharStream,
        start_index: usize,
        stop_index: usize,
    ) {
        let mut seeked = false;
        for action in &self.actions {
            self.execute_one(action, host, input, start_index, stop_index, &mut seeked);
        }
        if seeked {
            input.seek(stop_index);
        }
    }

    fn execute_one(
        &self,
        action: &LexerAction,
        host: &mut dyn LexerActionHost,
        input: &mut dyn CharStream,
        start_index: usize,
        stop_index: usize,
        seeked: &mut bool,
    ) {
        match action {
            LexerAction::IndexedCustom { offset, inner } => {
                input.seek(start_index + offset);
                *seeked = true;
                self.execute_one(inner, host, input, start_index, stop_index, seeked);
            }
            LexerAction::Custom { rule_index, action_index } => {
                input.seek(stop_index);
                *seeked = true;
                host.custom_action(*rule_index, *action_index);
            }
            LexerAction::Channel(c) => host.set_channel(*c),
            LexerAction::Mode(m) => host.mode(*m),
            LexerAction::More => host.more(),
            LexerAction::PopMode => {
                host.pop_mode();
            }
            LexerAction::PushMode(m) => host.push_mode(*m),
            LexerAction::Skip => host.skip(),
            LexerAction::Type(t) => host.set_type(*t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_matches_contract() {
        let e1 = LexerActionExecutor::append(None, LexerAction::Skip);
        assert_eq!(e1.actions, vec![LexerAction::Skip]);

        let e2 = LexerActionExecutor::append(Some(&e1), LexerAction::Type(5));
        assert_eq!(e2.actions, vec![LexerAction::Skip, LexerAction::Type(5)]);
    }

    #[test]
    fn fix_offset_is_identity_without_position_dependent_actions() {
        let e = LexerActionExecutor::new(vec![LexerAction::Skip, LexerAction::Mode(2)]);
        let fixed = e.fix_offset_before_match(3);
        assert_eq!(e, fixed);
    }

    #[test]
    fn fix_offset_wraps_custom_once() {
        let e = LexerActionExecutor::new(vec![LexerAction::Custom { rule_index: 0, action_index: 1 }]);
        let fixed = e.fix_offset_before_match(3);
        assert_eq!(
            fixed.actions,
            vec![LexerAction::IndexedCustom {
                offset: 3,
                inner: Box::new(LexerAction::Custom { rule_index: 0, action_index: 1 })
            }]
        );
        // Already indexed: no further wrapping.
        let fixed2 = fixed.fix_offset_before_match(9);
        assert_eq!(fixed, fixed2);
    }

    #[test]
    fn equal_action_lists_hash_equal() {
        use std::collections::hash_map::DefaultHasher;
        let a = LexerActionExecutor::new(vec![LexerAction::Skip]);
        let b = LexerActionExecutor::new(vec![LexerAction::Skip]);
        assert_eq!(a, b);
        let mut ha = DefaultHasher::new();
        let mut hb = DefaultHasher::new();
        a.hash(&mut ha);
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }
}
