//! Per-mode lazily-constructed DFA: an intern table of [`DfaState`]s keyed
//! by DFA-state equality (context-blind), each with a sparse edge table
//! over the low code-unit range.
//!
//! `DfaState` is immutable once inserted — built, frozen, interned, never
//! mutated again — so once a caller holds a state number, looking it back
//! up through the table needs only a read lock.

use std::sync::RwLock;

use hashbrown::HashMap;

use crate::{atn::Atn, atn_config_set::AtnConfigSet, lexer_action::LexerActionExecutor};

/// Outside this code-unit window every lookup falls back to the ATN;
/// widening it is a permitted but unimplemented extension.
pub const MIN_DFA_EDGE: i32 = 0;
pub const MAX_DFA_EDGE: i32 = 127;

/// DFA state numbers are plain indices into `Dfa::states`. `ERROR` is the
/// reserved sentinel meaning "this input is known dead from here"; it is
/// never present in the intern table.
pub type DfaStateId = usize;
pub const ERROR_STATE: DfaStateId = DfaStateId::MAX;

#[derive(Debug)]
pub struct DfaState {
    pub state_number: DfaStateId,
    pub configs: AtnConfigSet,
    pub is_accept_state: bool,
    /// Token type predicted when this state is a dead end after at least
    /// one accept; meaningless unless `is_accept_state`.
    pub prediction: i32,
    pub lexer_action_executor: Option<std::sync::Arc<LexerActionExecutor>>,

    /// Sparse outgoing edges over `[MIN_DFA_EDGE, MAX_DFA_EDGE]`, index `t`.
    /// `None` means "not yet computed"; `Some(ERROR_STATE)` caches a known
    /// dead edge. Grown lazily so small DFAs don't pay for the full window.
    edges: RwLock<Vec<Option<DfaStateId>>>,
}

impl DfaState {
    fn new(state_number: DfaStateId, configs: AtnConfigSet) -> Self {
        Self {
            state_number,
            configs,
            is_accept_state: false,
            prediction: 0,
            lexer_action_executor: None,
            edges: RwLock::new(Vec::new()),
        }
    }

    pub fn edge(&self, t: i32) -> Option<DfaStateId> {
        if !(MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&t) {
            return None;
        }
        self.edges.read().unwrap().get(t as usize).copied().flatten()
    }

    fn set_edge(&self, t: i32, to: DfaStateId) {
        debug_assert!((MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&t));
        let mut edges = self.edges.write().unwrap();
        if edges.len() <= t as usize {
            edges.resize(t as usize + 1, None);
        }
        // Edges monotonically populate: never overwrite a prior value once
        // a writer has installed one for this symbol.
        if edges[t as usize].is_none() {
            edges[t as usize] = Some(to);
        }
    }
}

/// Hashable stand-in for [`ByDfaStateKey`] over a whole config set, used as
/// the intern table's key so distinct `AtnConfigSet`s that agree under
/// DFA-state equality collapse to one `DfaState`.
#[derive(PartialEq, Eq, Hash)]
struct DfaStateKey(Vec<(i32, usize, u64)>);

fn dfa_state_key(configs: &AtnConfigSet) -> DfaStateKey {
    use std::hash::{Hash, Hasher};
    let mut parts: Vec<(i32, usize, u64)> = configs
        .iter()
        .map(|c| {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            c.lexer_action_executor.hash(&mut h);
            (c.state, c.alt, h.finish())
        })
        .collect();
    parts.sort_unstable();
    DfaStateKey(parts)
}

/// Per-mode DFA. `s0` is the lazily-created start state, shared across
/// every lexer instance using this mode.
#[derive(Default)]
pub struct Dfa {
    states: RwLock<Vec<std::sync::Arc<DfaState>>>,
    lookup: RwLock<HashMap<DfaStateKey, DfaStateId>>,
    s0: RwLock<Option<std::sync::Arc<DfaState>>>,
}

impl Dfa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn s0(&self) -> Option<std::sync::Arc<DfaState>> {
        self.s0.read().unwrap().clone()
    }

    pub fn set_s0(&self, state: std::sync::Arc<DfaState>) {
        *self.s0.write().unwrap() = Some(state);
    }

    pub fn state(&self, id: DfaStateId) -> std::sync::Arc<DfaState> {
        self.states.read().unwrap()[id].clone()
    }

    /// Number of interned states so far; for diagnostics and tests that
    /// check growth stays bounded rather than tracking one state per input
    /// position.
    pub fn len(&self) -> usize {
        self.states.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `addDfaState`: intern `configs` as a `DfaState`, reusing an existing
    /// state when one with the same DFA-state key is already present.
    pub fn add_dfa_state(&self, atn: &Atn, mut configs: AtnConfigSet) -> std::sync::Arc<DfaState> {
        let key = dfa_state_key(&configs);
        if let Some(&id) = self.lookup.read().unwrap().get(&key) {
            return self.states.read().unwrap()[id].clone();
        }

        // Among every config that has reached a rule stop, the lowest alt
        // number wins the fallback prediction for this state — alt numbers
        // mirror lexer rule declaration order, so this is the first-rule-
        // wins tie-break when two rules finish at the same input position.
        let mut best: Option<&crate::atn_config::LexerAtnConfig> = None;
        for c in configs.iter() {
            if atn.state(c.state).state_type == crate::atn::StateType::RuleStop
                && best.is_none_or(|b| c.alt < b.alt)
            {
                best = Some(c);
            }
        }
        let mut is_accept_state = false;
        let mut prediction = 0;
        let mut lexer_action_executor = None;
        if let Some(c) = best {
            is_accept_state = true;
            lexer_action_executor = c.lexer_action_executor.clone();
            prediction = atn.token_type_for_rule(atn.state(c.state).rule_index);
        }
        configs.set_read_only(true);

        let mut states = self.states.write().unwrap();
        let mut lookup = self.lookup.write().unwrap();
        // Another writer may have raced us between the read-lock probe
        // above and taking the write locks; check again before inserting.
        if let Some(&id) = lookup.get(&key) {
            return states[id].clone();
        }
        let state_number = states.len();
        let mut state = DfaState::new(state_number, configs);
        state.is_accept_state = is_accept_state;
        state.prediction = prediction;
        state.lexer_action_executor = lexer_action_executor;
        let state = std::sync::Arc::new(state);
        states.push(state.clone());
        lookup.insert(key, state_number);
        state
    }

    /// `addDfaEdge`: cache `from --t--> to` when `t` falls in the cacheable
    /// window; a no-op outside it (the caller still uses `to` directly).
    pub fn add_dfa_edge(&self, from: &DfaState, t: i32, to: DfaStateId) {
        if !(MIN_DFA_EDGE..=MAX_DFA_EDGE).contains(&t) {
            return;
        }
        from.set_edge(t, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        atn::{AtnState, GrammarType, StateType},
        atn_config::LexerAtnConfig,
        prediction_context::{MergeCache, PredictionContext},
    };

    fn tiny_atn() -> Atn {
        let mut s0 = AtnState::new(0, StateType::RuleStop, 0);
        s0.rule_index = 0;
        Atn {
            grammar_type: GrammarType::Lexer,
            max_token_type: 1,
            states: vec![s0],
            rule_to_start_state: vec![0],
            rule_to_stop_state: vec![0],
            rule_to_token_type: vec![7],
            mode_to_start_state: vec![0],
            decision_to_state: vec![],
            lexer_actions: vec![],
        }
    }

    #[test]
    fn interning_reuses_dfa_state_ignoring_context() {
        let atn = tiny_atn();
        let dfa = Dfa::new();
        let mut cache = MergeCache::new();

        let mut set_a = AtnConfigSet::new(false);
        set_a
            .add(
                LexerAtnConfig::new(0, 1, PredictionContext::singleton(PredictionContext::Empty, 5)),
                &mut cache,
            )
            .unwrap();
        let mut set_b = AtnConfigSet::new(false);
        set_b
            .add(
                LexerAtnConfig::new(0, 1, PredictionContext::singleton(PredictionContext::Empty, 9)),
                &mut cache,
            )
            .unwrap();

        let da = dfa.add_dfa_state(&atn, set_a);
        let db = dfa.add_dfa_state(&atn, set_b);
        assert_eq!(da.state_number, db.state_number, "differing-only-by-context sets should intern to one state");
        assert!(da.is_accept_state);
        assert_eq!(da.prediction, 7);
    }

    #[test]
    fn edges_are_cached_and_not_overwritten() {
        let atn = tiny_atn();
        let dfa = Dfa::new();
        let mut cache = MergeCache::new();
        let mut set = AtnConfigSet::new(false);
        set.add(LexerAtnConfig::new(0, 1, PredictionContext::Empty), &mut cache).unwrap();
        let from = dfa.add_dfa_state(&atn, set);

        dfa.add_dfa_edge(&from, b'a' as i32, 42);
        assert_eq!(from.edge(b'a' as i32), Some(42));
        dfa.add_dfa_edge(&from, b'a' as i32, 99);
        assert_eq!(from.edge(b'a' as i32), Some(42), "edge writes must not clobber an existing entry");
    }

    #[test]
    fn edge_outside_window_is_not_cached() {
        let atn = tiny_atn();
        let dfa = Dfa::new();
        let mut cache = MergeCache::new();
        let mut set = AtnConfigSet::new(false);
        set.add(LexerAtnConfig::new(0, 1, PredictionContext::Empty), &mut cache).unwrap();
        let from = dfa.add_dfa_state(&atn, set);

        dfa.add_dfa_edge(&from, 200, 7);
        assert_eq!(from.edge(200), None);
    }
}
