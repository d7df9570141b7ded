//! Parses the portable ATN binary format emitted by the grammar compiler
//! into an in-memory [`Atn`](super::Atn).
//!
//! The wire format is a flat sequence of 16-bit code units, each offset by
//! `+2` at serialization time (so `0` and `1` decode to `65534`/`65535`);
//! [`Reader::next`] undoes that shift. Everything else follows the fixed
//! order in the deserialization contract: version, UUID, grammar type,
//! states, non-greedy/precedence lists, rules, modes, sets, edges,
//! decisions, lexer actions, then precedence-decision marking and
//! structural verification.

use crate::{
    atn::{
        state::{AtnState, StateType, INVALID_STATE_NUMBER},
        transition::{Transition, TransitionKind},
        Atn, GrammarType,
    },
    errors::AtnError,
    interval_set::IntervalSet,
    lexer_action::LexerAction,
    token::TOKEN_EOF,
};

const SERIALIZED_VERSION: i32 = 3;

/// `1DA0C57D-6C06-438A-9B27-10BCB3CE0F61`, the feature set every serialized
/// ATN must declare at minimum.
const BASE_UUID: [u16; 8] = [0xc57d, 0x1da0, 0x438a, 0x6c06, 0x1027, 0x9b27, 0x0f61, 0x10bc];
/// Adds 32-bit interval endpoints for astral code points, in a second sets
/// block read only when this UUID (or a later one) is present.
const ADDED_UNICODE_SMP_UUID: [u16; 8] = [0x5b39, 0x59627, 0x4f5f, 0x4346, 0xf0c6, 0xb97a, 0xe8e1, 0xaf6c];

struct Reader<'a> {
    data: &'a [u16],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u16]) -> Self {
        Self { data, pos: 0 }
    }

    fn next(&mut self, what: &'static str) -> Result<i32, AtnError> {
        let raw = *self.data.get(self.pos).ok_or(AtnError::Truncated(what))?;
        self.pos += 1;
        Ok(raw.wrapping_sub(2) as i32 & 0xFFFF)
    }

    fn next_u32(&mut self, what: &'static str) -> Result<i32, AtnError> {
        let lo = self.next(what)?;
        let hi = self.next(what)?;
        Ok((lo as u32 | ((hi as u32) << 16)) as i32)
    }

    fn next_uuid(&mut self, what: &'static str) -> Result<[u16; 8], AtnError> {
        let mut parts = [0u16; 8];
        for p in &mut parts {
            *p = self.next(what)? as u16;
        }
        Ok(parts)
    }
}

/// Builds an [`Atn`] from a serialized code-unit sequence. `verify`
/// controls whether structural verification (§4.1 step 12) runs; the host
/// should leave it on unless it has an independent reason to trust the
/// payload, since a malformed ATN otherwise fails later with a confusing
/// panic deep in the simulator instead of a clear `AtnError` here.
pub struct AtnDeserializer;

impl AtnDeserializer {
    pub fn deserialize(data: &[u16], verify: bool) -> Result<Atn, AtnError> {
        let mut r = Reader::new(data);

        let version = r.next("version")?;
        if version != SERIALIZED_VERSION {
            return Err(AtnError::UnsupportedVersion(version, SERIALIZED_VERSION));
        }

        let uuid = r.next_uuid("uuid")?;
        let supports_unicode_smp = if uuid == BASE_UUID {
            false
        } else if uuid == ADDED_UNICODE_SMP_UUID {
            true
        } else {
            return Err(AtnError::UnsupportedUuid(format!("{uuid:?}")));
        };

        let grammar_type = match r.next("grammarType")? {
            0 => GrammarType::Lexer,
            1 => GrammarType::Parser,
            other => return Err(AtnError::Inconsistent(format!("unknown grammarType {other}"))),
        };
        let max_token_type = r.next("maxTokenType")?;

        let mut states = Self::read_states(&mut r)?;
        let (non_greedy, precedence) = Self::read_state_lists(&mut r)?;
        for s in non_greedy {
            states[s as usize].non_greedy = true;
        }

        let (rule_to_start_state, rule_to_token_type) =
            Self::read_rules(&mut r, grammar_type, &states)?;
        let rule_to_stop_state = Self::derive_rule_stop_states(&states, rule_to_start_state.len());

        let mode_to_start_state = Self::read_modes(&mut r)?;

        let sets = Self::read_sets(&mut r, false)?;
        let sets = if supports_unicode_smp {
            let mut all = sets;
            all.extend(Self::read_sets(&mut r, true)?);
            all
        } else {
            sets
        };

        log::debug!(
            "atn deserialize: {} states, {} rules, {} modes, {} sets",
            states.len(),
            rule_to_start_state.len(),
            mode_to_start_state.len(),
            sets.len()
        );

        Self::read_edges(&mut r, &mut states, &sets, &rule_to_stop_state)?;

        let decision_to_state = Self::read_decisions(&mut r, &mut states)?;

        let lexer_actions =
            if grammar_type == GrammarType::Lexer { Self::read_lexer_actions(&mut r)? } else { Vec::new() };

        // The precedence-rule state list feeds left-recursion filtering on
        // the parser side only; this crate only needs the structural
        // marking `mark_precedence_decisions` derives below.
        drop(precedence);
        Self::link_back_references(&mut states, &rule_to_start_state, &rule_to_stop_state);
        Self::mark_precedence_decisions(&mut states);

        let atn = Atn {
            grammar_type,
            max_token_type,
            states,
            rule_to_start_state,
            rule_to_stop_state,
            rule_to_token_type,
            mode_to_start_state,
            decision_to_state,
            lexer_actions,
        };

        if verify {
            Self::verify(&atn)?;
        } else {
            log::warn!("atn deserialize: structural verification skipped");
        }

        Ok(atn)
    }

    fn read_states(r: &mut Reader) -> Result<Vec<AtnState>, AtnError> {
        let n = r.next("state count")?;
        let mut states = Vec::with_capacity(n.max(0) as usize);
        for i in 0..n {
            let state_type_tag = r.next("state type")?;
            let state_type = decode_state_type(state_type_tag)?;
            let rule_index_raw = r.next("state rule index")?;
            let rule_index = if rule_index_raw == 0xFFFF { -1 } else { rule_index_raw };
            let mut state = AtnState::new(i, state_type, rule_index);
            match state_type {
                StateType::LoopEnd => {
                    state.loop_back_state = r.next("loopEnd.loopBackState")?;
                }
                StateType::PlusBlockStart | StateType::StarBlockStart => {
                    state.end_state = r.next("blockStart.endState")?;
                }
                _ => {}
            }
            states.push(state);
        }
        Ok(states)
    }

    fn read_state_lists(r: &mut Reader) -> Result<(Vec<i32>, Vec<i32>), AtnError> {
        let non_greedy_count = r.next("non-greedy state count")?;
        let mut non_greedy = Vec::with_capacity(non_greedy_count.max(0) as usize);
        for _ in 0..non_greedy_count {
            non_greedy.push(r.next("non-greedy state")?);
        }
        let precedence_count = r.next("precedence state count")?;
        let mut precedence = Vec::with_capacity(precedence_count.max(0) as usize);
        for _ in 0..precedence_count {
            precedence.push(r.next("precedence state")?);
        }
        Ok((non_greedy, precedence))
    }

    fn read_rules(
        r: &mut Reader,
        grammar_type: GrammarType,
        states: &[AtnState],
    ) -> Result<(Vec<i32>, Vec<i32>), AtnError> {
        let n = r.next("rule count")?;
        let mut starts = Vec::with_capacity(n.max(0) as usize);
        let mut token_types = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            let start = r.next("rule start state")?;
            if (start as usize) >= states.len() {
                return Err(AtnError::Inconsistent(format!("rule start state {start} out of range")));
            }
            starts.push(start);
            if grammar_type == GrammarType::Lexer {
                let tt = r.next("rule token type")?;
                token_types.push(if tt == 0xFFFF { TOKEN_EOF } else { tt });
            }
        }
        Ok((starts, token_types))
    }

    fn derive_rule_stop_states(states: &[AtnState], rule_count: usize) -> Vec<i32> {
        let mut stops = vec![INVALID_STATE_NUMBER; rule_count];
        for s in states {
            if s.state_type == StateType::RuleStop && (s.rule_index as usize) < rule_count {
                stops[s.rule_index as usize] = s.state_number;
            }
        }
        stops
    }

    fn read_modes(r: &mut Reader) -> Result<Vec<i32>, AtnError> {
        let n = r.next("mode count")?;
        let mut modes = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            modes.push(r.next("mode start state")?);
        }
        Ok(modes)
    }

    fn read_sets(r: &mut Reader, wide: bool) -> Result<Vec<IntervalSet>, AtnError> {
        let n = r.next("set count")?;
        let mut sets = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            let interval_count = r.next("set interval count")?;
            let contains_eof = r.next("set containsEof")? != 0;
            let mut set = IntervalSet::new();
            if contains_eof {
                set.add_point(TOKEN_EOF);
            }
            for _ in 0..interval_count {
                let (lo, hi_inclusive) = if wide {
                    (r.next_u32("set interval lo")?, r.next_u32("set interval hi")?)
                } else {
                    (r.next("set interval lo")?, r.next("set interval hi")?)
                };
                // The wire format stores inclusive endpoints; this crate's
                // IntervalSet is half-open, so the high end is bumped by 1.
                set.add_range(lo, hi_inclusive + 1);
            }
            sets.push(set);
        }
        Ok(sets)
    }

    fn read_edges(
        r: &mut Reader,
        states: &mut [AtnState],
        sets: &[IntervalSet],
        rule_to_stop_state: &[i32],
    ) -> Result<(), AtnError> {
        let n = r.next("edge count")?;
        let mut synthesized = Vec::new();
        for _ in 0..n {
            let src = r.next("edge src")?;
            let trg = r.next("edge trg")?;
            let ttype = r.next("edge type")?;
            let arg1 = r.next("edge arg1")?;
            let arg2 = r.next("edge arg2")?;
            let arg3 = r.next("edge arg3")?;

            let transition = build_transition(ttype, trg, arg1, arg2, arg3, sets)?;

            if let TransitionKind::Rule { rule_index, follow_state, .. } = &transition.kind {
                let follow_state = *follow_state;
                let callee_stop = *rule_to_stop_state
                    .get(*rule_index as usize)
                    .ok_or_else(|| AtnError::Inconsistent(format!("rule transition to unknown rule {rule_index}")))?;
                let outermost = if arg3 /* precedence */ == 0 { *rule_index } else { -1 };
                let mut ret = Transition::new(follow_state, TransitionKind::Epsilon);
                ret.outermost_precedence_return = outermost;
                synthesized.push((callee_stop, ret));
            }

            states[src as usize].add_transition(transition);
        }
        for (src, t) in synthesized {
            states[src as usize].add_transition(t);
        }
        Ok(())
    }

    fn read_decisions(r: &mut Reader, states: &mut [AtnState]) -> Result<Vec<i32>, AtnError> {
        let n = r.next("decision count")?;
        let mut decision_to_state = Vec::with_capacity(n.max(0) as usize);
        for i in 0..n {
            let s = r.next("decision state")?;
            states[s as usize].decision = i;
            decision_to_state.push(s);
        }
        Ok(decision_to_state)
    }

    fn read_lexer_actions(r: &mut Reader) -> Result<Vec<LexerAction>, AtnError> {
        let n = r.next("lexer action count")?;
        let mut actions = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            let action_type = r.next("lexer action type")?;
            let data1_raw = r.next("lexer action data1")?;
            let data2_raw = r.next("lexer action data2")?;
            let data1 = if data1_raw == 0xFFFF { -1 } else { data1_raw };
            let data2 = if data2_raw == 0xFFFF { -1 } else { data2_raw };
            actions.push(decode_lexer_action(action_type, data1, data2)?);
        }
        Ok(actions)
    }

    /// Fills in the back-references the wire format leaves implicit:
    /// `RuleStart.end_state` (from the rule table), `BlockEnd.start_state`
    /// (from every block-start state's forward `end_state` link), and
    /// `StarLoopEntry`/`PlusBlockStart.loop_back_state` (from the matching
    /// `StarLoopBack`/`PlusLoopBack` state's single return edge).
    fn link_back_references(states: &mut [AtnState], rule_to_start_state: &[i32], rule_to_stop_state: &[i32]) {
        for (rule_index, &start) in rule_to_start_state.iter().enumerate() {
            states[start as usize].end_state = rule_to_stop_state[rule_index];
        }

        let block_starts: Vec<(i32, i32)> = states
            .iter()
            .filter(|s| {
                matches!(
                    s.state_type,
                    StateType::BlockStart | StateType::PlusBlockStart | StateType::StarBlockStart
                )
            })
            .map(|s| (s.state_number, s.end_state))
            .collect();
        for (start, end) in block_starts {
            if end != INVALID_STATE_NUMBER {
                states[end as usize].start_state = start;
            }
        }

        let loop_backs: Vec<(i32, i32)> = states
            .iter()
            .filter(|s| matches!(s.state_type, StateType::StarLoopBack | StateType::PlusLoopBack))
            .flat_map(|s| s.transitions.iter().map(move |t| (s.state_number, t.target)))
            .collect();
        for (back, target) in loop_backs {
            if matches!(
                states[target as usize].state_type,
                StateType::StarLoopEntry | StateType::PlusBlockStart
            ) {
                states[target as usize].loop_back_state = back;
            }
        }
    }

    /// For each `StarLoopEntry` in a precedence rule whose final outgoing
    /// transition leads to a `LoopEnd` whose sole outgoing transition
    /// targets a `RuleStop`, this is the "continue the left-recursive rule"
    /// decision: mark it so the parser (not this crate's concern directly,
    /// but carried for ATN fidelity) can special-case precedence climbing.
    fn mark_precedence_decisions(states: &mut [AtnState]) {
        for i in 0..states.len() {
            if states[i].state_type != StateType::StarLoopEntry {
                continue;
            }
            let Some(last) = states[i].transitions.last() else { continue };
            let loop_end = last.target;
            let Some(loop_end_state) = states.get(loop_end as usize) else { continue };
            if loop_end_state.state_type != StateType::LoopEnd {
                continue;
            }
            let is_precedence_rule_continuation = loop_end_state.transitions.len() == 1
                && states
                    .get(loop_end_state.transitions[0].target as usize)
                    .map(|s| s.state_type == StateType::RuleStop)
                    .unwrap_or(false);
            if is_precedence_rule_continuation {
                states[i].is_precedence_decision = true;
            }
        }
    }

    fn verify(atn: &Atn) -> Result<(), AtnError> {
        for s in &atn.states {
            match s.state_type {
                StateType::PlusBlockStart | StateType::StarLoopEntry => {
                    if s.loop_back_state == INVALID_STATE_NUMBER {
                        return Err(AtnError::Inconsistent(format!(
                            "state {} has no loopBackState",
                            s.state_number
                        )));
                    }
                }
                StateType::BlockEnd => {
                    if s.start_state == INVALID_STATE_NUMBER {
                        return Err(AtnError::Inconsistent(format!(
                            "BlockEnd state {} has no startState",
                            s.state_number
                        )));
                    }
                }
                StateType::RuleStart => {
                    if s.end_state == INVALID_STATE_NUMBER {
                        return Err(AtnError::Inconsistent(format!(
                            "RuleStart state {} has no stopState",
                            s.state_number
                        )));
                    }
                }
                StateType::LoopEnd => {
                    if s.loop_back_state == INVALID_STATE_NUMBER {
                        return Err(AtnError::Inconsistent(format!(
                            "LoopEnd state {} has no loopBackState",
                            s.state_number
                        )));
                    }
                }
                _ => {}
            }

            if s.state_type == StateType::StarLoopEntry {
                if s.transitions.len() != 2 {
                    return Err(AtnError::Inconsistent(format!(
                        "StarLoopEntry state {} must have exactly two transitions",
                        s.state_number
                    )));
                }
                let targets: Result<Vec<StateType>, AtnError> = s
                    .transitions
                    .iter()
                    .map(|t| Ok(atn.state(t.target).state_type))
                    .collect();
                let targets = targets?;
                let shape_ok = if s.non_greedy {
                    targets == [StateType::LoopEnd, StateType::StarBlockStart]
                } else {
                    targets == [StateType::StarBlockStart, StateType::LoopEnd]
                };
                if !shape_ok {
                    return Err(AtnError::Inconsistent(format!(
                        "StarLoopEntry state {} has unexpected transition shape {targets:?}",
                        s.state_number
                    )));
                }
            }

            let non_epsilon_count = s.transitions.iter().filter(|t| !t.is_epsilon()).count();
            let has_multiple_real_transitions = non_epsilon_count > 1
                || (non_epsilon_count == 1 && s.transitions.len() > 1);
            if has_multiple_real_transitions
                && !s.is_decision_state()
                && s.state_type != StateType::RuleStop
                && !s.epsilon_only_transitions
            {
                return Err(AtnError::Inconsistent(format!(
                    "state {} has multiple outgoing transitions but is not epsilon-only, a decision state, or a rule stop",
                    s.state_number
                )));
            }
        }
        Ok(())
    }
}

fn decode_state_type(tag: i32) -> Result<StateType, AtnError> {
    Ok(match tag {
        1 => StateType::Basic,
        2 => StateType::RuleStart,
        3 => StateType::BlockStart,
        4 => StateType::PlusBlockStart,
        5 => StateType::StarBlockStart,
        6 => StateType::TokenStart,
        7 => StateType::RuleStop,
        8 => StateType::BlockEnd,
        9 => StateType::StarLoopBack,
        10 => StateType::StarLoopEntry,
        11 => StateType::PlusLoopBack,
        12 => StateType::LoopEnd,
        other => return Err(AtnError::UnknownStateType(other)),
    })
}

fn build_transition(
    ttype: i32,
    trg: i32,
    arg1: i32,
    arg2: i32,
    arg3: i32,
    sets: &[IntervalSet],
) -> Result<Transition, AtnError> {
    let kind = match ttype {
        1 => TransitionKind::Epsilon,
        2 => TransitionKind::Range { lo: arg1, hi: arg2 + 1 },
        3 => TransitionKind::Rule { follow_state: arg1, rule_index: 0, precedence: arg3 },
        4 => TransitionKind::Predicate { rule_index: arg1, pred_index: arg2, ctx_dependent: arg3 != 0 },
        5 => TransitionKind::Atom { symbol: arg1 },
        6 => TransitionKind::Action { rule_index: arg1, action_index: arg2, ctx_dependent: arg3 != 0 },
        7 => TransitionKind::Set(
            sets.get(arg1 as usize)
                .cloned()
                .ok_or_else(|| AtnError::Inconsistent(format!("set transition references unknown set {arg1}")))?,
        ),
        8 => TransitionKind::NotSet(
            sets.get(arg1 as usize)
                .cloned()
                .ok_or_else(|| AtnError::Inconsistent(format!("not-set transition references unknown set {arg1}")))?,
        ),
        9 => TransitionKind::Wildcard,
        10 => TransitionKind::PrecedencePredicate { precedence: arg1 },
        other => return Err(AtnError::UnknownTransitionType(other)),
    };
    let kind = match kind {
        // The rule index for a `Rule` transition is carried in arg2, not
        // arg1 (arg1 is the follow state); fix it up now that `arg1`/`arg2`
        // have done double duty above.
        TransitionKind::Rule { follow_state, precedence, .. } => {
            TransitionKind::Rule { follow_state, rule_index: arg2, precedence }
        }
        other => other,
    };
    Ok(Transition::new(trg, kind))
}

fn decode_lexer_action(action_type: i32, data1: i32, data2: i32) -> Result<LexerAction, AtnError> {
    Ok(match action_type {
        0 => LexerAction::Channel(data1),
        1 => LexerAction::Custom { rule_index: data1, action_index: data2 },
        2 => LexerAction::Mode(data1),
        3 => LexerAction::More,
        4 => LexerAction::PopMode,
        5 => LexerAction::PushMode(data1),
        6 => LexerAction::Skip,
        7 => LexerAction::Type(data1),
        other => return Err(AtnError::UnknownActionType(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a value the way the serializer does: `+2` modulo 16 bits.
    fn enc(v: i64) -> u16 {
        (v + 2) as u16
    }

    fn uuid_units(uuid: [u16; 8]) -> Vec<u16> {
        uuid.iter().map(|&u| enc(u as i64)).collect()
    }

    /// Builds the minimal payload for a lexer ATN with a single mode whose
    /// start state has one `Atom('a')` transition into its rule's stop
    /// state, emitting token type 5.
    fn minimal_lexer_atn_units() -> Vec<u16> {
        let mut u = vec![enc(SERIALIZED_VERSION as i64)];
        u.extend(uuid_units(BASE_UUID));
        u.push(enc(0)); // grammarType = lexer
        u.push(enc(10)); // maxTokenType

        // states: 0 = TokenStart, 1 = RuleStart, 2 = RuleStop
        u.push(enc(3)); // state count
        u.push(enc(6)); // TokenStart
        u.push(enc(0xFFFF)); // ruleIndex -1
        u.push(enc(2)); // RuleStart
        u.push(enc(0)); // ruleIndex 0
        u.push(enc(7)); // RuleStop
        u.push(enc(0)); // ruleIndex 0

        u.push(enc(0)); // non-greedy count
        u.push(enc(0)); // precedence count

        u.push(enc(1)); // rule count
        u.push(enc(1)); // rule 0 start state = 1 (RuleStart)
        u.push(enc(5)); // rule 0 token type = 5

        u.push(enc(1)); // mode count
        u.push(enc(0)); // mode 0 start state = 0 (TokenStart)

        u.push(enc(0)); // set count (16-bit block)

        u.push(enc(2)); // edge count
        // TokenStart --epsilon--> RuleStart
        u.push(enc(0));
        u.push(enc(1));
        u.push(enc(1)); // epsilon
        u.push(enc(0));
        u.push(enc(0));
        u.push(enc(0));
        // RuleStart --atom 'a'--> RuleStop
        u.push(enc(1));
        u.push(enc(2));
        u.push(enc(5)); // atom
        u.push(enc('a' as i64));
        u.push(enc(0));
        u.push(enc(0));

        u.push(enc(0)); // decision count
        u.push(enc(0)); // lexer action count
        u
    }

    #[test]
    fn decodes_minimal_lexer_atn() {
        let units = minimal_lexer_atn_units();
        let atn = AtnDeserializer::deserialize(&units, true).expect("should deserialize");
        assert_eq!(atn.grammar_type, GrammarType::Lexer);
        assert_eq!(atn.max_token_type, 10);
        assert_eq!(atn.states.len(), 3);
        assert_eq!(atn.rule_to_start_state, vec![1]);
        assert_eq!(atn.rule_to_stop_state, vec![2]);
        assert_eq!(atn.rule_to_token_type, vec![5]);
        assert_eq!(atn.mode_to_start_state, vec![0]);
        assert_eq!(atn.state(0).transitions.len(), 1);
        assert_eq!(atn.state(1).transitions.len(), 1);
        assert!(matches!(atn.state(1).transitions[0].kind, TransitionKind::Atom { symbol } if symbol == 'a' as i32));
    }

    #[test]
    fn rejects_bad_version() {
        let mut units = minimal_lexer_atn_units();
        units[0] = enc(99);
        let err = AtnDeserializer::deserialize(&units, true).unwrap_err();
        assert!(matches!(err, AtnError::UnsupportedVersion(99, SERIALIZED_VERSION)));
    }

    #[test]
    fn rejects_unknown_uuid() {
        let mut units = minimal_lexer_atn_units();
        units[1] = enc(0x1234); // clobber first uuid unit (index 0 is the version)
        let err = AtnDeserializer::deserialize(&units, true).unwrap_err();
        assert!(matches!(err, AtnError::UnsupportedUuid(_)));
    }

    #[test]
    fn rejects_truncated_payload() {
        let units = &minimal_lexer_atn_units()[..5];
        let err = AtnDeserializer::deserialize(units, true).unwrap_err();
        assert!(matches!(err, AtnError::Truncated(_)));
    }

    #[test]
    fn set_endpoints_are_converted_from_inclusive_to_half_open() {
        // set count=1, interval count=1, containsEof=false, lo=5, hi=9 (inclusive)
        let mut r = Reader::new(&[enc(1), enc(1), enc(0), enc(5), enc(9)]);
        let sets = AtnDeserializer::read_sets(&mut r, false).unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].contains(9));
        assert!(!sets[0].contains(10));
    }
}
