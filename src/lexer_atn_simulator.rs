//! The adaptive lexer simulator: DFA walk with ATN fallback, closure/reach
//! over the GSS, semantic-predicate handling, and action deferral.
//!
//! This is the inner loop a generated lexer's `next_token` drives once per
//! token: `match_token` either reuses a previously-interned DFA (the
//! common case, O(1) per symbol) or extends it on the fly by running the
//! ATN closure, caching the result so the next lexer instance on the same
//! grammar benefits immediately.

use std::sync::Arc;

use crate::{
    atn::{transition::MAX_CHAR_VALUE, Atn, StateType, Transition, TransitionKind},
    atn_config::LexerAtnConfig,
    atn_config_set::AtnConfigSet,
    char_stream::{CharStream, EOF},
    dfa::{Dfa, DfaState, ERROR_STATE},
    errors::LexerError,
    lexer_action::{LexerActionExecutor, LexerActionHost},
    prediction_context::{MergeCache, PredictionContext, SharedContextCache, EMPTY_RETURN_STATE},
    token::TOKEN_EOF,
};

/// Capability a generated lexer must provide beyond [`LexerActionHost`]:
/// evaluating a grammar's semantic predicates. Kept as a separate
/// supertrait rather than folded into `LexerActionHost` since predicates
/// are simulator-level (they gate closure expansion) while actions are
/// purely side effects applied at accept time.
pub trait LexerHost: LexerActionHost {
    fn sempred(&mut self, rule_index: i32, pred_index: i32) -> bool;
}

/// Snapshot of the most recent accept point seen during one `match_token`
/// call, so the simulator can rewind to it once the DFA/ATN walk dies.
struct SimState {
    index: usize,
    line: i32,
    column: i32,
    dfa_state: Arc<DfaState>,
}

pub struct LexerAtnSimulator<'a> {
    atn: &'a Atn,
    dfas: &'a [Dfa],
    shared_context_cache: &'a SharedContextCache,
    merge_cache: MergeCache,

    pub line: i32,
    pub column: i32,
    start_index: usize,
}

impl<'a> LexerAtnSimulator<'a> {
    pub fn new(atn: &'a Atn, dfas: &'a [Dfa], shared_context_cache: &'a SharedContextCache) -> Self {
        Self {
            atn,
            dfas,
            shared_context_cache,
            merge_cache: MergeCache::new(),
            line: 1,
            column: 0,
            start_index: 0,
        }
    }

    /// Entry point: matches one token under `mode`, returning its type, or
    /// [`crate::token::TOKEN_EOF`] at end of input, or a [`LexerError`] if
    /// no rule accepts.
    pub fn match_token<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        mode: usize,
        host: &mut H,
    ) -> Result<i32, LexerError> {
        let marker = input.mark();
        self.start_index = input.index();
        let dfa = &self.dfas[mode];
        let result = match dfa.s0() {
            Some(s0) => {
                log::trace!("lexer: mode {mode} dfa hit at start, state {}", s0.state_number);
                self.exec_atn(input, dfa, s0, host)
            }
            None => {
                log::trace!("lexer: mode {mode} has no start state, falling back to ATN");
                self.match_atn(input, mode, host)
            }
        };
        input.release(marker);
        result
    }

    fn match_atn<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        mode: usize,
        host: &mut H,
    ) -> Result<i32, LexerError> {
        let start_state = self.atn.state(self.atn.mode_to_start_state[mode]);
        let mut configs = AtnConfigSet::new(false);
        for (i, t) in start_state.transitions.iter().enumerate() {
            let c = LexerAtnConfig::new(t.target, i + 1, PredictionContext::Empty);
            self.closure(input, c, &mut configs, false, false, true, host)?;
        }

        let dfa = &self.dfas[mode];
        configs.optimize_contexts(self.shared_context_cache);
        let suppress_s0 = configs.has_semantic_context;
        let next = dfa.add_dfa_state(self.atn, configs);
        if suppress_s0 {
            log::trace!("lexer: mode {mode} start closure has semantic context, not caching s0");
        } else {
            dfa.set_s0(next.clone());
        }
        self.exec_atn(input, dfa, next, host)
    }

    fn exec_atn<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        dfa: &Dfa,
        mut s: Arc<DfaState>,
        host: &mut H,
    ) -> Result<i32, LexerError> {
        let mut prev_accept = if s.is_accept_state { Some(self.capture(input, &s)) } else { None };
        let mut t = input.la(1);
        loop {
            let target = match s.edge(t) {
                Some(ERROR_STATE) => None,
                Some(id) => Some(dfa.state(id)),
                None => self.compute_target_state(input, dfa, &s, t, host)?,
            };
            let Some(target) = target else {
                break;
            };

            if t != EOF {
                self.consume(input);
            }
            if target.is_accept_state {
                prev_accept = Some(self.capture(input, &target));
                if t == EOF {
                    break;
                }
            }
            t = input.la(1);
            s = target;
        }
        self.fail_or_accept(input, prev_accept, &s.configs, t, host)
    }

    fn capture(&self, input: &dyn CharStream, s: &Arc<DfaState>) -> SimState {
        SimState { index: input.index(), line: self.line, column: self.column, dfa_state: s.clone() }
    }

    fn compute_target_state<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        dfa: &Dfa,
        s: &Arc<DfaState>,
        t: i32,
        host: &mut H,
    ) -> Result<Option<Arc<DfaState>>, LexerError> {
        let mut reach = self.reach(input, &s.configs, t, host)?;
        if reach.is_empty() {
            if !reach.has_semantic_context {
                dfa.add_dfa_edge(s, t, ERROR_STATE);
            }
            return Ok(None);
        }

        reach.optimize_contexts(self.shared_context_cache);
        let suppress_edge = reach.has_semantic_context;
        let target = dfa.add_dfa_state(self.atn, reach);
        if suppress_edge {
            log::trace!("lexer: reach under {t} has semantic context, not caching edge");
        } else {
            dfa.add_dfa_edge(s, t, target.state_number);
        }
        log::trace!("lexer: computed target state {} under symbol {t}", target.state_number);
        Ok(Some(target))
    }

    /// `getReachableConfigSet`: one step under symbol `t`, closed over
    /// epsilon transitions. Implements longest-match/first-alt-wins: once
    /// any config for alt `a` reaches an accept state, later configs for
    /// `a` that passed through a non-greedy decision are skipped for the
    /// rest of this step — a plain greedy continuation of the same alt is
    /// not discarded by this rule.
    fn reach<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        configs: &AtnConfigSet,
        t: i32,
        host: &mut H,
    ) -> Result<AtnConfigSet, LexerError> {
        let mut reach = AtnConfigSet::new(false);
        let mut skip_alt: Option<usize> = None;
        let offset = input.index().saturating_sub(self.start_index);
        let treat_eof_as_epsilon = t == EOF;

        for c in configs.iter() {
            if skip_alt == Some(c.alt) && c.passed_through_non_greedy_decision {
                continue;
            }
            for transition in &self.atn.state(c.state).transitions {
                if !transition.matches(t, 0, MAX_CHAR_VALUE) {
                    continue;
                }
                let fixed_executor = c
                    .lexer_action_executor
                    .as_ref()
                    .map(|e| Arc::new(e.fix_offset_before_match(offset)));
                let next_config =
                    c.transition_to(transition.target, false).with_action_executor(fixed_executor);
                let reached_accept = self.closure(
                    input,
                    next_config,
                    &mut reach,
                    false,
                    true,
                    treat_eof_as_epsilon,
                    host,
                )?;
                if reached_accept {
                    skip_alt = Some(c.alt);
                }
            }
        }
        Ok(reach)
    }

    /// Epsilon-closure over the GSS. `current_alt_reached_accept_state`
    /// suppresses re-adding configs for an alt that has already reached an
    /// accept via a non-greedy decision (longest-match arbitration).
    /// `speculative` marks predicate evaluation as save/restore (used from
    /// `reach`); `treat_eof_as_epsilon` lets a rule that matches solely on
    /// EOF (or accepts zero input at end of stream) reach its accept state
    /// through an epsilon-shaped step instead of needing a real symbol.
    fn closure<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        config: LexerAtnConfig,
        configs: &mut AtnConfigSet,
        current_alt_reached_accept_state: bool,
        speculative: bool,
        treat_eof_as_epsilon: bool,
        host: &mut H,
    ) -> Result<bool, LexerError> {
        if self.atn.state(config.state).state_type == StateType::RuleStop {
            return self.closure_rule_stop(input, config, configs, speculative, treat_eof_as_epsilon, host);
        }

        let state = self.atn.state(config.state);
        if !state.epsilon_only_transitions
            && !(current_alt_reached_accept_state && config.passed_through_non_greedy_decision)
        {
            configs.add(config.clone(), &mut self.merge_cache).expect("config set not yet frozen");
        }

        // Accumulate, not just pass through: once one sibling transition's
        // closure reaches accept, later siblings processed in this same
        // call must see that — it's what lets a non-greedy exit taken
        // first suppress the greedy continuation taken second.
        let mut reached_accept = current_alt_reached_accept_state;
        for t in &state.transitions {
            if let Some(next) =
                self.get_epsilon_target(input, &config, t, speculative, treat_eof_as_epsilon, configs, host)?
            {
                reached_accept |=
                    self.closure(input, next, configs, reached_accept, speculative, treat_eof_as_epsilon, host)?;
            }
        }
        Ok(reached_accept)
    }

    fn closure_rule_stop<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        config: LexerAtnConfig,
        configs: &mut AtnConfigSet,
        speculative: bool,
        treat_eof_as_epsilon: bool,
        host: &mut H,
    ) -> Result<bool, LexerError> {
        if config.context.is_empty() {
            configs.add(config, &mut self.merge_cache).expect("config set not yet frozen");
            return Ok(true);
        }

        let (parents, return_states) = config.context.as_array_parts();
        let mut reached_accept = false;
        for (parent, return_state) in parents.into_iter().zip(return_states) {
            if return_state == EMPTY_RETURN_STATE {
                let empty = config.clone().with_context(PredictionContext::Empty);
                configs.add(empty, &mut self.merge_cache).expect("config set not yet frozen");
                reached_accept = true;
            } else {
                let next = LexerAtnConfig::new(return_state, config.alt, parent)
                    .with_action_executor(config.lexer_action_executor.clone());
                reached_accept |=
                    self.closure(input, next, configs, false, speculative, treat_eof_as_epsilon, host)?;
            }
        }
        Ok(reached_accept)
    }

    #[allow(clippy::too_many_arguments)]
    fn get_epsilon_target<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        config: &LexerAtnConfig,
        t: &Transition,
        speculative: bool,
        treat_eof_as_epsilon: bool,
        configs: &mut AtnConfigSet,
        host: &mut H,
    ) -> Result<Option<LexerAtnConfig>, LexerError> {
        match &t.kind {
            TransitionKind::Rule { follow_state, .. } => {
                let ctx = PredictionContext::singleton(config.context.clone(), *follow_state);
                Ok(Some(config.transition_to(t.target, false).with_context(ctx)))
            }
            TransitionKind::Epsilon => {
                let source = self.atn.state(config.state);
                let non_greedy = source.state_type == StateType::StarLoopEntry && source.non_greedy;
                Ok(Some(config.transition_to(t.target, non_greedy)))
            }
            TransitionKind::Predicate { rule_index, pred_index, .. } => {
                configs.has_semantic_context = true;
                let ok = self.evaluate_predicate(input, host, *rule_index, *pred_index, speculative);
                if ok {
                    Ok(Some(config.transition_to(t.target, false)))
                } else {
                    Ok(None)
                }
            }
            TransitionKind::Action { action_index, .. } => {
                // `action_index` indexes the ATN's decoded action table, same
                // as a real lexer action transition; `-1` means "the action
                // already sits on this config's executor, just carry it
                // forward" (used when a config re-enters this edge).
                let executor = if *action_index < 0 {
                    config.lexer_action_executor.clone()
                } else {
                    let action = self
                        .atn
                        .lexer_actions
                        .get(*action_index as usize)
                        .cloned()
                        .expect("action_index out of range for a well-formed ATN");
                    Some(Arc::new(LexerActionExecutor::append(config.lexer_action_executor.as_deref(), action)))
                };
                if config.context.is_empty() {
                    Ok(Some(config.transition_to(t.target, false).with_action_executor(executor)))
                } else {
                    Ok(Some(config.transition_to(t.target, false)))
                }
            }
            TransitionKind::PrecedencePredicate { .. } => Err(LexerError::IllegalPredicateInLexer),
            TransitionKind::Atom { .. }
            | TransitionKind::Range { .. }
            | TransitionKind::Set(_)
            | TransitionKind::NotSet(_)
            | TransitionKind::Wildcard => {
                if treat_eof_as_epsilon && t.matches(EOF, 0, MAX_CHAR_VALUE) {
                    Ok(Some(config.transition_to(t.target, false)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn evaluate_predicate<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        host: &mut H,
        rule_index: i32,
        pred_index: i32,
        speculative: bool,
    ) -> bool {
        if !speculative {
            return host.sempred(rule_index, pred_index);
        }
        let saved_line = self.line;
        let saved_column = self.column;
        let saved_index = input.index();
        let marker = input.mark();
        self.consume(input);
        let result = host.sempred(rule_index, pred_index);
        self.line = saved_line;
        self.column = saved_column;
        input.seek(saved_index);
        input.release(marker);
        result
    }

    fn fail_or_accept<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        prev_accept: Option<SimState>,
        reach: &AtnConfigSet,
        t: i32,
        host: &mut H,
    ) -> Result<i32, LexerError> {
        if let Some(sim) = prev_accept {
            let executor = sim.dfa_state.lexer_action_executor.clone();
            let prediction = sim.dfa_state.prediction;
            self.accept(input, executor, self.start_index, sim.index, sim.line, sim.column, host);
            return Ok(prediction);
        }
        if t == EOF && input.index() == self.start_index {
            return Ok(TOKEN_EOF);
        }
        Err(LexerError::NoViableAlt { start_index: self.start_index, dead_end_configs: reach.clone() })
    }

    #[allow(clippy::too_many_arguments)]
    fn accept<H: LexerHost>(
        &mut self,
        input: &mut dyn CharStream,
        executor: Option<Arc<LexerActionExecutor>>,
        start_index: usize,
        stop_index: usize,
        line: i32,
        column: i32,
        host: &mut H,
    ) {
        input.seek(stop_index);
        self.line = line;
        self.column = column;
        if let Some(exec) = executor {
            exec.execute(host, input, start_index, stop_index);
        }
    }

    fn consume(&mut self, input: &mut dyn CharStream) {
        let c = input.la(1);
        if c == '\n' as i32 {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        input.consume();
    }
}
