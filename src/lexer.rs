//! Host-facing convenience wrapper: owns the simulator, the input stream,
//! and the mode/channel/type bookkeeping a generated lexer's `next_token`
//! needs, translating `Skip`/`More` into loop control instead of emitting.
//!
//! A generated lexer embeds this by composition (construct one `Lexer`
//! per input, supplying its own [`LexerActions`] for predicates and custom
//! actions) rather than by subclassing, since there is no subclassing.

use crate::{
    atn::Atn,
    char_stream::CharStream,
    dfa::Dfa,
    errors::LexerError,
    lexer_action::LexerActionHost,
    lexer_atn_simulator::{LexerAtnSimulator, LexerHost},
    prediction_context::SharedContextCache,
    token::{CommonToken, CommonTokenFactory, TokenFactory, TOKEN_DEFAULT_CHANNEL, TOKEN_EOF, TOKEN_INVALID_TYPE},
};

/// Callbacks a generated lexer's grammar actions compile down to: semantic
/// predicates gating a rule alternative, and arbitrary embedded code run
/// at accept time.
pub trait LexerActions {
    fn sempred(&mut self, rule_index: i32, pred_index: i32) -> bool;
    fn action(&mut self, rule_index: i32, action_index: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PendingAction {
    #[default]
    Emit,
    Skip,
    More,
}

/// Mode/channel/type state the simulator drives through [`LexerActionHost`]
/// callbacks, kept separate from [`Lexer`] itself so `next_token` can hold
/// disjoint mutable borrows of the simulator, the input, and this state at
/// once.
struct LexerState<A: LexerActions> {
    mode: usize,
    mode_stack: Vec<usize>,
    channel: i32,
    type_: i32,
    action: PendingAction,
    actions: A,
}

impl<A: LexerActions> LexerActionHost for LexerState<A> {
    fn set_type(&mut self, token_type: i32) {
        self.type_ = token_type;
    }
    fn set_channel(&mut self, channel: i32) {
        self.channel = channel;
    }
    fn mode(&mut self, m: i32) {
        self.mode = m as usize;
    }
    fn push_mode(&mut self, m: i32) {
        self.mode_stack.push(self.mode);
        self.mode = m as usize;
    }
    fn pop_mode(&mut self) -> i32 {
        let m = self.mode_stack.pop().unwrap_or(self.mode);
        self.mode = m;
        m as i32
    }
    fn skip(&mut self) {
        self.action = PendingAction::Skip;
    }
    fn more(&mut self) {
        self.action = PendingAction::More;
    }
    fn custom_action(&mut self, rule_index: i32, action_index: i32) {
        self.actions.action(rule_index, action_index);
    }
}

impl<A: LexerActions> LexerHost for LexerState<A> {
    fn sempred(&mut self, rule_index: i32, pred_index: i32) -> bool {
        self.actions.sempred(rule_index, pred_index)
    }
}

pub struct Lexer<'a, C: CharStream, A: LexerActions> {
    simulator: LexerAtnSimulator<'a>,
    input: C,
    state: LexerState<A>,
    token_factory: CommonTokenFactory,
}

impl<'a, C: CharStream, A: LexerActions> Lexer<'a, C, A> {
    pub fn new(
        atn: &'a Atn,
        dfas: &'a [Dfa],
        shared_context_cache: &'a SharedContextCache,
        input: C,
        actions: A,
    ) -> Self {
        Self {
            simulator: LexerAtnSimulator::new(atn, dfas, shared_context_cache),
            input,
            state: LexerState {
                mode: 0,
                mode_stack: Vec::new(),
                channel: TOKEN_DEFAULT_CHANNEL,
                type_: TOKEN_INVALID_TYPE,
                action: PendingAction::Emit,
                actions,
            },
            token_factory: CommonTokenFactory,
        }
    }

    pub fn input(&self) -> &C {
        &self.input
    }

    pub fn mode(&self) -> usize {
        self.state.mode
    }

    /// Matches and returns the next token, applying `Skip`/`More` lexer
    /// actions by looping instead of emitting. Returns a [`CommonToken`]
    /// with `token_type == TOKEN_EOF` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<CommonToken, LexerError> {
        let mut token_start = self.input.index();
        let mut start_line = self.simulator.line;
        let mut start_column = self.simulator.column;
        self.state.type_ = TOKEN_INVALID_TYPE;
        self.state.channel = TOKEN_DEFAULT_CHANNEL;

        loop {
            self.state.action = PendingAction::Emit;
            let predicted = self.simulator.match_token(&mut self.input, self.state.mode, &mut self.state)?;

            match self.state.action {
                PendingAction::Skip => {
                    token_start = self.input.index();
                    start_line = self.simulator.line;
                    start_column = self.simulator.column;
                    self.state.type_ = TOKEN_INVALID_TYPE;
                    self.state.channel = TOKEN_DEFAULT_CHANNEL;
                }
                PendingAction::More => {}
                PendingAction::Emit => {
                    let token_type = if self.state.type_ != TOKEN_INVALID_TYPE { self.state.type_ } else { predicted };
                    if token_type == TOKEN_EOF {
                        return Ok(CommonToken {
                            token_type: TOKEN_EOF,
                            channel: self.state.channel,
                            start: token_start,
                            stop: token_start,
                            line: start_line,
                            column: start_column,
                            text: String::new(),
                        });
                    }
                    let stop = self.input.index() - 1;
                    return Ok(self.token_factory.create(
                        &self.input,
                        token_type,
                        self.state.channel,
                        token_start,
                        stop,
                        start_line,
                        start_column,
                    ));
                }
            }
        }
    }
}
