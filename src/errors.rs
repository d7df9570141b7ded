//! Error types produced by the ATN deserializer and the lexer simulator.
//!
//! The split mirrors the two failure modes described by the runtime: a bad
//! or inconsistent serialized ATN is a fatal, construction-time problem,
//! while a dead end during `match` is a per-call, recoverable one.

use thiserror::Error;

use crate::atn_config_set::AtnConfigSet;

/// Fatal errors raised while deserializing or verifying a serialized ATN.
///
/// A generated lexer cannot proceed without a valid ATN, so these are
/// normally unwrapped once at construction time by generated code, exactly
/// as the upstream ANTLR runtimes do; a host that wants a graceful failure
/// path can propagate them with `?` instead.
#[derive(Debug, Error)]
pub enum AtnError {
    #[error("unsupported ATN serialization version {0}, expected {1}")]
    UnsupportedVersion(i32, i32),

    #[error("unsupported ATN UUID {0}")]
    UnsupportedUuid(String),

    #[error("unknown ATN state type {0}")]
    UnknownStateType(i32),

    #[error("unknown transition type {0}")]
    UnknownTransitionType(i32),

    #[error("unknown lexer action type {0}")]
    UnknownActionType(i32),

    #[error("serialized ATN ended before {0} could be read")]
    Truncated(&'static str),

    #[error("inconsistent ATN: {0}")]
    Inconsistent(String),
}

/// Recoverable errors raised by [`crate::lexer_atn_simulator::LexerAtnSimulator::match_token`].
#[derive(Debug, Error)]
pub enum LexerError {
    /// No accept state was ever captured before the simulator reached a dead
    /// end. The input position is left exactly where `match` was entered;
    /// the host may skip a character and retry, or abort.
    #[error("no viable alternative at input index {start_index}")]
    NoViableAlt {
        start_index: usize,
        dead_end_configs: AtnConfigSet,
    },

    /// A `PrecedencePredicate` transition was encountered while building the
    /// closure of a lexer rule. Lexers never emit these; seeing one means
    /// the serialized ATN was generated for a parser rule by mistake, or is
    /// otherwise corrupt.
    #[error("precedence predicate transition encountered in lexer ATN")]
    IllegalPredicateInLexer,
}

/// Programming-error guard: raised only if the simulator attempts to mutate
/// an [`AtnConfigSet`] after it has been frozen into a `DfaState`.
#[derive(Debug, Error)]
#[error("attempted to mutate a read-only AtnConfigSet")]
pub struct ReadOnlyMutation;
