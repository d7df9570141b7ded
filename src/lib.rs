//! `atnlex`: an ANTLR-style adaptive lexer runtime core.
//!
//! Given a serialized ATN produced ahead of time by a parser generator,
//! this crate turns a stream of Unicode code points into a stream of
//! tokens. It implements the on-the-fly NFA-to-DFA lexer simulation
//! (lazily-constructed per-mode DFAs with ATN fallback, a shared
//! graph-structured stack for rule-call contexts, position-dependent
//! action deferral, and longest-match/first-rule-wins arbitration), plus
//! the ambient stream/token/vocabulary/error scaffolding a generated
//! lexer needs to be usable standalone.
//!
//! A generated lexer supplies only a deserialized [`atn::Atn`], a
//! semantic-predicate/action callback via [`lexer::LexerActions`], and an
//! input stream; everything else — matching, mode/channel bookkeeping,
//! DFA caching — lives here.

pub mod atn;
pub mod atn_config;
pub mod atn_config_set;
pub mod char_stream;
pub mod dfa;
pub mod errors;
pub mod interval_set;
pub mod lexer;
pub mod lexer_action;
pub mod lexer_atn_simulator;
pub mod prediction_context;
pub mod token;
pub mod vocabulary;

pub use atn::{Atn, AtnDeserializer, AtnState, StateType, Transition, TransitionKind};
pub use atn_config::LexerAtnConfig;
pub use atn_config_set::AtnConfigSet;
pub use char_stream::{CharStream, InputStream};
pub use dfa::Dfa;
pub use errors::{AtnError, LexerError, ReadOnlyMutation};
pub use interval_set::{Interval, IntervalSet};
pub use lexer::{Lexer, LexerActions};
pub use lexer_action::{LexerAction, LexerActionExecutor, LexerActionHost};
pub use lexer_atn_simulator::{LexerAtnSimulator, LexerHost};
pub use prediction_context::{PredictionContext, SharedContextCache};
pub use token::{CommonToken, CommonTokenFactory, TokenFactory};
pub use vocabulary::{Vocabulary, VocabularyImpl};
