//! `STRING_OPEN: '"' -> pushMode(STR) ;` in the default mode, and
//! `STR_CHAR: ~["] ; STRING_CLOSE: '"' -> popMode ;` in mode `STR`, over
//! `"\"ab\""`. The mode stack must be back at the default mode at EOF.

mod common;

use atnlex::{Dfa, InputStream, Lexer, LexerAction, SharedContextCache, StateType, TransitionKind};
use common::{single, AtnBuilder, RecordingActions};

const STRING_OPEN: i32 = 40;
const STR_CHAR: i32 = 41;
const STRING_CLOSE: i32 = 42;
const STR_MODE: i32 = 1;

fn build() -> atnlex::Atn {
    let mut b = AtnBuilder::new();
    let quote = || single('"');

    let default_start = b.state(StateType::TokenStart, -1);
    let open_start = b.state(StateType::RuleStart, 0);
    let open_lit = b.state(StateType::Basic, 0);
    let open_action = b.state(StateType::Basic, 0);
    let open_stop = b.state(StateType::RuleStop, 0);

    let str_mode_start = b.state(StateType::TokenStart, -1);
    let char_start = b.state(StateType::RuleStart, 1);
    let char_body = b.state(StateType::Basic, 1);
    let char_stop = b.state(StateType::RuleStop, 1);
    let close_start = b.state(StateType::RuleStart, 2);
    let close_lit = b.state(StateType::Basic, 2);
    let close_action = b.state(StateType::Basic, 2);
    let close_stop = b.state(StateType::RuleStop, 2);

    b.edge(default_start, open_start, TransitionKind::Epsilon);
    b.edge(open_start, open_lit, TransitionKind::Epsilon);
    b.edge(open_lit, open_action, TransitionKind::Set(quote()));
    b.edge(open_action, open_stop, TransitionKind::Action { rule_index: 0, action_index: 0, ctx_dependent: false });

    b.edge(str_mode_start, char_start, TransitionKind::Epsilon);
    b.edge(str_mode_start, close_start, TransitionKind::Epsilon);

    b.edge(char_start, char_body, TransitionKind::Epsilon);
    b.edge(char_body, char_stop, TransitionKind::NotSet(quote()));

    b.edge(close_start, close_lit, TransitionKind::Epsilon);
    b.edge(close_lit, close_action, TransitionKind::Set(quote()));
    b.edge(close_action, close_stop, TransitionKind::Action { rule_index: 2, action_index: 1, ctx_dependent: false });

    b.build(
        vec![open_start, char_start, close_start],
        vec![STRING_OPEN, STR_CHAR, STRING_CLOSE],
        vec![default_start, str_mode_start],
        vec![LexerAction::PushMode(STR_MODE), LexerAction::PopMode],
    )
}

#[test]
fn pushes_and_pops_mode_across_a_quoted_string() {
    let atn = build();
    let dfas = vec![Dfa::new(), Dfa::new()];
    let cache = SharedContextCache::new();
    let input = InputStream::new("\"ab\"");
    let mut lexer = Lexer::new(&atn, &dfas, &cache, input, RecordingActions::default());

    let open = lexer.next_token().unwrap();
    assert_eq!((open.token_type, open.text.as_str()), (STRING_OPEN, "\""));
    assert_eq!(lexer.mode(), STR_MODE as usize);

    let a = lexer.next_token().unwrap();
    assert_eq!((a.token_type, a.text.as_str()), (STR_CHAR, "a"));

    let b = lexer.next_token().unwrap();
    assert_eq!((b.token_type, b.text.as_str()), (STR_CHAR, "b"));

    let close = lexer.next_token().unwrap();
    assert_eq!((close.token_type, close.text.as_str()), (STRING_CLOSE, "\""));
    assert_eq!(lexer.mode(), 0, "mode stack must unwind back to the default mode");

    let eof = lexer.next_token().unwrap();
    assert_eq!(eof.token_type, atnlex::token::TOKEN_EOF);
}
