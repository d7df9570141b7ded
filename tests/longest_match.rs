//! Two rules sharing a prefix: the longer match always wins, and a tie at
//! equal length falls back to declaration order (lowest alt number).

mod common;

use atnlex::{Dfa, InputStream, Lexer, SharedContextCache, StateType, TransitionKind};
use common::{digits, letters, single, AtnBuilder, RecordingActions};

const INT: i32 = 10;
const FLOAT: i32 = 11;

/// `INT: [0-9]+ ; FLOAT: [0-9]+ '.' [0-9]+ ;` over `"12.34"`.
fn build_int_float() -> atnlex::Atn {
    let mut b = AtnBuilder::new();

    let token_start = b.state(StateType::TokenStart, -1);

    let int_start = b.state(StateType::RuleStart, 0);
    let int_body = b.state(StateType::Basic, 0);
    let int_loop = b.state(StateType::Basic, 0);
    let int_stop = b.state(StateType::RuleStop, 0);

    let float_start = b.state(StateType::RuleStart, 1);
    let float_body = b.state(StateType::Basic, 1);
    let float_loop1 = b.state(StateType::Basic, 1);
    let float_dot = b.state(StateType::Basic, 1);
    let float_loop2 = b.state(StateType::Basic, 1);
    let float_stop = b.state(StateType::RuleStop, 1);

    b.edge(token_start, int_start, TransitionKind::Epsilon);
    b.edge(token_start, float_start, TransitionKind::Epsilon);

    b.edge(int_start, int_body, TransitionKind::Epsilon);
    b.edge(int_body, int_loop, TransitionKind::Set(digits()));
    b.edge(int_loop, int_loop, TransitionKind::Set(digits()));
    b.edge(int_loop, int_stop, TransitionKind::Epsilon);

    b.edge(float_start, float_body, TransitionKind::Epsilon);
    b.edge(float_body, float_loop1, TransitionKind::Set(digits()));
    b.edge(float_loop1, float_loop1, TransitionKind::Set(digits()));
    b.edge(float_loop1, float_dot, TransitionKind::Set(single('.')));
    b.edge(float_dot, float_loop2, TransitionKind::Set(digits()));
    b.edge(float_loop2, float_loop2, TransitionKind::Set(digits()));
    b.edge(float_loop2, float_stop, TransitionKind::Epsilon);

    b.build(vec![int_start, float_start], vec![INT, FLOAT], vec![token_start], vec![])
}

#[test]
fn float_wins_over_int_prefix() {
    let atn = build_int_float();
    let dfas = vec![Dfa::new()];
    let cache = SharedContextCache::new();
    let input = InputStream::new("12.34");
    let mut lexer = Lexer::new(&atn, &dfas, &cache, input, RecordingActions::default());

    let tok = lexer.next_token().unwrap();
    assert_eq!((tok.token_type, tok.text.as_str()), (FLOAT, "12.34"));

    let eof = lexer.next_token().unwrap();
    assert_eq!(eof.token_type, atnlex::token::TOKEN_EOF);
}

const A: i32 = 20;
const ID: i32 = 21;

/// `A: 'if' ; ID: [a-z]+ ;` over `"iffy"`.
fn build_keyword_vs_id() -> atnlex::Atn {
    let mut b = AtnBuilder::new();

    let token_start = b.state(StateType::TokenStart, -1);

    let a_start = b.state(StateType::RuleStart, 0);
    let a_i = b.state(StateType::Basic, 0);
    let a_f = b.state(StateType::Basic, 0);
    let a_stop = b.state(StateType::RuleStop, 0);

    let id_start = b.state(StateType::RuleStart, 1);
    let id_body = b.state(StateType::Basic, 1);
    let id_loop = b.state(StateType::Basic, 1);
    let id_stop = b.state(StateType::RuleStop, 1);

    b.edge(token_start, a_start, TransitionKind::Epsilon);
    b.edge(token_start, id_start, TransitionKind::Epsilon);

    b.edge(a_start, a_i, TransitionKind::Epsilon);
    b.edge(a_i, a_f, TransitionKind::Set(single('i')));
    b.edge(a_f, a_stop, TransitionKind::Set(single('f')));

    b.edge(id_start, id_body, TransitionKind::Epsilon);
    b.edge(id_body, id_loop, TransitionKind::Set(letters()));
    b.edge(id_loop, id_loop, TransitionKind::Set(letters()));
    b.edge(id_loop, id_stop, TransitionKind::Epsilon);

    b.build(vec![a_start, id_start], vec![A, ID], vec![token_start], vec![])
}

#[test]
fn id_wins_over_keyword_prefix_on_longer_match() {
    let atn = build_keyword_vs_id();
    let dfas = vec![Dfa::new()];
    let cache = SharedContextCache::new();
    let input = InputStream::new("iffy");
    let mut lexer = Lexer::new(&atn, &dfas, &cache, input, RecordingActions::default());

    let tok = lexer.next_token().unwrap();
    assert_eq!((tok.token_type, tok.text.as_str()), (ID, "iffy"));

    let eof = lexer.next_token().unwrap();
    assert_eq!(eof.token_type, atnlex::token::TOKEN_EOF);
}

#[test]
fn keyword_wins_tie_at_equal_length() {
    let atn = build_keyword_vs_id();
    let dfas = vec![Dfa::new()];
    let cache = SharedContextCache::new();
    let input = InputStream::new("if");
    let mut lexer = Lexer::new(&atn, &dfas, &cache, input, RecordingActions::default());

    let tok = lexer.next_token().unwrap();
    assert_eq!((tok.token_type, tok.text.as_str()), (A, "if"));
}
