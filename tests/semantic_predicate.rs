//! `NUM: {isEnabled()}? [0-9]+ ;` over `"42"`: a true predicate emits NUM,
//! a false one dead-ends the whole rule and raises `NoViableAlt` at index 0.

mod common;

use atnlex::{Dfa, InputStream, Lexer, LexerError, SharedContextCache, StateType, TransitionKind};
use common::{digits, AtnBuilder, RecordingActions};

const NUM: i32 = 50;

fn build() -> atnlex::Atn {
    let mut b = AtnBuilder::new();

    let token_start = b.state(StateType::TokenStart, -1);
    let num_start = b.state(StateType::RuleStart, 0);
    let pred_state = b.state(StateType::Basic, 0);
    let body = b.state(StateType::Basic, 0);
    let num_loop = b.state(StateType::Basic, 0);
    let num_stop = b.state(StateType::RuleStop, 0);

    b.edge(token_start, num_start, TransitionKind::Epsilon);
    b.edge(num_start, pred_state, TransitionKind::Epsilon);
    b.edge(pred_state, body, TransitionKind::Predicate { rule_index: 0, pred_index: 0, ctx_dependent: false });
    b.edge(body, num_loop, TransitionKind::Set(digits()));
    b.edge(num_loop, num_loop, TransitionKind::Set(digits()));
    b.edge(num_loop, num_stop, TransitionKind::Epsilon);

    b.build(vec![num_start], vec![NUM], vec![token_start], vec![])
}

#[test]
fn true_predicate_allows_the_match() {
    let atn = build();
    let dfas = vec![Dfa::new()];
    let cache = SharedContextCache::new();
    let input = InputStream::new("42");
    let mut actions = RecordingActions::default();
    actions.predicate_answer = true;
    let mut lexer = Lexer::new(&atn, &dfas, &cache, input, actions);

    let tok = lexer.next_token().unwrap();
    assert_eq!((tok.token_type, tok.text.as_str()), (NUM, "42"));
}

#[test]
fn false_predicate_dead_ends_at_start_index() {
    let atn = build();
    let dfas = vec![Dfa::new()];
    let cache = SharedContextCache::new();
    let input = InputStream::new("42");
    let actions = RecordingActions::default();
    let mut lexer = Lexer::new(&atn, &dfas, &cache, input, actions);

    match lexer.next_token() {
        Err(LexerError::NoViableAlt { start_index, .. }) => assert_eq!(start_index, 0),
        other => panic!("expected NoViableAlt, got {other:?}"),
    }
}
