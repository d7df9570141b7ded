//! Token emission contract: the plain-data `CommonToken` a generated
//! lexer's `next_token` hands back, and the factory that builds one from
//! simulator state.

use crate::char_stream::CharStream;

pub const TOKEN_EOF: i32 = -1;
pub const TOKEN_INVALID_TYPE: i32 = 0;
pub const TOKEN_DEFAULT_CHANNEL: i32 = 0;
pub const TOKEN_HIDDEN_CHANNEL: i32 = 1;
pub const TOKEN_MIN_USER_TOKEN_TYPE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonToken {
    pub token_type: i32,
    pub channel: i32,
    pub start: usize,
    pub stop: usize,
    pub line: i32,
    pub column: i32,
    pub text: String,
}

pub trait TokenFactory {
    fn create(
        &self,
        input: &dyn CharStream,
        token_type: i32,
        channel: i32,
        start: usize,
        stop: usize,
        line: i32,
        column: i32,
    ) -> CommonToken;
}

/// Default [`TokenFactory`]: text is materialized eagerly from the stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonTokenFactory;

impl TokenFactory for CommonTokenFactory {
    fn create(
        &self,
        input: &dyn CharStream,
        token_type: i32,
        channel: i32,
        start: usize,
        stop: usize,
        line: i32,
        column: i32,
    ) -> CommonToken {
        let text = if stop + 1 > start { input.get_text(start, stop) } else { String::new() };
        CommonToken { token_type, channel, start, stop, line, column, text }
    }
}
