use crate::{
    error::EvalError,
    lex::{Lexer, Token},
};

/// A [`Lexer`] with room for exactly one pushed-back token.
pub struct TokenStream<'de> {
    lexer: Lexer<'de>,
    pushed_back: Option<Token<'de>>,
}

impl<'de> TokenStream<'de> {
    pub fn new(lexer: Lexer<'de>) -> Self {
        TokenStream {
            lexer,
            pushed_back: None,
        }
    }

    pub fn whole(&self) -> &'de str {
        self.lexer.whole()
    }

    /// Returns `token` to the front of the stream.
    ///
    /// The grammar never needs more than one token of lookahead, so a second
    /// pushback before the first is consumed is rejected.
    pub fn pushback(&mut self, token: Token<'de>) -> Result<(), EvalError> {
        if let Some(buffered) = &self.pushed_back {
            return Err(EvalError::pushback_occupied(self.whole(), buffered));
        }
        self.pushed_back = Some(token);
        Ok(())
    }
}

impl<'de> Iterator for TokenStream<'de> {
    type Item = Result<Token<'de>, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pushed_back.take() {
            return Some(Ok(token));
        }
        self.lexer.next()
    }
}
