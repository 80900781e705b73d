//! Arithmetic expression evaluation in infix and postfix (RPN) notation.
//!
//! Text flows one way: [`Lexer`] → [`TokenStream`] → evaluator → `f64` or
//! [`EvalError`].
//!
//! ```
//! assert_eq!(expr_calc::infix::evaluate("2 ** 3 ** 2").unwrap(), 512.0);
//! assert_eq!(expr_calc::rpn::evaluate("2 3 + 4 *").unwrap(), 20.0);
//!
//! let err = expr_calc::infix::evaluate("3 + 4 & 10").unwrap_err();
//! assert_eq!(err.kind(), expr_calc::ErrorKind::InvalidToken);
//! assert_eq!(err.span(), Some(6..7));
//! ```

pub mod config;
pub mod error;
pub mod infix;
pub mod lex;
pub mod rpn;
pub mod stream;

pub use config::Options;
pub use error::{ErrorKind, EvalError, SpanError};
pub use lex::{Grammar, Lexer, LexerMode, Token, TokenKind};
pub use stream::TokenStream;
