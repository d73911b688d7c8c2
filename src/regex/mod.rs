pub mod ast;
pub mod parser;

pub use ast::{Pattern, Token};
pub use parser::{Syntax, parse_regex, parse_with_syntax};
