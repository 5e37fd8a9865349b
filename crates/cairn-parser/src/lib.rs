//! Lexer and recursive-descent parser for the Cairn contract language.
//!
//! The parser is the checker's external collaborator: it turns source text
//! into a `cairn_ast::Program` whose nodes carry stable ids and byte-offset
//! spans. It does no semantic validation beyond syntax; everything type- or
//! resource-related is the checker's job.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::ParseError;
pub use parser::ParserState;

use cairn_ast::Program;

/// Parse a complete program from source text.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = lexer::Lexer::new(source).tokenize()?;
    ParserState::new(source, tokens).parse_program()
}
