use lalrpop_util::lalrpop_mod;

use crate::frontend::error::FrontendError;
use crate::meta::LocationMeta;

use self::ast::Program;
use self::leo::ProgramParser;

lalrpop_mod!(#[allow(clippy::all, unused_parens)] leo, "/frontend/parser/leo.rs");

pub mod ast;


pub type ParsedProgram = Program;
pub type ParserErrors = Vec<FrontendError<LocationMeta>>;


pub fn parse_program(source_code: &str) -> Result<ParsedProgram, ParserErrors> {
    let mut errors = Vec::new();
    let parser = ProgramParser::new();
    match parser.parse(&mut errors, source_code) {
        Ok(program) => {
            if errors.is_empty() {
                Ok(program)
            } else {
                Err(errors)
            }
        }
        Err(e) => {
            errors.push(FrontendError::from(e));
            Err(errors)
        }
    }
}
