use std::fs;
use std::ops::Add;
use std::sync::Arc;

use codemap::{CodeMap, File, Pos};
use log::debug;

use crate::meta::{LocationMeta, MetaMapper};

use self::error::{FrontendError, FrontendErrorKind};
pub use self::parser::{ast, parse_program};
use self::preprocessor::CharOffset;
pub use self::preprocessor::clean_comments;
pub use self::typechecker::{check_program, check_types, CheckResult, SymbolTable};

mod parser;
mod preprocessor;
mod typechecker;

pub mod error;


pub type CheckedProgram = ast::Program;
pub type Error = FrontendError<String>;

/// load source code of the file at path, read failures are reported as a located system error
pub fn read_source(path: &str) -> Result<String, Vec<Error>> {
    fs::read_to_string(path).map_err(|e| {
        let kind = FrontendErrorKind::SystemError { message: format!("Failed to read file {}: {}", path, e) };
        vec![FrontendError::new(kind, String::from(path))]
    })
}

/// process source code of the file given by name
pub fn process_code(file_name: &str, source_code: &str) -> Result<CheckedProgram, Vec<Error>> {
    // setup codemap for mapping byte offset to (file, line, column)
    let mut codemap = CodeMap::new();
    let codemap_file = codemap.add_file(String::from(file_name), String::from(source_code));
    let (clean_code, source_map) = clean_comments(source_code);
    debug!("{}: {} bytes after removing comments", file_name, clean_code.len());

    // perform all frontend actions
    let result = parse_program(&clean_code)
        .map(|program| {
            debug!("{}: parsed program `{}` with {} items", file_name, program.ident, program.items.len());
            program
        })
        .and_then(check_types);

    // process results, mapping errors to their locations in the source code
    match result {
        Ok(program) => Ok(program),
        Err(errors) => {
            debug!("{}: rejected with {} diagnostics", file_name, errors.len());
            let located_errors: Vec<_> = errors.iter()
                .map(|e| locate_error(e, &source_map, &codemap_file, &codemap))
                .collect();
            Err(located_errors)
        }
    }
}

/// necessary for mapping source file location
impl MetaMapper<LocationMeta, Pos> for Arc<File> {
    fn map_meta(&self, from: &LocationMeta) -> Pos {
        self.span.low().add(from.offset as u64)
    }
}

/// necessary for mapping source file location
impl MetaMapper<Pos, String> for CodeMap {
    fn map_meta(&self, from: &Pos) -> String {
        self.look_up_pos(*from).to_string()
    }
}

/// translate location from LocationMeta (byte offset in code with removed comments)
/// to its true location in the source code file, using provided MetaMappers
fn locate_error(
    e: &FrontendError<LocationMeta>, comment_offset: &CharOffset,
    file: &Arc<File>, code_map: &CodeMap,
) -> FrontendError<String> {
    e.map_meta(comment_offset)
        .map_meta(file)
        .map_meta(code_map)
}
