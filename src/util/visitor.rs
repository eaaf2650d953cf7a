use crate::frontend::ast::{Block, Expression, Function, Statement};

/// visitor over ast items that live at least as long as 'ast
pub trait AstVisitor<'ast, ResultT> {
    fn visit_expression(&mut self, expr: &'ast Expression) -> ResultT;
    fn visit_statement(&mut self, stmt: &'ast Statement) -> ResultT;
    fn visit_block(&mut self, block: &'ast Block) -> ResultT;
    fn visit_function(&mut self, function: &'ast Function) -> ResultT;
}
