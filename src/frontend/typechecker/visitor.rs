use std::collections::HashSet;

use itertools::Itertools;

use crate::frontend::ast::*;
use crate::frontend::error::FrontendErrorKind;
use crate::frontend::typechecker::symbols::{DeclarationKind, FinalizeSignature};
use crate::frontend::typechecker::typechecker::{types_match, TypeChecker};
use crate::meta::LocationMeta;
use crate::util::visitor::AstVisitor;

impl<'p> AstVisitor<'p, Type> for TypeChecker<'p> {
    fn visit_expression(&mut self, expr: &'p Expression) -> Type {
        let loc = expr.get_meta();
        match &expr.item {
            ExpressionKind::LitNum { val, t } => self.check_literal(val, t, false, loc),
            ExpressionKind::LitBool { .. } => Type::Bool,
            ExpressionKind::LitAddress { .. } => Type::Address,
            ExpressionKind::Caller => {
                if self.current_variant() == Some(FunctionVariant::Finalize) {
                    let kind = FrontendErrorKind::FinalizeError {
                        message: String::from("`self.caller` is not available in a finalize block")
                    };
                    self.report(kind, loc);
                }
                Type::Address
            }
            ExpressionKind::Reference { ident } => {
                match self.get_variable(ident, loc) {
                    Ok(t) => t,
                    Err(e) => {
                        self.push_error(e);
                        Type::Error
                    }
                }
            }
            ExpressionKind::Member { expr: receiver, field } => {
                let receiver_t = self.visit_expression(receiver);
                self.check_member(&receiver_t, field, loc)
            }
            ExpressionKind::App { ident, args } => self.check_call(ident, args, loc),
            ExpressionKind::RecordLit { ident, fields } => self.check_record_literal(ident, fields, loc),
            ExpressionKind::MappingCall { op, mapping, args } => {
                self.check_mapping_call(op, mapping, args, loc)
            }
            ExpressionKind::Unary { op: UnaryOperator::Neg, arg } => {
                // negated literals are checked as a whole, `-128i8` is in range
                let arg_t = match &arg.item {
                    ExpressionKind::LitNum { val, t } => self.check_literal(val, t, true, arg.get_meta()),
                    _ => self.visit_expression(arg),
                };
                match arg_t {
                    Type::Error => Type::Error,
                    t if t.is_signed() || t == Type::Field || t == Type::Group => t,
                    t => {
                        let kind = FrontendErrorKind::ArgumentError {
                            message: format!("operator `-` cannot be applied to `{}`", t)
                        };
                        self.report(kind, loc);
                        Type::Error
                    }
                }
            }
            ExpressionKind::Unary { op: UnaryOperator::Not, arg } => {
                match self.visit_expression(arg) {
                    Type::Error => Type::Error,
                    t if t == Type::Bool || t.is_integer() => t,
                    t => {
                        let kind = FrontendErrorKind::TypeError { expected: Type::Bool, actual: t };
                        self.report(kind, arg.get_meta());
                        Type::Error
                    }
                }
            }
            ExpressionKind::Binary { left, op, right } => {
                // both sides are always checked, so errors in either are reported
                let left_t = self.visit_expression(left);
                let right_t = self.visit_expression(right);
                self.check_binary(op, left_t, right_t, right.get_meta())
            }
        }
    }

    fn visit_statement(&mut self, stmt: &'p Statement) -> Type {
        let loc = stmt.get_meta();
        match &stmt.item {
            StatementKind::Decl { ident, t, expr } => {
                let expr_t = self.visit_expression(expr);
                let declared_t = match t {
                    Some(t) => {
                        if self.check_type(t, loc) {
                            if let Err(kind) = self.check_assignment(t, &expr_t) {
                                self.report(kind, expr.get_meta());
                            }
                            t.clone()
                        } else {
                            Type::Error
                        }
                    }
                    None => expr_t,
                };
                self.declare_variable(ident, declared_t, loc);
                Type::Unit
            }
            StatementKind::Ass { ident, expr } => {
                let expr_t = self.visit_expression(expr);
                match self.local_env.get(ident).cloned() {
                    Some(var_t) => {
                        if let Err(kind) = self.check_assignment(&var_t, &expr_t) {
                            self.report(kind, expr.get_meta());
                        }
                    }
                    None => {
                        let kind = match self.get_symbols().get(ident) {
                            Some(declaration) => FrontendErrorKind::ArgumentError {
                                message: format!(
                                    "cannot assign to `{}`, it is a {}",
                                    ident,
                                    declaration.item.describe()
                                )
                            },
                            None => FrontendErrorKind::UnresolvedIdentifier { ident: ident.clone() },
                        };
                        self.report(kind, loc);
                    }
                }
                Type::Unit
            }
            StatementKind::Return { expr, finalize } => {
                let expected_t = self.get_current_function()
                    .map(|func| func.item.ret.clone())
                    .unwrap_or_default();
                let actual_t = match expr {
                    Some(expr) => self.visit_expression(expr),
                    None => Type::Unit,
                };
                if let Err(kind) = self.check_assignment(&expected_t, &actual_t) {
                    let err_loc = expr.as_ref().map(|e| e.get_meta()).unwrap_or(loc);
                    self.report(kind, err_loc);
                }
                if let Some(args) = finalize {
                    self.check_finalize_call(args, loc);
                }
                expected_t
            }
            StatementKind::Expr { expr } => {
                self.visit_expression(expr);
                Type::Unit
            }
            // already reported by the parser
            StatementKind::Error => Type::Unit,
        }
    }

    fn visit_block(&mut self, block: &'p Block) -> Type {
        // every statement is checked, the block has the type of the last one
        let mut block_t = Type::Unit;
        for stmt in block.item.stmts.iter() {
            block_t = self.visit_statement(stmt);
        }
        block_t
    }

    fn visit_function(&mut self, function: &'p Function) -> Type {
        let loc = function.get_meta();
        for arg in function.item.args.iter() {
            self.check_type(&arg.item.t, arg.get_meta());
        }
        self.check_type(&function.item.ret, loc);

        self.visit_block(&function.item.block);
        let ends_with_return = match function.item.block.item.stmts.last() {
            Some(stmt) => matches!(stmt.item, StatementKind::Return { .. }),
            None => false,
        };
        if function.item.ret != Type::Unit && !ends_with_return && self.is_declared_type(&function.item.ret) {
            let kind = FrontendErrorKind::TypeError {
                expected: function.item.ret.clone(),
                actual: Type::Unit,
            };
            self.report(kind, loc);
        }

        if let Some(finalize) = &function.item.finalize {
            self.check_finalize_linkage(function, finalize);
            let mut finalize_checker = self.with_function(finalize);
            finalize_checker.visit_function(finalize);
            self.append_errors(&mut finalize_checker.into_errors());
        }
        function.item.ret.clone()
    }
}

impl<'p> TypeChecker<'p> {
    /// integer literals have to fit their type, negation extends the signed range by one
    fn check_literal(&mut self, val: &str, t: &Type, negated: bool, loc: &LocationMeta) -> Type {
        let max = match t.integer_max() {
            Some(max) => max,
            None => return t.clone(),
        };
        let limit = if negated && t.is_signed() { max.checked_add(1) } else { Some(max) };
        let in_range = match (val.parse::<u128>(), limit) {
            (Ok(v), Some(limit)) => v <= limit,
            (Ok(_), None) => true,
            (Err(_), _) => false,
        };
        if in_range {
            t.clone()
        } else {
            let sign = if negated { "-" } else { "" };
            let kind = FrontendErrorKind::ArgumentError {
                message: format!("literal `{}{}{}` is out of range for `{}`", sign, val, t, t)
            };
            self.report(kind, loc);
            Type::Error
        }
    }

    fn check_member(&mut self, receiver_t: &Type, field: &str, loc: &LocationMeta) -> Type {
        match receiver_t {
            Type::Error => Type::Error,
            Type::Composite { ident } => {
                let field_t = self.get_symbols().get(ident)
                    .and_then(|declaration| declaration.item.get_field(field));
                match field_t {
                    Some(t) => t.clone(),
                    None => {
                        let kind = FrontendErrorKind::RecordFieldMismatch {
                            record: ident.clone(),
                            message: format!("no field named `{}`", field),
                        };
                        self.report(kind, loc);
                        Type::Error
                    }
                }
            }
            t => {
                let kind = FrontendErrorKind::ArgumentError {
                    message: format!("type `{}` has no field `{}`", t, field)
                };
                self.report(kind, loc);
                Type::Error
            }
        }
    }

    /// signature of a callable name, builtins take precedence over program functions
    fn get_callable(&mut self, ident: &str, loc: &LocationMeta) -> Option<Type> {
        if let Some(builtin) = self.get_builtin(ident) {
            return Some(builtin.clone());
        }
        let declaration = match self.resolve(ident, loc) {
            Ok(declaration) => declaration,
            Err(e) => {
                self.push_error(e);
                return None;
            }
        };
        match &declaration.item.kind {
            DeclarationKind::Function { variant: FunctionVariant::Function, args, ret } => {
                Some(Type::Function { args: args.clone(), ret: Box::new(ret.clone()) })
            }
            _ => {
                let kind = FrontendErrorKind::ArgumentError {
                    message: format!("`{}` is a {}, only functions can be called", ident, declaration.item.describe())
                };
                self.report(kind, loc);
                None
            }
        }
    }

    fn check_call(&mut self, ident: &str, args: &'p [Box<Expression>], loc: &LocationMeta) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.visit_expression(arg)).collect();
        let (expected_args, ret) = match self.get_callable(ident, loc) {
            Some(Type::Function { args, ret }) => (args, *ret),
            _ => return Type::Error,
        };
        if expected_args.len() != args.len() {
            let kind = FrontendErrorKind::ArgumentError {
                message: format!(
                    "`{}` expects {} arguments, got {}",
                    ident,
                    expected_args.len(),
                    args.len()
                )
            };
            self.report(kind, loc);
            return ret;
        }

        // arguments passed for `any` parameters must agree with each other
        let mut any_t: Option<Type> = None;
        for ((expected_t, actual_t), arg) in expected_args.iter().zip(arg_types.iter()).zip(args.iter()) {
            if *expected_t == Type::Any {
                match any_t.clone() {
                    None => {
                        if *actual_t != Type::Error {
                            any_t = Some(actual_t.clone());
                        }
                    }
                    Some(first_t) => {
                        if !types_match(&first_t, actual_t) {
                            let kind = FrontendErrorKind::TypeError { expected: first_t, actual: actual_t.clone() };
                            self.report(kind, arg.get_meta());
                        }
                    }
                }
            } else if let Err(kind) = self.check_assignment(expected_t, actual_t) {
                self.report(kind, arg.get_meta());
            }
        }
        ret
    }

    fn check_record_literal(&mut self, ident: &str, fields: &'p [FieldInit], loc: &LocationMeta) -> Type {
        let field_types: Vec<Type> = fields.iter().map(|f| self.visit_expression(&f.item.expr)).collect();
        let declaration = match self.resolve(ident, loc) {
            Ok(declaration) => declaration,
            Err(e) => {
                self.push_error(e);
                return Type::Error;
            }
        };
        let declared_fields = match &declaration.item.kind {
            DeclarationKind::Composite { fields, .. } => fields,
            _ => {
                let kind = FrontendErrorKind::ArgumentError {
                    message: format!("`{}` is a {}, not a record or struct", ident, declaration.item.describe())
                };
                self.report(kind, loc);
                return Type::Error;
            }
        };

        let mut initialized: HashSet<&str> = HashSet::new();
        for (field, actual_t) in fields.iter().zip(field_types.iter()) {
            let name = &field.item.ident;
            let message = if !initialized.insert(name.as_str()) {
                Some(format!("field `{}` is initialized more than once", name))
            } else {
                match declaration.item.get_field(name) {
                    None => Some(format!("no field named `{}`", name)),
                    Some(expected_t) if self.check_assignment(expected_t, actual_t).is_err() => Some(format!(
                        "field `{}` expects `{}`, got `{}`", name, expected_t, actual_t
                    )),
                    Some(_) => None,
                }
            };
            if let Some(message) = message {
                let kind = FrontendErrorKind::RecordFieldMismatch { record: String::from(ident), message };
                self.report(kind, field.get_meta());
            }
        }

        let missing = declared_fields.iter()
            .filter(|(name, _)| !initialized.contains(name.as_str()))
            .map(|(name, _)| format!("`{}`", name))
            .join(", ");
        if !missing.is_empty() {
            let kind = FrontendErrorKind::RecordFieldMismatch {
                record: String::from(ident),
                message: format!("missing fields {}", missing),
            };
            self.report(kind, loc);
        }
        Type::Composite { ident: String::from(ident) }
    }

    fn check_binary(&mut self, op: &BinaryOperator, left_t: Type, right_t: Type, right_loc: &LocationMeta) -> Type {
        if left_t == Type::Error || right_t == Type::Error {
            return Type::Error;
        }
        if left_t != right_t {
            let kind = FrontendErrorKind::TypeError { expected: left_t, actual: right_t };
            self.report(kind, right_loc);
            return Type::Error;
        }
        let result_t = match op {
            BinaryOperator::Equal | BinaryOperator::NotEqual => match left_t {
                Type::Mapping { .. } | Type::Unit => None,
                _ => Some(Type::Bool),
            },
            BinaryOperator::And | BinaryOperator::Or => match left_t {
                Type::Bool => Some(Type::Bool),
                _ => None,
            },
            BinaryOperator::Less
            | BinaryOperator::LessEqual
            | BinaryOperator::Greater
            | BinaryOperator::GreaterEqual => match left_t {
                Type::Field | Type::Scalar => Some(Type::Bool),
                ref t if t.is_integer() => Some(Type::Bool),
                _ => None,
            },
            BinaryOperator::Plus | BinaryOperator::Minus => match left_t {
                Type::Field | Type::Group | Type::Scalar => Some(left_t.clone()),
                ref t if t.is_integer() => Some(left_t.clone()),
                _ => None,
            },
            BinaryOperator::Times | BinaryOperator::Divide => match left_t {
                Type::Field => Some(Type::Field),
                ref t if t.is_integer() => Some(left_t.clone()),
                _ => None,
            },
        };
        match result_t {
            Some(t) => t,
            None => {
                let kind = FrontendErrorKind::ArgumentError {
                    message: format!("operator `{}` cannot be applied to `{}`", op, left_t)
                };
                self.report(kind, right_loc);
                Type::Error
            }
        }
    }

    /// `return then finalize(args..)` has to match the finalize block of the current transition
    fn check_finalize_call(&mut self, args: &'p [Box<Expression>], loc: &LocationMeta) {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.visit_expression(arg)).collect();
        let transition = match self.get_current_function() {
            Some(func) if func.item.variant == FunctionVariant::Transition => func,
            _ => {
                let kind = FrontendErrorKind::FinalizeError {
                    message: String::from("`then finalize` can only be used in a transition")
                };
                self.report(kind, loc);
                return;
            }
        };
        self.finalize_scheduled = true;
        // a duplicated transition is linked to its own finalize block, not to the registered one
        let registered = self.get_symbols().get(&transition.item.ident)
            .map_or(false, |declaration| declaration.get_meta() == transition.get_meta());
        let signature = if registered {
            self.get_symbols().get_finalize(&transition.item.ident).cloned()
        } else {
            transition.item.finalize.as_ref().map(|finalize| FinalizeSignature::of(finalize))
        };
        let signature = match signature {
            Some(signature) => signature,
            None => {
                let kind = FrontendErrorKind::FinalizeError {
                    message: format!("transition `{}` has no finalize block", transition.item.ident)
                };
                self.report(kind, loc);
                return;
            }
        };
        if signature.args.len() != args.len() {
            let kind = FrontendErrorKind::FinalizeError {
                message: format!(
                    "finalize `{}` expects {} arguments, got {}",
                    transition.item.ident,
                    signature.args.len(),
                    args.len()
                )
            };
            self.report(kind, loc);
            return;
        }
        for ((expected_t, actual_t), arg) in signature.args.iter().zip(arg_types.iter()).zip(args.iter()) {
            if let Err(kind) = self.check_assignment(expected_t, actual_t) {
                self.report(kind, arg.get_meta());
            }
        }
    }

    fn check_finalize_linkage(&mut self, function: &Function, finalize: &Function) {
        let loc = finalize.get_meta();
        if function.item.variant != FunctionVariant::Transition {
            let kind = FrontendErrorKind::FinalizeError {
                message: format!("`{}` is a {}, only transitions have a finalize block", function.item.ident, function.item.variant)
            };
            self.report(kind, loc);
            return;
        }
        if finalize.item.ident != function.item.ident {
            let kind = FrontendErrorKind::FinalizeError {
                message: format!(
                    "finalize block `{}` has to be named after its transition `{}`",
                    finalize.item.ident,
                    function.item.ident
                )
            };
            self.report(kind, loc);
        }
        if !self.finalize_scheduled {
            let kind = FrontendErrorKind::FinalizeError {
                message: format!("transition `{}` never schedules its finalize block", function.item.ident)
            };
            self.report(kind, function.get_meta());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_program;
    use crate::frontend::typechecker::symbols::SymbolTable;
    use crate::frontend::typechecker::util::get_builtins;

    /// check the only function of a program and return kinds of reported errors
    fn check_single(source: &str) -> Vec<FrontendErrorKind> {
        let program = parse_program(source).unwrap();
        let (symbols, _) = SymbolTable::build(&program);
        let builtins = get_builtins();
        let base = TypeChecker::new(&symbols, &builtins);
        let func = program.functions().next().unwrap();
        let mut checker = base.with_function(func);
        checker.visit_function(func);
        checker.into_errors().into_iter().map(|e| e.item).collect()
    }

    #[test]
    fn parameter_of_undeclared_type_is_bound_as_error() {
        let errors = check_single(r#"
        program test.aleo {
            function f(t: Missing) -> u8 {
                let b: bool = t.amount;
                return t.amount;
            }
        }
        "#);
        assert_eq!(errors, vec![FrontendErrorKind::UnresolvedIdentifier { ident: String::from("Missing") }]);
    }

    #[test]
    fn literal_ranges() {
        let errors = check_single(r#"
        program test.aleo {
            function f() {
                let a: u8 = 255u8;
                let b: i8 = -128i8;
                let c: u8 = 256u8;
                let d: i8 = 128i8;
            }
        }
        "#);
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors.iter().all(|e| matches!(e, FrontendErrorKind::ArgumentError { .. })));
    }

    #[test]
    fn record_literal_fields_must_match_exactly() {
        let errors = check_single(r#"
        program test.aleo {
            record Token { owner: address, amount: u64 }
            function f(o: address) {
                let t: Token = Token { owner: o, amount: 1u8, extra: 2u8 };
            }
        }
        "#);
        let messages: Vec<_> = errors.iter()
            .map(|e| match e {
                FrontendErrorKind::RecordFieldMismatch { record, message } => {
                    assert_eq!(record, "Token");
                    message.clone()
                }
                other => panic!("unexpected error {:?}", other),
            })
            .collect();
        assert_eq!(messages, vec![
            String::from("field `amount` expects `u64`, got `u8`"),
            String::from("no field named `extra`"),
        ]);
    }

    #[test]
    fn missing_record_fields_are_reported_once() {
        let errors = check_single(r#"
        program test.aleo {
            record Token { owner: address, amount: u64 }
            function f() -> Token {
                return Token { amount: 5u64 };
            }
        }
        "#);
        assert_eq!(errors, vec![FrontendErrorKind::RecordFieldMismatch {
            record: String::from("Token"),
            message: String::from("missing fields `owner`"),
        }]);
    }

    #[test]
    fn binary_operands_must_agree() {
        let errors = check_single(r#"
        program test.aleo {
            function f(a: u8, b: u16) -> bool {
                let c: u8 = a + b;
                let d: bool = true + false;
                return a < 3u8;
            }
        }
        "#);
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert_eq!(errors[0], FrontendErrorKind::TypeError { expected: Type::U8, actual: Type::U16 });
        assert!(matches!(errors[1], FrontendErrorKind::ArgumentError { .. }));
    }

    #[test]
    fn builtin_assertions() {
        let errors = check_single(r#"
        program test.aleo {
            function f(a: u8) {
                assert(a == 1u8);
                assert_eq(a, 2u8);
                assert_neq(a, true);
                assert(a);
            }
        }
        "#);
        assert_eq!(errors, vec![
            FrontendErrorKind::TypeError { expected: Type::U8, actual: Type::Bool },
            FrontendErrorKind::TypeError { expected: Type::Bool, actual: Type::U8 },
        ]);
    }

    #[test]
    fn local_redeclaration_and_unknown_assignment() {
        let errors = check_single(r#"
        program test.aleo {
            function f(a: u8) {
                let a = 1u8;
                b = 2u8;
            }
        }
        "#);
        assert_eq!(errors, vec![
            FrontendErrorKind::DuplicateDeclaration { ident: String::from("a") },
            FrontendErrorKind::UnresolvedIdentifier { ident: String::from("b") },
        ]);
    }

    #[test]
    fn function_calls_check_arity_and_argument_types() {
        let program = parse_program(r#"
        program test.aleo {
            function add(a: u8, b: u8) -> u8 { return a + b; }
            transition main(x: u8) -> u8 {
                let y: u8 = add(x);
                let z: u8 = add(x, true);
                return add(y, z);
            }
        }
        "#).unwrap();
        let (symbols, _) = SymbolTable::build(&program);
        let builtins = get_builtins();
        let base = TypeChecker::new(&symbols, &builtins);
        let main = program.functions().nth(1).unwrap();
        let mut checker = base.with_function(main);
        checker.visit_function(main);
        let errors: Vec<_> = checker.into_errors().into_iter().map(|e| e.item).collect();
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(matches!(errors[0], FrontendErrorKind::ArgumentError { .. }));
        assert_eq!(errors[1], FrontendErrorKind::TypeError { expected: Type::U8, actual: Type::Bool });
    }

    #[test]
    fn missing_return_in_non_unit_function() {
        let errors = check_single(r#"
        program test.aleo {
            function f(a: u8) -> u8 {
                let b = a;
            }
        }
        "#);
        assert_eq!(errors, vec![FrontendErrorKind::TypeError { expected: Type::U8, actual: Type::Unit }]);
    }
}
