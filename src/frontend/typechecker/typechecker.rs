use crate::frontend::ast::{Expression, ExpressionKind, Function, FunctionVariant, Type};
use crate::frontend::error::{FrontendError, FrontendErrorKind};
use crate::frontend::typechecker::symbols::{Declaration, DeclarationKind, SymbolTable};
use crate::frontend::typechecker::util::ToTypeEnv;
use crate::meta::{LocationMeta, Meta};
use crate::util::env::{Env, UniqueEnv};

/// stands in for types naming an undeclared record or struct, those are reported once where written
static ERROR_TYPE: Type = Type::Error;

/// resolved reference to a declared mapping
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct MappingRef<'prog> {
    pub ident: &'prog str,
    pub key: &'prog Type,
    pub value: &'prog Type,
}

pub struct TypeChecker<'prog> {
    /// global declarations of the checked program
    symbols: &'prog SymbolTable,

    /// environment containing builtin functions
    builtins: &'prog Env<Type>,

    /// transition, function or finalize block currently being checked
    current_function: Option<&'prog Function>,

    /// set once the current transition executes `return then finalize(..)`
    pub finalize_scheduled: bool,

    /// maps variable identifier to its type, parameters and `let` bindings share one flat scope
    pub local_env: Env<Type>,

    /// all diagnostics found so far, checking never stops at the first one
    errors: Vec<FrontendError<LocationMeta>>,
}

impl<'p> TypeChecker<'p> {
    pub fn new(symbols: &'p SymbolTable, builtins: &'p Env<Type>) -> Self {
        Self {
            symbols,
            builtins,
            current_function: None,
            finalize_scheduled: false,
            local_env: Env::new(),
            errors: Vec::new(),
        }
    }

    /// creates TypeChecker for the same program, with environment containing arguments of the function
    pub fn with_function(&self, function: &'p Function) -> Self {
        let mut checker = Self::new(self.symbols, self.builtins);
        checker.local_env = function.to_type_env();
        for t in checker.local_env.values_mut() {
            if !self.is_declared_type(t) {
                *t = Type::Error;
            }
        }
        checker.current_function = Some(function);
        checker
    }

    pub fn get_current_function(&self) -> Option<&'p Function> {
        self.current_function
    }

    pub fn current_variant(&self) -> Option<FunctionVariant> {
        self.current_function.map(|func| func.item.variant)
    }

    pub fn get_symbols(&self) -> &'p SymbolTable {
        self.symbols
    }

    pub fn get_builtin(&self, ident: &str) -> Option<&'p Type> {
        self.builtins.get(ident)
    }

    pub fn report(&mut self, kind: FrontendErrorKind, loc: &LocationMeta) {
        self.errors.push(FrontendError::new(kind, loc.clone()));
    }

    pub fn push_error(&mut self, error: FrontendError<LocationMeta>) {
        self.errors.push(error);
    }

    pub fn append_errors(&mut self, errors: &mut Vec<FrontendError<LocationMeta>>) {
        self.errors.append(errors);
    }

    pub fn into_errors(self) -> Vec<FrontendError<LocationMeta>> {
        self.errors
    }

    /// look up a global declaration
    pub fn resolve(&self, ident: &str, loc: &LocationMeta) -> Result<&'p Declaration, FrontendError<LocationMeta>> {
        match self.symbols.get(ident) {
            Some(declaration) => Ok(declaration),
            None => {
                let kind = FrontendErrorKind::UnresolvedIdentifier { ident: String::from(ident) };
                Err(FrontendError::new(kind, loc.clone()))
            }
        }
    }

    /// resolve the target of a mapping operation, it has to name a declared mapping
    pub fn resolve_mapping(&self, expr: &Expression) -> Result<MappingRef<'p>, FrontendError<LocationMeta>> {
        let loc = expr.get_meta();
        let ident = match &expr.item {
            ExpressionKind::Reference { ident } => ident,
            other => {
                let kind = FrontendErrorKind::NotAMapping { ident: describe_expression(other) };
                return Err(FrontendError::new(kind, loc.clone()));
            }
        };
        if self.local_env.contains_key(ident) {
            let kind = FrontendErrorKind::NotAMapping { ident: ident.clone() };
            return Err(FrontendError::new(kind, loc.clone()));
        }
        let declaration = self.resolve(ident, loc)?;
        match &declaration.item.kind {
            DeclarationKind::Mapping { key, value } => Ok(MappingRef {
                ident: declaration.item.ident.as_str(),
                key: self.declared_or_error(key),
                value: self.declared_or_error(value),
            }),
            _ => {
                let kind = FrontendErrorKind::NotAMapping { ident: ident.clone() };
                Err(FrontendError::new(kind, loc.clone()))
            }
        }
    }

    /// type of a variable: locals shadow globals, a global mapping name evaluates to a mapping type
    pub fn get_variable(&self, ident: &str, loc: &LocationMeta) -> Result<Type, FrontendError<LocationMeta>> {
        if let Some(t) = self.local_env.get(ident) {
            return Ok(t.clone());
        }
        let declaration = self.resolve(ident, loc)?;
        match &declaration.item.kind {
            DeclarationKind::Mapping { key, value } => {
                Ok(Type::Mapping { key: Box::new(key.clone()), value: Box::new(value.clone()) })
            }
            _ => {
                let kind = FrontendErrorKind::ArgumentError {
                    message: format!("`{}` is a {}, not a value", ident, declaration.item.describe())
                };
                Err(FrontendError::new(kind, loc.clone()))
            }
        }
    }

    /// bind a new local variable, re-declaring an existing one is an error
    pub fn declare_variable(&mut self, ident: &str, t: Type, loc: &LocationMeta) {
        let binding = Meta::new(t, loc.clone());
        if let Err(e) = self.local_env.insert_unique(String::from(ident), binding) {
            self.errors.push(e);
        }
    }

    /// make sure every record or struct named in a type is declared
    pub fn check_type(&mut self, t: &Type, loc: &LocationMeta) -> bool {
        match t {
            Type::Composite { ident } => match self.resolve(ident, loc) {
                Ok(declaration) => match &declaration.item.kind {
                    DeclarationKind::Composite { .. } => true,
                    _ => {
                        let kind = FrontendErrorKind::ArgumentError {
                            message: format!("`{}` is a {}, not a type", ident, declaration.item.describe())
                        };
                        self.report(kind, loc);
                        false
                    }
                },
                Err(e) => {
                    self.errors.push(e);
                    false
                }
            },
            Type::Mapping { key, value } => {
                let key_ok = self.check_type(key, loc);
                self.check_type(value, loc) && key_ok
            }
            _ => true,
        }
    }

    /// like `check_type`, but silent: true if every record or struct named in the type is declared
    pub fn is_declared_type(&self, t: &Type) -> bool {
        match t {
            Type::Composite { ident } => matches!(
                self.symbols.get(ident).map(|declaration| &declaration.item.kind),
                Some(DeclarationKind::Composite { .. })
            ),
            Type::Mapping { key, value } => self.is_declared_type(key) && self.is_declared_type(value),
            _ => true,
        }
    }

    fn declared_or_error(&self, t: &'p Type) -> &'p Type {
        if self.is_declared_type(t) {
            t
        } else {
            &ERROR_TYPE
        }
    }

    /// check if value of type rvalue can be used where lvalue is expected,
    /// an lvalue naming an undeclared type accepts anything
    pub fn check_assignment(&self, lvalue: &Type, rvalue: &Type) -> Result<(), FrontendErrorKind> {
        if types_match(lvalue, rvalue) || !self.is_declared_type(lvalue) {
            Ok(())
        } else {
            Err(FrontendErrorKind::TypeError {
                expected: lvalue.clone(),
                actual: rvalue.clone(),
            })
        }
    }
}

/// equal types match, error and any types match everything to avoid cascading diagnostics
pub fn types_match(expected: &Type, actual: &Type) -> bool {
    match (expected, actual) {
        (Type::Error, _) | (_, Type::Error) | (Type::Any, _) => true,
        (expected, actual) => expected == actual,
    }
}

fn describe_expression(expr: &ExpressionKind) -> String {
    match expr {
        ExpressionKind::Reference { ident } => ident.clone(),
        ExpressionKind::Member { field, .. } => format!("<expression>.{}", field),
        ExpressionKind::App { ident, .. } => format!("{}(..)", ident),
        ExpressionKind::RecordLit { ident, .. } => format!("{} {{ .. }}", ident),
        ExpressionKind::Caller => String::from("self.caller"),
        _ => String::from("<expression>"),
    }
}
