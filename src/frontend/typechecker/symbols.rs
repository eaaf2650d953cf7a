use log::trace;

use crate::frontend::ast::{
    Arg, Composite, CompositeVariant, Field, Function, FunctionVariant, Keyed, Mapping, Program,
    TopDefKind, Type,
};
use crate::frontend::error::FrontendError;
use crate::meta::{LocationMeta, Meta};
use crate::util::env::{Env, FromKeyedVec, UniqueEnv};

#[derive(Debug, PartialEq, Clone)]
pub enum DeclarationKind {
    Mapping { key: Type, value: Type },
    Composite { variant: CompositeVariant, fields: Vec<(String, Type)> },
    Function { variant: FunctionVariant, args: Vec<Type>, ret: Type },
}

/// named entity declared at program scope
#[derive(Debug, PartialEq, Clone)]
pub struct DeclarationItem {
    pub ident: String,
    pub kind: DeclarationKind,
}

pub type Declaration = Meta<DeclarationItem, LocationMeta>;

impl Keyed for DeclarationItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

impl DeclarationItem {
    /// human readable category, used in error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            DeclarationKind::Mapping { .. } => String::from("mapping"),
            DeclarationKind::Composite { variant, .. } => variant.to_string(),
            DeclarationKind::Function { variant, .. } => variant.to_string(),
        }
    }

    /// type of the field named `ident`, if this is a record or struct declaring it
    pub fn get_field(&self, ident: &str) -> Option<&Type> {
        match &self.kind {
            DeclarationKind::Composite { fields, .. } => {
                fields.iter().find(|(name, _)| name == ident).map(|(_, t)| t)
            }
            _ => None,
        }
    }
}

/// signature of a finalize block, keyed by the name of the transition it continues
#[derive(Debug, PartialEq, Clone)]
pub struct FinalizeSignature {
    pub args: Vec<Type>,
    pub ret: Type,
}

impl FinalizeSignature {
    pub fn of(finalize: &Function) -> Self {
        Self {
            args: finalize.item.arg_types(),
            ret: finalize.item.ret.clone(),
        }
    }
}

/// all global declarations of a single program, built once before any resolution happens
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SymbolTable {
    globals: Env<Declaration>,
    finalizers: Env<FinalizeSignature>,
}

impl SymbolTable {
    /// register every top-level declaration, reporting duplicates (the first declaration is kept)
    pub fn build(program: &Program) -> (Self, Vec<FrontendError<LocationMeta>>) {
        let mut table = Self::default();
        let mut errors = Vec::new();
        for item in program.items.iter() {
            match &item.item {
                TopDefKind::Mapping { mapping } => {
                    table.register(declare_mapping(mapping), &mut errors);
                }
                TopDefKind::Composite { composite } => {
                    let (_, mut field_errors) = Env::<Field>::from_vec(&composite.item.fields[..]);
                    errors.append(&mut field_errors);
                    table.register(declare_composite(composite), &mut errors);
                }
                TopDefKind::Function { func } => {
                    errors.append(&mut check_unique_args(&func.item.args));
                    let registered = table.register(declare_function(func), &mut errors);
                    if let Some(finalize) = &func.item.finalize {
                        errors.append(&mut check_unique_args(&finalize.item.args));
                        // a duplicated transition must not replace the finalize block of the first one
                        if registered {
                            table.finalizers.insert(func.get_key().clone(), FinalizeSignature::of(finalize));
                        }
                    }
                }
                TopDefKind::Error => (),
            }
        }
        trace!("symbol table of `{}` holds {} declarations", program.ident, table.globals.len());
        (table, errors)
    }

    /// false if the name was already taken
    fn register(&mut self, declaration: Declaration, errors: &mut Vec<FrontendError<LocationMeta>>) -> bool {
        let key = declaration.get_key().clone();
        match self.globals.insert_unique(key, declaration) {
            Ok(()) => true,
            Err(e) => {
                errors.push(e);
                false
            }
        }
    }

    pub fn get(&self, ident: &str) -> Option<&Declaration> {
        self.globals.get(ident)
    }

    /// signature of the finalize block attached to the given transition
    pub fn get_finalize(&self, transition: &str) -> Option<&FinalizeSignature> {
        self.finalizers.get(transition)
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}

fn check_unique_args(args: &[Arg]) -> Vec<FrontendError<LocationMeta>> {
    let (_, errors) = Env::<Arg>::from_vec(args);
    errors
}

fn declare_mapping(mapping: &Mapping) -> Declaration {
    let kind = DeclarationKind::Mapping {
        key: mapping.item.key.clone(),
        value: mapping.item.value.clone(),
    };
    let item = DeclarationItem { ident: mapping.item.ident.clone(), kind };
    Declaration::new(item, mapping.get_meta().clone())
}

fn declare_composite(composite: &Composite) -> Declaration {
    let fields = composite.item.fields.iter()
        .map(|field| (field.item.ident.clone(), field.item.t.clone()))
        .collect();
    let kind = DeclarationKind::Composite { variant: composite.item.variant, fields };
    let item = DeclarationItem { ident: composite.item.ident.clone(), kind };
    Declaration::new(item, composite.get_meta().clone())
}

fn declare_function(func: &Function) -> Declaration {
    let kind = DeclarationKind::Function {
        variant: func.item.variant,
        args: func.item.arg_types(),
        ret: func.item.ret.clone(),
    };
    let item = DeclarationItem { ident: func.item.ident.clone(), kind };
    Declaration::new(item, func.get_meta().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::error::FrontendErrorKind;
    use crate::frontend::parse_program;

    #[test]
    fn registers_all_declaration_categories() {
        let program = parse_program(r#"
        program test.aleo {
            mapping amounts: address => u128;
            record Token { owner: address, amount: u64 }
            transition t(a: u8) -> u8 { return a; } finalize t() { }
            function helper() { }
        }
        "#).unwrap();
        let (table, errors) = SymbolTable::build(&program);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.get("amounts").map(|d| d.item.kind.clone()),
            Some(DeclarationKind::Mapping { key: Type::Address, value: Type::U128 })
        );
        assert_eq!(table.get("Token").and_then(|d| d.item.get_field("amount")), Some(&Type::U64));
        assert_eq!(table.get_finalize("t").map(|f| f.args.len()), Some(0));
        assert!(table.get_finalize("helper").is_none());
    }

    #[test]
    fn duplicate_across_categories_keeps_first() {
        let program = parse_program(r#"
        program test.aleo {
            mapping balances: address => u64;
            struct balances { a: u8 }
            function balances() { }
        }
        "#).unwrap();
        let (table, errors) = SymbolTable::build(&program);
        assert_eq!(errors.len(), 2);
        for e in errors.iter() {
            assert_eq!(e.item, FrontendErrorKind::DuplicateDeclaration { ident: String::from("balances") });
        }
        assert_eq!(table.get("balances").map(|d| d.item.describe()), Some(String::from("mapping")));
    }

    #[test]
    fn duplicate_transition_keeps_first_finalize_block() {
        let program = parse_program(r#"
        program test.aleo {
            transition t(a: u8) { return then finalize(a); } finalize t(a: u8) { }
            transition t() { return then finalize(); } finalize t() { }
        }
        "#).unwrap();
        let (table, errors) = SymbolTable::build(&program);
        assert_eq!(
            errors.into_iter().map(|e| e.item).collect::<Vec<_>>(),
            vec![FrontendErrorKind::DuplicateDeclaration { ident: String::from("t") }]
        );
        assert_eq!(table.get_finalize("t").map(|f| f.args.clone()), Some(vec![Type::U8]));
    }

    #[test]
    fn duplicate_fields_and_args_are_reported() {
        let program = parse_program(r#"
        program test.aleo {
            struct Pair { a: u8, a: u16 }
            function f(x: u8, x: u8) { }
        }
        "#).unwrap();
        let (_, errors) = SymbolTable::build(&program);
        let idents: Vec<_> = errors.iter()
            .map(|e| match &e.item {
                FrontendErrorKind::DuplicateDeclaration { ident } => ident.clone(),
                other => panic!("unexpected error {:?}", other),
            })
            .collect();
        assert_eq!(idents, vec![String::from("a"), String::from("x")]);
    }
}
