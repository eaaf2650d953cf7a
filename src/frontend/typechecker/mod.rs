use log::debug;

use crate::frontend::ast::{CompositeVariant, Keyed, Program, Type};
use crate::frontend::error::{FrontendError, FrontendErrorKind};
use crate::meta::{GetLocation, LocationMeta};
use crate::util::env::Env;
use crate::util::visitor::AstVisitor;

pub use self::symbols::{Declaration, DeclarationKind, FinalizeSignature, SymbolTable};
pub use self::typechecker::{MappingRef, TypeChecker};
use self::util::get_builtins;

mod util;
mod symbols;
mod typechecker;
mod visitor;
mod mapping;

/// `Ok` only if the program produced no diagnostics at all
pub type CheckResult = Result<(), Vec<FrontendError<LocationMeta>>>;

/// main typechecker function: builds the symbol table, checks all declarations,
/// every transition, function and finalize block, and returns all diagnostics ordered by location
pub fn check_program(program: &Program) -> CheckResult {
    let builtins = get_builtins();
    let (symbols, mut errors) = SymbolTable::build(program);
    errors.append(&mut check_builtin_conflicts(program, &builtins));

    let mut checker = TypeChecker::new(&symbols, &builtins);
    check_declarations(program, &mut checker);
    for func in program.functions() {
        let mut function_checker = checker.with_function(func);
        function_checker.visit_function(func);
        checker.append_errors(&mut function_checker.into_errors());
    }
    errors.append(&mut checker.into_errors());

    // stable, so errors at the same location keep the order they were found in
    errors.sort_by_key(|e| e.get_meta().clone());
    debug!("program `{}` checked with {} diagnostics", program.ident, errors.len());
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// pipeline variant of `check_program`, gives back the program once it is accepted
pub fn check_types(program: Program) -> Result<Program, Vec<FrontendError<LocationMeta>>> {
    check_program(&program).map(|_| program)
}

/// builtin names cannot be redeclared by the program
fn check_builtin_conflicts(program: &Program, builtins: &Env<Type>) -> Vec<FrontendError<LocationMeta>> {
    program.functions()
        .filter(|func| builtins.contains_key(func.get_key()))
        .map(|func| {
            let kind = FrontendErrorKind::DuplicateDeclaration { ident: func.get_key().clone() };
            FrontendError::new(kind, func.get_location())
        })
        .collect()
}

/// types used by mappings and composites have to exist, records have to be owned
fn check_declarations(program: &Program, checker: &mut TypeChecker) {
    for mapping in program.mappings() {
        checker.check_type(&mapping.item.key, mapping.get_meta());
        checker.check_type(&mapping.item.value, mapping.get_meta());
    }
    for composite in program.composites() {
        for field in composite.item.fields.iter() {
            checker.check_type(&field.item.t, field.get_meta());
        }
        if composite.item.variant != CompositeVariant::Record {
            continue;
        }
        let owner = composite.item.fields.iter().find(|field| field.item.ident == "owner");
        let message = match owner {
            None => String::from("records have to declare an `owner: address` field"),
            Some(field) if field.item.t != Type::Address => {
                format!("field `owner` has to be an `address`, got `{}`", field.item.t)
            }
            Some(_) => continue,
        };
        let kind = FrontendErrorKind::RecordFieldMismatch { record: composite.get_key().clone(), message };
        checker.report(kind, composite.get_meta());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_program;

    const TOKEN_PROGRAM: &str = r#"
    program token.aleo {
        mapping amounts: address => u128;
        mapping tokens: address => Token;

        record Token {
            owner: address,
            amount: u64,
        }

        transition mint_public(public addr: address, public amount: u128) {
            return then finalize(addr, amount);
        }

        finalize mint_public(public addr: address, public amount: u128) {
            Mapping::set(foo, addr, amount);
            foo.set(addr, amount);
            amounts.set(1u8, amount);
            amounts.set(addr, 1u8);
        }
    }
    "#;

    fn kinds(result: CheckResult) -> Vec<FrontendErrorKind> {
        match result {
            Ok(()) => vec![],
            Err(errors) => errors.into_iter().map(|e| e.item).collect(),
        }
    }

    #[test]
    fn undeclared_mapping_and_mismatches_are_all_reported() {
        let program = parse_program(TOKEN_PROGRAM).unwrap();
        let foo = FrontendErrorKind::UnresolvedIdentifier { ident: String::from("foo") };
        assert_eq!(kinds(check_program(&program)), vec![
            foo.clone(),
            foo,
            FrontendErrorKind::KeyTypeMismatch {
                mapping: String::from("amounts"),
                expected: Type::Address,
                actual: Type::U8,
            },
            FrontendErrorKind::ValueTypeMismatch {
                mapping: String::from("amounts"),
                expected: Type::U128,
                actual: Type::U8,
            },
        ]);
    }

    #[test]
    fn checking_is_idempotent() {
        let program = parse_program(TOKEN_PROGRAM).unwrap();
        assert_eq!(check_program(&program), check_program(&program));
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let mut program = parse_program(TOKEN_PROGRAM).unwrap();
        let first = kinds(check_program(&program));
        program.items.reverse();
        assert_eq!(kinds(check_program(&program)), first);
    }

    #[test]
    fn diagnostics_are_ordered_by_location() {
        let program = parse_program(TOKEN_PROGRAM).unwrap();
        let errors = check_program(&program).unwrap_err();
        let offsets: Vec<_> = errors.iter().map(|e| e.get_meta().offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn valid_program_is_accepted() {
        let program = parse_program(r#"
        program bank.aleo {
            mapping balances: address => u64;
            record Note { owner: address, amount: u64 }

            function fee(amount: u64) -> u64 {
                return amount / 100u64;
            }

            transition deposit(public amount: u64) -> Note {
                let net: u64 = amount - fee(amount);
                assert(net > 0u64);
                return Note { owner: self.caller, amount: net } then finalize(self.caller, net);
            }

            finalize deposit(addr: address, amount: u64) {
                let current: u64 = Mapping::get_or_use(balances, addr, 0u64);
                balances.set(addr, current + amount);
            }
        }
        "#).unwrap();
        assert_eq!(check_program(&program), Ok(()));
    }

    #[test]
    fn records_must_be_owned_by_an_address() {
        let program = parse_program(r#"
        program test.aleo {
            record A { amount: u64 }
            record B { owner: u8 }
            struct C { amount: u64 }
        }
        "#).unwrap();
        let records: Vec<_> = kinds(check_program(&program)).into_iter()
            .map(|kind| match kind {
                FrontendErrorKind::RecordFieldMismatch { record, .. } => record,
                other => panic!("unexpected error {:?}", other),
            })
            .collect();
        assert_eq!(records, vec![String::from("A"), String::from("B")]);
    }

    #[test]
    fn finalize_linkage_is_checked() {
        let program = parse_program(r#"
        program test.aleo {
            transition a() { } finalize a() { }
            transition b() { return then finalize(); } finalize c() { }
            function d() { } finalize d() { }
            transition e() { return then finalize(1u8); }
        }
        "#).unwrap();
        let errors = kinds(check_program(&program));
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors.iter().all(|e| matches!(e, FrontendErrorKind::FinalizeError { .. })));
    }

    #[test]
    fn duplicated_transition_is_only_a_duplicate() {
        let program = parse_program(r#"
        program test.aleo {
            transition t(a: u8) { return then finalize(a); } finalize t(a: u8) { }
            transition t() { return then finalize(); } finalize t() { }
        }
        "#).unwrap();
        assert_eq!(kinds(check_program(&program)), vec![
            FrontendErrorKind::DuplicateDeclaration { ident: String::from("t") },
        ]);
    }

    #[test]
    fn undeclared_types_are_reported_once() {
        let program = parse_program(r#"
        program test.aleo {
            mapping m: address => Missing;
            function f(t: Missing) -> u8 { return t.amount; }
            transition g(a: address) { return then finalize(a); }
            finalize g(a: address) { m.set(a, 1u8); }
        }
        "#).unwrap();
        let missing = FrontendErrorKind::UnresolvedIdentifier { ident: String::from("Missing") };
        assert_eq!(kinds(check_program(&program)), vec![missing.clone(), missing]);
    }

    #[test]
    fn unknown_types_and_builtin_names() {
        let program = parse_program(r#"
        program test.aleo {
            mapping m: address => Missing;
            function assert(a: bool) { }
        }
        "#).unwrap();
        assert_eq!(kinds(check_program(&program)), vec![
            FrontendErrorKind::UnresolvedIdentifier { ident: String::from("Missing") },
            FrontendErrorKind::DuplicateDeclaration { ident: String::from("assert") },
        ]);
    }
}
