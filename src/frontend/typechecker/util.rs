use std::iter::FromIterator;

use crate::frontend::ast::{Function, Type};
use crate::util::env::Env;

/// get environment containing all builtin functions
pub fn get_builtins() -> Env<Type> {
    let builtin_assert = Type::Function {
        args: vec![Type::Bool],
        ret: Box::new(Type::Unit),
    };
    // arguments passed for `Any` must all have the same type
    let builtin_assert_eq = Type::Function {
        args: vec![Type::Any, Type::Any],
        ret: Box::new(Type::Unit),
    };
    let builtin_vec: Vec<(String, Type)> = vec![
        (String::from("assert"), builtin_assert),
        (String::from("assert_eq"), builtin_assert_eq.clone()),
        (String::from("assert_neq"), builtin_assert_eq),
    ];
    Env::from_iter(builtin_vec.into_iter())
}

pub trait ToTypeEnv {
    /// convert env with complex values to only store type information
    fn to_type_env(&self) -> Env<Type>;
}

impl ToTypeEnv for Function {
    /// creates Env containing types of all function arguments
    fn to_type_env(&self) -> Env<Type> {
        // repeated argument names are reported by the symbol table, the first one is kept here
        let mut env = Env::new();
        for arg in self.item.args.iter() {
            env.entry(arg.item.ident.clone()).or_insert_with(|| arg.item.t.clone());
        }
        env
    }
}
