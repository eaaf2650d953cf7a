use log::trace;

use crate::frontend::ast::{Expression, FunctionVariant, MappingOp, Type};
use crate::frontend::error::FrontendErrorKind;
use crate::frontend::typechecker::typechecker::{types_match, MappingRef, TypeChecker};
use crate::meta::LocationMeta;
use crate::util::visitor::AstVisitor;

/// position of an argument of a mapping operation, decides which mismatch is reported
#[derive(Debug, PartialEq, Clone, Copy)]
enum Slot {
    Key,
    Value,
}

const KEY_ONLY: &[Slot] = &[Slot::Key];
const KEY_VALUE: &[Slot] = &[Slot::Key, Slot::Value];

impl MappingOp {
    /// argument slots expected by the operation (after the mapping itself), None for unknown operations
    fn slots(&self) -> Option<&'static [Slot]> {
        match self {
            MappingOp::Get | MappingOp::Contains | MappingOp::Remove => Some(KEY_ONLY),
            MappingOp::GetOrUse | MappingOp::Set => Some(KEY_VALUE),
            MappingOp::Unknown { .. } => None,
        }
    }

    fn result_type(&self, mapping: &MappingRef) -> Type {
        match self {
            MappingOp::Get | MappingOp::GetOrUse => mapping.value.clone(),
            MappingOp::Contains => Type::Bool,
            MappingOp::Set | MappingOp::Remove => Type::Unit,
            MappingOp::Unknown { .. } => Type::Error,
        }
    }
}

impl<'p> TypeChecker<'p> {
    /// validate `Mapping::op(mapping, args..)` (or `mapping.op(args..)`):
    /// the target must resolve to a declared mapping, then keys and values must have the declared types
    pub fn check_mapping_call(
        &mut self,
        op: &MappingOp,
        mapping: &'p Expression,
        args: &'p [Box<Expression>],
        loc: &LocationMeta,
    ) -> Type {
        let arg_types: Vec<Type> = args.iter().map(|arg| self.visit_expression(arg)).collect();

        let target = match self.resolve_mapping(mapping) {
            Ok(target) => target,
            Err(e) => {
                self.push_error(e);
                return Type::Error;
            }
        };
        trace!("checking `{}` on mapping `{}`", op, target.ident);

        let slots = match op.slots() {
            Some(slots) => slots,
            None => {
                let kind = FrontendErrorKind::ArgumentError {
                    message: format!("mapping `{}` has no operation `{}`", target.ident, op)
                };
                self.report(kind, loc);
                return Type::Error;
            }
        };
        if slots.len() != args.len() {
            let kind = FrontendErrorKind::ArgumentError {
                message: format!("`{}` expects {} arguments, got {}", op, slots.len() + 1, args.len() + 1)
            };
            self.report(kind, loc);
        } else {
            for ((slot, actual_t), arg) in slots.iter().zip(arg_types.iter()).zip(args.iter()) {
                let mapping = String::from(target.ident);
                let kind = match slot {
                    Slot::Key if !types_match(target.key, actual_t) => FrontendErrorKind::KeyTypeMismatch {
                        mapping,
                        expected: target.key.clone(),
                        actual: actual_t.clone(),
                    },
                    Slot::Value if !types_match(target.value, actual_t) => FrontendErrorKind::ValueTypeMismatch {
                        mapping,
                        expected: target.value.clone(),
                        actual: actual_t.clone(),
                    },
                    _ => continue,
                };
                self.report(kind, arg.get_meta());
            }
        }

        if self.current_variant() != Some(FunctionVariant::Finalize) {
            let kind = FrontendErrorKind::FinalizeError {
                message: format!("`{}` on mapping `{}` is only allowed in a finalize block", op, target.ident)
            };
            self.report(kind, loc);
        }
        op.result_type(&target)
    }
}
