use std::fmt;

use itertools::Itertools;

use crate::meta::{LocationMeta, Meta};

/// trait for marking ast items that can searched by key (in an environment)
pub trait Keyed {
    fn get_key(&self) -> &String;
}

/// alias for all metadata containers attached to ast items
pub type AstItem<ItemT> = Meta<ItemT, LocationMeta>;

impl<ItemT: Keyed, MetaT> Keyed for Meta<ItemT, MetaT> {
    /// if item is keyed, the whole wrapper can also be keyed using same key
    fn get_key(&self) -> &String {
        self.item.get_key()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Times,
    Divide,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Times => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum UnaryOperator {
    Neg,
    Not,
}

/// built-in operations available on mappings, both in `Mapping::op(m, ..)` and `m.op(..)` form
#[derive(Debug, PartialEq, Clone)]
pub enum MappingOp {
    Get,
    GetOrUse,
    Set,
    Contains,
    Remove,
    Unknown { name: String },
}

impl From<String> for MappingOp {
    fn from(name: String) -> Self {
        match name.as_str() {
            "get" => MappingOp::Get,
            "get_or_use" => MappingOp::GetOrUse,
            "set" => MappingOp::Set,
            "contains" => MappingOp::Contains,
            "remove" => MappingOp::Remove,
            _ => MappingOp::Unknown { name },
        }
    }
}

impl fmt::Display for MappingOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MappingOp::Get => write!(f, "get"),
            MappingOp::GetOrUse => write!(f, "get_or_use"),
            MappingOp::Set => write!(f, "set"),
            MappingOp::Contains => write!(f, "contains"),
            MappingOp::Remove => write!(f, "remove"),
            MappingOp::Unknown { name } => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldInitItem {
    pub ident: String,
    pub expr: Box<Expression>,
}

pub type FieldInit = AstItem<FieldInitItem>;

impl Keyed for FieldInitItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExpressionKind {
    /// numeric literal, `val` holds the digits and `t` the type given by the suffix
    LitNum { val: String, t: Type },
    LitBool { val: bool },
    LitAddress { val: String },
    /// `self.caller`
    Caller,
    Reference { ident: String },
    Member { expr: Box<Expression>, field: String },
    App { ident: String, args: Vec<Box<Expression>> },
    RecordLit { ident: String, fields: Vec<FieldInit> },
    /// canonical form of both `Mapping::op(mapping, args..)` and `mapping.op(args..)`
    MappingCall { op: MappingOp, mapping: Box<Expression>, args: Vec<Box<Expression>> },
    Unary { op: UnaryOperator, arg: Box<Expression> },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
}

pub type Expression = AstItem<ExpressionKind>;

impl ExpressionKind {
    /// split literal like `100u8` or `1_000field` into its digits and suffix type
    pub fn numeric(literal: &str) -> Self {
        let split = literal
            .find(|c: char| !(c.is_ascii_digit() || c == '_'))
            .unwrap_or_else(|| literal.len());
        let (digits, suffix) = literal.split_at(split);
        let t = Type::from_keyword(suffix).unwrap_or(Type::Error);
        ExpressionKind::LitNum { val: digits.replace('_', ""), t }
    }
}

impl Expression {
    /// binary expressions are located at the beginning of their left operand
    pub fn binary(left: Box<Expression>, op: BinaryOperator, right: Box<Expression>) -> Box<Self> {
        let location = left.get_meta().clone();
        Box::new(Expression::new(ExpressionKind::Binary { left, op, right }, location))
    }

    /// member access and method calls are located at the beginning of their receiver
    pub fn postfix(receiver: Box<Expression>, field: String, args: Option<Vec<Box<Expression>>>) -> Box<Self> {
        let location = receiver.get_meta().clone();
        let kind = match args {
            Some(args) => ExpressionKind::MappingCall { op: MappingOp::from(field), mapping: receiver, args },
            None => ExpressionKind::Member { expr: receiver, field },
        };
        Box::new(Expression::new(kind, location))
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Type {
    /// primitive types
    Address,
    Bool,
    Field,
    Group,
    Scalar,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,

    /// records and structs
    Composite { ident: String },

    /// type of a mapping name used as a value
    Mapping { key: Box<Type>, value: Box<Type> },

    /// used for checking types during function call
    Function { args: Vec<Type>, ret: Box<Type> },

    /// type of statements and functions without a return value
    Unit,

    /// accepts any type, used for parameters of builtins like `assert_eq`
    Any,

    /// error type for smooth propagation of errors during type checking
    Error,
}

impl Default for Type {
    fn default() -> Self {
        Type::Unit
    }
}

impl Type {
    /// primitive type named by a keyword (also used for literal suffixes)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let t = match keyword {
            "address" => Type::Address,
            "bool" => Type::Bool,
            "field" => Type::Field,
            "group" => Type::Group,
            "scalar" => Type::Scalar,
            "u8" => Type::U8,
            "u16" => Type::U16,
            "u32" => Type::U32,
            "u64" => Type::U64,
            "u128" => Type::U128,
            "i8" => Type::I8,
            "i16" => Type::I16,
            "i32" => Type::I32,
            "i64" => Type::I64,
            "i128" => Type::I128,
            _ => return None,
        };
        Some(t)
    }

    pub fn is_integer(&self) -> bool {
        self.integer_max().is_some()
    }

    pub fn is_signed(&self) -> bool {
        match self {
            Type::I8 | Type::I16 | Type::I32 | Type::I64 | Type::I128 => true,
            _ => false,
        }
    }

    /// largest positive value of an integer type
    pub fn integer_max(&self) -> Option<u128> {
        let max = match self {
            Type::U8 => u8::MAX as u128,
            Type::U16 => u16::MAX as u128,
            Type::U32 => u32::MAX as u128,
            Type::U64 => u64::MAX as u128,
            Type::U128 => u128::MAX,
            Type::I8 => i8::MAX as u128,
            Type::I16 => i16::MAX as u128,
            Type::I32 => i32::MAX as u128,
            Type::I64 => i64::MAX as u128,
            Type::I128 => i128::MAX as u128,
            _ => return None,
        };
        Some(max)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Address => write!(f, "address"),
            Type::Bool => write!(f, "bool"),
            Type::Field => write!(f, "field"),
            Type::Group => write!(f, "group"),
            Type::Scalar => write!(f, "scalar"),
            Type::U8 => write!(f, "u8"),
            Type::U16 => write!(f, "u16"),
            Type::U32 => write!(f, "u32"),
            Type::U64 => write!(f, "u64"),
            Type::U128 => write!(f, "u128"),
            Type::I8 => write!(f, "i8"),
            Type::I16 => write!(f, "i16"),
            Type::I32 => write!(f, "i32"),
            Type::I64 => write!(f, "i64"),
            Type::I128 => write!(f, "i128"),
            Type::Composite { ident } => write!(f, "{}", ident),
            Type::Mapping { key, value } => write!(f, "mapping {} => {}", key, value),
            Type::Function { args, ret } => {
                write!(f, "fn({}) -> {}", args.iter().join(", "), ret)
            }
            Type::Unit => write!(f, "()"),
            Type::Any => write!(f, "any"),
            Type::Error => write!(f, "<error>"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct BlockItem {
    pub stmts: Vec<Box<Statement>>
}

pub type Block = AstItem<BlockItem>;

#[derive(Debug, PartialEq, Clone)]
pub enum StatementKind {
    Decl { ident: String, t: Option<Type>, expr: Box<Expression> },
    Ass { ident: String, expr: Box<Expression> },
    /// `return [expr] [then finalize(args..)];`
    Return { expr: Option<Box<Expression>>, finalize: Option<Vec<Box<Expression>>> },
    Expr { expr: Box<Expression> },
    Error,
}

pub type Statement = AstItem<StatementKind>;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Mode {
    Public,
    Private,
    Constant,
    Default,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ArgItem { pub mode: Mode, pub ident: String, pub t: Type }

pub type Arg = AstItem<ArgItem>;

impl Keyed for ArgItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FunctionVariant {
    Transition,
    Function,
    Finalize,
}

impl fmt::Display for FunctionVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FunctionVariant::Transition => write!(f, "transition"),
            FunctionVariant::Function => write!(f, "function"),
            FunctionVariant::Finalize => write!(f, "finalize"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionItem {
    pub variant: FunctionVariant,
    pub ident: String,
    pub args: Vec<Arg>,
    pub ret: Type,
    pub block: Block,
    /// finalize block following a transition
    pub finalize: Option<Box<Function>>,
}

pub type Function = AstItem<FunctionItem>;

impl FunctionItem {
    pub fn new(variant: FunctionVariant, ident: String, args: Vec<Arg>, ret: Option<Type>, block: Block) -> Self {
        Self { variant, ident, args, ret: ret.unwrap_or_default(), block, finalize: None }
    }

    pub fn with_finalize(mut self, finalize: Option<Function>) -> Self {
        self.finalize = finalize.map(Box::new);
        self
    }

    pub fn arg_types(&self) -> Vec<Type> {
        self.args.iter().map(|arg| arg.item.t.clone()).collect()
    }
}

impl Keyed for FunctionItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldItem {
    pub mode: Mode,
    pub ident: String,
    pub t: Type,
}

pub type Field = AstItem<FieldItem>;

impl Keyed for FieldItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompositeVariant {
    Record,
    Struct,
}

impl fmt::Display for CompositeVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompositeVariant::Record => write!(f, "record"),
            CompositeVariant::Struct => write!(f, "struct"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CompositeItem {
    pub variant: CompositeVariant,
    pub ident: String,
    pub fields: Vec<Field>,
}

pub type Composite = AstItem<CompositeItem>;

impl Keyed for CompositeItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MappingItem {
    pub ident: String,
    pub key: Type,
    pub value: Type,
}

pub type Mapping = AstItem<MappingItem>;

impl Keyed for MappingItem {
    fn get_key(&self) -> &String {
        &self.ident
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum TopDefKind {
    Mapping { mapping: Mapping },
    Composite { composite: Composite },
    Function { func: Function },
    Error,
}

pub type TopDef = AstItem<TopDefKind>;

/// the result of parsing (ast root), items are kept in declaration order
#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub ident: String,
    pub items: Vec<TopDef>,
}

impl Program {
    pub fn new(ident: String, items: Vec<TopDef>) -> Self {
        Self { ident, items }
    }

    pub fn mappings(&self) -> impl Iterator<Item=&Mapping> {
        self.items.iter().filter_map(|item| match &item.item {
            TopDefKind::Mapping { mapping } => Some(mapping),
            _ => None,
        })
    }

    pub fn composites(&self) -> impl Iterator<Item=&Composite> {
        self.items.iter().filter_map(|item| match &item.item {
            TopDefKind::Composite { composite } => Some(composite),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item=&Function> {
        self.items.iter().filter_map(|item| match &item.item {
            TopDefKind::Function { func } => Some(func),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_literal_is_split_into_digits_and_suffix() {
        assert_eq!(
            ExpressionKind::numeric("1_000u128"),
            ExpressionKind::LitNum { val: String::from("1000"), t: Type::U128 }
        );
        assert_eq!(
            ExpressionKind::numeric("7field"),
            ExpressionKind::LitNum { val: String::from("7"), t: Type::Field }
        );
    }

    #[test]
    fn mapping_op_names_are_recognized() {
        assert_eq!(MappingOp::from(String::from("set")), MappingOp::Set);
        assert_eq!(MappingOp::from(String::from("get_or_use")), MappingOp::GetOrUse);
        assert_eq!(
            MappingOp::from(String::from("insert")),
            MappingOp::Unknown { name: String::from("insert") }
        );
    }

    #[test]
    fn signed_integer_bounds() {
        assert_eq!(Type::I8.integer_max(), Some(127));
        assert!(Type::I8.is_signed());
        assert!(!Type::U8.is_signed());
        assert!(!Type::Field.is_integer());
    }
}
