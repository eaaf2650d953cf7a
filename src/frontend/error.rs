use std::fmt;

use lalrpop_util::{ErrorRecovery, ParseError as LalrpopError};

use crate::frontend::ast::Type;
use crate::meta::{LocationMeta, Meta};

#[derive(Debug, PartialEq, Clone)]
pub enum FrontendErrorKind {
    ParseError {
        message: String,
    },
    SystemError {
        message: String,
    },
    DuplicateDeclaration {
        ident: String,
    },
    UnresolvedIdentifier {
        ident: String,
    },
    NotAMapping {
        ident: String,
    },
    KeyTypeMismatch {
        mapping: String,
        expected: Type,
        actual: Type,
    },
    ValueTypeMismatch {
        mapping: String,
        expected: Type,
        actual: Type,
    },
    RecordFieldMismatch {
        record: String,
        message: String,
    },
    TypeError {
        expected: Type,
        actual: Type,
    },
    ArgumentError {
        message: String,
    },
    FinalizeError {
        message: String,
    },
}

impl fmt::Display for FrontendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrontendErrorKind::ParseError { message } => {
                write!(f, "ParseError: {}", message)
            }
            FrontendErrorKind::SystemError { message } => {
                write!(f, "SystemError: {}", message)
            }
            FrontendErrorKind::DuplicateDeclaration { ident } => {
                write!(f, "DuplicateDeclaration: `{}` is already declared", ident)
            }
            FrontendErrorKind::UnresolvedIdentifier { ident } => {
                write!(f, "UnresolvedIdentifier: `{}` is not declared", ident)
            }
            FrontendErrorKind::NotAMapping { ident } => {
                write!(f, "NotAMapping: `{}` is not a mapping", ident)
            }
            FrontendErrorKind::KeyTypeMismatch { mapping, expected, actual } => {
                write!(f, "KeyTypeMismatch: mapping `{}` expects key `{}`, got `{}`", mapping, expected, actual)
            }
            FrontendErrorKind::ValueTypeMismatch { mapping, expected, actual } => {
                write!(f, "ValueTypeMismatch: mapping `{}` expects value `{}`, got `{}`", mapping, expected, actual)
            }
            FrontendErrorKind::RecordFieldMismatch { record, message } => {
                write!(f, "RecordFieldMismatch: `{}`: {}", record, message)
            }
            FrontendErrorKind::TypeError { expected, actual } => {
                write!(f, "TypeError: expected `{}`, got `{}`", expected, actual)
            }
            FrontendErrorKind::ArgumentError { message } => {
                write!(f, "ArgumentError: {}", message)
            }
            FrontendErrorKind::FinalizeError { message } => {
                write!(f, "FinalizeError: {}", message)
            }
        }
    }
}

/// standardized type to remember all frontend errors
pub type FrontendError<LocationT> = Meta<FrontendErrorKind, LocationT>;

impl<T: fmt::Debug, E: fmt::Debug> From<LalrpopError<usize, T, E>> for FrontendError<LocationMeta> {
    fn from(err: LalrpopError<usize, T, E>) -> Self {
        let (location, message) = match err {
            LalrpopError::InvalidToken { location } => {
                (LocationMeta::from(location), String::from("InvalidToken"))
            }
            LalrpopError::UnrecognizedEof { location, expected: _ } => {
                (LocationMeta::from(location), String::from("Unexpected end of file"))
            }
            LalrpopError::ExtraToken { token } => {
                (LocationMeta::from(token.0), format!("ExtraToken: {:?}", token.1))
            }
            LalrpopError::UnrecognizedToken { token, expected: _ } => {
                (LocationMeta::from(token.0), format!("UnrecognizedToken: {:?}", token.1))
            }
            LalrpopError::User { error } => {
                (LocationMeta::default(), format!("{:?}", error))
            }
        };
        FrontendError::new(FrontendErrorKind::ParseError { message }, location)
    }
}

impl<T: fmt::Debug, E: fmt::Debug> From<ErrorRecovery<usize, T, E>> for FrontendError<LocationMeta> {
    fn from(err: ErrorRecovery<usize, T, E>) -> Self {
        FrontendError::from(err.error)
    }
}
