use std::fmt;

use log::debug;
use regex::Regex;

use crate::frontend::{process_code, Error};

/// namespace of fixtures that are only compiled (checked), never executed
pub const COMPILE_NAMESPACE: &str = "Compile";

/// leading `/* .. */` block or run of `//` lines
const HEADER_PATTERN: &str = r"\A\s*(?:/\*(?s:(?P<block>.*?))\*/|(?P<lines>(?:[ \t]*//[^\n]*(?:\n|\z))+))";
const NAMESPACE_PATTERN: &str = r"(?m)^[ \t/]*namespace:[ \t]*(?P<value>\S+)";
const EXPECTATION_PATTERN: &str = r"(?m)^[ \t/]*expectation:[ \t]*(?P<value>\S+)";

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Expectation {
    Pass,
    Fail,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expectation::Pass => write!(f, "Pass"),
            Expectation::Fail => write!(f, "Fail"),
        }
    }
}

#[derive(Debug)]
pub enum FixtureError {
    Pattern { error: regex::Error },
    MissingHeader,
    MissingField { field: &'static str },
    InvalidExpectation { value: String },
    UnsupportedNamespace { namespace: String },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FixtureError::Pattern { error } => write!(f, "invalid header pattern: {}", error),
            FixtureError::MissingHeader => write!(f, "fixture has no header comment"),
            FixtureError::MissingField { field } => write!(f, "fixture header has no `{}`", field),
            FixtureError::InvalidExpectation { value } => {
                write!(f, "unknown expectation `{}`, expected `Pass` or `Fail`", value)
            }
            FixtureError::UnsupportedNamespace { namespace } => {
                write!(f, "unsupported namespace `{}`, only `{}` fixtures can be run", namespace, COMPILE_NAMESPACE)
            }
        }
    }
}

impl From<regex::Error> for FixtureError {
    fn from(error: regex::Error) -> Self {
        FixtureError::Pattern { error }
    }
}

/// metadata from the comment at the top of a test fixture, the checker itself never reads it
#[derive(Debug, PartialEq, Clone)]
pub struct FixtureHeader {
    pub namespace: String,
    pub expectation: Expectation,
}

impl FixtureHeader {
    /// `Ok(None)` when the source does not start with a comment declaring a namespace
    pub fn parse(source: &str) -> Result<Option<Self>, FixtureError> {
        let header = match Regex::new(HEADER_PATTERN)?.captures(source) {
            Some(captures) => match captures.name("block").or_else(|| captures.name("lines")) {
                Some(comment) => comment.as_str(),
                None => return Ok(None),
            },
            None => return Ok(None),
        };
        let namespace = match find_field(NAMESPACE_PATTERN, header)? {
            Some(namespace) => namespace,
            None => return Ok(None),
        };
        let expectation = match find_field(EXPECTATION_PATTERN, header)? {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "pass" => Expectation::Pass,
                "fail" => Expectation::Fail,
                _ => return Err(FixtureError::InvalidExpectation { value }),
            },
            None => return Err(FixtureError::MissingField { field: "expectation" }),
        };
        Ok(Some(Self { namespace, expectation }))
    }
}

fn find_field(pattern: &str, header: &str) -> Result<Option<String>, FixtureError> {
    let value = Regex::new(pattern)?
        .captures(header)
        .and_then(|captures| captures.name("value"))
        .map(|value| String::from(value.as_str()));
    Ok(value)
}

/// result of checking a single fixture against its expectation
#[derive(Debug, Clone)]
pub struct FixtureOutcome {
    pub name: String,
    pub expectation: Expectation,
    pub errors: Vec<Error>,
}

impl FixtureOutcome {
    pub fn accepted(&self) -> bool {
        self.errors.is_empty()
    }

    /// Pass fixtures have to be accepted, Fail fixtures rejected with at least one diagnostic
    pub fn passed(&self) -> bool {
        match self.expectation {
            Expectation::Pass => self.accepted(),
            Expectation::Fail => !self.accepted(),
        }
    }
}

impl fmt::Display for FixtureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        let result = if self.accepted() {
            String::from("accepted")
        } else {
            format!("rejected with {} diagnostics", self.errors.len())
        };
        write!(f, "{} {} (expectation: {}, {})", verdict, self.name, self.expectation, result)
    }
}

/// check the fixture source and compare the result with the expectation from its header
pub fn run_fixture(name: &str, source: &str) -> Result<FixtureOutcome, FixtureError> {
    let header = FixtureHeader::parse(source)?.ok_or(FixtureError::MissingHeader)?;
    if header.namespace != COMPILE_NAMESPACE {
        return Err(FixtureError::UnsupportedNamespace { namespace: header.namespace });
    }
    let errors = match process_code(name, source) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    };
    let outcome = FixtureOutcome { name: String::from(name), expectation: header.expectation, errors };
    debug!("{}", outcome);
    Ok(outcome)
}
