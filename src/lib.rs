use std::env;

pub mod config;
pub mod fixture;
pub mod frontend;
pub mod meta;
pub mod util;

/// get key from environment variable, or default if it's not defined (or not valid unicode)
pub fn parse_env(key: &str, default: &str) -> String {
    match env::var_os(key) {
        Some(value) => value.into_string().unwrap_or_else(|_| String::from(default)),
        None => String::from(default),
    }
}
