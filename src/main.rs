use std::env;
use std::process::exit;

use log::{error, info};
use simple_logger::SimpleLogger;

use leo::config::Config;
use leo::fixture::{run_fixture, FixtureHeader};
use leo::frontend::{process_code, read_source, Error};


/// get a single required command line argument
pub fn parse_arg() -> String {
    let args: Vec<String> = env::args().collect();
    match args.get(1) {
        Some(input_filename) => {
            String::from(input_filename)
        },
        None => {
            let program = args.get(0).map(String::as_str).unwrap_or("leoc");
            println!("Usage: {} {}", program, "[input_filename]");
            exit(2)
        },
    }
}

/// print all diagnostics (one per line) and exit with error code
fn reject(errors: &[Error]) -> ! {
    eprintln!("ERROR");
    for err in errors.iter() {
        eprintln!("{}", err);
    }
    exit(1)
}

fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            exit(2);
        }
    };
    if let Err(e) = SimpleLogger::new().with_level(config.log_level).init() {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let input_filename = parse_arg();
    let source_code = match read_source(&input_filename) {
        Ok(source_code) => source_code,
        Err(err_vec) => reject(&err_vec),
    };

    match FixtureHeader::parse(&source_code) {
        Ok(Some(header)) => {
            info!("{}: fixture expecting {}", input_filename, header.expectation);
            match run_fixture(&input_filename, &source_code) {
                Ok(outcome) => {
                    for err in outcome.errors.iter() {
                        eprintln!("{}", err);
                    }
                    eprintln!("{}", outcome);
                    if !outcome.passed() {
                        exit(1);
                    }
                },
                Err(e) => {
                    error!("{}: {}", input_filename, e);
                    eprintln!("ERROR");
                    eprintln!("{}", e);
                    exit(1);
                },
            }
        },
        Ok(None) => {
            match process_code(&input_filename, &source_code) {
                Ok(program) => {
                    info!("{}: program `{}` accepted", input_filename, program.ident);
                    eprintln!("OK");
                },
                Err(err_vec) => reject(&err_vec),
            }
        },
        Err(e) => {
            eprintln!("ERROR");
            eprintln!("{}: {}", input_filename, e);
            exit(1);
        },
    }
}
