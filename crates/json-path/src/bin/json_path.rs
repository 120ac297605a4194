//! `json-path`: run a JSONPath query against a JSON document.
//!
//! Usage:
//!   json-path '<query>' [--one] [--paths]
//!
//! The document is read from stdin; each result is printed on its own line.
//! Set `RUST_LOG=debug` to trace compilation and evaluation.

use json_path::cli::{select, OutputMode};
use std::io::{self, Read, Write};

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    init_logging();

    let mut query = None;
    let mut mode = OutputMode::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--one" => mode.one = true,
            "--paths" => mode.paths = true,
            _ if query.is_none() => query = Some(arg),
            _ => {
                eprintln!("Unexpected argument: {arg}");
                std::process::exit(1);
            }
        }
    }
    let Some(query) = query else {
        eprintln!("Usage: json-path '<query>' [--one] [--paths]");
        std::process::exit(1);
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match select(&query, &buf, mode) {
        Ok(lines) => {
            let mut out = io::stdout().lock();
            for line in lines {
                if let Err(e) = writeln!(out, "{line}") {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
