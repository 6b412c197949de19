#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use cinder::cli::args::CliArgs;
use cinder::cli::config::resolve_settings;
use cinder::cli::driver::{self, EXIT_SUCCESS};
use cinder::cli::reporter::Reporter;

fn main() -> Result<()> {
    // Initialize tracing if CINDER_LOG or RUST_LOG is set.
    // Supports CINDER_LOG_FORMAT=tree|json|text (see src/tracing_config.rs).
    cinder::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let settings = resolve_settings(&args, &cwd)?;
    let color = settings.color.enabled(std::io::stderr().is_terminal());
    colored::control::set_override(color);

    let result = driver::compile(&settings)?;

    for fragment in &result.fragments {
        println!("// {}", fragment.cname);
        print!("{}", fragment.text);
        println!();
    }

    let mut reporter = Reporter::new(color, &result.files);
    if let Some(internal) = &result.internal {
        eprintln!("{}", reporter.format_internal(internal));
    }
    if !result.diagnostics.is_empty() {
        // render() already ends every diagnostic with a newline
        eprint!("{}", reporter.render(&result.diagnostics));
    }

    let code = result.exit_code();
    if code != EXIT_SUCCESS {
        std::process::exit(code);
    }
    Ok(())
}
