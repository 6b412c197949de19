use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the cinderc binary.
#[derive(Parser, Debug)]
#[command(
    name = "cinderc",
    version,
    about = "Generate C declarations and default serialization routines from program descriptions"
)]
pub struct CliArgs {
    /// Program descriptions (JSON) to compile. The first one holds the entry point.
    pub inputs: Vec<PathBuf>,

    /// Read the pass list from a file instead of using the built-in one.
    #[arg(long, value_name = "FILE")]
    pub passlist: Option<PathBuf>,

    /// Directory that receives `_main.h`, `_main.c` and the object file.
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// C compiler used to build the generated code.
    #[arg(long, value_name = "CC")]
    pub cc: Option<String>,

    /// Generate code but do not run the C compiler.
    #[arg(long = "no-build")]
    pub no_build: bool,

    /// Set a config var: `-s name=value`. An empty value means `true`.
    #[arg(short = 's', value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Project file; defaults to `cinder.json` in the current directory when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also emit the field type/offset/size tables used by the communication layer.
    #[arg(long = "gen-communicated-structures")]
    pub gen_communicated_structures: bool,

    /// Print the synthesized default read/write routines to stdout.
    #[arg(long = "dump-fragments")]
    pub dump_fragments: bool,

    /// When to color diagnostics.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolve `auto` against whether stderr is a terminal.
    pub fn enabled(self, is_terminal: bool) -> bool {
        match self {
            ColorChoice::Auto => is_terminal,
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}
