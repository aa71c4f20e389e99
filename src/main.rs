//! # rlox CLI
//!
//! Argument dispatch, source reading, and the process exit-code convention.
//! It talks to the core through exactly three entry points (compile a
//! fresh chunk, interpret a chunk, interpret source end-to-end) and never
//! touches VM or compiler internals directly.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};

use rlox::compiler::scanner::{Scanner, TokenKind};
use rlox::{InterpretResult, VmOptions, VM};

#[derive(ClapParser)]
#[command(name = "rlox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A stack-based bytecode interpreter for a small expression language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run a source file (or stdin, with `-` or no file)
    Run {
        /// Source file to interpret; omit or pass `-` to read from stdin
        file: Option<PathBuf>,

        /// Print the disassembled chunk before executing it
        #[arg(long)]
        print_code: bool,

        /// Trace the stack and each instruction as it dispatches
        #[arg(long)]
        trace: bool,

        /// Emit the compiled chunk's structure as JSON instead of running it
        #[cfg(feature = "json")]
        #[arg(long)]
        emit_json: bool,
    },

    /// Scan a source file (or stdin) and print its token stream
    Tokens {
        /// Source file to scan; omit or pass `-` to read from stdin
        file: Option<PathBuf>,
    },
}

/// Process exit codes: a fixed convention so external test harnesses built
/// against it keep working.
mod exit_code {
    pub const OK: u8 = 0;
    pub const USAGE: u8 = 64;
    pub const COMPILE_ERROR: u8 = 65;
    pub const RUNTIME_ERROR: u8 = 70;
    pub const IO_ERROR: u8 = 74;
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap's own `Error::exit` always leaves via code 2; route usage
            // mistakes through this crate's own exit-code convention instead.
            let _ = err.print();
            return ExitCode::from(exit_code::USAGE);
        }
    };

    match cli.command {
        #[cfg(feature = "json")]
        Commands::Run {
            file,
            print_code,
            trace,
            emit_json,
        } => run(file, print_code, trace, emit_json),
        #[cfg(not(feature = "json"))]
        Commands::Run {
            file,
            print_code,
            trace,
        } => run(file, print_code, trace),
        Commands::Tokens { file } => tokens(file),
    }
}

fn read_source(file: Option<PathBuf>) -> Result<Vec<u8>, ExitCode> {
    match file {
        None => read_stdin(),
        Some(path) if path.as_os_str() == "-" => read_stdin(),
        Some(path) => std::fs::read(&path).map_err(|err| {
            eprintln!("Could not read file \"{}\": {err}", path.display());
            ExitCode::from(exit_code::IO_ERROR)
        }),
    }
}

fn read_stdin() -> Result<Vec<u8>, ExitCode> {
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf).map_err(|err| {
        eprintln!("Could not read stdin: {err}");
        ExitCode::from(exit_code::IO_ERROR)
    })?;
    Ok(buf)
}

fn run(
    file: Option<PathBuf>,
    print_code: bool,
    trace: bool,
    #[cfg(feature = "json")] emit_json: bool,
) -> ExitCode {
    let source = match read_source(file) {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };

    #[cfg(feature = "json")]
    if emit_json {
        let mut chunk = rlox::Chunk::new();
        let mut heap = rlox::ObjectHeap::new();
        if !rlox::compile(&source, &mut chunk, &mut heap) {
            return ExitCode::from(exit_code::COMPILE_ERROR);
        }
        match rlox::debug::dump_json(&chunk, &heap) {
            Ok(json) => {
                println!("{json}");
                return ExitCode::from(exit_code::OK);
            }
            Err(err) => {
                eprintln!("Could not serialize chunk: {err}");
                return ExitCode::from(exit_code::IO_ERROR);
            }
        }
    }

    let mut vm = VM::with_options(VmOptions {
        trace_execution: trace,
        print_code,
    });

    match vm.interpret(&source) {
        InterpretResult::Ok => ExitCode::from(exit_code::OK),
        InterpretResult::CompileError => ExitCode::from(exit_code::COMPILE_ERROR),
        InterpretResult::RuntimeError => ExitCode::from(exit_code::RUNTIME_ERROR),
    }
}

/// Scans `file` (or stdin) to completion and prints one line per token, in
/// the same disassembly-adjacent spirit as `--print-code`. A debugging aid
/// outside the core, never invoked by `compile`/`interpret`.
fn tokens(file: Option<PathBuf>) -> ExitCode {
    let source = match read_source(file) {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };

    let mut scanner = Scanner::new(&source);
    let mut line = 0u32;
    loop {
        let token = scanner.next_token();
        if token.line != line {
            print!("{:4} ", token.line);
            line = token.line;
        } else {
            print!("   | ");
        }
        println!("{:?} '{}'", token.kind, token.lexeme_str());
        if token.kind == TokenKind::Eof {
            break;
        }
    }
    ExitCode::from(exit_code::OK)
}
