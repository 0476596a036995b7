//! VFS lowering-core driver.
//!
//! Per spec.md §6, the parser that turns VFS surface syntax into an AST is
//! an external collaborator out of this repository's scope, and no repo in
//! the retrieval pack implements one. This driver therefore takes the
//! artifact the (unimplemented) parser is expected to hand the lowering
//! core directly: a `serde_json`-serialized [`vfs_ast::Program`], read from
//! a path given as the first argument or from standard input if none is
//! given. It lowers that program and writes the resulting LLVM IR text to
//! standard output, exactly the "read file/stdin, invoke core, dump IR"
//! sequencing contract spec.md §6 fixes for the driver regardless of what
//! sits upstream of it.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;

/// Lower a VFS program (given as a JSON-serialized AST) to LLVM IR.
#[derive(Parser)]
#[command(name = "vfs", about = "VFS semantic lowering core driver")]
struct Cli {
    /// Path to a JSON-serialized `vfs_ast::Program`. Reads standard input
    /// when omitted.
    input: Option<PathBuf>,
}

fn main() {
    // Stdout is reserved for the printed IR module (spec.md §6); logs go
    // to stderr alongside the "Syntax error"/"Generation error" messages.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    process::exit(run(cli.input));
}

/// Returns the process exit code: 0 on success, 1 on any failure.
fn run(input: Option<PathBuf>) -> i32 {
    let source = match read_input(input.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Syntax error: failed to read input: {e}");
            return 1;
        }
    };

    let program: vfs_ast::Program = match serde_json::from_str(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Syntax error: {e}");
            return 1;
        }
    };

    tracing::info!(
        functions = program.functions.len(),
        structs = program.structs.len(),
        "lowering program"
    );

    match vfs_codegen::lower_to_ir_string(&program) {
        Ok(ir) => {
            println!("{ir}");
            0
        }
        Err(e) => {
            eprintln!("Generation error: {e}");
            1
        }
    }
}

fn read_input(path: Option<&std::path::Path>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
