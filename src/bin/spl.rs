//! Command-line driver: `spl [options] <input file> <output file>`.
//!
//! Each `--phase` flag stops the pipeline after that phase and prints
//! its result; with no flags, the full pipeline runs and ECO32
//! assembly is written to the output file. Help and version text are
//! rendered by hand rather than through clap's generated output, to
//! keep the exact wording a user of the original tool would expect.

use clap::Parser;
use splc::diag::CompileError;
use splc::{ast, varalloc, Stage};
use std::io::Write;
use std::process::ExitCode;

const VERSION: &str = "1.1";

#[derive(Parser, Debug)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Args {
    #[arg(long)]
    tokens: bool,
    #[arg(long)]
    parse: bool,
    #[arg(long)]
    absyn: bool,
    #[arg(long)]
    tables: bool,
    #[arg(long)]
    semant: bool,
    #[arg(long)]
    vars: bool,
    #[arg(long)]
    version: bool,
    #[arg(long)]
    help: bool,

    input_file: Option<String>,
    output_file: Option<String>,
}

fn program_name() -> String {
    std::env::args()
        .next()
        .unwrap_or_else(|| "spl".to_string())
}

fn show_usage(out: &mut dyn std::io::Write, myself: &str) {
    let _ = writeln!(out, "Usage: {myself} [options] <input file> <output file>");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Executes all compiler phases up to (and including) the specified one."
    );
    let _ = writeln!(
        out,
        "If no flag is specified, all phases are run and code is written to the output file."
    );
    let _ = writeln!(out, "Options:");
    let _ = writeln!(out, "  --tokens     Phase 1: Scans for tokens and prints them.");
    let _ = writeln!(
        out,
        "  --parse      Phase 2: Parses the stream of tokens to check for syntax errors."
    );
    let _ = writeln!(
        out,
        "  --absyn      Phase 3: Creates an abstract syntax tree from the input tokens and prints it."
    );
    let _ = writeln!(
        out,
        "  --tables     Phase 4a: Builds a symbol table and prints its entries."
    );
    let _ = writeln!(out, "  --semant     Phase 4b: Performs the semantic analysis.");
    let _ = writeln!(
        out,
        "  --vars       Phase 5: Allocates memory space for variables and prints the amount of allocated memory."
    );
    let _ = writeln!(out, "  --version    Show compiler version.");
    let _ = writeln!(out, "  --help       Show this help.");
}

fn usage_error(myself: &str, message: &str) -> ExitCode {
    eprintln!("Usage: {message}");
    show_usage(&mut std::io::stderr(), myself);
    ExitCode::from(1)
}

fn main() -> ExitCode {
    env_logger::init();
    let myself = program_name();
    let args = Args::parse();

    if args.version {
        println!("{myself} version {VERSION}");
        return ExitCode::SUCCESS;
    }
    if args.help {
        show_usage(&mut std::io::stdout(), &myself);
        return ExitCode::SUCCESS;
    }

    let Some(input_file) = &args.input_file else {
        return usage_error(&myself, "No input file");
    };

    let any_phase_flag = args.tokens
        || args.parse
        || args.absyn
        || args.tables
        || args.semant
        || args.vars;
    if args.output_file.is_none() && !any_phase_flag {
        return usage_error(&myself, "No output file");
    }

    let source = match std::fs::read_to_string(input_file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", CompileError::host(format!("cannot open input file '{input_file}': {err}")).render_plain());
            return ExitCode::from(1);
        }
    };

    let stage = if args.tokens {
        Stage::Tokens
    } else if args.parse {
        Stage::Parse
    } else if args.absyn {
        Stage::Parse
    } else if args.tables {
        Stage::Tables
    } else if args.semant {
        Stage::Semant
    } else if args.vars {
        Stage::Vars
    } else {
        Stage::Codegen
    };

    log::info!("compiling {input_file}");
    let output = match splc::compile_to_stage(&source, stage) {
        Ok(output) => output,
        Err(err) => {
            eprint!("{}", err.render_plain());
            return ExitCode::from(err.code.code() as u8);
        }
    };

    if args.tokens {
        use splc::lexer::token::TokenKind;
        for token in &output.tokens {
            match &token.kind {
                TokenKind::Ident(text) => println!(
                    "TOKEN = {} in line {}, value = \"{}\"",
                    token.kind.kind_name(),
                    token.line,
                    text
                ),
                TokenKind::IntLit(value) => println!(
                    "TOKEN = {} in line {}, value = {}",
                    token.kind.kind_name(),
                    token.line,
                    value
                ),
                _ => println!("TOKEN = {} in line {}", token.kind.kind_name(), token.line),
            }
        }
        return ExitCode::SUCCESS;
    }

    if args.parse {
        println!("Input parsed successfully!");
        return ExitCode::SUCCESS;
    }

    if args.absyn {
        let program = output.program.as_ref().expect("parse stage ran");
        print!("{}", ast::pretty::print_program(program));
        return ExitCode::SUCCESS;
    }

    if args.tables {
        let global = output.global.as_ref().expect("table-build stage ran");
        print!("{}", global.render());
        return ExitCode::SUCCESS;
    }

    if args.semant {
        println!("No semantic errors found!");
        return ExitCode::SUCCESS;
    }

    if args.vars {
        let program = output.program.as_ref().expect("parse stage ran");
        let global = output.global.as_ref().expect("table-build stage ran");
        print!("{}", varalloc::render_vars_report(program, global));
        return ExitCode::SUCCESS;
    }

    let assembly = output.assembly.expect("codegen stage ran");
    let output_file = args.output_file.as_ref().expect("checked above");
    if let Err(err) = std::fs::write(output_file, assembly) {
        eprintln!(
            "{}",
            CompileError::host(format!("Unable to open output file '{output_file}': {err}")).render_plain()
        );
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
