//! A compiler for SPL, a small teaching language, targeting ECO32
//! assembly.
//!
//! The pipeline is staged: [`lexer::tokenize`] → [`parser::parse`] →
//! [`semantic::build_table`] → [`semantic::check_bodies`] →
//! [`varalloc::allocate_vars`] → [`codegen::generate`]. Every stage
//! returns a [`diag::CompileResult`]; the first error encountered halts
//! the pipeline (see [`diag`]).

pub mod ast;
pub mod codegen;
pub mod diag;
pub mod ident;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod types;
pub mod varalloc;

use ast::Program;
use diag::CompileResult;
use ir::SymbolTable;

/// How far through the pipeline [`compile_to_stage`] should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokens,
    Parse,
    Tables,
    Semant,
    Vars,
    Codegen,
}

/// The artifacts available after running the pipeline up to some
/// [`Stage`]. Later fields are only populated when `stage` requested
/// them; earlier fields are always present once their stage has run.
pub struct PipelineOutput {
    pub tokens: Vec<lexer::token::Token>,
    pub program: Option<Program>,
    pub global: Option<SymbolTable>,
    pub assembly: Option<String>,
}

/// Runs the compilation pipeline on `source` up to (and including)
/// `stage`, stopping early and returning whatever was produced.
pub fn compile_to_stage(source: &str, stage: Stage) -> CompileResult<PipelineOutput> {
    let tokens = lexer::tokenize(source)?;
    if stage == Stage::Tokens {
        return Ok(PipelineOutput {
            tokens,
            program: None,
            global: None,
            assembly: None,
        });
    }

    let program = parser::parse(&tokens)?;
    if stage == Stage::Parse {
        return Ok(PipelineOutput {
            tokens,
            program: Some(program),
            global: None,
            assembly: None,
        });
    }

    let mut global = semantic::build_table(&program)?;
    if stage == Stage::Tables {
        return Ok(PipelineOutput {
            tokens,
            program: Some(program),
            global: Some(global),
            assembly: None,
        });
    }

    semantic::check_bodies(&program, &global)?;
    if stage == Stage::Semant {
        return Ok(PipelineOutput {
            tokens,
            program: Some(program),
            global: Some(global),
            assembly: None,
        });
    }

    varalloc::allocate_vars(&program, &mut global)?;
    if stage == Stage::Vars {
        return Ok(PipelineOutput {
            tokens,
            program: Some(program),
            global: Some(global),
            assembly: None,
        });
    }

    let assembly = codegen::generate(&program, &global)?;
    Ok(PipelineOutput {
        tokens,
        program: Some(program),
        global: Some(global),
        assembly: Some(assembly),
    })
}

/// Compiles `source` all the way to ECO32 assembly.
pub fn compile(source: &str) -> CompileResult<String> {
    let output = compile_to_stage(source, Stage::Codegen)?;
    Ok(output.assembly.expect("codegen stage always produces assembly"))
}
