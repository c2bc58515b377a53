//! Stage 5: assigns stack-frame byte offsets to parameters and local
//! variables, and sizes each procedure's argument/localvar/outgoing
//! areas.

use crate::ast::*;
use crate::diag::CompileResult;
use crate::ident::Identifier;
use crate::ir::symbol_table::{Entry, SymbolTable};

/// Rounds `size` up to the next multiple of the ECO32 word size.
fn align4(size: u32) -> u32 {
    size.div_ceil(4) * 4
}

/// Walks every procedure declaration in `program`, writing frame
/// offsets and area sizes into the corresponding `global` entries.
pub fn allocate_vars(program: &Program, global: &mut SymbolTable) -> CompileResult<()> {
    for decl in &program.0 {
        if let GlobalDecl::Procedure {
            name,
            params,
            locals,
            body,
            ..
        } = decl
        {
            allocate_procedure(*name, params, locals, body, global);
        }
    }
    Ok(())
}

fn allocate_procedure(
    name: Identifier,
    params: &[ParameterDecl],
    locals: &[VariableDecl],
    body: &[Statement],
    global: &mut SymbolTable,
) {
    let mut param_offsets = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let offset = (i as u32) * 4;
        param_offsets.push(offset);
        global.set_var_offset_in(name, param.name, offset);
    }
    let argument_area = params.len() as u32 * 4;

    let mut localvar_cursor = 0u32;
    for local in locals {
        let size = global.var_byte_size_in(name, local.name).unwrap_or(4);
        localvar_cursor += align4(size);
        global.set_var_offset_in(name, local.name, localvar_cursor);
    }
    let localvar_area = localvar_cursor;

    let mut max_outgoing = 0u32;
    let mut is_leaf = true;
    collect_calls(body, global, &mut max_outgoing, &mut is_leaf);

    if let Some(Entry::Proc {
        param_types,
        argument_area: aa,
        localvar_area: lva,
        outgoing_area: oa,
        is_leaf: leaf,
        ..
    }) = global.entry_mut(name)
    {
        for (pt, offset) in param_types.iter_mut().zip(param_offsets.iter()) {
            pt.offset = *offset;
        }
        *aa = argument_area;
        *lva = localvar_area;
        *oa = max_outgoing;
        *leaf = is_leaf;
    }
}

fn collect_calls(
    statements: &[Statement],
    global: &SymbolTable,
    max_outgoing: &mut u32,
    is_leaf: &mut bool,
) {
    for stmt in statements {
        walk_statement(stmt, global, max_outgoing, is_leaf);
    }
}

fn walk_statement(
    stmt: &Statement,
    global: &SymbolTable,
    max_outgoing: &mut u32,
    is_leaf: &mut bool,
) {
    match &stmt.kind {
        StatementKind::Empty => {}
        StatementKind::Compound(statements) => {
            collect_calls(statements, global, max_outgoing, is_leaf)
        }
        StatementKind::Assign { .. } => {}
        StatementKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            walk_statement(then_branch, global, max_outgoing, is_leaf);
            walk_statement(else_branch, global, max_outgoing, is_leaf);
        }
        StatementKind::While { body, .. } => walk_statement(body, global, max_outgoing, is_leaf),
        StatementKind::Call { proc_name, .. } => {
            *is_leaf = false;
            if let Some(Entry::Proc { argument_area, .. }) = global.lookup_local(*proc_name) {
                *max_outgoing = (*max_outgoing).max(*argument_area);
            }
        }
    }
}

/// Renders the `--vars` report the way the original skeleton's
/// `showProcedureVarAlloc` does.
pub fn render_vars_report(program: &Program, global: &SymbolTable) -> String {
    let mut out = String::new();
    for decl in &program.0 {
        if let GlobalDecl::Procedure { name, params, locals, .. } = decl {
            out.push_str(&format!("\nVariable allocation for procedure '{}'\n", name));
            let Some(Entry::Proc {
                param_types,
                argument_area,
                localvar_area,
                outgoing_area,
                is_leaf,
                ..
            }) = global.lookup_local(*name)
            else {
                continue;
            };
            for (i, pt) in param_types.iter().enumerate() {
                out.push_str(&format!("arg {}: sp + {}\n", i + 1, pt.offset));
            }
            out.push_str(&format!("size of argument area = {argument_area}\n"));
            for (param, pt) in params.iter().zip(param_types.iter()) {
                out.push_str(&format!("param '{}': fp + {}\n", param.name, pt.offset));
            }
            for local in locals {
                if let Some(Entry::Var { offset, .. }) = global.lookup_local(*name).and_then(|e| {
                    if let Entry::Proc { local_table, .. } = e {
                        local_table.lookup_local(local.name)
                    } else {
                        None
                    }
                }) {
                    out.push_str(&format!("var '{}': fp - {}\n", local.name, offset));
                }
            }
            out.push_str(&format!("size of localvar area = {localvar_area}\n"));
            let outgoing_display: i64 = if *is_leaf { -1 } else { i64::from(*outgoing_area) };
            out.push_str(&format!("size of outgoing area = {outgoing_display}\n"));
        }
    }
    out
}

impl SymbolTable {
    fn set_var_offset_in(&mut self, proc_name: Identifier, var_name: Identifier, offset: u32) {
        if let Some(Entry::Proc { local_table, .. }) = self.entry_mut(proc_name) {
            local_table.set_var_offset(var_name, offset);
        }
    }

    fn var_byte_size_in(&self, proc_name: Identifier, var_name: Identifier) -> Option<u32> {
        if let Some(Entry::Proc { local_table, .. }) = self.lookup_local(proc_name) {
            if let Some(Entry::Var { ty, .. }) = local_table.lookup_local(var_name) {
                return Some(ty.byte_size());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::intern;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::semantic::{build_table, check_bodies};

    fn allocate(src: &str) -> (Program, SymbolTable) {
        let tokens = tokenize(src).unwrap();
        let program = parse(&tokens).unwrap();
        let mut global = build_table(&program).unwrap();
        check_bodies(&program, &global).unwrap();
        allocate_vars(&program, &mut global).unwrap();
        (program, global)
    }

    #[test]
    fn scenario_leaf_main_has_zero_areas() {
        let (_, global) = allocate("type t = array [3] of int; proc main() { }");
        match global.lookup_local(intern("main")) {
            Some(Entry::Proc {
                argument_area,
                localvar_area,
                outgoing_area,
                is_leaf,
                ..
            }) => {
                assert_eq!(*argument_area, 0);
                assert_eq!(*localvar_area, 0);
                assert_eq!(*outgoing_area, 0);
                assert!(*is_leaf);
            }
            _ => panic!("expected main"),
        }
    }

    #[test]
    fn scenario_local_array_offset() {
        let (_, global) =
            allocate("proc main() { var a: array [4] of int; a[0] := 1; }");
        match global.lookup_local(intern("main")) {
            Some(Entry::Proc {
                local_table,
                localvar_area,
                ..
            }) => {
                assert_eq!(*localvar_area, 16);
                match local_table.lookup_local(intern("a")) {
                    Some(Entry::Var { offset, .. }) => assert_eq!(*offset, 16),
                    _ => panic!("expected var a"),
                }
            }
            _ => panic!("expected main"),
        }
    }

    #[test]
    fn scenario_call_sizes_outgoing_area() {
        let (_, global) =
            allocate("proc p(i: int) { } proc main() { p(1); p(2); }");
        match global.lookup_local(intern("main")) {
            Some(Entry::Proc { outgoing_area, is_leaf, .. }) => {
                assert_eq!(*outgoing_area, 4);
                assert!(!*is_leaf);
            }
            _ => panic!("expected main"),
        }
        match global.lookup_local(intern("p")) {
            Some(Entry::Proc { param_types, argument_area, .. }) => {
                assert_eq!(*argument_area, 4);
                assert_eq!(param_types[0].offset, 0);
            }
            _ => panic!("expected p"),
        }
    }

    #[test]
    fn scenario_reference_parameter_offset_is_pointer_sized() {
        let (_, global) = allocate(
            "proc q(ref a: array [2] of int) { } proc main() { var x: array [2] of int; q(x); }",
        );
        match global.lookup_local(intern("q")) {
            Some(Entry::Proc {
                param_types,
                argument_area,
                ..
            }) => {
                assert_eq!(param_types[0].offset, 0);
                assert_eq!(*argument_area, 4);
            }
            _ => panic!("expected q"),
        }
    }

    #[test]
    fn recursive_procedure_is_not_a_leaf() {
        let (_, global) = allocate("proc main() { main(); }");
        match global.lookup_local(intern("main")) {
            Some(Entry::Proc { is_leaf, outgoing_area, .. }) => {
                assert!(!*is_leaf);
                assert_eq!(*outgoing_area, 0);
            }
            _ => panic!("expected main"),
        }
    }

    #[test]
    fn vars_report_contains_expected_lines() {
        let (program, global) =
            allocate("proc main() { var a: array [4] of int; a[0] := 1; }");
        let report = render_vars_report(&program, &global);
        assert!(report.contains("var 'a': fp - 16"));
        assert!(report.contains("size of localvar area = 16"));
        assert!(report.contains("size of outgoing area = -1"));
    }
}
