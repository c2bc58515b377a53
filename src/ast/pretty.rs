//! Abstract syntax tree pretty-printer.
//!
//! Renders the parenthesized, variant-named S-expression form used by
//! `--absyn`: each node prints as `NodeName(\n  child,\n  child)`, with
//! an empty child list rendering `NodeName()`. Two syntactically equal
//! programs always render to identical text.

use super::nodes::*;

const STEP: usize = 2;

pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("Program(");
    print_list(&program.0, 0, &mut out, print_global_decl);
    out.push_str(")\n");
    out
}

/// Prints `items` each at `indentation + STEP`, comma-newline
/// separated, preceded by a newline if the list is non-empty.
fn print_list<T>(
    items: &[T],
    indentation: usize,
    out: &mut String,
    mut print_item: impl FnMut(&T, usize, &mut String),
) {
    if items.is_empty() {
        return;
    }
    out.push('\n');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        print_item(item, indentation + STEP, out);
    }
}

fn indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push(' ');
    }
}

fn show_identifier(indentation: usize, name: crate::ident::Identifier, out: &mut String) {
    indent(indentation, out);
    out.push_str(&name.to_string());
}

fn show_integer(indentation: usize, value: i64, out: &mut String) {
    indent(indentation, out);
    out.push_str(&value.to_string());
}

fn show_boolean(indentation: usize, value: bool, out: &mut String) {
    indent(indentation, out);
    out.push_str(if value { "true" } else { "false" });
}

fn binary_operator_name(op: BinOp) -> &'static str {
    match op {
        BinOp::Equ => "EQU",
        BinOp::Neq => "NEQ",
        BinOp::Lst => "LST",
        BinOp::Lse => "LSE",
        BinOp::Grt => "GRT",
        BinOp::Gre => "GRE",
        BinOp::Add => "ADD",
        BinOp::Sub => "SUB",
        BinOp::Mul => "MUL",
        BinOp::Div => "DIV",
    }
}

fn print_type_expression(te: &TypeExpression, indentation: usize, out: &mut String) {
    match &te.kind {
        TypeExpressionKind::Named(name) => {
            indent(indentation, out);
            out.push_str("NamedTypeExpression(\n");
            show_identifier(indentation + STEP, *name, out);
            out.push(')');
        }
        TypeExpressionKind::ArrayOf(inner, length) => {
            indent(indentation, out);
            out.push_str("ArrayTypeExpression(\n");
            print_type_expression(inner, indentation + STEP, out);
            out.push_str(",\n");
            show_integer(indentation + STEP, i64::from(*length), out);
            out.push(')');
        }
    }
}

fn print_variable(var: &Variable, indentation: usize, out: &mut String) {
    match &var.kind {
        VariableKind::Named(name) => {
            indent(indentation, out);
            out.push_str("NamedVariable(\n");
            show_identifier(indentation + STEP, *name, out);
            out.push(')');
        }
        VariableKind::ArrayAccess(base, index) => {
            indent(indentation, out);
            out.push_str("ArrayAccess(\n");
            print_variable(base, indentation + STEP, out);
            out.push_str(",\n");
            print_expression(index, indentation + STEP, out);
            out.push(')');
        }
    }
}

fn print_expression(expr: &Expression, indentation: usize, out: &mut String) {
    match &expr.kind {
        ExpressionKind::Binary(op, left, right) => {
            indent(indentation, out);
            out.push_str("BinaryExpression(\n");
            indent(indentation + STEP, out);
            out.push_str(binary_operator_name(*op));
            out.push_str(",\n");
            print_expression(left, indentation + STEP, out);
            out.push_str(",\n");
            print_expression(right, indentation + STEP, out);
            out.push(')');
        }
        ExpressionKind::IntLiteral(value) => {
            indent(indentation, out);
            out.push_str("IntLiteral(\n");
            show_integer(indentation + STEP, *value, out);
            out.push(')');
        }
        ExpressionKind::Var(var) => {
            indent(indentation, out);
            out.push_str("VariableExpression(\n");
            print_variable(var, indentation + STEP, out);
            out.push(')');
        }
    }
}

fn print_statement(stmt: &Statement, indentation: usize, out: &mut String) {
    match &stmt.kind {
        StatementKind::Empty => {
            indent(indentation, out);
            out.push_str("EmptyStatement()");
        }
        StatementKind::Compound(statements) => {
            indent(indentation, out);
            out.push_str("CompoundStatement(");
            print_list(statements, indentation, out, |s, i, out| print_statement(s, i, out));
            out.push(')');
        }
        StatementKind::Assign { target, value } => {
            indent(indentation, out);
            out.push_str("AssignStatement(\n");
            print_variable(target, indentation + STEP, out);
            out.push_str(",\n");
            print_expression(value, indentation + STEP, out);
            out.push(')');
        }
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            indent(indentation, out);
            out.push_str("IfStatement(\n");
            print_expression(condition, indentation + STEP, out);
            out.push_str(",\n");
            print_statement(then_branch, indentation + STEP, out);
            out.push_str(",\n");
            print_statement(else_branch, indentation + STEP, out);
            out.push(')');
        }
        StatementKind::While { condition, body } => {
            indent(indentation, out);
            out.push_str("WhileStatement(\n");
            print_expression(condition, indentation + STEP, out);
            out.push_str(",\n");
            print_statement(body, indentation + STEP, out);
            out.push(')');
        }
        StatementKind::Call { proc_name, args } => {
            indent(indentation, out);
            out.push_str("CallStatement(\n");
            show_identifier(indentation + STEP, *proc_name, out);
            out.push_str(",\n");
            indent(indentation + STEP, out);
            out.push_str("Arguments(");
            print_list(args, indentation + STEP, out, |a, i, out| print_expression(a, i, out));
            out.push_str("))");
        }
    }
}

fn print_parameter_decl(param: &ParameterDecl, indentation: usize, out: &mut String) {
    indent(indentation, out);
    out.push_str("ParameterDeclaration(\n");
    show_identifier(indentation + STEP, param.name, out);
    out.push_str(",\n");
    print_type_expression(&param.type_expr, indentation + STEP, out);
    out.push_str(",\n");
    show_boolean(indentation + STEP, param.is_reference, out);
    out.push(')');
}

fn print_variable_decl(local: &VariableDecl, indentation: usize, out: &mut String) {
    indent(indentation, out);
    out.push_str("VariableDeclaration(\n");
    show_identifier(indentation + STEP, local.name, out);
    out.push_str(",\n");
    print_type_expression(&local.type_expr, indentation + STEP, out);
    out.push(')');
}

fn print_global_decl(decl: &GlobalDecl, indentation: usize, out: &mut String) {
    match decl {
        GlobalDecl::Type { name, type_expr, .. } => {
            indent(indentation, out);
            out.push_str("TypeDeclaration(\n");
            show_identifier(indentation + STEP, *name, out);
            out.push_str(",\n");
            print_type_expression(type_expr, indentation + STEP, out);
            out.push(')');
        }
        GlobalDecl::Procedure {
            name,
            params,
            locals,
            body,
            ..
        } => {
            indent(indentation, out);
            out.push_str("ProcedureDeclaration(\n");
            show_identifier(indentation + STEP, *name, out);
            out.push_str(",\n");

            indent(indentation + STEP, out);
            out.push_str("Parameters(");
            print_list(params, indentation + STEP, out, |p, i, out| {
                print_parameter_decl(p, i, out)
            });
            out.push_str("),\n");

            indent(indentation + STEP, out);
            out.push_str("Variables(");
            print_list(locals, indentation + STEP, out, |l, i, out| {
                print_variable_decl(l, i, out)
            });
            out.push_str("),\n");

            indent(indentation + STEP, out);
            out.push_str("Body(");
            print_list(body, indentation + STEP, out, |s, i, out| print_statement(s, i, out));
            out.push(')');

            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::intern;

    #[test]
    fn round_trip_is_deterministic() {
        let program = Program(vec![GlobalDecl::Procedure {
            name: intern("main"),
            params: vec![],
            locals: vec![],
            body: vec![Statement::empty(1)],
            line: 1,
        }]);
        let first = print_program(&program);
        let second = print_program(&program);
        assert_eq!(first, second);
        assert!(first.starts_with("Program(\n"));
        assert!(first.contains("ProcedureDeclaration(\n  main,\n  Parameters(),\n  Variables(),\n  Body(\n    EmptyStatement())))"));
    }

    #[test]
    fn empty_program_has_no_children() {
        assert_eq!(print_program(&Program(vec![])), "Program()\n");
    }

    #[test]
    fn binary_expression_uses_fixed_operator_names() {
        let mut out = String::new();
        let expr = Expression::binary(
            BinOp::Add,
            Expression::int_literal(1, 1),
            Expression::int_literal(2, 1),
            1,
        );
        print_expression(&expr, 0, &mut out);
        assert_eq!(
            out,
            "BinaryExpression(\n  ADD,\n  IntLiteral(\n    1),\n  IntLiteral(\n    2))"
        );
    }

    #[test]
    fn parameter_declaration_renders_reference_flag_as_boolean_literal() {
        let mut out = String::new();
        let param = ParameterDecl {
            name: intern("a"),
            type_expr: TypeExpression::named(intern("int"), 1),
            is_reference: true,
            line: 1,
        };
        print_parameter_decl(&param, 0, &mut out);
        assert!(out.ends_with("true)"));
    }
}
