use splc::{compile, compile_to_stage, Stage};

fn compile_ok(source: &str) {
    let result = compile(source);
    assert!(result.is_ok(), "unexpected failure for `{source}`: {:?}", result.err());
}

fn compile_err_code(source: &str) -> i32 {
    compile(source).expect_err("expected a compile error").code.code()
}

#[test]
fn empty_main_with_unused_array_type_compiles() {
    compile_ok("type intArray = array [10] of int; proc main() { }");
}

#[test]
fn local_array_gets_contiguous_fp_relative_offsets() {
    let program = splc::parser::parse(
        &splc::lexer::tokenize("proc main() { var a: array [4] of int; a[0] := 1; }").unwrap(),
    )
    .unwrap();
    let mut global = splc::semantic::build_table(&program).unwrap();
    splc::semantic::check_bodies(&program, &global).unwrap();
    splc::varalloc::allocate_vars(&program, &mut global).unwrap();
    let report = splc::varalloc::render_vars_report(&program, &global);
    assert!(report.contains("var 'a': fp - 16"));
    assert!(report.contains("size of localvar area = 16"));
}

#[test]
fn repeated_calls_size_the_outgoing_area_to_the_largest_callee() {
    let source = "proc p(i: int) { } proc main() { p(1); p(2); }";
    let program = splc::parser::parse(&splc::lexer::tokenize(source).unwrap()).unwrap();
    let mut global = splc::semantic::build_table(&program).unwrap();
    splc::semantic::check_bodies(&program, &global).unwrap();
    splc::varalloc::allocate_vars(&program, &mut global).unwrap();
    let report = splc::varalloc::render_vars_report(&program, &global);
    assert!(report.contains("size of outgoing area = 4"));
}

#[test]
fn array_parameter_must_be_passed_by_reference() {
    compile_ok("proc q(ref a: array [2] of int) { } proc main() { var x: array [2] of int; q(x); }");
}

#[test]
fn if_condition_must_be_boolean_not_integer() {
    assert_eq!(compile_err_code("proc main() { if (1) { } }"), 110);
}

#[test]
fn main_must_not_declare_parameters() {
    assert_eq!(compile_err_code("proc main(i: int) { }"), 127);
}

#[test]
fn recursive_procedure_compiles_without_infinite_allocation_loop() {
    compile_ok("proc main() { main(); }");
}

#[test]
fn type_expression_can_reference_a_previously_declared_named_array_type() {
    compile_ok("type row = array [3] of int; type grid = array [3] of row; proc main() { }");
}

#[test]
fn reference_argument_must_be_a_plain_variable_not_an_expression() {
    assert_eq!(
        compile_err_code("proc q(ref a: int) { } proc main() { q(1 + 1); }"),
        115
    );
}

#[test]
fn redeclaring_a_variable_in_the_same_scope_is_rejected() {
    assert_eq!(
        compile_err_code("proc main() { var a: int; var a: int; }"),
        107
    );
}

#[test]
fn missing_main_is_a_fatal_error() {
    assert_eq!(compile_err_code("proc helper() { }"), 125);
}

#[test]
fn main_declared_as_a_type_is_rejected() {
    assert_eq!(compile_err_code("type main = array [1] of int; proc other() { }"), 126);
}

#[test]
fn lexical_error_on_stray_apostrophe_halts_before_parsing() {
    let err = compile_to_stage("proc main() { ' }", Stage::Tokens).unwrap_err();
    assert_eq!(err.code.code(), 99);
}

#[test]
fn syntax_error_halts_with_no_recovery() {
    let err = compile_to_stage("proc main( { }", Stage::Parse).unwrap_err();
    assert_eq!(err.code.code(), 100);
}

#[test]
fn full_pipeline_emits_assembly_with_a_label_per_procedure() {
    let asm = compile("proc helper() { } proc main() { helper(); }").unwrap();
    assert!(asm.contains("helper:"));
    assert!(asm.contains("main:"));
    assert!(asm.contains("jal\thelper"));
}

#[test]
fn stopping_at_tables_stage_builds_global_symbol_table_without_checking_bodies() {
    let output = compile_to_stage(
        "proc main() { if (1) { } }",
        Stage::Tables,
    )
    .unwrap();
    assert!(output.global.is_some());
}
