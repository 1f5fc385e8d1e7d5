//! Full Pipeline Integration Tests
//!
//! Tests the complete flow: Source -> Lexer -> Parser -> Resolver ->
//! CodeGenerator -> artifact bytes -> VM -> Result

use core_types::{ErrorKind, Value};
use integration_tests::{eval, run_source, PipelineError};
use interpreter::RuntimeError;

fn compile_error_kind(source: &str) -> ErrorKind {
    match run_source(source) {
        Err(PipelineError::Compile(e)) => e.kind,
        other => panic!("expected compile error for {:?}, got {:?}", source, other),
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_empty_program_is_nil() {
    assert_eq!(eval(""), Value::Nil);
    assert_eq!(eval("; only a comment\n"), Value::Nil);
}

#[test]
fn test_literals_round_trip() {
    assert_eq!(eval("42"), Value::Long(42));
    assert_eq!(eval("-7"), Value::Long(-7));
    assert_eq!(eval("40000"), Value::Long(40000));
    assert_eq!(eval("9223372036854775807"), Value::Long(i64::MAX));
    assert_eq!(eval("-9223372036854775808"), Value::Long(i64::MIN));
    assert_eq!(eval("2.5"), Value::Double(2.5));
    assert_eq!(eval("-0.5"), Value::Double(-0.5));
    assert_eq!(eval("true"), Value::Bool(true));
    assert_eq!(eval("false"), Value::Bool(false));
    assert_eq!(eval("nil"), Value::Nil);
    assert_eq!(
        eval(r#""tab\there \"quoted\"""#),
        Value::Str("tab\there \"quoted\"".to_string())
    );
}

// ============================================================================
// Forms
// ============================================================================

#[test]
fn test_program_value_is_last_form() {
    assert_eq!(eval("1 2 3"), Value::Long(3));
    assert_eq!(eval("(do 1 2 3)"), Value::Long(3));
    assert_eq!(eval("(do (def a 1) (+ a 1))"), Value::Long(2));
}

#[test]
fn test_def_yields_value_and_binds_global() {
    assert_eq!(eval("(def x 7)"), Value::Long(7));
    assert_eq!(eval("(def x 7) (* x x)"), Value::Long(49));
}

#[test]
fn test_let_shadowing() {
    assert_eq!(eval("(let x 1 (let x 2 (+ x 10)))"), Value::Long(12));
    assert_eq!(eval("(def x 1) (let x 2 x)"), Value::Long(2));
    assert_eq!(eval("(def x 1) (let x 2 x) x"), Value::Long(1));
    assert_eq!(eval("(let x 1 (do (let x 5 x) x))"), Value::Long(1));
}

#[test]
fn test_truthiness() {
    assert_eq!(eval("(if false 1 2)"), Value::Long(2));
    assert_eq!(eval("(if nil 1 2)"), Value::Long(2));
    assert_eq!(eval("(if 0 1 2)"), Value::Long(1));
    assert_eq!(eval("(if 0.0 1 2)"), Value::Long(1));
    assert_eq!(eval(r#"(if "" 1 2)"#), Value::Long(1));
    assert_eq!(eval("(not nil)"), Value::Bool(true));
    assert_eq!(eval("(and 1 nil)"), Value::Bool(false));
    assert_eq!(eval("(or false 0)"), Value::Bool(true));
}

#[test]
fn test_cond() {
    assert_eq!(eval("(cond false 1 true 2)"), Value::Long(2));
    assert_eq!(eval("(cond (< 1 2) \"lt\" true \"ge\")"), Value::Str("lt".to_string()));
    assert_eq!(eval("(cond false 1 nil 2)"), Value::Nil);
    assert_eq!(eval("(cond)"), Value::Nil);
}

#[test]
fn test_compose_threads_left_to_right() {
    let prelude = "(defn inc [n] (+ n 1)) (defn dbl [n] (* n 2)) ";
    assert_eq!(eval(&format!("{}(-> 5 inc dbl)", prelude)), Value::Long(12));
    assert_eq!(eval(&format!("{}(-> 5 dbl inc)", prelude)), Value::Long(11));
    assert_eq!(eval(&format!("{}(-> 5 (inc) dbl)", prelude)), Value::Long(12));
    assert_eq!(eval("(-> nil not not)"), Value::Bool(false));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursive_fibonacci() {
    let source = "(defn fib [n] (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))) (fib 20)";
    assert_eq!(eval(source), Value::Long(6765));
}

#[test]
fn test_mutual_recursion_in_any_order() {
    let source = "
        (defn even? [n] (if (= n 0) true (odd? (- n 1))))
        (defn odd? [n] (if (= n 0) false (even? (- n 1))))
        (even? 10)";
    assert_eq!(eval(source), Value::Bool(true));
    assert_eq!(eval(&source.replace("(even? 10)", "(odd? 7)")), Value::Bool(true));
}

#[test]
fn test_parameters_and_locals() {
    assert_eq!(eval("(defn sub [a b] (- a b)) (sub 10 3)"), Value::Long(7));
    assert_eq!(
        eval("(defn hyp [a b] (let aa (* a a) (do (def bb (* b b)) (+ aa bb)))) (hyp 3 4)"),
        Value::Long(25)
    );
}

#[test]
fn test_functions_read_earlier_globals() {
    assert_eq!(
        eval("(def base 10) (defn add-base [n] (+ n base)) (add-base 5)"),
        Value::Long(15)
    );
}

#[test]
fn test_function_as_value() {
    assert_eq!(eval("(defn f [] 1) f"), Value::Function("f".to_string()));
}

#[test]
fn test_deep_recursion_does_not_overflow_native_stack() {
    let source = "(defn down [n] (if (= n 0) 0 (down (- n 1)))) (down 5000)";
    assert_eq!(eval(source), Value::Long(0));
}

// ============================================================================
// Builtins
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval("(+ 1 (* 2 3))"), Value::Long(7));
    assert_eq!(eval("(/ 7 2)"), Value::Long(3));
    assert_eq!(eval("(/ 7 2.0)"), Value::Double(3.5));
    assert_eq!(eval("(+ 9223372036854775807 1)"), Value::Long(i64::MIN));
    assert_eq!(eval("(= 1 1.0)"), Value::Bool(true));
    assert_eq!(eval("(!= \"a\" \"b\")"), Value::Bool(true));
    assert_eq!(eval("(>= 2 2)"), Value::Bool(true));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval(r#"(+ "n=" 4)"#), Value::Str("n=4".to_string()));
}

#[test]
fn test_println_output() {
    let (value, output) = run_source(r#"(println "hello") (println (+ 1 2)) (println nil)"#).unwrap();
    assert_eq!(value, Value::Nil);
    assert_eq!(output, "hello\n3\nnil\n");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_arity_errors() {
    assert_eq!(compile_error_kind("(defn f [a] a) (f 1 2)"), ErrorKind::ArityError);
    assert_eq!(compile_error_kind("(+ 1)"), ErrorKind::ArityError);
    assert_eq!(compile_error_kind("(println)"), ErrorKind::ArityError);
}

#[test]
fn test_unresolved_names() {
    assert_eq!(compile_error_kind("y"), ErrorKind::UnresolvedName);
    assert_eq!(
        compile_error_kind("(defn f [] later) (def later 1)"),
        ErrorKind::UnresolvedName
    );
    assert_eq!(compile_error_kind("(let x 1 x) x"), ErrorKind::UnresolvedName);
}

#[test]
fn test_runtime_errors() {
    assert!(matches!(
        run_source("(/ 1 0)"),
        Err(PipelineError::Runtime(RuntimeError::DivisionByZero { position: Some(_) }))
    ));
    assert!(matches!(
        run_source("(- \"a\" 1)"),
        Err(PipelineError::Runtime(RuntimeError::Type { .. }))
    ));
    assert!(matches!(
        run_source("(defn loop [] (loop)) (loop)"),
        Err(PipelineError::Runtime(RuntimeError::StackOverflow(_)))
    ));
}
