//! Pipeline-wide properties: determinism, concurrency, malformed input and
//! artifact integrity.

use bytecode_system::CompiledUnit;
use compiler::compile;
use core_types::ErrorKind;
use integration_tests::{run_source, PipelineError};
use interpreter::{RuntimeError, VM};
use std::thread;

const PROGRAM: &str = "
    (def greeting \"hello\")
    (defn fib [n] (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))
    (defn shout [s] (+ s \"!\"))
    (println (-> greeting shout))
    (cond (> (fib 10) 50) 123456789 true 2.5)";

#[test]
fn test_compilation_is_deterministic() {
    let first = compile("Prog", PROGRAM).unwrap().to_bytes();
    for _ in 0..5 {
        assert_eq!(compile("Prog", PROGRAM).unwrap().to_bytes(), first);
    }
}

#[test]
fn test_unit_name_only_changes_header() {
    let a = compile("A", PROGRAM).unwrap();
    let b = compile("B", PROGRAM).unwrap();
    assert_ne!(a.to_bytes(), b.to_bytes());
    assert_eq!(a.constants, b.constants);
    assert_eq!(a.methods, b.methods);
    assert_eq!(a.entry, b.entry);
}

#[test]
fn test_concurrent_compilation_matches_sequential() {
    let expected = compile("Prog", PROGRAM).unwrap().to_bytes();

    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| compile("Prog", PROGRAM).map(|unit| unit.to_bytes())))
        .collect();

    for handle in handles {
        let bytes = handle.join().unwrap().unwrap();
        assert_eq!(bytes, expected);
    }
}

#[test]
fn test_concurrent_execution() {
    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(|| run_source(PROGRAM).map(|(_, output)| output)))
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "hello!\n");
    }
}

#[test]
fn test_artifact_survives_serialization() {
    let unit = compile("Prog", PROGRAM).unwrap();
    let restored = CompiledUnit::from_bytes(&unit.to_bytes()).unwrap();
    assert_eq!(restored, unit);
}

#[test]
fn test_corrupt_artifacts_are_rejected() {
    let bytes = compile("Prog", PROGRAM).unwrap().to_bytes();

    for len in [0, 3, 4, bytes.len() / 2, bytes.len() - 1] {
        assert!(
            matches!(VM::load(&bytes[..len]), Err(RuntimeError::Load(_))),
            "prefix of {} bytes was accepted",
            len
        );
    }

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(VM::load(&trailing).is_err());

    let mut bad_magic = bytes;
    bad_magic[0] ^= 0xff;
    assert!(VM::load(&bad_magic).is_err());
}

/// Malformed programs fail with a compile error, never a panic
#[test]
fn test_malformed_input_is_rejected() {
    let cases = [
        ("(", ErrorKind::SyntaxError),
        (")", ErrorKind::SyntaxError),
        ("(def)", ErrorKind::SyntaxError),
        ("(def 1 2)", ErrorKind::SyntaxError),
        ("(if 1 2)", ErrorKind::SyntaxError),
        ("(let [x 1] x)", ErrorKind::SyntaxError),
        ("(cond 1)", ErrorKind::SyntaxError),
        ("(f 1 ]", ErrorKind::SyntaxError),
        ("(1 2)", ErrorKind::SyntaxError),
        ("(defn f [a a] a)", ErrorKind::SyntaxError),
        ("(do (defn g [] 1))", ErrorKind::SyntaxError),
        ("(println #)", ErrorKind::SyntaxError),
        ("\"never closed", ErrorKind::LexicalError),
        ("\"bad \\q escape\"", ErrorKind::LexicalError),
        ("99999999999999999999", ErrorKind::LexicalError),
    ];

    for (source, kind) in cases {
        match run_source(source) {
            Err(PipelineError::Compile(e)) => {
                assert_eq!(e.kind, kind, "wrong error kind for {:?}: {}", source, e)
            }
            other => panic!("{:?} should not compile, got {:?}", source, other),
        }
    }
}

#[test]
fn test_errors_report_position() {
    let Err(PipelineError::Compile(err)) = run_source("(def a 1)\n  (b a)") else {
        panic!("expected compile error");
    };
    assert_eq!(err.kind, ErrorKind::UnresolvedName);
    assert_eq!(err.identifier.as_deref(), Some("b"));
    assert_eq!((err.line(), err.column()), (2, 3));
}

#[test]
fn test_deeply_nested_program_is_a_syntax_error() {
    let depth = compiler::MAX_NESTING_DEPTH;
    let nested = |n: usize| format!("{}nil{}", "(not ".repeat(n), ")".repeat(n));

    assert!(run_source(&nested(depth)).is_ok());
    match run_source(&nested(10_000)) {
        Err(PipelineError::Compile(e)) => assert_eq!(e.kind, ErrorKind::SyntaxError),
        other => panic!("expected syntax error, got {:?}", other),
    }
}
