//! Haruko Compiler Component
//!
//! Provides the lexer, parser, AST, scope resolution and bytecode generation
//! for the Haruko language.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes Haruko source code
//! - [`Token`] - Tokens with lexeme, literal value and source position
//! - [`Parser`] - Recursive descent parser producing an [`Expression`] tree
//! - [`ScopeResolver`] - Resolves every name to a local slot, global or function
//! - [`CodeGenerator`] - Converts the resolved tree into a [`CompiledUnit`]
//!
//! # Example
//!
//! ```
//! use compiler::compile;
//!
//! let unit = compile("Demo", "(defn sq [x] (* x x)) (sq 12)").unwrap();
//! assert_eq!(unit.name, "Demo");
//! assert_eq!(unit.methods.len(), 1);
//!
//! let bytes = unit.to_bytes();
//! assert_eq!(&bytes[..4], b"HRKU");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod bytecode_gen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod scope;

pub use ast::{ComposeStep, CondClause, ConstValue, Expression, NodeId};
pub use bytecode_gen::{CodeGenerator, ENTRY_METHOD};
pub use bytecode_system::CompiledUnit;
pub use core_types::{CompileError, ErrorKind};
pub use lexer::{Lexeme, Lexer, Literal, Token};
pub use parser::{Parser, MAX_NESTING_DEPTH};
pub use scope::{Binding, Callee, Environment, FunctionSig, Resolution, ScopeKind, ScopeResolver};

use tracing::{debug, info_span};

/// Parse `source` into a single top-level `Do` expression
pub fn parse(source: &str) -> Result<Expression, CompileError> {
    let tokens = {
        let span = info_span!("compile.lex");
        let _enter = span.enter();
        let tokens = Lexer::new(source).tokenize()?;
        debug!(tokens = tokens.len(), "tokenized source");
        tokens
    };

    let span = info_span!("compile.parse");
    let _enter = span.enter();
    let program = Parser::new(tokens).parse()?;
    if let Expression::Do { body, .. } = &program {
        debug!(forms = body.len(), "parsed top-level forms");
    }
    Ok(program)
}

/// Compile `source` into a unit named `unit_name`.
///
/// Runs lexing, parsing, scope resolution and code generation. Fails fast on
/// the first error; no partial unit is produced.
pub fn compile(unit_name: &str, source: &str) -> Result<CompiledUnit, CompileError> {
    let program = parse(source)?;

    let resolution = {
        let span = info_span!("compile.resolve", unit = unit_name);
        let _enter = span.enter();
        let resolution = ScopeResolver::resolve(&program)?;
        debug!(
            functions = resolution.functions().len(),
            "resolved names"
        );
        resolution
    };

    let span = info_span!("compile.codegen", unit = unit_name);
    let _enter = span.enter();
    let unit = CodeGenerator::new(&resolution).generate(unit_name, &program)?;
    debug!(
        methods = unit.methods.len(),
        constants = unit.constants.len(),
        entry_instructions = unit.entry.instruction_count(),
        "generated unit"
    );
    Ok(unit)
}
