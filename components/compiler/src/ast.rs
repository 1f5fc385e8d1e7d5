//! Abstract Syntax Tree node definitions

use core_types::SourcePosition;
use std::fmt;

/// Identity of a node: the char offset of its first token
pub type NodeId = usize;

/// Literal value of a constant, tagged with its runtime kind
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// String
    Str(String),
    /// Boolean
    Bool(bool),
    /// nil
    Nil,
}

/// Haruko expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant
    Const {
        /// Literal value
        value: ConstValue,
        /// Source location
        position: SourcePosition,
    },

    /// Variable or function reference
    Sym {
        /// Referenced name
        name: String,
        /// Source location
        position: SourcePosition,
    },

    /// `(def name value)`
    Def {
        /// Bound name
        name: String,
        /// Bound value
        value: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `(defn name [params...] body)`
    Defn {
        /// Function name
        name: String,
        /// Parameter names
        params: Vec<String>,
        /// Function body
        body: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `(let name binding body)`
    Let {
        /// Bound name
        name: String,
        /// Value bound to the name
        binding: Box<Expression>,
        /// Expression evaluated with the binding in scope
        body: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `(if condition then else)`
    If {
        /// Condition
        condition: Box<Expression>,
        /// Evaluated when the condition is truthy
        then_branch: Box<Expression>,
        /// Evaluated when the condition is falsy
        else_branch: Box<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `(do exprs...)`
    Do {
        /// Expressions evaluated in order
        body: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `(cond test consequent ...)`
    Cond {
        /// Test/consequent pairs
        clauses: Vec<CondClause>,
        /// Source location
        position: SourcePosition,
    },

    /// `(callee args...)`
    FnCall {
        /// Called name
        callee: String,
        /// Arguments
        args: Vec<Expression>,
        /// Source location
        position: SourcePosition,
    },

    /// `(-> first steps...)`
    Compose {
        /// Initial value
        first: Box<Expression>,
        /// Functions applied left to right
        steps: Vec<ComposeStep>,
        /// Source location
        position: SourcePosition,
    },
}

/// One `test consequent` pair of a `cond`
#[derive(Debug, Clone, PartialEq)]
pub struct CondClause {
    /// Test expression
    pub test: Expression,
    /// Evaluated when the test is truthy
    pub consequent: Expression,
}

/// One function applied by `->`
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeStep {
    /// Called name
    pub callee: String,
    /// Source location
    pub position: SourcePosition,
}

impl ComposeStep {
    /// Node identity of this step
    pub fn id(&self) -> NodeId {
        self.position.offset
    }
}

impl Expression {
    /// Source location of the node's first token
    pub fn position(&self) -> SourcePosition {
        match self {
            Expression::Const { position, .. }
            | Expression::Sym { position, .. }
            | Expression::Def { position, .. }
            | Expression::Defn { position, .. }
            | Expression::Let { position, .. }
            | Expression::If { position, .. }
            | Expression::Do { position, .. }
            | Expression::Cond { position, .. }
            | Expression::FnCall { position, .. }
            | Expression::Compose { position, .. } => *position,
        }
    }

    /// Node identity used as the resolver's side-table key
    pub fn id(&self) -> NodeId {
        self.position().offset
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Long(n) => write!(f, "{}", n),
            // Plain decimal with a fraction part so the lexer reads it back as a double
            ConstValue::Double(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{:.1}", n),
            ConstValue::Double(n) => write!(f, "{}", n),
            ConstValue::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Nil => f.write_str("nil"),
        }
    }
}

fn write_spaced(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for item in items {
        write!(f, " {}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Const { value, .. } => write!(f, "{}", value),
            Expression::Sym { name, .. } => f.write_str(name),
            Expression::Def { name, value, .. } => write!(f, "(def {} {})", name, value),
            Expression::Defn {
                name, params, body, ..
            } => write!(f, "(defn {} [{}] {})", name, params.join(" "), body),
            Expression::Let {
                name,
                binding,
                body,
                ..
            } => write!(f, "(let {} {} {})", name, binding, body),
            Expression::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => write!(f, "(if {} {} {})", condition, then_branch, else_branch),
            Expression::Do { body, .. } => {
                f.write_str("(do")?;
                write_spaced(f, body)?;
                f.write_str(")")
            }
            Expression::Cond { clauses, .. } => {
                f.write_str("(cond")?;
                for clause in clauses {
                    write!(f, " {} {}", clause.test, clause.consequent)?;
                }
                f.write_str(")")
            }
            Expression::FnCall { callee, args, .. } => {
                write!(f, "({}", callee)?;
                write_spaced(f, args)?;
                f.write_str(")")
            }
            Expression::Compose { first, steps, .. } => {
                write!(f, "(-> {}", first)?;
                for step in steps {
                    write!(f, " {}", step.callee)?;
                }
                f.write_str(")")
            }
        }
    }
}
