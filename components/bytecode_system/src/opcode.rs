//! Bytecode opcodes for the Haruko stack machine
//!
//! Every opcode has a fixed stack effect, which the code generator uses to
//! compute the maximum operand-stack depth of a method body.

use std::fmt;

/// Local variable slot index within a method body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalSlot(pub u16);

/// Primitive operations provided by the executor.
///
/// Builtins are called by name from source code and compile to
/// [`Opcode::CallBuiltin`] rather than to a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `println`
    Println,
}

impl Builtin {
    /// All builtins, in tag order
    pub const ALL: [Builtin; 14] = [
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Less,
        Builtin::LessEqual,
        Builtin::Greater,
        Builtin::GreaterEqual,
        Builtin::Equal,
        Builtin::NotEqual,
        Builtin::And,
        Builtin::Or,
        Builtin::Not,
        Builtin::Println,
    ];

    /// Source-level name of the builtin
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Less => "<",
            Builtin::LessEqual => "<=",
            Builtin::Greater => ">",
            Builtin::GreaterEqual => ">=",
            Builtin::Equal => "=",
            Builtin::NotEqual => "!=",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Not => "not",
            Builtin::Println => "println",
        }
    }

    /// Look up a builtin by its source-level name
    pub fn from_name(name: &str) -> Option<Builtin> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Number of arguments the builtin takes
    pub fn arity(self) -> u8 {
        match self {
            Builtin::Not | Builtin::Println => 1,
            _ => 2,
        }
    }

    /// Binary tag of the builtin
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Builtin for a binary tag
    pub fn from_tag(tag: u8) -> Option<Builtin> {
        Self::ALL.get(tag as usize).copied()
    }
}

/// Bytecode opcodes for Haruko execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // Literals
    /// Push nil
    PushNil,
    /// Push boolean true
    PushTrue,
    /// Push boolean false
    PushFalse,
    /// Push a small integer encoded inline, as a long
    PushShort(i16),
    /// Push the constant pool entry at the given index
    LoadConst(u16),

    // Variables
    /// Load local variable from slot
    LoadLocal(LocalSlot),
    /// Pop into local variable slot
    StoreLocal(LocalSlot),
    /// Load global; operand is the pool index of the global's name
    LoadGlobal(u16),
    /// Pop into global; operand is the pool index of the global's name
    StoreGlobal(u16),
    /// Push a reference to the method at the given index
    LoadFunction(u16),

    // Stack manipulation
    /// Duplicate top value on stack
    Dup,
    /// Discard top value on stack
    Pop,

    // Control flow
    /// Unconditional jump to instruction index
    Jump(u32),
    /// Pop; jump to instruction index if the value is falsy
    JumpIfFalse(u32),
    /// Return top of stack from current method
    Return,

    // Calls
    /// Invoke method at index with the given number of arguments
    Invoke(u16, u8),
    /// Call a builtin with the given number of arguments
    CallBuiltin(Builtin, u8),
}

impl Opcode {
    /// Values popped and pushed by this opcode, as `(pops, pushes)`
    pub fn stack_effect(&self) -> (u16, u16) {
        match self {
            Opcode::PushNil
            | Opcode::PushTrue
            | Opcode::PushFalse
            | Opcode::PushShort(_)
            | Opcode::LoadConst(_)
            | Opcode::LoadLocal(_)
            | Opcode::LoadGlobal(_)
            | Opcode::LoadFunction(_) => (0, 1),
            Opcode::StoreLocal(_) | Opcode::StoreGlobal(_) | Opcode::Pop => (1, 0),
            Opcode::Dup => (1, 2),
            Opcode::Jump(_) => (0, 0),
            Opcode::JumpIfFalse(_) => (1, 0),
            Opcode::Return => (1, 0),
            Opcode::Invoke(_, argc) | Opcode::CallBuiltin(_, argc) => (*argc as u16, 1),
        }
    }

    /// Check if this opcode ends a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Return | Opcode::Jump(_) | Opcode::JumpIfFalse(_)
        )
    }

    /// Jump target, if this opcode is a branch
    pub fn jump_target(&self) -> Option<u32> {
        match self {
            Opcode::Jump(target) | Opcode::JumpIfFalse(target) => Some(*target),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::PushNil => write!(f, "PushNil"),
            Opcode::PushTrue => write!(f, "PushTrue"),
            Opcode::PushFalse => write!(f, "PushFalse"),
            Opcode::PushShort(n) => write!(f, "PushShort {}", n),
            Opcode::LoadConst(idx) => write!(f, "LoadConst #{}", idx),
            Opcode::LoadLocal(slot) => write!(f, "LoadLocal {}", slot.0),
            Opcode::StoreLocal(slot) => write!(f, "StoreLocal {}", slot.0),
            Opcode::LoadGlobal(idx) => write!(f, "LoadGlobal #{}", idx),
            Opcode::StoreGlobal(idx) => write!(f, "StoreGlobal #{}", idx),
            Opcode::LoadFunction(idx) => write!(f, "LoadFunction @{}", idx),
            Opcode::Dup => write!(f, "Dup"),
            Opcode::Pop => write!(f, "Pop"),
            Opcode::Jump(target) => write!(f, "Jump {:04}", target),
            Opcode::JumpIfFalse(target) => write!(f, "JumpIfFalse {:04}", target),
            Opcode::Return => write!(f, "Return"),
            Opcode::Invoke(idx, argc) => write!(f, "Invoke @{} ({})", idx, argc),
            Opcode::CallBuiltin(builtin, argc) => {
                write!(f, "CallBuiltin {} ({})", builtin.name(), argc)
            }
        }
    }
}
