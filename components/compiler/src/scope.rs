//! Scope resolution for Haruko AST
//!
//! Resolution does not touch the tree. It produces a [`Resolution`] side
//! table keyed by [`NodeId`] that the code generator reads.

use crate::ast::*;
use crate::error::*;
use bytecode_system::{Builtin, LocalSlot};
use core_types::{CompileError, SourcePosition};
use std::collections::HashMap;

/// Kind of a lexical scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Program body
    Global,
    /// `defn` body; parameters occupy the first slots
    Function,
    /// `let`, nested `do` and `cond` consequents
    Block,
}

/// Where a name lives at runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Local slot of the current method
    Local(LocalSlot),
    /// Named global
    Global(String),
    /// Method of the unit's function table
    Function(u16),
}

/// Target of a call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    /// User function by table index
    Function(u16),
    /// Builtin operator
    Builtin(Builtin),
}

/// Entry of the function table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSig {
    /// Function name
    pub name: String,
    /// Number of parameters
    pub arity: u8,
}

/// Resolver output consumed by the code generator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    bindings: HashMap<NodeId, Binding>,
    callees: HashMap<NodeId, Callee>,
    functions: Vec<FunctionSig>,
}

impl Resolution {
    /// Binding of a `Sym`, or the binding introduced by a `Def`/`Defn`/`Let`
    pub fn binding(&self, id: NodeId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    /// Target of a `FnCall` or compose step
    pub fn callee(&self, id: NodeId) -> Option<Callee> {
        self.callees.get(&id).copied()
    }

    /// Function table in declaration order
    pub fn functions(&self) -> &[FunctionSig] {
        &self.functions
    }
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    names: HashMap<String, Binding>,
    /// First free slot when the scope was entered
    saved_next_slot: u16,
}

/// Stack of lexical scopes with local slot allocation
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    next_slot: u16,
}

impl Environment {
    /// Create an environment holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                names: HashMap::new(),
                saved_next_slot: 0,
            }],
            next_slot: 0,
        }
    }

    /// Enter a scope. A function scope starts a fresh slot numbering.
    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            names: HashMap::new(),
            saved_next_slot: self.next_slot,
        });
        if kind == ScopeKind::Function {
            self.next_slot = 0;
        }
    }

    /// Leave the innermost scope, retiring its slots. The global scope stays.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            if let Some(scope) = self.scopes.pop() {
                self.next_slot = scope.saved_next_slot;
            }
        }
    }

    /// Number of scopes on the stack
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Kind of the innermost scope
    pub fn innermost_kind(&self) -> ScopeKind {
        self.scopes
            .last()
            .map(|s| s.kind)
            .unwrap_or(ScopeKind::Global)
    }

    /// Bind `name` to a local slot in the innermost scope.
    ///
    /// Rebinding a name already local to that scope reuses its slot.
    pub fn declare_local(
        &mut self,
        name: &str,
        position: SourcePosition,
    ) -> Result<LocalSlot, CompileError> {
        let next_slot = self.next_slot;
        let scope = self.innermost_mut();
        if let Some(Binding::Local(slot)) = scope.names.get(name) {
            return Ok(*slot);
        }

        let slot = LocalSlot(next_slot);
        scope.names.insert(name.to_string(), Binding::Local(slot));
        self.next_slot = next_slot
            .checked_add(1)
            .ok_or_else(|| invariant_violation("Too many local variables in one method", position))?;
        Ok(slot)
    }

    /// Bind `name` in the innermost scope: a global at the top level, a local elsewhere
    pub fn define(&mut self, name: &str, position: SourcePosition) -> Result<Binding, CompileError> {
        if self.innermost_kind() == ScopeKind::Global {
            let binding = Binding::Global(name.to_string());
            self.innermost_mut()
                .names
                .insert(name.to_string(), binding.clone());
            Ok(binding)
        } else {
            self.declare_local(name, position).map(Binding::Local)
        }
    }

    /// Look `name` up from the innermost scope outwards
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|s| s.names.get(name))
    }

    fn innermost_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-pass scope resolver
pub struct ScopeResolver {
    env: Environment,
    resolution: Resolution,
    function_index: HashMap<String, u16>,
    /// Top-level `defn` nodes and their table index
    defn_nodes: HashMap<NodeId, u16>,
}

impl ScopeResolver {
    /// Resolve every name in `program`.
    ///
    /// The program's top node is the global scope; when it is a `Do`, each of
    /// its forms is a top-level form.
    pub fn resolve(program: &Expression) -> Result<Resolution, CompileError> {
        let mut resolver = ScopeResolver {
            env: Environment::new(),
            resolution: Resolution::default(),
            function_index: HashMap::new(),
            defn_nodes: HashMap::new(),
        };

        let top_level = match program {
            Expression::Do { body, .. } => body.as_slice(),
            other => std::slice::from_ref(other),
        };

        for form in top_level {
            resolver.collect_function(form)?;
        }
        for form in top_level {
            resolver.visit(form)?;
        }

        Ok(resolver.resolution)
    }

    /// Pass 1: register a top-level `defn` in the function table
    fn collect_function(&mut self, form: &Expression) -> Result<(), CompileError> {
        let Expression::Defn { name, params, .. } = form else {
            return Ok(());
        };

        if Builtin::from_name(name).is_some() {
            return Err(syntax_error(
                format!("Cannot redefine builtin '{}'", name),
                form.position(),
            ));
        }
        if self.function_index.contains_key(name) {
            return Err(syntax_error(
                format!("Duplicate function definition '{}'", name),
                form.position(),
            ));
        }

        let index = u16::try_from(self.resolution.functions.len())
            .map_err(|_| syntax_error("Too many functions in one unit", form.position()))?;
        let arity = u8::try_from(params.len()).map_err(|_| {
            syntax_error(
                format!("'{}' has more than {} parameters", name, u8::MAX),
                form.position(),
            )
        })?;

        self.resolution.functions.push(FunctionSig {
            name: name.clone(),
            arity,
        });
        self.function_index.insert(name.clone(), index);
        self.defn_nodes.insert(form.id(), index);
        Ok(())
    }

    /// Pass 2: depth-first resolution
    fn visit(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::Const { .. } => {}

            Expression::Sym { name, position } => {
                let binding = match self.env.lookup(name) {
                    Some(binding) => binding.clone(),
                    None => match self.function_index.get(name) {
                        Some(&index) => Binding::Function(index),
                        None => return Err(unresolved_name(name, *position)),
                    },
                };
                self.resolution.bindings.insert(expr.id(), binding);
            }

            Expression::Def {
                name,
                value,
                position,
            } => {
                self.visit(value)?;
                let binding = self.env.define(name, *position)?;
                self.resolution.bindings.insert(expr.id(), binding);
            }

            Expression::Defn {
                params,
                body,
                position,
                ..
            } => {
                let index = *self.defn_nodes.get(&expr.id()).ok_or_else(|| {
                    syntax_error("'defn' is only allowed at the top level", *position)
                })?;
                self.resolution
                    .bindings
                    .insert(expr.id(), Binding::Function(index));

                self.env.push_scope(ScopeKind::Function);
                for param in params {
                    self.env.declare_local(param, *position)?;
                }
                self.visit(body)?;
                self.env.pop_scope();
            }

            Expression::Let {
                name,
                binding,
                body,
                position,
            } => {
                self.visit(binding)?;
                self.env.push_scope(ScopeKind::Block);
                let slot = self.env.declare_local(name, *position)?;
                self.resolution
                    .bindings
                    .insert(expr.id(), Binding::Local(slot));
                self.visit(body)?;
                self.env.pop_scope();
            }

            Expression::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.visit(condition)?;
                self.visit(then_branch)?;
                self.visit(else_branch)?;
            }

            Expression::Do { body, .. } => {
                self.env.push_scope(ScopeKind::Block);
                for e in body {
                    self.visit(e)?;
                }
                self.env.pop_scope();
            }

            Expression::Cond { clauses, .. } => {
                for clause in clauses {
                    self.visit(&clause.test)?;
                    self.env.push_scope(ScopeKind::Block);
                    self.visit(&clause.consequent)?;
                    self.env.pop_scope();
                }
            }

            Expression::FnCall {
                callee,
                args,
                position,
            } => {
                let target = self.resolve_callee(callee, args.len(), *position)?;
                self.resolution.callees.insert(expr.id(), target);
                for arg in args {
                    self.visit(arg)?;
                }
            }

            Expression::Compose { first, steps, .. } => {
                self.visit(first)?;
                for step in steps {
                    let target = self.resolve_callee(&step.callee, 1, step.position)?;
                    self.resolution.callees.insert(step.id(), target);
                }
            }
        }
        Ok(())
    }

    fn resolve_callee(
        &self,
        name: &str,
        argc: usize,
        position: SourcePosition,
    ) -> Result<Callee, CompileError> {
        if let Some(builtin) = Builtin::from_name(name) {
            let arity = builtin.arity() as usize;
            if argc != arity {
                return Err(arity_mismatch(name, arity, argc, position));
            }
            return Ok(Callee::Builtin(builtin));
        }

        if let Some(&index) = self.function_index.get(name) {
            let arity = self.resolution.functions[index as usize].arity as usize;
            if argc != arity {
                return Err(arity_mismatch(name, arity, argc, position));
            }
            return Ok(Callee::Function(index));
        }

        match self.env.lookup(name) {
            Some(_) => Err(not_a_function(name, position)),
            None => Err(unresolved_name(name, position)),
        }
    }
}
