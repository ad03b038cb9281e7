//! Expression tree to execution tree.
//!
//! The compiler walks an [`Expr`] tree once, resolving every identifier
//! against the [`Environment`] and every generic call against the
//! [`PatternRegistry`]. Special forms (`define`, `lambda`, `block`, `if`,
//! `while`, `parallel_block`, `store`) are handled structurally in
//! [`forms`]; everything else is a registry lookup by name and arity.
//!
//! Every node gets a [`PrimitiveName`] built from the locality, the node
//! type, a per-type sequence number, the compile id and the source tag, and
//! is registered with the locality's name registry. Sequence numbers are
//! counted per compiler, so identical input compiled with the same compile
//! id yields identical names on every locality.

mod error;
mod forms;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use tessel_ir::{Expr, ExprKind, Literal, SourceTag};
use tessel_patterns::{Locality, Lookup, PatternRegistry, PrimitiveName, PrimitiveRef, Value};

use crate::compiled::CompiledFunction;
use crate::environment::{Binding, Environment, SharedGlobals};
use crate::primitives::{AccessArgument, AccessVariable, Block, Constant, Variable};
use crate::stack::ensure_sufficient_stack;

pub use error::CompileError;
use error::{arity_mismatch, invalid_define};

/// Translates expression trees for one compilation unit.
pub struct Compiler<'r> {
    registry: &'r PatternRegistry,
    env: Environment,
    locality: Arc<Locality>,
    compile_id: u64,
    sequences: FxHashMap<String, u64>,
    /// Variables whose definitions are being compiled, innermost last.
    defining: Vec<Arc<Variable>>,
    /// Variable bound by the most recent `define`.
    last_define: Option<Arc<Variable>>,
    /// Variable bound by the last top-level statement, if it was a `define`.
    entry: Option<Arc<Variable>>,
}

impl<'r> Compiler<'r> {
    pub fn new(
        registry: &'r PatternRegistry,
        globals: SharedGlobals,
        locality: Arc<Locality>,
        compile_id: u64,
    ) -> Self {
        Compiler {
            registry,
            env: Environment::new(globals),
            locality,
            compile_id,
            sequences: FxHashMap::default(),
            defining: Vec::new(),
            last_define: None,
            entry: None,
        }
    }

    #[inline]
    pub fn compile_id(&self) -> u64 {
        self.compile_id
    }

    /// Compile top-level statements into one tree.
    ///
    /// Several statements form an implicit block evaluated in the global
    /// scope; a single statement is its own root.
    pub fn compile(&mut self, exprs: &[Expr]) -> Result<PrimitiveRef, CompileError> {
        let Some(first) = exprs.first() else {
            return Err(arity_mismatch("block", "1+", 0, SourceTag::UNKNOWN));
        };
        debug!(
            compile_id = self.compile_id,
            locality = self.locality.id(),
            statements = exprs.len(),
            "compiling"
        );

        let mut statements = Vec::with_capacity(exprs.len());
        for expr in exprs {
            self.last_define = None;
            statements.push(self.compile_expr(expr)?);
            self.entry = if is_define(expr) {
                self.last_define.take()
            } else {
                None
            };
        }

        if let [statement] = statements.as_slice() {
            return self.node_for(statement.clone(), first.tag);
        }
        let name = self.next_name("block", None, first.tag)?;
        let block = self.register(Block::new(name, statements));
        self.node_for(block, first.tag)
    }

    /// Compile top-level statements into a [`CompiledFunction`].
    pub fn compile_function(mut self, exprs: &[Expr]) -> Result<CompiledFunction, CompileError> {
        let root = self.compile(exprs)?;
        let entry = self
            .entry
            .take()
            .map(|variable| PrimitiveRef::from_arc(variable));
        Ok(CompiledFunction::new(root, entry, Arc::clone(&self.locality)))
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<Value, CompileError> {
        ensure_sufficient_stack(|| self.compile_kind(expr))
    }

    fn compile_kind(&mut self, expr: &Expr) -> Result<Value, CompileError> {
        let tag = expr.tag;
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::Ident(name) => self.compile_ident(name, tag),
            ExprKind::Unary { op, operand } => {
                self.compile_pattern(op.pattern_name(), &[operand.as_ref()], tag)
            }
            ExprKind::Binary { op, left, right } => {
                self.compile_pattern(op.pattern_name(), &[left.as_ref(), right.as_ref()], tag)
            }
            ExprKind::List(items) => {
                let items: Vec<&Expr> = items.iter().collect();
                self.compile_pattern("list", &items, tag)
            }
            ExprKind::Call(call) => self.compile_call(call, tag),
        }
    }

    fn compile_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, CompileError> {
        exprs.iter().map(|e| self.compile_expr(e)).collect()
    }

    /// An identifier: a parameter or a variable, `depth` levels up.
    fn compile_ident(&mut self, name: &str, tag: SourceTag) -> Result<Value, CompileError> {
        let Some(binding) = self.env.lookup(name) else {
            return Err(CompileError::UndefinedIdentifier {
                name: name.to_string(),
                tag,
            });
        };
        let depth = self.env.depth_of(&binding);
        match binding {
            Binding::Argument { index, .. } => {
                let node_name = self.next_name("access_argument", Some(name), tag)?;
                Ok(self.register(AccessArgument::new(node_name, index, depth)))
            }
            Binding::Variable { variable, level } => {
                let recursive = self.defining.iter().any(|v| Arc::ptr_eq(v, &variable));
                if recursive && level == self.env.level() {
                    return Err(invalid_define(
                        "define",
                        format!("`{name}` refers to itself outside a function body"),
                        tag,
                    ));
                }
                let node_name = self.next_name("access_variable", Some(name), tag)?;
                Ok(self.register(AccessVariable::new(node_name, &variable, depth, recursive)))
            }
        }
    }

    /// A generic call resolved through the registry.
    fn compile_pattern(
        &mut self,
        name: &str,
        args: &[&Expr],
        tag: SourceTag,
    ) -> Result<Value, CompileError> {
        let registry = self.registry;
        let entry = match registry.lookup(name, args.len()) {
            Lookup::Found(entry) => entry,
            Lookup::ArityMismatch { accepted } => {
                let expected: Vec<String> = accepted.iter().map(ToString::to_string).collect();
                return Err(arity_mismatch(name, expected.join(" or "), args.len(), tag));
            }
            Lookup::Unknown => {
                return Err(CompileError::UnknownPrimitive {
                    name: name.to_string(),
                    tag,
                })
            }
        };
        let operands = args
            .iter()
            .map(|arg| self.compile_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let node_name = self.next_name(name, None, tag)?;
        let node = (entry.factory)(operands, node_name);
        self.locality.names().register(&node);
        Ok(Value::primitive(node))
    }

    /// The next name for a node of type `primitive`.
    fn next_name(
        &mut self,
        primitive: &str,
        instance: Option<&str>,
        tag: SourceTag,
    ) -> Result<PrimitiveName, CompileError> {
        let counter = self.sequences.entry(primitive.to_string()).or_insert(0);
        let sequence = *counter;
        *counter += 1;

        let mut name = PrimitiveName::new(
            self.locality.id(),
            primitive,
            sequence,
            self.compile_id,
            tag.line,
        );
        if let Some(column) = tag.column {
            name = name.with_tag2(column);
        }
        if let Some(instance) = instance {
            name = name.with_instance(instance);
        }
        name.validate()
            .map_err(|source| CompileError::Malformed { source, tag })?;
        Ok(name)
    }

    /// Wrap `node` and make it resolvable by name.
    fn register<P: tessel_patterns::Primitive + 'static>(&self, node: P) -> Value {
        let node = PrimitiveRef::new(node);
        self.locality.names().register(&node);
        Value::primitive(node)
    }

    /// A root node for `value`; literals become constants.
    fn node_for(&mut self, value: Value, tag: SourceTag) -> Result<PrimitiveRef, CompileError> {
        match value {
            Value::Primitive(node) => Ok(node),
            literal => {
                let name = self.next_name("constant", None, tag)?;
                let node = PrimitiveRef::new(Constant::new(name, literal));
                self.locality.names().register(&node);
                Ok(node)
            }
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::nil(),
        Literal::Bool(b) => Value::bool(*b),
        Literal::Int(i) => Value::int(*i),
        Literal::Float(f) => Value::float(*f),
        Literal::Str(s) => Value::string(s.as_str()),
    }
}

fn is_define(expr: &Expr) -> bool {
    expr.as_call().is_some_and(|call| call.name == "define")
}
