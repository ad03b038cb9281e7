//! Shared fixtures for unit tests.

use std::sync::Arc;

use tessel_ir::{BinaryOp, Expr};
use tessel_patterns::{EvalResult, Locality, PatternRegistry, PrimitiveName};

use crate::catalogue::core_registry;
use crate::compiled::CompiledFunction;
use crate::compiler::{CompileError, Compiler};
use crate::environment::SharedGlobals;

pub fn name(primitive: &str, sequence: u64) -> PrimitiveName {
    PrimitiveName::new(0, primitive, sequence, 1, -1)
}

pub fn id(name: &str) -> Expr {
    Expr::ident(name)
}

pub fn int(value: i64) -> Expr {
    Expr::int(value)
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args)
}

pub fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::binary(op, left, right)
}

/// A core registry and a global table shared by successive compilations,
/// the way a REPL session uses them.
pub struct Harness {
    registry: PatternRegistry,
    globals: SharedGlobals,
    locality: Arc<Locality>,
    compile_id: u64,
}

impl Harness {
    pub fn new() -> Self {
        Harness {
            registry: core_registry().unwrap(),
            globals: SharedGlobals::new(),
            locality: Locality::single(),
            compile_id: 0,
        }
    }

    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    pub fn compile(&mut self, exprs: Vec<Expr>) -> Result<CompiledFunction, CompileError> {
        self.compile_id += 1;
        Compiler::new(
            &self.registry,
            self.globals.clone(),
            Arc::clone(&self.locality),
            self.compile_id,
        )
        .compile_function(&exprs)
    }

    pub async fn eval(&mut self, exprs: Vec<Expr>) -> EvalResult {
        self.compile(exprs).unwrap().run().await
    }
}
