//! Special forms.
//!
//! These are compiled structurally instead of through the registry: they
//! bind names, open scopes or control evaluation order.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::debug;

use tessel_ir::{Call, Expr, SourceTag};
use tessel_patterns::{Primitive, PrimitiveRef, Value};

use super::error::{arity_mismatch, invalid_define};
use super::{CompileError, Compiler};
use crate::environment::{Binding, ScopeKind};
use crate::primitives::{
    Block, CallFunction, DefineVariable, If, Lambda, ParallelBlock, Store, Variable, While,
};

/// Attribute that makes a `define` constant.
const CONSTANT_ATTRIBUTE: &str = "constant";

impl Compiler<'_> {
    pub(super) fn compile_call(
        &mut self,
        call: &Call,
        tag: SourceTag,
    ) -> Result<Value, CompileError> {
        let args = call.args.as_slice();
        match call.name.as_str() {
            "define" => self.compile_define(call, tag),
            "lambda" => self.compile_lambda(args, tag),
            "block" => self.compile_block(args, tag),
            "if" => self.compile_if(args, tag),
            "while" => self.compile_while(args, tag),
            "parallel_block" => self.compile_parallel_block(args, tag),
            "store" => self.compile_store(args, tag),
            name => match self.env.lookup(name) {
                Some(binding) => self.compile_invocation(name, &binding, args, tag),
                None => {
                    let args: Vec<&Expr> = args.iter().collect();
                    self.compile_pattern(name, &args, tag)
                }
            },
        }
    }

    /// Run `f` inside a new local scope, popping it on every path.
    fn with_scope<T>(
        &mut self,
        kind: ScopeKind,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.env.push_scope(kind);
        let result = f(self);
        self.env.pop_scope();
        result
    }

    /// `define(name, body)`, `define(name, a1..aN, body)` and
    /// `define{constant}(name, body)`.
    fn compile_define(&mut self, call: &Call, tag: SourceTag) -> Result<Value, CompileError> {
        let constant = match call.attribute.as_deref() {
            None => false,
            Some(CONSTANT_ATTRIBUTE) => true,
            Some(other) => {
                return Err(invalid_define(
                    "define",
                    format!("unknown attribute `{other}`"),
                    tag,
                ))
            }
        };
        let [target, rest @ ..] = call.args.as_slice() else {
            return Err(arity_mismatch("define", "2+", call.args.len(), tag));
        };
        let Some((body, params)) = rest.split_last() else {
            return Err(arity_mismatch("define", "2+", call.args.len(), tag));
        };
        let Some(name) = target.as_ident() else {
            return Err(invalid_define(
                "define",
                format!("expected a name, found {}", target.describe()),
                target.tag,
            ));
        };
        let params = parameter_names("define", params)?;

        let level = self.env.level();
        let variable_name = self.next_name("variable", Some(name), tag)?;
        let define_name = self.next_name("define_variable", Some(name), tag)?;
        debug!(
            form = "define",
            name,
            level,
            params = params.len(),
            constant,
            "compiling special form"
        );

        // Bound before the body is compiled, so the body can recurse.
        let variable = Variable::new(variable_name, level, constant);
        let previous = self.env.bind_variable(name, Arc::clone(&variable));
        self.defining.push(Arc::clone(&variable));
        let compiled = if params.is_empty() {
            self.compile_expr(body)
        } else {
            self.compile_function_body(&params, body, Some(name), tag)
        };
        self.defining.pop();
        let body = match compiled {
            Ok(body) => body,
            Err(err) => {
                self.env.restore(name, previous);
                return Err(err);
            }
        };
        variable.set_body(body);

        self.locality
            .names()
            .register(&PrimitiveRef::from_arc(variable.clone()));
        let define = self.register(DefineVariable::new(define_name, Arc::clone(&variable)));
        self.last_define = Some(variable);
        Ok(define)
    }

    /// `lambda(a1..aN, body)`.
    fn compile_lambda(&mut self, args: &[Expr], tag: SourceTag) -> Result<Value, CompileError> {
        let Some((body, params)) = args.split_last() else {
            return Err(arity_mismatch("lambda", "1+", 0, tag));
        };
        let params = parameter_names("lambda", params)?;
        debug!(form = "lambda", params = params.len(), "compiling special form");
        self.compile_function_body(&params, body, None, tag)
    }

    /// A `lambda` node whose body is compiled one function level deeper,
    /// with `params` bound to argument positions.
    fn compile_function_body(
        &mut self,
        params: &[&str],
        body: &Expr,
        instance: Option<&str>,
        tag: SourceTag,
    ) -> Result<Value, CompileError> {
        let name = self.next_name("lambda", instance, tag)?;
        let body = self.with_scope(ScopeKind::Function, |this| {
            for (index, param) in params.iter().enumerate() {
                this.env.bind_argument(param, index);
            }
            this.compile_expr(body)
        })?;
        Ok(self.register(Lambda::new(name, params.len(), body)))
    }

    /// `block(s1..sN)`: statements in a nested scope.
    fn compile_block(&mut self, args: &[Expr], tag: SourceTag) -> Result<Value, CompileError> {
        if args.is_empty() {
            return Err(arity_mismatch("block", "1+", 0, tag));
        }
        let name = self.next_name("block", None, tag)?;
        let statements = self.with_scope(ScopeKind::Block, |this| this.compile_all(args))?;
        Ok(self.register(Block::new(name, statements)))
    }

    /// `if(cond, then)` / `if(cond, then, else)`.
    fn compile_if(&mut self, args: &[Expr], tag: SourceTag) -> Result<Value, CompileError> {
        if !(2..=3).contains(&args.len()) {
            return Err(arity_mismatch("if", "2 or 3", args.len(), tag));
        }
        let name = self.next_name("if", None, tag)?;
        let mut operands = self.compile_all(args)?.into_iter();
        let (Some(condition), Some(then)) = (operands.next(), operands.next()) else {
            return Err(arity_mismatch("if", "2 or 3", args.len(), tag));
        };
        Ok(self.register(If::new(name, condition, then, operands.next())))
    }

    /// `while(cond, body)`.
    fn compile_while(&mut self, args: &[Expr], tag: SourceTag) -> Result<Value, CompileError> {
        let [condition, body] = args else {
            return Err(arity_mismatch("while", "2", args.len(), tag));
        };
        let name = self.next_name("while", None, tag)?;
        let condition = self.compile_expr(condition)?;
        let body = self.compile_expr(body)?;
        Ok(self.register(While::new(name, condition, body)))
    }

    /// `parallel_block(s1..sN)`.
    fn compile_parallel_block(
        &mut self,
        args: &[Expr],
        tag: SourceTag,
    ) -> Result<Value, CompileError> {
        if args.is_empty() {
            return Err(arity_mismatch("parallel_block", "1+", 0, tag));
        }
        let name = self.next_name("parallel_block", None, tag)?;
        let branches = self.compile_all(args)?;
        Ok(self.register(ParallelBlock::new(name, branches)))
    }

    /// `store(target, value)`.
    fn compile_store(&mut self, args: &[Expr], tag: SourceTag) -> Result<Value, CompileError> {
        let [target, value] = args else {
            return Err(arity_mismatch("store", "2", args.len(), tag));
        };
        let name = self.next_name("store", None, tag)?;
        let target = self.compile_expr(target)?;
        let value = self.compile_expr(value)?;
        Ok(self.register(Store::new(name, target, value)))
    }

    /// `f(args...)` where `f` is bound in the environment.
    fn compile_invocation(
        &mut self,
        name: &str,
        binding: &Binding,
        args: &[Expr],
        tag: SourceTag,
    ) -> Result<Value, CompileError> {
        if let Binding::Variable { variable, .. } = binding {
            debug!(
                callee = name,
                variable = %variable.name(),
                argc = args.len(),
                "compiling call"
            );
        }
        let node_name = self.next_name("call_function", Some(name), tag)?;
        let callee = self.compile_ident(name, tag)?;
        let args = self.compile_all(args)?;
        Ok(self.register(CallFunction::new(node_name, callee, args)))
    }
}

/// Parameter names of a `define` or `lambda`: distinct identifiers.
fn parameter_names<'e>(
    form: &'static str,
    params: &'e [Expr],
) -> Result<Vec<&'e str>, CompileError> {
    let mut seen = FxHashSet::default();
    params
        .iter()
        .map(|param| {
            let Some(name) = param.as_ident() else {
                return Err(invalid_define(
                    form,
                    format!("parameters must be names, found {}", param.describe()),
                    param.tag,
                ));
            };
            if !seen.insert(name) {
                return Err(invalid_define(
                    form,
                    format!("parameter `{name}` is given twice"),
                    param.tag,
                ));
            }
            Ok(name)
        })
        .collect()
}
