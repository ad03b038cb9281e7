//! The core catalogue.
//!
//! Operators, list operations, annotations and locality queries, registered
//! through the same `(signature, factory, help)` interface an external
//! catalogue uses. Every entry builds a [`BuiltinPrimitive`]: it evaluates
//! its operands concurrently, then applies the operation.

mod annotate;
mod arithmetic;
mod lists;

use std::sync::Arc;

use futures_util::future::FutureExt;
use tracing::{debug, trace};

use tessel_patterns::errors::{too_few_args, wrong_arg_count};
use tessel_patterns::{
    evaluate_operands, EvalContext, EvalError, EvalFuture, EvalResult, PatternRegistry,
    Primitive, PrimitiveName, PrimitiveRef, SignatureError, Value,
};

/// Operation performed by a catalogue node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    // Logic
    And,
    Or,
    Not,
    // Lists
    List,
    Range,
    Len,
    Filter,
    Map,
    FoldLeft,
    FoldRight,
    // Annotations
    Annotate,
    AnnotateD,
    Annotation,
    TilingExtent,
    // Localities
    Locality,
    NumLocalities,
    Debug,
}

impl Builtin {
    /// Surface name, for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Mod => "%",
            Builtin::Neg => "unary -",
            Builtin::Lt => "<",
            Builtin::Le => "<=",
            Builtin::Gt => ">",
            Builtin::Ge => ">=",
            Builtin::Eq => "==",
            Builtin::Ne => "!=",
            Builtin::And => "&&",
            Builtin::Or => "||",
            Builtin::Not => "!",
            Builtin::List => "list",
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Filter => "filter",
            Builtin::Map => "map",
            Builtin::FoldLeft => "fold_left",
            Builtin::FoldRight => "fold_right",
            Builtin::Annotate => "annotate",
            Builtin::AnnotateD => "annotate_d",
            Builtin::Annotation => "annotation",
            Builtin::TilingExtent => "tiling_extent",
            Builtin::Locality => "locality",
            Builtin::NumLocalities => "num_localities",
            Builtin::Debug => "debug",
        }
    }

    /// Build a node performing this operation.
    pub fn node(self, operands: Vec<Value>, name: PrimitiveName) -> PrimitiveRef {
        PrimitiveRef::new(BuiltinPrimitive {
            name,
            builtin: self,
            operands,
        })
    }

    async fn apply(
        self,
        node: &PrimitiveName,
        args: Vec<Value>,
        ctx: &EvalContext,
    ) -> EvalResult {
        match self {
            Builtin::Add | Builtin::Sub | Builtin::Mul | Builtin::Div | Builtin::Mod => {
                let [lhs, rhs] = self.exact(args)?;
                arithmetic::arithmetic(self, &lhs, &rhs)
            }
            Builtin::Lt | Builtin::Le | Builtin::Gt | Builtin::Ge | Builtin::Eq | Builtin::Ne => {
                let [lhs, rhs] = self.exact(args)?;
                arithmetic::comparison(self, &lhs, &rhs)
            }
            Builtin::And | Builtin::Or => {
                let [lhs, rhs] = self.exact(args)?;
                Ok(arithmetic::logic(self, &lhs, &rhs))
            }
            Builtin::Neg => {
                let [operand] = self.exact(args)?;
                arithmetic::negate(&operand)
            }
            Builtin::Not => {
                let [operand] = self.exact(args)?;
                Ok(arithmetic::not(&operand))
            }
            Builtin::List => Ok(Value::list(args)),
            Builtin::Range => lists::range(&args),
            Builtin::Len => {
                let [value] = self.exact(args)?;
                lists::len(&value)
            }
            Builtin::Filter => {
                let [function, list] = self.exact(args)?;
                lists::filter(&function, &list, ctx).await
            }
            Builtin::Map => {
                let [function, list] = self.exact(args)?;
                lists::map(&function, &list, ctx).await
            }
            Builtin::FoldLeft => {
                let [function, init, list] = self.exact(args)?;
                lists::fold_left(&function, init, &list, ctx).await
            }
            Builtin::FoldRight => {
                let [function, init, list] = self.exact(args)?;
                lists::fold_right(&function, init, &list, ctx).await
            }
            Builtin::Annotate => {
                let got = args.len();
                let mut args = args.into_iter();
                let (Some(target), Some(key)) = (args.next(), args.next()) else {
                    return Err(too_few_args(self.symbol(), 2, got));
                };
                annotate::annotate(node, None, target, &key, args.collect(), ctx).await
            }
            Builtin::AnnotateD => {
                let got = args.len();
                let mut args = args.into_iter();
                let (Some(target), Some(basename), Some(key)) =
                    (args.next(), args.next(), args.next())
                else {
                    return Err(too_few_args(self.symbol(), 3, got));
                };
                let payload = args.collect();
                annotate::annotate(node, Some(&basename), target, &key, payload, ctx).await
            }
            Builtin::Annotation => match args.as_slice() {
                [value] => Ok(annotate::all_annotations(value)),
                [value, key] => annotate::annotation(value, key),
                _ => Err(wrong_arg_count(self.symbol(), 1, args.len())),
            },
            Builtin::TilingExtent => {
                let [value] = self.exact(args)?;
                annotate::tiling_extent(&value)
            }
            Builtin::Locality => Ok(Value::int(i64::from(ctx.locality().id()))),
            Builtin::NumLocalities => Ok(Value::int(i64::from(ctx.locality().count()))),
            Builtin::Debug => {
                let text: Vec<String> = args.iter().map(ToString::to_string).collect();
                debug!(target: "tessel::debug", node = %node, "{}", text.join(" "));
                Ok(Value::void())
            }
        }
    }

    fn exact<const N: usize>(self, args: Vec<Value>) -> Result<[Value; N], EvalError> {
        <[Value; N]>::try_from(args).map_err(|args| wrong_arg_count(self.symbol(), N, args.len()))
    }
}

/// A catalogue node: evaluates its operands, then applies its operation.
pub struct BuiltinPrimitive {
    name: PrimitiveName,
    builtin: Builtin,
    operands: Vec<Value>,
}

impl BuiltinPrimitive {
    #[inline]
    pub fn builtin(&self) -> Builtin {
        self.builtin
    }
}

impl Primitive for BuiltinPrimitive {
    fn name(&self) -> &PrimitiveName {
        &self.name
    }

    fn operands(&self) -> &[Value] {
        &self.operands
    }

    fn eval(self: Arc<Self>, _args: Vec<Value>, ctx: EvalContext) -> EvalFuture {
        async move {
            let args = evaluate_operands(&self.operands, &ctx).await?;
            trace!(node = %self.name, op = self.builtin.symbol(), "apply");
            self.builtin.apply(&self.name, args, &ctx).await
        }
        .boxed()
    }
}

/// Register the core catalogue into `registry`.
pub fn register_core_catalogue(registry: &mut PatternRegistry) -> Result<(), SignatureError> {
    // Arithmetic
    registry.register("_1 + _2", |o, n| Builtin::Add.node(o, n), "addition or concatenation")?;
    registry.register("_1 - _2", |o, n| Builtin::Sub.node(o, n), "subtraction")?;
    registry.register("_1 * _2", |o, n| Builtin::Mul.node(o, n), "multiplication")?;
    registry.register("_1 / _2", |o, n| Builtin::Div.node(o, n), "division")?;
    registry.register("_1 % _2", |o, n| Builtin::Mod.node(o, n), "remainder")?;
    registry.register("-_1", |o, n| Builtin::Neg.node(o, n), "negation")?;

    // Comparison
    registry.register("_1 < _2", |o, n| Builtin::Lt.node(o, n), "less than")?;
    registry.register("_1 <= _2", |o, n| Builtin::Le.node(o, n), "less than or equal")?;
    registry.register("_1 > _2", |o, n| Builtin::Gt.node(o, n), "greater than")?;
    registry.register("_1 >= _2", |o, n| Builtin::Ge.node(o, n), "greater than or equal")?;
    registry.register("_1 == _2", |o, n| Builtin::Eq.node(o, n), "equality")?;
    registry.register("_1 != _2", |o, n| Builtin::Ne.node(o, n), "inequality")?;

    // Logic
    registry.register("_1 && _2", |o, n| Builtin::And.node(o, n), "logical and")?;
    registry.register("_1 || _2", |o, n| Builtin::Or.node(o, n), "logical or")?;
    registry.register("!_1", |o, n| Builtin::Not.node(o, n), "logical not")?;

    // Lists
    registry.register("list()", |o, n| Builtin::List.node(o, n), "list()\n  the empty list")?;
    registry.register(
        "list(__1)",
        |o, n| Builtin::List.node(o, n),
        "list(items...)\n  a list of the given items",
    )?;
    registry.register("range(_1)", |o, n| Builtin::Range.node(o, n), "range(stop)")?;
    registry.register("range(_1, _2)", |o, n| Builtin::Range.node(o, n), "range(start, stop)")?;
    registry.register(
        "range(_1, _2, _3)",
        |o, n| Builtin::Range.node(o, n),
        "range(start, stop, step)",
    )?;
    registry.register("len(_1)", |o, n| Builtin::Len.node(o, n), "len(value)")?;
    registry.register(
        "filter(_1, _2)",
        |o, n| Builtin::Filter.node(o, n),
        "filter(f, list)\n  the elements for which f is true",
    )?;
    registry.register(
        "map(_1, _2)",
        |o, n| Builtin::Map.node(o, n),
        "map(f, list)\n  f applied to every element",
    )?;
    registry.register(
        "fold_left(_1, _2, _3)",
        |o, n| Builtin::FoldLeft.node(o, n),
        "fold_left(f, init, list)\n  f(f(init, x0), x1)...",
    )?;
    registry.register(
        "fold_right(_1, _2, _3)",
        |o, n| Builtin::FoldRight.node(o, n),
        "fold_right(f, init, list)\n  f(x0, f(x1, init))...",
    )?;

    // Annotations
    registry.register(
        "annotate(_1, _2, __3)",
        |o, n| Builtin::Annotate.node(o, n),
        "annotate(target, key, payload...)\n  tile and locality keys reconcile across localities",
    )?;
    registry.register(
        "annotate_d(_1, _2, _3, __4)",
        |o, n| Builtin::AnnotateD.node(o, n),
        "annotate_d(target, basename, key, payload...)\n  annotate, meeting other localities under basename",
    )?;
    registry.register(
        "annotation(_1)",
        |o, n| Builtin::Annotation.node(o, n),
        "annotation(value)\n  every annotation as [key, payload...]",
    )?;
    registry.register(
        "annotation(_1, _2)",
        |o, n| Builtin::Annotation.node(o, n),
        "annotation(value, key)\n  the payload stored under key, or nil",
    )?;
    registry.register(
        "tiling_extent(_1)",
        |o, n| Builtin::TilingExtent.node(o, n),
        "tiling_extent(value)\n  bounding span of the reconciled tiles",
    )?;

    // Localities
    registry.register("locality()", |o, n| Builtin::Locality.node(o, n), "this locality's id")?;
    registry.register(
        "num_localities()",
        |o, n| Builtin::NumLocalities.node(o, n),
        "number of localities",
    )?;
    registry.register(
        "debug(__1)",
        |o, n| Builtin::Debug.node(o, n),
        "debug(values...)\n  log the values at debug level",
    )?;

    debug!(patterns = registry.len(), "core catalogue registered");
    Ok(())
}

/// A registry holding just the core catalogue.
pub fn core_registry() -> Result<PatternRegistry, SignatureError> {
    let mut registry = PatternRegistry::new();
    register_core_catalogue(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests;
