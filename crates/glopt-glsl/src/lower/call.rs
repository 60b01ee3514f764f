//! Function calls: constructors, user functions and builtins.

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{
    BaseType, Call, Constant, Deref, ExprOp, Rvalue, ScalarValue, Statement, StorageMode, Type,
};
use glsl::syntax::{ArraySpecifierDimension, Expr, FunIdentifier};

use super::{expr::folded, type_list, Lowerer};
use crate::{
    builtins::{math_function, texture_function, CallResult, MathFunction},
    error::{GlslError, GlslResult},
    types::{implicitly_converts, type_from_name},
};

impl Lowerer<'_> {
    /// Lower a call. Returns `None` for calls without a value, and for
    /// calls whose value is not wanted.
    pub(super) fn call(
        &mut self,
        fun: &FunIdentifier,
        args: &[Expr],
        want_value: bool,
    ) -> GlslResult<Option<Rvalue>> {
        let name = match fun {
            FunIdentifier::Identifier(id) => id.0.as_str(),
            FunIdentifier::Expr(e) => match &**e {
                Expr::Variable(id) => id.0.as_str(),
                Expr::Bracket(elem, spec) => {
                    return self.array_constructor(elem, spec, args).map(Some)
                }
                Expr::Dot(base, method) if method.0 == "length" && args.is_empty() => {
                    return self.array_length(base).map(Some)
                }
                other => {
                    return Err(GlslError::unsupported(format!(
                        "call through expression {:?}",
                        other
                    )))
                }
            },
        };

        if let Some(ty) = self.constructor_type(name) {
            return self.constructor(ty, args).map(Some);
        }
        if !self.symbols.lookup_function(name).is_empty() {
            return self.user_call(name, args, want_value);
        }
        if let Some(stmt) = self.stage_statement(name, args)? {
            self.emit(stmt);
            return Ok(None);
        }
        if let Some(f) = texture_function(name) {
            let values = self.arguments(args)?;
            return self.texture_call(name, f, values).map(Some);
        }
        match math_function(name, args.len()) {
            Some(f) => {
                let values = self.arguments(args)?;
                self.math_call(name, f, values).map(Some)
            }
            None => Err(GlslError::type_error(format!(
                "no function '{}' taking {} arguments",
                name,
                args.len()
            ))),
        }
    }

    fn arguments(&mut self, args: &[Expr]) -> GlslResult<Vec<Rvalue>> {
        args.iter().map(|a| self.rvalue(a)).collect()
    }

    fn constructor_type(&self, name: &str) -> Option<Type> {
        self.symbols
            .lookup_struct(name)
            .map(|st| Type::Struct(st.clone()))
            .or_else(|| type_from_name(name))
    }

    fn array_constructor(
        &mut self,
        elem: &Expr,
        spec: &glsl::syntax::ArraySpecifier,
        args: &[Expr],
    ) -> GlslResult<Rvalue> {
        let Expr::Variable(name) = elem else {
            return Err(GlslError::type_error("array constructor needs an element type"));
        };
        let elem_ty = self
            .constructor_type(&name.0)
            .ok_or_else(|| GlslError::type_error(format!("unknown type '{}'", name.0)))?;
        let size = match spec.dimensions.0.as_slice() {
            [ArraySpecifierDimension::Unsized] => args.len() as u32,
            [ArraySpecifierDimension::ExplicitlySized(e)] => self.array_size(e)?,
            _ => return Err(GlslError::unsupported("multi-dimensional array constructors")),
        };
        if size as usize != args.len() {
            return Err(GlslError::type_error(format!(
                "array constructor of {} elements given {} arguments",
                size,
                args.len()
            )));
        }
        let mut values = Vec::new();
        for arg in args {
            let v = self.rvalue(arg)?;
            values.push(self.coerce(v, &elem_ty)?);
        }
        self.aggregate(Type::array(elem_ty, size), values)
    }

    fn array_length(&mut self, base: &Expr) -> GlslResult<Rvalue> {
        let value = self.rvalue(base)?;
        match self.ty(&value) {
            Type::Array(_, n) => Ok(Rvalue::constant(Constant::int(n as i32))),
            other => Err(GlslError::type_error(format!(
                "length() called on {}",
                other.name()
            ))),
        }
    }

    /// Geometry and compute builtins that lower to statements.
    fn stage_statement(&mut self, name: &str, args: &[Expr]) -> GlslResult<Option<Statement>> {
        let stream = |this: &mut Self, args: &[Expr]| -> GlslResult<Rvalue> {
            match args {
                [] => Ok(Rvalue::constant(Constant::int(0))),
                [s] => {
                    let v = this.rvalue(s)?;
                    this.coerce(v, &Type::INT)
                }
                _ => Err(GlslError::type_error(format!(
                    "too many arguments to {}",
                    name
                ))),
            }
        };
        let stmt = match (name, args.len()) {
            ("EmitVertex", 0) | ("EmitStreamVertex", 1) => {
                Statement::EmitVertex(stream(self, args)?)
            }
            ("EndPrimitive", 0) | ("EndStreamPrimitive", 1) => {
                Statement::EndPrimitive(stream(self, args)?)
            }
            ("barrier", 0) => Statement::Barrier,
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    fn user_call(
        &mut self,
        name: &str,
        args: &[Expr],
        want_value: bool,
    ) -> GlslResult<Option<Rvalue>> {
        let values = self.arguments(args)?;
        let types: Vec<Type> = values.iter().map(|v| self.ty(v)).collect();
        let overloads = self.symbols.lookup_function(name);
        let exact = overloads
            .iter()
            .find(|o| o.param_types().eq(types.iter()));
        let sig = match exact {
            Some(sig) => sig.clone(),
            None => {
                let candidates: Vec<_> = overloads
                    .iter()
                    .filter(|o| {
                        o.params.len() == types.len()
                            && o.params.iter().zip(&types).all(|(p, t)| {
                                p.ty == *t
                                    || (!p.qualifier.is_by_reference()
                                        && converts_implicitly(t, &p.ty))
                            })
                    })
                    .collect();
                match candidates.as_slice() {
                    [one] => (*one).clone(),
                    [] => {
                        return Err(GlslError::type_error(format!(
                            "no matching overload for {}({})",
                            name,
                            type_list(&types)
                        )))
                    }
                    _ => {
                        return Err(GlslError::type_error(format!(
                            "ambiguous call to {}({})",
                            name,
                            type_list(&types)
                        )))
                    }
                }
            }
        };

        let mut call_args = Vec::new();
        for (value, param) in values.into_iter().zip(&sig.params) {
            if param.qualifier.is_by_reference() {
                let writable = match &value {
                    Rvalue::Deref(d) => d.root_var().is_some_and(|root| {
                        self.unit.vars.get(root).is_some_and(|v| {
                            !v.read_only
                                && !matches!(
                                    v.mode(),
                                    StorageMode::Uniform
                                        | StorageMode::ShaderIn
                                        | StorageMode::ConstIn
                                        | StorageMode::SystemValue
                                )
                        })
                    }),
                    _ => false,
                };
                if !writable {
                    return Err(GlslError::type_error(format!(
                        "argument for out parameter of '{}' is not assignable",
                        name
                    )));
                }
                call_args.push(value);
            } else {
                call_args.push(self.coerce(value, &param.ty)?);
            }
        }

        let ret = sig.return_type;
        let return_deref = if want_value && !ret.is_void() {
            Some(Deref::Var(self.temp(ret)))
        } else {
            None
        };
        self.emit(Statement::Call(Call {
            callee: name.to_string(),
            return_deref: return_deref.clone(),
            args: call_args,
            builtin: false,
        }));
        Ok(return_deref.map(Rvalue::Deref))
    }

    fn math_call(&mut self, name: &str, f: MathFunction, args: Vec<Rvalue>) -> GlslResult<Rvalue> {
        let types: Vec<Type> = args.iter().map(|v| self.ty(v)).collect();
        let mismatch = || {
            GlslError::type_error(format!(
                "no matching overload for {}({})",
                name,
                type_list(&types)
            ))
        };
        let rv = match f {
            MathFunction::Float(op) => {
                let args = self.float_args(args).ok_or_else(mismatch)?;
                let ty = self.componentwise_type(&args).ok_or_else(mismatch)?;
                Rvalue::expr(op, ty, args)
            }
            MathFunction::Numeric(op) => {
                if types.iter().any(|t| t.is_boolean() || !t.is_numeric() || t.is_matrix()) {
                    return Err(mismatch());
                }
                let args = self.unify_args(args).ok_or_else(mismatch)?;
                let ty = self.componentwise_type(&args).ok_or_else(mismatch)?;
                Rvalue::expr(op, ty, args)
            }
            MathFunction::Integer(op, result) => {
                let ty = &types[0];
                if !ty.is_integer() || ty.is_matrix() {
                    return Err(mismatch());
                }
                let ty = match result {
                    Some(base) => ty.with_base(base).ok_or_else(mismatch)?,
                    None => ty.clone(),
                };
                Rvalue::expr(op, ty, args)
            }
            MathFunction::Dot => {
                let args = self.float_args(args).ok_or_else(mismatch)?;
                let ty = self.ty(&args[0]);
                if ty != self.ty(&args[1]) || ty.is_matrix() {
                    return Err(mismatch());
                }
                let base = ty.base_type().ok_or_else(mismatch)?;
                Rvalue::expr(ExprOp::Dot, Type::Scalar(base), args)
            }
            MathFunction::Clamp => {
                if types.iter().any(|t| t.is_boolean() || !t.is_numeric() || t.is_matrix()) {
                    return Err(mismatch());
                }
                let mut args = self.unify_args(args).ok_or_else(mismatch)?;
                let ty = self.componentwise_type(&args).ok_or_else(mismatch)?;
                let hi = args.pop().ok_or_else(mismatch)?;
                let lo = args.pop().ok_or_else(mismatch)?;
                let x = args.pop().ok_or_else(mismatch)?;
                let low = folded(Rvalue::binop(ExprOp::Max, ty.clone(), x, lo));
                Rvalue::binop(ExprOp::Min, ty, low, hi)
            }
            MathFunction::Mix => {
                let mut args = args;
                let selector = args.pop().ok_or_else(mismatch)?;
                let y = args.pop().ok_or_else(mismatch)?;
                let x = args.pop().ok_or_else(mismatch)?;
                if self.ty(&selector).is_boolean() {
                    let (x, y, _) = self.unify_pair(x, y).ok_or_else(mismatch)?;
                    let ty = self.ty(&x);
                    let sel_ty = self.ty(&selector);
                    if ty != self.ty(&y) || sel_ty.vector_elements() != ty.vector_elements() {
                        return Err(mismatch());
                    }
                    Rvalue::expr(ExprOp::Csel, ty, alloc::vec![selector, y, x])
                } else {
                    let args = self
                        .float_args(alloc::vec![x, y, selector])
                        .ok_or_else(mismatch)?;
                    let ty = self.componentwise_type(&args).ok_or_else(mismatch)?;
                    Rvalue::expr(ExprOp::Lrp, ty, args)
                }
            }
            MathFunction::Fma => {
                let args = self.float_args(args).ok_or_else(mismatch)?;
                let ty = self.componentwise_type(&args).ok_or_else(mismatch)?;
                Rvalue::expr(ExprOp::Fma, ty, args)
            }
            MathFunction::Ldexp => {
                let (x, e) = (&types[0], &types[1]);
                if !x.is_float()
                    || e.base_type() != Some(BaseType::Int)
                    || x.vector_elements() != e.vector_elements()
                {
                    return Err(mismatch());
                }
                Rvalue::expr(ExprOp::Ldexp, x.clone(), args)
            }
            MathFunction::Relational(op, swap) => {
                let mut args = self.unify_args(args).ok_or_else(mismatch)?;
                let ty = self.ty(&args[0]);
                let numeric_ok = matches!(op, ExprOp::Equal | ExprOp::Nequal) || !ty.is_boolean();
                if !ty.is_vector() || ty != self.ty(&args[1]) || !numeric_ok {
                    return Err(mismatch());
                }
                if swap {
                    args.swap(0, 1);
                }
                let result = ty.with_base(BaseType::Bool).ok_or_else(mismatch)?;
                Rvalue::expr(op, result, args)
            }
            MathFunction::Not => {
                let ty = &types[0];
                if !ty.is_vector() || !ty.is_boolean() {
                    return Err(mismatch());
                }
                Rvalue::expr(ExprOp::LogicNot, ty.clone(), args)
            }
            MathFunction::Any | MathFunction::All => {
                let ty = types[0].clone();
                if !ty.is_vector() || !ty.is_boolean() {
                    return Err(mismatch());
                }
                let (op, splat) = if f == MathFunction::Any {
                    (ExprOp::AnyNequal, false)
                } else {
                    (ExprOp::AllEqual, true)
                };
                let constant = Constant::splat(ty, ScalarValue::Bool(splat)).ok_or_else(mismatch)?;
                let mut args = args;
                args.push(Rvalue::constant(constant));
                Rvalue::expr(op, Type::BOOL, args)
            }
            MathFunction::Bitcast(op, to) => {
                let from = match op {
                    ExprOp::BitcastF2i | ExprOp::BitcastF2u => BaseType::Float,
                    ExprOp::BitcastI2f => BaseType::Int,
                    _ => BaseType::UInt,
                };
                let ty = &types[0];
                if ty.base_type() != Some(from) || ty.is_matrix() {
                    return Err(mismatch());
                }
                Rvalue::expr(op, ty.with_base(to).ok_or_else(mismatch)?, args)
            }
            MathFunction::Pack(op) => {
                let n = match op {
                    ExprOp::PackSnorm4x8 | ExprOp::PackUnorm4x8 => 4,
                    _ => 2,
                };
                if types[0] != Type::Vector(BaseType::Float, n) {
                    return Err(mismatch());
                }
                Rvalue::expr(op, Type::UINT, args)
            }
            MathFunction::Unpack(op, n) => {
                if types[0] != Type::UINT {
                    return Err(mismatch());
                }
                Rvalue::expr(op, Type::Vector(BaseType::Float, n), args)
            }
            MathFunction::Noise1 => {
                let args = self.float_args(args).ok_or_else(mismatch)?;
                Rvalue::expr(ExprOp::Noise, Type::FLOAT, args)
            }
            MathFunction::Interpolate(op) => {
                let mut args = args;
                let ty = types[0].clone();
                if !ty.is_float() {
                    return Err(mismatch());
                }
                if op == ExprOp::InterpolateAtSample {
                    let sample = args.pop().ok_or_else(mismatch)?;
                    args.push(self.coerce(sample, &Type::INT)?);
                }
                Rvalue::expr(op, ty, args)
            }
            MathFunction::Call(rule) => return self.builtin_call(name, rule, args, &types),
        };
        Ok(folded(rv))
    }

    /// Call to a builtin with no IR operator, through a temporary.
    fn builtin_call(
        &mut self,
        name: &str,
        rule: CallResult,
        args: Vec<Rvalue>,
        types: &[Type],
    ) -> GlslResult<Rvalue> {
        let mismatch = || {
            GlslError::type_error(format!(
                "no matching overload for {}({})",
                name,
                type_list(types)
            ))
        };
        let args = match name {
            "isnan" | "isinf" => args,
            _ => self.float_args(args).ok_or_else(mismatch)?,
        };
        let arg_type = |i: usize| self.ty(&args[i]);
        let ret = match rule {
            CallResult::Arg(i) => arg_type(i),
            CallResult::Float => Type::FLOAT,
            CallResult::Bool(i) => arg_type(i).with_base(BaseType::Bool).ok_or_else(mismatch)?,
            CallResult::FloatVector(n) => Type::Vector(BaseType::Float, n),
            CallResult::Transpose => match arg_type(0) {
                Type::Matrix { base, columns, rows } => Type::Matrix {
                    base,
                    columns: rows,
                    rows: columns,
                },
                _ => return Err(mismatch()),
            },
            CallResult::OuterProduct => match (arg_type(0), arg_type(1)) {
                (Type::Vector(base, r), Type::Vector(_, c)) => Type::Matrix {
                    base,
                    columns: c,
                    rows: r,
                },
                _ => return Err(mismatch()),
            },
        };
        let t = self.temp(ret);
        self.emit(Statement::Call(Call {
            callee: String::from(name),
            return_deref: Some(Deref::Var(t)),
            args,
            builtin: true,
        }));
        Ok(Rvalue::var(t))
    }

    /// Arguments converted to their common floating-point base type.
    fn float_args(&self, args: Vec<Rvalue>) -> Option<Vec<Rvalue>> {
        let mut base = BaseType::Float;
        for a in &args {
            match self.ty(a).base_type()? {
                BaseType::Double => base = BaseType::Double,
                BaseType::Bool => return None,
                _ => {}
            }
        }
        args.into_iter()
            .map(|a| self.convert(a, base).ok())
            .collect()
    }

    /// Arguments converted to the common base type of all of them.
    fn unify_args(&self, args: Vec<Rvalue>) -> Option<Vec<Rvalue>> {
        let mut base = self.ty(args.first()?).base_type()?;
        for a in &args[1..] {
            let b = self.ty(a).base_type()?;
            base = crate::types::common_base(base, b)?;
        }
        args.into_iter()
            .map(|a| self.convert(a, base).ok())
            .collect()
    }

    fn unify_pair(&self, a: Rvalue, b: Rvalue) -> Option<(Rvalue, Rvalue, BaseType)> {
        let mut v = self.unify_args(alloc::vec![a, b])?;
        let b = v.pop()?;
        let a = v.pop()?;
        let base = self.ty(&a).base_type()?;
        Some((a, b, base))
    }

    /// Result type of a component-wise builtin: the first argument's type,
    /// with every other argument of that type or scalar.
    fn componentwise_type(&self, args: &[Rvalue]) -> Option<Type> {
        let ty = self.ty(args.first()?);
        let ok = args[1..].iter().all(|a| {
            let t = self.ty(a);
            t == ty || t.is_scalar()
        });
        ok.then_some(ty)
    }
}

/// Implicit conversion from `from` to `to` keeping the shape.
fn converts_implicitly(from: &Type, to: &Type) -> bool {
    match (from.base_type(), to.base_type()) {
        (Some(a), Some(b)) => implicitly_converts(a, b) && from.with_base(b).as_ref() == Some(to),
        _ => false,
    }
}
