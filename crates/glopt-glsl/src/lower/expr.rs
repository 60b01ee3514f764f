//! Expressions, assignments and l-values.

use alloc::{format, vec::Vec};

use glopt_ir::{
    Assignment, BaseType, Constant, Deref, ExprOp, If, Rvalue, ScalarValue, Statement,
    StorageMode, SwizzleMask, Type,
};
use glopt_opt::eval::fold_node;
use glsl::syntax::{
    ArraySpecifier, ArraySpecifierDimension, AssignmentOp, BinaryOp, Expr, Identifier, UnaryOp,
};

use super::{logical_not, Lowerer};
use crate::{
    error::{GlslError, GlslResult},
    types::{common_base, parse_swizzle},
};

/// Assignable storage: an access path plus an optional swizzle.
#[derive(Debug, Clone)]
pub(super) struct Place {
    pub deref: Deref,
    pub swizzle: Option<SwizzleMask>,
}

/// Fold `rv` when all its operands are constant.
pub(super) fn folded(mut rv: Rvalue) -> Rvalue {
    fold_node(&mut rv);
    rv
}

impl Lowerer<'_> {
    /// Value of `e`, emitting any statements it needs.
    pub(super) fn rvalue(&mut self, e: &Expr) -> GlslResult<Rvalue> {
        match e {
            Expr::Variable(id) => self.variable(id),
            Expr::IntConst(v) => Ok(Rvalue::constant(Constant::int(*v))),
            Expr::UIntConst(v) => Ok(Rvalue::constant(Constant::uint(*v))),
            Expr::BoolConst(v) => Ok(Rvalue::constant(Constant::bool(*v))),
            Expr::FloatConst(v) => Ok(Rvalue::constant(Constant::float(*v))),
            Expr::DoubleConst(v) => Ok(Rvalue::constant(
                Constant::from_scalars(Type::Scalar(BaseType::Double), &[ScalarValue::Double(*v)])
                    .ok_or_else(|| GlslError::type_error("bad double constant"))?,
            )),
            Expr::Unary(op, x) => self.unary(op, x),
            Expr::Binary(op, a, b) => self.binary(op, a, b),
            Expr::Ternary(c, a, b) => self.ternary(c, a, b),
            Expr::Assignment(lhs, op, rhs) => {
                let place = self.assign(lhs, op, rhs)?;
                Ok(self.read_place(&place))
            }
            Expr::Bracket(base, spec) => self.index(base, spec),
            Expr::FunCall(fun, args) => self
                .call(fun, args, true)?
                .ok_or_else(|| GlslError::type_error("void function call used as a value")),
            Expr::Dot(base, field) => self.field(base, field),
            Expr::PostInc(x) => self.post_step(x, ExprOp::Add),
            Expr::PostDec(x) => self.post_step(x, ExprOp::Sub),
            Expr::Comma(a, b) => {
                self.effect(a)?;
                self.rvalue(b)
            }
        }
    }

    /// Evaluate `e` for its side effects only.
    pub(super) fn effect(&mut self, e: &Expr) -> GlslResult<()> {
        match e {
            Expr::Assignment(lhs, op, rhs) => self.assign(lhs, op, rhs).map(|_| ()),
            Expr::PostInc(x) | Expr::Unary(UnaryOp::Inc, x) => self.step(x, ExprOp::Add),
            Expr::PostDec(x) | Expr::Unary(UnaryOp::Dec, x) => self.step(x, ExprOp::Sub),
            Expr::FunCall(fun, args) => self.call(fun, args, false).map(|_| ()),
            Expr::Comma(a, b) => {
                self.effect(a)?;
                self.effect(b)
            }
            other => self.rvalue(other).map(|_| ()),
        }
    }

    fn variable(&mut self, id: &Identifier) -> GlslResult<Rvalue> {
        let var_id = self.lookup_variable(&id.0)?;
        let var = self.var(var_id)?;
        if var.read_only && var.mode() == StorageMode::Auto {
            if let Some(c) = &var.constant_value {
                return Ok(Rvalue::constant(c.clone()));
            }
        }
        Ok(Rvalue::var(var_id))
    }

    fn index_operand(&mut self, spec: &ArraySpecifier) -> GlslResult<Rvalue> {
        let dim = match spec.dimensions.0.as_slice() {
            [ArraySpecifierDimension::ExplicitlySized(e)] => e,
            _ => return Err(GlslError::type_error("expected a single array index")),
        };
        let index = self.rvalue(dim)?;
        let ty = self.ty(&index);
        if !(ty.is_scalar() && ty.is_integer()) {
            return Err(GlslError::type_error(format!(
                "array index must be an integer scalar, found {}",
                ty.name()
            )));
        }
        Ok(index)
    }

    /// Check a constant index against the indexed type.
    fn check_index(&self, base: &Type, index: &Rvalue) -> GlslResult<()> {
        if base.index_result().is_none() {
            return Err(GlslError::type_error(format!(
                "cannot index a value of type {}",
                base.name()
            )));
        }
        let len = match base {
            Type::Array(_, n) => *n as i64,
            Type::Matrix { columns, .. } => *columns as i64,
            other => other.vector_elements() as i64,
        };
        if let Some(i) = index.as_constant().and_then(|c| c.get_int_component(0)) {
            if i < 0 || i >= len {
                return Err(GlslError::type_error(format!(
                    "index {} out of range for {}",
                    i,
                    base.name()
                )));
            }
        }
        Ok(())
    }

    fn index(&mut self, base: &Expr, spec: &ArraySpecifier) -> GlslResult<Rvalue> {
        let array = self.rvalue(base)?;
        let index = self.index_operand(spec)?;
        let ty = self.ty(&array);
        self.check_index(&ty, &index)?;
        Ok(folded(Rvalue::Deref(Deref::array(array, index))))
    }

    fn field(&mut self, base: &Expr, field: &Identifier) -> GlslResult<Rvalue> {
        let value = self.rvalue(base)?;
        let ty = self.ty(&value);
        match &ty {
            Type::Struct(st) => {
                let i = st.field_index(&field.0).ok_or_else(|| {
                    GlslError::type_error(format!(
                        "structure '{}' has no field '{}'",
                        st.name, field.0
                    ))
                })?;
                Ok(folded(Rvalue::Deref(Deref::record(value, i))))
            }
            Type::Scalar(_) | Type::Vector(..) => {
                let mask = parse_swizzle(&field.0, ty.vector_elements())
                    .ok_or_else(|| GlslError::type_error(format!("invalid swizzle '.{}'", field.0)))?;
                Ok(folded(Rvalue::swizzle(value, mask)))
            }
            other => Err(GlslError::type_error(format!(
                "cannot select '.{}' from {}",
                field.0,
                other.name()
            ))),
        }
    }

    /// Storage designated by an l-value expression.
    pub(super) fn place(&mut self, e: &Expr) -> GlslResult<Place> {
        match e {
            Expr::Variable(id) => {
                let var_id = self.lookup_variable(&id.0)?;
                let var = self.var(var_id)?;
                let read_only = var.read_only
                    || matches!(
                        var.mode(),
                        StorageMode::Uniform
                            | StorageMode::ShaderIn
                            | StorageMode::ConstIn
                            | StorageMode::SystemValue
                    );
                if read_only {
                    return Err(GlslError::type_error(format!(
                        "'{}' is read-only",
                        id.0
                    )));
                }
                Ok(Place {
                    deref: Deref::Var(var_id),
                    swizzle: None,
                })
            }
            Expr::Bracket(base, spec) => {
                let place = self.place(base)?;
                if place.swizzle.is_some() {
                    return Err(GlslError::unsupported("indexing a swizzled l-value"));
                }
                let index = self.index_operand(spec)?;
                let ty = place.deref.ty(&self.unit.vars);
                self.check_index(&ty, &index)?;
                Ok(Place {
                    deref: Deref::array(Rvalue::Deref(place.deref), index),
                    swizzle: None,
                })
            }
            Expr::Dot(base, field) => {
                let place = self.place(base)?;
                let ty = place.deref.ty(&self.unit.vars);
                match &ty {
                    Type::Struct(st) if place.swizzle.is_none() => {
                        let i = st.field_index(&field.0).ok_or_else(|| {
                            GlslError::type_error(format!(
                                "structure '{}' has no field '{}'",
                                st.name, field.0
                            ))
                        })?;
                        Ok(Place {
                            deref: Deref::record(Rvalue::Deref(place.deref), i),
                            swizzle: None,
                        })
                    }
                    Type::Scalar(_) | Type::Vector(..) => {
                        let mask = parse_swizzle(&field.0, ty.vector_elements()).ok_or_else(
                            || GlslError::type_error(format!("invalid swizzle '.{}'", field.0)),
                        )?;
                        // Compose with an outer swizzle: `v.zyx.x` writes `v.z`.
                        let mask = match &place.swizzle {
                            Some(outer) => {
                                let comps: Option<Vec<u8>> =
                                    mask.iter().map(|c| outer.get(c as usize)).collect();
                                comps
                                    .and_then(|c| SwizzleMask::new(&c))
                                    .ok_or_else(|| GlslError::type_error("invalid swizzle"))?
                            }
                            None => mask,
                        };
                        let mut seen = 0u8;
                        for c in mask.iter() {
                            if seen & (1 << c) != 0 {
                                return Err(GlslError::type_error(format!(
                                    "l-value swizzle '.{}' repeats a component",
                                    field.0
                                )));
                            }
                            seen |= 1 << c;
                        }
                        Ok(Place {
                            deref: place.deref,
                            swizzle: Some(mask),
                        })
                    }
                    other => Err(GlslError::type_error(format!(
                        "cannot assign to '.{}' of {}",
                        field.0,
                        other.name()
                    ))),
                }
            }
            _ => Err(GlslError::type_error("expression is not assignable")),
        }
    }

    pub(super) fn read_place(&self, place: &Place) -> Rvalue {
        let value = Rvalue::Deref(place.deref.clone());
        match &place.swizzle {
            Some(mask) => Rvalue::swizzle(value, mask.clone()),
            None => value,
        }
    }

    pub(super) fn place_type(&self, place: &Place) -> Type {
        let ty = place.deref.ty(&self.unit.vars);
        match &place.swizzle {
            Some(mask) => Type::vector(ty.base_type().unwrap_or(BaseType::Float), mask.count),
            None => ty,
        }
    }

    /// Store `value` into `place`, converting it to the place's type.
    pub(super) fn store(&mut self, place: &Place, value: Rvalue) -> GlslResult<()> {
        let ty = self.place_type(place);
        let value = self.coerce(value, &ty)?;
        let Some(mask) = &place.swizzle else {
            self.emit(Statement::assign(place.deref.clone(), value));
            return Ok(());
        };
        // The right-hand side lists written components in component order.
        let mut write_mask = 0u8;
        for c in mask.iter() {
            write_mask |= 1 << c;
        }
        let order: Vec<u8> = (0..4u8)
            .filter(|c| write_mask & (1 << c) != 0)
            .filter_map(|c| mask.iter().position(|m| m == c).map(|p| p as u8))
            .collect();
        let in_order = order.iter().enumerate().all(|(i, p)| *p as usize == i);
        let value = if in_order {
            value
        } else {
            let perm = SwizzleMask::new(&order)
                .ok_or_else(|| GlslError::type_error("invalid write mask"))?;
            folded(Rvalue::swizzle(value, perm))
        };
        self.emit(Statement::Assign(Assignment::masked(
            place.deref.clone(),
            value,
            write_mask,
        )));
        Ok(())
    }

    fn assign(&mut self, lhs: &Expr, op: &AssignmentOp, rhs: &Expr) -> GlslResult<Place> {
        let place = self.place(lhs)?;
        let value = self.rvalue(rhs)?;
        let bin = match op {
            AssignmentOp::Equal => None,
            AssignmentOp::Mult => Some(BinaryOp::Mult),
            AssignmentOp::Div => Some(BinaryOp::Div),
            AssignmentOp::Mod => Some(BinaryOp::Mod),
            AssignmentOp::Add => Some(BinaryOp::Add),
            AssignmentOp::Sub => Some(BinaryOp::Sub),
            AssignmentOp::LShift => Some(BinaryOp::LShift),
            AssignmentOp::RShift => Some(BinaryOp::RShift),
            AssignmentOp::And => Some(BinaryOp::BitAnd),
            AssignmentOp::Xor => Some(BinaryOp::BitXor),
            AssignmentOp::Or => Some(BinaryOp::BitOr),
        };
        let value = match bin {
            Some(bin) => {
                let current = self.read_place(&place);
                self.binary_op(&bin, current, value)?
            }
            None => value,
        };
        self.store(&place, value)?;
        Ok(place)
    }

    fn step(&mut self, x: &Expr, op: ExprOp) -> GlslResult<()> {
        let place = self.place(x)?;
        self.step_place(&place, op)
    }

    /// `x += 1` or `x -= 1` in place.
    fn step_place(&mut self, place: &Place, op: ExprOp) -> GlslResult<()> {
        let ty = self.place_type(place);
        let base = match ty.base_type() {
            Some(b) if b != BaseType::Bool => b,
            _ => {
                return Err(GlslError::type_error(format!(
                    "cannot increment a value of type {}",
                    ty.name()
                )))
            }
        };
        let one = Constant::splat(ty.clone(), ScalarValue::Int(1).convert(base))
            .ok_or_else(|| GlslError::type_error("cannot increment this type"))?;
        let current = self.read_place(place);
        let value = Rvalue::binop(op, ty, current, Rvalue::constant(one));
        self.store(place, value)
    }

    /// Old value of `x`, then step it.
    fn post_step(&mut self, x: &Expr, op: ExprOp) -> GlslResult<Rvalue> {
        let place = self.place(x)?;
        let current = self.read_place(&place);
        let old = self.to_temp(current);
        self.step_place(&place, op)?;
        Ok(old)
    }

    fn unary(&mut self, op: &UnaryOp, x: &Expr) -> GlslResult<Rvalue> {
        match op {
            UnaryOp::Inc | UnaryOp::Dec => {
                let step = if matches!(op, UnaryOp::Inc) {
                    ExprOp::Add
                } else {
                    ExprOp::Sub
                };
                let place = self.place(x)?;
                self.step_place(&place, step)?;
                Ok(self.read_place(&place))
            }
            UnaryOp::Add => {
                let v = self.rvalue(x)?;
                self.require_numeric(&v, "unary +")?;
                Ok(v)
            }
            UnaryOp::Minus => {
                let v = self.rvalue(x)?;
                let ty = self.require_numeric(&v, "unary -")?;
                Ok(folded(Rvalue::unop(ExprOp::Neg, ty, v)))
            }
            UnaryOp::Not => {
                let v = self.rvalue(x)?;
                let v = self.condition(v, "operand of !")?;
                Ok(logical_not(v))
            }
            UnaryOp::Complement => {
                let v = self.rvalue(x)?;
                let ty = self.ty(&v);
                if !ty.is_integer() || ty.is_matrix() {
                    return Err(GlslError::type_error(format!(
                        "operand of ~ must be an integer, found {}",
                        ty.name()
                    )));
                }
                Ok(folded(Rvalue::unop(ExprOp::BitNot, ty, v)))
            }
        }
    }

    fn require_numeric(&self, v: &Rvalue, what: &str) -> GlslResult<Type> {
        let ty = self.ty(v);
        if !ty.is_numeric() || ty.is_boolean() {
            return Err(GlslError::type_error(format!(
                "operand of {} must be numeric, found {}",
                what,
                ty.name()
            )));
        }
        Ok(ty)
    }

    fn binary(&mut self, op: &BinaryOp, a: &Expr, b: &Expr) -> GlslResult<Rvalue> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return self.short_circuit(op, a, b);
        }
        let a = self.rvalue(a)?;
        let b = self.rvalue(b)?;
        self.binary_op(op, a, b)
    }

    /// `&&` and `||`. A right operand with side effects only runs when the
    /// left one does not decide the result.
    fn short_circuit(&mut self, op: &BinaryOp, a: &Expr, b: &Expr) -> GlslResult<Rvalue> {
        let a = self.rvalue(a)?;
        let a = self.condition(a, "logical operand")?;
        let (b, stmts) = self.collect(|this| {
            let b = this.rvalue(b)?;
            this.condition(b, "logical operand")
        })?;
        let and = matches!(op, BinaryOp::And);
        if stmts.is_empty() {
            let op = if and {
                ExprOp::LogicAnd
            } else {
                ExprOp::LogicOr
            };
            return Ok(folded(Rvalue::binop(op, Type::BOOL, a, b)));
        }
        let t = self.temp(Type::BOOL);
        self.emit(Statement::assign(Deref::Var(t), a));
        let mut then_body = stmts;
        then_body.push(Statement::assign(Deref::Var(t), b));
        let condition = if and {
            Rvalue::var(t)
        } else {
            logical_not(Rvalue::var(t))
        };
        self.emit(Statement::If(If {
            condition,
            then_body,
            else_body: Vec::new(),
        }));
        Ok(Rvalue::var(t))
    }

    /// Type-checked binary operator over lowered operands.
    pub(super) fn binary_op(&mut self, op: &BinaryOp, a: Rvalue, b: Rvalue) -> GlslResult<Rvalue> {
        use BinaryOp as B;

        let rv = match op {
            B::Add => self.arithmetic(ExprOp::Add, a, b)?,
            B::Sub => self.arithmetic(ExprOp::Sub, a, b)?,
            B::Mult => self.arithmetic(ExprOp::Mul, a, b)?,
            B::Div => self.arithmetic(ExprOp::Div, a, b)?,
            B::Mod => self.integer_op(ExprOp::Mod, a, b)?,
            B::BitAnd => self.integer_op(ExprOp::BitAnd, a, b)?,
            B::BitOr => self.integer_op(ExprOp::BitOr, a, b)?,
            B::BitXor => self.integer_op(ExprOp::BitXor, a, b)?,
            B::LShift => self.shift(ExprOp::Lshift, a, b)?,
            B::RShift => self.shift(ExprOp::Rshift, a, b)?,
            B::LT => self.relational(ExprOp::Less, a, b)?,
            B::GT => self.relational(ExprOp::Less, b, a)?,
            B::LTE => self.relational(ExprOp::Gequal, b, a)?,
            B::GTE => self.relational(ExprOp::Gequal, a, b)?,
            B::Equal => self.equality(true, a, b)?,
            B::NonEqual => self.equality(false, a, b)?,
            B::And | B::Or | B::Xor => {
                let a = self.condition(a, "logical operand")?;
                let b = self.condition(b, "logical operand")?;
                let op = match op {
                    B::And => ExprOp::LogicAnd,
                    B::Or => ExprOp::LogicOr,
                    _ => ExprOp::LogicXor,
                };
                Rvalue::binop(op, Type::BOOL, a, b)
            }
        };
        Ok(folded(rv))
    }

    /// Convert both operands to their common base type.
    fn unify(&self, a: Rvalue, b: Rvalue) -> GlslResult<(Rvalue, Rvalue, BaseType)> {
        let (ta, tb) = (self.ty(&a), self.ty(&b));
        let base = match (ta.base_type(), tb.base_type()) {
            (Some(x), Some(y)) => common_base(x, y),
            _ => None,
        }
        .ok_or_else(|| {
            GlslError::type_error(format!(
                "operands of types {} and {} do not match",
                ta.name(),
                tb.name()
            ))
        })?;
        Ok((self.convert(a, base)?, self.convert(b, base)?, base))
    }

    fn arithmetic(&mut self, op: ExprOp, a: Rvalue, b: Rvalue) -> GlslResult<Rvalue> {
        self.require_numeric(&a, op.glsl_name())?;
        self.require_numeric(&b, op.glsl_name())?;
        let (a, b, base) = self.unify(a, b)?;
        let (ta, tb) = (self.ty(&a), self.ty(&b));
        let ty = if op == ExprOp::Mul && (ta.is_matrix() || tb.is_matrix()) {
            product_type(base, &ta, &tb)
        } else if ta == tb || tb.is_scalar() {
            Some(ta.clone())
        } else if ta.is_scalar() {
            Some(tb.clone())
        } else {
            None
        }
        .ok_or_else(|| {
            GlslError::type_error(format!(
                "operands of types {} and {} do not match",
                ta.name(),
                tb.name()
            ))
        })?;
        Ok(Rvalue::binop(op, ty, a, b))
    }

    fn integer_op(&mut self, op: ExprOp, a: Rvalue, b: Rvalue) -> GlslResult<Rvalue> {
        let (ta, tb) = (self.ty(&a), self.ty(&b));
        if !ta.is_integer() || !tb.is_integer() || ta.is_matrix() {
            return Err(GlslError::type_error(format!(
                "operands of {} must be integers, found {} and {}",
                op.glsl_name(),
                ta.name(),
                tb.name()
            )));
        }
        self.arithmetic(op, a, b)
    }

    fn shift(&mut self, op: ExprOp, a: Rvalue, b: Rvalue) -> GlslResult<Rvalue> {
        let (ta, tb) = (self.ty(&a), self.ty(&b));
        let shape_ok = tb.is_scalar() || tb.vector_elements() == ta.vector_elements();
        if !ta.is_integer() || !tb.is_integer() || !shape_ok {
            return Err(GlslError::type_error(format!(
                "operands of {} must be integers, found {} and {}",
                op.glsl_name(),
                ta.name(),
                tb.name()
            )));
        }
        Ok(Rvalue::binop(op, ta, a, b))
    }

    fn relational(&mut self, op: ExprOp, a: Rvalue, b: Rvalue) -> GlslResult<Rvalue> {
        let (a, b, _) = self.unify(a, b)?;
        let (ta, tb) = (self.ty(&a), self.ty(&b));
        if !ta.is_scalar() || !tb.is_scalar() || ta.is_boolean() {
            return Err(GlslError::type_error(format!(
                "relational operands must be numeric scalars, found {} and {}",
                ta.name(),
                tb.name()
            )));
        }
        Ok(Rvalue::binop(op, Type::BOOL, a, b))
    }

    fn equality(&mut self, equal: bool, a: Rvalue, b: Rvalue) -> GlslResult<Rvalue> {
        let (a, b) = match (self.ty(&a).base_type(), self.ty(&b).base_type()) {
            (Some(_), Some(_)) => {
                let (a, b, _) = self.unify(a, b)?;
                (a, b)
            }
            _ => (a, b),
        };
        let ty = self.ty(&a);
        if ty != self.ty(&b) || ty.is_sampler() {
            return Err(GlslError::type_error(format!(
                "cannot compare {} with {}",
                ty.name(),
                self.ty(&b).name()
            )));
        }
        let op = match (ty.is_scalar(), equal) {
            (true, true) => ExprOp::Equal,
            (true, false) => ExprOp::Nequal,
            (false, true) => ExprOp::AllEqual,
            (false, false) => ExprOp::AnyNequal,
        };
        Ok(Rvalue::binop(op, Type::BOOL, a, b))
    }

    fn ternary(&mut self, c: &Expr, a: &Expr, b: &Expr) -> GlslResult<Rvalue> {
        let cond = self.rvalue(c)?;
        let cond = self.condition(cond, "?: condition")?;
        let (a, then_body) = self.collect(|this| this.rvalue(a))?;
        let (b, else_body) = self.collect(|this| this.rvalue(b))?;
        let (a, b) = match (self.ty(&a).base_type(), self.ty(&b).base_type()) {
            (Some(_), Some(_)) => {
                let (a, b, _) = self.unify(a, b)?;
                (a, b)
            }
            _ => (a, b),
        };
        let ty = self.ty(&a);
        if ty != self.ty(&b) {
            return Err(GlslError::type_error(format!(
                "?: operands have types {} and {}",
                ty.name(),
                self.ty(&b).name()
            )));
        }
        if let Some(pick) = cond.as_constant().and_then(|c| c.component(0)) {
            let (value, stmts) = if pick.as_bool() {
                (a, then_body)
            } else {
                (b, else_body)
            };
            for stmt in stmts {
                self.emit(stmt);
            }
            return Ok(value);
        }
        let t = self.temp(ty);
        let mut then_body = then_body;
        then_body.push(Statement::assign(Deref::Var(t), a));
        let mut else_body = else_body;
        else_body.push(Statement::assign(Deref::Var(t), b));
        self.emit(Statement::If(If {
            condition: cond,
            then_body,
            else_body,
        }));
        Ok(Rvalue::var(t))
    }
}

/// Result type of `a * b` when either side is a matrix.
fn product_type(base: BaseType, a: &Type, b: &Type) -> Option<Type> {
    match (a, b) {
        (
            Type::Matrix { columns: c1, rows: r1, .. },
            Type::Matrix { columns: c2, rows: r2, .. },
        ) if c1 == r2 => Some(Type::Matrix {
            base,
            columns: *c2,
            rows: *r1,
        }),
        (Type::Matrix { columns, rows, .. }, Type::Vector(_, n)) if columns == n => {
            Some(Type::Vector(base, *rows))
        }
        (Type::Vector(_, n), Type::Matrix { columns, rows, .. }) if rows == n => {
            Some(Type::Vector(base, *columns))
        }
        (Type::Matrix { .. }, Type::Scalar(_)) => Some(a.clone()),
        (Type::Scalar(_), Type::Matrix { .. }) => Some(b.clone()),
        _ => None,
    }
}
