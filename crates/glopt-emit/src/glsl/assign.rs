//! Assignments.

use glopt_ir::{full_mask, mask_letters, Assignment, Constant, Deref, ExprOp, Rvalue, Type, VarId};

use super::Printer;

impl Printer<'_> {
    pub(super) fn assignment(&mut self, a: &Assignment) {
        if let Some((var, step)) = self.increment(a) {
            let name = self.ctx.name(var, &self.unit.vars);
            self.push(&name);
            if step.ty.is_integer() && step.is_one() {
                self.push("++");
            } else {
                self.push(" += ");
                self.constant(&step);
            }
            return;
        }
        if self.array_copy(a) {
            return;
        }
        if let Some(e) = a.rhs.as_expression() {
            if e.op == ExprOp::VectorInsert && e.operands.len() == 3 {
                self.vector_insert(a, &e.operands);
                return;
            }
        }
        self.plain_assignment(a);
    }

    /// `v = v + c` on a whole scalar, printed as `v++` or `v += c`.
    fn increment(&self, a: &Assignment) -> Option<(VarId, Constant)> {
        let vars = &self.unit.vars;
        if a.condition.is_some() {
            return None;
        }
        let var = a.whole_var(vars)?;
        let e = a.rhs.as_expression()?;
        if e.op != ExprOp::Add || e.operands.len() != 2 {
            return None;
        }
        let (x, y) = (&e.operands[0], &e.operands[1]);
        let step = if x.as_var() == Some(var) {
            y.as_constant()?
        } else if y.as_var() == Some(var) {
            x.as_constant()?
        } else {
            return None;
        };
        let ty = vars.ty(var);
        if !ty.is_scalar() || step.ty != ty {
            return None;
        }
        Some((var, step.clone()))
    }

    /// Element-wise copy of an array on targets without array assignment.
    fn array_copy(&mut self, a: &Assignment) -> bool {
        if self.target.supports_array_assignment() || a.condition.is_some() {
            return false;
        }
        let unit = self.unit;
        let (Type::Array(le, ln), Some(rhs_var)) = (a.lhs.ty(&unit.vars), a.rhs.as_var()) else {
            return false;
        };
        let Type::Array(re, rn) = unit.vars.ty(rhs_var) else {
            return false;
        };
        if ln != rn || le != re {
            return false;
        }
        let rhs_name = self.ctx.name(rhs_var, &unit.vars);
        for i in 0..ln {
            if i > 0 {
                self.push("; ");
            }
            self.deref(&a.lhs);
            self.push(&alloc::format!("[{}] = {}[{}]", i, rhs_name, i));
        }
        true
    }

    /// `lhs = vector_insert(b, c, k)` as a copy of `b` followed by a store
    /// of `c` into component `k`.
    fn vector_insert(&mut self, a: &Assignment, ops: &[Rvalue]) {
        let (base, value, index) = (&ops[0], &ops[1], &ops[2]);
        let aliased = matches!((&a.lhs, base.as_var()), (Deref::Var(l), Some(b)) if *l == b);
        if !aliased {
            self.guard(a);
            self.deref(&a.lhs);
            self.push(" = ");
            self.rvalue(base);
            self.push("; ");
        }
        self.guard(a);
        self.deref(&a.lhs);
        match index.as_constant().and_then(|c| c.get_int_component(0)) {
            Some(k) if (0..4).contains(&k) => {
                self.push(".");
                self.push(&mask_letters(1u8 << k));
            }
            _ => {
                self.push("[");
                self.rvalue(index);
                self.push("]");
            }
        }
        self.push(" = ");
        self.rvalue(value);
    }

    fn guard(&mut self, a: &Assignment) {
        if let Some(cond) = &a.condition {
            self.push("if (");
            self.rvalue(cond);
            self.push(") ");
        }
    }

    fn plain_assignment(&mut self, a: &Assignment) {
        let vars = &self.unit.vars;
        let lhs_ty = a.lhs.ty(vars);
        let rhs_ty = a.rhs.ty(vars);
        let masked = lhs_ty.is_vector() && a.write_mask != 0 && a.write_mask != full_mask(&lhs_ty);
        let mask = if masked { a.write_mask } else { 0 };
        let mask_count = mask.count_ones() as u8;

        self.guard(a);
        self.deref(&a.lhs);
        if masked {
            self.push(".");
            self.push(&mask_letters(mask));
        }
        self.push(" = ");

        // Type the value must have to be stored.
        let target_ty = if masked {
            lhs_ty.with_components(mask_count).unwrap_or(lhs_ty.clone())
        } else {
            lhs_ty.clone()
        };
        let retype = lhs_ty.is_numeric()
            && rhs_ty.is_numeric()
            && (lhs_ty.base_type() != rhs_ty.base_type() || (!masked && lhs_ty != rhs_ty));
        let narrow = masked && rhs_ty.vector_elements() > mask_count;

        if retype {
            self.push(&target_ty.name());
            self.push("(");
        }
        if narrow {
            self.push("(");
            self.rvalue(&a.rhs);
            self.push(").");
            self.push(&mask_letters(full_mask(&target_ty)));
        } else {
            self.rvalue(&a.rhs);
        }
        if retype {
            self.push(")");
        }
    }
}
