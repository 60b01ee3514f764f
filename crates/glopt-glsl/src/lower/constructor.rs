//! Scalar, vector, matrix, structure and array constructors.
//!
//! Constructors over constants fold to a constant. Otherwise the value is
//! assembled in a temporary with masked component writes.

use alloc::{format, vec::Vec};

use glopt_ir::{
    Assignment, BaseType, Constant, Deref, Rvalue, ScalarValue, Statement, SwizzleMask, Type,
};
use glsl::syntax::Expr;

use super::{expr::folded, Lowerer};
use crate::error::{GlslError, GlslResult};

/// Swizzle selecting `count` components of `value` starting at `first`.
fn components(value: Rvalue, first: u8, count: u8, available: u8) -> GlslResult<Rvalue> {
    if first == 0 && count == available {
        return Ok(value);
    }
    let comps: Vec<u8> = (first..first + count).collect();
    let mask = SwizzleMask::new(&comps).ok_or_else(|| GlslError::type_error("bad component range"))?;
    Ok(folded(Rvalue::swizzle(value, mask)))
}

fn range_mask(first: u8, count: u8) -> u8 {
    ((1u8 << count) - 1) << first
}

impl Lowerer<'_> {
    pub(super) fn constructor(&mut self, ty: Type, args: &[Expr]) -> GlslResult<Rvalue> {
        let mut values = Vec::new();
        for arg in args {
            values.push(self.rvalue(arg)?);
        }
        if values.is_empty() {
            return Err(GlslError::type_error(format!(
                "constructor of {} needs arguments",
                ty.name()
            )));
        }
        match &ty {
            Type::Scalar(base) => self.scalar_constructor(*base, values),
            Type::Vector(base, n) => self.vector_constructor(*base, *n, values),
            Type::Matrix {
                base,
                columns,
                rows,
            } => self.matrix_constructor(*base, *columns, *rows, values),
            Type::Struct(st) => {
                if values.len() != st.fields.len() {
                    return Err(GlslError::type_error(format!(
                        "constructor of '{}' needs {} arguments",
                        st.name,
                        st.fields.len()
                    )));
                }
                let mut converted = Vec::new();
                for (value, field) in values.into_iter().zip(&st.fields) {
                    converted.push(self.coerce(value, &field.ty)?);
                }
                self.aggregate(ty.clone(), converted)
            }
            other => Err(GlslError::type_error(format!(
                "cannot construct {}",
                other.name()
            ))),
        }
    }

    /// Component values of a vector or matrix constructor operand, checking
    /// it is usable.
    fn operand_type(&self, value: &Rvalue) -> GlslResult<Type> {
        let ty = self.ty(value);
        if ty.base_type().is_none() {
            return Err(GlslError::type_error(format!(
                "constructor operand of type {}",
                ty.name()
            )));
        }
        Ok(ty)
    }

    fn scalar_constructor(&mut self, base: BaseType, mut values: Vec<Rvalue>) -> GlslResult<Rvalue> {
        if values.len() != 1 {
            return Err(GlslError::type_error(format!(
                "constructor of {} takes one argument",
                base.scalar_name()
            )));
        }
        let value = values.remove(0);
        let ty = self.operand_type(&value)?;
        let first = if ty.is_matrix() {
            let column = folded(Rvalue::Deref(Deref::array(
                value,
                Rvalue::constant(Constant::int(0)),
            )));
            components(column, 0, 1, ty.vector_elements())?
        } else {
            components(value, 0, 1, ty.vector_elements())?
        };
        self.convert(first, base)
    }

    fn vector_constructor(
        &mut self,
        base: BaseType,
        n: u8,
        values: Vec<Rvalue>,
    ) -> GlslResult<Rvalue> {
        let ty = Type::Vector(base, n);
        if let [single] = values.as_slice() {
            let arg_ty = self.operand_type(single)?;
            if arg_ty.is_scalar() {
                let value = self.convert(single.clone(), base)?;
                if let Some(c) = value.as_constant().and_then(|c| c.component(0)) {
                    if let Some(splat) = Constant::splat(ty.clone(), c) {
                        return Ok(Rvalue::constant(splat));
                    }
                }
                let xs = SwizzleMask::new(&alloc::vec![0; n as usize])
                    .ok_or_else(|| GlslError::type_error("bad vector size"))?;
                return Ok(Rvalue::swizzle(value, xs));
            }
            if arg_ty.is_vector() {
                let available = arg_ty.vector_elements();
                if available < n {
                    return Err(GlslError::type_error(format!(
                        "not enough components to construct {}",
                        ty.name()
                    )));
                }
                let value = components(single.clone(), 0, n, available)?;
                return self.convert(value, base);
            }
        }

        if let Some(c) = self.constant_components(&values, base, n as usize)? {
            return Ok(Rvalue::constant(c_or_err(Constant::from_scalars(ty, &c))?));
        }

        let t = self.temp(ty);
        let mut filled = 0u8;
        for value in values {
            let arg_ty = self.operand_type(&value)?;
            if arg_ty.is_matrix() {
                return Err(GlslError::unsupported("vector constructor from a matrix"));
            }
            if filled >= n {
                return Err(GlslError::type_error("too many arguments to vector constructor"));
            }
            let available = arg_ty.vector_elements();
            let take = available.min(n - filled);
            let part = components(value, 0, take, available)?;
            let part = self.convert(part, base)?;
            self.emit(Statement::Assign(Assignment::masked(
                Deref::Var(t),
                part,
                range_mask(filled, take),
            )));
            filled += take;
        }
        if filled < n {
            return Err(GlslError::type_error("not enough components in vector constructor"));
        }
        Ok(Rvalue::var(t))
    }

    fn matrix_constructor(
        &mut self,
        base: BaseType,
        columns: u8,
        rows: u8,
        values: Vec<Rvalue>,
    ) -> GlslResult<Rvalue> {
        let ty = Type::Matrix {
            base,
            columns,
            rows,
        };
        if let [single] = values.as_slice() {
            let arg_ty = self.operand_type(single)?;
            if arg_ty.is_scalar() {
                return self.diagonal_matrix(&ty, single.clone());
            }
            if arg_ty.is_matrix() {
                return self.resized_matrix(&ty, single.clone(), &arg_ty);
            }
        }

        let total = columns as usize * rows as usize;
        if let Some(c) = self.constant_components(&values, base, total)? {
            return Ok(Rvalue::constant(c_or_err(Constant::from_scalars(ty, &c))?));
        }

        let t = self.temp(ty);
        let mut filled = 0usize;
        for value in values {
            let arg_ty = self.operand_type(&value)?;
            if arg_ty.is_matrix() {
                return Err(GlslError::type_error(
                    "matrix operand mixed with other constructor arguments",
                ));
            }
            let value = self.convert(value, base)?;
            let available = arg_ty.vector_elements();
            let mut used = 0u8;
            while used < available {
                if filled >= total {
                    return Err(GlslError::type_error(
                        "too many arguments to matrix constructor",
                    ));
                }
                let column = (filled / rows as usize) as u8;
                let row = (filled % rows as usize) as u8;
                let take = (available - used).min(rows - row);
                let part = components(value.clone(), used, take, available)?;
                let lhs = Deref::array(Rvalue::var(t), Rvalue::constant(Constant::int(column as i32)));
                self.emit(Statement::Assign(Assignment::masked(
                    lhs,
                    part,
                    range_mask(row, take),
                )));
                used += take;
                filled += take as usize;
            }
        }
        if filled < total {
            return Err(GlslError::type_error("not enough components in matrix constructor"));
        }
        Ok(Rvalue::var(t))
    }

    /// `matN(s)`: `s` on the diagonal, zero elsewhere.
    fn diagonal_matrix(&mut self, ty: &Type, value: Rvalue) -> GlslResult<Rvalue> {
        let (columns, rows) = (ty.matrix_columns(), ty.vector_elements());
        let base = ty.base_type().unwrap_or(BaseType::Float);
        let value = self.convert(value, base)?;
        if let Some(s) = value.as_constant().and_then(|c| c.component(0)) {
            let zero = ScalarValue::Int(0).convert(base);
            let scalars: Vec<ScalarValue> = (0..columns)
                .flat_map(|c| (0..rows).map(move |r| if c == r { s } else { zero }))
                .collect();
            return Ok(Rvalue::constant(c_or_err(Constant::from_scalars(
                ty.clone(),
                &scalars,
            ))?));
        }
        let t = self.temp(ty.clone());
        let zero = c_or_err(Constant::zero(ty.clone()))?;
        self.emit(Statement::assign(Deref::Var(t), Rvalue::constant(zero)));
        for i in 0..columns.min(rows) {
            let lhs = Deref::array(Rvalue::var(t), Rvalue::constant(Constant::int(i as i32)));
            self.emit(Statement::Assign(Assignment::masked(
                lhs,
                value.clone(),
                1 << i,
            )));
        }
        Ok(Rvalue::var(t))
    }

    /// `matN(m)` from another matrix: overlapping components are copied,
    /// the rest come from the identity.
    fn resized_matrix(&mut self, ty: &Type, value: Rvalue, from: &Type) -> GlslResult<Rvalue> {
        let base = ty.base_type().unwrap_or(BaseType::Float);
        let value = self.convert(value, base)?;
        if ty.matrix_columns() == from.matrix_columns()
            && ty.vector_elements() == from.vector_elements()
        {
            return Ok(value);
        }
        let (columns, rows) = (ty.matrix_columns(), ty.vector_elements());
        let (from_columns, from_rows) = (from.matrix_columns(), from.vector_elements());
        if let Some(c) = value.as_constant() {
            let zero = ScalarValue::Int(0).convert(base);
            let one = ScalarValue::Int(1).convert(base);
            let mut scalars = Vec::new();
            for col in 0..columns {
                for row in 0..rows {
                    let v = if col < from_columns && row < from_rows {
                        c.component((col * from_rows + row) as usize)
                            .ok_or_else(|| GlslError::type_error("bad matrix constant"))?
                    } else if col == row {
                        one
                    } else {
                        zero
                    };
                    scalars.push(v);
                }
            }
            return Ok(Rvalue::constant(c_or_err(Constant::from_scalars(
                ty.clone(),
                &scalars,
            ))?));
        }
        let t = self.temp(ty.clone());
        let identity = self.diagonal_matrix(ty, Rvalue::constant(Constant::int(1)))?;
        self.emit(Statement::assign(Deref::Var(t), identity));
        let take = rows.min(from_rows);
        for col in 0..columns.min(from_columns) {
            let index = Rvalue::constant(Constant::int(col as i32));
            let source = Rvalue::Deref(Deref::array(value.clone(), index.clone()));
            let part = components(source, 0, take, from_rows)?;
            self.emit(Statement::Assign(Assignment::masked(
                Deref::array(Rvalue::var(t), index),
                part,
                range_mask(0, take),
            )));
        }
        Ok(Rvalue::var(t))
    }

    /// All components of constant operands, converted to `base`, when
    /// every operand is constant and together they supply at least `n`
    /// components.
    fn constant_components(
        &self,
        values: &[Rvalue],
        base: BaseType,
        n: usize,
    ) -> GlslResult<Option<Vec<ScalarValue>>> {
        let mut scalars = Vec::new();
        for value in values {
            let Some(c) = value.as_constant() else {
                return Ok(None);
            };
            if c.ty.base_type().is_none() {
                return Err(GlslError::type_error(format!(
                    "constructor operand of type {}",
                    c.ty.name()
                )));
            }
            if scalars.len() >= n {
                return Err(GlslError::type_error("too many constructor arguments"));
            }
            scalars.extend(c.components().into_iter().map(|s| s.convert(base)));
        }
        if scalars.len() < n {
            return Err(GlslError::type_error("not enough constructor arguments"));
        }
        scalars.truncate(n);
        Ok(Some(scalars))
    }
}

fn c_or_err(c: Option<Constant>) -> GlslResult<Constant> {
    c.ok_or_else(|| GlslError::type_error("malformed constant"))
}

#[cfg(test)]
mod tests {
    use glopt_ir::ConstantData;

    use super::{
        super::tests::{lower_source, main_body},
        *,
    };

    fn assigned(stmt: &Statement) -> &Rvalue {
        match stmt {
            Statement::Assign(a) => &a.rhs,
            other => panic!("expected an assignment, found {:?}", other),
        }
    }

    #[test]
    fn test_constant_constructors_fold() {
        let unit = lower_source(
            "void main() {\n\
               vec4 a = vec4(1.0, vec2(2, 3), 4.0);\n\
               mat2 m = mat2(2.0);\n\
               ivec2 b = ivec2(vec3(1.5, 2.5, 3.5));\n\
             }",
        )
        .unwrap();
        let body = main_body(&unit);
        let a = assigned(&body[1]).as_constant().unwrap();
        assert_eq!(a.data, ConstantData::Float(alloc::vec![1.0, 2.0, 3.0, 4.0]));
        let m = assigned(&body[3]).as_constant().unwrap();
        assert_eq!(m.data, ConstantData::Float(alloc::vec![2.0, 0.0, 0.0, 2.0]));
        let b = assigned(&body[5]).as_constant().unwrap();
        assert_eq!(b.data, ConstantData::Int(alloc::vec![1, 2]));
    }

    #[test]
    fn test_vector_constructor_with_variables() {
        let unit = lower_source(
            "uniform vec2 p; uniform float z;\n\
             void main() { vec4 v = vec4(p, z, 1.0); }",
        )
        .unwrap();
        let body = main_body(&unit);
        // tmp, tmp.xy = p, tmp.z = z, tmp.w = 1.0, v, v = tmp
        let masks: Vec<u8> = body
            .iter()
            .filter_map(|s| s.as_assign())
            .map(|a| a.write_mask)
            .collect();
        assert_eq!(masks, [0b0011, 0b0100, 0b1000, 0]);
    }

    #[test]
    fn test_scalar_splat_uses_swizzle() {
        let unit = lower_source("uniform float s; void main() { vec3 v = vec3(s); }").unwrap();
        let Rvalue::Swizzle(sw) = assigned(&main_body(&unit)[1]) else {
            panic!("expected a splat swizzle");
        };
        assert_eq!(sw.mask.letters(), "xxx");
    }

    #[test]
    fn test_matrix_from_columns() {
        let unit = lower_source(
            "uniform vec2 a; uniform vec2 b;\n\
             void main() { mat2 m = mat2(a, b); }",
        )
        .unwrap();
        let body = main_body(&unit);
        let column_writes = body
            .iter()
            .filter_map(|s| s.as_assign())
            .filter(|a| matches!(a.lhs, Deref::Array { .. }))
            .count();
        assert_eq!(column_writes, 2);
    }

    #[test]
    fn test_struct_constructor() {
        let unit = lower_source(
            "struct S { float a; int b; };\n\
             void main() { S s = S(1, 2); }",
        )
        .unwrap();
        let c = assigned(&main_body(&unit)[1]).as_constant().unwrap();
        assert_eq!(
            c.struct_field(0),
            Some(&Constant::float(1.0))
        );
    }

    #[test]
    fn test_constructor_errors() {
        for source in [
            "void main() { vec3 v = vec3(1.0, 2.0); }",
            "void main() { vec2 v = vec2(1.0, 2.0, 3.0); }",
            "struct S { float a; }; void main() { S s = S(1.0, 2.0); }",
        ] {
            assert!(
                matches!(lower_source(source), Err(GlslError::Type(_))),
                "{}",
                source
            );
        }
    }
}
