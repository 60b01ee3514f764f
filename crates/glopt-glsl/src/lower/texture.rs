//! Texture lookups.
//!
//! The packed coordinate argument of a lookup is split into the texel
//! coordinate (including the array layer), the shadow comparator and the
//! projective divisor.

use alloc::{format, vec::Vec};

use glopt_ir::{
    BaseType, Constant, Deref, Rvalue, SamplerDim, SamplerType, SwizzleMask, Texture, TextureOp,
    Type,
};

use super::{expr::folded, Lowerer};
use crate::{
    builtins::{TextureFunction, TextureKind},
    error::{GlslError, GlslResult},
};

impl Lowerer<'_> {
    pub(super) fn texture_call(
        &mut self,
        name: &str,
        f: TextureFunction,
        args: Vec<Rvalue>,
    ) -> GlslResult<Rvalue> {
        let mut args = args.into_iter();
        let (sampler, st) = match args.next() {
            Some(Rvalue::Deref(d)) => match d.ty(&self.unit.vars) {
                Type::Sampler(st) => (d, st),
                other => return Err(not_a_sampler(name, &other)),
            },
            Some(other) => return Err(not_a_sampler(name, &self.ty(&other))),
            None => return Err(GlslError::type_error(format!("'{}' needs a sampler", name))),
        };
        let rest: Vec<Rvalue> = args.collect();
        let coord_dims = st.dim.coordinate_components() + st.array as u8;

        if f.kind == TextureKind::Size {
            return self.size_query(name, sampler, st, rest);
        }

        let mut rest = rest.into_iter();
        let coordinate = rest
            .next()
            .ok_or_else(|| GlslError::type_error(format!("'{}' needs a coordinate", name)))?;
        let coord_ty = self.ty(&coordinate);

        if f.kind == TextureKind::Fetch {
            let coordinate = self.coerce(coordinate, &Type::vector(BaseType::Int, coord_dims))?;
            let op = if st.dim == SamplerDim::Ms {
                let sample_index = self.int_operand(name, rest.next())?;
                TextureOp::TxfMs { sample_index }
            } else if matches!(st.dim, SamplerDim::Rect | SamplerDim::Buf) {
                TextureOp::Txf {
                    lod: Rvalue::constant(Constant::int(0)),
                }
            } else {
                TextureOp::Txf {
                    lod: self.int_operand(name, rest.next())?,
                }
            };
            let offset = self.offset_operand(name, f.offset, &st, rest.next())?;
            expect_no_more(name, rest)?;
            return Ok(texture(Texture {
                op,
                ty: Type::vector(st.base, 4),
                sampler,
                coordinate: Some(coordinate),
                projector: None,
                shadow_comparator: None,
                offset,
            }));
        }

        let available = coord_ty.vector_elements();
        if !coord_ty.is_float() || coord_ty.is_matrix() {
            return Err(GlslError::type_error(format!(
                "'{}' coordinate has type {}",
                name,
                coord_ty.name()
            )));
        }

        // Several components are extracted from one value; keep it evaluated
        // once.
        // 1D shadow lookups keep the reference in the third component.
        let cmp_index = coord_dims.max(2);
        let packed = if f.proj || (st.shadow && available > cmp_index) {
            match coordinate {
                Rvalue::Deref(_) | Rvalue::Constant(_) => coordinate,
                other => self.to_temp(other),
            }
        } else {
            coordinate
        };

        let mut shadow_comparator = None;
        let mut projector = None;
        if f.proj {
            let needed = if st.shadow { cmp_index + 2 } else { coord_dims + 1 };
            if available < needed {
                return Err(GlslError::type_error(format!(
                    "'{}' needs a {}-component coordinate",
                    name, needed
                )));
            }
            projector = Some(component(packed.clone(), available - 1)?);
            if st.shadow {
                shadow_comparator = Some(component(packed.clone(), cmp_index)?);
            }
        } else if st.shadow && available > cmp_index {
            shadow_comparator = Some(component(packed.clone(), cmp_index)?);
        }
        if available < coord_dims {
            return Err(GlslError::type_error(format!(
                "'{}' needs a {}-component coordinate",
                name, coord_dims
            )));
        }
        let coordinate = prefix(packed, coord_dims, available)?;
        if st.shadow && shadow_comparator.is_none() && f.kind != TextureKind::QueryLod {
            let cmp = rest.next().ok_or_else(|| {
                GlslError::type_error(format!("'{}' needs a depth reference", name))
            })?;
            shadow_comparator = Some(self.coerce(cmp, &Type::FLOAT)?);
        }

        let (op, ty) = match f.kind {
            TextureKind::QueryLod => (TextureOp::Lod, Type::vector(BaseType::Float, 2)),
            TextureKind::Lod => {
                let lod = self.float_operand(name, rest.next())?;
                (TextureOp::Txl { lod }, result_type(&st))
            }
            TextureKind::Grad => {
                let gradient = Type::vector(BaseType::Float, st.dim.coordinate_components());
                let dpdx = self.gradient_operand(name, rest.next(), &gradient)?;
                let dpdy = self.gradient_operand(name, rest.next(), &gradient)?;
                (TextureOp::Txd { dpdx, dpdy }, result_type(&st))
            }
            _ => (TextureOp::Tex, result_type(&st)),
        };
        let offset = self.offset_operand(name, f.offset, &st, rest.next())?;
        let op = match (op, rest.next()) {
            (TextureOp::Tex, Some(bias)) => TextureOp::Txb {
                bias: self.coerce(bias, &Type::FLOAT)?,
            },
            (op, None) => op,
            (_, Some(_)) => return Err(too_many(name)),
        };
        expect_no_more(name, rest)?;

        Ok(texture(Texture {
            op,
            ty,
            sampler,
            coordinate: Some(coordinate),
            projector,
            shadow_comparator,
            offset,
        }))
    }

    fn size_query(
        &mut self,
        name: &str,
        sampler: Deref,
        st: SamplerType,
        args: Vec<Rvalue>,
    ) -> GlslResult<Rvalue> {
        let mut args = args.into_iter();
        let lod = match st.dim {
            SamplerDim::Rect | SamplerDim::Buf | SamplerDim::Ms => {
                Rvalue::constant(Constant::int(0))
            }
            _ => self.int_operand(name, args.next())?,
        };
        expect_no_more(name, args)?;
        let dims = match st.dim {
            SamplerDim::Cube => 2,
            dim => dim.coordinate_components(),
        } + st.array as u8;
        Ok(texture(Texture {
            op: TextureOp::Txs { lod },
            ty: Type::vector(BaseType::Int, dims),
            sampler,
            coordinate: None,
            projector: None,
            shadow_comparator: None,
            offset: None,
        }))
    }

    fn int_operand(&self, name: &str, value: Option<Rvalue>) -> GlslResult<Rvalue> {
        let value = value.ok_or_else(|| missing(name))?;
        self.coerce(value, &Type::INT)
    }

    fn float_operand(&self, name: &str, value: Option<Rvalue>) -> GlslResult<Rvalue> {
        let value = value.ok_or_else(|| missing(name))?;
        self.coerce(value, &Type::FLOAT)
    }

    fn gradient_operand(&self, name: &str, value: Option<Rvalue>, ty: &Type) -> GlslResult<Rvalue> {
        let value = value.ok_or_else(|| missing(name))?;
        self.coerce(value, ty)
    }

    fn offset_operand(
        &self,
        name: &str,
        wanted: bool,
        st: &SamplerType,
        value: Option<Rvalue>,
    ) -> GlslResult<Option<Rvalue>> {
        if !wanted {
            return Ok(None);
        }
        let value = value.ok_or_else(|| missing(name))?;
        let value = self.coerce(value, &Type::vector(BaseType::Int, st.dim.coordinate_components()))?;
        if !value.is_constant() {
            return Err(GlslError::type_error(format!(
                "'{}' offset must be a constant expression",
                name
            )));
        }
        Ok(Some(value))
    }
}

fn texture(t: Texture) -> Rvalue {
    Rvalue::Texture(alloc::boxed::Box::new(t))
}

/// Depth comparisons yield a float; other lookups a four-component texel.
fn result_type(st: &SamplerType) -> Type {
    if st.shadow {
        Type::FLOAT
    } else {
        Type::vector(st.base, 4)
    }
}

fn component(value: Rvalue, i: u8) -> GlslResult<Rvalue> {
    let mask = SwizzleMask::new(&[i]).ok_or_else(|| GlslError::type_error("bad component"))?;
    Ok(folded(Rvalue::swizzle(value, mask)))
}

/// First `n` components of a value with `available` components.
fn prefix(value: Rvalue, n: u8, available: u8) -> GlslResult<Rvalue> {
    if n >= available {
        return Ok(value);
    }
    let mask = SwizzleMask::identity(n).ok_or_else(|| GlslError::type_error("bad component"))?;
    Ok(folded(Rvalue::swizzle(value, mask)))
}

fn not_a_sampler(name: &str, ty: &Type) -> GlslError {
    GlslError::type_error(format!("'{}' called on {}, not a sampler", name, ty.name()))
}

fn missing(name: &str) -> GlslError {
    GlslError::type_error(format!("too few arguments to '{}'", name))
}

fn too_many(name: &str) -> GlslError {
    GlslError::type_error(format!("too many arguments to '{}'", name))
}

fn expect_no_more(name: &str, mut rest: impl Iterator<Item = Rvalue>) -> GlslResult<()> {
    match rest.next() {
        Some(_) => Err(too_many(name)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use glopt_ir::Statement;

    use super::{
        super::tests::{lower_source, main_body},
        *,
    };

    fn lookup(source: &str) -> Texture {
        let unit = lower_source(source).unwrap();
        let body = main_body(&unit);
        for stmt in body.iter().rev() {
            if let Statement::Assign(a) = stmt {
                if let Rvalue::Texture(t) = &a.rhs {
                    return (**t).clone();
                }
            }
        }
        panic!("no texture lookup in {:?}", body);
    }

    fn letters(rv: &Rvalue) -> alloc::string::String {
        match rv {
            Rvalue::Swizzle(s) => s.mask.letters(),
            other => panic!("expected a swizzle, found {:?}", other),
        }
    }

    #[test]
    fn test_legacy_sample() {
        let t = lookup(
            "uniform sampler2D s; uniform vec2 uv;\n\
             void main() { gl_FragColor = texture2D(s, uv, 0.5); }",
        );
        assert_eq!(t.op, TextureOp::Txb { bias: Rvalue::constant(Constant::float(0.5)) });
        assert_eq!(t.ty, Type::vector(BaseType::Float, 4));
        assert!(t.projector.is_none());
    }

    #[test]
    fn test_shadow_projection_splits_coordinate() {
        let t = lookup(
            "uniform sampler2DShadow s; uniform vec4 q;\n\
             void main() { float d = shadow2DProj(s, q); }",
        );
        assert_eq!(t.ty, Type::FLOAT);
        assert_eq!(letters(t.coordinate.as_ref().unwrap()), "xy");
        assert_eq!(letters(t.shadow_comparator.as_ref().unwrap()), "z");
        assert_eq!(letters(t.projector.as_ref().unwrap()), "w");
    }

    #[test]
    fn test_explicit_lod_and_offset() {
        let t = lookup(
            "uniform sampler2D s; uniform vec2 uv;\n\
             void main() { vec4 c = textureLodOffset(s, uv, 2, ivec2(1, -1)); }",
        );
        assert_eq!(t.op, TextureOp::Txl { lod: Rvalue::constant(Constant::float(2.0)) });
        assert!(t.offset.unwrap().is_constant());
    }

    #[test]
    fn test_size_query() {
        let t = lookup(
            "uniform samplerCube s;\n\
             void main() { ivec2 size = textureSize(s, 0); }",
        );
        assert_eq!(t.ty, Type::vector(BaseType::Int, 2));
        assert!(t.coordinate.is_none());
    }

    #[test]
    fn test_texel_fetch() {
        let t = lookup(
            "uniform sampler2D s; uniform ivec2 p;\n\
             void main() { vec4 c = texelFetch(s, p, 0); }",
        );
        assert!(matches!(t.op, TextureOp::Txf { .. }));
    }

    #[test]
    fn test_texture_errors() {
        for source in [
            "uniform vec2 uv; void main() { vec4 c = texture2D(uv, uv); }",
            "uniform sampler2D s; void main() { vec4 c = texture2DProj(s, vec2(0.5)); }",
            "uniform sampler2D s; uniform vec2 uv; void main() { vec4 c = texture2D(s, uv, 1.0, 2.0); }",
            "uniform sampler2D s; uniform vec2 uv; uniform ivec2 o;\n\
             void main() { vec4 c = textureOffset(s, uv, o); }",
        ] {
            assert!(lower_source(source).is_err(), "{}", source);
        }
    }
}
