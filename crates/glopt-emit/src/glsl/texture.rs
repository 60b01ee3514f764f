//! Texture builtin calls.
//!
//! The builtin name is assembled from the operation, the sampler shape and
//! the enabled extensions. The coordinate, shadow comparator and projector
//! are packed into one vector argument when they fit.

use alloc::{format, string::String};

use glopt_ir::{Extension, SamplerDim, SamplerType, Texture, TextureOp, Type};

use super::Printer;

impl Printer<'_> {
    pub(super) fn texture(&mut self, t: &Texture) {
        let sampler = match t.sampler.ty(&self.unit.vars) {
            Type::Sampler(s) => s,
            Type::Array(elem, _) => match *elem {
                Type::Sampler(s) => s,
                _ => return self.unprintable("texture on a non-sampler"),
            },
            _ => return self.unprintable("texture on a non-sampler"),
        };

        if let TextureOp::Txs { lod } = &t.op {
            self.push("textureSize(");
            self.deref(&t.sampler);
            if !matches!(sampler.dim, SamplerDim::Rect | SamplerDim::Buf | SamplerDim::Ms) {
                self.push(", ");
                self.rvalue(lod);
            }
            self.push(")");
            return;
        }

        let coord_dims = t
            .coordinate
            .as_ref()
            .map_or(0, |c| c.ty(&self.unit.vars).vector_elements());
        let packed = coord_dims
            + t.shadow_comparator.is_some() as u8
            + t.projector.is_some() as u8;
        let sampler_dims =
            sampler.dim.coordinate_components() + sampler.shadow as u8 + sampler.array as u8;
        let projective = matches!(
            t.op,
            TextureOp::Tex | TextureOp::Txb { .. } | TextureOp::Txl { .. } | TextureOp::Txd { .. }
        ) && packed > sampler_dims;

        let name = self.texture_name(t, &sampler, projective);
        self.push(&name);
        self.push("(");
        self.deref(&t.sampler);

        if let Some(coord) = &t.coordinate {
            self.push(", ");
            let extras = t.shadow_comparator.is_some() || t.projector.is_some();
            if extras && packed <= 4 {
                self.push(&Type::vector(glopt_ir::BaseType::Float, packed).name());
                self.push("(");
                self.rvalue(coord);
                if let Some(cmp) = &t.shadow_comparator {
                    self.push(", ");
                    self.rvalue(cmp);
                }
                if let Some(proj) = &t.projector {
                    self.push(", ");
                    self.rvalue(proj);
                }
                self.push(")");
            } else {
                self.rvalue(coord);
                // Five packed components do not fit: the comparator goes
                // alone.
                if let Some(cmp) = &t.shadow_comparator {
                    self.push(", ");
                    self.rvalue(cmp);
                }
            }
        }

        match &t.op {
            TextureOp::Txl { lod } | TextureOp::Txf { lod } => {
                self.push(", ");
                self.rvalue(lod);
            }
            TextureOp::TxfMs { sample_index } => {
                self.push(", ");
                self.rvalue(sample_index);
            }
            TextureOp::Txd { dpdx, dpdy } => {
                self.push(", ");
                self.rvalue(dpdx);
                self.push(", ");
                self.rvalue(dpdy);
            }
            _ => {}
        }
        if let Some(offset) = &t.offset {
            self.push(", ");
            self.rvalue(offset);
        }
        if let TextureOp::Txb { bias } = &t.op {
            self.push(", ");
            self.rvalue(bias);
        }
        self.push(")");
    }

    fn texture_name(&self, t: &Texture, sampler: &SamplerType, projective: bool) -> String {
        let target = self.target;
        let mut name = if target.version < 130 {
            let stem = if sampler.shadow { "shadow" } else { "texture" };
            format!("{}{}", stem, sampler.dim.legacy_function_suffix())
        } else {
            String::from(match t.op {
                TextureOp::Txf { .. } | TextureOp::TxfMs { .. } => "texelFetch",
                TextureOp::Lod => "textureQueryLod",
                _ => "texture",
            })
        };

        if sampler.array && target.extensions.is_enabled(Extension::ExtTextureArray) {
            name.push_str("Array");
        }
        if projective {
            name.push_str("Proj");
        }
        match t.op {
            TextureOp::Txl { .. } => name.push_str("Lod"),
            TextureOp::Txd { .. } => name.push_str("Grad"),
            _ => {}
        }
        if t.offset.is_some() {
            name.push_str("Offset");
        }
        if matches!(t.op, TextureOp::Txd { .. })
            && target.is_desktop()
            && target.extensions.is_enabled(Extension::ArbShaderTextureLod)
        {
            name.push_str("ARB");
        }
        name
    }
}
