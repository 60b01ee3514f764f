//! Texture lookup function names.
//!
//! Both the legacy spellings (`texture2DProjLod`, `shadow2D`,
//! `textureCubeLodEXT`) and the unified ones (`textureGradOffset`) decompose
//! into a kind plus projection and offset flags.

/// Lookup family of a texture function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Implicit lod, optional bias
    Sample,
    Lod,
    Grad,
    Fetch,
    Size,
    QueryLod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureFunction {
    pub kind: TextureKind,
    /// Coordinate carries a projective divisor in its last component
    pub proj: bool,
    /// A constant texel offset follows the lod operands
    pub offset: bool,
}

const LEGACY_DIMS: [&str; 8] = [
    "2DRect", "1DArray", "2DArray", "Cube", "Rect", "1D", "2D", "3D",
];

/// Decompose a texture function name.
pub fn texture_function(name: &str) -> Option<TextureFunction> {
    let fixed = |kind, offset| {
        Some(TextureFunction {
            kind,
            proj: false,
            offset,
        })
    };
    match name {
        "textureSize" => return fixed(TextureKind::Size, false),
        "textureQueryLod" | "textureQueryLOD" => return fixed(TextureKind::QueryLod, false),
        "texelFetch" => return fixed(TextureKind::Fetch, false),
        "texelFetchOffset" => return fixed(TextureKind::Fetch, true),
        _ => {}
    }

    let (mut rest, legacy) = if let Some(r) = name.strip_prefix("texture") {
        (r, false)
    } else {
        (name.strip_prefix("shadow")?, true)
    };
    let dim = LEGACY_DIMS.iter().find(|d| rest.starts_with(**d));
    if let Some(d) = dim {
        rest = &rest[d.len()..];
    } else if legacy {
        return None;
    }

    let mut f = TextureFunction {
        kind: TextureKind::Sample,
        proj: false,
        offset: false,
    };
    if let Some(r) = rest.strip_prefix("Proj") {
        f.proj = true;
        rest = r;
    }
    if let Some(r) = rest.strip_prefix("Lod") {
        f.kind = TextureKind::Lod;
        rest = r;
    } else if let Some(r) = rest.strip_prefix("Grad") {
        f.kind = TextureKind::Grad;
        rest = r;
    }
    if let Some(r) = rest.strip_prefix("Offset") {
        f.offset = true;
        rest = r;
    }
    match rest {
        "" | "ARB" | "EXT" => Some(f),
        _ => None,
    }
}
