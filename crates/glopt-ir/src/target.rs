//! Target descriptor: language version, profile, stage, extensions and
//! limits.
//!
//! Read-only for passes and emitters.

use alloc::vec::Vec;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderStage {
    #[default]
    Vertex,
    TessCtrl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

/// Desktop API profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiProfile {
    #[default]
    Compatibility,
    Core,
}

/// Extensions that change what the emitter may print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    ArbShaderTextureLod,
    ArbDrawInstanced,
    ExtGpuShader4,
    OesStandardDerivatives,
    ExtFragDepth,
    ExtDrawBuffers,
    ExtShaderFramebufferFetch,
    ArbShaderBitEncoding,
    ExtTextureArray,
}

impl Extension {
    /// All extensions in header order.
    pub const ALL: [Extension; 9] = [
        Extension::ArbShaderTextureLod,
        Extension::ArbDrawInstanced,
        Extension::ExtGpuShader4,
        Extension::OesStandardDerivatives,
        Extension::ExtFragDepth,
        Extension::ExtDrawBuffers,
        Extension::ExtShaderFramebufferFetch,
        Extension::ArbShaderBitEncoding,
        Extension::ExtTextureArray,
    ];

    /// Name without the `GL_` prefix.
    pub fn name(self) -> &'static str {
        match self {
            Extension::ArbShaderTextureLod => "ARB_shader_texture_lod",
            Extension::ArbDrawInstanced => "ARB_draw_instanced",
            Extension::ExtGpuShader4 => "EXT_gpu_shader4",
            Extension::OesStandardDerivatives => "OES_standard_derivatives",
            Extension::ExtFragDepth => "EXT_frag_depth",
            Extension::ExtDrawBuffers => "EXT_draw_buffers",
            Extension::ExtShaderFramebufferFetch => "EXT_shader_framebuffer_fetch",
            Extension::ArbShaderBitEncoding => "ARB_shader_bit_encoding",
            Extension::ExtTextureArray => "EXT_texture_array",
        }
    }

    /// Look up by name, with or without the `GL_` prefix.
    pub fn from_name(name: &str) -> Option<Extension> {
        let name = name.strip_prefix("GL_").unwrap_or(name);
        Self::ALL.iter().copied().find(|e| e.name() == name)
    }
}

/// Set of enabled extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    enabled: Vec<Extension>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, ext: Extension) {
        if !self.enabled.contains(&ext) {
            self.enabled.push(ext);
        }
    }

    pub fn disable(&mut self, ext: Extension) {
        self.enabled.retain(|e| *e != ext);
    }

    pub fn is_enabled(&self, ext: Extension) -> bool {
        self.enabled.contains(&ext)
    }

    /// Enabled extensions in header order.
    pub fn iter(&self) -> impl Iterator<Item = Extension> + '_ {
        Extension::ALL
            .iter()
            .copied()
            .filter(move |e| self.is_enabled(*e))
    }
}

/// Capability limits consulted by passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Loops with more iterations are not unrolled
    pub max_unroll_iterations: u32,
    /// Deepest `if` nesting flattened into conditional assignments
    pub max_if_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_unroll_iterations: 10,
            max_if_depth: 10,
        }
    }
}

/// Language version, profile, stage, extensions and limits of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Version number as written in `#version` (100, 110, 330, ...)
    pub version: u32,
    pub es: bool,
    pub profile: ApiProfile,
    pub stage: ShaderStage,
    pub extensions: Extensions,
    pub limits: Limits,
}

impl Default for Target {
    fn default() -> Self {
        Self::new(110, ShaderStage::Vertex)
    }
}

impl Target {
    /// Target for `version`. Versions 100, 300, 310 and 320 are ES.
    pub fn new(version: u32, stage: ShaderStage) -> Self {
        Self {
            version,
            es: is_es_version(version),
            profile: ApiProfile::Compatibility,
            stage,
            extensions: Extensions::new(),
            limits: Limits::default(),
        }
    }

    /// Float bit-pattern builtins (`uintBitsToFloat`) are available.
    pub fn supports_bit_encoding(&self) -> bool {
        if self.es {
            self.version >= 300
        } else {
            self.version >= 330 || self.extensions.is_enabled(Extension::ArbShaderBitEncoding)
        }
    }

    /// `u`-suffixed literals are accepted.
    pub fn supports_unsigned_literals(&self) -> bool {
        if self.es {
            self.version >= 300
        } else {
            self.version >= 130
        }
    }

    /// Stage interface uses `in`/`out` rather than `attribute`/`varying`.
    pub fn uses_in_out_keywords(&self) -> bool {
        self.version >= 130
    }

    /// Whole arrays may be assigned.
    pub fn supports_array_assignment(&self) -> bool {
        self.version >= 120
    }

    /// Non-ES profile where `ARB` suffixed builtins apply.
    pub fn is_desktop(&self) -> bool {
        !self.es
    }
}

/// ES versions by number.
pub fn is_es_version(version: u32) -> bool {
    matches!(version, 100 | 300 | 310 | 320)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_queries() {
        let t = Target::new(110, ShaderStage::Fragment);
        assert!(!t.es);
        assert!(!t.supports_bit_encoding());
        assert!(!t.supports_unsigned_literals());
        assert!(!t.uses_in_out_keywords());
        assert!(!t.supports_array_assignment());

        let t = Target::new(330, ShaderStage::Fragment);
        assert!(t.supports_bit_encoding());
        assert!(t.supports_unsigned_literals());
        assert!(t.uses_in_out_keywords());
        assert!(t.supports_array_assignment());
    }

    #[test]
    fn test_es_versions() {
        let t = Target::new(100, ShaderStage::Vertex);
        assert!(t.es);
        assert!(!t.supports_unsigned_literals());
        assert!(!t.uses_in_out_keywords());
        let t = Target::new(300, ShaderStage::Vertex);
        assert!(t.es);
        assert!(t.supports_bit_encoding());
        assert!(t.supports_unsigned_literals());
    }

    #[test]
    fn test_bit_encoding_extension() {
        let mut t = Target::new(150, ShaderStage::Vertex);
        assert!(!t.supports_bit_encoding());
        t.extensions.enable(Extension::ArbShaderBitEncoding);
        assert!(t.supports_bit_encoding());
    }

    #[test]
    fn test_extension_order_and_lookup() {
        let mut exts = Extensions::new();
        exts.enable(Extension::ExtTextureArray);
        exts.enable(Extension::ArbShaderTextureLod);
        exts.enable(Extension::ArbShaderTextureLod);
        let order: Vec<_> = exts.iter().collect();
        assert_eq!(
            order,
            alloc::vec![Extension::ArbShaderTextureLod, Extension::ExtTextureArray]
        );
        assert_eq!(
            Extension::from_name("GL_EXT_frag_depth"),
            Some(Extension::ExtFragDepth)
        );
        assert_eq!(Extension::from_name("GL_NV_nothing"), None);
    }
}
