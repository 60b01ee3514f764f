//! Output header, structure types and variable declarations.

use alloc::{format, string::String, vec::Vec};

use glopt_ir::{
    image_format_name, Extension, Interpolation, Precision, ShaderStage, StorageMode, StructType,
    Type, VarId, Variable,
};

use super::Printer;

impl Printer<'_> {
    /// `#version` line and one `#extension` line per enabled extension.
    pub(super) fn header(&mut self) {
        let target = self.target;
        let mut line = format!("#version {}", target.version);
        if target.es && target.version >= 300 {
            line.push_str(" es");
        }
        self.push(&line);
        self.push("\n");
        for ext in target.extensions.iter() {
            if ext == Extension::ExtDrawBuffers && !(target.es && target.version < 300) {
                continue;
            }
            self.push(&format!("#extension GL_{} : enable\n", ext.name()));
        }
    }

    pub(super) fn struct_decl(&mut self, s: &StructType) {
        self.push("struct ");
        self.push(&s.name);
        self.push(" {\n");
        for field in &s.fields {
            self.push("  ");
            self.push(&field.ty.name());
            self.push(" ");
            self.push(&field.name);
            self.push(&array_dims(&field.ty));
            self.push(";\n");
        }
        self.push("};\n");
    }

    /// Qualifiers, type, name and constant initializer of a variable.
    pub(super) fn declaration(&mut self, id: VarId) {
        let unit = self.unit;
        let Some(var) = unit.vars.get(id) else {
            self.unprintable("declaration of an unknown variable");
            return;
        };
        if var.is_builtin() {
            if var.decorations.invariant {
                self.push("invariant ");
            }
            let name = self.ctx.name(id, &unit.vars);
            self.push(&name);
            return;
        }

        let qualifiers = self.qualifiers(var);
        self.push(&qualifiers);
        self.push(&var.ty().name());
        self.push(" ");
        let name = self.ctx.name(id, &unit.vars);
        self.push(&name);
        self.push(&array_dims(var.ty()));

        let takes_initializer = !var.mode().is_parameter()
            && !matches!(var.mode(), StorageMode::ShaderIn | StorageMode::ShaderOut);
        if let Some(value) = var.constant_value.as_ref().filter(|_| takes_initializer) {
            self.push(" = ");
            self.constant(value);
        }
    }

    /// Qualifier words in declaration order. `stream` goes in the leading
    /// layout group, ahead of the storage keyword.
    fn qualifiers(&self, var: &Variable) -> String {
        let d = &var.decorations;
        let mut out = String::new();

        let mut layout: Vec<String> = Vec::new();
        if let Some(b) = d.binding {
            layout.push(format!("binding={}", b));
        }
        if let (Some(l), true) = (d.location, d.explicit_location) {
            layout.push(format!("location={}", l));
        }
        if let Some(c) = d.component {
            layout.push(format!("component={}", c));
        }
        if let Some(s) = d.stream {
            layout.push(format!("stream={}", s));
        }
        push_layout(&mut out, &layout);

        for (set, word) in [
            (d.centroid, "centroid "),
            (d.sample, "sample "),
            (d.patch, "patch "),
        ] {
            if set {
                out.push_str(word);
            }
        }

        let mut image: Vec<String> = Vec::new();
        if d.bindless {
            image.push(String::from("bindless_sampler"));
        }
        if d.bound {
            image.push(String::from("bound_sampler"));
        }
        if let Some(f) = d.image_format {
            match image_format_name(f) {
                Some(name) => image.push(String::from(name)),
                None => log::warn!("image format {:#x} has no layout spelling", f),
            }
        }
        push_layout(&mut out, &image);

        for (set, word) in [
            (d.memory.read_only, "readonly "),
            (d.memory.write_only, "writeonly "),
            (d.memory.coherent, "coherent "),
            (d.memory.volatile, "volatile "),
            (d.memory.restrict, "restrict "),
            (d.invariant, "invariant "),
            (d.precise, "precise "),
        ] {
            if set {
                out.push_str(word);
            }
        }
        out.push_str(match d.precision {
            Precision::None => "",
            Precision::High => "highp ",
            Precision::Medium => "mediump ",
            Precision::Low => "lowp ",
        });
        out.push_str(self.storage_keyword(var));
        out.push_str(match d.interpolation {
            Interpolation::None => "",
            Interpolation::Smooth => "smooth ",
            Interpolation::Flat => "flat ",
            Interpolation::NoPerspective => "noperspective ",
        });
        out
    }

    /// Storage keyword, spelled for the target version and stage.
    fn storage_keyword(&self, var: &Variable) -> &'static str {
        let legacy = !self.target.uses_in_out_keywords();
        let stage = self.target.stage;
        match var.mode() {
            StorageMode::Auto if var.read_only && var.constant_value.is_some() => "const ",
            StorageMode::Auto | StorageMode::Temporary | StorageMode::SystemValue => "",
            StorageMode::Uniform => "uniform ",
            StorageMode::ShaderStorage => "buffer ",
            StorageMode::ShaderShared => "shared ",
            StorageMode::ShaderIn if legacy && stage == ShaderStage::Vertex => "attribute ",
            StorageMode::ShaderIn if legacy && stage == ShaderStage::Fragment => "varying ",
            StorageMode::ShaderIn => "in ",
            StorageMode::ShaderOut if legacy && stage == ShaderStage::Vertex => "varying ",
            StorageMode::ShaderOut => "out ",
            StorageMode::FunctionIn => "in ",
            StorageMode::FunctionOut => "out ",
            StorageMode::FunctionInOut => "inout ",
            StorageMode::ConstIn => "const in ",
        }
    }
}

fn push_layout(out: &mut String, items: &[String]) {
    if !items.is_empty() {
        out.push_str("layout(");
        out.push_str(&items.join(", "));
        out.push_str(") ");
    }
}

/// Bracketed array sizes, outermost first (`[2][3]`).
pub(super) fn array_dims(ty: &Type) -> String {
    let mut out = String::new();
    let mut t = ty;
    while let Type::Array(elem, n) = t {
        out.push_str(&format!("[{}]", n));
        t = elem;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_dims() {
        assert_eq!(array_dims(&Type::FLOAT), "");
        assert_eq!(
            array_dims(&Type::array(Type::array(Type::FLOAT, 3), 2)),
            "[2][3]"
        );
    }
}
