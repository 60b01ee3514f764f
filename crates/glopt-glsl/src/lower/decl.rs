//! Declarations: variables, qualifiers, structures and functions.

use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use glopt_ir::{
    Constant, ConstantData, Decorations, Deref, Function, Interpolation, Precision, Rvalue,
    ShaderStage, Signature, Statement, StorageMode, StructField, StructType, Type, Variable,
};
use glsl::syntax::{
    ArraySpecifier, ArraySpecifierDimension, Declaration, Expr, FullySpecifiedType,
    FunctionDefinition, FunctionParameterDeclaration, FunctionPrototype, Identifier,
    InitDeclaratorList, Initializer, InterpolationQualifier, LayoutQualifierSpec,
    PrecisionQualifier, StorageQualifier, StructSpecifier, TypeQualifier, TypeQualifierSpec,
    TypeSpecifier, TypeSpecifierNonArray,
};

use super::Lowerer;
use crate::{
    error::{GlslError, GlslResult},
    symbols::{FunctionSignature, Parameter, ParameterQualifier},
    types::non_array_type,
};

/// Qualifiers of a variable declaration.
#[derive(Debug, Clone, Default)]
struct Qualifiers {
    mode: Option<StorageMode>,
    constant: bool,
    decorations: Decorations,
}

/// A prototype with its parameters resolved.
struct Prototype {
    name: String,
    return_type: Type,
    params: Vec<(Option<String>, Parameter)>,
}

impl Lowerer<'_> {
    pub(super) fn declaration(&mut self, d: &Declaration) -> GlslResult<()> {
        match d {
            Declaration::FunctionPrototype(p) => self.function_prototype(p),
            Declaration::InitDeclaratorList(list) => self.init_declarator_list(list),
            // Default precision statements leave nothing in the IR.
            Declaration::Precision(..) => Ok(()),
            Declaration::Block(_) => Err(GlslError::unsupported("interface blocks")),
            Declaration::Global(qualifier, idents) => self.global_qualifier(qualifier, idents),
        }
    }

    fn init_declarator_list(&mut self, list: &InitDeclaratorList) -> GlslResult<()> {
        let head = &list.head;
        let spec = &head.ty.ty;
        if let TypeSpecifierNonArray::Struct(s) = &spec.ty {
            self.struct_specifier(s)?;
        }
        let base = self.type_specifier(spec)?;
        let quals = self.qualifiers(head.ty.qualifier.as_ref())?;

        if let Some(name) = &head.name {
            self.declare_one(
                &name.0,
                &base,
                head.array_specifier.as_ref(),
                head.initializer.as_ref(),
                &quals,
            )?;
        }
        for d in &list.tail {
            self.declare_one(
                &d.ident.ident.0,
                &base,
                d.ident.array_spec.as_ref(),
                d.initializer.as_ref(),
                &quals,
            )?;
        }
        Ok(())
    }

    fn declare_one(
        &mut self,
        name: &str,
        base: &Type,
        array: Option<&ArraySpecifier>,
        init: Option<&Initializer>,
        quals: &Qualifiers,
    ) -> GlslResult<()> {
        if name.starts_with("gl_") {
            return Err(GlslError::type_error(format!(
                "identifier '{}' uses the reserved gl_ prefix",
                name
            )));
        }
        let global = self.in_global_scope();
        let mode = quals.mode.unwrap_or(StorageMode::Auto);
        if base.is_void() {
            return Err(GlslError::type_error(format!(
                "variable '{}' declared void",
                name
            )));
        }

        // The initializer sees the enclosing declaration of the same name.
        let (ty, value) = match self.array_dimensions(array)? {
            Some(dims) if dims.contains(&None) => {
                let init = init.ok_or_else(|| {
                    GlslError::type_error(format!("unsized array '{}' needs an initializer", name))
                })?;
                let value = self.initializer(init, None)?;
                let ty = self.ty(&value);
                if ty.element_type() != Some(&array_of(base.clone(), &dims[1..])?) {
                    return Err(GlslError::type_error(format!(
                        "initializer of '{}' has type {}",
                        name,
                        ty.name()
                    )));
                }
                (ty, Some(value))
            }
            dims => {
                let ty = match dims {
                    Some(dims) => array_of(base.clone(), &dims)?,
                    None => base.clone(),
                };
                let value = match init {
                    Some(init) => Some(self.initializer(init, Some(&ty))?),
                    None => None,
                };
                (ty, value)
            }
        };

        let mut var = Variable::new(Some(name.to_string()), ty.clone(), mode);
        var.decorations = quals.decorations.clone();

        if quals.constant {
            let value = value.ok_or_else(|| {
                GlslError::type_error(format!("const variable '{}' needs an initializer", name))
            })?;
            let c = self.fold_constant(value).ok_or_else(|| {
                GlslError::type_error(format!(
                    "initializer of const '{}' is not a constant expression",
                    name
                ))
            })?;
            var.read_only = true;
            var.constant_value = Some(c);
            let id = self.unit.add_var(var);
            self.emit(Statement::Declare(id));
            return self.declare_symbol(name, id);
        }

        match (mode, value) {
            (_, None) => {
                let id = self.unit.add_var(var);
                self.emit(Statement::Declare(id));
                self.declare_symbol(name, id)
            }
            (StorageMode::Uniform, Some(value)) => {
                var.constant_value = Some(self.fold_constant(value).ok_or_else(|| {
                    GlslError::type_error(format!(
                        "initializer of uniform '{}' is not a constant expression",
                        name
                    ))
                })?);
                let id = self.unit.add_var(var);
                self.emit(Statement::Declare(id));
                self.declare_symbol(name, id)
            }
            (StorageMode::Auto, Some(value)) => {
                let id = self.unit.add_var(var);
                self.emit(Statement::Declare(id));
                self.emit(Statement::assign(Deref::Var(id), value));
                if global {
                    log::trace!("global initializer for '{}'", name);
                }
                self.declare_symbol(name, id)
            }
            (_, Some(_)) => Err(GlslError::type_error(format!(
                "cannot initialize '{}' with this storage qualifier",
                name
            ))),
        }
    }

    /// Value of an initializer, converted to `ty` when the type is known.
    fn initializer(&mut self, init: &Initializer, ty: Option<&Type>) -> GlslResult<Rvalue> {
        match init {
            Initializer::Simple(e) => {
                let value = self.rvalue(e)?;
                match ty {
                    Some(ty) => self.coerce(value, ty),
                    None => Ok(value),
                }
            }
            Initializer::List(items) => {
                let ty = ty.ok_or_else(|| {
                    GlslError::unsupported("initializer list for an unsized array")
                })?;
                let fields: Vec<Type> = match ty {
                    Type::Array(elem, n) => (0..*n).map(|_| (**elem).clone()).collect(),
                    Type::Struct(st) => st.fields.iter().map(|f| f.ty.clone()).collect(),
                    Type::Vector(base, n) => (0..*n).map(|_| Type::Scalar(*base)).collect(),
                    Type::Matrix { base, columns, rows } => (0..*columns)
                        .map(|_| Type::Vector(*base, *rows))
                        .collect(),
                    _ => {
                        return Err(GlslError::type_error(format!(
                            "initializer list for {}",
                            ty.name()
                        )))
                    }
                };
                if fields.len() != items.0.len() {
                    return Err(GlslError::type_error(format!(
                        "initializer list for {} has {} elements",
                        ty.name(),
                        items.0.len()
                    )));
                }
                let mut values = Vec::new();
                for (item, field_ty) in items.0.iter().zip(&fields) {
                    values.push(self.initializer(item, Some(field_ty))?);
                }
                self.aggregate(ty.clone(), values)
            }
        }
    }

    /// Sizes of the array dimensions, `None` for an unsized one.
    pub(super) fn array_dimensions(
        &mut self,
        array: Option<&ArraySpecifier>,
    ) -> GlslResult<Option<Vec<Option<u32>>>> {
        let Some(array) = array else {
            return Ok(None);
        };
        let mut dims = Vec::new();
        for (i, dim) in array.dimensions.0.iter().enumerate() {
            match dim {
                ArraySpecifierDimension::Unsized if i == 0 => dims.push(None),
                ArraySpecifierDimension::Unsized => {
                    return Err(GlslError::type_error("only the outer array dimension may be unsized"))
                }
                ArraySpecifierDimension::ExplicitlySized(e) => dims.push(Some(self.array_size(e)?)),
            }
        }
        Ok(Some(dims))
    }

    pub(super) fn array_size(&mut self, e: &Expr) -> GlslResult<u32> {
        let n = self.const_int(e, "array size")?;
        u32::try_from(n)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| GlslError::type_error(format!("array size {} must be positive", n)))
    }

    /// Full type of a type specifier, including `float[4]` style arrays.
    pub(super) fn type_specifier(&mut self, spec: &TypeSpecifier) -> GlslResult<Type> {
        let base = non_array_type(&spec.ty, &self.symbols)?;
        match self.array_dimensions(spec.array_specifier.as_ref())? {
            Some(dims) if dims.contains(&None) => {
                Err(GlslError::type_error("array type needs an explicit size"))
            }
            Some(dims) => array_of(base, &dims),
            None => Ok(base),
        }
    }

    fn struct_specifier(&mut self, s: &StructSpecifier) -> GlslResult<()> {
        let name = s
            .name
            .as_ref()
            .ok_or_else(|| GlslError::unsupported("anonymous structure type"))?;
        let mut fields = Vec::new();
        for field in s.fields.0.iter() {
            if let TypeSpecifierNonArray::Struct(inner) = &field.ty.ty {
                self.struct_specifier(inner)?;
            }
            let base = self.type_specifier(&field.ty)?;
            for ident in field.identifiers.0.iter() {
                let ty = match self.array_dimensions(ident.array_spec.as_ref())? {
                    Some(dims) if dims.contains(&None) => {
                        return Err(GlslError::type_error(format!(
                            "field '{}' needs an explicit array size",
                            ident.ident.0
                        )))
                    }
                    Some(dims) => array_of(base.clone(), &dims)?,
                    None => base.clone(),
                };
                if fields.iter().any(|f: &StructField| f.name == ident.ident.0) {
                    return Err(GlslError::type_error(format!(
                        "duplicate field '{}' in structure '{}'",
                        ident.ident.0, name.0
                    )));
                }
                fields.push(StructField {
                    name: ident.ident.0.clone(),
                    ty,
                });
            }
        }
        let st = StructType {
            name: name.0.clone(),
            fields,
        };
        self.symbols
            .declare_struct(st.clone())
            .map_err(GlslError::type_error)?;
        self.unit.structs.push(st);
        Ok(())
    }

    fn qualifiers(&mut self, q: Option<&TypeQualifier>) -> GlslResult<Qualifiers> {
        let mut quals = Qualifiers::default();
        let Some(q) = q else {
            return Ok(quals);
        };
        let stage = self.target.stage;
        let global = self.in_global_scope();
        for spec in q.qualifiers.0.iter() {
            match spec {
                TypeQualifierSpec::Storage(s) => {
                    let mode = match s {
                        StorageQualifier::Const => {
                            quals.constant = true;
                            None
                        }
                        StorageQualifier::In => Some(StorageMode::ShaderIn),
                        StorageQualifier::Out => Some(StorageMode::ShaderOut),
                        StorageQualifier::Uniform => Some(StorageMode::Uniform),
                        StorageQualifier::Buffer => Some(StorageMode::ShaderStorage),
                        StorageQualifier::Shared => Some(StorageMode::ShaderShared),
                        StorageQualifier::Attribute if stage == ShaderStage::Vertex => {
                            Some(StorageMode::ShaderIn)
                        }
                        StorageQualifier::Varying if stage == ShaderStage::Vertex => {
                            Some(StorageMode::ShaderOut)
                        }
                        StorageQualifier::Varying if stage == ShaderStage::Fragment => {
                            Some(StorageMode::ShaderIn)
                        }
                        StorageQualifier::Centroid => {
                            quals.decorations.centroid = true;
                            None
                        }
                        StorageQualifier::Sample => {
                            quals.decorations.sample = true;
                            None
                        }
                        StorageQualifier::Patch => {
                            quals.decorations.patch = true;
                            None
                        }
                        StorageQualifier::Coherent => {
                            quals.decorations.memory.coherent = true;
                            None
                        }
                        StorageQualifier::Volatile => {
                            quals.decorations.memory.volatile = true;
                            None
                        }
                        StorageQualifier::Restrict => {
                            quals.decorations.memory.restrict = true;
                            None
                        }
                        StorageQualifier::ReadOnly => {
                            quals.decorations.memory.read_only = true;
                            None
                        }
                        StorageQualifier::WriteOnly => {
                            quals.decorations.memory.write_only = true;
                            None
                        }
                        other => {
                            return Err(GlslError::type_error(format!(
                                "storage qualifier {:?} not allowed here",
                                other
                            )))
                        }
                    };
                    if let Some(mode) = mode {
                        if !global {
                            return Err(GlslError::type_error(format!(
                                "{:?} qualifier on a local variable",
                                s
                            )));
                        }
                        quals.mode = Some(mode);
                    }
                }
                TypeQualifierSpec::Layout(layout) => {
                    for id in layout.ids.0.iter() {
                        self.layout_qualifier(id, &mut quals.decorations)?;
                    }
                }
                TypeQualifierSpec::Precision(p) => quals.decorations.precision = precision(p),
                TypeQualifierSpec::Interpolation(i) => {
                    quals.decorations.interpolation = match i {
                        InterpolationQualifier::Smooth => Interpolation::Smooth,
                        InterpolationQualifier::Flat => Interpolation::Flat,
                        InterpolationQualifier::NoPerspective => Interpolation::NoPerspective,
                    }
                }
                TypeQualifierSpec::Invariant => {
                    quals.decorations.invariant = true;
                    quals.decorations.explicit_invariant = true;
                }
                TypeQualifierSpec::Precise => quals.decorations.precise = true,
            }
        }
        Ok(quals)
    }

    fn layout_qualifier(
        &mut self,
        spec: &LayoutQualifierSpec,
        decorations: &mut Decorations,
    ) -> GlslResult<()> {
        let LayoutQualifierSpec::Identifier(id, value) = spec else {
            log::debug!("ignoring layout qualifier {:?}", spec);
            return Ok(());
        };
        let value = match value {
            Some(e) => Some(self.const_int(e, "layout qualifier value")?),
            None => None,
        };
        let unsigned = |v: Option<i64>| {
            v.and_then(|v| u32::try_from(v).ok()).ok_or_else(|| {
                GlslError::type_error(format!("layout '{}' needs a non-negative value", id.0))
            })
        };
        match id.0.as_str() {
            "location" => {
                decorations.location = Some(unsigned(value)? as i32);
                decorations.explicit_location = true;
            }
            "binding" => decorations.binding = Some(unsigned(value)?),
            "component" => decorations.component = Some(unsigned(value)?),
            "stream" => decorations.stream = Some(unsigned(value)?),
            "bindless_sampler" | "bindless_image" => decorations.bindless = true,
            "bound_sampler" | "bound_image" => decorations.bound = true,
            other => match glopt_ir::image_format_from_name(other) {
                Some(format) => decorations.image_format = Some(format),
                None => log::debug!("ignoring layout qualifier '{}'", other),
            },
        }
        Ok(())
    }

    /// `invariant gl_Position;` and friends.
    fn global_qualifier(&mut self, q: &TypeQualifier, idents: &[Identifier]) -> GlslResult<()> {
        for spec in q.qualifiers.0.iter() {
            if !matches!(spec, TypeQualifierSpec::Invariant) {
                return Err(GlslError::unsupported(format!(
                    "redeclaration with qualifier {:?}",
                    spec
                )));
            }
        }
        for ident in idents {
            let id = self.lookup_variable(&ident.0)?;
            if let Some(var) = self.unit.vars.get_mut(id) {
                var.decorations.invariant = true;
                var.decorations.explicit_invariant = true;
            }
        }
        Ok(())
    }

    fn prototype(&mut self, p: &FunctionPrototype) -> GlslResult<Prototype> {
        let return_type = self.fully_specified_type(&p.ty)?;
        let mut params = Vec::new();
        for param in &p.parameters {
            let (qualifier, name, ty) = match param {
                FunctionParameterDeclaration::Named(q, d) => {
                    let base = self.type_specifier(&d.ty)?;
                    let ty = match self.array_dimensions(d.ident.array_spec.as_ref())? {
                        Some(dims) if dims.contains(&None) => {
                            return Err(GlslError::type_error(format!(
                                "parameter '{}' needs an explicit array size",
                                d.ident.ident.0
                            )))
                        }
                        Some(dims) => array_of(base, &dims)?,
                        None => base,
                    };
                    (q.as_ref(), Some(d.ident.ident.0.clone()), ty)
                }
                FunctionParameterDeclaration::Unnamed(q, spec) => {
                    (q.as_ref(), None, self.type_specifier(spec)?)
                }
            };
            // `f(void)`
            if ty.is_void() && name.is_none() && p.parameters.len() == 1 {
                break;
            }
            if ty.is_void() {
                return Err(GlslError::type_error(format!(
                    "parameter of '{}' declared void",
                    p.name.0
                )));
            }
            let qualifier = parameter_qualifier(qualifier)?;
            params.push((name, Parameter { qualifier, ty }));
        }
        Ok(Prototype {
            name: p.name.0.clone(),
            return_type,
            params,
        })
    }

    fn fully_specified_type(&mut self, ty: &FullySpecifiedType) -> GlslResult<Type> {
        if let TypeSpecifierNonArray::Struct(s) = &ty.ty.ty {
            self.struct_specifier(s)?;
        }
        self.type_specifier(&ty.ty)
    }

    fn function_prototype(&mut self, p: &FunctionPrototype) -> GlslResult<()> {
        let proto = self.prototype(p)?;
        let sig = FunctionSignature {
            params: proto.params.iter().map(|(_, p)| p.clone()).collect(),
            return_type: proto.return_type.clone(),
            defined: false,
        };
        let index = self
            .symbols
            .declare_function(&proto.name, sig)
            .map_err(GlslError::type_error)?;
        let params = proto
            .params
            .into_iter()
            .map(|(name, p)| {
                self.unit
                    .add_var(Variable::new(name, p.ty, p.qualifier.storage_mode()))
            })
            .collect();
        self.add_signature(&proto.name, index, Signature::new(proto.return_type, params));
        Ok(())
    }

    pub(super) fn function_definition(&mut self, def: &FunctionDefinition) -> GlslResult<()> {
        if !self.in_global_scope() {
            return Err(GlslError::type_error("nested function definition"));
        }
        let proto = self.prototype(&def.prototype)?;
        if proto.name == "main" && (!proto.params.is_empty() || !proto.return_type.is_void()) {
            return Err(GlslError::type_error("main() must be declared void main()"));
        }
        let sig = FunctionSignature {
            params: proto.params.iter().map(|(_, p)| p.clone()).collect(),
            return_type: proto.return_type.clone(),
            defined: true,
        };
        let index = self
            .symbols
            .declare_function(&proto.name, sig)
            .map_err(GlslError::type_error)?;

        self.symbols.push_scope();
        let mut params = Vec::new();
        for (name, p) in proto.params {
            let id = self.unit.add_var(Variable::new(
                name.clone(),
                p.ty,
                p.qualifier.storage_mode(),
            ));
            if let Some(name) = name {
                self.declare_symbol(&name, id)?;
            }
            params.push(id);
        }
        self.return_type = Some(proto.return_type.clone());
        // Parameters and the outermost body statements share a scope.
        let body = self.collect(|this| {
            for stmt in &def.statement.statement_list {
                this.statement(stmt)?;
            }
            Ok(())
        });
        self.return_type = None;
        self.symbols.pop_scope();
        let (_, body) = body?;

        log::debug!("lowered function {}", proto.name);
        let mut sig = Signature::new(proto.return_type, params);
        sig.body = body;
        sig.is_defined = true;
        self.add_signature(&proto.name, index, sig);
        Ok(())
    }

    /// Place overload `index` of `name`, keeping the function where its
    /// first declaration appeared.
    fn add_signature(&mut self, name: &str, index: usize, sig: Signature) {
        let Some(globals) = self.blocks.first_mut() else {
            return;
        };
        let existing = globals.iter_mut().find_map(|s| match s {
            Statement::Function(f) if f.name == name => Some(f),
            _ => None,
        });
        match existing {
            Some(f) => match f.signatures.get_mut(index) {
                Some(old) if !old.is_defined || sig.is_defined => *old = sig,
                Some(_) => {}
                None => f.signatures.push(sig),
            },
            None => {
                let mut f = Function::new(name.to_string());
                f.signatures.push(sig);
                globals.push(Statement::Function(f));
            }
        }
    }

    /// Constant or temporary holding an aggregate built from `values`.
    pub(super) fn aggregate(&mut self, ty: Type, values: Vec<Rvalue>) -> GlslResult<Rvalue> {
        let constants: Option<Vec<Constant>> = values
            .iter()
            .map(|v| v.as_constant().cloned())
            .collect();
        if let Some(constants) = constants {
            let data = match &ty {
                Type::Array(..) => Some(ConstantData::Array(constants)),
                Type::Struct(_) => Some(ConstantData::Struct(constants)),
                _ => None,
            };
            if let Some(data) = data {
                return Ok(Rvalue::constant(Constant { ty, data }));
            }
            let scalars: Vec<_> = constants.iter().flat_map(Constant::components).collect();
            if let Some(c) = Constant::from_scalars(ty.clone(), &scalars) {
                return Ok(Rvalue::constant(c));
            }
        }
        let t = self.temp(ty.clone());
        for (i, value) in values.into_iter().enumerate() {
            let lhs = match &ty {
                Type::Struct(_) => Deref::record(Rvalue::var(t), i),
                _ => Deref::array(Rvalue::var(t), Rvalue::constant(Constant::int(i as i32))),
            };
            self.emit(Statement::assign(lhs, value));
        }
        Ok(Rvalue::var(t))
    }
}

fn parameter_qualifier(q: Option<&TypeQualifier>) -> GlslResult<ParameterQualifier> {
    let mut constant = false;
    let mut direction = None;
    if let Some(q) = q {
        for spec in q.qualifiers.0.iter() {
            match spec {
                TypeQualifierSpec::Storage(StorageQualifier::Const) => constant = true,
                TypeQualifierSpec::Storage(StorageQualifier::In) => {
                    direction = direction.or(Some(ParameterQualifier::In))
                }
                TypeQualifierSpec::Storage(StorageQualifier::Out) => {
                    direction = Some(ParameterQualifier::Out)
                }
                TypeQualifierSpec::Storage(StorageQualifier::InOut) => {
                    direction = Some(ParameterQualifier::InOut)
                }
                TypeQualifierSpec::Precision(_) => {}
                other => {
                    return Err(GlslError::type_error(format!(
                        "qualifier {:?} not allowed on a parameter",
                        other
                    )))
                }
            }
        }
    }
    match (constant, direction.unwrap_or(ParameterQualifier::In)) {
        (true, ParameterQualifier::In) => Ok(ParameterQualifier::ConstIn),
        (true, _) => Err(GlslError::type_error(
            "const is only allowed on in parameters",
        )),
        (false, d) => Ok(d),
    }
}

fn precision(p: &PrecisionQualifier) -> Precision {
    match p {
        PrecisionQualifier::High => Precision::High,
        PrecisionQualifier::Medium => Precision::Medium,
        PrecisionQualifier::Low => Precision::Low,
    }
}

/// `base` wrapped in array dimensions, outermost first.
fn array_of(base: Type, dims: &[Option<u32>]) -> GlslResult<Type> {
    let mut ty = base;
    for dim in dims.iter().rev() {
        let n = dim.ok_or_else(|| GlslError::type_error("array size required"))?;
        ty = Type::array(ty, n);
    }
    Ok(ty)
}
