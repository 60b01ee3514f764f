use alloc::{
    string::{String, ToString},
    vec,
    vec::Vec,
};

use glopt_ir::{
    Assignment, BaseType, Constant, Deref, ExprOp, Function, If, LoopJump, Rvalue, SamplerDim,
    SamplerType, ShaderStage, Signature, Statement, StorageMode, SwizzleMask, Target, Texture,
    TextureOp, Type, Unit, VarId, Variable,
};

use super::GlslEmitter;

fn var(unit: &mut Unit, name: &str, ty: Type, mode: StorageMode) -> VarId {
    unit.add_var(Variable::new(Some(name.to_string()), ty, mode))
}

fn main_with(unit: &mut Unit, body: Vec<Statement>) {
    let mut f = Function::new("main".to_string());
    let mut sig = Signature::new(Type::Void, Vec::new());
    sig.is_defined = true;
    sig.body = body;
    f.signatures.push(sig);
    unit.items.push(Statement::Function(f));
}

fn assign(v: VarId, rhs: Rvalue) -> Statement {
    Statement::assign(Deref::Var(v), rhs)
}

fn int(v: i32) -> Rvalue {
    Rvalue::constant(Constant::int(v))
}

fn if_break(condition: Rvalue) -> Statement {
    Statement::If(If {
        condition,
        then_body: vec![Statement::LoopJump(LoopJump::Break)],
        else_body: Vec::new(),
    })
}

fn step(v: VarId, by: i32) -> Statement {
    assign(
        v,
        Rvalue::binop(ExprOp::Add, Type::INT, Rvalue::var(v), int(by)),
    )
}

fn emit(unit: &Unit, version: u32) -> String {
    let target = Target::new(version, ShaderStage::Fragment);
    GlslEmitter::new(&target).emit(unit)
}

const VEC2: Type = Type::Vector(BaseType::Float, 2);
const VEC3: Type = Type::Vector(BaseType::Float, 3);
const VEC4: Type = Type::Vector(BaseType::Float, 4);

#[test]
fn test_swizzled_uniform_copy() {
    let mut unit = Unit::new();
    let u = var(&mut unit, "u", VEC4, StorageMode::Uniform);
    let o = var(&mut unit, "o", VEC3, StorageMode::ShaderOut);
    unit.items.push(Statement::Declare(u));
    unit.items.push(Statement::Declare(o));
    let xyz = SwizzleMask::parse("xyz").unwrap();
    main_with(&mut unit, vec![assign(o, Rvalue::swizzle(Rvalue::var(u), xyz))]);

    assert_eq!(
        emit(&unit, 330),
        "#version 330\nuniform vec4 u;\nout vec3 o;\nvoid main()\n{\n  o = u.xyz;\n}\n"
    );
}

#[test]
fn test_legacy_interface_keywords() {
    let mut unit = Unit::new();
    let v = var(&mut unit, "v", VEC2, StorageMode::ShaderIn);
    unit.items.push(Statement::Declare(v));
    assert_eq!(emit(&unit, 110), "#version 110\nvarying vec2 v;\n");

    let target = Target::new(110, ShaderStage::Vertex);
    assert_eq!(
        GlslEmitter::new(&target).emit(&unit),
        "#version 110\nattribute vec2 v;\n"
    );
}

#[test]
fn test_canonical_for_loop() {
    let mut unit = Unit::new();
    let sum = var(&mut unit, "sum", Type::INT, StorageMode::Auto);
    let i = var(&mut unit, "i", Type::INT, StorageMode::Auto);
    let lp = unit.new_loop(vec![
        if_break(Rvalue::binop(ExprOp::Gequal, Type::BOOL, Rvalue::var(i), int(10))),
        assign(
            sum,
            Rvalue::binop(ExprOp::Add, Type::INT, Rvalue::var(sum), Rvalue::var(i)),
        ),
        step(i, 1),
    ]);
    main_with(
        &mut unit,
        vec![
            Statement::Declare(sum),
            assign(sum, int(0)),
            Statement::Declare(i),
            assign(i, int(0)),
            Statement::Loop(lp),
        ],
    );

    assert_eq!(
        emit(&unit, 330),
        "#version 330\n\
         void main()\n\
         {\n  \
           int sum;\n  \
           sum = 0;\n  \
           for (int i = 0; i < 10; i++)\n  \
           {\n    \
             sum = (sum + i);\n  \
           }\n\
         }\n"
    );
}

#[test]
fn test_declaration_used_after_loop_stays() {
    let mut unit = Unit::new();
    let i = var(&mut unit, "i", Type::INT, StorageMode::Auto);
    let out = var(&mut unit, "n", Type::INT, StorageMode::ShaderOut);
    unit.items.push(Statement::Declare(out));
    let lp = unit.new_loop(vec![
        if_break(Rvalue::binop(ExprOp::Gequal, Type::BOOL, Rvalue::var(i), int(4))),
        step(i, 2),
    ]);
    main_with(
        &mut unit,
        vec![
            Statement::Declare(i),
            assign(i, int(0)),
            Statement::Loop(lp),
            assign(out, Rvalue::var(i)),
        ],
    );

    let text = emit(&unit, 330);
    assert!(text.contains("  int i;\n  for (i = 0; i < 4; i += 2)\n"), "{}", text);
    assert!(text.contains("  n = i;\n"), "{}", text);
}

#[test]
fn test_two_induction_variables_print_while() {
    let mut unit = Unit::new();
    let i = var(&mut unit, "i", Type::INT, StorageMode::Auto);
    let j = var(&mut unit, "j", Type::INT, StorageMode::Auto);
    let lp = unit.new_loop(vec![
        if_break(Rvalue::binop(ExprOp::Gequal, Type::BOOL, Rvalue::var(i), int(10))),
        step(j, 2),
        step(i, 1),
    ]);
    main_with(
        &mut unit,
        vec![
            Statement::Declare(i),
            assign(i, int(0)),
            Statement::Declare(j),
            assign(j, int(0)),
            Statement::Loop(lp),
        ],
    );

    let text = emit(&unit, 330);
    assert!(!text.contains("for ("), "{}", text);
    assert!(text.contains("  i = 0;\n"), "{}", text);
    assert!(
        text.contains(
            "  while (true)\n  {\n    if ((i >= 10))\n    {\n      break;\n    }\n    j += 2;\n    i++;\n  }\n"
        ),
        "{}",
        text
    );
}

#[test]
fn test_vector_insert() {
    let mut unit = Unit::new();
    let v = var(&mut unit, "v", VEC4, StorageMode::Auto);
    let w = var(&mut unit, "w", VEC4, StorageMode::Auto);
    let f = var(&mut unit, "f", Type::FLOAT, StorageMode::Uniform);
    unit.items.push(Statement::Declare(f));
    let insert = |base: VarId, value: Rvalue, index: Rvalue| {
        Rvalue::expr(
            ExprOp::VectorInsert,
            VEC4,
            vec![Rvalue::var(base), value, index],
        )
    };
    main_with(
        &mut unit,
        vec![
            Statement::Declare(v),
            Statement::Declare(w),
            assign(v, insert(v, Rvalue::constant(Constant::float(1.0)), int(2))),
            assign(w, insert(v, Rvalue::var(f), int(1))),
            assign(w, insert(w, Rvalue::var(f), Rvalue::var(f))),
        ],
    );

    let text = emit(&unit, 330);
    assert!(text.contains("  v.z = 1.0;\n"), "{}", text);
    assert!(text.contains("  w = v; w.y = f;\n"), "{}", text);
    assert!(text.contains("  w[f] = f;\n"), "{}", text);
}

#[test]
fn test_write_mask_with_conversion() {
    let mut unit = Unit::new();
    let o = var(&mut unit, "o", VEC4, StorageMode::ShaderOut);
    let k = var(&mut unit, "k", Type::Vector(BaseType::Int, 2), StorageMode::Uniform);
    let u = var(&mut unit, "u", VEC4, StorageMode::Uniform);
    main_with(
        &mut unit,
        vec![
            Statement::Assign(Assignment::masked(Deref::Var(o), Rvalue::var(k), 0b0101)),
            Statement::Assign(Assignment::masked(Deref::Var(o), Rvalue::var(u), 0b1010)),
        ],
    );

    let text = emit(&unit, 330);
    assert!(text.contains("  o.xz = vec2(k);\n"), "{}", text);
    assert!(text.contains("  o.yw = (u).xy;\n"), "{}", text);
}

#[test]
fn test_conditional_assignment() {
    let mut unit = Unit::new();
    let x = var(&mut unit, "x", Type::FLOAT, StorageMode::Auto);
    let c = var(&mut unit, "c", Type::BOOL, StorageMode::Uniform);
    let mut a = Assignment::new(Deref::Var(x), Rvalue::constant(Constant::float(2.0)));
    a.condition = Some(Rvalue::var(c));
    main_with(&mut unit, vec![Statement::Declare(x), Statement::Assign(a)]);
    assert!(emit(&unit, 330).contains("  if (c) x = 2.0;\n"));
}

#[test]
fn test_legacy_array_copy_is_element_wise() {
    let mut unit = Unit::new();
    let a = var(&mut unit, "a", Type::array(Type::FLOAT, 3), StorageMode::Auto);
    let b = var(&mut unit, "b", Type::array(Type::FLOAT, 3), StorageMode::Auto);
    main_with(
        &mut unit,
        vec![
            Statement::Declare(a),
            Statement::Declare(b),
            assign(a, Rvalue::var(b)),
        ],
    );

    let legacy = emit(&unit, 110);
    assert!(
        legacy.contains("  a[0] = b[0]; a[1] = b[1]; a[2] = b[2];\n"),
        "{}",
        legacy
    );
    let modern = emit(&unit, 120);
    assert!(modern.contains("  a = b;\n"), "{}", modern);
}

#[test]
fn test_increments() {
    let mut unit = Unit::new();
    let x = var(&mut unit, "x", Type::FLOAT, StorageMode::Auto);
    let i = var(&mut unit, "i", Type::INT, StorageMode::Auto);
    let float = |v: f32| Rvalue::constant(Constant::float(v));
    main_with(
        &mut unit,
        vec![
            Statement::Declare(x),
            Statement::Declare(i),
            assign(
                x,
                Rvalue::binop(ExprOp::Add, Type::FLOAT, Rvalue::var(x), float(2.5)),
            ),
            assign(
                x,
                Rvalue::binop(ExprOp::Add, Type::FLOAT, float(1.0), Rvalue::var(x)),
            ),
            step(i, 1),
            step(i, 3),
        ],
    );

    let text = emit(&unit, 130);
    assert!(text.contains("  x += 2.5;\n"), "{}", text);
    assert!(text.contains("  x += 1.0;\n"), "{}", text);
    assert!(text.contains("  i++;\n"), "{}", text);
    assert!(text.contains("  i += 3;\n"), "{}", text);
}

#[test]
fn test_declaration_qualifier_order() {
    let mut unit = Unit::new();
    let img = var(&mut unit, "img", Type::FLOAT, StorageMode::Uniform);
    let g = var(&mut unit, "g", VEC4, StorageMode::ShaderOut);
    let w = var(&mut unit, "w", Type::FLOAT, StorageMode::Uniform);
    {
        let d = &mut unit.vars.get_mut(img).unwrap().decorations;
        d.binding = Some(2);
        d.bindless = true;
        d.image_format = Some(0x8814);
        d.memory.read_only = true;
    }
    {
        let d = &mut unit.vars.get_mut(g).unwrap().decorations;
        d.location = Some(0);
        d.explicit_location = true;
        d.stream = Some(1);
        d.centroid = true;
    }
    unit.vars.get_mut(w).unwrap().decorations.image_format = Some(0x1234);
    for v in [img, g, w] {
        unit.items.push(Statement::Declare(v));
    }

    let text = emit(&unit, 450);
    assert!(
        text.contains(
            "layout(binding=2) layout(bindless_sampler, rgba32f) readonly uniform float img;\n"
        ),
        "{}",
        text
    );
    assert!(
        text.contains("layout(location=0, stream=1) centroid out vec4 g;\n"),
        "{}",
        text
    );
    // unknown formats have no spelling and are dropped
    assert!(text.contains("\nuniform float w;\n"), "{}", text);
}

#[test]
fn test_global_initializer_replayed_in_main() {
    let mut unit = Unit::new();
    let g = var(&mut unit, "g", Type::FLOAT, StorageMode::Auto);
    unit.items.push(Statement::Declare(g));
    unit.items
        .push(assign(g, Rvalue::constant(Constant::float(1.5))));
    main_with(&mut unit, vec![Statement::Discard(None)]);

    assert_eq!(
        emit(&unit, 110),
        "#version 110\nfloat g;\n//;\nvoid main()\n{\n  g = 1.5;\n  discard;\n}\n"
    );
}

#[test]
fn test_global_statement_after_main_dropped() {
    let mut unit = Unit::new();
    let g = var(&mut unit, "g", Type::FLOAT, StorageMode::Auto);
    unit.items.push(Statement::Declare(g));
    main_with(&mut unit, Vec::new());
    unit.items
        .push(assign(g, Rvalue::constant(Constant::float(1.5))));

    let text = emit(&unit, 110);
    assert!(!text.contains("g = 1.5"), "{}", text);
    assert!(text.ends_with("}\n//;\n"), "{}", text);
}

#[test]
fn test_prototype_and_parameters() {
    let mut unit = Unit::new();
    let x = var(&mut unit, "x", Type::FLOAT, StorageMode::FunctionIn);
    let y = unit.add_var(Variable::new(None, Type::FLOAT, StorageMode::FunctionInOut));
    let mut f = Function::new("f".to_string());
    f.signatures.push(Signature::new(Type::FLOAT, vec![x, y]));
    unit.items.push(Statement::Function(f));

    assert_eq!(
        emit(&unit, 110),
        "#version 110\nfloat f(in float x, inout float parameter_1);\n"
    );
}

#[test]
fn test_builtins_not_redeclared() {
    let mut unit = Unit::new();
    let color = var(&mut unit, "gl_FragColor", VEC4, StorageMode::ShaderOut);
    let pos = var(&mut unit, "gl_Position", VEC4, StorageMode::ShaderOut);
    unit.vars.get_mut(pos).unwrap().decorations.invariant = true;
    unit.items.push(Statement::Declare(color));
    unit.items.push(Statement::Declare(pos));
    main_with(
        &mut unit,
        vec![assign(
            color,
            Rvalue::constant(Constant::splat(VEC4, glopt_ir::ScalarValue::Float(0.0)).unwrap()),
        )],
    );

    assert_eq!(
        emit(&unit, 110),
        "#version 110\ninvariant gl_Position;\nvoid main()\n{\n  gl_FragColor = vec4(0.0, 0.0, 0.0, 0.0);\n}\n"
    );
}

#[test]
fn test_locals_renamed_against_globals() {
    let mut unit = Unit::new();
    let g = var(&mut unit, "x", Type::FLOAT, StorageMode::Uniform);
    let l = var(&mut unit, "x", Type::FLOAT, StorageMode::Auto);
    unit.items.push(Statement::Declare(g));
    main_with(
        &mut unit,
        vec![Statement::Declare(l), assign(l, Rvalue::var(g))],
    );

    let text = emit(&unit, 110);
    assert!(text.contains("uniform float x;\n"), "{}", text);
    assert!(text.contains("  float x_1;\n  x_1 = x;\n"), "{}", text);
}

#[test]
fn test_emission_is_deterministic() {
    let mut unit = Unit::new();
    let t = var(&mut unit, "t", Type::FLOAT, StorageMode::Temporary);
    let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
    main_with(
        &mut unit,
        vec![
            Statement::Declare(t),
            assign(t, Rvalue::constant(Constant::float(0.5))),
            assign(o, Rvalue::var(t)),
        ],
    );
    let first = emit(&unit, 330);
    assert!(first.contains("  float tmpvar_1;\n"), "{}", first);
    assert_eq!(first, emit(&unit, 330));
}

#[test]
fn test_header_extensions() {
    let mut target = Target::new(100, ShaderStage::Fragment);
    target
        .extensions
        .enable(glopt_ir::Extension::OesStandardDerivatives);
    target.extensions.enable(glopt_ir::Extension::ExtDrawBuffers);
    let text = GlslEmitter::new(&target).emit(&Unit::new());
    assert_eq!(
        text,
        "#version 100\n#extension GL_OES_standard_derivatives : enable\n#extension GL_EXT_draw_buffers : enable\n"
    );

    let mut es3 = Target::new(300, ShaderStage::Fragment);
    es3.extensions.enable(glopt_ir::Extension::ExtDrawBuffers);
    assert_eq!(GlslEmitter::new(&es3).emit(&Unit::new()), "#version 300 es\n");
}

#[test]
fn test_expressions() {
    let mut unit = Unit::new();
    let a = var(&mut unit, "a", VEC2, StorageMode::Uniform);
    let b = var(&mut unit, "b", VEC2, StorageMode::Uniform);
    let c = var(&mut unit, "c", Type::Vector(BaseType::Bool, 2), StorageMode::Uniform);
    let x = var(&mut unit, "x", Type::FLOAT, StorageMode::Uniform);
    let r = var(&mut unit, "r", VEC2, StorageMode::Auto);
    let bv = Type::Vector(BaseType::Bool, 2);
    main_with(
        &mut unit,
        vec![
            Statement::Declare(r),
            assign(
                r,
                Rvalue::expr(
                    ExprOp::Csel,
                    VEC2,
                    vec![Rvalue::var(c), Rvalue::var(a), Rvalue::var(b)],
                ),
            ),
            assign(
                r,
                Rvalue::binop(ExprOp::Mod, VEC2, Rvalue::var(a), Rvalue::var(b)),
            ),
            assign(
                r,
                Rvalue::unop(
                    ExprOp::B2f,
                    VEC2,
                    Rvalue::binop(ExprOp::Less, bv, Rvalue::var(a), Rvalue::var(b)),
                ),
            ),
            assign(
                r,
                Rvalue::binop(
                    ExprOp::Mul,
                    VEC2,
                    Rvalue::var(a),
                    Rvalue::unop(ExprOp::Rcp, Type::FLOAT, Rvalue::var(x)),
                ),
            ),
            assign(
                r,
                Rvalue::binop(ExprOp::Max, VEC2, Rvalue::var(a), Rvalue::var(b)),
            ),
        ],
    );

    let text = emit(&unit, 330);
    assert!(text.contains("  r = mix(b, a, bvec2(c));\n"), "{}", text);
    assert!(text.contains("  r = (vec2(mod(a, b)));\n"), "{}", text);
    assert!(text.contains("  r = vec2(lessThan(a, b));\n"), "{}", text);
    assert!(text.contains("  r = (a * (1.0/(x)));\n"), "{}", text);
    assert!(text.contains("  r = max(a, b);\n"), "{}", text);
}

#[test]
fn test_deep_expressions_break_lines() {
    let mut unit = Unit::new();
    let x = var(&mut unit, "x", Type::FLOAT, StorageMode::Uniform);
    let o = var(&mut unit, "o", Type::FLOAT, StorageMode::ShaderOut);
    let mut value = Rvalue::var(x);
    for _ in 0..8 {
        value = Rvalue::unop(ExprOp::Neg, Type::FLOAT, value);
    }
    main_with(&mut unit, vec![assign(o, value)]);

    let text = emit(&unit, 330);
    assert!(text.contains("-(-(-(-(-(-(-(\n"), "{}", text);
}

fn sampler_unit(dim: SamplerSetup) -> (Unit, VarId, VarId, VarId) {
    let mut unit = Unit::new();
    let mut st = SamplerType::new(SamplerDim::Dim2D);
    st.shadow = matches!(dim, SamplerSetup::Shadow);
    let s = var(&mut unit, "s", Type::Sampler(st), StorageMode::Uniform);
    let uv = var(&mut unit, "uv", VEC2, StorageMode::Uniform);
    let q = var(&mut unit, "q", Type::FLOAT, StorageMode::Uniform);
    (unit, s, uv, q)
}

enum SamplerSetup {
    Color,
    Shadow,
}

fn sample_into(unit: &mut Unit, t: Texture) {
    let o = var(unit, "o", VEC4, StorageMode::ShaderOut);
    main_with(unit, vec![assign(o, Rvalue::Texture(alloc::boxed::Box::new(t)))]);
}

#[test]
fn test_texture_names_by_version() {
    let (mut unit, s, uv, _) = sampler_unit(SamplerSetup::Color);
    sample_into(
        &mut unit,
        Texture::sample(VEC4, Deref::Var(s), Rvalue::var(uv)),
    );
    assert!(emit(&unit, 330).contains("  o = texture(s, uv);\n"));
    assert!(emit(&unit, 110).contains("  o = texture2D(s, uv);\n"));
}

#[test]
fn test_projective_texture() {
    let (mut unit, s, uv, q) = sampler_unit(SamplerSetup::Color);
    let mut t = Texture::sample(VEC4, Deref::Var(s), Rvalue::var(uv));
    t.projector = Some(Rvalue::var(q));
    sample_into(&mut unit, t);
    assert!(emit(&unit, 110).contains("  o = texture2DProj(s, vec3(uv, q));\n"));
}

#[test]
fn test_shadow_texture_packs_comparator() {
    let (mut unit, s, uv, q) = sampler_unit(SamplerSetup::Shadow);
    let mut t = Texture::sample(VEC4, Deref::Var(s), Rvalue::var(uv));
    t.shadow_comparator = Some(Rvalue::var(q));
    sample_into(&mut unit, t);
    assert!(emit(&unit, 110).contains("  o = shadow2D(s, vec3(uv, q));\n"));
}

#[test]
fn test_explicit_lod_and_size() {
    let (mut unit, s, uv, q) = sampler_unit(SamplerSetup::Color);
    let mut t = Texture::sample(VEC4, Deref::Var(s), Rvalue::var(uv));
    t.op = TextureOp::Txl {
        lod: Rvalue::var(q),
    };
    sample_into(&mut unit, t);
    assert!(emit(&unit, 330).contains("  o = textureLod(s, uv, q);\n"));

    let (mut unit, s, _, _) = sampler_unit(SamplerSetup::Color);
    let size = var(&mut unit, "size", Type::Vector(BaseType::Int, 2), StorageMode::ShaderOut);
    let txs = Texture {
        op: TextureOp::Txs { lod: int(0) },
        ty: Type::Vector(BaseType::Int, 2),
        sampler: Deref::Var(s),
        coordinate: None,
        projector: None,
        shadow_comparator: None,
        offset: None,
    };
    main_with(
        &mut unit,
        vec![assign(size, Rvalue::Texture(alloc::boxed::Box::new(txs)))],
    );
    assert!(emit(&unit, 330).contains("  size = textureSize(s, 0);\n"));
}

#[test]
fn test_geometry_builtins() {
    let mut unit = Unit::new();
    main_with(
        &mut unit,
        vec![
            Statement::EmitVertex(int(0)),
            Statement::EndPrimitive(int(1)),
            Statement::Discard(Some(Rvalue::constant(Constant::bool(true)))),
        ],
    );
    let text = emit(&unit, 330);
    assert!(text.contains("  EmitVertex();\n"), "{}", text);
    assert!(text.contains("  EndStreamPrimitive(1);\n"), "{}", text);
    assert!(text.contains("  if (true) discard;\n"), "{}", text);
}

#[test]
fn test_custom_entry_receives_globals() {
    let mut unit = Unit::new();
    let g = var(&mut unit, "g", Type::INT, StorageMode::Auto);
    unit.items.push(Statement::Declare(g));
    unit.items.push(assign(g, int(3)));
    let mut f = Function::new("run".to_string());
    let mut sig = Signature::new(Type::Void, Vec::new());
    sig.is_defined = true;
    f.signatures.push(sig);
    unit.items.push(Statement::Function(f));

    let target = Target::new(110, ShaderStage::Fragment);
    let text = GlslEmitter::new(&target).with_entry("run").emit(&unit);
    assert!(text.contains("void run()\n{\n  g = 3;\n}\n"), "{}", text);
}
