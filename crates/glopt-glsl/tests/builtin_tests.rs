//! Tests for builtin variables and functions

use glsl_test::GlslTest;

use glopt_ir::{ExprOp, ShaderStage, Statement, Target};

#[test]
fn test_builtin_variable_declared_once() {
    let glsl = r#"
        void main() {
            gl_FragColor = vec4(0.0);
            gl_FragColor.a = 1.0;
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    let unit = test.unit();
    let declared = unit
        .items
        .iter()
        .filter(|s| match s {
            Statement::Declare(id) => unit.vars.get(*id).and_then(|v| v.name()) == Some("gl_FragColor"),
            _ => false,
        })
        .count();
    assert_eq!(declared, 1);
}

#[test]
fn test_texture_lookup_prints_for_target() {
    let glsl = r#"
        uniform sampler2D s;
        uniform vec2 uv;
        void main() {
            gl_FragColor = texture2D(s, uv);
        }
    "#;

    let legacy = GlslTest::with_target(glsl, Target::new(110, ShaderStage::Fragment)).unwrap();
    legacy.assert_glsl_contains("gl_FragColor = texture2D(s, uv);");

    let modern = GlslTest::with_target(glsl, Target::new(330, ShaderStage::Fragment)).unwrap();
    modern.assert_glsl_contains("gl_FragColor = texture(s, uv);");
}

#[test]
fn test_math_builtins_become_operators() {
    let glsl = r#"
        uniform vec3 v;
        void main() {
            vec3 c = clamp(v, 0.0, 1.0);
            float d = dot(c, v);
            gl_FragColor = vec4(c, d);
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    let ops: Vec<ExprOp> = test
        .main_statements()
        .into_iter()
        .filter_map(|s| s.as_assign().and_then(|a| a.rhs.as_expression()))
        .map(|e| e.op)
        .collect();
    assert!(ops.contains(&ExprOp::Min), "{:?}", ops);
    assert!(ops.contains(&ExprOp::Dot), "{:?}", ops);
}

#[test]
fn test_builtin_without_operator_is_a_call() {
    let glsl = r#"
        uniform vec3 n;
        void main() {
            gl_FragColor = vec4(normalize(n), 1.0);
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    let call = test
        .main_statements()
        .into_iter()
        .find_map(|s| match s {
            Statement::Call(c) => Some(c),
            _ => None,
        })
        .unwrap();
    assert_eq!(call.callee, "normalize");
    assert!(call.builtin);
    assert!(call.return_deref.is_some());
}

#[test]
fn test_discard_only_in_fragment_shaders() {
    let glsl = "void main() { discard; }";

    assert!(GlslTest::new(glsl).is_ok());
    assert!(GlslTest::with_target(glsl, Target::new(110, ShaderStage::Vertex)).is_err());
}
