//! Tests for front-end diagnostics

use glsl_test::GlslTest;

use glopt_glsl::GlslError;

fn error(glsl: &str) -> GlslError {
    match GlslTest::new(glsl) {
        Ok(test) => panic!("expected an error, got:\n{}", test.glsl()),
        Err(e) => e,
    }
}

#[test]
fn test_undeclared_identifier() {
    let e = error("void main() { gl_FragColor = vec4(missing); }");
    assert!(matches!(&e, GlslError::Type(msg) if msg.contains("missing")), "{:?}", e);
}

#[test]
fn test_syntax_error() {
    let e = error("void main() { float x = ; }");
    assert!(matches!(e, GlslError::Parse(_)), "{:?}", e);
}

#[test]
fn test_type_mismatch() {
    let e = error("void main() { vec3 v = vec2(1.0); }");
    assert!(matches!(e, GlslError::Type(_)), "{:?}", e);

    let e = error("void main() { int i = 1.5; }");
    assert!(matches!(e, GlslError::Type(_)), "{:?}", e);
}

#[test]
fn test_reserved_prefix() {
    let e = error("void main() { float gl_mine = 1.0; }");
    assert!(matches!(e, GlslError::Type(_)), "{:?}", e);
}

#[test]
fn test_write_to_uniform() {
    let e = error("uniform float u; void main() { u = 1.0; }");
    assert!(matches!(e, GlslError::Type(_)), "{:?}", e);
}

#[test]
fn test_unsupported_constructs() {
    let e = error("void main() { int i = 0; switch (i) { default: break; } }");
    assert!(matches!(e, GlslError::Unsupported(_)), "{:?}", e);
}

#[test]
fn test_unterminated_conditional_directive() {
    let e = error("#ifdef FOO\nvoid main() {}\n");
    assert!(matches!(e, GlslError::Preprocess(_)), "{:?}", e);
}
