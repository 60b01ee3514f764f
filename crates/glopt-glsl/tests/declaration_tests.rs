//! Tests for global and local declarations

use glsl_test::GlslTest;

use glopt_ir::{ShaderStage, StorageMode, Target, Type};

#[test]
fn test_uniform_passthrough() {
    let glsl = r#"
        uniform vec4 u;
        void main() {
            gl_FragColor = u;
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    test.assert_glsl(
        r#"
        #version 130
        uniform vec4 u;
        void main()
        {
          gl_FragColor = u;
        }
    "#,
    );
}

#[test]
fn test_local_shadowing_global_is_renamed() {
    let glsl = r#"
        uniform float x;
        void main() {
            float x = 2.0;
            gl_FragColor = vec4(x);
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    test.assert_glsl_contains(
        r#"
        float x_1;
        x_1 = 2.0;
    "#,
    );
}

#[test]
fn test_version_directive_overrides_target() {
    let glsl = "#version 120\nvoid main() {}\n";

    let test = GlslTest::with_target(glsl, Target::new(330, ShaderStage::Fragment)).unwrap();
    assert_eq!(test.target().version, 120);
    assert!(test.glsl().starts_with("#version 120\n"));
}

#[test]
fn test_struct_and_array_declarations() {
    let glsl = r#"
        struct Light { vec3 color; float power; };
        uniform Light lights[3];
        void main() {
            gl_FragColor = vec4(lights[1].color * lights[2].power, 1.0);
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    let unit = test.unit();
    assert_eq!(unit.structs.len(), 1);
    assert_eq!(unit.structs[0].name, "Light");

    let id = unit.vars.find_by_name("lights").unwrap();
    assert_eq!(unit.vars.mode(id), StorageMode::Uniform);
    assert_eq!(unit.vars.ty(id).array_size(), Some(3));
}

#[test]
fn test_const_globals_fold_into_uses() {
    let glsl = r#"
        const float scale = 2.0 * 3.0;
        uniform float x;
        void main() {
            gl_FragColor = vec4(x * scale);
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    let text = test.glsl();
    assert!(text.contains("6.0"), "{}", text);
}

#[test]
fn test_prototype_fixes_function_position() {
    let glsl = r#"
        float twice(float v);
        void main() {
            gl_FragColor = vec4(twice(1.5));
        }
        float twice(float v) {
            return v * 2.0;
        }
    "#;

    let test = GlslTest::new(glsl).unwrap();
    let names: Vec<&str> = test.unit().functions().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["twice", "main"]);

    let twice = test.unit().function("twice").unwrap();
    assert_eq!(twice.signatures.len(), 1);
    assert!(twice.signatures[0].is_defined);
    assert_eq!(twice.signatures[0].return_type, Type::FLOAT);
}

#[test]
fn test_varying_in_vertex_shader() {
    let glsl = r#"
        attribute vec4 position;
        varying vec2 uv;
        void main() {
            uv = position.xy;
            gl_Position = position;
        }
    "#;

    let test = GlslTest::with_target(glsl, Target::new(110, ShaderStage::Vertex)).unwrap();
    let unit = test.unit();
    let position = unit.vars.find_by_name("position").unwrap();
    let uv = unit.vars.find_by_name("uv").unwrap();
    assert_eq!(unit.vars.mode(position), StorageMode::ShaderIn);
    assert_eq!(unit.vars.mode(uv), StorageMode::ShaderOut);
    test.assert_glsl_contains(
        r#"
        attribute vec4 position;
        varying vec2 uv;
    "#,
    );
}
