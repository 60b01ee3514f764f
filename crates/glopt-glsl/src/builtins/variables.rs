//! Stage builtin variables, declared on first use.

use glopt_ir::{BaseType, ShaderStage, StorageMode, Target, Type};

/// Type and storage of builtin variable `name` in the target's stage.
pub fn builtin_variable(name: &str, target: &Target) -> Option<(Type, StorageMode)> {
    use ShaderStage::*;

    let vec4 = Type::Vector(BaseType::Float, 4);
    let mat4 = Type::Matrix {
        base: BaseType::Float,
        columns: 4,
        rows: 4,
    };
    let stage = target.stage;
    let pre_raster = matches!(stage, Vertex | TessEval | Geometry);

    let entry = match name {
        "gl_Position" if pre_raster => (vec4, StorageMode::ShaderOut),
        "gl_PointSize" if pre_raster => (Type::FLOAT, StorageMode::ShaderOut),
        "gl_VertexID" | "gl_InstanceID" if stage == Vertex => (Type::INT, StorageMode::SystemValue),
        "gl_FragCoord" if stage == Fragment => (vec4, StorageMode::ShaderIn),
        "gl_FrontFacing" if stage == Fragment => (Type::BOOL, StorageMode::ShaderIn),
        "gl_PointCoord" if stage == Fragment => {
            (Type::Vector(BaseType::Float, 2), StorageMode::ShaderIn)
        }
        "gl_FragColor" if stage == Fragment => (vec4, StorageMode::ShaderOut),
        "gl_FragData" if stage == Fragment => {
            let buffers = if target.es { 4 } else { 8 };
            (Type::array(vec4, buffers), StorageMode::ShaderOut)
        }
        "gl_FragDepth" | "gl_FragDepthEXT" if stage == Fragment => {
            (Type::FLOAT, StorageMode::ShaderOut)
        }
        "gl_PrimitiveID" if matches!(stage, Geometry | Fragment) => {
            (Type::INT, StorageMode::ShaderIn)
        }
        // Compatibility profile inputs and matrices
        "gl_Vertex" | "gl_Color" | "gl_MultiTexCoord0" | "gl_MultiTexCoord1"
            if stage == Vertex && !target.es =>
        {
            (vec4, StorageMode::ShaderIn)
        }
        "gl_Normal" if stage == Vertex && !target.es => {
            (Type::Vector(BaseType::Float, 3), StorageMode::ShaderIn)
        }
        "gl_Color" if stage == Fragment && !target.es => (vec4, StorageMode::ShaderIn),
        "gl_ModelViewMatrix" | "gl_ProjectionMatrix" | "gl_ModelViewProjectionMatrix"
            if !target.es =>
        {
            (mat4, StorageMode::Uniform)
        }
        "gl_NormalMatrix" if !target.es => (
            Type::Matrix {
                base: BaseType::Float,
                columns: 3,
                rows: 3,
            },
            StorageMode::Uniform,
        ),
        _ => return None,
    };
    Some(entry)
}
