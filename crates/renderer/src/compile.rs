use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Uniform block shared by both stages; layout matches `gpu::uniforms::WireUniforms`.
const UNIFORM_BLOCK: &str = r"
layout(set = 0, binding = 0) uniform WireUniforms {
    mat4 view_proj;
    mat4 model;
    vec4 color;
    float time;
};
";

const VERTEX_BODY: &str = r"
layout(location = 0) in vec3 position;
layout(location = 0) out vec3 v_position;

void main() {
    v_position = position;
    gl_Position = view_proj * model * vec4(position, 1.0);
}
";

const FRAGMENT_BODY: &str = r"
layout(location = 0) in vec3 v_position;
layout(location = 0) out vec4 out_color;

void main() {
    float opacity = 0.2 + 0.3 * sin(v_position.x * 0.02 + time);
    vec3 final_color = color.rgb * (0.8 + 0.2 * sin(v_position.z * 0.01 + time * 0.5));
    out_color = vec4(final_color, opacity);
}
";

fn assemble(body: &str) -> String {
    let mut source = String::with_capacity(UNIFORM_BLOCK.len() + body.len() + 16);
    source.push_str("#version 450\n");
    source.push_str(UNIFORM_BLOCK);
    source.push_str(body);
    source
}

pub(crate) fn vertex_source() -> String {
    assemble(VERTEX_BODY)
}

pub(crate) fn fragment_source() -> String {
    assemble(FRAGMENT_BODY)
}

/// Compiles the wireframe vertex stage through naga's GLSL frontend.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("wavegrid vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the fragment stage that applies the time-varying color/opacity rule.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("wavegrid fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(fragment_source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_start_with_version_directive() {
        for source in [vertex_source(), fragment_source()] {
            assert!(source.starts_with("#version 450\n"));
            assert!(source.contains("uniform WireUniforms"));
        }
    }

    #[test]
    fn fragment_stage_carries_the_coloring_rule() {
        let source = fragment_source();
        assert!(source.contains("0.2 + 0.3 * sin(v_position.x * 0.02 + time)"));
        assert!(source.contains("0.8 + 0.2 * sin(v_position.z * 0.01 + time * 0.5)"));
    }
}
