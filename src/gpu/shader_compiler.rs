//! The GPU-free half of the shader pipeline: per-stage WGSL compilation,
//! cross-stage linking, and uniform/texture interface reflection.
//!
//! Separating this from wgpu module creation means every compile and link
//! failure mode is unit-testable without a device, the same seam the
//! shader-composition layer exposes for testing.

use std::fmt;
use std::path::PathBuf;

use naga_oil::compose::{Composer, NagaModuleDescriptor, ShaderType};
use rustc_hash::FxHashMap;

/// Bind group reserved for the program's uniform blocks.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group reserved for the program's textures and samplers.
pub const TEXTURE_GROUP: u32 = 1;

/// Pipeline stage of a shader source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Vertex processing stage.
    Vertex,
    /// Fragment processing stage.
    Fragment,
}

impl Stage {
    /// Human-readable stage name for diagnostics and labels.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Errors produced while building a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// A stage source file could not be read.
    Io {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A stage failed WGSL composition or validation.
    Compile {
        /// Which stage failed.
        stage: Stage,
        /// Annotated diagnostic text from the compiler/validator.
        diagnostic: String,
    },
    /// The two compiled stages could not be combined into one program.
    Link(String),
    /// A reflected texture binding has no texture bound to its unit.
    MissingTextureUnit {
        /// The texture unit the program reads.
        unit: usize,
        /// The `@binding` index of the reflected texture.
        binding: u32,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read shader source {}: {source}", path.display())
            }
            Self::Compile { stage, diagnostic } => {
                write!(f, "{} stage failed to compile: {diagnostic}", stage.label())
            }
            Self::Link(msg) => write!(f, "program link failed: {msg}"),
            Self::MissingTextureUnit { unit, binding } => write!(
                f,
                "texture unit {unit} is empty but the program samples @binding({binding})"
            ),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Value kind of a settable uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer.
    U32,
    /// Three-component float vector.
    Vec3,
    /// Four-component float vector.
    Vec4,
    /// 3×3 float matrix (columns padded to 16 bytes in buffer layout).
    Mat3,
    /// 4×4 float matrix.
    Mat4,
}

impl UniformKind {
    /// Size of the value in buffer layout, including matrix column padding.
    #[must_use]
    pub fn byte_size(self) -> u32 {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
        }
    }
}

/// One reflected uniform block: a `var<uniform>` global in group 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlockLayout {
    /// The global variable's name.
    pub name: String,
    /// Its `@binding` index within group 0.
    pub binding: u32,
    /// Buffer size in bytes, rounded up to 16.
    pub size: u64,
}

/// Where a named uniform lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    /// Index into the linked program's block list.
    pub block: usize,
    /// Byte offset within the block.
    pub offset: u32,
    /// Expected value kind.
    pub kind: UniformKind,
}

/// Whether a group-1 binding is the texture or its sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureBindingKind {
    /// A sampled 2D texture.
    Texture,
    /// A filtering sampler.
    Sampler,
}

/// One reflected group-1 binding with its assigned texture unit.
///
/// Units are assigned to texture bindings in ascending `@binding` order;
/// a sampler reads the unit of the nearest preceding texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSlot {
    /// The `@binding` index within group 1.
    pub binding: u32,
    /// Texture or sampler.
    pub kind: TextureBindingKind,
    /// The texture unit this binding reads.
    pub unit: usize,
}

/// The output of a successful compile → link pipeline: validated stage
/// modules plus the merged uniform/texture interface.
#[derive(Debug)]
pub struct LinkedProgram {
    /// Validated vertex-stage IR.
    pub vertex: naga::Module,
    /// Validated fragment-stage IR.
    pub fragment: naga::Module,
    /// Name of the vertex entry point.
    pub vertex_entry: String,
    /// Name of the fragment entry point.
    pub fragment_entry: String,
    /// Uniform blocks, in ascending binding order.
    pub blocks: Vec<UniformBlockLayout>,
    /// Settable uniform name → slot.
    pub uniforms: FxHashMap<String, UniformSlot>,
    /// Group-1 bindings, in ascending binding order.
    pub textures: Vec<TextureSlot>,
}

/// Compile one WGSL stage: naga_oil composition (stage sources may use
/// `#import` directives) followed by naga validation.
///
/// # Errors
///
/// Returns [`ShaderError::Compile`] with the composer's or validator's
/// diagnostic text.
pub fn compile_stage(stage: Stage, source: &str, file_path: &str) -> Result<naga::Module, ShaderError> {
    let mut composer = Composer::default();
    let module = composer
        .make_naga_module(NagaModuleDescriptor {
            source,
            file_path,
            shader_type: ShaderType::Wgsl,
            ..Default::default()
        })
        .map_err(|e| ShaderError::Compile {
            stage,
            diagnostic: e.to_string(),
        })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    let _info = validator.validate(&module).map_err(|e| ShaderError::Compile {
        stage,
        diagnostic: error_chain(&e.into_inner()),
    })?;

    Ok(module)
}

/// Link two compiled stages into one program interface.
///
/// Checks that each module exposes an entry point for its stage, merges
/// the uniform interfaces of both stages, and assigns texture units to
/// the group-1 bindings.
///
/// # Errors
///
/// Returns [`ShaderError::Link`] on a missing entry point, a binding
/// declared with conflicting layouts across stages, or a binding outside
/// the group convention (uniform blocks in group 0, textures/samplers in
/// group 1).
pub fn link(vertex: naga::Module, fragment: naga::Module) -> Result<LinkedProgram, ShaderError> {
    let vertex_entry = entry_point(&vertex, naga::ShaderStage::Vertex)
        .ok_or_else(|| ShaderError::Link("vertex stage has no @vertex entry point".into()))?;
    let fragment_entry = entry_point(&fragment, naga::ShaderStage::Fragment)
        .ok_or_else(|| ShaderError::Link("fragment stage has no @fragment entry point".into()))?;

    let mut blocks: Vec<UniformBlockLayout> = Vec::new();
    let mut names: FxHashMap<String, (u32, u32, UniformKind)> = FxHashMap::default();
    let mut texture_kinds: FxHashMap<u32, TextureBindingKind> = FxHashMap::default();

    for (stage, module) in [(Stage::Vertex, &vertex), (Stage::Fragment, &fragment)] {
        reflect_stage(stage, module, &mut blocks, &mut names, &mut texture_kinds)?;
    }

    blocks.sort_by_key(|b| b.binding);

    let mut uniforms = FxHashMap::default();
    for (name, (binding, offset, kind)) in names {
        let block = blocks
            .iter()
            .position(|b| b.binding == binding)
            .ok_or_else(|| ShaderError::Link(format!("uniform '{name}' lost its block")))?;
        let _ = uniforms.insert(name, UniformSlot { block, offset, kind });
    }

    let textures = assign_units(&texture_kinds)?;

    Ok(LinkedProgram {
        vertex,
        fragment,
        vertex_entry,
        fragment_entry,
        blocks,
        uniforms,
        textures,
    })
}

fn entry_point(module: &naga::Module, stage: naga::ShaderStage) -> Option<String> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage)
        .map(|ep| ep.name.clone())
}

/// Fold one stage's globals into the merged program interface.
fn reflect_stage(
    stage: Stage,
    module: &naga::Module,
    blocks: &mut Vec<UniformBlockLayout>,
    names: &mut FxHashMap<String, (u32, u32, UniformKind)>,
    texture_kinds: &mut FxHashMap<u32, TextureBindingKind>,
) -> Result<(), ShaderError> {
    for (_, var) in module.global_variables.iter() {
        let ty = &module.types[var.ty];
        match var.space {
            naga::AddressSpace::Uniform => {
                let binding = var.binding.as_ref().ok_or_else(|| {
                    ShaderError::Link(format!("{} uniform has no @binding", stage.label()))
                })?;
                if binding.group != UNIFORM_GROUP {
                    return Err(ShaderError::Link(format!(
                        "uniform block '{}' is in @group({}); uniform blocks must use @group({UNIFORM_GROUP})",
                        var.name.as_deref().unwrap_or("<unnamed>"),
                        binding.group,
                    )));
                }
                reflect_uniform_block(stage, module, var, binding.binding, blocks, names)?;
            }
            naga::AddressSpace::Handle => {
                let binding = var.binding.as_ref().ok_or_else(|| {
                    ShaderError::Link(format!("{} resource has no @binding", stage.label()))
                })?;
                let kind = match ty.inner {
                    naga::TypeInner::Image { .. } => TextureBindingKind::Texture,
                    naga::TypeInner::Sampler { .. } => TextureBindingKind::Sampler,
                    _ => {
                        return Err(ShaderError::Link(format!(
                            "unsupported handle type for '{}'",
                            var.name.as_deref().unwrap_or("<unnamed>"),
                        )))
                    }
                };
                if binding.group != TEXTURE_GROUP {
                    return Err(ShaderError::Link(format!(
                        "'{}' is in @group({}); textures and samplers must use @group({TEXTURE_GROUP})",
                        var.name.as_deref().unwrap_or("<unnamed>"),
                        binding.group,
                    )));
                }
                if let Some(existing) = texture_kinds.insert(binding.binding, kind) {
                    if existing != kind {
                        return Err(ShaderError::Link(format!(
                            "@group({TEXTURE_GROUP}) @binding({}) is a texture in one stage and a sampler in the other",
                            binding.binding,
                        )));
                    }
                }
            }
            naga::AddressSpace::Storage { .. } => {
                return Err(ShaderError::Link(format!(
                    "storage buffer '{}' is not supported by this program model",
                    var.name.as_deref().unwrap_or("<unnamed>"),
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Reflect one `var<uniform>` global: record its block layout and the
/// settable names inside it.
fn reflect_uniform_block(
    stage: Stage,
    module: &naga::Module,
    var: &naga::GlobalVariable,
    binding: u32,
    blocks: &mut Vec<UniformBlockLayout>,
    names: &mut FxHashMap<String, (u32, u32, UniformKind)>,
) -> Result<(), ShaderError> {
    let ty = &module.types[var.ty];
    let block_name = var
        .name
        .clone()
        .or_else(|| ty.name.clone())
        .unwrap_or_else(|| format!("block{binding}"));

    let (size, members): (u32, Vec<(String, u32, UniformKind)>) = match &ty.inner {
        naga::TypeInner::Struct { members, span } => {
            let mut settable = Vec::new();
            for member in members {
                let Some(name) = member.name.clone() else {
                    continue;
                };
                // Members of kinds the tagged union cannot express (arrays,
                // nested structs, vec2, ...) keep their space in the block
                // but are not addressable by name.
                if let Some(kind) = map_kind(module, member.ty) {
                    settable.push((name, member.offset, kind));
                } else {
                    log::debug!("uniform member '{block_name}.{name}' has an unsupported kind; not settable by name");
                }
            }
            (*span, settable)
        }
        _ => {
            let kind = map_kind(module, var.ty).ok_or_else(|| {
                ShaderError::Link(format!(
                    "{} uniform '{block_name}' has an unsupported type",
                    stage.label(),
                ))
            })?;
            (kind.byte_size(), vec![(block_name.clone(), 0, kind)])
        }
    };

    let size = u64::from((size + 15) & !15);

    if let Some(existing) = blocks.iter().find(|b| b.binding == binding) {
        if existing.size != size {
            return Err(ShaderError::Link(format!(
                "@group({UNIFORM_GROUP}) @binding({binding}) is declared with different sizes across stages ({} vs {size} bytes)",
                existing.size,
            )));
        }
    } else {
        blocks.push(UniformBlockLayout {
            name: block_name,
            binding,
            size,
        });
    }

    for (name, offset, kind) in members {
        if let Some(existing) = names.insert(name.clone(), (binding, offset, kind)) {
            if existing != (binding, offset, kind) {
                return Err(ShaderError::Link(format!(
                    "uniform '{name}' is declared with conflicting layouts across stages"
                )));
            }
        }
    }

    Ok(())
}

/// Map a naga type to the settable value kinds, if it is one of them.
fn map_kind(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Option<UniformKind> {
    use naga::{ScalarKind, TypeInner, VectorSize};
    match module.types[ty].inner {
        TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
            ScalarKind::Float => Some(UniformKind::F32),
            ScalarKind::Sint => Some(UniformKind::I32),
            ScalarKind::Uint => Some(UniformKind::U32),
            _ => None,
        },
        TypeInner::Vector { size, scalar }
            if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
        {
            match size {
                VectorSize::Tri => Some(UniformKind::Vec3),
                VectorSize::Quad => Some(UniformKind::Vec4),
                VectorSize::Bi => None,
            }
        }
        TypeInner::Matrix { columns, rows, scalar }
            if scalar.kind == ScalarKind::Float && scalar.width == 4 =>
        {
            match (columns, rows) {
                (VectorSize::Tri, VectorSize::Tri) => Some(UniformKind::Mat3),
                (VectorSize::Quad, VectorSize::Quad) => Some(UniformKind::Mat4),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Assign texture units to group-1 bindings in ascending binding order.
fn assign_units(
    texture_kinds: &FxHashMap<u32, TextureBindingKind>,
) -> Result<Vec<TextureSlot>, ShaderError> {
    let mut bindings: Vec<(u32, TextureBindingKind)> =
        texture_kinds.iter().map(|(b, k)| (*b, *k)).collect();
    bindings.sort_by_key(|(b, _)| *b);

    let mut slots = Vec::with_capacity(bindings.len());
    let mut next_unit = 0usize;
    let mut last_texture_unit: Option<usize> = None;
    for (binding, kind) in bindings {
        let unit = match kind {
            TextureBindingKind::Texture => {
                let unit = next_unit;
                next_unit += 1;
                last_texture_unit = Some(unit);
                unit
            }
            TextureBindingKind::Sampler => last_texture_unit.ok_or_else(|| {
                ShaderError::Link(format!(
                    "sampler @binding({binding}) has no preceding texture binding"
                ))
            })?,
        };
        slots.push(TextureSlot { binding, kind, unit });
    }
    Ok(slots)
}

/// Join an error and its source chain into one diagnostic line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r"
struct Transforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> transforms: Transforms;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return transforms.projection * transforms.view * transforms.model
        * vec4<f32>(position, 1.0);
}
";

    const FS: &str = r"
struct Material {
    tint: vec4<f32>,
    glow: f32,
}
@group(0) @binding(1) var<uniform> material: Material;
@group(1) @binding(0) var t_diffuse: texture_2d<f32>;
@group(1) @binding(1) var s_diffuse: sampler;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let sampled = textureSample(t_diffuse, s_diffuse, vec2<f32>(0.5, 0.5));
    return material.tint * sampled + vec4<f32>(material.glow);
}
";

    fn compile_pair(vs: &str, fs: &str) -> Result<LinkedProgram, ShaderError> {
        let vertex = compile_stage(Stage::Vertex, vs, "test.vert.wgsl")?;
        let fragment = compile_stage(Stage::Fragment, fs, "test.frag.wgsl")?;
        link(vertex, fragment)
    }

    #[test]
    fn valid_stages_compile_and_link() {
        let linked = compile_pair(VS, FS).unwrap();
        assert_eq!(linked.vertex_entry, "vs_main");
        assert_eq!(linked.fragment_entry, "fs_main");
        assert_eq!(linked.blocks.len(), 2);
        assert_eq!(linked.blocks[0].binding, 0);
        assert_eq!(linked.blocks[1].binding, 1);
    }

    #[test]
    fn syntax_error_fails_compile_with_diagnostic() {
        let broken = "@vertex fn vs_main( -> vec4<f32> { return; }";
        let err = compile_stage(Stage::Vertex, broken, "broken.wgsl").unwrap_err();
        match err {
            ShaderError::Compile { stage, diagnostic } => {
                assert_eq!(stage, Stage::Vertex);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected compile error, got {other}"),
        }
    }

    #[test]
    fn missing_entry_point_fails_link() {
        // Compile the fragment source as the vertex stage: it validates
        // fine but exposes no @vertex entry point.
        let vertex = compile_stage(Stage::Vertex, FS, "fs-as-vs.wgsl").unwrap();
        let fragment = compile_stage(Stage::Fragment, FS, "fs.wgsl").unwrap();
        let err = link(vertex, fragment).unwrap_err();
        match err {
            ShaderError::Link(msg) => assert!(msg.contains("vertex")),
            other => panic!("expected link error, got {other}"),
        }
    }

    #[test]
    fn uniform_outside_group_zero_fails_link() {
        let fs = r"
@group(2) @binding(0) var<uniform> glow: f32;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(glow);
}
";
        let err = compile_pair(VS, fs).unwrap_err();
        match err {
            ShaderError::Link(msg) => assert!(msg.contains("@group(2)")),
            other => panic!("expected link error, got {other}"),
        }
    }

    #[test]
    fn texture_outside_group_one_fails_link() {
        let fs = r"
@group(0) @binding(3) var t_diffuse: texture_2d<f32>;
@group(0) @binding(4) var s_diffuse: sampler;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return textureSample(t_diffuse, s_diffuse, vec2<f32>(0.5, 0.5));
}
";
        let err = compile_pair(VS, fs).unwrap_err();
        assert!(matches!(err, ShaderError::Link(_)));
    }

    #[test]
    fn conflicting_block_sizes_fail_link() {
        let vs = r"
struct A { x: f32, y: vec4<f32> }
@group(0) @binding(0) var<uniform> a: A;
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return a.y + vec4<f32>(a.x);
}
";
        let fs = r"
@group(0) @binding(0) var<uniform> y: f32;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(y);
}
";
        let err = compile_pair(vs, fs).unwrap_err();
        match err {
            ShaderError::Link(msg) => assert!(msg.contains("different sizes")),
            other => panic!("expected link error, got {other}"),
        }
    }

    #[test]
    fn reflection_finds_struct_member_offsets() {
        let vs = r"
struct Params {
    scale: f32,
    color: vec3<f32>,
    rot: mat3x3<f32>,
    model: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> params: Params;
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    let rotated = params.rot * (position * params.scale + params.color);
    return params.model * vec4<f32>(rotated, 1.0);
}
";
        let fs = r"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
";
        let linked = compile_pair(vs, fs).unwrap();
        let get = |name: &str| linked.uniforms[name];

        assert_eq!(get("scale"), UniformSlot { block: 0, offset: 0, kind: UniformKind::F32 });
        assert_eq!(get("color"), UniformSlot { block: 0, offset: 16, kind: UniformKind::Vec3 });
        assert_eq!(get("rot"), UniformSlot { block: 0, offset: 32, kind: UniformKind::Mat3 });
        assert_eq!(get("model"), UniformSlot { block: 0, offset: 80, kind: UniformKind::Mat4 });
        assert_eq!(linked.blocks[0].size, 144);
    }

    #[test]
    fn texture_units_assigned_in_binding_order() {
        let fs = r"
@group(1) @binding(0) var t_a: texture_2d<f32>;
@group(1) @binding(1) var s_a: sampler;
@group(1) @binding(2) var t_b: texture_2d<f32>;
@group(1) @binding(3) var s_b: sampler;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let a = textureSample(t_a, s_a, vec2<f32>(0.5, 0.5));
    let b = textureSample(t_b, s_b, vec2<f32>(0.5, 0.5));
    return a + b;
}
";
        let vs = r"
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, 1.0);
}
";
        let linked = compile_pair(vs, fs).unwrap();
        let units: Vec<usize> = linked.textures.iter().map(|t| t.unit).collect();
        assert_eq!(units, vec![0, 0, 1, 1]);
    }

    #[test]
    fn sampler_without_texture_fails_link() {
        let fs = r"
@group(1) @binding(0) var s_orphan: sampler;
@group(1) @binding(1) var t_diffuse: texture_2d<f32>;
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return textureSample(t_diffuse, s_orphan, vec2<f32>(0.5, 0.5));
}
";
        let vs = r"
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, 1.0);
}
";
        let err = compile_pair(vs, fs).unwrap_err();
        match err {
            ShaderError::Link(msg) => assert!(msg.contains("sampler")),
            other => panic!("expected link error, got {other}"),
        }
    }
}
