//! Two-stage shader programs with a name-based uniform interface.

use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use super::render_context::RenderContext;
use super::shader_compiler::{
    self, LinkedProgram, ShaderError, Stage, TextureBindingKind, TextureSlot, UniformSlot,
};
use super::state::{ProgramId, RenderState};
use super::uniform::{UniformBlock, UniformError, UniformValue};

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

/// A linked two-stage (vertex + fragment) WGSL program.
///
/// Construction runs the whole compile → link pipeline synchronously and
/// either yields a fully usable program or fails with the stage
/// compiler's or linker's diagnostic — no half-linked state is ever
/// observable. The intermediate stage IR is a build artifact consumed by
/// construction; only the linked program survives.
///
/// Uniforms are written by name through CPU staging and flushed to the
/// GPU on [`use_program`](Self::use_program). Unknown names are silently
/// ignored by default (the classic graphics-API weak point, preserved
/// deliberately); [`set_strict`](Self::set_strict) upgrades them to
/// errors.
///
/// The program does not own a render pipeline — vertex layouts and
/// target formats are the driver's concern. It exposes the shader
/// modules, entry points, and [`pipeline_layout`](Self::pipeline_layout)
/// the driver needs to build one.
pub struct ShaderProgram {
    id: ProgramId,
    label: String,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: FxHashMap<String, UniformSlot>,
    blocks: Vec<UniformBlock>,
    buffers: Vec<wgpu::Buffer>,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    textures: Vec<TextureSlot>,
    pipeline_layout: wgpu::PipelineLayout,
    strict: bool,
}

impl ShaderProgram {
    /// Build a program from two WGSL source files.
    ///
    /// # Errors
    ///
    /// [`ShaderError::Io`] if a file cannot be read, [`ShaderError::Compile`]
    /// if a stage fails composition or validation, [`ShaderError::Link`]
    /// if the stages cannot be combined.
    pub fn from_paths(
        context: &RenderContext,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let vertex_source = read_source(vertex_path)?;
        let fragment_source = read_source(fragment_path)?;
        let label = vertex_path
            .file_stem()
            .map_or_else(|| "shader".into(), |s| s.to_string_lossy().into_owned());
        Self::from_sources(
            context,
            &label,
            &vertex_source,
            &vertex_path.to_string_lossy(),
            &fragment_source,
            &fragment_path.to_string_lossy(),
        )
    }

    /// Build a program from in-memory WGSL sources (e.g. `include_str!`).
    ///
    /// The file paths are used only for diagnostics.
    ///
    /// # Errors
    ///
    /// Same compile/link failure modes as [`from_paths`](Self::from_paths).
    pub fn from_sources(
        context: &RenderContext,
        label: &str,
        vertex_source: &str,
        vertex_path: &str,
        fragment_source: &str,
        fragment_path: &str,
    ) -> Result<Self, ShaderError> {
        let vertex = shader_compiler::compile_stage(Stage::Vertex, vertex_source, vertex_path)?;
        let fragment =
            shader_compiler::compile_stage(Stage::Fragment, fragment_source, fragment_path)?;
        let linked = shader_compiler::link(vertex, fragment)?;
        Ok(Self::from_linked(context, label, linked))
    }

    /// Create the GPU-side objects for an already linked program.
    fn from_linked(context: &RenderContext, label: &str, linked: LinkedProgram) -> Self {
        let device = &context.device;

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} vertex")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(linked.vertex)),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} fragment")),
            source: wgpu::ShaderSource::Naga(Cow::Owned(linked.fragment)),
        });

        let blocks: Vec<UniformBlock> =
            linked.blocks.into_iter().map(UniformBlock::new).collect();

        let buffers: Vec<wgpu::Buffer> = blocks
            .iter()
            .map(|block| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("{label} '{}' uniforms", block.layout.name)),
                    size: block.layout.size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let uniform_entries: Vec<wgpu::BindGroupLayoutEntry> = blocks
            .iter()
            .map(|block| wgpu::BindGroupLayoutEntry {
                binding: block.layout.binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Uniform Layout")),
            entries: &uniform_entries,
        });

        let bind_entries: Vec<wgpu::BindGroupEntry<'_>> = blocks
            .iter()
            .zip(&buffers)
            .map(|(block, buffer)| wgpu::BindGroupEntry {
                binding: block.layout.binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Uniform Bind Group")),
            layout: &uniform_layout,
            entries: &bind_entries,
        });

        let texture_entries: Vec<wgpu::BindGroupLayoutEntry> = linked
            .textures
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: match slot.kind {
                    TextureBindingKind::Texture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    TextureBindingKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Texture Layout")),
            entries: &texture_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        log::info!(
            "linked shader program '{label}': {} uniform block(s), {} texture binding(s)",
            blocks.len(),
            linked.textures.len(),
        );

        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.to_owned(),
            vertex_module,
            fragment_module,
            vertex_entry: linked.vertex_entry,
            fragment_entry: linked.fragment_entry,
            uniforms: linked.uniforms,
            blocks,
            buffers,
            uniform_layout,
            uniform_bind_group,
            texture_layout,
            textures: linked.textures,
            pipeline_layout,
            strict: false,
        }
    }

    /// Make this program the active one: flush pending uniform writes to
    /// the GPU and record the program in the driver's [`RenderState`].
    pub fn use_program(&mut self, context: &RenderContext, state: &mut RenderState) {
        for (block, buffer) in self.blocks.iter_mut().zip(&self.buffers) {
            if block.dirty {
                context.queue.write_buffer(buffer, 0, &block.data);
                block.dirty = false;
            }
        }
        state.set_active_program(self.id);
    }

    /// Write a uniform by name into CPU staging.
    ///
    /// With strict mode off (the default), an unknown name or a kind
    /// mismatch is a silent no-op that returns `Ok(())` — callers cannot
    /// distinguish a successful write from a typo'd name. With strict
    /// mode on, both conditions are reported.
    ///
    /// # Errors
    ///
    /// [`UniformError`] only when strict mode is enabled.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let Some(&slot) = self.uniforms.get(name) else {
            if self.strict {
                return Err(UniformError::UnknownName(name.to_owned()));
            }
            log::warn!(
                "uniform '{name}' not found in program '{}'; write ignored",
                self.label
            );
            return Ok(());
        };
        if slot.kind != value.kind() {
            if self.strict {
                return Err(UniformError::KindMismatch {
                    name: name.to_owned(),
                    expected: slot.kind,
                    got: value.kind(),
                });
            }
            log::warn!(
                "uniform '{name}' in program '{}' is {:?}, write of {:?} ignored",
                self.label,
                slot.kind,
                value.kind(),
            );
            return Ok(());
        }
        self.blocks[slot.block].write(slot.offset, &value);
        Ok(())
    }

    /// Enable or disable strict uniform-write reporting.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Build the group-1 bind group from the currently bound texture
    /// units.
    ///
    /// # Errors
    ///
    /// [`ShaderError::MissingTextureUnit`] if a reflected texture binding
    /// reads a unit with nothing bound to it.
    pub fn texture_bind_group(
        &self,
        context: &RenderContext,
        state: &RenderState,
    ) -> Result<wgpu::BindGroup, ShaderError> {
        let mut entries = Vec::with_capacity(self.textures.len());
        for slot in &self.textures {
            let bound = state
                .texture(slot.unit)
                .ok_or(ShaderError::MissingTextureUnit {
                    unit: slot.unit,
                    binding: slot.binding,
                })?;
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: match slot.kind {
                    TextureBindingKind::Texture => {
                        wgpu::BindingResource::TextureView(&bound.view)
                    }
                    TextureBindingKind::Sampler => {
                        wgpu::BindingResource::Sampler(&bound.sampler)
                    }
                },
            });
        }
        Ok(context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Texture Bind Group", self.label)),
                layout: &self.texture_layout,
                entries: &entries,
            }))
    }

    /// Opaque program identity, recorded in [`RenderState`] on activation.
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Debug label derived from the vertex source path or caller-supplied.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The compiled vertex-stage module.
    #[must_use]
    pub fn vertex_module(&self) -> &wgpu::ShaderModule {
        &self.vertex_module
    }

    /// The compiled fragment-stage module.
    #[must_use]
    pub fn fragment_module(&self) -> &wgpu::ShaderModule {
        &self.fragment_module
    }

    /// Name of the vertex entry point, for pipeline creation.
    #[must_use]
    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    /// Name of the fragment entry point, for pipeline creation.
    #[must_use]
    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Layout combining the uniform group (0) and texture group (1).
    #[must_use]
    pub fn pipeline_layout(&self) -> &wgpu::PipelineLayout {
        &self.pipeline_layout
    }

    /// The group-0 bind group over the program's uniform buffers.
    #[must_use]
    pub fn uniform_bind_group(&self) -> &wgpu::BindGroup {
        &self.uniform_bind_group
    }

    /// Layout of the group-0 uniform bind group.
    #[must_use]
    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    /// Layout of the group-1 texture bind group.
    #[must_use]
    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Names of all settable uniforms, unsorted.
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
