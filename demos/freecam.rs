//! Minimal windowed driver: a textured triangle seen through the
//! free-fly camera.
//!
//! Hold the left mouse button to look around; WASD/Space/Shift to move.
//! Everything glint deliberately leaves to the driver lives here: the
//! window, the render pipeline, and the draw loop.

use std::sync::Arc;

use glam::Mat4;
use image::{DynamicImage, ImageBuffer, Rgba};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use glint::camera::core::Camera;
use glint::camera::input::CameraInput;
use glint::camera::projection::Projection;
use glint::error::GlintError;
use glint::gpu::program::ShaderProgram;
use glint::gpu::render_context::RenderContext;
use glint::gpu::state::RenderState;
use glint::gpu::texture::{Texture2D, TextureImage, TextureOptions};
use glint::gpu::uniform::UniformValue;
use glint::options::Options;
use glint::util::frame_clock::FrameClock;

const VERTEX_SHADER: &str = r"
struct Transforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
}
@group(0) @binding(0) var<uniform> transforms: Transforms;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VsOut {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
    );
    let p = positions[index];
    var out: VsOut;
    out.clip = transforms.projection * transforms.view * transforms.model
        * vec4<f32>(p, 0.0, 1.0);
    out.uv = p + vec2<f32>(0.5, 0.5);
    return out;
}
";

const FRAGMENT_SHADER: &str = r"
struct Material {
    tint: vec4<f32>,
}
@group(0) @binding(1) var<uniform> material: Material;
@group(1) @binding(0) var t_checker: texture_2d<f32>;
@group(1) @binding(1) var s_checker: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(t_checker, s_checker, uv) * material.tint;
}
";

/// 8x8 checkerboard, generated so the demo needs no asset files.
fn checker_image() -> TextureImage {
    let image = DynamicImage::ImageRgba8(ImageBuffer::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba([230, 230, 230, 255])
        } else {
            Rgba([40, 40, 40, 255])
        }
    }));
    TextureImage::from_image(image, &TextureOptions::default())
}

struct Scene {
    context: RenderContext,
    state: RenderState,
    program: ShaderProgram,
    _texture: Texture2D,
    pipeline: wgpu::RenderPipeline,
    camera: Camera,
    projection: Projection,
}

impl Scene {
    fn new(window: Arc<Window>, options: &Options) -> Result<Self, GlintError> {
        let size = window.inner_size();
        let context =
            RenderContext::new_blocking(window, (size.width.max(1), size.height.max(1)))?;

        let mut program = ShaderProgram::from_sources(
            &context,
            "freecam",
            VERTEX_SHADER,
            "freecam.vert.wgsl",
            FRAGMENT_SHADER,
            "freecam.frag.wgsl",
        )?;
        program.set_strict(true);

        let texture = Texture2D::from_image(&context, &checker_image(), "checker");
        let mut state = RenderState::new();
        texture.bind(0, &mut state);

        let pipeline = context
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Freecam Pipeline"),
                layout: Some(program.pipeline_layout()),
                vertex: wgpu::VertexState {
                    module: program.vertex_module(),
                    entry_point: Some(program.vertex_entry()),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: program.fragment_module(),
                    entry_point: Some(program.fragment_entry()),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: context.format(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let mut camera = Camera::default();
        camera.position.z = 3.0;
        options.camera.apply(&mut camera);
        let projection = options
            .camera
            .projection(size.width.max(1), size.height.max(1));

        Ok(Self {
            context,
            state,
            program,
            _texture: texture,
            pipeline,
            camera,
            projection,
        })
    }

    /// Strict-mode uniform write; a failure here is a programming error
    /// in the demo, so it is logged rather than unwound.
    fn set(&mut self, name: &str, value: UniformValue) {
        if let Err(e) = self.program.set_uniform(name, value) {
            log::error!("{e}");
        }
    }

    fn render(&mut self, spin: f32) -> Result<(), wgpu::SurfaceError> {
        self.set("model", UniformValue::Mat4 {
            value: Mat4::from_rotation_y(spin),
            transpose: false,
        });
        self.set("view", UniformValue::Mat4 {
            value: self.camera.view_matrix(),
            transpose: false,
        });
        self.set("projection", UniformValue::Mat4 {
            value: self.projection.matrix(),
            transpose: false,
        });
        self.set("tint", UniformValue::Vec4(glam::Vec4::ONE));

        self.program.use_program(&self.context, &mut self.state);
        let textures = self
            .program
            .texture_bind_group(&self.context, &self.state)
            .map_err(|e| {
                log::error!("{e}");
                wgpu::SurfaceError::Lost
            })?;

        let frame = self.context.acquire_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_encoder();
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Freecam Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.2,
                            g: 0.3,
                            b: 0.3,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, self.program.uniform_bind_group(), &[]);
            pass.set_bind_group(1, &textures, &[]);
            pass.draw(0..3, 0..1);
        }
        self.context.submit(encoder);
        frame.present();
        Ok(())
    }
}

#[derive(Default)]
struct App {
    window: Option<Arc<Window>>,
    scene: Option<Scene>,
    input: CameraInput,
    clock: FrameClock,
    looking: bool,
    spin: f32,
    options: Options,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }
        let attrs = Window::default_attributes().with_title("glint freecam");
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };
        match Scene::new(window.clone(), &self.options) {
            Ok(scene) => {
                self.window = Some(window);
                self.scene = Some(scene);
            }
            Err(e) => {
                log::error!("scene setup failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        let _ = self.input.handle_window_event(&event);
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.context.resize(size.width, size.height);
                    scene.projection.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.looking = state == ElementState::Pressed;
            }
            WindowEvent::RedrawRequested => {
                let delta = self.clock.tick();
                self.spin += delta;
                if let Some(scene) = self.scene.as_mut() {
                    self.input.apply(&mut scene.camera, delta);
                    match scene.render(self.spin) {
                        Ok(()) | Err(wgpu::SurfaceError::Outdated) => {}
                        Err(e) => log::warn!("frame skipped: {e}"),
                    }
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _id: DeviceId,
        event: DeviceEvent,
    ) {
        // Mouse-look only while the left button is held.
        if self.looking {
            let _ = self.input.handle_device_event(&event);
        }
    }
}

fn main() {
    env_logger::init();
    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => {
            log::error!("event loop creation failed: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::default();
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}
