//! wgpu presentation layer.
//!
//! Consumes the ordered draw-primitive list produced by the render model.
//! Filled shapes (polygons, circles) are tessellated on the CPU into a
//! single per-vertex-color triangle list; text goes through glyphon. The
//! painter's order of the scene is preserved by chunking it into runs of
//! consecutive shape/text commands and recording one render pass per run.

use crate::renderer::Renderer;
use crate::scene::{Anchor, DrawCmd, Rgba};
use glyphon::{
    Attrs, Buffer, Cache, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer, Viewport,
};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

const SHAPE_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = vec4<f32>(input.position, 0.0, 1.0);
    output.color = input.color;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return input.color;
}
"#;

const CIRCLE_SEGMENTS: usize = 24;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ShapeVertex {
    position: [f32; 2],
    color: [f32; 4],
}

impl ShapeVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// A maximal stretch of consecutive same-kind commands.
enum Run {
    Shapes(Vec<ShapeVertex>),
    Texts(Vec<PlacedText>),
}

struct PlacedText {
    buffer: Buffer,
    left: f32,
    top: f32,
    color: glyphon::Color,
}

pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    shape_pipeline: wgpu::RenderPipeline,

    font_system: FontSystem,
    swash_cache: SwashCache,
    glyph_viewport: Viewport,
    atlas: TextAtlas,
    /// One renderer per text run in a frame; grown on demand. Runs cannot
    /// share a renderer because a later `prepare` would overwrite buffers an
    /// earlier recorded pass still references.
    text_renderers: Vec<TextRenderer>,

    window_size: (u32, u32),
}

impl WgpuRenderer {
    pub async fn new(window: Arc<Window>) -> Self {
        let mut window_size = window.inner_size();
        if window_size.width == 0 || window_size.height == 0 {
            window_size.width = 650;
            window_size.height = 650;
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // The surface keeps its own handle to the window alive.
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: window_size.width,
            height: window_size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shape_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shape Shader"),
            source: wgpu::ShaderSource::Wgsl(SHAPE_SHADER.into()),
        });

        let shape_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shape Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let shape_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: Some(&shape_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shape_shader,
                entry_point: Some("vs_main"),
                buffers: &[ShapeVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shape_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let glyph_cache = Cache::new(&device);
        let glyph_viewport = Viewport::new(&device, &glyph_cache);
        let atlas = TextAtlas::new(&device, &queue, &glyph_cache, surface_format);

        Self {
            surface,
            device,
            queue,
            config,
            shape_pipeline,
            font_system,
            swash_cache,
            glyph_viewport,
            atlas,
            text_renderers: Vec::new(),
            window_size: (window_size.width, window_size.height),
        }
    }

    fn to_ndc(&self, point: [f32; 2]) -> [f32; 2] {
        [
            point[0] / self.window_size.0 as f32 * 2.0 - 1.0,
            1.0 - point[1] / self.window_size.1 as f32 * 2.0,
        ]
    }

    fn push_polygon(&self, vertices: &mut Vec<ShapeVertex>, points: &[[f32; 2]], color: Rgba) {
        // Fan triangulation; scene polygons are convex.
        for i in 1..points.len().saturating_sub(1) {
            for &p in &[points[0], points[i], points[i + 1]] {
                vertices.push(ShapeVertex {
                    position: self.to_ndc(p),
                    color,
                });
            }
        }
    }

    fn push_circle(
        &self,
        vertices: &mut Vec<ShapeVertex>,
        center: [f32; 2],
        radius: f32,
        color: Rgba,
    ) {
        let rim = |i: usize| {
            let angle = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
            [center[0] + radius * angle.cos(), center[1] + radius * angle.sin()]
        };
        for i in 0..CIRCLE_SEGMENTS {
            for &p in &[center, rim(i), rim(i + 1)] {
                vertices.push(ShapeVertex {
                    position: self.to_ndc(p),
                    color,
                });
            }
        }
    }

    fn place_text(
        &mut self,
        text: &str,
        position: [f32; 2],
        color: Rgba,
        size: f32,
        anchor: Anchor,
    ) -> PlacedText {
        let metrics = Metrics::new(size.max(1.0), size.max(1.0) * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        buffer.set_text(
            &mut self.font_system,
            text,
            Attrs::new().family(Family::SansSerif),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let (left, top) = match anchor {
            Anchor::TopLeft => (position[0], position[1]),
            Anchor::Center => {
                let width = buffer
                    .layout_runs()
                    .map(|run| run.line_w)
                    .fold(0.0f32, f32::max);
                (
                    position[0] - width / 2.0,
                    position[1] - metrics.line_height / 2.0,
                )
            }
        };

        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
        PlacedText {
            buffer,
            left,
            top,
            color: glyphon::Color::rgba(to_u8(color[0]), to_u8(color[1]), to_u8(color[2]), to_u8(color[3])),
        }
    }

    /// Split the scene into maximal shape/text runs, tessellating shapes and
    /// shaping text as we go.
    fn build_runs(&mut self, scene: &[DrawCmd]) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::new();
        for cmd in scene {
            match cmd {
                DrawCmd::Polygon { points, color } => {
                    if !matches!(runs.last(), Some(Run::Shapes(_))) {
                        runs.push(Run::Shapes(Vec::new()));
                    }
                    if let Some(Run::Shapes(vertices)) = runs.last_mut() {
                        self.push_polygon(vertices, points, *color);
                    }
                }
                DrawCmd::Circle {
                    center,
                    radius,
                    color,
                } => {
                    if !matches!(runs.last(), Some(Run::Shapes(_))) {
                        runs.push(Run::Shapes(Vec::new()));
                    }
                    if let Some(Run::Shapes(vertices)) = runs.last_mut() {
                        self.push_circle(vertices, *center, *radius, *color);
                    }
                }
                DrawCmd::Text {
                    text,
                    position,
                    color,
                    size,
                    anchor,
                } => {
                    let placed = self.place_text(text, *position, *color, *size, *anchor);
                    if let Some(Run::Texts(texts)) = runs.last_mut() {
                        texts.push(placed);
                    } else {
                        runs.push(Run::Texts(vec![placed]));
                    }
                }
            }
        }
        runs
    }
}

impl Renderer for WgpuRenderer {
    fn render(&mut self, scene: &[DrawCmd]) {
        let runs = self.build_runs(scene);

        self.glyph_viewport.update(
            &self.queue,
            Resolution {
                width: self.window_size.0,
                height: self.window_size.1,
            },
        );

        // One glyphon renderer per text run.
        let text_run_count = runs.iter().filter(|r| matches!(r, Run::Texts(_))).count();
        while self.text_renderers.len() < text_run_count {
            self.text_renderers.push(TextRenderer::new(
                &mut self.atlas,
                &self.device,
                wgpu::MultisampleState::default(),
                None,
            ));
        }

        let bounds = TextBounds {
            left: 0,
            top: 0,
            right: self.window_size.0 as i32,
            bottom: self.window_size.1 as i32,
        };

        let mut text_run = 0usize;
        for run in &runs {
            if let Run::Texts(texts) = run {
                let areas: Vec<TextArea> = texts
                    .iter()
                    .map(|placed| TextArea {
                        buffer: &placed.buffer,
                        left: placed.left,
                        top: placed.top,
                        scale: 1.0,
                        bounds,
                        default_color: placed.color,
                        custom_glyphs: &[],
                    })
                    .collect();
                if let Err(err) = self.text_renderers[text_run].prepare(
                    &self.device,
                    &self.queue,
                    &mut self.font_system,
                    &mut self.atlas,
                    &self.glyph_viewport,
                    areas,
                    &mut self.swash_cache,
                ) {
                    log::error!("text prepare failed: {err}");
                }
                text_run += 1;
            }
        }

        let output = self.surface.get_current_texture().unwrap();
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let shape_buffers: Vec<Option<(wgpu::Buffer, u32)>> = runs
            .iter()
            .map(|run| match run {
                Run::Shapes(vertices) if !vertices.is_empty() => {
                    let buffer =
                        self.device
                            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some("Shape Vertex Buffer"),
                                contents: bytemuck::cast_slice(vertices),
                                usage: wgpu::BufferUsages::VERTEX,
                            });
                    Some((buffer, vertices.len() as u32))
                }
                _ => None,
            })
            .collect();

        let clear = wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        };

        let mut text_run = 0usize;
        let mut first_pass = true;
        let pass_count = runs.len().max(1);
        for pass_idx in 0..pass_count {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: if first_pass {
                            wgpu::LoadOp::Clear(clear)
                        } else {
                            wgpu::LoadOp::Load
                        },
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            first_pass = false;

            match runs.get(pass_idx) {
                Some(Run::Shapes(_)) => {
                    if let Some(Some((buffer, count))) = shape_buffers.get(pass_idx) {
                        render_pass.set_pipeline(&self.shape_pipeline);
                        render_pass.set_vertex_buffer(0, buffer.slice(..));
                        render_pass.draw(0..*count, 0..1);
                    }
                }
                Some(Run::Texts(_)) => {
                    if let Err(err) = self.text_renderers[text_run].render(
                        &self.atlas,
                        &self.glyph_viewport,
                        &mut render_pass,
                    ) {
                        log::error!("text render failed: {err}");
                    }
                    text_run += 1;
                }
                None => {} // empty scene: clear only
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.atlas.trim();
    }

    fn resize(&mut self, new_size: (u32, u32)) {
        if new_size.0 > 0 && new_size.1 > 0 {
            self.window_size = new_size;
            self.config.width = new_size.0;
            self.config.height = new_size.1;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn viewport(&self) -> (u32, u32) {
        self.window_size
    }
}
