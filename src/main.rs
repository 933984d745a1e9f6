// Questar: questions and their answers as stars in a navigable universe.
//
// Frame loop and GPU plumbing live here; all simulation state is in the
// engine modules. Per tick, in fixed order: drain stream events, apply input,
// drive the camera director and cruise picker, animate the scene, render.

mod engine;

use std::sync::mpsc::{Receiver, Sender};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Mat4;
use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::KeyCode,
    window::Window,
};

use engine::hud::{Hud, HudFrame, HudStats, UiEvent};
use engine::layout;
use engine::scene::{FrameSnapshot, LineVertex, SpriteInstance, glow_pixels};
use engine::stream::{self, AnswerEvent, CannedAnswerSource};
use engine::{
    CameraDirector, CameraMode, CruiseConfig, CruiseTargetPicker, DirectorInputs, FocusState,
    InputState, OrbitCamera, SceneState, SessionPhase, Star, StarField, StarId,
};

/// Seed star count at startup.
const SEED_STARS: usize = 60;
/// Clicks farther than this from a star's screen position miss it.
const PICK_RADIUS_PX: f32 = 20.0;

// ============================================================================
// QUAD GEOMETRY (shared by every sprite instance)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    corner: [f32; 2],
}

impl QuadVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { corner: [-1.0, -1.0] },
    QuadVertex { corner: [1.0, -1.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [-1.0, 1.0] },
];

const QUAD_INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

// ============================================================================
// UNIFORM DATA (camera)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
}

impl Uniforms {
    fn from_camera(camera: &OrbitCamera, aspect: f32) -> Self {
        let (right, up) = camera.billboard_axes();
        Self {
            view_proj: camera.view_projection(aspect).to_cols_array_2d(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
        }
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,

    sprite_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    sprite_instance_buffer: wgpu::Buffer,
    max_sprites: usize,
    line_vertex_buffer: wgpu::Buffer,
    max_line_vertices: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    glow_bind_group: wgpu::BindGroup,

    hud: Hud,
    input: InputState,

    // Simulation
    field: StarField,
    focus: FocusState,
    streaming_star: Option<StarId>,
    camera: OrbitCamera,
    director: CameraDirector,
    picker: CruiseTargetPicker,
    scene: SceneState,
    voyage_mode: bool,
    voyage_hud: bool,
    cruise_enabled: bool,
    last_mode: CameraMode,

    answer_tx: Sender<AnswerEvent>,
    answer_rx: Receiver<AnswerEvent>,

    // Timing
    started: std::time::Instant,
    last_update: std::time::Instant,
    frame: FrameSnapshot,

    // Stats (F3)
    show_stats: bool,
    stats: HudStats,
    frames_this_second: u32,
    frame_time_sum: f32,
    frame_time_min: f32,
    frame_time_max: f32,
    last_stats_flush: std::time::Instant,
}

impl State {
    async fn new(window: std::sync::Arc<winit::window::Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

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
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
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
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        use wgpu::util::DeviceExt;

        // ---- Uniforms -------------------------------------------------------
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniforms"),
            contents: bytemuck::cast_slice(&[Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                camera_right: [1.0, 0.0, 0.0, 0.0],
                camera_up: [0.0, 1.0, 0.0, 0.0],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        // ---- Glow texture (created once, owned here) ------------------------
        let glow_size = 64u32;
        let glow_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glow texture"),
            size: wgpu::Extent3d {
                width: glow_size,
                height: glow_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &glow_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &glow_pixels(glow_size as usize),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * glow_size),
                rows_per_image: Some(glow_size),
            },
            wgpu::Extent3d {
                width: glow_size,
                height: glow_size,
                depth_or_array_layers: 1,
            },
        );
        let glow_view = glow_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let glow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glow sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let glow_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("glow_bind_group_layout"),
            });

        let glow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &glow_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&glow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&glow_sampler),
                },
            ],
            label: Some("glow_bind_group"),
        });

        // ---- Sprite pipeline: additive, billboarded -------------------------
        let sprite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_sprites.wgsl").into()),
        });

        let sprite_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sprite pipeline layout"),
                bind_group_layouts: &[&uniform_bind_group_layout, &glow_bind_group_layout],
                push_constant_ranges: &[],
            });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let sprite_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite pipeline"),
            layout: Some(&sprite_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sprite_shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::desc(), SpriteInstance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &sprite_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
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

        // ---- Line pipeline: alpha-blended line list -------------------------
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_lines.wgsl").into()),
        });

        let line_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("line pipeline layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line pipeline"),
            layout: Some(&line_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
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

        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let max_sprites = 8192;
        let sprite_instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite instances"),
            size: (max_sprites * std::mem::size_of::<SpriteInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let max_line_vertices = 1024;
        let line_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("line vertices"),
            size: (max_line_vertices * std::mem::size_of::<LineVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let hud = Hud::new(&window, &device, surface_format);

        // ---- Simulation state -----------------------------------------------
        let seed = universe_seed();
        log::info!("universe seed {seed}");

        let mut field = StarField::new();
        let mut seed_rng = StdRng::seed_from_u64(seed);
        layout::seed_universe(&mut field, SEED_STARS, &mut seed_rng);

        let (answer_tx, answer_rx) = stream::answer_channel();

        Self {
            surface,
            device,
            queue,
            config,
            size,
            sprite_pipeline,
            line_pipeline,
            quad_vertex_buffer,
            quad_index_buffer,
            sprite_instance_buffer,
            max_sprites,
            line_vertex_buffer,
            max_line_vertices,
            uniform_buffer,
            uniform_bind_group,
            glow_bind_group,
            hud,
            input: InputState::new(),
            field,
            focus: FocusState::new(),
            streaming_star: None,
            camera: OrbitCamera::new(),
            director: CameraDirector::new(),
            picker: CruiseTargetPicker::new(seed ^ 0x9e37_79b9),
            scene: SceneState::new(seed.rotate_left(17)),
            voyage_mode: false,
            voyage_hud: true,
            cruise_enabled: true,
            last_mode: CameraMode::Cruise,
            answer_tx,
            answer_rx,
            started: std::time::Instant::now(),
            last_update: std::time::Instant::now(),
            frame: FrameSnapshot {
                sprites: Vec::new(),
                lines: Vec::new(),
            },
            show_stats: false,
            stats: HudStats {
                fps: 0,
                frame_time_avg_ms: 0.0,
                frame_time_min_ms: 0.0,
                frame_time_max_ms: 0.0,
                star_count: 0,
                sprite_count: 0,
                camera_mode: "cruise",
                cruise_preset: "ambient",
            },
            frames_this_second: 0,
            frame_time_sum: 0.0,
            frame_time_min: f32::MAX,
            frame_time_max: 0.0,
            last_stats_flush: std::time::Instant::now(),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn phase(&self) -> SessionPhase {
        match (self.focus.is_open(), self.streaming_star) {
            (true, Some(s)) if self.focus.viewing() == Some(s) => SessionPhase::Streaming,
            (true, _) => SessionPhase::Viewing,
            (false, _) => SessionPhase::Idle,
        }
    }

    /// Advance the simulation one tick. Returns true when the app should quit.
    fn update(&mut self) -> bool {
        let now = std::time::Instant::now();
        let dt = (now - self.last_update).as_secs_f32().min(0.1);
        self.last_update = now;
        let elapsed = (now - self.started).as_secs_f32();

        // 1. Apply stream events, in arrival order.
        while let Ok(event) = self.answer_rx.try_recv() {
            self.field.update_answer(event.star, &event.text);
            if event.finished {
                let topic = self
                    .field
                    .get(event.star)
                    .map(|s| layout::infer_topic(s.position, &self.field));
                if let Some(topic) = topic {
                    log::info!("stream for {:?} finished; topic '{topic}'", event.star);
                    self.field.finalize_topic(event.star, &topic);
                }
                if self.streaming_star == Some(event.star) {
                    self.streaming_star = None;
                }
            }
        }

        // 2. Keyboard shortcuts (unless the HUD owns the keyboard).
        if !self.hud.wants_keyboard() {
            if self.input.was_key_pressed(KeyCode::KeyV) {
                self.voyage_mode = !self.voyage_mode;
                log::info!("voyage mode {}", if self.voyage_mode { "on" } else { "off" });
            }
            if self.input.was_key_pressed(KeyCode::KeyH) {
                self.voyage_hud = !self.voyage_hud;
            }
            if self.input.was_key_pressed(KeyCode::KeyC) {
                self.cruise_enabled = !self.cruise_enabled;
            }
            if self.input.was_key_pressed(KeyCode::F3) {
                self.show_stats = !self.show_stats;
            }
            if self.input.was_key_pressed(KeyCode::Escape) {
                if self.focus.is_open() {
                    self.focus.clear();
                } else if self.voyage_mode {
                    self.voyage_mode = false;
                } else {
                    return true;
                }
            }
        }

        // 3. Pointer: star picking and orbit input, unless over the HUD.
        let pointer_free = !self.hud.wants_pointer();
        let locked = self.focus.viewing().is_some();
        if pointer_free {
            if let Some(click) = self.input.take_click() {
                if let Some(id) = self.pick_star(click) {
                    log::debug!("selected {id:?}");
                    self.focus.select(id);
                }
            }
            self.camera.feed_input(&self.input, !locked);
        }
        let interacting = pointer_free && self.input.is_left_held() && !locked;

        // 4. Camera.
        self.camera.update(dt);
        let viewing_star = self.focus.viewing().and_then(|id| self.field.get(id));
        let preset = if self.voyage_mode {
            CruiseConfig::FULL
        } else {
            CruiseConfig::AMBIENT
        };
        let mode = self.director.update(
            &mut self.camera,
            self.field.all(),
            DirectorInputs {
                viewing: viewing_star,
                cruise_enabled: self.cruise_enabled,
                interacting,
                preset,
            },
            dt,
            elapsed,
        );
        if mode != self.last_mode {
            log::debug!(
                "camera mode {:?} -> {:?}, heading {}",
                self.last_mode,
                mode,
                self.director.heading()
            );
        }
        self.last_mode = mode;

        // 5. Cruise highlight.
        let picker_enabled = mode == CameraMode::Cruise && self.voyage_mode && self.voyage_hud;
        self.picker.update(
            picker_enabled,
            self.field.all(),
            self.camera.position,
            self.camera.facing(),
            elapsed,
        );

        // 6. Scene animation → flat draw data.
        self.frame = self.scene.update(
            &self.field,
            self.focus.viewing(),
            self.focus.anchor(),
            self.picker.active(),
            &self.camera,
            dt,
            elapsed,
        );

        // Stats bookkeeping.
        let frame_ms = dt * 1000.0;
        self.frames_this_second += 1;
        self.frame_time_sum += frame_ms;
        self.frame_time_min = self.frame_time_min.min(frame_ms);
        self.frame_time_max = self.frame_time_max.max(frame_ms);
        if (now - self.last_stats_flush).as_secs_f32() >= 1.0 {
            self.stats = HudStats {
                fps: self.frames_this_second,
                frame_time_avg_ms: self.frame_time_sum / self.frames_this_second.max(1) as f32,
                frame_time_min_ms: self.frame_time_min,
                frame_time_max_ms: self.frame_time_max,
                star_count: self.field.len(),
                sprite_count: self.frame.sprites.len(),
                camera_mode: match self.last_mode {
                    CameraMode::FreeOrbit => "orbit",
                    CameraMode::LockedFocus => "locked",
                    CameraMode::Cruise => "cruise",
                },
                cruise_preset: if self.voyage_mode { "full" } else { "ambient" },
            };
            self.frames_this_second = 0;
            self.frame_time_sum = 0.0;
            self.frame_time_min = f32::MAX;
            self.frame_time_max = 0.0;
            self.last_stats_flush = now;
        }

        false
    }

    /// Screen-space picking: project every star and take the one closest to
    /// the click, within the pick radius.
    fn pick_star(&self, click: (f32, f32)) -> Option<StarId> {
        let (w, h) = (self.size.width as f32, self.size.height as f32);
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        let view_proj = self.camera.view_projection(w / h);

        let mut best: Option<(f32, StarId)> = None;
        for star in self.field.all() {
            let clip = view_proj * star.position.extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.truncate() / clip.w;
            let sx = (ndc.x + 1.0) * 0.5 * w;
            let sy = (1.0 - ndc.y) * 0.5 * h;
            let dist = ((sx - click.0).powi(2) + (sy - click.1).powi(2)).sqrt();
            if dist <= PICK_RADIUS_PX && best.is_none_or(|(d, _)| dist < d) {
                best = Some((dist, star.id));
            }
        }
        best.map(|(_, id)| id)
    }

    fn submit_question(&mut self, question: String) {
        let position = layout::synthesize_position(&question, true, self.field.all());
        let id = self.field.next_id();
        self.field.add(Star::new(id, question.clone(), position));
        self.focus.select(id);
        self.streaming_star = Some(id);
        log::info!("new star {id:?} at {position} for {question:?}");

        stream::spawn_answer_stream(CannedAnswerSource, id, question, self.answer_tx.clone());
    }

    fn apply_ui_events(&mut self, events: Vec<UiEvent>) {
        for event in events {
            match event {
                UiEvent::Submit(question) => self.submit_question(question),
                UiEvent::SelectNeighbor(id) => self.focus.drift(id),
                UiEvent::CloseSession => self.focus.clear(),
                UiEvent::StopVoyage => self.voyage_mode = false,
                UiEvent::ToggleVoyageHud => self.voyage_hud = !self.voyage_hud,
            }
        }
    }

    fn render(&mut self, window: &Window) -> Result<Vec<UiEvent>, wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Upload this frame's buffers before the pass begins.
        let sprite_count = self.frame.sprites.len().min(self.max_sprites);
        if sprite_count > 0 {
            self.queue.write_buffer(
                &self.sprite_instance_buffer,
                0,
                bytemuck::cast_slice(&self.frame.sprites[..sprite_count]),
            );
        }
        let line_count = self.frame.lines.len().min(self.max_line_vertices) & !1;
        if line_count > 0 {
            self.queue.write_buffer(
                &self.line_vertex_buffer,
                0,
                bytemuck::cast_slice(&self.frame.lines[..line_count]),
            );
        }

        let aspect = self.size.width as f32 / self.size.height.max(1) as f32;
        let uniforms = Uniforms::from_camera(&self.camera, aspect);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("universe pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.012,
                            g: 0.012,
                            b: 0.045,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.sprite_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.glow_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.sprite_instance_buffer.slice(..));
            render_pass
                .set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..sprite_count as u32);

            if line_count > 0 {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.line_vertex_buffer.slice(..));
                render_pass.draw(0..line_count as u32, 0..1);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        let hud_frame = HudFrame {
            field: &self.field,
            focus: &self.focus,
            phase: self.phase(),
            voyage_mode: self.voyage_mode,
            voyage_hud: self.voyage_hud,
            cruise_target: self.picker.active(),
            stats: self.show_stats.then_some(&self.stats),
        };
        let events = self.hud.render(
            &self.device,
            &self.queue,
            &mut encoder,
            window,
            &view,
            &screen_descriptor,
            hud_frame,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(events)
    }
}

/// Session RNG seed: overridable for reproducible layouts, otherwise drawn
/// from the clock.
fn universe_seed() -> u64 {
    std::env::var("QUESTAR_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
        })
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("Questar")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = std::sync::Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut state = pollster::block_on(State::new(window.clone()));

    event_loop
        .run(move |event, control_flow| {
            match event {
                WinitEvent::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == window.id() => {
                    // The HUD sees every event; the input snapshot also does,
                    // and pointer-over-HUD gating happens at use sites.
                    let _ = state.hud.handle_window_event(&window, event);
                    state.input.process_event(event);

                    match event {
                        WindowEvent::CloseRequested => control_flow.exit(),
                        WindowEvent::Resized(physical_size) => {
                            state.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            if state.update() {
                                control_flow.exit();
                                return;
                            }
                            match state.render(&window) {
                                Ok(events) => state.apply_ui_events(events),
                                Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                                Err(e) => log::error!("render: {e:?}"),
                            }
                            state.input.end_frame();
                        }
                        _ => {}
                    }
                }
                WinitEvent::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}
