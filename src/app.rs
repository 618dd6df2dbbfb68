//! Application state holding the wgpu graphics context
//!
//! Owns the device/surface, the display mode, the tree effect and its
//! renderer, the webcam feed, the gesture classifier, and the egui overlay.
//! The event loop calls `update` then `render` once per frame.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::camera::CameraFeed;
use crate::config::AppConfig;
use crate::effects::tree_morph::{DisplayMode, TreeMorphEffect};
use crate::gesture::{mode_for_gesture, Gesture, GestureClassifier};
use crate::render::post::{PostChain, PostParams};
use crate::render::tree::TreeRenderer;
use crate::render::{DEPTH_FORMAT, HDR_FORMAT};
use crate::scene::OrbitCamera;

/// Pixel size of one photo card texture layer
const CARD_LAYER_WIDTH: u32 = 384;
const CARD_LAYER_HEIGHT: u32 = 480;

/// Main application state
pub struct App {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,

    // Scene and effect
    app_config: AppConfig,
    mode: DisplayMode,
    orbit: OrbitCamera,
    tree: TreeMorphEffect,

    // GPU resources
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    hdr_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    tree_renderer: TreeRenderer,
    post: PostChain,
    post_params: PostParams,

    // Webcam and gesture polling
    camera: Option<CameraFeed>,
    classifier: Option<GestureClassifier>,
    last_poll: Instant,
    last_reading_seq: u64,
    last_gesture: Gesture,

    // egui integration
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,

    // Input
    dragging: bool,
    last_cursor: Option<(f32, f32)>,

    // Frame timing
    start_time: Instant,
    fps: f64,
    last_fps_update: Instant,
    frames_since_update: u64,
}

impl App {
    /// Create a new App instance with initialized wgpu context
    pub async fn new(window: Arc<Window>, app_config: AppConfig) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find suitable GPU adapter");

        log::info!("Using GPU: {}", adapter.get_info().name);
        log::info!("Backend: {:?}", adapter.get_info().backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Arborglow Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        // Per-frame globals shared by every scene pipeline
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<crate::scene::Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let (hdr_view, depth_view) =
            Self::create_scene_targets(&device, config.width, config.height);

        let tree = TreeMorphEffect::new(&app_config.tree);

        let card_texture_view = Self::build_card_textures(
            &device,
            &queue,
            app_config.tree.card_count as u32,
            app_config.photos_dir.as_deref(),
        );

        let tree_renderer =
            TreeRenderer::new(&device, &queue, &globals_layout, &card_texture_view, &tree);

        let post = PostChain::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            &hdr_view,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let mut style = (*egui_ctx.style()).clone();
        style.visuals.window_shadow = egui::epaint::Shadow::NONE;
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        // Gesture classification is optional: without a key the manual
        // toggle still works
        let classifier = match GestureClassifier::new(app_config.classifier.clone()) {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("Gesture classifier unavailable: {}", e);
                None
            }
        };

        let now = Instant::now();
        let mut app = Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            app_config,
            mode: DisplayMode::Formed,
            orbit: OrbitCamera::new(),
            tree,
            globals_buffer,
            globals_bind_group,
            hdr_view,
            depth_view,
            tree_renderer,
            post,
            post_params: PostParams::default(),
            camera: None,
            classifier,
            last_poll: now,
            last_reading_seq: 0,
            last_gesture: Gesture::None,
            egui_ctx,
            egui_state,
            egui_renderer,
            dragging: false,
            last_cursor: None,
            start_time: now,
            fps: 60.0,
            last_fps_update: now,
            frames_since_update: 0,
        };

        if app.app_config.auto_connect_camera {
            app.connect_camera(0);
        }

        app
    }

    fn create_scene_targets(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::TextureView, wgpu::TextureView) {
        let hdr_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("HDR Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        (
            hdr_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
        )
    }

    /// Build the card texture array from the photos directory, falling back
    /// to generated placeholder cards
    fn build_card_textures(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layers: u32,
        photos_dir: Option<&Path>,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Card Texture Array"),
            size: wgpu::Extent3d {
                width: CARD_LAYER_WIDTH,
                height: CARD_LAYER_HEIGHT,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let photos = photos_dir.map(load_photos).unwrap_or_default();
        if let Some(dir) = photos_dir {
            log::info!("Loaded {} photos from {:?}", photos.len(), dir);
        }

        for layer in 0..layers {
            let pixels = photos
                .get(layer as usize)
                .cloned()
                .unwrap_or_else(|| placeholder_card(layer));

            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(CARD_LAYER_WIDTH * 4),
                    rows_per_image: Some(CARD_LAYER_HEIGHT),
                },
                wgpu::Extent3d {
                    width: CARD_LAYER_WIDTH,
                    height: CARD_LAYER_HEIGHT,
                    depth_or_array_layers: 1,
                },
            );
        }

        texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        })
    }

    /// Handle a window event, returning true if egui consumed it
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(&self.window, event);
        response.consumed
    }

    /// Resize the surface and every size-dependent target
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);

            let (hdr_view, depth_view) =
                Self::create_scene_targets(&self.device, new_size.width, new_size.height);
            self.hdr_view = hdr_view;
            self.depth_view = depth_view;
            self.post.resize(
                &self.device,
                &self.queue,
                new_size.width,
                new_size.height,
                &self.hdr_view,
            );
        }
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        if self.mode != mode {
            log::info!("Display mode: {}", mode.label());
            self.mode = mode;
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    /// Connect to a camera
    pub fn connect_camera(&mut self, camera_index: u32) {
        log::info!("Connecting to camera {}", camera_index);
        match CameraFeed::new(camera_index) {
            Ok(feed) => {
                self.camera = Some(feed);
            }
            Err(e) => {
                log::error!("Failed to connect camera: {}", e);
            }
        }
    }

    /// Disconnect the current camera
    pub fn disconnect_camera(&mut self) {
        if let Some(mut feed) = self.camera.take() {
            feed.stop();
        }
        log::info!("Camera disconnected");
    }

    pub fn camera_active(&self) -> bool {
        self.camera.as_ref().map(|c| c.is_active()).unwrap_or(false)
    }

    fn classifier_busy(&self) -> bool {
        self.classifier.as_ref().map(|c| c.is_busy()).unwrap_or(false)
    }

    /// Mouse button state from the event loop
    pub fn on_mouse_button(&mut self, pressed: bool) {
        if pressed && self.egui_ctx.wants_pointer_input() {
            return;
        }
        self.dragging = pressed;
        if !pressed {
            self.last_cursor = None;
        }
    }

    /// Cursor movement; drags rotate the orbit camera
    pub fn on_mouse_move(&mut self, x: f32, y: f32) {
        if self.dragging {
            if let Some((lx, ly)) = self.last_cursor {
                self.orbit.drag(x - lx, y - ly);
            }
            self.last_cursor = Some((x, y));
        }
    }

    /// Scroll zooms the orbit camera
    pub fn on_scroll(&mut self, lines: f32) {
        if self.egui_ctx.wants_pointer_input() {
            return;
        }
        self.orbit.zoom(lines);
    }

    /// Per-frame update: gesture polling, camera orbit, tree morph
    pub fn update(&mut self, delta: f32) {
        self.poll_gesture();

        // The camera drifts on its own while the tree is in chaos
        self.orbit.update(delta, self.mode == DisplayMode::Chaos);
        self.tree.update(delta, self.mode);
    }

    /// Submit a frame to the classifier at the poll cadence and fold the
    /// latest reading into the display mode
    fn poll_gesture(&mut self) {
        let Some(classifier) = &self.classifier else {
            return;
        };

        if classifier.is_ready() && self.last_poll.elapsed() >= self.app_config.poll_interval() {
            self.last_poll = Instant::now();

            if let Some(frame) = self.camera.as_ref().and_then(|c| c.latest_frame()) {
                let cc = &self.app_config.classifier;
                match frame.encode_jpeg(cc.frame_width, cc.frame_height, cc.jpeg_quality) {
                    Ok(jpeg) => {
                        if !classifier.submit(jpeg) {
                            log::trace!("Classifier busy, frame dropped");
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to encode classifier frame: {}", e);
                    }
                }
            }
        }

        let reading = classifier.latest();
        if reading.seq != self.last_reading_seq {
            self.last_reading_seq = reading.seq;
            self.last_gesture = reading.gesture;
            if let Some(mode) = mode_for_gesture(reading.gesture) {
                self.set_mode(mode);
            }
        }
    }

    /// Render a frame
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Upload per-frame data
        let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
        let time = self.start_time.elapsed().as_secs_f32();
        let globals = self.orbit.globals(aspect, time);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.tree_renderer.upload(&self.queue, &self.tree);
        self.post.write_params(&self.queue, &self.post_params);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.tree_renderer.render(
            &mut encoder,
            &self.hdr_view,
            &self.depth_view,
            &self.globals_bind_group,
        );
        self.post.render(&mut encoder, &view);

        self.render_ui(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.update_fps();
        Ok(())
    }

    fn render_ui(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let raw_input = self.egui_state.take_egui_input(&self.window);

        // Snapshot state before running egui
        let mode = self.mode;
        let fps = self.fps;
        let camera_active = self.camera_active();
        let camera_connected = self.camera.is_some();
        let camera_frames = self.camera.as_ref().map(|c| c.frame_count()).unwrap_or(0);
        let classifier_ready = self
            .classifier
            .as_ref()
            .map(|c| c.is_ready())
            .unwrap_or(false);
        let analyzing = self.classifier_busy();
        let last_gesture = self.last_gesture;
        let available_cameras = if camera_connected {
            Vec::new()
        } else {
            CameraFeed::list_cameras()
        };

        let mut bloom_intensity = self.post_params.intensity;
        let mut exposure = self.post_params.exposure;
        let mut auto_rotate_speed = self.orbit.auto_rotate_speed;

        // Collect actions, apply after the closure
        let mut toggle_mode = false;
        let mut connect_camera_index: Option<u32> = None;
        let mut disconnect_camera = false;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let (dot, status) = if camera_active {
                        if analyzing {
                            (egui::Color32::GOLD, "Analyzing...")
                        } else {
                            (egui::Color32::GREEN, "Camera active")
                        }
                    } else {
                        (egui::Color32::RED, "Camera inactive")
                    };
                    ui.colored_label(dot, "\u{25CF}");
                    ui.label(status);
                    ui.separator();

                    ui.label(format!("Mode: {}", mode.label()));
                    let action = match mode {
                        DisplayMode::Formed => "Unleash",
                        DisplayMode::Chaos => "Restore",
                    };
                    if ui.button(action).clicked() {
                        toggle_mode = true;
                    }
                    ui.separator();

                    ui.label(format!("FPS: {:.1}", fps));
                });
            });

            egui::SidePanel::left("controls")
                .default_width(220.0)
                .show(ctx, |ui| {
                    ui.heading("Camera");
                    ui.separator();
                    if camera_connected {
                        ui.label(if camera_active {
                            "Camera connected"
                        } else {
                            "Opening camera..."
                        });
                        ui.label(format!("Frames: {}", camera_frames));
                        if ui.button("Disconnect").clicked() {
                            disconnect_camera = true;
                        }
                    } else if available_cameras.is_empty() {
                        ui.label("No cameras found");
                    } else {
                        ui.label("Available cameras:");
                        for cam in &available_cameras {
                            if ui.button(format!("{}: {}", cam.index, cam.name)).clicked() {
                                connect_camera_index = Some(cam.index);
                            }
                        }
                    }

                    ui.separator();
                    ui.heading("Gesture");
                    ui.separator();
                    if classifier_ready {
                        ui.label("Open palm \u{2192} chaos");
                        ui.label("Closed fist \u{2192} formed");
                        let gesture = match last_gesture {
                            Gesture::OpenPalm => "open palm",
                            Gesture::ClosedFist => "closed fist",
                            Gesture::None => "none",
                        };
                        ui.label(format!("Last seen: {}", gesture));
                    } else {
                        ui.label("Classifier disabled");
                        ui.label("(set ARBORGLOW_API_KEY)");
                    }

                    ui.separator();
                    ui.heading("Look");
                    ui.separator();
                    ui.add(
                        egui::Slider::new(&mut bloom_intensity, 0.0..=3.0).text("Bloom"),
                    );
                    ui.add(egui::Slider::new(&mut exposure, 0.2..=4.0).text("Exposure"));
                    ui.add(
                        egui::Slider::new(&mut auto_rotate_speed, 0.0..=0.5).text("Drift"),
                    );
                });
        });

        // Apply UI actions
        if toggle_mode {
            self.toggle_mode();
        }
        if let Some(idx) = connect_camera_index {
            self.connect_camera(idx);
        }
        if disconnect_camera {
            self.disconnect_camera();
        }
        self.post_params.intensity = bloom_intensity;
        self.post_params.exposure = exposure;
        self.orbit.auto_rotate_speed = auto_rotate_speed;

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let render_pass_static: &mut wgpu::RenderPass<'static> =
                unsafe { std::mem::transmute(&mut render_pass) };

            self.egui_renderer
                .render(render_pass_static, &paint_jobs, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn update_fps(&mut self) {
        self.frames_since_update += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f64();
        if elapsed >= 1.0 {
            self.fps = self.frames_since_update as f64 / elapsed;
            self.frames_since_update = 0;
            self.last_fps_update = now;
        }
    }
}

/// Load up to the first 64 usable images from the photos directory
fn load_photos(dir: &Path) -> Vec<Vec<u8>> {
    let mut paths: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("jpg") | Some("jpeg") | Some("png")
                )
            })
            .collect(),
        Err(e) => {
            log::warn!("Failed to read photos dir {:?}: {}", dir, e);
            return Vec::new();
        }
    };
    paths.sort();

    paths
        .iter()
        .take(64)
        .filter_map(|path| match image::open(path) {
            Ok(img) => {
                let resized = img
                    .resize_to_fill(
                        CARD_LAYER_WIDTH,
                        CARD_LAYER_HEIGHT,
                        image::imageops::FilterType::Triangle,
                    )
                    .to_rgba8();
                Some(resized.into_raw())
            }
            Err(e) => {
                log::warn!("Skipping unreadable photo {:?}: {}", path, e);
                None
            }
        })
        .collect()
}

/// Generated stand-in card: warm paper tone with a framed inner gradient
fn placeholder_card(layer: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((CARD_LAYER_WIDTH * CARD_LAYER_HEIGHT * 4) as usize);
    let border = 24u32;
    // Slight tint shift per layer so the cards read as distinct
    let tint = 1.0 - (layer % 4) as f32 * 0.06;

    for y in 0..CARD_LAYER_HEIGHT {
        for x in 0..CARD_LAYER_WIDTH {
            let in_frame = x >= border
                && x < CARD_LAYER_WIDTH - border
                && y >= border
                && y < CARD_LAYER_HEIGHT - border * 3;
            let (r, g, b) = if in_frame {
                let t = y as f32 / CARD_LAYER_HEIGHT as f32;
                (
                    (40.0 + 120.0 * t) * tint,
                    (80.0 + 60.0 * t) * tint,
                    (60.0 + 40.0 * (1.0 - t)) * tint,
                )
            } else {
                // Paper margin
                (224.0 * tint, 191.0 * tint, 184.0 * tint)
            };
            pixels.push(r as u8);
            pixels.push(g as u8);
            pixels.push(b as u8);
            pixels.push(255);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_card_size() {
        let pixels = placeholder_card(0);
        assert_eq!(
            pixels.len(),
            (CARD_LAYER_WIDTH * CARD_LAYER_HEIGHT * 4) as usize
        );
    }

    #[test]
    fn test_placeholder_card_layers_differ() {
        let a = placeholder_card(0);
        let b = placeholder_card(1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_load_photos_missing_dir() {
        let photos = load_photos(Path::new("/definitely/not/a/dir"));
        assert!(photos.is_empty());
    }
}
