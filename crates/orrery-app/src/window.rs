//! Window creation and event handling via winit.
//!
//! Provides [`AppState`] which implements winit's [`ApplicationHandler`]
//! trait, and [`run_with_config`] to start the event loop. The viewer renders
//! continuously: every `RedrawRequested` advances the simulation one step,
//! uploads uniforms, records the frame, and immediately requests the next
//! redraw.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use orrery_config::Config;
use orrery_input::{KeyboardState, MouseState};
use orrery_render::{
    Camera, DepthBuffer, FrameEncoder, RenderContext, RenderPassBuilder, SurfaceError,
    init_render_context_blocking,
};
use orrery_scene::SolarScene;
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::orbit::OrbitControls;

/// Seconds between periodic frame-rate log lines.
const FPS_LOG_INTERVAL_SECS: u64 = 5;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let mut attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    attrs
}

/// Application state that manages the window, GPU context, and scene.
pub struct AppState {
    /// The window handle, wrapped in `Arc` for sharing with the surface.
    window: Option<Arc<Window>>,
    /// GPU context owning device, queue, and surface.
    gpu: Option<RenderContext>,
    /// Depth attachment sized to the surface.
    depth: Option<DepthBuffer>,
    /// The assembled scene, created once the GPU is up.
    scene: Option<SolarScene>,
    camera: Camera,
    controls: OrbitControls,
    keyboard_state: KeyboardState,
    mouse_state: MouseState,
    config: Config,
    /// Directory screenshots are written into.
    screenshot_dir: PathBuf,
    /// Counter used to name screenshot files within a session.
    screenshot_serial: u32,
    frame_count: u64,
    fps_timer: Instant,
    fps_frames: u32,
}

impl AppState {
    /// Build the application state from a loaded configuration.
    ///
    /// No GPU or window resources are touched here; those come up in
    /// [`resumed`](ApplicationHandler::resumed).
    pub fn with_config(config: Config, screenshot_dir: PathBuf) -> Self {
        let start_position = Vec3::from_array(config.camera.position);
        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;

        let mut camera = Camera::perspective(
            start_position,
            config.camera.fov_y_degrees.to_radians(),
            aspect,
            config.camera.near_plane,
            config.camera.far_plane,
        );
        camera.look_at(Vec3::ZERO, Vec3::Y);

        // Dolly limits: stay outside the nearest body, inside the backdrop.
        let controls = OrbitControls::from_camera_position(start_position).with_radius_limits(
            config.camera.near_plane * 4.0,
            config.scene.backdrop.radius * 0.9,
        );

        Self {
            window: None,
            gpu: None,
            depth: None,
            scene: None,
            camera,
            controls,
            keyboard_state: KeyboardState::new(),
            mouse_state: MouseState::new(),
            config,
            screenshot_dir,
            screenshot_serial: 0,
            frame_count: 0,
            fps_timer: Instant::now(),
            fps_frames: 0,
        }
    }

    /// Propagate a new surface size to the GPU, depth buffer, and camera.
    fn apply_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.camera.set_aspect_ratio(width as f32, height as f32);

        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
        }
        if let (Some(depth), Some(gpu)) = (&mut self.depth, &self.gpu) {
            depth.resize(&gpu.device, width, height);
        }

        info!("Window resized to {width}x{height}");
    }

    /// Run one frame: input, simulation step, uniform upload, draws, and
    /// the optional screenshot readback.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self
            .keyboard_state
            .just_pressed(PhysicalKey::Code(KeyCode::Escape))
        {
            info!("Escape pressed, shutting down");
            event_loop.exit();
            return;
        }

        self.controls.handle_input(&self.mouse_state);
        self.controls.update_camera(&mut self.camera);

        if let Some(scene) = &mut self.scene {
            scene.advance();
        }

        let want_screenshot = self
            .keyboard_state
            .just_pressed(PhysicalKey::Code(KeyCode::F12));
        let mut screenshot_png: Option<Vec<u8>> = None;

        if let (Some(gpu), Some(depth), Some(scene)) = (&self.gpu, &self.depth, &self.scene) {
            match gpu.get_current_texture() {
                Ok(surface_texture) => {
                    scene.upload(&gpu.queue, &self.camera);

                    let mut frame_encoder =
                        FrameEncoder::new(&gpu.device, Arc::new(gpu.queue.clone()), surface_texture);
                    {
                        let builder = RenderPassBuilder::new()
                            .label("scene-pass")
                            .depth(depth.view.clone(), DepthBuffer::CLEAR_VALUE);
                        let mut render_pass = frame_encoder.begin_render_pass(&builder);
                        scene.render(&mut render_pass);
                    }

                    let screenshot_readback = if want_screenshot {
                        frame_encoder.copy_surface_to_buffer(&gpu.device)
                    } else {
                        None
                    };

                    frame_encoder.submit();

                    // After submit, map the readback buffer and encode as PNG.
                    if let Some((readback_buffer, width, height, padded_row)) = screenshot_readback
                    {
                        screenshot_png = readback_to_png(
                            &gpu.device,
                            gpu.surface_format,
                            &readback_buffer,
                            width,
                            height,
                            padded_row,
                        );
                        if screenshot_png.is_none() {
                            warn!("Screenshot readback failed");
                        }
                    }
                }
                Err(SurfaceError::Lost) => {
                    if let Some(gpu) = &mut self.gpu {
                        let (width, height) =
                            (gpu.surface_config.width, gpu.surface_config.height);
                        gpu.resize(width, height);
                    }
                }
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(SurfaceError::Timeout) => {
                    warn!("Surface timeout, skipping frame");
                }
            }
        }

        if let Some(png_bytes) = screenshot_png {
            self.save_screenshot(&png_bytes);
        }

        self.frame_count += 1;
        self.fps_frames += 1;
        if self.fps_timer.elapsed().as_secs() >= FPS_LOG_INTERVAL_SECS {
            let fps = self.fps_frames as f64 / self.fps_timer.elapsed().as_secs_f64();
            let body_count = self.scene.as_ref().map_or(0, |s| s.body_count());
            info!("{fps:.1} fps, {body_count} bodies, frame {}", self.frame_count);
            self.fps_timer = Instant::now();
            self.fps_frames = 0;
        }

        // Clear per-frame transient input state after all systems have run.
        self.keyboard_state.clear_transients();
        self.mouse_state.clear_transients();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn save_screenshot(&mut self, png_bytes: &[u8]) {
        if let Err(e) = std::fs::create_dir_all(&self.screenshot_dir) {
            warn!(
                "Could not create screenshot directory {}: {e}",
                self.screenshot_dir.display()
            );
            return;
        }

        self.screenshot_serial += 1;
        let path = self
            .screenshot_dir
            .join(format!("orrery-{:03}.png", self.screenshot_serial));
        match std::fs::write(&path, png_bytes) {
            Ok(()) => info!("Screenshot saved to {}", path.display()),
            Err(e) => warn!("Could not write screenshot {}: {e}", path.display()),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let attrs = window_attributes_from_config(&self.config);
            let window = match event_loop.create_window(attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    error!("Failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

            match init_render_context_blocking(window.clone(), self.config.window.vsync) {
                Ok(gpu) => {
                    let depth = DepthBuffer::new(
                        &gpu.device,
                        gpu.surface_config.width,
                        gpu.surface_config.height,
                    );
                    self.camera.set_aspect_ratio(
                        gpu.surface_config.width as f32,
                        gpu.surface_config.height as f32,
                    );

                    match SolarScene::new(&gpu.device, &gpu.queue, gpu.surface_format, &self.config.scene)
                    {
                        Ok(scene) => {
                            info!(
                                "Scene ready: {} bodies at {}x{}",
                                scene.body_count(),
                                gpu.surface_config.width,
                                gpu.surface_config.height
                            );
                            self.scene = Some(scene);
                        }
                        Err(e) => {
                            error!("Scene assembly failed: {e}");
                            event_loop.exit();
                            return;
                        }
                    }

                    self.depth = Some(depth);
                    self.gpu = Some(gpu);
                }
                Err(e) => {
                    error!("GPU initialization failed: {e}");
                    event_loop.exit();
                    return;
                }
            }

            window.request_redraw();
            self.window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.apply_resize(new_size.width, new_size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(window) = &self.window {
                    let new_inner = window.inner_size();
                    info!("Scale factor changed to {scale_factor:.2}");
                    self.apply_resize(new_inner.width, new_inner.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.keyboard_state.process_event(&event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_state.on_cursor_moved(position.x, position.y);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_state.on_button(button, state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse_state.on_scroll(delta);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }
}

/// Map a surface readback buffer and encode it as an RGBA PNG.
///
/// Swizzles BGRA surfaces to RGBA and strips the row padding the copy
/// alignment required.
fn readback_to_png(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    buffer: &wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
) -> Option<Vec<u8>> {
    let bytes_per_pixel = 4u32;
    let buffer_slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });

    match rx.recv() {
        Ok(Ok(())) => {}
        _ => return None,
    }

    let mapped = buffer_slice.get_mapped_range();
    let is_bgra = matches!(
        surface_format,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
    );
    let mut pixels = Vec::with_capacity((width * height * bytes_per_pixel) as usize);
    for row in 0..height {
        let start = (row * padded_bytes_per_row) as usize;
        let end = start + (width * bytes_per_pixel) as usize;
        let row_data = &mapped[start..end];
        if is_bgra {
            for chunk in row_data.chunks_exact(4) {
                pixels.push(chunk[2]); // R
                pixels.push(chunk[1]); // G
                pixels.push(chunk[0]); // B
                pixels.push(chunk[3]); // A
            }
        } else {
            pixels.extend_from_slice(row_data);
        }
    }
    drop(mapped);

    let mut png_buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(std::io::Cursor::new(&mut png_buf), width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().ok()?;
        writer.write_image_data(&pixels).ok()?;
    }
    Some(png_buf)
}

/// Creates an event loop and runs the viewer with the given config.
///
/// This function blocks until the window is closed.
#[instrument(skip_all)]
pub fn run_with_config(config: Config, screenshot_dir: PathBuf) {
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    let mut app = AppState::with_config(config, screenshot_dir);
    event_loop.run_app(&mut app).expect("Event loop failed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        AppState::with_config(Config::default(), PathBuf::from("/tmp/orrery-test-shots"))
    }

    #[test]
    fn test_app_state_starts_without_resources() {
        let state = test_state();
        assert!(state.window.is_none());
        assert!(state.gpu.is_none());
        assert!(state.scene.is_none());
    }

    #[test]
    fn test_initial_camera_matches_config() {
        let state = test_state();
        assert!(
            (state.camera.position - Vec3::new(0.0, 0.0, 500.0)).length() < 1e-3,
            "camera should start at the configured position, got {}",
            state.camera.position
        );
        assert!((state.camera.fov_y - 60.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_controls_start_at_camera_radius() {
        let state = test_state();
        assert!((state.controls.radius() - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_updates_camera_aspect() {
        let mut state = test_state();
        state.apply_resize(1920, 1080);
        assert!((state.camera.aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_resize_is_ignored() {
        let mut state = test_state();
        let before = state.camera.aspect_ratio;
        state.apply_resize(0, 1080);
        assert!((state.camera.aspect_ratio - before).abs() < f32::EPSILON);
    }

    #[test]
    fn test_window_attributes_from_config_does_not_panic() {
        let _attrs = window_attributes_from_config(&Config::default());
        // WindowAttributes doesn't expose getters, so we verify it builds.
    }

    #[test]
    fn test_fullscreen_config_builds_attributes() {
        let mut config = Config::default();
        config.window.fullscreen = true;
        let _attrs = window_attributes_from_config(&config);
    }
}
