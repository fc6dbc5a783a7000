mod args;
mod timing;

use args::Args;
use gallery_previz::assets::FsImageFetcher;
use gallery_previz::gallery::PointerButton;
use gallery_previz::input::Modifiers;
use gallery_previz::persist::{ArtworkStore, JsonFileStore, MemoryStore, SaveOutcome};
use gallery_previz::scene::serialization::{load_gallery_from_file, GalleryDocument};
use gallery_previz::ui::NoticeLevel;
use gallery_previz::worker::Execution;
use gallery_previz::{Artwork, EditMode, Gallery, GalleryConfig, GalleryEvent};
use timing::FrameTiming;

use glam::Vec2;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const BASE_TITLE: &str = "Gallery Previz";

pub struct App {
    window: Option<Arc<Window>>,
    gallery: Option<Gallery>,
    title: String,
    initial_artworks: Vec<Artwork>,
    start_editing: bool,
    modifiers: ModifiersState,
    mouse_pos: Option<Vec2>,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(gallery: Gallery, document: GalleryDocument, start_editing: bool) -> Self {
        Self {
            window: None,
            gallery: Some(gallery),
            timing: FrameTiming::new(format!("{} - {}", BASE_TITLE, document.title)),
            title: document.title,
            initial_artworks: document.artworks,
            start_editing,
            modifiers: ModifiersState::default(),
            mouse_pos: None,
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn frame(&mut self) {
        let Some(gallery) = &mut self.gallery else {
            return;
        };
        gallery.tick();

        for event in gallery.take_events() {
            match event {
                GalleryEvent::AllArtworksAttempted(progress) => log::info!(
                    "{}: {} of {} artworks attempted, {} shown",
                    self.title,
                    progress.attempted,
                    progress.total,
                    gallery.assets().len()
                ),
                GalleryEvent::SelectionChanged(Some(id)) => {
                    if let Some(loaded) = gallery.assets().loaded(&id) {
                        log::info!(
                            "Selected {} \"{}\" ({}x{} image)",
                            id,
                            loaded.object.title,
                            loaded.texture.width,
                            loaded.texture.height
                        );
                    }
                }
                other => log::debug!("{:?}", other),
            }
        }
        for notice in gallery.take_notices() {
            match notice.level {
                NoticeLevel::Error => log::warn!("{}", notice),
                NoticeLevel::Info | NoticeLevel::Success => log::info!("{}", notice),
            }
        }

        let gallery = &*gallery;
        self.timing
            .update(self.window.as_deref(), Instant::now(), || status_line(gallery));
    }

    fn handle_command_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) -> bool {
        let Some(gallery) = &mut self.gallery else {
            return false;
        };
        match code {
            KeyCode::Escape => {
                event_loop.exit();
            }
            KeyCode::Tab => {
                let editing = gallery.edit_mode() == EditMode::Editing;
                gallery.set_edit_mode(!editing);
            }
            KeyCode::KeyS if self.modifiers.control_key() => {
                gallery.save_now();
            }
            KeyCode::Delete | KeyCode::Backspace => {
                if let Some(id) = gallery.selected().cloned() {
                    gallery.remove_artwork(&id);
                }
            }
            _ => return false,
        }
        true
    }

    fn shutdown(&mut self) {
        let Some(gallery) = self.gallery.take() else {
            return;
        };
        let outcomes = gallery.cleanup();
        let failed = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, SaveOutcome::Failed { .. }))
            .count();
        if failed > 0 {
            log::warn!("{} artworks could not be saved on exit", failed);
        }
    }
}

fn status_line(gallery: &Gallery) -> String {
    let position = gallery.camera().position();
    let mode = match gallery.edit_mode() {
        EditMode::Viewing => "viewing",
        EditMode::Editing => "editing",
    };
    let mut status = format!(
        "{} at ({:.1}, {:.1}, {:.1})",
        mode, position.x, position.y, position.z
    );
    if let Some(id) = gallery.selected() {
        status.push_str(&format!(" - selected {}", id));
    }
    if !gallery.dirty().is_empty() {
        status.push_str(&format!(" - {} unsaved", gallery.dirty().len()));
    }
    if let Some(notice) = gallery.latest_notice() {
        status.push_str(&format!(" - {}", notice));
    }
    status
}

fn modifiers_from(state: ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        alt: state.alt_key(),
        ctrl: state.control_key(),
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(BASE_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        if let Some(gallery) = &mut self.gallery {
            let size = window.inner_size();
            gallery.set_viewport(size.width, size.height);
            log::info!(
                "Gallery ready: {} surfaces, {} lights",
                gallery.room().surfaces().len(),
                gallery.lights().len()
            );
            gallery.load_artworks(&std::mem::take(&mut self.initial_artworks));
            gallery.set_edit_mode(self.start_editing);
        }
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    self.mouse_pos = None;
                    if let Some(gallery) = &mut self.gallery {
                        gallery.release_input();
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if self.handle_command_key(code, event_loop) {
                            return;
                        }
                    }
                }
                if let Some(gallery) = &mut self.gallery {
                    gallery.handle_key(event.physical_key, pressed);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                if let Some(gallery) = &mut self.gallery {
                    gallery.set_modifiers(modifiers_from(self.modifiers));
                }
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gallery) = &mut self.gallery {
                    gallery.set_viewport(new_size.width, new_size.height);
                }
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_pos = Some(position);
                if let Some(gallery) = &mut self.gallery {
                    gallery.pointer_moved(position);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pos = None;
                if let Some(gallery) = &mut self.gallery {
                    gallery.pointer_left();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    _ => return,
                };
                let Some(gallery) = &mut self.gallery else {
                    return;
                };
                match state {
                    ElementState::Pressed => {
                        if let Some(position) = self.mouse_pos {
                            gallery.pointer_pressed(button, position);
                        }
                    }
                    ElementState::Released => gallery.pointer_released(button),
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn build_gallery(args: &Args) -> Result<(Gallery, GalleryDocument), String> {
    let config = match &args.config {
        Some(path) => GalleryConfig::load(path).map_err(|err| err.to_string())?,
        None => GalleryConfig::default(),
    };

    let (document, store): (GalleryDocument, Box<dyn ArtworkStore>) = match &args.gallery {
        Some(path) => {
            let document = load_gallery_from_file(path).map_err(|err| err.to_string())?;
            let store = JsonFileStore::new(path, document.clone());
            (document, Box::new(store))
        }
        None => {
            log::warn!("No --gallery given, edits will not be written anywhere");
            (GalleryDocument::new("Untitled"), Box::new(MemoryStore::new()))
        }
    };

    let fetcher = FsImageFetcher::new(args.image_dir());
    let gallery = Gallery::new(&config, Box::new(fetcher), store, Execution::Threaded)
        .map_err(|err| err.to_string())?;
    Ok((gallery, document))
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized) = Args::parse(&argv);
    for arg in &unrecognized {
        log::warn!("Ignoring unrecognized argument {}", arg);
    }

    let (gallery, document) = match build_gallery(&args) {
        Ok(built) => built,
        Err(err) => {
            log::error!("Failed to open gallery: {}", err);
            std::process::exit(1);
        }
    };

    log::info!("{} - {} artworks", document.title, document.artworks.len());
    log::info!("   WASD/arrows walk, Q/E turn, R/F look, right-drag looks around");
    log::info!("   Tab toggles editing, Ctrl+S saves, Delete removes, Esc exits");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {}", err);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(gallery, document, args.edit);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", err);
    }
    app.shutdown();

    log::info!("Goodbye");
}
