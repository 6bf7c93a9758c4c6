//! Flow control and application event loop.
//!
//! - [`GraphicsFlow`] is the trait the event loop drives: init, per-frame update,
//!   custom events and the lines to render
//! - [`Simulation`] is the viewer's flow: the physics world, the debug draw bridge
//!   and, once a model arrived, its scene graph and collision body
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and GPU context, calls `on_init` and starts
//!    loading the model
//! 2. the finished load reaches the flow as `FlowEvent::ModelLoaded`
//! 3. every `RedrawRequested` calls `on_update`, uploads what `on_render` returns
//!    and presents a frame, then asks for the next redraw

use std::{fmt::Debug, sync::Arc, time::Duration};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::Config,
    context::Context,
    debug_draw::{DebugDrawBridge, LineSegments},
    data_structures::scene_graph::SceneNode,
    physics::{BodyHandle, PhysicsWorld, body::build_collision_body},
    render::{DebugLinesGpu, render_frame},
    resources::load_model_gltf,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Events handed to a flow from outside the frame loop.
pub enum FlowEvent {
    ModelLoaded(anyhow::Result<Box<dyn SceneNode>>),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelLoaded(Ok(root)) => f
                .debug_tuple("ModelLoaded")
                .field(&root.get_name())
                .finish(),
            Self::ModelLoaded(Err(e)) => f.debug_tuple("ModelLoaded").field(e).finish(),
        }
    }
}

/// A self-contained part of the application driven by the event loop.
///
/// 1. `on_init()` is called once the GPU context exists
/// 2. `on_custom_events()` receives events such as a finished model load
/// 3. `on_update()` is called every frame
/// 4. `on_render()` hands over the lines to draw this frame
pub trait GraphicsFlow {
    /// Initialize the flow and configure the context.
    ///
    /// This is the only place to modify the Context, e.g. the background colour.
    fn on_init(&mut self, ctx: &mut Context);

    /// Update state every frame with the elapsed time `dt`.
    fn on_update(&mut self, dt: Duration);

    /// Handle custom application events.
    fn on_custom_events(&mut self, event: FlowEvent);

    /// Line segments to upload and draw for this frame.
    fn on_render(&mut self) -> &mut LineSegments;
}

impl Debug for dyn GraphicsFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Physics state of the viewer, independent of any window or GPU.
pub struct Simulation {
    config: Config,
    pub world: PhysicsWorld,
    pub debug: DebugDrawBridge,
    scene: Option<Box<dyn SceneNode>>,
    body: Option<BodyHandle>,
}

impl Simulation {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            world: PhysicsWorld::new(&config.physics),
            debug: DebugDrawBridge::new(config.debug.buffer_size, config.debug.mode),
            scene: None,
            body: None,
        }
    }

    /**
     * Continuation of a model load.
     *
     * A successful load gets its collision body built and registered; a failed one is
     * logged and the simulation keeps running without a body. Only the first model is
     * accepted, later ones are ignored with a warning.
     */
    pub fn on_model_loaded(&mut self, result: anyhow::Result<Box<dyn SceneNode>>) {
        let mut root = match result {
            Ok(root) => root,
            Err(e) => {
                log::error!("could not load {}: {:#}", self.config.model_path, e);
                return;
            }
        };
        if self.body.is_some() {
            log::warn!(
                "a collision body already exists, ignoring model {}",
                root.get_name()
            );
            return;
        }
        let body = build_collision_body(root.as_mut(), &self.config.filter);
        self.body = Some(self.world.add_rigid_body(body));
        self.scene = Some(root);
    }

    /// One frame: a physics step followed by a debug line refresh. Returns the sub-steps taken.
    pub fn tick(&mut self) -> u32 {
        let physics = &self.config.physics;
        let steps = self
            .world
            .step_simulation(physics.time_step, physics.max_sub_steps);
        self.debug.update(&self.world);
        steps
    }

    pub fn scene(&self) -> Option<&dyn SceneNode> {
        self.scene.as_deref()
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }
}

impl GraphicsFlow for Simulation {
    fn on_init(&mut self, ctx: &mut Context) {
        ctx.clear_colour = self.config.clear_colour;
        log::info!("viewer ready, loading {}", self.config.model_path);
    }

    fn on_update(&mut self, dt: Duration) {
        let steps = self.tick();
        log::trace!("frame after {:?}, {} physics steps", dt, steps);
    }

    fn on_custom_events(&mut self, event: FlowEvent) {
        match event {
            FlowEvent::ModelLoaded(result) => self.on_model_loaded(result),
        }
    }

    fn on_render(&mut self) -> &mut LineSegments {
        &mut self.debug.lines
    }
}

/// Everything that only exists once a window is there.
struct Viewport {
    ctx: Context,
    lines: DebugLinesGpu,
    is_surface_configured: bool,
}

impl Viewport {
    async fn new(window: Arc<Window>, config: &Config) -> Self {
        let ctx = match Context::new(window, config).await {
            Ok(ctx) => ctx,
            Err(e) => panic!(
                "App initialization failed. Cannot create the main context: {}",
                e
            ),
        };
        let lines = DebugLinesGpu::new(&ctx.device, config.debug.buffer_size);
        Self {
            ctx,
            lines,
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn render(&mut self, lines: &mut LineSegments) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        self.lines.upload(&self.ctx.queue, lines);
        if !self.is_surface_configured {
            return Ok(());
        }
        render_frame(&self.ctx, &self.lines)
    }
}

enum AppEvent {
    #[allow(dead_code)]
    Initialized(Viewport),
    Flow(FlowEvent),
}

impl Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Flow(event) => event.fmt(f),
        }
    }
}

struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    config: Config,
    flow: Box<dyn GraphicsFlow>,
    viewport: Option<Viewport>,
    last_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<AppEvent>,
        config: Config,
        flow: Box<dyn GraphicsFlow>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            flow,
            config,
            viewport: None,
            last_time: Instant::now(),
        })
    }

    fn load_model(&self) {
        let proxy = self.proxy.clone();
        let path = self.config.model_path.clone();
        let fut = async move {
            let result = load_model_gltf(&path).await;
            let event = AppEvent::Flow(FlowEvent::ModelLoaded(result));
            if proxy.send_event(event).is_err() {
                log::warn!("event loop closed before {} finished loading", path);
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(fut);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(fut);
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("flow-collide");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut viewport = self
                .async_runtime
                .block_on(Viewport::new(window, &self.config));
            let size = viewport.ctx.window.inner_size();
            viewport.resize(size.width, size.height);
            self.flow.on_init(&mut viewport.ctx);
            self.viewport = Some(viewport);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let viewport = Viewport::new(window, &config).await;
                assert!(proxy.send_event(AppEvent::Initialized(viewport)).is_ok());
            });
        }

        self.load_model();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        log::debug!("{:?}", event);
        match event {
            AppEvent::Initialized(mut viewport) => {
                // This is the message from our wasm `spawn_local`
                let size = viewport.ctx.window.inner_size();
                viewport.resize(size.width, size.height);
                self.flow.on_init(&mut viewport.ctx);
                viewport.ctx.window.request_redraw();
                self.viewport = Some(viewport);
            }
            AppEvent::Flow(event) => self.flow.on_custom_events(event),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let viewport = match &mut self.viewport {
            Some(viewport) => viewport,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => viewport.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.flow.on_update(dt);

                match viewport.render(self.flow.on_render()) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = viewport.ctx.window.inner_size();
                        viewport.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/**
 * Opens the viewer window and runs until it is closed.
 *
 * Initializes logging (`env_logger` natively, the browser console on the web), then
 * hands `config` to the event loop.
 */
pub fn run(config: Config) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let flow = Box::new(Simulation::new(&config));
    let mut app = App::new(&event_loop, config, flow)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
