use abcview_runtime::{Graphics, RcWindow, ViewerSettings, create_graphics};
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

const FPS: u64 = 60;
const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / FPS);

pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

enum State {
    Ready(Graphics),
    Init(Option<EventLoopProxy<Graphics>>),
}

pub struct App {
    state: State,
    render_target: Instant,
    window: WindowOptions,
    settings: ViewerSettings,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(
        event_loop: &EventLoop<Graphics>,
        window: WindowOptions,
        settings: ViewerSettings,
    ) -> Self {
        Self {
            state: State::Init(Some(event_loop.create_proxy())),
            render_target: Instant::now(),
            window,
            settings,
            failure: None,
        }
    }

    /// The error that stopped the viewer during start-up, if any.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(
        &self,
        event_loop: &ActiveEventLoop,
        proxy: EventLoopProxy<Graphics>,
    ) -> anyhow::Result<()> {
        let win_attr = Window::default_attributes()
            .with_title(self.window.title.clone())
            .with_inner_size(LogicalSize::new(self.window.width, self.window.height));

        let window: RcWindow = std::sync::Arc::new(event_loop.create_window(win_attr)?);
        pollster::block_on(create_graphics(window, proxy, self.settings.clone()))
    }
}

impl ApplicationHandler<Graphics> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let proxy = match &mut self.state {
            State::Init(proxy) => proxy.take(),
            State::Ready(_) => None,
        };
        if let Some(proxy) = proxy {
            if let Err(e) = self.start(event_loop, proxy) {
                log::error!("failed to start viewer: {e:#}");
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, graphics: Graphics) {
        graphics.request_redraw();
        self.state = State::Ready(graphics);
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {
        if self.render_target <= Instant::now() {
            self.render_target += FRAME_TIME;
            if let State::Ready(gfx) = &self.state {
                gfx.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => {
                if let State::Ready(gfx) = &mut self.state {
                    gfx.resize(size);
                }
            }
            WindowEvent::RedrawRequested => {
                if let State::Ready(gfx) = &mut self.state {
                    gfx.draw();
                }
                let now = Instant::now();
                if self.render_target <= now {
                    self.render_target = now + FRAME_TIME;
                    if let State::Ready(gfx) = &self.state {
                        gfx.request_redraw();
                    }
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.render_target));
    }
}
