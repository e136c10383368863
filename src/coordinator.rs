//! Loop coordination
//!
//! Three loops share one `GameWorld`:
//! - render/event loop on the calling thread (FPS-paced redraw, input drain)
//! - physics loop (collision pass)
//! - logic loop (world ticks, reset after a loss)
//!
//! No loop ever blocks on another. They poll `Signals` once per iteration.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::AudioSink;
use crate::config::Config;
use crate::consts::LOOP_POLL_MS;
use crate::input::{Context, Dispatcher, InputEvent, InputMode};
use crate::render::{Frame, Renderer};
use crate::sim::clock::{Clock, Timer};
use crate::sim::registry::ObjectRegistry;
use crate::sim::world::{GamePhase, GameWorld};

/// Render loop poll interval (ms); short enough to keep input responsive
const RENDER_POLL_MS: u64 = 1;

/// Cooperative flags observed by every loop
#[derive(Debug, Default)]
pub struct Signals {
    quit: AtomicBool,
    lost: AtomicBool,
    paused: AtomicBool,
}

impl Signals {
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn signal_loss(&self) {
        self.lost.store(true, Ordering::SeqCst);
    }

    /// Consume a pending loss signal
    pub fn take_loss(&self) -> bool {
        self.lost.swap(false, Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

pub struct Coordinator {
    world: Arc<GameWorld>,
    signals: Arc<Signals>,
    dispatcher: Dispatcher,
    fps: u32,
}

impl Coordinator {
    /// Coordinator over a fresh world driven by the system clock
    pub fn new(config: Config, audio: Arc<dyn AudioSink>) -> Self {
        Self::with_clock(config, Clock::system(), audio)
    }

    pub fn with_clock(config: Config, clock: Clock, audio: Arc<dyn AudioSink>) -> Self {
        let fps = config.fps.max(1);
        let world = GameWorld::new(Arc::new(config), clock, Arc::new(ObjectRegistry::new()), audio);
        Self {
            world: Arc::new(world),
            signals: Arc::new(Signals::default()),
            dispatcher: Dispatcher::new(),
            fps,
        }
    }

    pub fn world(&self) -> &Arc<GameWorld> {
        &self.world
    }

    pub fn signals(&self) -> &Arc<Signals> {
        &self.signals
    }

    pub fn input_mode(&self) -> InputMode {
        self.dispatcher.mode()
    }

    /// Route one input event through the active handler set
    pub fn dispatch(&self, event: InputEvent) {
        let ctx = Context {
            world: &self.world,
            signals: &self.signals,
        };
        self.dispatcher.dispatch(&ctx, event);
    }

    /// Run all loops until quit. Returns once the physics and logic loops have joined.
    pub fn run<R: Renderer>(&self, renderer: &mut R, events: Receiver<InputEvent>) -> io::Result<()> {
        let physics = spawn_loop("physics", &self.world, &self.signals, physics_loop)?;
        let logic = match spawn_loop("logic", &self.world, &self.signals, logic_loop) {
            Ok(handle) => handle,
            Err(e) => {
                self.signals.request_quit();
                join_loop("physics", physics);
                return Err(e);
            }
        };
        log::info!("Loops started at {} FPS", self.fps);

        self.render_loop(renderer, &events);

        join_loop("physics", physics);
        join_loop("logic", logic);
        log::info!("All loops stopped");
        Ok(())
    }

    fn render_loop<R: Renderer>(&self, renderer: &mut R, events: &Receiver<InputEvent>) {
        // Redraws keep going while the game clock is paused
        let mut frame_timer = Timer::new(&Clock::system());
        let frame_ms = 1000 / u64::from(self.fps);

        while !self.signals.should_quit() {
            if frame_timer.reset_if_has_elapsed(frame_ms) {
                renderer.draw(&Frame::capture(&self.world, self.signals.is_paused()));
            }

            loop {
                match events.try_recv() {
                    Ok(event) => self.dispatch(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::info!("Input closed, quitting");
                        self.signals.request_quit();
                        break;
                    }
                }
            }

            thread::sleep(Duration::from_millis(RENDER_POLL_MS));
        }
    }
}

fn spawn_loop(
    name: &str,
    world: &Arc<GameWorld>,
    signals: &Arc<Signals>,
    body: fn(&GameWorld, &Signals),
) -> io::Result<JoinHandle<()>> {
    let world = Arc::clone(world);
    let signals = Arc::clone(signals);
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || body(&world, &signals))
}

fn join_loop(name: &str, handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("{name} loop panicked");
    }
}

fn physics_loop(world: &GameWorld, signals: &Signals) {
    while !signals.should_quit() {
        world.resolve_collisions();
        thread::sleep(Duration::from_millis(LOOP_POLL_MS));
    }
    log::debug!("Physics loop stopped");
}

fn logic_loop(world: &GameWorld, signals: &Signals) {
    while !signals.should_quit() {
        if signals.take_loss() || world.phase() == GamePhase::Lost {
            log::info!("Run over with score {}", world.score());
            world.reset();
        } else {
            world.update();
        }
        thread::sleep(Duration::from_millis(LOOP_POLL_MS));
    }
    log::debug!("Logic loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentAudio;
    use crate::input::Key;
    use std::sync::mpsc;
    use std::time::Instant;

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        saw_paused: bool,
    }

    impl Renderer for CountingRenderer {
        fn draw(&mut self, frame: &Frame) {
            self.frames += 1;
            self.saw_paused |= frame.paused;
        }
    }

    #[test]
    fn test_signals() {
        let signals = Signals::default();
        assert!(!signals.take_loss());
        signals.signal_loss();
        assert!(signals.take_loss());
        assert!(!signals.take_loss());
        signals.request_quit();
        assert!(signals.should_quit());
    }

    #[test]
    fn test_quit_event_stops_all_loops() {
        let coordinator = Coordinator::new(Config::default(), Arc::new(SilentAudio));
        let (tx, rx) = mpsc::channel();
        let mut renderer = CountingRenderer::default();

        let sender = thread::spawn(move || {
            tx.send(InputEvent::Key(Key::Down)).unwrap();
            thread::sleep(Duration::from_millis(60));
            tx.send(InputEvent::Quit).unwrap();
            // Keep the channel open so only the Quit event ends the run
            thread::sleep(Duration::from_millis(200));
        });

        let started = Instant::now();
        coordinator.run(&mut renderer, rx).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(coordinator.signals().should_quit());
        assert!(renderer.frames > 0);
        sender.join().unwrap();
    }

    #[test]
    fn test_closed_input_quits() {
        let coordinator = Coordinator::new(Config::default(), Arc::new(SilentAudio));
        let (tx, rx) = mpsc::channel::<InputEvent>();
        drop(tx);
        let mut renderer = CountingRenderer::default();
        coordinator.run(&mut renderer, rx).unwrap();
        assert!(coordinator.signals().should_quit());
    }

    #[test]
    fn test_pause_is_visible_to_renderer() {
        let coordinator = Coordinator::new(Config::default(), Arc::new(SilentAudio));
        let (tx, rx) = mpsc::channel();
        let mut renderer = CountingRenderer::default();

        let sender = thread::spawn(move || {
            tx.send(InputEvent::Pause).unwrap();
            thread::sleep(Duration::from_millis(100));
            tx.send(InputEvent::Quit).unwrap();
            thread::sleep(Duration::from_millis(100));
        });

        coordinator.run(&mut renderer, rx).unwrap();
        sender.join().unwrap();
        assert!(renderer.saw_paused);
        assert_eq!(coordinator.input_mode(), InputMode::Paused);
        assert!(coordinator.world().clock().is_paused());
    }

    #[test]
    fn test_loss_signal_resets_world() {
        let clock = Clock::manual();
        let coordinator = Coordinator::with_clock(Config::default(), clock.clone(), Arc::new(SilentAudio));
        let (tx, rx) = mpsc::channel();
        let mut renderer = CountingRenderer::default();
        let world = Arc::clone(coordinator.world());

        let sender = thread::spawn(move || {
            // Move a few cells, then give up
            for _ in 0..3 {
                clock.advance(125);
                thread::sleep(Duration::from_millis(20));
            }
            tx.send(InputEvent::Loss).unwrap();
            thread::sleep(Duration::from_millis(60));
            tx.send(InputEvent::Quit).unwrap();
            thread::sleep(Duration::from_millis(100));
        });

        coordinator.run(&mut renderer, rx).unwrap();
        sender.join().unwrap();
        // Back at the starting cell after the reset
        assert_eq!(world.snake_segments()[0].position, world.config().screen.center());
        assert_eq!(world.phase(), GamePhase::Playing);
    }
}
