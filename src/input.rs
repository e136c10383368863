//! Input handler state machine
//!
//! Two handler sets, Running and Paused, each mapping the five input events
//! to a handler. The active set sits behind its own mutex; `dispatch` holds
//! it for the whole event, so a pause transition can never interleave with
//! another event being handled.

use std::sync::{Mutex, MutexGuard};

use crate::coordinator::Signals;
use crate::sim::world::GameWorld;

/// Keyboard codes delivered by the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Discrete input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    /// Give up the current run
    Loss,
    /// Toggle pause
    Pause,
    Key(Key),
    Mouse(MouseButton),
}

impl InputEvent {
    /// Console binding: wasd steer, j/l turn, p pause, x give up, q quit
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(InputEvent::Quit),
            'x' => Some(InputEvent::Loss),
            'p' => Some(InputEvent::Pause),
            'j' => Some(InputEvent::Mouse(MouseButton::Left)),
            'l' => Some(InputEvent::Mouse(MouseButton::Right)),
            c @ ('w' | 'a' | 's' | 'd') => Some(InputEvent::Key(Key::Char(c))),
            _ => None,
        }
    }
}

/// Which handler set is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Running,
    Paused,
}

/// Everything a handler may touch
pub struct Context<'a> {
    pub world: &'a GameWorld,
    pub signals: &'a Signals,
}

/// One callback per event kind. `pause` returns the set to switch to.
pub struct HandlerSet {
    pub mode: InputMode,
    quit: fn(&Context),
    loss: fn(&Context),
    pause: fn(&Context) -> &'static HandlerSet,
    key: fn(&Context, Key),
    mouse: fn(&Context, MouseButton),
}

pub static RUNNING: HandlerSet = HandlerSet {
    mode: InputMode::Running,
    quit,
    loss,
    pause,
    key: steer,
    mouse: turn,
};

pub static PAUSED: HandlerSet = HandlerSet {
    mode: InputMode::Paused,
    quit,
    loss,
    pause: unpause,
    key: ignore_key,
    mouse: ignore_mouse,
};

fn quit(ctx: &Context) {
    ctx.signals.request_quit();
}

fn loss(ctx: &Context) {
    ctx.signals.signal_loss();
}

fn steer(ctx: &Context, key: Key) {
    ctx.world.key_notify(key);
}

fn turn(ctx: &Context, button: MouseButton) {
    ctx.world.mouse_notify(button);
}

fn ignore_key(_: &Context, _: Key) {}

fn ignore_mouse(_: &Context, _: MouseButton) {}

fn pause(ctx: &Context) -> &'static HandlerSet {
    ctx.world.clock().pause();
    ctx.signals.set_paused(true);
    &PAUSED
}

fn unpause(ctx: &Context) -> &'static HandlerSet {
    ctx.world.clock().unpause();
    ctx.signals.set_paused(false);
    &RUNNING
}

/// Routes events to the active handler set
pub struct Dispatcher {
    active: Mutex<&'static HandlerSet>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(&RUNNING),
        }
    }

    fn active(&self) -> MutexGuard<'_, &'static HandlerSet> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn mode(&self) -> InputMode {
        self.active().mode
    }

    pub fn dispatch(&self, ctx: &Context, event: InputEvent) {
        let mut active = self.active();
        match event {
            InputEvent::Quit => (active.quit)(ctx),
            InputEvent::Loss => (active.loss)(ctx),
            InputEvent::Pause => {
                let next = (active.pause)(ctx);
                log::info!("Input {:?} -> {:?}", active.mode, next.mode);
                *active = next;
            }
            InputEvent::Key(key) => (active.key)(ctx, key),
            InputEvent::Mouse(button) => (active.mouse)(ctx, button),
        }
    }
}
