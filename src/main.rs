//! Snake Arena entry point
//!
//! Headless runner: reads commands from stdin, logs frames and sound cues.
//! Set `SNAKE_CONFIG` to a JSON file to override the defaults.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use snake_arena::audio::LogAudio;
use snake_arena::input::InputEvent;
use snake_arena::render::LogRenderer;
use snake_arena::{Config, Coordinator};

/// Environment variable naming the config file
const CONFIG_ENV: &str = "SNAKE_CONFIG";

fn load_config() -> Config {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => Config::load(&PathBuf::from(path)),
        None => {
            log::info!("{CONFIG_ENV} not set, using default config");
            Config::default()
        }
    }
}

/// Forward stdin characters as input events until EOF or quit
fn read_input(tx: Sender<InputEvent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        for event in line.chars().filter_map(InputEvent::from_char) {
            if tx.send(event).is_err() || event == InputEvent::Quit {
                return;
            }
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Snake Arena starting...");
    log::info!("Controls: wasd steer, j/l turn, p pause, x give up, q quit (press Enter)");

    let coordinator = Coordinator::new(load_config(), Arc::new(LogAudio));

    let (tx, rx) = mpsc::channel();
    // Detached: blocked on stdin at exit is fine
    if let Err(e) = thread::Builder::new().name("input".to_string()).spawn(move || read_input(tx)) {
        log::error!("Failed to start input thread: {e}");
        std::process::exit(1);
    }

    let mut renderer = LogRenderer::default();
    if let Err(e) = coordinator.run(&mut renderer, rx) {
        log::error!("Failed to start game loops: {e}");
        std::process::exit(1);
    }
    log::info!("Goodbye after {} frames", renderer.frames());
}
