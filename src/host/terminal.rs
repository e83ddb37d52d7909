//! Terminal host adapter.
//!
//! Translates crossterm events into [`RawInput`] and runs a reader thread
//! that feeds them into a [`HostHandle`]. Terminal cells play the role of
//! physical pixels.
//!
//! Most terminals only report key presses. Direction keys released on such a
//! terminal stay down until a release arrives, so panels that need held keys
//! should enable crossterm's keyboard enhancement flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton as TermButton,
    MouseEvent, MouseEventKind,
};
use tracing::{debug, warn};

use super::{HostHandle, RawInput, VirtualHost};
use crate::error::Result;
use crate::state::{Key, MouseButton};
use crate::types::ConsoleConfig;

/// How long the reader waits for an event before checking for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// =============================================================================
// HOST
// =============================================================================

impl VirtualHost {
    /// Host sized to the current terminal, one cell per physical pixel.
    pub fn for_terminal(config: ConsoleConfig) -> Result<Self> {
        let (cols, rows) = crossterm::terminal::size()?;
        Self::from_cells(config, cols, rows)
    }

    fn from_cells(config: ConsoleConfig, cols: u16, rows: u16) -> Result<Self> {
        Ok(Self::new(config, cols as i32, rows as i32)?)
    }
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// Translate one terminal event into raw console input.
pub fn translate(event: &Event) -> Vec<RawInput> {
    match event {
        Event::Key(key) => translate_key(key),
        Event::Mouse(mouse) => translate_mouse(mouse),
        Event::Paste(text) => text.chars().map(RawInput::Char).collect(),
        Event::Resize(cols, rows) => vec![RawInput::Resized {
            width: *cols as i32,
            height: *rows as i32,
        }],
        Event::FocusGained | Event::FocusLost => Vec::new(),
    }
}

fn translate_key(event: &KeyEvent) -> Vec<RawInput> {
    let mut out = Vec::new();

    let text = match event.kind {
        KeyEventKind::Release => None,
        KeyEventKind::Press | KeyEventKind::Repeat => key_text(event),
    };
    if let Some(c) = text {
        out.push(RawInput::Char(c));
    }

    // Held-key state ignores auto-repeat
    if let Some(key) = direction_key(event.code) {
        match event.kind {
            KeyEventKind::Press => out.push(RawInput::Key { key, down: true }),
            KeyEventKind::Release => out.push(RawInput::Key { key, down: false }),
            KeyEventKind::Repeat => {}
        }
    }

    out
}

/// Character a key produces in the console's text stream.
fn key_text(event: &KeyEvent) -> Option<char> {
    match event.code {
        KeyCode::Char(c) if !event.modifiers.contains(KeyModifiers::CONTROL) => Some(c),
        KeyCode::Enter => Some('\n'),
        KeyCode::Backspace => Some('\x08'),
        KeyCode::Delete => Some('\x7f'),
        KeyCode::Up => Some('\x11'),
        KeyCode::Left => Some('\x12'),
        KeyCode::Down => Some('\x13'),
        KeyCode::Right => Some('\x14'),
        _ => None,
    }
}

fn direction_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Key::Up),
            'a' => Some(Key::Left),
            's' => Some(Key::Down),
            'd' => Some(Key::Right),
            _ => None,
        },
        _ => None,
    }
}

fn translate_mouse(event: &MouseEvent) -> Vec<RawInput> {
    let moved = RawInput::PointerMoved {
        x: event.column as i32,
        y: event.row as i32,
    };

    match event.kind {
        MouseEventKind::Down(button) => vec![
            moved,
            RawInput::Key {
                key: Key::Button(button_of(button)),
                down: true,
            },
        ],
        MouseEventKind::Up(button) => vec![
            moved,
            RawInput::Key {
                key: Key::Button(button_of(button)),
                down: false,
            },
        ],
        MouseEventKind::Drag(_) | MouseEventKind::Moved => vec![moved],
        MouseEventKind::ScrollDown => vec![moved, RawInput::Wheel(1)],
        MouseEventKind::ScrollUp => vec![moved, RawInput::Wheel(-1)],
        MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => vec![moved],
    }
}

fn button_of(button: TermButton) -> MouseButton {
    match button {
        TermButton::Left => MouseButton::Left,
        TermButton::Middle => MouseButton::Middle,
        TermButton::Right => MouseButton::Right,
    }
}

// =============================================================================
// READER THREAD
// =============================================================================

/// Background thread reading terminal events into a host.
///
/// The thread polls with a short timeout so it notices [`stop`](Self::stop)
/// promptly. It exits on its own if the terminal stops delivering events.
pub struct TerminalReader {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl TerminalReader {
    /// Spawn the reader thread.
    pub fn spawn(host: HostHandle) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = thread::Builder::new()
            .name("luag-input".to_string())
            .spawn(move || {
                Self::read_loop(&running_clone, &host);
                running_clone.store(false, Ordering::SeqCst);
            })?;

        debug!("terminal reader started");
        Ok(Self {
            handle: Some(handle),
            running,
        })
    }

    fn read_loop(running: &AtomicBool, host: &HostHandle) {
        while running.load(Ordering::SeqCst) {
            let event = match event::poll(POLL_INTERVAL) {
                Ok(false) => continue,
                Ok(true) => event::read(),
                Err(err) => Err(err),
            };

            let event = match event {
                Ok(event) => event,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(%err, "terminal event read failed, stopping reader");
                    break;
                }
            };

            for input in translate(&event) {
                if let Err(err) = host.deliver(input) {
                    warn!(%err, "ignoring terminal resize");
                }
            }
        }
    }

    /// Stop the reader thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            debug!("terminal reader stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for TerminalReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// TESTS
// =============================================================================
