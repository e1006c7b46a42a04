//! Terminal key source backed by crossterm

use super::binding::{KeyEvent, KeyPhase, Modifiers};
use super::dispatcher::KeyEventBus;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Translate a crossterm key event. Returns `None` for keys with no name.
pub fn translate(key: &event::KeyEvent) -> Option<KeyEvent> {
    let name = match key.code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Esc => "escape".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab | KeyCode::BackTab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Up => "arrowup".to_string(),
        KeyCode::Down => "arrowdown".to_string(),
        KeyCode::Left => "arrowleft".to_string(),
        KeyCode::Right => "arrowright".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => return None,
    };

    let modifiers = Modifiers {
        meta: key.modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        shift: key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab,
        alt: key.modifiers.contains(KeyModifiers::ALT),
    };

    let phase = match key.kind {
        KeyEventKind::Release => KeyPhase::Up,
        KeyEventKind::Press | KeyEventKind::Repeat => KeyPhase::Down,
    };

    Some(KeyEvent {
        key: name,
        modifiers,
        phase,
    })
}

/// Read terminal keys in raw mode and emit them until `stop` is set or
/// ctrl+c is pressed. Blocks the calling thread.
pub fn run_terminal_source(bus: &KeyEventBus, stop: Arc<AtomicBool>) -> io::Result<()> {
    enable_raw_mode()?;
    let result = pump(bus, &stop);
    disable_raw_mode()?;
    result
}

fn pump(bus: &KeyEventBus, stop: &AtomicBool) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);

    while !stop.load(Ordering::SeqCst) {
        if !event::poll(tick_rate)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                stop.store(true, Ordering::SeqCst);
                break;
            }
            if let Some(event) = translate(&key) {
                bus.emit(&event);
            }
        }
    }

    Ok(())
}
