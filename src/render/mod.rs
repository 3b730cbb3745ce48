use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

pub mod meters;
pub mod spectrum;

/// One frame's worth of analyzer output. Band averages are on the 0-255
/// magnitude scale; `bins` is the raw snapshot for spectrum-style views.
pub struct FrameSignals<'a> {
    pub time: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub beat: bool,
    pub bins: &'a [u8],
}

pub enum Control {
    Continue,
    Stop,
}

/// Per-frame drawing strategy. The engine calls `setup` once, then `draw`
/// once per frame with that frame's signals; returning [`Control::Stop`]
/// ends the session. Teardown belongs in `Drop` so it also runs on error.
pub trait Renderer {
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, signals: &FrameSignals) -> Result<Control>;
}

/// Number of filled cells for a 0-255 value on a meter of `width` cells.
pub(crate) fn bar_cells(value: f32, width: u16) -> u16 {
    ((value / 255.0).clamp(0.0, 1.0) * f32::from(width)).round() as u16
}

/// Drain pending key events; 'q' or Esc requests a stop.
pub(crate) fn poll_quit() -> Result<bool> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
            {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
