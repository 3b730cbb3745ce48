use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use std::io::{self, Write};

use super::{bar_cells, poll_quit, Control, FrameSignals, Renderer};

/// Three horizontal band meters plus a beat flash, on the alternate screen.
pub struct BandMeters {
    stdout: io::Stdout,
    active: bool,
}

impl BandMeters {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            active: false,
        }
    }
}

impl Default for BandMeters {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for BandMeters {
    fn setup(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.stdout.execute(EnterAlternateScreen)?;
        self.stdout.execute(Hide)?;
        self.active = true;
        Ok(())
    }

    fn draw(&mut self, signals: &FrameSignals) -> Result<Control> {
        if poll_quit()? {
            return Ok(Control::Stop);
        }

        let (cols, _) = terminal::size()?;
        let width = cols.saturating_sub(16).clamp(10, 60);

        self.stdout
            .queue(MoveTo(0, 0))?
            .queue(Print("resona  [q] quit"))?;

        draw_meter(&mut self.stdout, 2, "bass", signals.bass, width, Color::Red)?;
        draw_meter(&mut self.stdout, 3, "mid", signals.mid, width, Color::Yellow)?;
        draw_meter(&mut self.stdout, 4, "treble", signals.treble, width, Color::Cyan)?;

        self.stdout
            .queue(MoveTo(0, 6))?
            .queue(Clear(ClearType::CurrentLine))?;
        if signals.beat {
            self.stdout
                .queue(SetForegroundColor(Color::Magenta))?
                .queue(Print("  * BEAT *"))?
                .queue(ResetColor)?;
        }

        self.stdout
            .queue(MoveTo(0, 8))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(format!("  {:7.2}s", signals.time)))?;

        self.stdout.flush()?;
        Ok(Control::Continue)
    }
}

impl Drop for BandMeters {
    fn drop(&mut self) {
        if self.active {
            let _ = self.stdout.execute(Show);
            let _ = self.stdout.execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn draw_meter(
    out: &mut io::Stdout,
    row: u16,
    label: &str,
    value: f32,
    width: u16,
    color: Color,
) -> Result<()> {
    let filled = bar_cells(value, width) as usize;
    let mut bar = "\u{2588}".repeat(filled);
    bar.push_str(&" ".repeat(width as usize - filled));

    out.queue(MoveTo(0, row))?
        .queue(Clear(ClearType::CurrentLine))?
        .queue(Print(format!("{:>6} ", label)))?
        .queue(SetForegroundColor(color))?
        .queue(Print(bar))?
        .queue(ResetColor)?
        .queue(Print(format!(" {:5.1}", value)))?;
    Ok(())
}
