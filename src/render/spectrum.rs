use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use std::io::{self, Write};

use super::{poll_quit, Control, FrameSignals, Renderer};

/// Full-width column view of the raw bin snapshot. Columns flash magenta on
/// the beat flag.
pub struct SpectrumColumns {
    stdout: io::Stdout,
    active: bool,
}

impl SpectrumColumns {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            active: false,
        }
    }
}

impl Default for SpectrumColumns {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for SpectrumColumns {
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

        let (cols, rows) = terminal::size()?;
        let height = rows.saturating_sub(2).max(4) as usize;
        let peaks = column_peaks(signals.bins, cols as usize);

        self.stdout
            .queue(MoveTo(0, 0))?
            .queue(Print(format!("resona  [q] quit  {:6.2}s", signals.time)))?;

        let color = if signals.beat {
            Color::Magenta
        } else {
            Color::Cyan
        };
        self.stdout.queue(SetForegroundColor(color))?;

        for row in 0..height {
            let cutoff = height - row;
            let line: String = peaks
                .iter()
                .map(|&peak| {
                    let cells = (usize::from(peak) * height + 254) / 255;
                    if cells >= cutoff {
                        '\u{2588}'
                    } else {
                        ' '
                    }
                })
                .collect();
            self.stdout
                .queue(MoveTo(0, (row + 1) as u16))?
                .queue(Print(line))?;
        }

        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        Ok(Control::Continue)
    }
}

impl Drop for SpectrumColumns {
    fn drop(&mut self) {
        if self.active {
            let _ = self.stdout.execute(Show);
            let _ = self.stdout.execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Collapse the bin snapshot into one peak value per terminal column.
fn column_peaks(bins: &[u8], columns: usize) -> Vec<u8> {
    if bins.is_empty() || columns == 0 {
        return vec![0; columns];
    }
    (0..columns)
        .map(|c| {
            let start = c * bins.len() / columns;
            let end = (((c + 1) * bins.len()) / columns).clamp(start + 1, bins.len());
            bins[start..end].iter().copied().max().unwrap_or(0)
        })
        .collect()
}
