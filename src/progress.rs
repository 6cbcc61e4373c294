use std::io;

use crate::config::ProgressConfig;
use crate::console::{Console, RedrawMode};

const FILLED: char = '█';
const EMPTY: char = '-';

/// Render one progress line:
///
/// `<prefix> |█████-----| 50.0% 5 / 10`
///
/// The bar fills `round(width * processed / total)` cells. An empty run
/// counts as complete.
pub fn render_progress(prefix: &str, processed: usize, total: usize, width: usize) -> String {
    let fraction = if total == 0 {
        1.0
    } else {
        processed.min(total) as f64 / total as f64
    };
    let filled = ((width as f64) * fraction).round() as usize;
    let filled = filled.min(width);

    let mut bar = String::with_capacity(width * FILLED.len_utf8());
    bar.extend(std::iter::repeat(FILLED).take(filled));
    bar.extend(std::iter::repeat(EMPTY).take(width - filled));

    format!(
        "{} |{}| {:.1}% {} / {}",
        prefix,
        bar,
        fraction * 100.0,
        processed,
        total
    )
}

/// Live `processed / total` display for one configuration run.
///
/// Purely a view: it is handed counts and never touches the result sink.
#[derive(Debug)]
pub struct ProgressReporter {
    console: Console,
    config: ProgressConfig,
    total: usize,
    last: Option<usize>,
}

impl ProgressReporter {
    pub fn new(console: Console, config: ProgressConfig, total: usize) -> Self {
        Self {
            console,
            config,
            total,
            last: None,
        }
    }

    /// Redraw the line for `processed` finished jobs.
    pub fn update(&mut self, processed: usize) -> io::Result<()> {
        // Fresh-line terminals would otherwise print an identical line every tick.
        if self.config.redraw == RedrawMode::NewLine && self.last == Some(processed) {
            return Ok(());
        }
        self.draw(processed)
    }

    fn draw(&mut self, processed: usize) -> io::Result<()> {
        let line = render_progress(
            &self.config.prefix,
            processed,
            self.total,
            self.config.bar_width,
        );
        self.console.redraw(&line, self.config.redraw)?;
        self.last = Some(processed);
        Ok(())
    }

    /// Draw the final state and close the line.
    pub fn finish(&mut self, processed: usize) -> io::Result<()> {
        if self.last != Some(processed) {
            self.draw(processed)?;
        }
        self.console.end_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(redraw: RedrawMode, width: usize) -> ProgressConfig {
        ProgressConfig {
            bar_width: width,
            prefix: "Testing clips:".to_string(),
            redraw,
        }
    }

    #[test]
    fn render_empty_and_full() {
        assert_eq!(
            render_progress("Testing clips:", 0, 4, 10),
            "Testing clips: |----------| 0.0% 0 / 4"
        );
        assert_eq!(
            render_progress("Testing clips:", 4, 4, 10),
            "Testing clips: |██████████| 100.0% 4 / 4"
        );
    }

    #[test]
    fn render_rounds_to_nearest_cell() {
        // 50 * 1/3 = 16.67 -> 17 cells
        let line = render_progress("p", 1, 3, 50);
        assert_eq!(line.matches('█').count(), 17);
        assert_eq!(line.matches('-').count(), 33);
        assert!(line.ends_with("33.3% 1 / 3"));

        // 50 * 1/8 = 6.25 -> 6 cells
        let line = render_progress("p", 1, 8, 50);
        assert_eq!(line.matches('█').count(), 6);
        assert!(line.contains("12.5%"));
    }

    #[test]
    fn render_zero_total_is_complete() {
        assert_eq!(render_progress("p", 0, 0, 4), "p |████| 100.0% 0 / 0");
    }

    #[test]
    fn render_clamps_overflow() {
        let line = render_progress("p", 7, 5, 10);
        assert_eq!(line.matches('█').count(), 10);
        assert!(line.contains("100.0%"));
    }

    #[test]
    fn reporter_redraws_in_place() {
        let (console, buffer) = Console::capture();
        let mut reporter =
            ProgressReporter::new(console, config(RedrawMode::CarriageReturn, 4), 2);
        reporter.update(0).unwrap();
        reporter.update(1).unwrap();
        reporter.finish(2).unwrap();
        assert_eq!(
            buffer.contents(),
            "\rTesting clips: |----| 0.0% 0 / 2\
             \rTesting clips: |██--| 50.0% 1 / 2\
             \rTesting clips: |████| 100.0% 2 / 2\n"
        );
    }

    #[test]
    fn reporter_new_line_mode_skips_duplicates() {
        let (console, buffer) = Console::capture();
        let mut reporter = ProgressReporter::new(console, config(RedrawMode::NewLine, 2), 2);
        reporter.update(1).unwrap();
        reporter.update(1).unwrap();
        reporter.finish(2).unwrap();
        assert_eq!(
            buffer.contents(),
            "Testing clips: |█-| 50.0% 1 / 2\nTesting clips: |██| 100.0% 2 / 2\n"
        );
    }
}
