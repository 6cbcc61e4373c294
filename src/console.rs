//! Shared console output.
//!
//! The progress bar and failure diagnostics are written from different tasks
//! to the same terminal. [`Console`] serializes them behind one lock (the
//! print lock) and remembers whether a progress line is still open, so a
//! diagnostic never lands in the middle of a bar.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// How an in-place line is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawMode {
    /// `\r` back to column zero and overwrite the previous line.
    CarriageReturn,
    /// Emit every redraw as a fresh line, for terminals where `\r` misbehaves.
    NewLine,
}

impl RedrawMode {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            RedrawMode::NewLine
        } else {
            RedrawMode::CarriageReturn
        }
    }
}

struct ConsoleState {
    out: Box<dyn Write + Send>,
    /// A carriage-return redraw left the cursor at the end of an unterminated line.
    partial_line: bool,
}

impl ConsoleState {
    fn break_partial_line(&mut self) -> io::Result<()> {
        if self.partial_line {
            self.out.write_all(b"\n")?;
            self.partial_line = false;
        }
        Ok(())
    }
}

/// Cloneable handle to a line-oriented output sink.
#[derive(Clone)]
pub struct Console {
    state: Arc<Mutex<ConsoleState>>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConsoleState {
                out: Box::new(out),
                partial_line: false,
            })),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Console backed by an in-memory buffer, for inspecting output.
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    /// Write one complete line.
    pub fn line(&self, text: &str) -> io::Result<()> {
        self.lines(&[text])
    }

    /// Write several lines as one block; no other console output can land
    /// between them.
    pub fn lines(&self, lines: &[&str]) -> io::Result<()> {
        let mut state = self.state.lock();
        state.break_partial_line()?;
        for line in lines {
            writeln!(state.out, "{}", line)?;
        }
        state.out.flush()
    }

    /// Replace the current in-place line with `text`.
    pub fn redraw(&self, text: &str, mode: RedrawMode) -> io::Result<()> {
        let mut state = self.state.lock();
        match mode {
            RedrawMode::CarriageReturn => {
                write!(state.out, "\r{}", text)?;
                state.partial_line = true;
            }
            RedrawMode::NewLine => {
                writeln!(state.out, "{}", text)?;
            }
        }
        state.out.flush()
    }

    /// Terminate an open in-place line, if any.
    pub fn end_line(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        state.break_partial_line()?;
        state.out.flush()
    }
}

/// In-memory writer shared between a [`Console`] and its reader.
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
