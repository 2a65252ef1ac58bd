use std::fmt::{self, Write};

/// Escape that restores the terminal's default foreground color.
pub const ANSI_DEFAULT_FOREGROUND: &str = "\x1b[39m";

/// 24-bit RGB color attached to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LogColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LogColor {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Writes the truecolor foreground escape (`ESC[38;2;R;G;Bm`).
    pub fn write_ansi<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "\x1b[38;2;{};{};{}m", self.r, self.g, self.b)
    }

    #[must_use]
    pub fn ansi(&self) -> String {
        let mut s = String::with_capacity(20);
        // Writing into a String cannot fail.
        let _ = self.write_ansi(&mut s);
        s
    }
}
