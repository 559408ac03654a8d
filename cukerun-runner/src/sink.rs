// Copyright (c) The cukerun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text sinks for notices and formatter output.
//!
//! Everything cukerun prints (profile notices, rerun locations) is valid UTF-8 text, so sinks
//! accept `&str` rather than bytes. Errors are reported as [`std::io::Error`] so that file and
//! console destinations can share one error path.

use std::{
    fmt,
    io::{self, BufWriter, Write},
};

/// A destination for text output.
pub trait OutputSink {
    /// Writes a string to the sink.
    fn write_str(&mut self, s: &str) -> io::Result<()>;

    /// Flushes any buffered output to its destination.
    fn flush_sink(&mut self) -> io::Result<()>;

    /// Writes a string followed by a newline.
    fn write_line(&mut self, s: &str) -> io::Result<()> {
        self.write_str(s)?;
        self.write_str("\n")
    }

    /// Writes formatted text to the sink.
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        // Fast path for arguments with no interpolation.
        if let Some(s) = args.as_str() {
            return self.write_str(s);
        }
        self.write_str(&args.to_string())
    }
}

impl OutputSink for String {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.push_str(s);
        Ok(())
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> OutputSink for BufWriter<W> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        (**self).write_str(s)
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        (**self).flush_sink()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn write_str(&mut self, s: &str) -> io::Result<()> {
        (**self).write_str(s)
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        (**self).flush_sink()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_sink_collects_lines() {
        let mut out = String::new();
        out.write_line("Disabling profiles...").unwrap();
        write!(out, "{}:{}", "foo.feature", 3).unwrap();
        assert_eq!(out, "Disabling profiles...\nfoo.feature:3");
    }

    #[test]
    fn buf_writer_sink_flushes() {
        let mut out = BufWriter::new(Vec::new());
        out.write_str("a").unwrap();
        out.flush_sink().unwrap();
        assert_eq!(out.get_ref(), b"a");
    }
}
