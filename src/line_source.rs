//! Buffered, rewindable line reader shared by the text formats.
//!
//! Blank lines and `#` comments never reach the caller. Every returned line is
//! trimmed and carries its physical line number so parse errors can point at it.

use std::io::{BufRead, Seek, SeekFrom};

use crate::command::{Classified, Command};
use crate::error::{MeshIoError, Result};

/// A trimmed, non-blank, non-comment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub text: &'a str,
    pub number: usize,
}

/// Saved stream position for [`LineSource::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMark {
    position: u64,
    line_number: usize,
}

pub struct LineSource<R> {
    reader: R,
    origin: String,
    start: LineMark,
    bytes: Vec<u8>,
    line: String,
    line_number: usize,
}

impl<R: BufRead + Seek> LineSource<R> {
    /// Wraps `reader`, remembering its current position as the start of input.
    pub fn new(mut reader: R, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let position = reader
            .stream_position()
            .map_err(|e| MeshIoError::io(&origin, e))?;
        Ok(Self {
            reader,
            origin,
            start: LineMark {
                position,
                line_number: 0,
            },
            bytes: Vec::new(),
            line: String::new(),
            line_number: 0,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Physical number of the most recently returned line.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn next_line(&mut self) -> Result<Option<Line<'_>>> {
        if self.advance()? {
            Ok(Some(Line {
                text: &self.line,
                number: self.line_number,
            }))
        } else {
            Ok(None)
        }
    }

    /// Next line whose leading keyword `C` recognises.
    ///
    /// Unrecognised lines are skipped with a debug diagnostic.
    pub fn next_command<C: Command>(&mut self) -> Result<Option<Classified<'_, C>>> {
        loop {
            if !self.advance()? {
                return Ok(None);
            }
            if C::classify(&self.line).is_some() {
                break;
            }
            log::debug!(
                "{}:{}: skipping unrecognised line '{}'",
                self.origin,
                self.line_number,
                self.line
            );
        }

        Ok(C::classify(&self.line).map(|(command, args)| Classified {
            command,
            args,
            number: self.line_number,
        }))
    }

    pub fn mark(&mut self) -> Result<LineMark> {
        let position = self
            .reader
            .stream_position()
            .map_err(|e| MeshIoError::io(&self.origin, e))?;
        Ok(LineMark {
            position,
            line_number: self.line_number,
        })
    }

    pub fn restore(&mut self, mark: LineMark) -> Result<()> {
        self.reader
            .seek(SeekFrom::Start(mark.position))
            .map_err(|e| MeshIoError::io(&self.origin, e))?;
        self.line_number = mark.line_number;
        Ok(())
    }

    /// Restores to where the source started reading.
    pub fn rewind(&mut self) -> Result<()> {
        self.restore(self.start)
    }

    /// Loads the next meaningful line into `self.line`; `false` at end of stream.
    fn advance(&mut self) -> Result<bool> {
        loop {
            self.bytes.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.bytes)
                .map_err(|e| MeshIoError::io(&self.origin, e))?;
            if n == 0 {
                return Ok(false);
            }
            self.line_number += 1;

            let text = std::str::from_utf8(&self.bytes).map_err(|_| {
                MeshIoError::format(&self.origin, self.line_number, "line is not valid UTF-8")
            })?;
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            self.line.clear();
            self.line.push_str(trimmed);
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(content: &str) -> LineSource<Cursor<Vec<u8>>> {
        LineSource::new(Cursor::new(content.as_bytes().to_vec()), "test").unwrap()
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let mut src = source("# header\n\n   \nv 1 2 3\r\n  # indented comment\nf 1 2 3\n");

        let line = src.next_line().unwrap().unwrap();
        assert_eq!(line.text, "v 1 2 3");
        assert_eq!(line.number, 4);

        let line = src.next_line().unwrap().unwrap();
        assert_eq!(line.text, "f 1 2 3");
        assert_eq!(line.number, 6);

        assert!(src.next_line().unwrap().is_none());
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut src = source("a\nb");
        assert_eq!(src.next_line().unwrap().unwrap().text, "a");
        assert_eq!(src.next_line().unwrap().unwrap().text, "b");
        assert!(src.next_line().unwrap().is_none());
    }

    #[test]
    fn test_rewind_restarts_numbering() {
        let mut src = source("one\ntwo\n");
        while src.next_line().unwrap().is_some() {}
        src.rewind().unwrap();

        let line = src.next_line().unwrap().unwrap();
        assert_eq!(line.text, "one");
        assert_eq!(line.number, 1);
    }

    #[test]
    fn test_mark_and_restore() {
        let mut src = source("header\n3 0 1 2\n4 0 1 2 3\n");
        src.next_line().unwrap();
        let mark = src.mark().unwrap();

        assert_eq!(src.next_line().unwrap().unwrap().text, "3 0 1 2");
        assert_eq!(src.next_line().unwrap().unwrap().text, "4 0 1 2 3");

        src.restore(mark).unwrap();
        let line = src.next_line().unwrap().unwrap();
        assert_eq!(line.text, "3 0 1 2");
        assert_eq!(line.number, 2);
    }

    #[test]
    fn test_rewind_respects_initial_offset() {
        let mut cursor = Cursor::new(b"skip\nkeep\n".to_vec());
        cursor.set_position(5);
        let mut src = LineSource::new(cursor, "test").unwrap();
        assert_eq!(src.next_line().unwrap().unwrap().text, "keep");
        src.rewind().unwrap();
        assert_eq!(src.next_line().unwrap().unwrap().text, "keep");
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let mut src = LineSource::new(Cursor::new(vec![b'v', b' ', 0xff, b'\n']), "bad.obj").unwrap();
        let err = src.next_line().unwrap_err();
        assert!(matches!(err, MeshIoError::Format { line: 1, .. }));
    }
}
