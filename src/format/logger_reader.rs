//! Reads `{"timestamp":..,"nmea":..}` lines from a log stream

use std::io::BufRead;

use nmea_logger_core::LoggerRecord;

use crate::error::ReadError;

pub struct LoggerRecordReader<R> {
    reader: R,
    buf: String,
    line: usize,
}

impl<R: BufRead> LoggerRecordReader<R> {
    pub fn new(reader: R) -> Self {
        LoggerRecordReader {
            reader,
            buf: String::new(),
            line: 0,
        }
    }

    /// 1-based number of the line most recently read
    pub fn line(&self) -> usize {
        self.line
    }

    /// Next record, `Ok(None)` at end of stream.
    ///
    /// Every line must be a record with exactly the two known fields; a line
    /// that is not is an error, not a skip.
    pub fn next_record(&mut self) -> Result<Option<LoggerRecord>, ReadError> {
        self.buf.clear();
        let n = self
            .reader
            .read_line(&mut self.buf)
            .map_err(|source| ReadError::Io {
                line: self.line + 1,
                source,
            })?;
        if n == 0 {
            return Ok(None);
        }
        self.line += 1;

        let text = self.buf.trim_end_matches(['\r', '\n']);
        serde_json::from_str(text)
            .map(Some)
            .map_err(|source| ReadError::Format {
                line: self.line,
                source,
            })
    }
}
