//! Log lines in, decoded records out

use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::debug;
use nmea_logger_core::{AisDecoder, SentenceDecoder, StructuredRecord};

use super::logger_reader::LoggerRecordReader;
use crate::error::PipelineError;
use crate::io::{open_for_reading, LogStream};

/// Pull-based sequence of decoded records over one log stream.
///
/// With `ignore_parse_errors` set, sentences that fail to decode are logged
/// at debug level and skipped; otherwise the first one ends the pipeline.
/// Incomplete multi-sentence fragments are never an error.
pub struct RecordPipeline<R, D = AisDecoder> {
    reader: LoggerRecordReader<R>,
    decoder: D,
    ignore_parse_errors: bool,
    skipped: usize,
    failed: bool,
}

impl<R: BufRead> RecordPipeline<R, AisDecoder> {
    pub fn new(reader: R, ignore_parse_errors: bool) -> Self {
        Self::with_decoder(reader, AisDecoder::new(), ignore_parse_errors)
    }
}

impl RecordPipeline<BufReader<LogStream>, AisDecoder> {
    /// Open a (possibly compressed) log file
    pub fn open(path: &Path, ignore_parse_errors: bool) -> io::Result<Self> {
        Ok(Self::new(open_for_reading(path)?, ignore_parse_errors))
    }
}

impl<R: BufRead, D: SentenceDecoder> RecordPipeline<R, D> {
    pub fn with_decoder(reader: R, decoder: D, ignore_parse_errors: bool) -> Self {
        RecordPipeline {
            reader: LoggerRecordReader::new(reader),
            decoder,
            ignore_parse_errors,
            skipped: 0,
            failed: false,
        }
    }

    /// Sentences dropped so far because they failed to decode
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn next_record(&mut self) -> Result<Option<StructuredRecord>, PipelineError> {
        loop {
            let Some(logged) = self.reader.next_record()? else {
                return Ok(None);
            };
            match self.decoder.decode(&logged.raw_sentence) {
                Ok(Some(packet)) => {
                    return Ok(Some(StructuredRecord {
                        timestamp: logged.timestamp,
                        packet,
                    }))
                }
                Ok(None) => continue,
                Err(e) if self.ignore_parse_errors => {
                    debug!("Line {}: skipping sentence: {}", self.reader.line(), e);
                    self.skipped += 1;
                }
                Err(source) => {
                    return Err(PipelineError::Decode {
                        line: self.reader.line(),
                        source,
                    })
                }
            }
        }
    }
}

/// Yields records until end of stream or the first error
impl<R: BufRead, D: SentenceDecoder> Iterator for RecordPipeline<R, D> {
    type Item = Result<StructuredRecord, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.next_record().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}
