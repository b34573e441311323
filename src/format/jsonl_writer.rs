//! Line-delimited JSON export, one record per line

use std::io::Write;

use serde::Serialize;

use crate::error::{ExportError, PipelineError};
use nmea_logger_core::StructuredRecord;

pub struct JsonlWriter<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonlWriter { writer, records: 0 }
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<(), ExportError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(mut self) -> Result<W, ExportError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Serialize every record, whatever its packet kind. Returns the number of
/// lines written.
pub fn emit<I, W>(records: I, writer: W) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = Result<StructuredRecord, PipelineError>>,
    W: Write,
{
    let mut jsonl = JsonlWriter::new(writer);
    for record in records {
        jsonl.write_record(&record?)?;
    }
    let records = jsonl.records();
    jsonl.into_inner()?;
    Ok(records)
}
