//! Tabular export, one row per position report.
//!
//! Export runs in two phases over two independent reads of the input:
//! [`scan`] collects the last static data seen for every vessel, then
//! [`CsvRecordWriter`] joins that snapshot onto each position report. A
//! report logged before its vessel's first static data message is still
//! enriched. Values a station reported as not available are empty cells.

use std::io::Write;

use chrono::DateTime;
use nmea_logger_core::{
    DecodedPacket, PositionReport, StaticData, StaticDataCache, StructuredRecord,
};

use crate::error::{ExportError, PipelineError};

pub const HEADER: [&str; 20] = [
    "DATE TIME (UTC)",
    "EPOCH TIME",
    "MMSI",
    "LATITUDE",
    "LONGITUDE",
    "COURSE",
    "SPEED",
    "HEADING",
    "NAVSTAT",
    "IMO",
    "NAME",
    "CALLSIGN",
    "AISTYPE",
    "A",
    "B",
    "C",
    "D",
    "DRAUGHT",
    "DESTINATION",
    "ETA",
];

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decimal places kept for latitude and longitude
const POSITION_DECIMALS: i32 = 5;

/// First phase: build the static data cache from a complete read of the input
pub fn scan<I>(records: I) -> Result<StaticDataCache, PipelineError>
where
    I: IntoIterator<Item = Result<StructuredRecord, PipelineError>>,
{
    let mut cache = StaticDataCache::new();
    for record in records {
        cache.observe(&record?);
    }
    Ok(cache)
}

/// Second phase: writes rows against a finished cache
pub struct CsvRecordWriter<'a, W: Write> {
    writer: csv::Writer<W>,
    cache: &'a StaticDataCache,
    rows: usize,
}

impl<'a, W: Write> CsvRecordWriter<'a, W> {
    /// Wrap `writer` and emit the header row
    pub fn new(writer: W, cache: &'a StaticDataCache) -> Result<Self, ExportError> {
        // Rows without static data stop after NAVSTAT
        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        writer.write_record(HEADER)?;
        Ok(CsvRecordWriter {
            writer,
            cache,
            rows: 0,
        })
    }

    pub fn write_record(&mut self, record: &StructuredRecord) -> Result<(), ExportError> {
        match &record.packet {
            DecodedPacket::PositionReport(report) => {
                let static_data = self.cache.lookup(report.user_id);
                self.writer
                    .write_record(row(record.timestamp, report, static_data))?;
                self.rows += 1;
            }
            DecodedPacket::StaticData(_) | DecodedPacket::Other(_) => {}
        }
        Ok(())
    }

    /// Data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush buffered rows and return the underlying writer
    pub fn into_inner(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}

/// Second phase over a complete read of the input, returning the row count
pub fn emit<I, W>(records: I, cache: &StaticDataCache, writer: W) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = Result<StructuredRecord, PipelineError>>,
    W: Write,
{
    let mut csv = CsvRecordWriter::new(writer, cache)?;
    for record in records {
        csv.write_record(&record?)?;
    }
    let rows = csv.rows();
    csv.into_inner()?;
    Ok(rows)
}

fn row(timestamp: i64, report: &PositionReport, static_data: Option<&StaticData>) -> Vec<String> {
    let mut cells = vec![
        DateTime::from_timestamp_millis(timestamp)
            .map(|t| t.format(DATE_TIME_FORMAT).to_string())
            .unwrap_or_default(),
        (timestamp / 1000).to_string(),
        report.user_id.to_string(),
        cell(report.latitude.map(|v| round_to(v, POSITION_DECIMALS))),
        cell(report.longitude.map(|v| round_to(v, POSITION_DECIMALS))),
        cell(report.cog),
        cell(report.sog),
        cell(report.true_heading),
        report.navigational_status.to_string(),
    ];
    if let Some(data) = static_data {
        cells.extend([
            cell(data.imo_number),
            data.name.clone().unwrap_or_default(),
            data.call_sign.clone().unwrap_or_default(),
            data.ship_type.to_string(),
            data.dimension.a.to_string(),
            data.dimension.b.to_string(),
            data.dimension.c.to_string(),
            data.dimension.d.to_string(),
            cell(data.maximum_static_draught),
            data.destination.clone().unwrap_or_default(),
            data.eta
                .map(|eta| {
                    format!(
                        "{:02}-{:02} {:02}:{:02}",
                        eta.month, eta.day, eta.hour, eta.minute
                    )
                })
                .unwrap_or_default(),
        ]);
    }
    cells
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Round half away from zero to `decimals` places
fn round_to(value: f64, decimals: i32) -> f64 {
    let multiplier = 10f64.powi(decimals);
    (value * multiplier).round() / multiplier
}
