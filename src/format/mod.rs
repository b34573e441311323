//! Log record formats: the logger's input lines and the export outputs

pub mod csv_writer;
pub mod jsonl_writer;
pub mod logger_reader;
pub mod pipeline;

pub use csv_writer::CsvRecordWriter;
pub use jsonl_writer::JsonlWriter;
pub use logger_reader::LoggerRecordReader;
pub use pipeline::RecordPipeline;
