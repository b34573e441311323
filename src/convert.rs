//! `convert` and `dump` commands

use std::io::{self, BufReader, Write};
use std::path::Path;

use log::info;

use crate::error::ExportError;
use crate::format::{csv_writer, jsonl_writer, RecordPipeline};
use crate::io::{open_for_writing, Codec, LogStream};

/// Output path meaning standard output
pub const STDOUT: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

impl OutputFormat {
    /// Format named by the extension left after removing any compression
    /// suffix, e.g. `out.csv.xz` is CSV.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let inner = Codec::from_path(path).strip(path);
        match inner.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Ok(OutputFormat::Csv),
            Some("jsonl") | Some("json") => Ok(OutputFormat::Jsonl),
            _ => Err(ExportError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn open_pipeline(
    path: &Path,
    ignore_parse_errors: bool,
) -> Result<RecordPipeline<BufReader<LogStream>>, ExportError> {
    RecordPipeline::open(path, ignore_parse_errors).map_err(|source| ExportError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert `input` into `output`, choosing format and compression from the
/// output file name. Returns the number of rows or lines written.
///
/// The output is finished even when the conversion fails part way, so
/// whatever was written before the error stays readable.
pub fn convert(input: &Path, output: &Path, ignore_parse_errors: bool) -> Result<usize, ExportError> {
    if output.as_os_str() == STDOUT {
        return dump(input, ignore_parse_errors);
    }
    let format = OutputFormat::from_path(output)?;

    let written = match format {
        OutputFormat::Csv => {
            let mut pipeline = open_pipeline(input, ignore_parse_errors)?;
            let cache = csv_writer::scan(&mut pipeline)?;
            info!(
                "Scanned {}: static data for {} vessels, {} sentences skipped",
                input.display(),
                cache.len(),
                pipeline.skipped()
            );

            let mut pipeline = open_pipeline(input, ignore_parse_errors)?;
            write_output(output, |w| csv_writer::emit(&mut pipeline, &cache, w))?
        }
        OutputFormat::Jsonl => {
            let mut pipeline = open_pipeline(input, ignore_parse_errors)?;
            write_output(output, |w| jsonl_writer::emit(&mut pipeline, w))?
        }
    };

    info!("Wrote {} records to {}", written, output.display());
    Ok(written)
}

/// Write every record of `input` to stdout as line-delimited JSON
pub fn dump(input: &Path, ignore_parse_errors: bool) -> Result<usize, ExportError> {
    let pipeline = open_pipeline(input, ignore_parse_errors)?;
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let result = jsonl_writer::emit(pipeline, &mut out);
    out.flush()?;
    result
}

fn write_output<F>(output: &Path, emit: F) -> Result<usize, ExportError>
where
    F: FnOnce(&mut dyn Write) -> Result<usize, ExportError>,
{
    let (mut writer, _) = open_for_writing(output).map_err(|source| ExportError::Open {
        path: output.to_path_buf(),
        source,
    })?;
    let result = emit(&mut writer);
    let finished = writer.finish();
    let written = result?;
    finished?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::open_for_reading;
    use std::io::Read;
    use tempfile::TempDir;

    const POSITION: &str = "!AIVDM,1,1,,A,100001@wAsPDVG0MllFa2W<t0000,0*51";
    const ALPHA_1: &str =
        "!AIVDM,2,1,3,A,500001@2Fe3u0C7;?@04i0P40000000000000016<PD575WfNEDSm51DQ0C@,0*46";
    const ALPHA_2: &str = "!AIVDM,2,2,3,A,00000000000,2*27";
    const BRAVO_1: &str =
        "!AIVDM,2,1,4,A,500001@2Fe3u0C7;?@0985Ht0000000000000016<PD575h`5G20C@UDQh00,0*71";
    const BRAVO_2: &str = "!AIVDM,2,2,4,A,00000000000,2*20";

    fn write_log(dir: &TempDir, name: &str, lines: &[(i64, &str)]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let (mut writer, _) = open_for_writing(&path).unwrap();
        for (t, sentence) in lines {
            writeln!(writer, "{{\"timestamp\":{},\"nmea\":{:?}}}", t, sentence).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn read_text(path: &Path) -> String {
        let mut text = String::new();
        open_for_reading(path)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    fn sample() -> Vec<(i64, &'static str)> {
        vec![
            (1_000, ALPHA_1),
            (1_001, ALPHA_2),
            (2_000, POSITION),
            (3_000, BRAVO_1),
            (3_001, BRAVO_2),
        ]
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a.csv")).unwrap(),
            OutputFormat::Csv
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a.csv.bz2")).unwrap(),
            OutputFormat::Csv
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a.json.gz")).unwrap(),
            OutputFormat::Jsonl
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("a.txt")),
            Err(ExportError::UnsupportedFormat(_))
        ));
        assert!(OutputFormat::from_path(Path::new("a.gz")).is_err());
    }

    #[test]
    fn test_convert_to_csv_uses_final_static_data() {
        let dir = TempDir::new().unwrap();
        let input = write_log(&dir, "log.json", &sample());
        let output = dir.path().join("out.csv");

        assert_eq!(convert(&input, &output, false).unwrap(), 1);
        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("DATE TIME (UTC),EPOCH TIME,MMSI"));
        assert!(lines[1].starts_with("1970-01-01 00:00:02,2,5,52.12346,4.5,"));
        assert!(lines[1].ends_with(",0,9876543,ALPHA,PD1234,70,100,20,5,7,9.2,HAMBURG,07-01 08:05"));
    }

    #[test]
    fn test_compressed_input_matches_plain() {
        let dir = TempDir::new().unwrap();
        let plain = write_log(&dir, "log.json", &sample());
        let mut outputs = Vec::new();
        for (i, name) in ["log.json", "log.json.gz", "log.json.bz2", "log.json.xz"]
            .iter()
            .enumerate()
        {
            let input = if i == 0 {
                plain.clone()
            } else {
                write_log(&dir, name, &sample())
            };
            let output = dir.path().join(format!("out{}.jsonl", i));
            assert_eq!(convert(&input, &output, false).unwrap(), 3);
            outputs.push(std::fs::read_to_string(&output).unwrap());
        }
        assert!(outputs.iter().all(|o| o == &outputs[0]));
    }

    #[test]
    fn test_compressed_output() {
        let dir = TempDir::new().unwrap();
        let input = write_log(&dir, "log.json", &sample());
        let output = dir.path().join("out.csv.xz");

        convert(&input, &output, false).unwrap();
        assert!(read_text(&output).contains(",HAMBURG,"));
    }

    #[test]
    fn test_unsupported_format_reads_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");
        let err = convert(&dir.path().join("missing.json"), &output, false).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_strict_error_keeps_partial_output() {
        let dir = TempDir::new().unwrap();
        let input = write_log(
            &dir,
            "log.json",
            &[(1, POSITION), (2, "!AIVDM,1,1,,A,bad,0*00"), (3, POSITION)],
        );
        let output = dir.path().join("out.jsonl.gz");

        let err = convert(&input, &output, false).unwrap_err();
        assert!(matches!(err, ExportError::Pipeline(_)));
        assert_eq!(read_text(&output).lines().count(), 1);

        assert_eq!(convert(&input, &output, true).unwrap(), 2);
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = convert(
            &dir.path().join("missing.json"),
            &dir.path().join("out.csv"),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::Open { .. }));
    }
}
