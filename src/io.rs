//! Compression-transparent file access.
//!
//! The codec is chosen from the file name suffix alone, never from the file
//! contents, so `log.json.gz` is always read through gzip and `log.json` never
//! is.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

/// xz preset used for written files
const XZ_LEVEL: u32 = 6;

/// Compression format selected by file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Plain,
    Gzip,
    Bzip2,
    Xz,
}

impl Codec {
    /// Pick the codec for a path. Suffixes are case-sensitive.
    pub fn from_path(path: &Path) -> Codec {
        let name = path.to_string_lossy();
        if name.ends_with(".gz") {
            Codec::Gzip
        } else if name.ends_with(".bz2") {
            Codec::Bzip2
        } else if name.ends_with(".xz") {
            Codec::Xz
        } else {
            Codec::Plain
        }
    }

    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Codec::Plain => None,
            Codec::Gzip => Some("gz"),
            Codec::Bzip2 => Some("bz2"),
            Codec::Xz => Some("xz"),
        }
    }

    /// The path without this codec's suffix, e.g. `out.csv.gz` → `out.csv`
    pub fn strip(&self, path: &Path) -> PathBuf {
        match self.extension() {
            Some(_) => path.with_extension(""),
            None => path.to_path_buf(),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::Plain => write!(f, "none"),
            Codec::Gzip => write!(f, "gzip"),
            Codec::Bzip2 => write!(f, "bzip2"),
            Codec::Xz => write!(f, "xz"),
        }
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Decompressed byte stream over a log file.
///
/// Each variant owns its file, so dropping the stream releases the decoder
/// and then the file.
pub enum LogStream {
    Plain(File),
    Gzip(MultiGzDecoder<File>),
    Bzip2(MultiBzDecoder<File>),
    Xz(XzDecoder<File>),
}

impl LogStream {
    pub fn codec(&self) -> Codec {
        match self {
            LogStream::Plain(_) => Codec::Plain,
            LogStream::Gzip(_) => Codec::Gzip,
            LogStream::Bzip2(_) => Codec::Bzip2,
            LogStream::Xz(_) => Codec::Xz,
        }
    }
}

impl Read for LogStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            LogStream::Plain(r) => r.read(buf),
            LogStream::Gzip(r) => r.read(buf),
            LogStream::Bzip2(r) => r.read(buf),
            LogStream::Xz(r) => r.read(buf),
        }
    }
}

/// Open a possibly compressed file for line-oriented reading.
///
/// The first block is decoded before returning so a corrupt compression
/// header is reported here rather than on the first read.
pub fn open_for_reading(path: &Path) -> io::Result<BufReader<LogStream>> {
    let file = File::open(path)?;
    let stream = match Codec::from_path(path) {
        Codec::Plain => LogStream::Plain(file),
        Codec::Gzip => LogStream::Gzip(MultiGzDecoder::new(file)),
        Codec::Bzip2 => LogStream::Bzip2(MultiBzDecoder::new(file)),
        Codec::Xz => LogStream::Xz(XzDecoder::new_multi_decoder(file)),
    };
    let mut reader = BufReader::new(stream);
    reader.fill_buf()?;
    Ok(reader)
}

// =============================================================================
// Writing
// =============================================================================

/// Compressing writer over an output file
pub enum LogWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
    Xz(XzEncoder<BufWriter<File>>),
}

impl LogWriter {
    /// Write the compression trailer, then flush the file
    pub fn finish(self) -> io::Result<()> {
        let mut file = match self {
            LogWriter::Plain(w) => w,
            LogWriter::Gzip(w) => w.finish()?,
            LogWriter::Bzip2(w) => w.finish()?,
            LogWriter::Xz(w) => w.finish()?,
        };
        file.flush()
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::Plain(w) => w.write(buf),
            LogWriter::Gzip(w) => w.write(buf),
            LogWriter::Bzip2(w) => w.write(buf),
            LogWriter::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::Plain(w) => w.flush(),
            LogWriter::Gzip(w) => w.flush(),
            LogWriter::Bzip2(w) => w.flush(),
            LogWriter::Xz(w) => w.flush(),
        }
    }
}

/// Create `path`, compressing by suffix.
///
/// Also returns the path with the compression suffix removed so callers can
/// choose an output format from the inner extension.
pub fn open_for_writing(path: &Path) -> io::Result<(LogWriter, PathBuf)> {
    let codec = Codec::from_path(path);
    let file = BufWriter::new(File::create(path)?);
    let writer = match codec {
        Codec::Plain => LogWriter::Plain(file),
        Codec::Gzip => LogWriter::Gzip(GzEncoder::new(file, flate2::Compression::default())),
        Codec::Bzip2 => LogWriter::Bzip2(BzEncoder::new(file, bzip2::Compression::default())),
        Codec::Xz => LogWriter::Xz(XzEncoder::new(file, XZ_LEVEL)),
    };
    Ok((writer, codec.strip(path)))
}
