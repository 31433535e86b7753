use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use std::ffi::OsStr;
use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Lz4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Bincode,
    Json,
}

/// How an artifact file is laid out on disk, decided from its name:
/// an optional `.gz` or `.lz4` suffix, then `.json` for JSON and anything
/// else for bincode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFormat {
    pub encoding: Encoding,
    pub compression: Compression,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> FileFormat {
        let compression = match path.extension().and_then(OsStr::to_str) {
            Some("gz") => Compression::Gzip,
            Some("lz4") => Compression::Lz4,
            _ => Compression::None,
        };
        let inner = match compression {
            Compression::None => path.to_path_buf(),
            _ => path.with_extension(""),
        };
        let encoding = match inner.extension().and_then(OsStr::to_str) {
            Some("json") => Encoding::Json,
            _ => Encoding::Bincode,
        };
        FileFormat {
            encoding,
            compression,
        }
    }
}

/// Read normal or compressed files seamlessly.
pub fn reader(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = fs::File::open(path)?;
    Ok(match FileFormat::from_path(path).compression {
        Compression::Gzip => Box::new(BufReader::with_capacity(128 * 1024, GzDecoder::new(file))),
        Compression::Lz4 => Box::new(BufReader::with_capacity(128 * 1024, FrameDecoder::new(file))),
        Compression::None => Box::new(BufReader::with_capacity(128 * 1024, file)),
    })
}

pub fn write_all(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = BufWriter::new(fs::File::create(path)?);
    match FileFormat::from_path(path).compression {
        Compression::Gzip => {
            let mut outfp = GzEncoder::new(file, flate2::Compression::default());
            outfp.write_all(bytes)?;
            outfp.finish()?.flush()
        }
        Compression::Lz4 => {
            let mut outfp = FrameEncoder::new(file);
            outfp.write_all(bytes)?;
            outfp.finish().map_err(io::Error::other)?.flush()
        }
        Compression::None => {
            let mut outfp = file;
            outfp.write_all(bytes)?;
            outfp.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_format_from_path() {
        let fmt = FileFormat::from_path(Path::new("model/model.bin"));
        assert_eq!(fmt.encoding, Encoding::Bincode);
        assert_eq!(fmt.compression, Compression::None);

        let fmt = FileFormat::from_path(Path::new("model.json.gz"));
        assert_eq!(fmt.encoding, Encoding::Json);
        assert_eq!(fmt.compression, Compression::Gzip);

        let fmt = FileFormat::from_path(Path::new("model.bin.lz4"));
        assert_eq!(fmt.encoding, Encoding::Bincode);
        assert_eq!(fmt.compression, Compression::Lz4);

        let fmt = FileFormat::from_path(Path::new("model.json"));
        assert_eq!(fmt.encoding, Encoding::Json);
        assert_eq!(fmt.compression, Compression::None);

        let fmt = FileFormat::from_path(Path::new("model"));
        assert_eq!(fmt.encoding, Encoding::Bincode);
    }

    #[test]
    fn test_compressed_files_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let payload = b"churn churn churn churn churn".repeat(50);
        for name in ["plain.bin", "packed.bin.gz", "packed.json.lz4"] {
            let path = dir.path().join(name);
            write_all(&path, &payload).unwrap();
            let mut got = Vec::new();
            reader(&path).unwrap().read_to_end(&mut got).unwrap();
            assert_eq!(got, payload, "{}", name);
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = reader(&dir.path().join("nope.bin")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
