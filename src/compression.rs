use std::io::Write;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;

/// Compression format of the report output
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Compression {
    Bzip2,
    /// gzip with compression level
    Gzip(u8),
    /// lz4 with compression level
    Lz4(u8),
    /// zstd with compression level
    Zstd(u8),
}

/// Wrap `writer` into an encoder for the given compression format
///
/// Encoders finish the compressed stream when dropped.
pub fn compress_writer<'a, W: 'a + Write>(
    writer: W,
    compression: Option<Compression>,
) -> Result<Box<dyn Write + 'a>, std::io::Error> {
    match compression {
        Some(Compression::Bzip2) => {
            let encoder = BzEncoder::new(writer, bzip2::Compression::best());
            Ok(Box::new(encoder))
        }
        Some(Compression::Gzip(lvl)) => {
            let encoder =
                GzEncoder::new(writer, flate2::Compression::new(lvl.into()));
            Ok(Box::new(encoder))
        }
        Some(Compression::Lz4(lvl)) => {
            let encoder = lz4::EncoderBuilder::new()
                .auto_flush(true)
                .level(lvl.into())
                .build(writer)?;
            Ok(Box::new(Lz4Writer(Some(encoder))))
        }
        Some(Compression::Zstd(lvl)) => {
            let encoder = zstd::Encoder::new(writer, lvl.into())?;
            Ok(Box::new(encoder.auto_finish()))
        }
        None => Ok(Box::new(writer)),
    }
}

// lz4 encoders only write the end mark in `finish`
struct Lz4Writer<W: Write>(Option<lz4::Encoder<W>>);

impl<W: Write> Write for Lz4Writer<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.as_mut() {
            Some(encoder) => encoder.write(buf),
            None => Ok(0),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.as_mut() {
            Some(encoder) => encoder.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for Lz4Writer<W> {
    fn drop(&mut self) {
        if let Some(encoder) = self.0.take() {
            let (_, res) = encoder.finish();
            if let Err(err) = res {
                log::error!("Failed to finish lz4 stream: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{BufRead, BufReader, Read};

    use audec::auto_decompress;

    const TEXT: &str = "At Event [0]\nDijet mass: 20\n";

    fn roundtrip(compression: Option<Compression>) -> String {
        let file = tempfile::NamedTempFile::new().unwrap();
        {
            let out = std::fs::File::create(file.path()).unwrap();
            let mut writer = compress_writer(out, compression).unwrap();
            writer.write_all(TEXT.as_bytes()).unwrap();
        }
        let input = std::fs::File::open(file.path()).unwrap();
        let mut reader = auto_decompress(BufReader::new(input));
        // make sure the decoder has seen the header
        reader.fill_buf().unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn compressed_output() {
        for compression in [
            None,
            Some(Compression::Bzip2),
            Some(Compression::Gzip(6)),
            Some(Compression::Lz4(0)),
        ] {
            assert_eq!(roundtrip(compression), TEXT, "{compression:?}");
        }
    }

    #[test]
    fn zstd_output() {
        let mut out = Vec::new();
        {
            let mut writer =
                compress_writer(&mut out, Some(Compression::Zstd(3))).unwrap();
            writer.write_all(TEXT.as_bytes()).unwrap();
        }
        let decoded = zstd::decode_all(out.as_slice()).unwrap();
        assert_eq!(decoded, TEXT.as_bytes());
    }
}
