use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Decompresses `<name>.gz` next to itself as `<name>` and returns the new path.
///
/// # Errors
///
/// Returns `InvalidInput` if the path does not end in `.gz`, or any I/O error raised
/// while reading or writing.
pub fn gunzip_in_place(path: &Path) -> io::Result<PathBuf> {
    let output = path
        .to_str()
        .and_then(|p| p.strip_suffix(".gz"))
        .map(PathBuf::from)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a gzip file: {}", path.display()),
            )
        })?;

    let mut decoder = GzDecoder::new(BufReader::new(File::open(path)?));
    let mut writer = BufWriter::new(File::create(&output)?);
    io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;
    Ok(output)
}
