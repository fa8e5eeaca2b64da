//! Single-entry extraction from release archives.
//!
//! Upstream releases wrap the binary either in a gzip tar or a zip. Only
//! one file is wanted, so both variants scan entries and match on the
//! basename, ignoring whatever directory prefix the release tooling added.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use thiserror::Error;

use binwheel_schema::ArchiveFormat;

/// Errors while pulling the binary out of a fetched archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive was readable but contained no entry with the expected
    /// basename. Distinct from decode failures so callers can print an
    /// actionable message.
    #[error("{name:?} not found in {format} archive")]
    EntryNotFound {
        /// The basename that was searched for.
        name: String,
        /// The container variant that was scanned.
        format: ArchiveFormat,
    },

    /// Decompression or tar read failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container failure.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Pull a single file out of `data`, matching entries on basename.
pub fn extract_binary(
    data: &[u8],
    format: ArchiveFormat,
    target: &str,
) -> Result<Vec<u8>, ExtractError> {
    match format {
        ArchiveFormat::TarGz => extract_from_tar_gz(data, target),
        ArchiveFormat::Zip => extract_from_zip(data, target),
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extract_from_tar_gz(data: &[u8], target: &str) -> Result<Vec<u8>, ExtractError> {
    let gz = GzDecoder::new(data);
    let mut archive = tar::Archive::new(gz);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let matched = {
            let path = entry.path()?;
            path.file_name().is_some_and(|n| n == target)
        };
        if matched {
            let mut out = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut out)?;
            return Ok(out);
        }
    }

    Err(ExtractError::EntryNotFound {
        name: target.to_string(),
        format: ArchiveFormat::TarGz,
    })
}

fn extract_from_zip(data: &[u8], target: &str) -> Result<Vec<u8>, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if basename(file.name()) != target {
            continue;
        }
        let mut out = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut out)?;
        return Ok(out);
    }

    Err(ExtractError::EntryNotFound {
        name: target.to_string(),
        format: ArchiveFormat::Zip,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tar_gz_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (path, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (path, data) in entries {
            writer.start_file(*path, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn finds_entry_in_tar_gz_by_basename() {
        let archive = tar_gz_with(&[
            ("README.md", b"docs"),
            ("tool-1.0/bin/tool", b"\x7fELF binary"),
        ]);
        let out = extract_binary(&archive, ArchiveFormat::TarGz, "tool").unwrap();
        assert_eq!(out, b"\x7fELF binary");
    }

    #[test]
    fn finds_entry_in_zip_by_basename() {
        let archive = zip_with(&[
            ("LICENSE.txt", b"mit"),
            ("dist/tool.exe", b"MZ binary"),
        ]);
        let out = extract_binary(&archive, ArchiveFormat::Zip, "tool.exe").unwrap();
        assert_eq!(out, b"MZ binary");
    }

    #[test]
    fn missing_tar_entry_is_entry_not_found() {
        let archive = tar_gz_with(&[("other", b"data")]);
        let err = extract_binary(&archive, ArchiveFormat::TarGz, "tool").unwrap_err();
        match err {
            ExtractError::EntryNotFound { name, format } => {
                assert_eq!(name, "tool");
                assert_eq!(format, ArchiveFormat::TarGz);
            }
            other => panic!("expected EntryNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_zip_entry_is_entry_not_found() {
        let archive = zip_with(&[("other.exe", b"data")]);
        let err = extract_binary(&archive, ArchiveFormat::Zip, "tool.exe").unwrap_err();
        assert!(matches!(err, ExtractError::EntryNotFound { .. }));
    }

    #[test]
    fn corrupt_input_is_not_entry_not_found() {
        let err = extract_binary(b"not an archive", ArchiveFormat::Zip, "tool").unwrap_err();
        assert!(matches!(err, ExtractError::Zip(_)));
    }
}
