//! Wheel assembly: packs an extracted binary, a generated launcher, and
//! metadata into one installable wheel.
//!
//! The output must satisfy strict consumers, not just lenient unzip tools:
//! every member is stored uncompressed with all four size fields populated
//! up front, which keeps the archive in plain zip32 form. Archives that
//! lean on zip64 auto-promotion for small files, or that defer sizes to a
//! data descriptor, are rejected by some installers and by the upload
//! endpoint.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Timelike};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use binwheel_schema::{PackageName, RecordDigest, Version};

/// Errors while assembling or persisting a wheel.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Writing one member into the archive failed; names the offending
    /// entry path.
    #[error("adding {path} to wheel: {source}")]
    Entry {
        /// Path of the entry that failed to write.
        path: String,
        /// The underlying archive error.
        source: zip::result::ZipError,
    },

    /// Finalizing the archive failed.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Persisting the finished wheel to disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Static metadata about the wrapped project, rendered into `METADATA` and
/// `entry_points.txt`.
#[derive(Debug, Clone)]
pub struct ProjectMeta {
    /// Source project URL recorded in the metadata block.
    pub source_url: String,
    /// SPDX license expression.
    pub license_expression: String,
    /// Comma-separated keyword list.
    pub keywords: String,
    /// Command name the wheel installs.
    pub entry_point: String,
}

/// Everything needed to assemble one wheel.
#[derive(Debug)]
pub struct WheelSpec<'a> {
    /// Raw binary extracted from the upstream archive.
    pub binary: &'a [u8],
    /// Filename the binary keeps inside the wheel (`.exe` on Windows).
    pub binary_filename: &'a str,
    /// Upstream binary version, embedded in the metadata summary.
    pub binary_version: &'a str,
    /// Package name as published on the index.
    pub package: &'a PackageName,
    /// Package version (may carry a post-release suffix).
    pub version: &'a Version,
    /// Wheel platform tag (e.g. `manylinux_2_17_x86_64`).
    pub wheel_tag: &'a str,
    /// License file contents, stored under the licenses subpath.
    pub license: &'a [u8],
    /// Long-form markdown description, appended to the metadata body.
    pub description: &'a [u8],
    /// Project-level metadata fields.
    pub project: &'a ProjectMeta,
}

/// Launcher for Unix-family wheels: replaces the interpreter process with
/// the bundled binary, so the wrapper adds no runtime overhead.
const EXECV_SHIM: &str = r"import os, sys

def main():
    here = os.path.dirname(os.path.abspath(__file__))
    binary = os.path.join(here, BINWHEEL_TARGET)
    os.execv(binary, [binary] + sys.argv[1:])
";

/// Launcher for Windows wheels: process replacement is unreliable there,
/// so the binary runs as a child and its exit code is forwarded.
const SPAWN_SHIM: &str = r"import os, sys, subprocess

def main():
    here = os.path.dirname(os.path.abspath(__file__))
    binary = os.path.join(here, BINWHEEL_TARGET)
    sys.exit(subprocess.call([binary] + sys.argv[1:]))
";

fn shim_source(windows: bool, binary_filename: &str) -> String {
    let template = if windows { SPAWN_SHIM } else { EXECV_SHIM };
    // The shim resolves the binary next to its own installed location, so
    // only the bare filename is ever embedded.
    template.replace("BINWHEEL_TARGET", &format!("{binary_filename:?}"))
}

/// Standard wheel file name: `<normalized>-<version>-py3-none-<tag>.whl`.
pub fn wheel_filename(package: &PackageName, version: &Version, wheel_tag: &str) -> String {
    format!("{}-{version}-py3-none-{wheel_tag}.whl", package.normalized())
}

struct Entry {
    path: String,
    data: Vec<u8>,
    executable: bool,
}

impl WheelSpec<'_> {
    /// Assemble the wheel and persist it into `out_dir`, returning its
    /// path. An existing file at that path is overwritten.
    pub fn build(&self, out_dir: &Path) -> Result<PathBuf, BuildError> {
        let module = self.package.normalized();
        let dist_info = format!("{module}-{}.dist-info", self.version);
        let windows = self.binary_filename.ends_with(".exe");

        let shim = shim_source(windows, self.binary_filename);
        let init = format!(
            "# {} launcher package\n__version__ = {:?}\n",
            self.package,
            self.version.as_str()
        );
        let metadata = self.render_metadata();
        let wheel_meta = format!(
            "Wheel-Version: 1.0\nGenerator: binwheel {}\nRoot-Is-Purelib: false\nTag: py3-none-{}\n",
            env!("CARGO_PKG_VERSION"),
            self.wheel_tag
        );
        let entry_points = format!(
            "[console_scripts]\n{} = {module}._shim:main\n",
            self.project.entry_point
        );

        // Pass 1: the fixed, ordered entry list. RECORD is derived from it
        // and is always the last member written.
        let entries = vec![
            Entry {
                path: format!("{module}/{}", self.binary_filename),
                data: self.binary.to_vec(),
                executable: true,
            },
            Entry {
                path: format!("{module}/__init__.py"),
                data: init.into_bytes(),
                executable: false,
            },
            Entry {
                path: format!("{module}/_shim.py"),
                data: shim.into_bytes(),
                executable: false,
            },
            Entry {
                path: format!("{dist_info}/METADATA"),
                data: metadata,
                executable: false,
            },
            Entry {
                path: format!("{dist_info}/WHEEL"),
                data: wheel_meta.into_bytes(),
                executable: false,
            },
            Entry {
                path: format!("{dist_info}/entry_points.txt"),
                data: entry_points.into_bytes(),
                executable: false,
            },
            Entry {
                path: format!("{dist_info}/licenses/LICENSE.txt"),
                data: self.license.to_vec(),
                executable: false,
            },
        ];

        // One manifest line per entry, in archive order, then the manifest's
        // own line with empty digest and size (it cannot describe itself).
        let record_path = format!("{dist_info}/RECORD");
        let mut record = String::new();
        for entry in &entries {
            let digest = RecordDigest::compute(&entry.data);
            record.push_str(&format!("{},{digest},{}\n", entry.path, entry.data.len()));
        }
        record.push_str(&format!("{record_path},,\n"));

        // Pass 2: write the archive.
        let modified = zip_timestamp();
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &entries {
            add_entry(&mut writer, &entry.path, &entry.data, entry.executable, modified)?;
        }
        add_entry(&mut writer, &record_path, record.as_bytes(), false, modified)?;
        let buf = writer.finish()?;

        let out = out_dir.join(wheel_filename(self.package, self.version, self.wheel_tag));
        std::fs::write(&out, buf.into_inner())?;
        Ok(out)
    }

    /// Render the metadata block: RFC 822 headers, one blank line, then the
    /// raw markdown description, never escaped or reflowed.
    fn render_metadata(&self) -> Vec<u8> {
        let header = format!(
            "Metadata-Version: 2.4\n\
             Name: {name}\n\
             Version: {version}\n\
             Summary: {name} {binver}, packaged as a Python wheel\n\
             Project-URL: Source, {source}\n\
             Classifier: Programming Language :: Python :: 3\n\
             License-Expression: {license}\n\
             License-File: LICENSE.txt\n\
             Requires-Python: >=3.9\n\
             Keywords: {keywords}\n\
             Description-Content-Type: text/markdown; charset=UTF-8; variant=GFM\n\
             \n",
            name = self.package,
            version = self.version,
            binver = self.binary_version,
            source = self.project.source_url,
            license = self.project.license_expression,
            keywords = self.project.keywords,
        );
        let mut out = header.into_bytes();
        out.extend_from_slice(self.description);
        out
    }
}

fn add_entry(
    writer: &mut zip::ZipWriter<Cursor<Vec<u8>>>,
    path: &str,
    data: &[u8],
    executable: bool,
    modified: zip::DateTime,
) -> Result<(), BuildError> {
    let mode = if executable { 0o755 } else { 0o644 };
    // Stored members with sizes known up front: the writer emits plain
    // zip32 local headers with real sizes and a clear general-purpose flag,
    // never zip64 extras or a trailing data descriptor.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .unix_permissions(mode)
        .last_modified_time(modified)
        .large_file(false);

    writer.start_file(path, options).map_err(|e| BuildError::Entry {
        path: path.to_string(),
        source: e,
    })?;
    writer.write_all(data).map_err(|e| BuildError::Entry {
        path: path.to_string(),
        source: e.into(),
    })?;
    Ok(())
}

/// Generation timestamp for the per-entry modification time, the only
/// input-independent bytes in the archive.
fn zip_timestamp() -> zip::DateTime {
    let now = chrono::Local::now();
    zip::DateTime::from_date_and_time(
        now.year() as u16,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .unwrap_or_default()
}
