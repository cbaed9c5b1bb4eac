//! Chapter archives.
//!
//! Packs the files directly inside a staging directory into one flat zip at
//! the job's archive path. Entries are named by base filename and written in
//! lexicographic order, which for staged pages is reading order. The archive
//! is written in place (no temp + rename); a failure may leave a partial file
//! that the caller does not record as complete.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::CompressionMethod;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
    move |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Regular files directly inside `dir`, sorted by file name. Subdirectories are skipped.
fn staged_files(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_at(dir))? {
        let entry = entry.map_err(io_at(dir))?;
        let file_type = entry.file_type().map_err(io_at(dir))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Zips every file directly inside `staging` into `archive_path`. Returns the entry count.
///
/// Blocking; call from `spawn_blocking` in async code.
pub fn pack_directory(staging: &Path, archive_path: &Path) -> Result<usize, ArchiveError> {
    let files = staged_files(staging)?;

    if let Some(parent) = archive_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_at(parent))?;
        }
    }
    let out = File::create(archive_path).map_err(io_at(archive_path))?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(out));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name, options)?;
        let mut input = File::open(path).map_err(io_at(path))?;
        io::copy(&mut input, &mut zip).map_err(io_at(path))?;
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer).map_err(io_at(archive_path))?;
    Ok(files.len())
}
