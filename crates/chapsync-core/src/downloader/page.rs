//! Single page transfer: GET the page image and stream it into a staging file.

use super::{is_success, HttpClient, TransferError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Page URL on a distribution node: `<base>/data/<hash>/<file>`.
pub fn page_url(base_url: &str, hash: &str, file_name: &str) -> String {
    format!("{}/data/{}/{}", base_url.trim_end_matches('/'), hash, file_name)
}

/// Staging file name for the page at `index` (0-based) out of `total`.
///
/// 1-based, zero-padded to at least three digits (wider when the chapter has
/// 1000+ pages) so lexicographic order equals page order. The source file's
/// extension is kept.
pub fn page_file_name(index: usize, total: usize, source_name: &str) -> String {
    let width = total.to_string().len().max(3);
    let ext = Path::new(source_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{:0width$}{}", index + 1, ext, width = width)
}

/// Downloads `url` into `dest` (created or truncated). Returns bytes written.
///
/// Blocking; call from `spawn_blocking` in async code. A failed transfer may
/// leave a partial file behind; the staging directory owns cleanup.
pub fn fetch_page(client: &HttpClient, url: &str, dest: &Path) -> Result<u64, TransferError> {
    let mut out = BufWriter::new(File::create(dest)?);
    let mut easy = client.easy(url)?;

    let mut written = 0u64;
    let mut write_err: Option<io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| match out.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Some(e) = write_err {
        return Err(TransferError::Io(e));
    }
    performed?;

    let code = easy.response_code()?;
    if !is_success(code) {
        return Err(TransferError::Status(code));
    }

    out.flush()?;
    Ok(written)
}
