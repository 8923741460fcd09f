//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file.
/// The temp file name carries the process id and a per-process counter so
/// concurrent writers inside one process never share a temp file.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    let written = temp_file
        .write_all(content)
        .and_then(|_| temp_file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(&native_path, e)
    })?;

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read a whole file, refusing anything larger than `max` bytes.
///
/// The size check happens on the open handle's metadata so a file swapped
/// between stat and read cannot slip past the limit.
pub fn read_bytes_limited(path: &NormalizedPath, max: u64) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    let file = File::open(&native_path).map_err(|e| Error::io(&native_path, e))?;
    let size = file
        .metadata()
        .map_err(|e| Error::io(&native_path, e))?
        .len();
    if size > max {
        return Err(Error::FileTooLarge {
            path: native_path,
            size,
            max,
        });
    }

    let mut content = Vec::with_capacity(size as usize);
    file.take(max + 1)
        .read_to_end(&mut content)
        .map_err(|e| Error::io(&native_path, e))?;
    if content.len() as u64 > max {
        return Err(Error::FileTooLarge {
            path: native_path,
            size: content.len() as u64,
            max,
        });
    }
    Ok(content)
}
