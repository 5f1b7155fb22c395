//! JSON persistence for cached documents.

use super::DataError;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

const LOG_TARGET: &str = " cache_doc";

/// Load a document from a file.
///
/// A missing file is reported as [`DataError::CacheMiss`].
pub fn load<T>(path: impl AsRef<Path>, context: impl AsRef<str>) -> Result<T, DataError>
where
    T: for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    let ctx = context.as_ref();
    let should_log = !ctx.is_empty();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if should_log {
                log::debug!(target: LOG_TARGET, "Cache miss for {ctx}");
            }
            return Err(DataError::CacheMiss { path: path.to_path_buf() });
        }
        Err(source) => {
            return Err(DataError::Cache {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader).map_err(|source| DataError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })?;

    if should_log {
        log::debug!(target: LOG_TARGET, "Cache hit for {ctx}");
    }

    Ok(data)
}

/// Save a document to a file, replacing any previous content.
///
/// The document is written to a sibling `.tmp` file and renamed over `path`, so
/// readers see either the previous document or the complete new one.
pub fn save<T>(data: &T, path: impl AsRef<Path>) -> Result<(), DataError>
where
    T: Serialize,
{
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| DataError::Cache {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if let Err(e) = write_document(data, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Cache {
            path: path.to_path_buf(),
            source,
        }
    })?;

    log::debug!(target: LOG_TARGET, "Wrote cache file '{}'", path.display());
    Ok(())
}

fn write_document<T: Serialize>(data: &T, path: &Path) -> Result<(), DataError> {
    let io_err = |source| DataError::Cache {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    // Pretty in debug builds for easier inspection, compact in release
    #[cfg(debug_assertions)]
    let result = serde_json::to_writer_pretty(&mut writer, data);
    #[cfg(not(debug_assertions))]
    let result = serde_json::to_writer(&mut writer, data);

    result.map_err(|source| DataError::CacheFormat {
        path: path.to_path_buf(),
        source,
    })?;

    writer.flush().map_err(io_err)?;
    writer.get_ref().sync_all().map_err(io_err)
}
