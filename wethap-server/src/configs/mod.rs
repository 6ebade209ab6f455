mod schema;
mod settings;
mod storage;

pub use schema::SchemaManager;
pub use settings::{Connection, Database, Logger, Schedule, Server, Settings, Weather};
pub use storage::Storage;

use std::io;
use std::path::{Path, PathBuf};

/// Resolve a configured path against the working directory.
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    Ok(std::env::current_dir()?.join(path))
}
