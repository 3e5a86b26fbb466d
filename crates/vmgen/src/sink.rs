//! Destinations for rendered artifacts.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Writes rendered bytes to a path, creating or truncating it.
pub trait FileSink {
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;
}

impl<S: FileSink + ?Sized> FileSink for &S {
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        (**self).write(path, contents, mode)
    }
}

/// The local filesystem.
///
/// On Unix `mode` applies when the file is created (subject to the umask);
/// an existing file keeps its permissions and is truncated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl FileSink for FsSink {
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}
