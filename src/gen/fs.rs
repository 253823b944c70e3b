use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    source: io::Error,
    message: String,
}

impl Error {
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

macro_rules! err {
    ($io_error:expr, $fmt:expr $(, $path:expr)* $(,)?) => {
        Err(Error {
            source: $io_error,
            message: format!($fmt $(, $path.display())*),
        })
    }
}

pub(crate) fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) => err!(e, "Failed to read file `{}`", path),
    }
}

pub(crate) fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(string) => Ok(string),
        Err(e) => err!(e, "Failed to read file `{}`", path),
    }
}

/// Paths of the regular files directly inside `path` with the given
/// extension, sorted by file name.
pub(crate) fn read_dir_with_extension(path: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => return err!(e, "Failed to read directory `{}`", path),
    };
    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return err!(e, "Failed to read directory `{}`", path),
        };
        let file = entry.path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == extension) {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}
