use super::sniff;

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::{Path, PathBuf};

use mime::Mime;
use tempfile::NamedTempFile;

/// A decoded form field.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FieldStorage {
    name: String,
    value: String,
}

impl FieldStorage {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        FieldStorage {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for FieldStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A decoded file, backed by a file on disk.
///
/// The content is written to a temporary file on construction. That file is
/// removed when the storage is closed, saved elsewhere, or dropped.
#[derive(Debug)]
pub struct FileStorage {
    name: Option<String>,
    filename: Option<String>,
    mime_type: Mime,
    len: u64,
    backing: Backing,
}

#[derive(Debug)]
enum Backing {
    Temp(NamedTempFile),
    Saved { file: File, path: PathBuf },
    Closed,
}

impl FileStorage {
    /// Write `content` to a new temporary file.
    ///
    /// The MIME type is sniffed from the content when none is given.
    pub fn new(
        name: Option<String>,
        content: &[u8],
        filename: Option<String>,
        mime_type: Option<Mime>,
        temp_dir: Option<&Path>,
    ) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("asgate_");

        let mut file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(content)?;
        file.flush()?;

        Ok(FileStorage {
            name,
            filename,
            mime_type: mime_type.unwrap_or_else(|| sniff::sniff(content)),
            len: content.len() as u64,
            backing: Backing::Temp(file),
        })
    }

    /// The form field this file was submitted under.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn mime_type(&self) -> &Mime {
        &self.mime_type
    }

    /// Number of bytes read from the request.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.backing, Backing::Closed)
    }

    /// Path of the current backing file.
    pub fn filepath(&self) -> Option<&Path> {
        match &self.backing {
            Backing::Temp(file) => Some(file.path()),
            Backing::Saved { path, .. } => Some(path),
            Backing::Closed => None,
        }
    }

    /// Read the full content of the backing file, from the start.
    pub fn load(&self) -> io::Result<Vec<u8>> {
        let mut file: &File = match &self.backing {
            Backing::Temp(file) => file.as_file(),
            Backing::Saved { file, .. } => file,
            Backing::Closed => return Err(closed()),
        };

        file.seek(SeekFrom::Start(0))?;
        let mut content = Vec::with_capacity(self.len as usize);
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Copy the content to `path` and make that file the backing handle.
    ///
    /// The temporary file is closed and removed. The filename becomes the last
    /// component of `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let content = self.load()?;
        let path = path.as_ref();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&content)?;
        file.flush()?;

        let path = fs::canonicalize(path)?;
        self.filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        match mem::replace(&mut self.backing, Backing::Saved { file, path }) {
            Backing::Temp(temp) => temp.close(),
            _ => Ok(()),
        }
    }

    /// Release the backing file. Closing twice is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        match mem::replace(&mut self.backing, Backing::Closed) {
            Backing::Temp(temp) => temp.close(),
            Backing::Saved { .. } | Backing::Closed => Ok(()),
        }
    }
}

impl fmt::Display for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileStorage({}, {:?})", self.mime_type, self.filename)
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "file storage is closed")
}
