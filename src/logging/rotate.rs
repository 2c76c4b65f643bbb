//! Size-rotated log file.
//!
//! The active file keeps its name; on rotation it becomes `<name>.1`, the
//! previous `<name>.1` becomes `<name>.2`, and so on up to the backup count.
//! The oldest backup is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: u32,
    file: File,
    size: u64,
}

impl RotatingFile {
    /// Open `path` for appending. The current file size counts toward
    /// `max_bytes`.
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: u32) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backup_count,
            file,
            size,
        })
    }

    /// Bytes in the active file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Path of the `index`-th backup, 1 being the most recent.
    pub fn backup_path(&self, index: u32) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// A write that would push a non-empty file past `max_bytes` rotates
    /// first. A single oversized write still lands in one file.
    fn should_rotate(&self, incoming: usize) -> bool {
        self.size > 0 && self.size + incoming as u64 > self.max_bytes
    }

    /// If the fresh file cannot be created, the renamed file is moved back
    /// so the open handle and `size` still describe the active path.
    pub fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count > 0 {
            let oldest = self.backup_path(self.backup_count);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.backup_count).rev() {
                let source = self.backup_path(index);
                if source.exists() {
                    fs::rename(&source, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }

        let reopened = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path);
        match reopened {
            Ok(file) => {
                self.file = file;
                self.size = 0;
                Ok(())
            }
            Err(e) => {
                if self.backup_count > 0 {
                    let _ = fs::rename(self.backup_path(1), &self.path);
                }
                Err(e)
            }
        }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
