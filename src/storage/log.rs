//! Page Log
//!
//! The single backing file: an append-only run of encoded pages, each followed
//! by its own length.
//!
//! ## Responsibilities
//! - Create, reopen, rename and delete the backing file
//! - Append encoded pages (bytes, then u32 LE length, then flush)
//! - Walk pages from the end of the file back to the start (newest first)
//!
//! Reading backward only needs the trailing length of each record, so there is
//! no header or index to keep in sync.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::Codec;
use crate::error::{PageKvError, Result};

use super::Page;

/// Size of the trailing length that follows every page
pub const LENGTH_PREFIX_SIZE: u64 = 4;

/// What a scan visitor wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Exclusive handle on the page log file
#[derive(Debug)]
pub struct PageLog {
    path: PathBuf,
    file: File,
    /// fsync after every append
    sync_on_append: bool,
}

impl PageLog {
    /// Create an empty log at `path`, discarding whatever was there
    pub fn create(path: &Path, sync_on_append: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        tracing::debug!(path = %path.display(), "created page log");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_on_append,
        })
    }

    /// Open an existing log without modifying it
    pub fn open(path: &Path, sync_on_append: bool) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        tracing::debug!(
            path = %path.display(),
            bytes = file.metadata()?.len(),
            "opened page log"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sync_on_append,
        })
    }

    /// Whether a log file exists at `path`
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Append one encoded page and its trailing length.
    ///
    /// Returns the offset the page bytes start at.
    pub fn append(&mut self, page_bytes: &[u8]) -> Result<u64> {
        let length = u32::try_from(page_bytes.len()).map_err(|_| {
            PageKvError::Storage(format!(
                "page of {} bytes exceeds the u32 length prefix",
                page_bytes.len()
            ))
        })?;

        let offset = self.file.seek(SeekFrom::End(0))?;
        if let Err(e) = self.write_record(page_bytes, length) {
            // Drop the partial record so the next append is not stranded
            // behind a torn tail
            if let Err(truncate) = self.file.set_len(offset) {
                tracing::error!(offset, error = %truncate, "failed to drop partial page");
            }
            return Err(e);
        }

        tracing::debug!(offset, length, "appended page");

        Ok(offset)
    }

    fn write_record(&mut self, page_bytes: &[u8], length: u32) -> Result<()> {
        self.file.write_all(page_bytes)?;
        self.file.write_all(&length.to_le_bytes())?;
        self.file.flush()?;
        if self.sync_on_append {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Walk raw page records from newest to oldest.
    ///
    /// A trailing length that does not fit in the bytes before it means the
    /// tail is torn; the walk stops there as if nothing older existed.
    pub fn scan_records<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<ScanControl>,
    {
        let mut end = self.file.seek(SeekFrom::End(0))?;

        while end > LENGTH_PREFIX_SIZE {
            let body_end = end - LENGTH_PREFIX_SIZE;
            self.file.seek(SeekFrom::Start(body_end))?;
            let mut prefix = [0u8; LENGTH_PREFIX_SIZE as usize];
            self.file.read_exact(&mut prefix)?;
            let length = u64::from(u32::from_le_bytes(prefix));

            if length > body_end {
                tracing::warn!(
                    path = %self.path.display(),
                    offset = body_end,
                    length,
                    "page length runs past start of file, ignoring remainder"
                );
                return Ok(());
            }

            let start = body_end - length;
            self.file.seek(SeekFrom::Start(start))?;
            let mut record = vec![0u8; length as usize];
            self.file.read_exact(&mut record)?;

            if visit(&record)? == ScanControl::Stop {
                return Ok(());
            }
            end = start;
        }

        if end > 0 {
            tracing::warn!(
                path = %self.path.display(),
                bytes = end,
                "stray bytes at start of page log"
            );
        }

        Ok(())
    }

    /// Walk decoded pages from newest to oldest
    pub fn scan_pages<C, F>(&mut self, codec: &C, mut visit: F) -> Result<()>
    where
        C: Codec,
        F: FnMut(Page) -> Result<ScanControl>,
    {
        self.scan_records(|record| visit(Page::decode(record, codec)?))
    }

    /// Count page records without decoding them
    pub fn page_count(&mut self) -> Result<usize> {
        let mut pages = 0;
        self.scan_records(|_| {
            pages += 1;
            Ok(ScanControl::Continue)
        })?;
        Ok(pages)
    }

    /// Force buffered data to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Move the backing file to `to`, keeping the open handle.
    ///
    /// Anything already at `to` is replaced. On error the log still points at
    /// its old path.
    pub fn rename_to(&mut self, to: &Path) -> Result<()> {
        self.sync()?;

        if to.exists() {
            tracing::warn!(path = %to.display(), "replacing leftover file");
            fs::remove_file(to)?;
        }
        fs::rename(&self.path, to)?;

        tracing::debug!(from = %self.path.display(), to = %to.display(), "moved page log");
        self.path = to.to_path_buf();
        Ok(())
    }

    /// Close and delete the backing file
    pub fn delete(self) -> Result<()> {
        let PageLog { path, file, .. } = self;
        drop(file);
        fs::remove_file(&path)?;
        tracing::debug!(path = %path.display(), "deleted page log");
        Ok(())
    }
}
