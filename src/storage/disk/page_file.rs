use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::common::{PageId, PinbaseError, Result, PAGE_SIZE};

/// PageFile reads and writes fixed-size blocks of a single file, addressed by
/// zero-based page number. It remembers the position of the last block read or
/// written so that the relative readers can walk the file.
pub struct PageFile {
    file: File,
    path: PathBuf,
    /// Number of whole pages currently in the file
    total_pages: i32,
    /// Page number of the last block read or written
    cur_pos: i32,
}

impl PageFile {
    /// Creates (or truncates) a page file holding one zero-filled page.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PinbaseError::FileNotFound(display(path.as_ref())),
                _ => PinbaseError::Io(e),
            })?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.sync_all()?;
        debug!("created page file {}", path.as_ref().display());
        Ok(())
    }

    /// Opens an existing page file. The current position starts at page 0.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PinbaseError::FileNotFound(display(path)),
                _ => PinbaseError::Io(e),
            })?;

        let file_size = file.metadata()?.len();
        let total_pages = (file_size / PAGE_SIZE as u64) as i32;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            total_pages,
            cur_pos: 0,
        })
    }

    /// Flushes and closes the file.
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    /// Removes a page file from disk.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        fs::remove_file(path.as_ref()).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PinbaseError::FileNotFound(display(path.as_ref())),
            _ => PinbaseError::Io(e),
        })
    }

    /// Reads page `page_id` into `data`.
    /// Fails with `InvalidPage` for negative pages, pages past the end of the
    /// file, or a short read.
    pub fn read_block(&mut self, page_id: PageId, data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() || page_id.as_i32() >= self.total_pages {
            return Err(PinbaseError::InvalidPage(page_id));
        }

        self.file.seek(SeekFrom::Start(page_id.offset()))?;
        self.file.read_exact(data).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => PinbaseError::InvalidPage(page_id),
            _ => PinbaseError::Io(e),
        })?;

        self.cur_pos = page_id.as_i32();
        Ok(())
    }

    /// Writes `data` to page `page_id`, growing the file with zero pages when
    /// the page lies past the current end.
    pub fn write_block(&mut self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        if !page_id.is_valid() {
            return Err(PinbaseError::InvalidPage(page_id));
        }
        let needed = page_id
            .as_i32()
            .checked_add(1)
            .ok_or(PinbaseError::InvalidPage(page_id))?;
        self.ensure_capacity(needed)?;

        self.file.seek(SeekFrom::Start(page_id.offset()))?;
        self.file.write_all(data)?;
        self.file.flush()?;

        self.cur_pos = page_id.as_i32();
        Ok(())
    }

    /// Writes `data` at the current position.
    pub fn write_current_block(&mut self, data: &[u8; PAGE_SIZE]) -> Result<()> {
        self.write_block(PageId::new(self.cur_pos), data)
    }

    /// Appends one zero-filled page to the end of the file.
    pub fn append_empty_block(&mut self) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(PageId::new(self.total_pages).offset()))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.flush()?;
        self.total_pages += 1;
        Ok(())
    }

    /// Grows the file with zero pages until it holds at least `num_pages`.
    pub fn ensure_capacity(&mut self, num_pages: i32) -> Result<()> {
        if num_pages > self.total_pages {
            debug!(
                "growing {} from {} to {} pages",
                self.path.display(),
                self.total_pages,
                num_pages
            );
        }
        while self.total_pages < num_pages {
            self.append_empty_block()?;
        }
        Ok(())
    }

    pub fn read_first_block(&mut self, data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(PageId::new(0), data)
    }

    pub fn read_previous_block(&mut self, data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(PageId::new(self.cur_pos - 1), data)
    }

    pub fn read_current_block(&mut self, data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(PageId::new(self.cur_pos), data)
    }

    pub fn read_next_block(&mut self, data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(PageId::new(self.cur_pos + 1), data)
    }

    pub fn read_last_block(&mut self, data: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.read_block(PageId::new(self.total_pages - 1), data)
    }

    pub fn total_pages(&self) -> i32 {
        self.total_pages
    }

    pub fn cur_pos(&self) -> i32 {
        self.cur_pos
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
