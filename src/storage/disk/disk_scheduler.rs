use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, warn};

use crate::common::{new_page_buf, PageBuf, PageId, PinbaseError, Result, PAGE_SIZE};

use super::PageFile;

/// A block I/O request handled by the scheduler's worker thread.
/// Each variant that expects an answer carries its own reply channel.
pub enum DiskRequest {
    Read {
        page_id: PageId,
        reply: Sender<Result<PageBuf>>,
    },
    Write {
        page_id: PageId,
        data: PageBuf,
        reply: Sender<Result<()>>,
    },
    EnsureCapacity {
        num_pages: i32,
        reply: Sender<Result<()>>,
    },
    TotalPages {
        reply: Sender<i32>,
    },
}

/// DiskScheduler runs a background worker thread that exclusively owns one
/// `PageFile` and executes requests from a queue in arrival order. Every public
/// method schedules one request and blocks until the worker answers.
pub struct DiskScheduler {
    request_sender: Option<Sender<DiskRequest>>,
    worker_handle: Option<JoinHandle<Result<()>>>,
}

impl DiskScheduler {
    /// Hands `page_file` to a freshly spawned worker thread.
    pub fn new(page_file: PageFile) -> Result<Self> {
        let (sender, receiver) = unbounded::<DiskRequest>();
        let name = format!("pinbase-io-{}", page_file.path().display());

        let worker_handle = thread::Builder::new()
            .name(name)
            .spawn(move || Self::start_worker_thread(page_file, receiver))?;

        Ok(Self {
            request_sender: Some(sender),
            worker_handle: Some(worker_handle),
        })
    }

    /// Queues a request for the worker.
    pub fn schedule(&self, request: DiskRequest) -> Result<()> {
        let sender = self
            .request_sender
            .as_ref()
            .ok_or(PinbaseError::InvalidHandle)?;
        sender
            .send(request)
            .map_err(|e| PinbaseError::DiskScheduler(format!("Failed to schedule request: {}", e)))
    }

    /// Reads a page and waits for its contents.
    pub fn schedule_read_sync(&self, page_id: PageId) -> Result<PageBuf> {
        let (tx, rx) = bounded(1);
        self.schedule(DiskRequest::Read { page_id, reply: tx })?;
        rx.recv().map_err(completion_error)?
    }

    /// Writes a copy of `data` to `page_id` and waits for completion.
    pub fn schedule_write_sync(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let mut buf = new_page_buf();
        buf.copy_from_slice(data);

        let (tx, rx) = bounded(1);
        self.schedule(DiskRequest::Write {
            page_id,
            data: buf,
            reply: tx,
        })?;
        rx.recv().map_err(completion_error)?
    }

    /// Grows the file to at least `num_pages` pages and waits for completion.
    pub fn schedule_ensure_capacity_sync(&self, num_pages: i32) -> Result<()> {
        let (tx, rx) = bounded(1);
        self.schedule(DiskRequest::EnsureCapacity {
            num_pages,
            reply: tx,
        })?;
        rx.recv().map_err(completion_error)?
    }

    pub fn total_pages(&self) -> Result<i32> {
        let (tx, rx) = bounded(1);
        self.schedule(DiskRequest::TotalPages { reply: tx })?;
        rx.recv().map_err(completion_error)
    }

    /// Closes the queue, lets the worker drain it, and returns the result of
    /// closing the file.
    pub fn shutdown(&mut self) -> Result<()> {
        // Dropping the only sender disconnects the channel and ends the worker loop.
        self.request_sender.take();

        match self.worker_handle.take() {
            Some(handle) => handle.join().map_err(|_| {
                PinbaseError::DiskScheduler("Disk worker thread panicked".to_string())
            })?,
            None => Ok(()),
        }
    }

    /// The background worker: processes requests until every sender is gone.
    fn start_worker_thread(mut page_file: PageFile, receiver: Receiver<DiskRequest>) -> Result<()> {
        debug!("disk worker started for {}", page_file.path().display());

        for request in receiver.iter() {
            Self::process_request(&mut page_file, request);
        }

        debug!("disk worker closing {}", page_file.path().display());
        page_file.close()
    }

    fn process_request(page_file: &mut PageFile, request: DiskRequest) {
        // A dropped reply receiver means the caller gave up waiting; nothing to do.
        match request {
            DiskRequest::Read { page_id, reply } => {
                let mut buf = new_page_buf();
                let result = page_file.read_block(page_id, &mut buf).map(|_| buf);
                let _ = reply.send(result);
            }
            DiskRequest::Write {
                page_id,
                data,
                reply,
            } => {
                let _ = reply.send(page_file.write_block(page_id, &data));
            }
            DiskRequest::EnsureCapacity { num_pages, reply } => {
                let _ = reply.send(page_file.ensure_capacity(num_pages));
            }
            DiskRequest::TotalPages { reply } => {
                let _ = reply.send(page_file.total_pages());
            }
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("disk scheduler shutdown failed: {}", e);
        }
    }
}

fn completion_error<E: std::fmt::Display>(e: E) -> PinbaseError {
    PinbaseError::DiskScheduler(format!("Failed to receive completion: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_scheduler(dir: &TempDir) -> DiskScheduler {
        let path = dir.path().join("sched.bin");
        PageFile::create(&path).unwrap();
        DiskScheduler::new(PageFile::open(&path).unwrap()).unwrap()
    }

    #[test]
    fn test_disk_scheduler_read_write() {
        let dir = TempDir::new().unwrap();
        let scheduler = create_scheduler(&dir);

        let mut write_data = [0u8; PAGE_SIZE];
        write_data[0] = 42;
        write_data[100] = 255;
        scheduler
            .schedule_write_sync(PageId::new(0), &write_data)
            .unwrap();

        let read_data = scheduler.schedule_read_sync(PageId::new(0)).unwrap();
        assert_eq!(read_data[0], 42);
        assert_eq!(read_data[100], 255);
    }

    #[test]
    fn test_disk_scheduler_multiple_requests() {
        let dir = TempDir::new().unwrap();
        let scheduler = create_scheduler(&dir);

        scheduler.schedule_ensure_capacity_sync(3).unwrap();
        assert_eq!(scheduler.total_pages().unwrap(), 3);

        scheduler
            .schedule_write_sync(PageId::new(1), &[1u8; PAGE_SIZE])
            .unwrap();
        scheduler
            .schedule_write_sync(PageId::new(2), &[2u8; PAGE_SIZE])
            .unwrap();

        assert_eq!(scheduler.schedule_read_sync(PageId::new(1)).unwrap()[0], 1);
        assert_eq!(scheduler.schedule_read_sync(PageId::new(2)).unwrap()[0], 2);
    }

    #[test]
    fn test_read_error_is_forwarded() {
        let dir = TempDir::new().unwrap();
        let scheduler = create_scheduler(&dir);
        assert!(matches!(
            scheduler.schedule_read_sync(PageId::new(5)),
            Err(PinbaseError::InvalidPage(_))
        ));
    }

    #[test]
    fn test_requests_after_shutdown_fail() {
        let dir = TempDir::new().unwrap();
        let mut scheduler = create_scheduler(&dir);
        scheduler.shutdown().unwrap();
        assert!(matches!(
            scheduler.schedule_read_sync(PageId::new(0)),
            Err(PinbaseError::InvalidHandle)
        ));
        // Second shutdown is a no-op
        scheduler.shutdown().unwrap();
    }
}
