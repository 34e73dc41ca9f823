//! Log file that runs out of space on demand

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::append::LogFile;

pub(crate) const UNLIMITED: usize = usize::MAX;

/// Writes at most `budget` more bytes, then fails like a full disk
pub(crate) struct FlakyFile {
    file: File,
    budget: Arc<AtomicUsize>,
    can_truncate: bool,
}

impl FlakyFile {
    pub(crate) fn open(path: &Path, budget: Arc<AtomicUsize>, can_truncate: bool) -> Box<dyn LogFile> {
        let file = OpenOptions::new().create(true).append(true).open(path).unwrap();
        Box::new(Self {
            file,
            budget,
            can_truncate,
        })
    }
}

impl Write for FlakyFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let left = self.budget.load(Ordering::SeqCst);
        if left == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
        }
        let n = self.file.write(&buf[..buf.len().min(left)])?;
        if left != UNLIMITED {
            self.budget.fetch_sub(n, Ordering::SeqCst);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl LogFile for FlakyFile {
    fn size(&self) -> io::Result<u64> {
        self.file.size()
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        if self.can_truncate {
            self.file.truncate_to(len)
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "truncate refused"))
        }
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
