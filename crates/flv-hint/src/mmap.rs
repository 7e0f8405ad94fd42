use std::fs::File;
use std::io;
use std::path::Path;

/// Read-only whole-file mapping of the input.
///
/// Every byte cursor derived from [`as_slice`](Self::as_slice) borrows
/// from the map, so the map outlives them by construction.
pub struct InputMap {
    inner: memmap2::Mmap,
}

impl InputMap {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let inner = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self { inner })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }
}
