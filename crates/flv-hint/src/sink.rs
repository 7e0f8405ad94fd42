use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

const SINK_BUFFER_SIZE: usize = 32 * 1024;

/// Buffered sequential file writer with seek-and-backpatch support.
///
/// [`tell`](Self::tell) reports the logical position including bytes
/// still sitting in the buffer; [`seek`](Self::seek) flushes first so a
/// backpatch lands where it should.
pub struct OutputSink {
    file: File,
    buffer: Vec<u8>,
    /// Underlying file offset at the start of the buffer.
    base: u64,
}

impl OutputSink {
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            file: File::create(path)?,
            buffer: Vec::with_capacity(SINK_BUFFER_SIZE),
            base: 0,
        })
    }

    /// Logical write position, counting unflushed bytes.
    pub fn tell(&self) -> u64 {
        self.base + self.buffer.len() as u64
    }

    pub fn seek(&mut self, position: u64) -> io::Result<()> {
        self.flush_buffer()?;
        self.file.seek(SeekFrom::Start(position))?;
        self.base = position;
        Ok(())
    }

    /// Flush and drop the sink. Failing to flush here surfaces as an
    /// error instead of silently losing the buffer tail.
    pub fn finish(mut self) -> io::Result<()> {
        self.flush_buffer()
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.file.write_all(&self.buffer)?;
            self.base += self.buffer.len() as u64;
            self.buffer.clear();
        }
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        if self.buffer.len() + data.len() > SINK_BUFFER_SIZE {
            self.flush_buffer()?;
        }
        if data.len() > SINK_BUFFER_SIZE {
            self.file.write_all(data)?;
            self.base += data.len() as u64;
        } else {
            self.buffer.extend_from_slice(data);
        }
        Ok(())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()
    }
}
