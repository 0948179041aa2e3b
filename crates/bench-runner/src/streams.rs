//! File-backed stand-ins for an emulated process's stdin and stdout.
//!
//! The steps backend emulates the target binary and routes its standard
//! streams through these objects. Reads and writes never touch the kernel:
//! the input is loaded once on open and the output stays in memory until
//! [`VirtualStdout::save_to_file`] is called.

use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub const STDIN_FILENO: i32 = 0;
pub const STDOUT_FILENO: i32 = 1;

/// The minimal file-object surface an emulator probes on a guest descriptor.
pub trait GuestStream {
    fn fstat(&self) -> io::Result<Metadata>;

    fn fileno(&self) -> i32;

    /// Releases the underlying descriptor.
    fn close(&mut self) -> io::Result<()>;
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "stream is closed")
}

#[derive(Debug)]
pub struct VirtualStdin {
    file: Option<File>,
    buf: Vec<u8>,
    pos: usize,
}

impl VirtualStdin {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let buf = fs::read(path)?;
        Ok(Self {
            file: Some(file),
            buf,
            pos: 0,
        })
    }

    /// Returns up to `size` bytes from the front of the buffer and consumes
    /// them. Past the end this yields an empty vector.
    pub fn read_chunk(&mut self, size: usize) -> Vec<u8> {
        let end = self.pos.saturating_add(size).min(self.buf.len());
        let chunk = self.buf[self.pos..end].to_vec();
        self.pos = end;
        chunk
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Seeking is not supported; the cursor only moves forward.
    pub fn lseek(&mut self, _offset: i64, _whence: i32) {}
}

impl Read for VirtualStdin {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let chunk = self.read_chunk(out.len());
        out[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl GuestStream for VirtualStdin {
    fn fstat(&self) -> io::Result<Metadata> {
        self.file.as_ref().ok_or_else(closed)?.metadata()
    }

    fn fileno(&self) -> i32 {
        STDIN_FILENO
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take().map(drop).ok_or_else(closed)
    }
}

#[derive(Debug)]
pub struct VirtualStdout {
    file: Option<File>,
    path: PathBuf,
    buf: Vec<u8>,
}

impl VirtualStdout {
    /// Opens (creating if needed) `path`; written bytes stay buffered.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            buf: Vec::new(),
        })
    }

    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Replaces the file contents with the buffered output as UTF-8 text.
    pub fn save_to_file(&self) -> io::Result<()> {
        let text = std::str::from_utf8(&self.buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}

impl Write for VirtualStdout {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl GuestStream for VirtualStdout {
    fn fstat(&self) -> io::Result<Metadata> {
        self.file.as_ref().ok_or_else(closed)?.metadata()
    }

    fn fileno(&self) -> i32 {
        STDOUT_FILENO
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take().map(drop).ok_or_else(closed)
    }
}
