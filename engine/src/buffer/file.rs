use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use super::Buffer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    ReadWrite,
}

impl FileMode {
    fn can_read(self) -> bool {
        matches!(self, FileMode::Read | FileMode::ReadWrite)
    }

    fn can_write(self) -> bool {
        matches!(self, FileMode::Write | FileMode::ReadWrite)
    }
}

/// Buffer reading and writing straight through to a file on disk.
#[derive(Debug)]
pub struct FileBuffer {
    file: File,
    mode: FileMode,
    offset: usize,
    size: usize,
}

impl FileBuffer {
    pub fn open(path: &Path, mode: FileMode) -> io::Result<Self> {
        let file = match mode {
            FileMode::Read => File::open(path)?,
            FileMode::Write => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
            FileMode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?,
        };

        let size = file.metadata()?.len() as usize;

        Ok(Self {
            file,
            mode,
            offset: 0,
            size,
        })
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }
}

impl Buffer for FileBuffer {
    fn read(&mut self, dest: &mut [u8]) -> usize {
        if !self.mode.can_read() || dest.is_empty() {
            return 0;
        }

        let mut total = 0;

        while total < dest.len() {
            match self.file.read(&mut dest[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("File read failed: {e}");
                    break;
                }
            }
        }

        self.offset += total;
        total
    }

    fn write(&mut self, src: &[u8]) -> usize {
        if !self.mode.can_write() || src.is_empty() {
            return 0;
        }

        match self.file.write_all(src) {
            Ok(()) => {
                self.offset += src.len();
                self.size = self.size.max(self.offset);
                src.len()
            }
            Err(e) => {
                log::error!("File write failed: {e}");
                0
            }
        }
    }

    fn seek(&mut self, start: usize, delta: usize) -> usize {
        let target = start + delta;

        if target > self.size && self.mode.can_write() {
            if let Err(e) = self.file.set_len(target as u64) {
                log::error!("Could not extend file to {target} bytes: {e}");
            } else {
                self.size = target;
            }
        }

        match self.file.seek(SeekFrom::Start(target as u64)) {
            Ok(pos) => self.offset = pos as usize,
            Err(e) => log::error!("File seek to {target} failed: {e}"),
        }

        self.offset
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn size(&self) -> usize {
        self.size
    }
}
