// crypto_core is a streaming block-cipher and integrity-primitive library.
// Copyright (C) 2024  Himbeer <himbeerserverde@gmail.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Upstream byte-source contract consumed by [`crate::decryptor::Decryptor`].
//!
//! The downstream sink side has no bespoke trait: any `std::io::Write` plays
//! that role directly, since the encryptor only ever pushes bytes forward.
//! The upstream side needs one extra thing a plain `std::io::Read` doesn't
//! give us: a way to ask how many bytes are *already* sitting in the source
//! without blocking, so the decryptor only ever pulls what it knows is
//! there.

use std::fs::File;
use std::io::{self, Read};

/// A source of bytes that can report how much is immediately available
/// before being asked to hand any of it over.
pub trait ByteSource {
    /// Returns the number of bytes that can be read right now without
    /// blocking.
    fn bytes_available(&mut self) -> usize;

    /// Reads up to `buf.len()` bytes. Implementations should only be asked
    /// to read at most [`ByteSource::bytes_available`] bytes at a time.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// An in-memory, `feed`-driven [`ByteSource`] useful for tests and one-shot
/// decoding where the entire ciphertext is already resident.
#[derive(Default)]
pub struct MemorySource {
    buffer: Vec<u8>,
    position: usize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            position: 0,
        }
    }

    /// Appends more bytes to the source, as if they had just arrived.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }
}

impl ByteSource for MemorySource {
    fn bytes_available(&mut self) -> usize {
        self.buffer.len() - self.position
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.bytes_available();
        let to_copy = buf.len().min(available);
        buf[..to_copy].copy_from_slice(&self.buffer[self.position..self.position + to_copy]);
        self.position += to_copy;
        Ok(to_copy)
    }
}

/// A [`ByteSource`] backed by a plain file, tracking remaining length from
/// the file's metadata rather than relying on OS-level readiness
/// notification.
pub struct FileSource {
    file: File,
    remaining: u64,
}

impl FileSource {
    pub fn new(file: File) -> io::Result<Self> {
        let remaining = file.metadata()?.len();
        Ok(Self { file, remaining })
    }
}

impl ByteSource for FileSource {
    fn bytes_available(&mut self) -> usize {
        self.remaining.min(usize::MAX as u64) as usize
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        self.remaining = self.remaining.saturating_sub(n as u64);
        Ok(n)
    }
}
