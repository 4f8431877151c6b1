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

//! Generic chunked push-side streaming framework. [`Encryptor`] owns an
//! input staging buffer exactly one chunk wide and drives `C` one block at
//! a time as that buffer fills, forwarding ciphertext to any
//! `std::io::Write` sink.

use std::io::Write;

use crate::helpers::generate_random_bytes;
use crate::trng::random32;
use crate::{CipherError, Result};

/// A block cipher capable of driving the push side of the streaming
/// framework. `CHUNK_SIZE` is the fixed block width this cipher consumes
/// and produces per call to [`EncryptCipher::encrypt_chunk`].
pub trait EncryptCipher {
    const CHUNK_SIZE: usize;

    /// Re-initializes chaining/round-key state from the cipher's current
    /// key material. Called once when the instance is opened.
    fn reset_engine(&mut self);

    /// Encrypts exactly one `CHUNK_SIZE`-byte block.
    fn encrypt_chunk(&mut self, input: &[u8], output: &mut [u8]);
}

/// Streaming, chunked encryption front-end generic over any [`EncryptCipher`]
/// and any downstream `std::io::Write` sink.
pub struct Encryptor<C: EncryptCipher, W: Write> {
    cipher: C,
    sink: Option<W>,

    input_buffer: Vec<u8>,
    input_index: usize,

    bytes_in: u64,
    bytes_out: u64,

    open: bool,
}

impl<C: EncryptCipher, W: Write> Encryptor<C, W> {
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            sink: None,
            input_buffer: Vec::new(),
            input_index: 0,
            bytes_in: u64::MAX,
            bytes_out: u64::MAX,
            open: false,
        }
    }

    pub fn set_sink(&mut self, sink: W) {
        self.sink = Some(sink);
    }

    /// Returns a reference to the attached sink, if any.
    pub fn sink(&self) -> Option<&W> {
        self.sink.as_ref()
    }

    pub fn cipher_mut(&mut self) -> &mut C {
        &mut self.cipher
    }

    /// Resets the cipher engine and byte counters, readying the instance for
    /// a fresh stream.
    pub fn open(&mut self) {
        self.cipher.reset_engine();
        self.input_buffer = vec![0u8; C::CHUNK_SIZE];
        self.input_index = 0;
        self.bytes_in = 0;
        self.bytes_out = 0;
        self.open = true;
    }

    pub fn bytes_processed_in(&self) -> u64 {
        self.bytes_in
    }

    pub fn bytes_processed_out(&self) -> u64 {
        self.bytes_out
    }

    /// One-shot encryption of an entire buffer, applying PKCS#7 padding to
    /// any trailing partial block. No padding block is appended when
    /// `data.len()` is already chunk-aligned.
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let chunk = C::CHUNK_SIZE;

        self.cipher.reset_engine();

        let mut result = Vec::with_capacity(data.len() + chunk);
        let mut output = vec![0u8; chunk];

        let mut remaining = data;
        while remaining.len() >= chunk {
            self.cipher.encrypt_chunk(&remaining[..chunk], &mut output);
            result.extend_from_slice(&output);
            remaining = &remaining[chunk..];
        }

        if !remaining.is_empty() {
            let pad_value = (chunk - remaining.len()) as u8;
            let mut tail = vec![pad_value; chunk];
            tail[..remaining.len()].copy_from_slice(remaining);

            self.cipher.encrypt_chunk(&tail, &mut output);
            result.extend_from_slice(&output);
        }

        result
    }

    /// Pushes `data` into the staging buffer, emitting one ciphertext chunk
    /// to the sink for every input chunk completed.
    pub fn write(&mut self, mut data: &[u8]) -> Result<usize> {
        debug_assert!(self.open, "write() called before open()");

        let chunk = C::CHUNK_SIZE;
        let mut written = 0usize;
        let mut output = vec![0u8; chunk];

        while !data.is_empty() {
            let space = chunk - self.input_index;
            let take = space.min(data.len());

            self.input_buffer[self.input_index..self.input_index + take]
                .copy_from_slice(&data[..take]);
            self.input_index += take;
            data = &data[take..];
            written += take;

            if self.input_index == chunk {
                self.cipher.encrypt_chunk(&self.input_buffer, &mut output);
                self.emit(&output)?;
                self.input_index = 0;
            }
        }

        Ok(written)
    }

    /// Emits any partial block currently staged, PKCS#7-padded. Does
    /// nothing (and does not touch the sink) if no bytes are staged.
    pub fn flush(&mut self) -> Result<()> {
        if self.input_index == 0 {
            return Ok(());
        }

        let chunk = C::CHUNK_SIZE;
        let pad_value = (chunk - self.input_index) as u8;
        for slot in &mut self.input_buffer[self.input_index..] {
            *slot = pad_value;
        }

        let mut output = vec![0u8; chunk];
        self.cipher.encrypt_chunk(&self.input_buffer, &mut output);
        self.input_index = 0;

        self.emit(&output)
    }

    /// As [`Encryptor::flush`], then appends a uniform-random trailing pad
    /// of `rand() mod chunkSize` bytes directly to the sink, unencrypted.
    pub fn flush_and_pad(&mut self) -> Result<()> {
        self.flush()?;

        let chunk = C::CHUNK_SIZE;
        let pad_bytes = (random32() as usize % chunk).max(0);
        let pad = generate_random_bytes(pad_bytes);

        let sink = self.sink.as_mut().ok_or(CipherError::NoSink)?;
        let n = sink.write(&pad)?;
        if n != pad.len() {
            return Err(CipherError::ShortWrite);
        }

        self.bytes_out += pad.len() as u64;
        Ok(())
    }

    fn emit(&mut self, chunk: &[u8]) -> Result<()> {
        let sink = self.sink.as_mut().ok_or(CipherError::NoSink)?;
        let n = sink.write(chunk)?;
        if n != chunk.len() {
            return Err(CipherError::ShortWrite);
        }

        self.bytes_in += chunk.len() as u64;
        self.bytes_out += chunk.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtea::XteaEncryptCipher;

    #[test]
    fn write_emits_whole_chunks_only() {
        let mut enc = Encryptor::<XteaEncryptCipher, Vec<u8>>::new(XteaEncryptCipher::with_key([1; 16]));
        enc.set_sink(Vec::new());
        enc.open();

        enc.write(&[0; 5]).unwrap();
        assert_eq!(enc.sink.as_ref().unwrap().len(), 0);

        enc.write(&[0; 3]).unwrap();
        assert_eq!(enc.sink.as_ref().unwrap().len(), 8);
    }

    #[test]
    fn flush_on_empty_buffer_is_a_no_op() {
        let mut enc = Encryptor::<XteaEncryptCipher, Vec<u8>>::new(XteaEncryptCipher::with_key([1; 16]));
        enc.set_sink(Vec::new());
        enc.open();

        enc.flush().unwrap();
        assert_eq!(enc.sink.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn flush_pads_partial_block() {
        let mut enc = Encryptor::<XteaEncryptCipher, Vec<u8>>::new(XteaEncryptCipher::with_key([1; 16]));
        enc.set_sink(Vec::new());
        enc.open();

        enc.write(&[1, 2, 3]).unwrap();
        enc.flush().unwrap();
        assert_eq!(enc.sink.as_ref().unwrap().len(), 8);
    }

    #[test]
    fn one_shot_encrypt_omits_padding_block_for_aligned_input() {
        let mut enc = Encryptor::<XteaEncryptCipher, Vec<u8>>::new(XteaEncryptCipher::with_key([2; 16]));
        let out = enc.encrypt(&[0u8; 8]);
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn one_shot_encrypt_pads_partial_block() {
        let mut enc = Encryptor::<XteaEncryptCipher, Vec<u8>>::new(XteaEncryptCipher::with_key([2; 16]));
        let out = enc.encrypt(&[0u8; 3]);
        assert_eq!(out.len(), 8);
    }
}
