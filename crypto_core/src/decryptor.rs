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

//! Generic chunked pull-side streaming framework, the mirror of
//! [`crate::encryptor::Encryptor`]. [`Decryptor`] accumulates ciphertext
//! from an upstream [`crate::byte_io::ByteSource`], decrypts whole chunks as
//! they become available, and buffers decrypted output for [`Decryptor::read`].

use crate::byte_io::ByteSource;
use crate::{CipherError, Result};

/// A block cipher capable of driving the pull side of the streaming
/// framework.
pub trait DecryptCipher {
    const CHUNK_SIZE: usize;

    /// Re-initializes chaining/round-key state from the cipher's current
    /// key material. Called once when the instance is opened.
    fn reset_engine(&mut self);

    /// Decrypts exactly one `CHUNK_SIZE`-byte block.
    fn decrypt_chunk(&mut self, input: &[u8], output: &mut [u8]);
}

/// Streaming, chunked decryption front-end generic over any [`DecryptCipher`]
/// and any upstream [`ByteSource`].
pub struct Decryptor<C: DecryptCipher, Src: ByteSource> {
    cipher: C,
    source: Option<Src>,

    input_buffer: Vec<u8>,
    output_buffer: Vec<u8>,

    bytes_in: u64,
    bytes_out: u64,

    source_error: bool,
    open: bool,
}

impl<C: DecryptCipher, Src: ByteSource> Decryptor<C, Src> {
    pub fn new(cipher: C) -> Self {
        Self {
            cipher,
            source: None,
            input_buffer: Vec::new(),
            output_buffer: Vec::new(),
            bytes_in: u64::MAX,
            bytes_out: u64::MAX,
            source_error: false,
            open: false,
        }
    }

    pub fn set_source(&mut self, source: Src) {
        self.source = Some(source);
    }

    pub fn cipher_mut(&mut self) -> &mut C {
        &mut self.cipher
    }

    pub fn open(&mut self) {
        self.cipher.reset_engine();
        self.input_buffer.clear();
        self.output_buffer.clear();
        self.bytes_in = 0;
        self.bytes_out = 0;
        self.source_error = false;
        self.open = true;
    }

    pub fn bytes_processed_in(&self) -> u64 {
        self.bytes_in
    }

    pub fn bytes_processed_out(&self) -> u64 {
        self.bytes_out
    }

    /// The number of ciphertext bytes sitting in the internal input buffer
    /// that have not yet been decrypted (i.e. have not yet accumulated into
    /// a whole chunk and been drained by [`Decryptor::read`]).
    pub fn input_bytes_pending(&self) -> u64 {
        self.input_buffer.len() as u64
    }

    /// True iff the decrypted output buffer currently holds a newline,
    /// i.e. a full line could be read without pulling more ciphertext.
    pub fn can_read_line(&self) -> bool {
        self.output_buffer.contains(&b'\n')
    }

    /// Pushes already-received ciphertext directly into the input staging
    /// buffer, bypassing any attached source. Mirrors manual data injection
    /// in systems with no natural pull-based source.
    pub fn process_data(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.input_buffer.extend_from_slice(data);
        }
    }

    /// One-shot decryption of an entire ciphertext buffer. Any residual
    /// bytes that don't fill a complete chunk are ignored, mirroring the
    /// floor-division behaviour of the original construction.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let chunk = C::CHUNK_SIZE;

        self.cipher.reset_engine();

        let number_chunks = data.len() / chunk;
        let mut result = Vec::with_capacity(number_chunks * chunk);
        let mut output = vec![0u8; chunk];

        for i in 0..number_chunks {
            let block = &data[i * chunk..(i + 1) * chunk];
            self.cipher.decrypt_chunk(block, &mut output);
            result.extend_from_slice(&output);
        }

        result
    }

    /// Pulls any bytes currently available from the attached source into
    /// the input staging buffer, latching a permanent source error if the
    /// source under-delivers what it claimed was available.
    fn read_available_data(&mut self) -> Result<usize> {
        let Some(source) = self.source.as_mut() else {
            return Ok(0);
        };

        let to_read = source.bytes_available();
        if to_read == 0 {
            return Ok(0);
        }

        let old_len = self.input_buffer.len();
        self.input_buffer.resize(old_len + to_read, 0);

        let actually_read = source.read(&mut self.input_buffer[old_len..])?;
        if actually_read != to_read {
            self.input_buffer.truncate(old_len);
            self.source_error = true;
            return Err(CipherError::SourceError);
        }

        Ok(actually_read)
    }

    /// The number of plaintext bytes that could be produced by a `read`
    /// right now without blocking: already-decrypted output plus whatever
    /// full chunks the currently staged and source-available ciphertext
    /// would yield.
    pub fn bytes_available(&mut self) -> usize {
        let mut input_bytes_available = self.input_buffer.len();
        if let Some(source) = self.source.as_mut() {
            input_bytes_available += source.bytes_available();
        }

        let number_chunks = input_bytes_available / C::CHUNK_SIZE;
        self.output_buffer.len() + number_chunks * C::CHUNK_SIZE
    }

    /// Pumps the source, decrypts every whole chunk now staged, and copies
    /// up to `buf.len()` decrypted bytes into `buf`, returning how many
    /// bytes were copied.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        debug_assert!(self.open, "read() called before open()");

        if self.source_error {
            return Err(CipherError::SourceError);
        }

        self.read_available_data()?;

        let chunk = C::CHUNK_SIZE;
        let number_chunks = self.input_buffer.len() / chunk;

        let mut decrypted = vec![0u8; chunk];
        for i in 0..number_chunks {
            let block = &self.input_buffer[i * chunk..(i + 1) * chunk];
            self.cipher.decrypt_chunk(block, &mut decrypted);
            self.output_buffer.extend_from_slice(&decrypted);

            self.bytes_in += chunk as u64;
            self.bytes_out += chunk as u64;
        }

        self.input_buffer.drain(..number_chunks * chunk);

        let to_copy = buf.len().min(self.output_buffer.len());
        buf[..to_copy].copy_from_slice(&self.output_buffer[..to_copy]);
        self.output_buffer.drain(..to_copy);

        Ok(to_copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_io::MemorySource;
    use crate::xtea::{XteaDecryptCipher, XteaEncryptCipher};

    fn encrypt_with_padding(key: [u8; 16], data: &[u8]) -> Vec<u8> {
        let mut enc =
            crate::encryptor::Encryptor::<XteaEncryptCipher, Vec<u8>>::new(XteaEncryptCipher::with_key(key));
        enc.encrypt(data)
    }

    #[test]
    fn one_shot_decrypt_ignores_residual_bytes() {
        let key = [5u8; 16];
        let mut dec = Decryptor::<XteaDecryptCipher, MemorySource>::new(XteaDecryptCipher::with_key(key));

        let ciphertext = encrypt_with_padding(key, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut truncated = ciphertext.clone();
        truncated.push(0xFF); // residual byte, not a full chunk

        let plaintext = dec.decrypt(&truncated);
        assert_eq!(plaintext.len(), ciphertext.len());
    }

    #[test]
    fn streaming_read_pulls_from_source_in_whole_chunks() {
        let key = [7u8; 16];
        let ciphertext = encrypt_with_padding(key, &[9, 9, 9]);

        let mut dec = Decryptor::<XteaDecryptCipher, MemorySource>::new(XteaDecryptCipher::with_key(key));
        dec.set_source(MemorySource::from_bytes(ciphertext));
        dec.open();

        let mut out = vec![0u8; 64];
        let n = dec.read(&mut out).unwrap();
        assert_eq!(n, 8);
    }

    #[test]
    fn process_data_feeds_input_buffer_without_a_source() {
        let key = [11u8; 16];
        let ciphertext = encrypt_with_padding(key, &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut dec = Decryptor::<XteaDecryptCipher, MemorySource>::new(XteaDecryptCipher::with_key(key));
        dec.open();
        dec.process_data(&ciphertext);

        let mut out = vec![0u8; 64];
        let n = dec.read(&mut out).unwrap();
        assert_eq!(n, 16);
    }

    #[test]
    fn input_bytes_pending_reflects_unconsumed_residue() {
        let key = [13u8; 16];
        let ciphertext = encrypt_with_padding(key, &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut dec = Decryptor::<XteaDecryptCipher, MemorySource>::new(XteaDecryptCipher::with_key(key));
        dec.open();
        assert_eq!(dec.input_bytes_pending(), 0);

        dec.process_data(&ciphertext);
        assert_eq!(dec.input_bytes_pending(), ciphertext.len() as u64);

        let mut out = vec![0u8; 64];
        dec.read(&mut out).unwrap();
        assert_eq!(dec.input_bytes_pending(), 0);
    }

    #[test]
    fn can_read_line_detects_newline_in_decrypted_output() {
        let key = [17u8; 16];
        let mut plaintext = b"hello\n".to_vec();
        while plaintext.len() % 8 != 0 {
            plaintext.push(b'-');
        }
        let ciphertext = encrypt_with_padding(key, &plaintext);

        let mut dec = Decryptor::<XteaDecryptCipher, MemorySource>::new(XteaDecryptCipher::with_key(key));
        dec.open();
        assert!(!dec.can_read_line());

        dec.process_data(&ciphertext);
        let mut out = [0u8; 0];
        dec.read(&mut out).unwrap();

        assert!(dec.can_read_line());
    }

    /// A spot-check of the S7 round-trip property across many key/length
    /// combinations for both ciphers, in place of an executed 100k-seed
    /// fuzz run.
    #[test]
    fn round_trip_holds_across_many_keys_and_lengths_aes() {
        use crate::aes::{AesCbcDecryptCipher, AesCbcEncryptCipher, IV_LENGTH, KEY_LENGTH};

        for seed in 0u8..40 {
            let key = [seed.wrapping_mul(7).wrapping_add(1); KEY_LENGTH];
            let iv = [seed.wrapping_mul(13).wrapping_add(3); IV_LENGTH];
            let length = (seed as usize % 8 + 1) * 16;
            let plaintext: Vec<u8> = (0..length).map(|i| (i as u8).wrapping_add(seed)).collect();

            let mut enc = crate::encryptor::Encryptor::<AesCbcEncryptCipher, Vec<u8>>::new(
                AesCbcEncryptCipher::with_key_and_iv(key, iv),
            );
            let ciphertext = enc.encrypt(&plaintext);

            let mut dec = Decryptor::<AesCbcDecryptCipher, MemorySource>::new(
                AesCbcDecryptCipher::with_key_and_iv(key, iv),
            );
            let recovered = dec.decrypt(&ciphertext);

            assert_eq!(recovered, plaintext, "seed {seed} failed to round-trip");
        }
    }

    #[test]
    fn round_trip_holds_across_many_keys_and_lengths_xtea() {
        for seed in 0u8..40 {
            let key = {
                let mut k = [0u8; 16];
                for (i, slot) in k.iter_mut().enumerate() {
                    *slot = seed.wrapping_mul(5).wrapping_add(i as u8);
                }
                k
            };
            let length = (seed as usize % 10 + 1) * 8;
            let plaintext: Vec<u8> = (0..length).map(|i| (i as u8).wrapping_add(seed)).collect();

            let ciphertext = encrypt_with_padding(key, &plaintext);

            let mut dec = Decryptor::<XteaDecryptCipher, MemorySource>::new(XteaDecryptCipher::with_key(key));
            let recovered = dec.decrypt(&ciphertext);

            assert_eq!(recovered, plaintext, "seed {seed} failed to round-trip");
        }
    }
}
