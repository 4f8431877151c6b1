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

//! Weak, deterministic key-derivation fold shared by the block ciphers.
//!
//! This is deliberately not a real KDF: it rotates a running sum of input
//! bytes into a fixed-length key one byte at a time. It exists so callers
//! can turn an arbitrary passphrase or byte blob into a fixed-size key
//! without pulling in a password-hashing crate; it provides no resistance
//! to brute force and must not be mistaken for one.

/// Implemented by any cipher capable of deriving a key of its own fixed
/// length from arbitrary input bytes.
pub trait CipherBase {
    /// The number of bytes a key for this cipher occupies.
    fn key_length_in_bytes(&self) -> usize;

    /// Folds `data` into a key of [`CipherBase::key_length_in_bytes`] bytes
    /// by repeatedly adding input bytes into a rotating position.
    fn generate_key(&self, data: &[u8]) -> Vec<u8> {
        let key_length = self.key_length_in_bytes();
        let mut key = vec![0u8; key_length];

        let mut key_index = 0usize;
        for &byte in data {
            key[key_index] = key[key_index].wrapping_add(byte);
            key_index = (key_index + 1) % key_length;
        }

        key
    }

    /// As [`CipherBase::generate_key`], folding the UTF-8 bytes of `text`.
    fn generate_key_from_str(&self, text: &str) -> Vec<u8> {
        self.generate_key(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy16;
    impl CipherBase for Dummy16 {
        fn key_length_in_bytes(&self) -> usize {
            16
        }
    }

    #[test]
    fn generate_key_wraps_and_sums() {
        let dummy = Dummy16;
        let key = dummy.generate_key(&[1; 32]);
        assert_eq!(key.len(), 16);
        assert!(key.iter().all(|&b| b == 2));
    }

    #[test]
    fn generate_key_from_str_matches_bytes() {
        let dummy = Dummy16;
        assert_eq!(
            dummy.generate_key_from_str("hello"),
            dummy.generate_key(b"hello")
        );
    }

    #[test]
    fn empty_input_yields_zero_key() {
        let dummy = Dummy16;
        assert_eq!(dummy.generate_key(&[]), vec![0u8; 16]);
    }
}
