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

//! AES-256 in CBC mode, chained manually around the `aes` crate's raw block
//! primitive so the streaming framework can drive one 16-byte block at a
//! time.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher_base::CipherBase;
use crate::decryptor::DecryptCipher;
use crate::encryptor::EncryptCipher;

pub const KEY_LENGTH: usize = 32;
pub const IV_LENGTH: usize = 16;
pub const BLOCK_LENGTH: usize = 16;

/// Fills a fresh 16-byte initialization vector using a deliberately weak,
/// non-cryptographic additive generator. Callers who need unpredictable IVs
/// must supply their own.
pub fn default_iv() -> [u8; IV_LENGTH] {
    let mut seeds: [u8; 4] = [251, 241, 239, 233];
    let mut iv = [0u8; IV_LENGTH];

    for slot in iv.iter_mut() {
        let new_seed = seeds[0]
            .wrapping_add(seeds[1])
            .wrapping_add(seeds[2])
            .wrapping_add(seeds[3])
            .wrapping_add(1);
        seeds[3] = seeds[2];
        seeds[2] = seeds[1];
        seeds[1] = seeds[0];
        seeds[0] = new_seed;

        *slot = new_seed;
    }

    iv
}

/// CBC-chaining state shared by the AES encrypt and decrypt ciphers:
/// the key plus the most recently consumed/produced ciphertext block.
#[derive(Zeroize, ZeroizeOnDrop)]
struct CbcState {
    key: [u8; KEY_LENGTH],
    initial_iv: [u8; IV_LENGTH],
    chain: [u8; IV_LENGTH],
}

impl CbcState {
    fn new(key: [u8; KEY_LENGTH], iv: [u8; IV_LENGTH]) -> Self {
        Self {
            key,
            initial_iv: iv,
            chain: iv,
        }
    }

    fn reset(&mut self) {
        self.chain = self.initial_iv;
    }
}

/// AES-256-CBC block primitive driving the [`crate::encryptor::Encryptor`]
/// framework.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesCbcEncryptCipher {
    state: CbcState,
}

impl AesCbcEncryptCipher {
    pub fn new() -> Self {
        Self::with_key_and_iv([0u8; KEY_LENGTH], default_iv())
    }

    pub fn with_key(key: [u8; KEY_LENGTH]) -> Self {
        Self::with_key_and_iv(key, default_iv())
    }

    pub fn with_key_and_iv(key: [u8; KEY_LENGTH], iv: [u8; IV_LENGTH]) -> Self {
        Self {
            state: CbcState::new(key, iv),
        }
    }

    pub fn set_key(&mut self, key: [u8; KEY_LENGTH]) {
        self.state.key = key;
    }

    pub fn set_iv(&mut self, iv: [u8; IV_LENGTH]) {
        self.state.initial_iv = iv;
    }
}

impl Default for AesCbcEncryptCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl CipherBase for AesCbcEncryptCipher {
    fn key_length_in_bytes(&self) -> usize {
        KEY_LENGTH
    }
}

impl EncryptCipher for AesCbcEncryptCipher {
    const CHUNK_SIZE: usize = BLOCK_LENGTH;

    fn reset_engine(&mut self) {
        self.state.reset();
    }

    fn encrypt_chunk(&mut self, input: &[u8], output: &mut [u8]) {
        debug_assert_eq!(input.len(), BLOCK_LENGTH);
        debug_assert_eq!(output.len(), BLOCK_LENGTH);

        let cipher = Aes256::new(GenericArray::from_slice(&self.state.key));

        let mut block = [0u8; BLOCK_LENGTH];
        for i in 0..BLOCK_LENGTH {
            block[i] = input[i] ^ self.state.chain[i];
        }

        let mut generic_block = GenericArray::clone_from_slice(&block);
        cipher.encrypt_block(&mut generic_block);

        output.copy_from_slice(&generic_block);
        self.state.chain.copy_from_slice(&generic_block);
    }
}

/// AES-256-CBC block primitive driving the [`crate::decryptor::Decryptor`]
/// framework.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesCbcDecryptCipher {
    state: CbcState,
}

impl AesCbcDecryptCipher {
    pub fn new() -> Self {
        Self::with_key_and_iv([0u8; KEY_LENGTH], default_iv())
    }

    pub fn with_key(key: [u8; KEY_LENGTH]) -> Self {
        Self::with_key_and_iv(key, default_iv())
    }

    pub fn with_key_and_iv(key: [u8; KEY_LENGTH], iv: [u8; IV_LENGTH]) -> Self {
        Self {
            state: CbcState::new(key, iv),
        }
    }

    pub fn set_key(&mut self, key: [u8; KEY_LENGTH]) {
        self.state.key = key;
    }

    pub fn set_iv(&mut self, iv: [u8; IV_LENGTH]) {
        self.state.initial_iv = iv;
    }
}

impl Default for AesCbcDecryptCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl CipherBase for AesCbcDecryptCipher {
    fn key_length_in_bytes(&self) -> usize {
        KEY_LENGTH
    }
}

impl DecryptCipher for AesCbcDecryptCipher {
    const CHUNK_SIZE: usize = BLOCK_LENGTH;

    fn reset_engine(&mut self) {
        self.state.reset();
    }

    fn decrypt_chunk(&mut self, input: &[u8], output: &mut [u8]) {
        debug_assert_eq!(input.len(), BLOCK_LENGTH);
        debug_assert_eq!(output.len(), BLOCK_LENGTH);

        let cipher = Aes256::new(GenericArray::from_slice(&self.state.key));

        let mut generic_block = GenericArray::clone_from_slice(input);
        cipher.decrypt_block(&mut generic_block);

        for i in 0..BLOCK_LENGTH {
            output[i] = generic_block[i] ^ self.state.chain[i];
        }

        self.state.chain.copy_from_slice(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_iv_is_deterministic_and_matches_seed_walk() {
        let iv = default_iv();
        // First byte: 251+241+239+233+1 = 965 mod 256 = 197
        assert_eq!(iv[0], 197);
        assert_eq!(default_iv(), iv);
    }

    /// NIST SP 800-38A F.2.5 AES-256-CBC known-answer test.
    #[test]
    fn nist_f_2_5_known_answer() {
        let key: [u8; KEY_LENGTH] = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ];
        let iv: [u8; IV_LENGTH] = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ];
        let plaintext: [u8; 64] = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a, 0xae, 0x2d, 0x8a, 0x57, 0x1e, 0x03, 0xac, 0x9c, 0x9e, 0xb7, 0x6f, 0xac,
            0x45, 0xaf, 0x8e, 0x51, 0x30, 0xc8, 0x1c, 0x46, 0xa3, 0x5c, 0xe4, 0x11, 0xe5, 0xfb,
            0xc1, 0x19, 0x1a, 0x0a, 0x52, 0xef, 0xf6, 0x9f, 0x24, 0x45, 0xdf, 0x4f, 0x9b, 0x17,
            0xad, 0x2b, 0x41, 0x7b, 0xe6, 0x6c, 0x37, 0x10,
        ];
        let expected_ciphertext: [u8; 64] = [
            0xf5, 0x8c, 0x4c, 0x04, 0xd6, 0xe5, 0xf1, 0xba, 0x77, 0x9e, 0xab, 0xfb, 0x5f, 0x7b,
            0xfb, 0xd6, 0x9c, 0xfc, 0x4e, 0x96, 0x7e, 0xdb, 0x80, 0x8d, 0x67, 0x9f, 0x77, 0x7b,
            0xc6, 0x70, 0x2c, 0x7d, 0x39, 0xf2, 0x33, 0x69, 0xa9, 0xd9, 0xba, 0xcf, 0xa5, 0x30,
            0xe2, 0x63, 0x04, 0x23, 0x14, 0x61, 0xb2, 0xeb, 0x05, 0xe2, 0xc3, 0x9b, 0xe9, 0xfc,
            0xda, 0x6c, 0x19, 0x07, 0x8c, 0x6a, 0x9d, 0x1b,
        ];

        let enc = AesCbcEncryptCipher::with_key_and_iv(key, iv);
        let ciphertext =
            crate::encryptor::Encryptor::<AesCbcEncryptCipher, Vec<u8>>::new(enc).encrypt(&plaintext);
        assert_eq!(ciphertext, expected_ciphertext);

        let dec = AesCbcDecryptCipher::with_key_and_iv(key, iv);
        let recovered =
            crate::decryptor::Decryptor::<AesCbcDecryptCipher, crate::byte_io::MemorySource>::new(
                dec,
            )
            .decrypt(&expected_ciphertext);
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn encrypt_then_decrypt_round_trips_single_block() {
        let key = [0x42u8; KEY_LENGTH];
        let iv = [0x24u8; IV_LENGTH];
        let plaintext = [7u8; BLOCK_LENGTH];

        let mut enc = AesCbcEncryptCipher::with_key_and_iv(key, iv);
        enc.reset_engine();
        let mut ciphertext = [0u8; BLOCK_LENGTH];
        enc.encrypt_chunk(&plaintext, &mut ciphertext);

        let mut dec = AesCbcDecryptCipher::with_key_and_iv(key, iv);
        dec.reset_engine();
        let mut recovered = [0u8; BLOCK_LENGTH];
        dec.decrypt_chunk(&ciphertext, &mut recovered);

        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn chaining_differs_across_blocks() {
        let key = [0x11u8; KEY_LENGTH];
        let iv = [0x22u8; IV_LENGTH];
        let plaintext = [9u8; BLOCK_LENGTH];

        let mut enc = AesCbcEncryptCipher::with_key_and_iv(key, iv);
        enc.reset_engine();

        let mut first = [0u8; BLOCK_LENGTH];
        enc.encrypt_chunk(&plaintext, &mut first);

        let mut second = [0u8; BLOCK_LENGTH];
        enc.encrypt_chunk(&plaintext, &mut second);

        assert_ne!(first, second, "identical plaintext blocks must chain to different ciphertext");
    }
}
