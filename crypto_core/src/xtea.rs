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

//! A non-standard XTEA variant whose four round-keys roll forward one step
//! after every block, making encryption and decryption stateful and only
//! valid when blocks are processed strictly in order from `reset_engine`.
//!
//! The round-key roll is keyed off the plaintext `v0` half-word of the
//! block just processed, in *both* directions: the decryptor's reverse
//! Feistel loop overwrites `v0`/`v1` in place from ciphertext to plaintext,
//! so by the time it rolls `active_keys[0]` the local `v0` already holds the
//! recovered plaintext, matching the encryptor, which captures `v0` before
//! its forward loop turns it into ciphertext. Both sides must roll on the
//! same value to stay in lockstep block to block.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher_base::CipherBase;
use crate::decryptor::DecryptCipher;
use crate::encryptor::EncryptCipher;

pub const KEY_LENGTH: usize = 16;
pub const BLOCK_LENGTH: usize = 8;

const NUMBER_FEISTEL_ROUNDS: u32 = 64;
const XTEA_DELTA: u32 = 0x9E37_79B9;
const KEY_ROLL_POLYNOMIAL: u32 = 0x100D_4E63;

fn roll_key(current_key: u32) -> u32 {
    if current_key & 0x8000_0000 != 0 {
        ((current_key ^ KEY_ROLL_POLYNOMIAL) << 1) | 1
    } else {
        current_key << 1
    }
}

fn words_from_keys(keys: [u8; KEY_LENGTH]) -> [u32; 4] {
    let mut words = [0u32; 4];
    for (i, word) in words.iter_mut().enumerate() {
        *word = u32::from_le_bytes(keys[i * 4..i * 4 + 4].try_into().unwrap());
    }
    words
}

fn read_block(data: &[u8]) -> (u32, u32) {
    let v0 = u32::from_le_bytes(data[0..4].try_into().unwrap());
    let v1 = u32::from_le_bytes(data[4..8].try_into().unwrap());
    (v0, v1)
}

fn write_block(output: &mut [u8], v0: u32, v1: u32) {
    output[0..4].copy_from_slice(&v0.to_le_bytes());
    output[4..8].copy_from_slice(&v1.to_le_bytes());
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct RunningKeys {
    initial_keys: [u8; KEY_LENGTH],
    active_keys: [u32; 4],
}

impl RunningKeys {
    fn new(keys: [u8; KEY_LENGTH]) -> Self {
        Self {
            initial_keys: keys,
            active_keys: [0; 4],
        }
    }

    fn reset(&mut self) {
        self.active_keys = words_from_keys(self.initial_keys);
    }

    fn roll(&mut self, plaintext_v0: u32) {
        self.active_keys[0] = roll_key(self.active_keys[0]) ^ plaintext_v0;
        self.active_keys[1] = roll_key(self.active_keys[1]);
        self.active_keys[2] = roll_key(self.active_keys[2]);
        self.active_keys[3] = roll_key(self.active_keys[3]);
    }
}

/// XTEA-variant block primitive driving the [`crate::encryptor::Encryptor`]
/// framework.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct XteaEncryptCipher {
    keys: RunningKeys,
}

impl XteaEncryptCipher {
    pub fn new() -> Self {
        Self::with_key([0u8; KEY_LENGTH])
    }

    pub fn with_key(key: [u8; KEY_LENGTH]) -> Self {
        Self {
            keys: RunningKeys::new(key),
        }
    }

    pub fn set_key(&mut self, key: [u8; KEY_LENGTH]) {
        self.keys.initial_keys = key;
    }
}

impl Default for XteaEncryptCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl CipherBase for XteaEncryptCipher {
    fn key_length_in_bytes(&self) -> usize {
        KEY_LENGTH
    }
}

impl EncryptCipher for XteaEncryptCipher {
    const CHUNK_SIZE: usize = BLOCK_LENGTH;

    fn reset_engine(&mut self) {
        self.keys.reset();
    }

    fn encrypt_chunk(&mut self, input: &[u8], output: &mut [u8]) {
        debug_assert_eq!(input.len(), BLOCK_LENGTH);
        debug_assert_eq!(output.len(), BLOCK_LENGTH);

        let (mut v0, mut v1) = read_block(input);
        let input_v0 = v0;

        let mut sum: u32 = 0;
        for _ in 0..NUMBER_FEISTEL_ROUNDS {
            v0 = v0.wrapping_add(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ (sum.wrapping_add(self.keys.active_keys[(sum & 3) as usize])),
            );
            sum = sum.wrapping_add(XTEA_DELTA);
            v1 = v1.wrapping_add(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ (sum.wrapping_add(self.keys.active_keys[((sum >> 11) & 3) as usize])),
            );
        }

        write_block(output, v0, v1);
        self.keys.roll(input_v0);
    }
}

/// XTEA-variant block primitive driving the [`crate::decryptor::Decryptor`]
/// framework.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct XteaDecryptCipher {
    keys: RunningKeys,
}

impl XteaDecryptCipher {
    pub fn new() -> Self {
        Self::with_key([0u8; KEY_LENGTH])
    }

    pub fn with_key(key: [u8; KEY_LENGTH]) -> Self {
        Self {
            keys: RunningKeys::new(key),
        }
    }

    pub fn set_key(&mut self, key: [u8; KEY_LENGTH]) {
        self.keys.initial_keys = key;
    }
}

impl Default for XteaDecryptCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl CipherBase for XteaDecryptCipher {
    fn key_length_in_bytes(&self) -> usize {
        KEY_LENGTH
    }
}

impl DecryptCipher for XteaDecryptCipher {
    const CHUNK_SIZE: usize = BLOCK_LENGTH;

    fn reset_engine(&mut self) {
        self.keys.reset();
    }

    fn decrypt_chunk(&mut self, input: &[u8], output: &mut [u8]) {
        debug_assert_eq!(input.len(), BLOCK_LENGTH);
        debug_assert_eq!(output.len(), BLOCK_LENGTH);

        let (mut v0, mut v1) = read_block(input);

        let mut sum: u32 = XTEA_DELTA.wrapping_mul(NUMBER_FEISTEL_ROUNDS);
        for _ in 0..NUMBER_FEISTEL_ROUNDS {
            v1 = v1.wrapping_sub(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ (sum.wrapping_add(self.keys.active_keys[((sum >> 11) & 3) as usize])),
            );
            sum = sum.wrapping_sub(XTEA_DELTA);
            v0 = v0.wrapping_sub(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ (sum.wrapping_add(self.keys.active_keys[(sum & 3) as usize])),
            );
        }

        write_block(output, v0, v1);
        self.keys.roll(v0);
    }
}
