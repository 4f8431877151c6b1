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

//! RFC 2104 HMAC over a pluggable hash family.
//!
//! `Algorithm` is a runtime value so callers can pick a hash the way the
//! original construction did: from a table of eleven supported algorithms.
//! Each variant is backed by the RustCrypto `hmac` crate's `Hmac<D>`, one
//! concrete instantiation per hash, dispatched through the `Engine` enum
//! below — `Algorithm` only decides which arm gets built, it never changes
//! the fact that the real work happens in `hmac::Hmac<D>`. Oversized keys
//! are hashed down and zero-padded to the block size, which is exactly what
//! `Hmac::new_from_slice` already does per RFC 2104 — earlier revisions of
//! this construction hashed the key without the zero-pad, which produced a
//! non-compliant digest; reusing the crate sidesteps that bug entirely.

use hmac::{Hmac as RawHmac, Mac};

/// The hash family underlying an [`Hmac`] instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Algorithm {
    Md4,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl Algorithm {
    /// The hash's internal block size in bytes, used to size the padded key.
    pub fn block_size(self) -> usize {
        match self {
            Algorithm::Md4 => 512 / 8,
            Algorithm::Md5 => 512 / 8,
            Algorithm::Sha1 => 512 / 8,
            Algorithm::Sha224 => 512 / 8,
            Algorithm::Sha256 => 512 / 8,
            Algorithm::Sha384 => 1024 / 8,
            Algorithm::Sha512 => 1024 / 8,
            Algorithm::Sha3_224 => 1152 / 8,
            Algorithm::Sha3_256 => 1088 / 8,
            Algorithm::Sha3_384 => 832 / 8,
            Algorithm::Sha3_512 => 576 / 8,
        }
    }

    /// The hash's output size in bytes.
    pub fn digest_size(self) -> usize {
        match self {
            Algorithm::Md4 => 128 / 8,
            Algorithm::Md5 => 128 / 8,
            Algorithm::Sha1 => 160 / 8,
            Algorithm::Sha224 => 224 / 8,
            Algorithm::Sha256 => 256 / 8,
            Algorithm::Sha384 => 384 / 8,
            Algorithm::Sha512 => 512 / 8,
            Algorithm::Sha3_224 => 224 / 8,
            Algorithm::Sha3_256 => 256 / 8,
            Algorithm::Sha3_384 => 384 / 8,
            Algorithm::Sha3_512 => 512 / 8,
        }
    }
}

/// One concrete `hmac::Hmac<D>` per supported hash, so `Algorithm` stays a
/// runtime value while every variant still goes through the RustCrypto
/// `hmac`/`Mac` machinery rather than a hand-rolled ipad/opad construction.
enum Engine {
    Md4(RawHmac<md4::Md4>),
    Md5(RawHmac<md5::Md5>),
    Sha1(RawHmac<sha1::Sha1>),
    Sha224(RawHmac<sha2::Sha224>),
    Sha256(RawHmac<sha2::Sha256>),
    Sha384(RawHmac<sha2::Sha384>),
    Sha512(RawHmac<sha2::Sha512>),
    Sha3_224(RawHmac<sha3::Sha3_224>),
    Sha3_256(RawHmac<sha3::Sha3_256>),
    Sha3_384(RawHmac<sha3::Sha3_384>),
    Sha3_512(RawHmac<sha3::Sha3_512>),
}

impl Engine {
    fn new(key: &[u8], algorithm: Algorithm) -> Self {
        /// `Hmac::new_from_slice` accepts keys of any length (hashing down
        /// and zero-padding per RFC 2104 internally); it only returns
        /// `Err` for MACs with a fixed key size, which HMAC is not.
        const ANY_LENGTH: &str = "HMAC accepts keys of any length";

        match algorithm {
            Algorithm::Md4 => Engine::Md4(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Md5 => Engine::Md5(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha1 => Engine::Sha1(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha224 => Engine::Sha224(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha256 => Engine::Sha256(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha384 => Engine::Sha384(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha512 => Engine::Sha512(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha3_224 => Engine::Sha3_224(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha3_256 => Engine::Sha3_256(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha3_384 => Engine::Sha3_384(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
            Algorithm::Sha3_512 => Engine::Sha3_512(RawHmac::new_from_slice(key).expect(ANY_LENGTH)),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Engine::Md4(m) => m.update(data),
            Engine::Md5(m) => m.update(data),
            Engine::Sha1(m) => m.update(data),
            Engine::Sha224(m) => m.update(data),
            Engine::Sha256(m) => m.update(data),
            Engine::Sha384(m) => m.update(data),
            Engine::Sha512(m) => m.update(data),
            Engine::Sha3_224(m) => m.update(data),
            Engine::Sha3_256(m) => m.update(data),
            Engine::Sha3_384(m) => m.update(data),
            Engine::Sha3_512(m) => m.update(data),
        }
    }

    /// Resets the accumulated message back to empty, keeping the key.
    fn reset(&mut self) {
        match self {
            Engine::Md4(m) => Mac::reset(m),
            Engine::Md5(m) => Mac::reset(m),
            Engine::Sha1(m) => Mac::reset(m),
            Engine::Sha224(m) => Mac::reset(m),
            Engine::Sha256(m) => Mac::reset(m),
            Engine::Sha384(m) => Mac::reset(m),
            Engine::Sha512(m) => Mac::reset(m),
            Engine::Sha3_224(m) => Mac::reset(m),
            Engine::Sha3_256(m) => Mac::reset(m),
            Engine::Sha3_384(m) => Mac::reset(m),
            Engine::Sha3_512(m) => Mac::reset(m),
        }
    }

    /// Finalizes the digest and resets the internal state for reuse; the
    /// reset half is never observed by callers because [`Hmac::digest`]'s
    /// `spent` flag refuses a second call without an intervening
    /// [`Hmac::reset`].
    fn finalize_reset(&mut self) -> Vec<u8> {
        match self {
            Engine::Md4(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Md5(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha1(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha224(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha256(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha384(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha512(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha3_224(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha3_256(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha3_384(m) => m.finalize_reset().into_bytes().to_vec(),
            Engine::Sha3_512(m) => m.finalize_reset().into_bytes().to_vec(),
        }
    }
}

/// An RFC 2104 HMAC instance. Each instance is single-use: [`Hmac::digest`]
/// consumes the accumulated message, and a subsequent call without an
/// intervening [`Hmac::reset`] is a programmer error.
pub struct Hmac {
    algorithm: Algorithm,
    engine: Engine,
    spent: bool,
}

impl Hmac {
    /// Creates a new HMAC instance over `key` using `algorithm`.
    pub fn new(key: &[u8], algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            engine: Engine::new(key, algorithm),
            spent: false,
        }
    }

    /// As [`Hmac::new`], seeding the message with `data` before any further
    /// [`Hmac::add_data`] call.
    pub fn with_data(key: &[u8], data: &[u8], algorithm: Algorithm) -> Self {
        let mut hmac = Self::new(key, algorithm);
        hmac.add_data(data);
        hmac
    }

    /// Re-derives the engine from `key` and resets the instance for reuse.
    pub fn reset_key(&mut self, key: &[u8]) {
        self.engine = Engine::new(key, self.algorithm);
        self.spent = false;
    }

    /// Clears the accumulated message and un-spends the instance, keeping
    /// the current key.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.spent = false;
    }

    /// Appends `data` to the message under authentication.
    pub fn add_data(&mut self, data: &[u8]) {
        self.engine.update(data);
    }

    /// Computes `H((K ⊕ opad) ∥ H((K ⊕ ipad) ∥ message))`.
    ///
    /// Panics if called twice without an intervening [`Hmac::reset`]: reusing
    /// a spent instance is a programmer error, not a recoverable one.
    pub fn digest(&mut self) -> Vec<u8> {
        assert!(!self.spent, "Hmac instance reused after digest() without reset()");
        self.spent = true;

        self.engine.finalize_reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac as _;

    #[test]
    fn digest_is_deterministic() {
        let mut a = Hmac::new(b"key", Algorithm::Sha256);
        a.add_data(b"message");
        let da = a.digest();

        let mut b = Hmac::new(b"key", Algorithm::Sha256);
        b.add_data(b"message");
        let db = b.digest();

        assert_eq!(da, db);
        assert_eq!(da.len(), Algorithm::Sha256.digest_size());
    }

    #[test]
    fn different_keys_produce_different_digests() {
        let mut a = Hmac::new(b"key-one", Algorithm::Sha1);
        a.add_data(b"message");

        let mut b = Hmac::new(b"key-two", Algorithm::Sha1);
        b.add_data(b"message");

        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn oversized_key_is_hashed_and_zero_padded() {
        let oversized_key = vec![0x5Au8; Algorithm::Sha256.block_size() + 32];

        let mut reference = RawHmac::<sha2::Sha256>::new_from_slice(&oversized_key).unwrap();
        reference.update(b"hello");
        let expected = reference.finalize().into_bytes().to_vec();

        let mut hmac = Hmac::new(&oversized_key, Algorithm::Sha256);
        hmac.add_data(b"hello");
        assert_eq!(hmac.digest(), expected);
    }

    #[test]
    #[should_panic]
    fn digest_twice_without_reset_panics() {
        let mut hmac = Hmac::new(b"key", Algorithm::Md5);
        hmac.add_data(b"data");
        let _ = hmac.digest();
        let _ = hmac.digest();
    }

    #[test]
    fn hmac_sha256_small_key_known_answer() {
        let key = [0x6B, 0x65, 0x79];
        let data = [0x64, 0x61, 0x74, 0x61];

        let mut hmac = Hmac::new(&key, Algorithm::Sha256);
        hmac.add_data(&data);
        let digest = hmac.digest();

        let expected: [u8; 32] = [
            0x50, 0x31, 0xfe, 0x3d, 0x98, 0x9c, 0x6d, 0x15, 0x37, 0xa0, 0x13, 0xfa, 0x6e, 0x73,
            0x9d, 0xa2, 0x34, 0x63, 0xfd, 0xae, 0xc3, 0xb7, 0x01, 0x37, 0xd8, 0x28, 0xe3, 0x6a,
            0xce, 0x22, 0x1b, 0xd0,
        ];
        assert_eq!(digest, expected);
    }

    #[test]
    fn hmac_sha256_block_sized_key_known_answer() {
        // b"0123456789ABCDEF" repeated to the SHA-256 block size (64 bytes).
        let key = b"0123456789ABCDEF".repeat(4);
        let data = [0x64, 0x61, 0x74, 0x61];

        let mut hmac = Hmac::new(&key, Algorithm::Sha256);
        hmac.add_data(&data);
        let digest = hmac.digest();

        let expected: [u8; 32] = [
            0xa5, 0x21, 0x8d, 0x98, 0x8f, 0xd6, 0x10, 0x90, 0xf4, 0x8e, 0xdd, 0x44, 0x32, 0x33,
            0x33, 0x55, 0xb0, 0xd1, 0x14, 0x65, 0xfb, 0xde, 0x58, 0xf5, 0x58, 0x86, 0x9e, 0xc0,
            0x03, 0x7a, 0xc9, 0x07,
        ];
        assert_eq!(digest, expected);
    }

    #[test]
    fn with_data_seeds_message_before_further_add_data() {
        let mut a = Hmac::with_data(b"key", b"hello ", Algorithm::Sha1);
        a.add_data(b"world");

        let mut b = Hmac::new(b"key", Algorithm::Sha1);
        b.add_data(b"hello world");

        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn reset_key_rederives_engine_for_a_new_key() {
        let mut hmac = Hmac::new(b"key-one", Algorithm::Sha1);
        hmac.add_data(b"message");
        let first = hmac.digest();

        hmac.reset_key(b"key-two");
        hmac.add_data(b"message");
        let second = hmac.digest();

        assert_ne!(first, second);
    }
}
