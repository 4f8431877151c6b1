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

//! Byte and bit helpers shared by the cipher, HMAC, and CRC implementations.

use crate::trng::random64;

/// Overwrites `bytes` with zeros in place.
pub fn scrub(bytes: &mut [u8]) {
    bytes.fill(0);
}

/// Draws `length` cryptographically random bytes, eight at a time from
/// [`random64`].
pub fn generate_random_bytes(length: usize) -> Vec<u8> {
    let mut result = vec![0u8; length];

    let mut r: u64 = 0;
    for (i, slot) in result.iter_mut().enumerate() {
        if i % 8 == 0 {
            r = random64();
        }

        *slot = r as u8;
        r >>= 8;
    }

    result
}

/// Truncates `bytes` to the longest prefix whose last byte is non-zero,
/// returning an empty vector if every byte is zero.
pub fn strip_trailing_zeros(bytes: &[u8]) -> Vec<u8> {
    let mut ideal_length = bytes.len();
    while ideal_length > 0 && bytes[ideal_length - 1] == 0 {
        ideal_length -= 1;
    }

    bytes[..ideal_length].to_vec()
}

/// Counts the number of set bits in `value` using a SWAR popcount.
pub fn popcount64(value: u64) -> u32 {
    let mut x = value;

    x -= (x >> 1) & 0x5555_5555_5555_5555;
    x = ((x >> 2) & 0x3333_3333_3333_3333) + (x & 0x3333_3333_3333_3333);
    x = ((x >> 4) + x) & 0x0F0F_0F0F_0F0F_0F0F;
    x += x >> 8;
    x += x >> 16;
    x += x >> 32;

    (x & 0x7F) as u32
}

/// Returns the 0-indexed position of the most-significant set bit in
/// `value`, or `-1` if `value` is zero.
pub fn msb_location_32(value: u32) -> i32 {
    if value == 0 {
        return -1;
    }

    let mut location: i32 = 0;
    let mut running = value as u64;

    for adjustment in [16u32, 8, 4, 2, 1] {
        let mask: u64 = ((1u64 << adjustment) - 1) << adjustment;
        if running & mask != 0 {
            running >>= adjustment;
            location += adjustment as i32;
        }
    }

    location
}

/// Returns the 0-indexed position of the most-significant set bit in
/// `value`, or `-1` if `value` is zero.
pub fn msb_location_64(value: u64) -> i32 {
    if value == 0 {
        return -1;
    }

    let mut location: i32 = 0;
    let mut running = value as u128;

    for adjustment in [32u32, 16, 8, 4, 2, 1] {
        let mask: u128 = ((1u128 << adjustment) - 1) << adjustment;
        if running & mask != 0 {
            running >>= adjustment;
            location += adjustment as i32;
        }
    }

    location
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_zeroes_buffer() {
        let mut buf = vec![1u8, 2, 3, 4];
        scrub(&mut buf);
        assert_eq!(buf, vec![0, 0, 0, 0]);
    }

    #[test]
    fn strip_trailing_zeros_removes_trailer() {
        assert_eq!(strip_trailing_zeros(&[1, 2, 0, 0]), vec![1, 2]);
        assert_eq!(strip_trailing_zeros(&[0, 0, 0]), Vec::<u8>::new());
        assert_eq!(strip_trailing_zeros(&[1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn popcount64_counts_bits() {
        assert_eq!(popcount64(0), 0);
        assert_eq!(popcount64(0xFFFF_FFFF_FFFF_FFFF), 64);
        assert_eq!(popcount64(0b1011), 3);
    }

    #[test]
    fn msb_location_32_matches_known_values() {
        assert_eq!(msb_location_32(0), -1);
        assert_eq!(msb_location_32(1), 0);
        assert_eq!(msb_location_32(0x8000_0000), 31);
        assert_eq!(msb_location_32(0b1001), 3);
    }

    #[test]
    fn msb_location_64_matches_known_values() {
        assert_eq!(msb_location_64(0), -1);
        assert_eq!(msb_location_64(1), 0);
        assert_eq!(msb_location_64(0x8000_0000_0000_0000), 63);
        assert_eq!(msb_location_64(0b1001), 3);
    }

    #[test]
    fn generate_random_bytes_has_requested_length() {
        assert_eq!(generate_random_bytes(0).len(), 0);
        assert_eq!(generate_random_bytes(5).len(), 5);
        assert_eq!(generate_random_bytes(17).len(), 17);
    }
}
