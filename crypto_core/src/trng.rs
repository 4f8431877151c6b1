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

//! Thin wrapper around the operating system's cryptographic entropy source.
//!
//! Draws go straight through [`rand::rngs::OsRng`], which sources from
//! `getrandom(2)`/`/dev/urandom` on Unix and `BCryptGenRandom` on Windows.
//! A failure to obtain entropy from the OS is treated as fatal, matching the
//! guarantee callers rely on elsewhere in this crate.

use rand::rngs::OsRng;
use rand::RngCore;

/// Draws 32 bits of cryptographic randomness from the OS entropy source.
pub fn random32() -> u32 {
    OsRng.next_u32()
}

/// Draws 64 bits of cryptographic randomness from the OS entropy source.
pub fn random64() -> u64 {
    OsRng.next_u64()
}
