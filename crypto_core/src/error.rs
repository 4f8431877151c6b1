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

use std::io;

use thiserror::Error;

/// A `CipherError` indicates a failure in the streaming cipher framework,
/// the CRC codec, or the HMAC wrapper.
#[derive(Debug, Error)]
pub enum CipherError {
    /// No sink has been attached with [`crate::encryptor::Encryptor::set_sink`].
    #[error("No sink attached")]
    NoSink,
    /// The sink accepted fewer bytes than were handed to it.
    #[error("Sink reported a short write")]
    ShortWrite,
    /// A source read failed and has been latched; the instance must be reopened.
    #[error("Source reported an error")]
    SourceError,

    /// An I/O error occured on the attached sink or source.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, CipherError>;
