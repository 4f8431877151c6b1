// cryptotool is a command-line front-end for the crypto_core library.
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

mod error;
use error::*;

use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crypto_core::aes::{AesCbcDecryptCipher, AesCbcEncryptCipher};
use crypto_core::byte_io::FileSource;
use crypto_core::cipher_base::CipherBase;
use crypto_core::crc::{non_systematic_crc_decode, systematic_crc};
use crypto_core::decryptor::Decryptor;
use crypto_core::encryptor::Encryptor;
use crypto_core::helpers::generate_random_bytes;
use crypto_core::hmac::{Algorithm, Hmac};
use crypto_core::xtea::{XteaDecryptCipher, XteaEncryptCipher};

/// Streaming chunk size used to pump plaintext/ciphertext through the CLI's
/// encrypt/decrypt subcommands; unrelated to the ciphers' own block sizes.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// Drives `plaintext` from `input` through `encryptor` in fixed-size chunks,
/// writing ciphertext to the sink already attached via `set_sink`, then
/// PKCS#7-pads and flushes any trailing partial block.
fn stream_encrypt<C: crypto_core::encryptor::EncryptCipher>(
    input: PathBuf,
    encryptor: &mut Encryptor<C, fs::File>,
) -> Result<()> {
    let mut reader = BufReader::new(fs::File::open(input)?);
    let mut buf = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        encryptor.write(&buf[..n])?;
    }

    encryptor.flush()?;
    Ok(())
}

/// Drives ciphertext from the `FileSource` already attached to `decryptor`
/// via `set_source`, writing recovered plaintext to `output`.
fn stream_decrypt<C: crypto_core::decryptor::DecryptCipher>(
    output: PathBuf,
    decryptor: &mut Decryptor<C, FileSource>,
) -> Result<()> {
    let mut out = fs::File::create(output)?;
    let mut buf = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let n = decryptor.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Md4,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3224,
    Sha3256,
    Sha3384,
    Sha3512,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Md4 => Algorithm::Md4,
            AlgorithmArg::Md5 => Algorithm::Md5,
            AlgorithmArg::Sha1 => Algorithm::Sha1,
            AlgorithmArg::Sha224 => Algorithm::Sha224,
            AlgorithmArg::Sha256 => Algorithm::Sha256,
            AlgorithmArg::Sha384 => Algorithm::Sha384,
            AlgorithmArg::Sha512 => Algorithm::Sha512,
            AlgorithmArg::Sha3224 => Algorithm::Sha3_224,
            AlgorithmArg::Sha3256 => Algorithm::Sha3_256,
            AlgorithmArg::Sha3384 => Algorithm::Sha3_384,
            AlgorithmArg::Sha3512 => Algorithm::Sha3_512,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CipherArg {
    Aes,
    Xtea,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file with AES-256-CBC.
    AesEncrypt {
        /// 32-byte key, hex-encoded.
        #[arg(long)]
        key: String,
        /// 16-byte IV, hex-encoded. Uses the built-in weak default generator if omitted.
        #[arg(long)]
        iv: Option<String>,
        /// File to read plaintext from.
        input: PathBuf,
        /// File to write ciphertext to.
        output: PathBuf,
    },
    /// Decrypt a file with AES-256-CBC.
    AesDecrypt {
        /// 32-byte key, hex-encoded.
        #[arg(long)]
        key: String,
        /// 16-byte IV, hex-encoded. Uses the built-in weak default generator if omitted.
        #[arg(long)]
        iv: Option<String>,
        /// File to read ciphertext from.
        input: PathBuf,
        /// File to write plaintext to.
        output: PathBuf,
    },
    /// Encrypt a file with the rolling-key XTEA variant.
    XteaEncrypt {
        /// 16-byte key, hex-encoded.
        #[arg(long)]
        key: String,
        /// File to read plaintext from.
        input: PathBuf,
        /// File to write ciphertext to.
        output: PathBuf,
    },
    /// Decrypt a file with the rolling-key XTEA variant.
    XteaDecrypt {
        /// 16-byte key, hex-encoded.
        #[arg(long)]
        key: String,
        /// File to read ciphertext from.
        input: PathBuf,
        /// File to write plaintext to.
        output: PathBuf,
    },
    /// Compute an HMAC digest of a file.
    Hmac {
        /// The underlying hash algorithm.
        #[arg(long, value_enum)]
        algorithm: AlgorithmArg,
        /// Authentication key, hex-encoded.
        #[arg(long)]
        key: String,
        /// File to authenticate.
        input: PathBuf,
    },
    /// Compute a systematic CRC of a file.
    CrcEncode {
        /// CRC register width in bits (1-64).
        #[arg(long)]
        width: u32,
        /// CRC polynomial, hex-encoded as an integer, masked to `width` bits.
        #[arg(long)]
        polynomial: String,
        /// File to checksum.
        input: PathBuf,
    },
    /// Recover the message and error residue from a non-systematic-CRC-encoded file.
    CrcDecode {
        /// CRC polynomial, hex-encoded as an integer.
        #[arg(long)]
        polynomial: String,
        /// File containing the encoded ensemble.
        input: PathBuf,
    },
    /// Fold arbitrary text into a fixed-size key for the given cipher.
    GenKey {
        /// The cipher whose key length to target.
        #[arg(value_enum)]
        cipher: CipherArg,
        /// The text to fold into a key.
        text: String,
    },
    /// Print cryptographically random bytes, hex-encoded.
    Random {
        /// Number of random bytes to generate.
        length: usize,
    },
}

fn decode_fixed<const N: usize>(what: &'static str, hex_str: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(hex_str)?;
    let actual = bytes.len();

    bytes.try_into().map_err(|_| Error::WrongLength {
        what,
        expected: N,
        actual,
    })
}

fn logic() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::AesEncrypt {
            key,
            iv,
            input,
            output,
        } => {
            let key = decode_fixed::<{ crypto_core::aes::KEY_LENGTH }>("AES key", &key)?;
            let cipher = match iv {
                Some(iv) => {
                    let iv = decode_fixed::<{ crypto_core::aes::IV_LENGTH }>("AES IV", &iv)?;
                    AesCbcEncryptCipher::with_key_and_iv(key, iv)
                }
                None => AesCbcEncryptCipher::with_key(key),
            };

            let mut encryptor = Encryptor::<AesCbcEncryptCipher, fs::File>::new(cipher);
            encryptor.set_sink(fs::File::create(&output)?);
            encryptor.open();
            stream_encrypt(input, &mut encryptor)?;
        }
        Commands::AesDecrypt {
            key,
            iv,
            input,
            output,
        } => {
            let key = decode_fixed::<{ crypto_core::aes::KEY_LENGTH }>("AES key", &key)?;
            let cipher = match iv {
                Some(iv) => {
                    let iv = decode_fixed::<{ crypto_core::aes::IV_LENGTH }>("AES IV", &iv)?;
                    AesCbcDecryptCipher::with_key_and_iv(key, iv)
                }
                None => AesCbcDecryptCipher::with_key(key),
            };

            let mut decryptor = Decryptor::<AesCbcDecryptCipher, FileSource>::new(cipher);
            decryptor.set_source(FileSource::new(fs::File::open(&input)?)?);
            decryptor.open();
            stream_decrypt(output, &mut decryptor)?;
        }
        Commands::XteaEncrypt { key, input, output } => {
            let key = decode_fixed::<{ crypto_core::xtea::KEY_LENGTH }>("XTEA key", &key)?;
            let cipher = XteaEncryptCipher::with_key(key);

            let mut encryptor = Encryptor::<XteaEncryptCipher, fs::File>::new(cipher);
            encryptor.set_sink(fs::File::create(&output)?);
            encryptor.open();
            stream_encrypt(input, &mut encryptor)?;
        }
        Commands::XteaDecrypt { key, input, output } => {
            let key = decode_fixed::<{ crypto_core::xtea::KEY_LENGTH }>("XTEA key", &key)?;
            let cipher = XteaDecryptCipher::with_key(key);

            let mut decryptor = Decryptor::<XteaDecryptCipher, FileSource>::new(cipher);
            decryptor.set_source(FileSource::new(fs::File::open(&input)?)?);
            decryptor.open();
            stream_decrypt(output, &mut decryptor)?;
        }
        Commands::Hmac {
            algorithm,
            key,
            input,
        } => {
            let key = hex::decode(key)?;
            let data = fs::read(input)?;

            let mut hmac = Hmac::new(&key, algorithm.into());
            hmac.add_data(&data);
            println!("{}", hex::encode(hmac.digest()));
        }
        Commands::CrcEncode {
            width,
            polynomial,
            input,
        } => {
            let polynomial = parse_polynomial(&polynomial)?;
            let data = fs::read(input)?;

            let crc = systematic_crc(width, polynomial, &data);
            println!("{:01$x}", crc, (width as usize + 3) / 4);
        }
        Commands::CrcDecode { polynomial, input } => {
            let polynomial = parse_polynomial(&polynomial)?;
            let ensemble = fs::read(input)?;

            let (quotient, residue) = non_systematic_crc_decode(polynomial, &ensemble);
            if !residue.is_empty() {
                return Err(Error::CrcResidue(residue.len()));
            }

            println!("{}", hex::encode(quotient));
        }
        Commands::GenKey { cipher, text } => {
            let key = match cipher {
                CipherArg::Aes => AesCbcEncryptCipher::new().generate_key_from_str(&text),
                CipherArg::Xtea => XteaEncryptCipher::new().generate_key_from_str(&text),
            };
            println!("{}", hex::encode(key));
        }
        Commands::Random { length } => {
            println!("{}", hex::encode(generate_random_bytes(length)));
        }
    }

    Ok(())
}

fn parse_polynomial(hex_str: &str) -> Result<u64> {
    let bytes = hex::decode(hex_str)?;
    let mut value: u64 = 0;
    for byte in bytes {
        value = (value << 8) | byte as u64;
    }
    Ok(value)
}

fn main() {
    match logic() {
        Ok(_) => {}
        Err(e) => eprintln!("Error: {}", e),
    }
}
