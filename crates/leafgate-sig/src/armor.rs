//! ASCII armor decoding (RFC 4880 §6.2).

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ArmorError;

/// Block type declared by an armor header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockType {
    Signature,
    PublicKey,
    PrivateKey,
    Message,
    Other(String),
}

impl BlockType {
    fn from_label(label: &str) -> Self {
        match label {
            "PGP SIGNATURE" => BlockType::Signature,
            "PGP PUBLIC KEY BLOCK" => BlockType::PublicKey,
            "PGP PRIVATE KEY BLOCK" => BlockType::PrivateKey,
            "PGP MESSAGE" => BlockType::Message,
            other => BlockType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BlockType::Signature => "PGP SIGNATURE",
            BlockType::PublicKey => "PGP PUBLIC KEY BLOCK",
            BlockType::PrivateKey => "PGP PRIVATE KEY BLOCK",
            BlockType::Message => "PGP MESSAGE",
            BlockType::Other(label) => label,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// A decoded armor block.
#[derive(Debug, Clone)]
pub struct Armored {
    pub block_type: BlockType,
    pub headers:    Vec<(String, String)>,
    pub data:       Vec<u8>,
}

/// Decode the first armor block in `input`.
///
/// Text before the `-----BEGIN` line is skipped. The CRC-24 checksum line
/// is optional but must match when present.
pub fn decode(input: &[u8]) -> Result<Armored, ArmorError> {
    let mut lines = input.split(|&b| b == b'\n').map(<[u8]>::trim_ascii_end);

    let label = loop {
        let line = lines.next().ok_or(ArmorError::NotArmored)?;
        if let Some(label) = line
            .strip_prefix(b"-----BEGIN ")
            .and_then(|rest| rest.strip_suffix(b"-----"))
        {
            break std::str::from_utf8(label)
                .map_err(|_| ArmorError::Malformed("block label is not UTF-8"))?;
        }
    };

    let mut headers = Vec::new();
    loop {
        let line = lines.next().ok_or(ArmorError::Malformed("missing armor body"))?;
        if line.is_empty() {
            break;
        }
        let text = std::str::from_utf8(line)
            .map_err(|_| ArmorError::Malformed("armor header is not UTF-8"))?;
        let (key, value) = text
            .split_once(": ")
            .ok_or(ArmorError::Malformed("invalid armor header line"))?;
        headers.push((key.to_string(), value.to_string()));
    }

    let tail = format!("-----END {label}-----");
    let mut body = Vec::new();
    let mut checksum: Option<&[u8]> = None;
    loop {
        let line = lines.next().ok_or(ArmorError::Malformed("missing armor tail"))?;
        if line == tail.as_bytes() {
            break;
        }
        if line.starts_with(b"-----") {
            return Err(ArmorError::Malformed("armor tail does not match header"));
        }
        if checksum.is_some() && !line.is_empty() {
            return Err(ArmorError::Malformed("data after armor checksum"));
        }
        match line.strip_prefix(b"=") {
            Some(crc) => checksum = Some(crc),
            None => body.extend_from_slice(line),
        }
    }

    let data = STANDARD.decode(&body)?;
    if let Some(crc) = checksum {
        let raw = STANDARD.decode(crc)?;
        let [a, b, c] = raw[..] else {
            return Err(ArmorError::Malformed("armor checksum must be 3 bytes"));
        };
        let expected = u32::from_be_bytes([0, a, b, c]);
        let actual = crc24(&data);
        if expected != actual {
            return Err(ArmorError::Checksum { expected, actual });
        }
    }

    Ok(Armored {
        block_type: BlockType::from_label(label),
        headers,
        data,
    })
}

fn crc24(data: &[u8]) -> u32 {
    const INIT: u32 = 0x00B7_04CE;
    const POLY: u32 = 0x0186_4CFB;

    let mut crc = INIT;
    for &byte in data {
        crc ^= u32::from(byte) << 16;
        for _ in 0..8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= POLY;
            }
        }
    }
    crc & 0x00FF_FFFF
}
