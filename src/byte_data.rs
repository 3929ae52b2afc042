//! Byte values delivered to the render sink

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single byte of the file with helpers for the different display columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteData(u8);

impl ByteData {
    pub fn new(value: u8) -> Self {
        ByteData(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Two lowercase hex digits
    pub fn to_hex(&self) -> String {
        format!("{:02x}", self.0)
    }

    /// Eight binary digits, most significant first
    pub fn to_binary(&self) -> String {
        format!("{:08b}", self.0)
    }

    pub fn to_decimal(&self) -> String {
        self.0.to_string()
    }

    /// Printable ASCII character, or '.' for anything else
    pub fn to_ascii(&self) -> char {
        if self.0.is_ascii_graphic() || self.0 == b' ' {
            self.0 as char
        } else {
            '.'
        }
    }
}

impl From<u8> for ByteData {
    fn from(value: u8) -> Self {
        ByteData(value)
    }
}

impl fmt::Display for ByteData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// One byte of the file together with its absolute offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteUnit {
    pub offset: u64,
    pub data: ByteData,
}

impl ByteUnit {
    pub fn new(offset: u64, value: u8) -> Self {
        ByteUnit {
            offset,
            data: ByteData(value),
        }
    }
}
