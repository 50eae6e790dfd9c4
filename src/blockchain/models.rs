//! Decoding of contract return data and storage values.
//!
//! Numbers are big-endian unsigned integers of arbitrary width; an empty
//! buffer is zero. Addresses are 32 raw bytes rendered as lowercase hex.

use crate::blockchain::client::LedgerError;
use bigdecimal::{BigDecimal, ToPrimitive, Zero};

/// Take the single return value of a view, failing when none came back
pub fn first_value(values: Vec<Vec<u8>>, method: &str) -> Result<Vec<u8>, LedgerError> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::Decode(format!("{} returned no data", method)))
}

pub fn decode_biguint(data: &[u8]) -> BigDecimal {
    data.iter().fold(BigDecimal::zero(), |acc, byte| {
        acc * BigDecimal::from(256u32) + BigDecimal::from(u32::from(*byte))
    })
}

pub fn decode_u64(data: &[u8]) -> Result<u64, LedgerError> {
    if data.len() > 8 {
        return Err(LedgerError::Decode(format!(
            "expected at most 8 bytes for u64, got {}",
            data.len()
        )));
    }
    Ok(data.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

pub fn decode_bool(data: &[u8]) -> Result<bool, LedgerError> {
    match decode_u64(data)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(LedgerError::Decode(format!("invalid bool value {}", other))),
    }
}

pub fn decode_string(data: &[u8]) -> Result<String, LedgerError> {
    String::from_utf8(data.to_vec()).map_err(|e| LedgerError::Decode(format!("invalid utf-8: {}", e)))
}

pub fn decode_address(data: &[u8]) -> Result<String, LedgerError> {
    if data.len() != 32 {
        return Err(LedgerError::Decode(format!(
            "expected 32 address bytes, got {}",
            data.len()
        )));
    }
    Ok(hex::encode(data))
}

fn hex_bytes(value: &str) -> Result<Vec<u8>, LedgerError> {
    hex::decode(value.trim()).map_err(|e| LedgerError::Decode(format!("invalid hex storage value: {}", e)))
}

/// Storage values come back hex encoded; an unset key is an empty string
pub fn decode_hex_u64(value: &str) -> Result<u64, LedgerError> {
    decode_u64(&hex_bytes(value)?)
}

pub fn decode_hex_string(value: &str) -> Result<String, LedgerError> {
    decode_string(&hex_bytes(value)?)
}

pub fn decode_hex_address(value: &str) -> Result<String, LedgerError> {
    decode_address(&hex_bytes(value)?)
}

/// Minimal big-endian encoding of a non-negative integer
pub fn encode_biguint(value: &BigDecimal) -> Result<Vec<u8>, LedgerError> {
    let mut remaining = value.with_scale(0);
    if remaining < BigDecimal::zero() || remaining != *value {
        return Err(LedgerError::Decode(format!(
            "cannot encode {} as an unsigned integer",
            value
        )));
    }

    let base = BigDecimal::from(256u32);
    let mut bytes = Vec::new();
    while remaining > BigDecimal::zero() {
        let rem = &remaining % &base;
        let byte = rem
            .to_u8()
            .ok_or_else(|| LedgerError::Decode(format!("cannot encode {}", value)))?;
        bytes.push(byte);
        remaining = ((remaining - rem) / &base).with_scale(0);
    }
    bytes.reverse();
    Ok(bytes)
}

/// Cursor over nested-encoded bytes: fixed-width integers and addresses,
/// and `u32` length-prefixed buffers for strings, token identifiers and big
/// integers. Lists at the top level are plain concatenations of items.
pub struct NestedDecoder<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> NestedDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8], LedgerError> {
        let end = self
            .position
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                LedgerError::Decode(format!(
                    "nested value needs {} bytes at offset {}, only {} left",
                    length,
                    self.position,
                    self.data.len().saturating_sub(self.position)
                ))
            })?;
        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, LedgerError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, LedgerError> {
        Ok(self.take(4)?.iter().fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte)))
    }

    pub fn read_u64(&mut self) -> Result<u64, LedgerError> {
        decode_u64(self.take(8)?)
    }

    pub fn read_address(&mut self) -> Result<String, LedgerError> {
        decode_address(self.take(32)?)
    }

    pub fn read_buffer(&mut self) -> Result<&'a [u8], LedgerError> {
        let length = self.read_u32()? as usize;
        self.take(length)
    }

    pub fn read_string(&mut self) -> Result<String, LedgerError> {
        decode_string(self.read_buffer()?)
    }

    pub fn read_biguint(&mut self) -> Result<BigDecimal, LedgerError> {
        Ok(decode_biguint(self.read_buffer()?))
    }

    /// `u32` item count followed by the items
    pub fn read_list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, LedgerError>,
    ) -> Result<Vec<T>, LedgerError> {
        let count = self.read_u32()?;
        (0..count).map(|_| item(self)).collect()
    }
}

/// Token identifier of one NFT/SFT nonce: the collection, a dash, and the
/// nonce in hex padded to an even number of digits
pub fn token_identifier(collection: &str, nonce: u64) -> String {
    let mut nonce_hex = format!("{:x}", nonce);
    if nonce_hex.len() % 2 == 1 {
        nonce_hex.insert(0, '0');
    }
    format!("{}-{}", collection, nonce_hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_decoder_reads_in_order() {
        let mut data = vec![0, 0, 0, 3];
        data.extend_from_slice(b"MEX");
        data.extend_from_slice(&7u64.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 2, 0x01, 0x00]);

        let mut decoder = NestedDecoder::new(&data);
        assert_eq!(decoder.read_string().unwrap(), "MEX");
        assert_eq!(decoder.read_u64().unwrap(), 7);
        assert_eq!(decoder.read_biguint().unwrap(), BigDecimal::from(256));
        assert!(decoder.is_empty());
        assert!(decoder.read_u8().is_err());
    }

    #[test]
    fn test_truncated_buffer_is_a_decode_error() {
        let mut decoder = NestedDecoder::new(&[0, 0, 0, 9, 1, 2]);
        assert!(matches!(decoder.read_buffer(), Err(LedgerError::Decode(_))));
    }

    #[test]
    fn test_token_identifier_pads_the_nonce() {
        assert_eq!(token_identifier("LKMEX-aab910", 1), "LKMEX-aab910-01");
        assert_eq!(token_identifier("LKMEX-aab910", 0x1a2), "LKMEX-aab910-01a2");
    }
}
