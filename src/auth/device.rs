//! Per-login synthetic device fingerprint.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use super::error::AuthError;

const DEVICE_TOKEN_BYTES: usize = 16;
const GROUP_LENGTHS: [usize; 5] = [4, 2, 2, 2, 6];

/// Device fingerprint sent with the password grant.
///
/// Five lowercase hex groups of 8-4-4-4-12 characters built from raw random
/// bytes. It looks like a UUID but carries no version or variant bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceToken(String);

impl DeviceToken {
    /// Draw a fresh token from the OS secure random source.
    pub fn generate() -> Result<Self, AuthError> {
        let mut bytes = [0u8; DEVICE_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| AuthError::DeviceToken(err.to_string()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: [u8; DEVICE_TOKEN_BYTES]) -> Self {
        let mut groups = Vec::with_capacity(GROUP_LENGTHS.len());
        let mut offset = 0;
        for len in GROUP_LENGTHS {
            groups.push(hex::encode(&bytes[offset..offset + len]));
            offset += len;
        }
        Self(groups.join("-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
