// src/cfg/secure.rs

use secure_string::SecureString;
use serde::{Deserialize, Deserializer};

/// Read a plain JSON string straight into a `SecureString`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<SecureString, D::Error>
where
    D: Deserializer<'de>,
{
    let plain = String::deserialize(deserializer)?;
    Ok(SecureString::from(plain))
}
