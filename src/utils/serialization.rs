use thiserror::Error;

/// Leading bytes of every persisted blob.
pub const MAGIC: [u8; 4] = *b"DSIX";

/// Format version written after the magic bytes.
pub const FORMAT_VERSION: u32 = 1;

/// Reasons a persisted blob is rejected.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The blob does not start with [`MAGIC`].
    #[error("not a docsync index: bad magic header")]
    BadMagic,
    /// The blob was written by a newer format.
    #[error("index format version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version stored in the blob
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
    /// The payload is truncated or structurally invalid.
    #[error("malformed index payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// Bytes remained after the payload was decoded.
    #[error("{0} trailing bytes after index payload")]
    TrailingBytes(usize),
    /// Encoding failed.
    #[error("failed to encode index: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

/// Get the bincode configuration
fn get_config() -> impl bincode::config::Config {
    // Limit allocation to prevent memory exhaustion on corrupt data
    bincode::config::standard().with_limit::<{ 100 * 1024 * 1024 }>() // 100MB limit
}

/// Serialize data with the magic header and format version in front.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn serialize<T: serde::Serialize>(data: &T) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend(bincode::serde::encode_to_vec(data, get_config())?);
    Ok(out)
}

/// Deserialize a blob produced by [`serialize`].
///
/// # Errors
///
/// Returns an error if:
/// - The header is missing or names an unknown version
/// - The payload is malformed, truncated, or followed by extra bytes
pub fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, FormatError> {
    let header_len = MAGIC.len() + 4;
    if bytes.len() < header_len || bytes[..MAGIC.len()] != MAGIC {
        return Err(FormatError::BadMagic);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[MAGIC.len()..header_len]);
    let version = u32::from_le_bytes(version);
    if version > FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let payload = &bytes[header_len..];
    let (result, bytes_read) = bincode::serde::decode_from_slice(payload, get_config())?;
    if bytes_read != payload.len() {
        return Err(FormatError::TrailingBytes(payload.len() - bytes_read));
    }
    Ok(result)
}

/// Serde adapter for maps keyed by path, storing each key as raw OS bytes.
///
/// serde's own `Path` impl refuses names that are not valid UTF-8; these keys
/// round-trip any name the filesystem accepts. Use with
/// `#[serde(with = "path_keys")]`.
pub mod path_keys {
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::borrow::Cow;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    /// Write `map` with byte-string keys.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<V, S>(map: &BTreeMap<PathBuf, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (path, value) in map {
            out.serialize_entry(&to_bytes(path), value)?;
        }
        out.end()
    }

    /// Read a map written by [`serialize`].
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error.
    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<PathBuf, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<Vec<u8>, V>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(k, v)| (from_bytes(k), v)).collect())
    }

    #[cfg(unix)]
    fn to_bytes(path: &Path) -> Cow<'_, [u8]> {
        use std::os::unix::ffi::OsStrExt;
        Cow::Borrowed(path.as_os_str().as_bytes())
    }

    #[cfg(unix)]
    fn from_bytes(bytes: Vec<u8>) -> PathBuf {
        use std::os::unix::ffi::OsStringExt;
        PathBuf::from(std::ffi::OsString::from_vec(bytes))
    }

    #[cfg(not(unix))]
    fn to_bytes(path: &Path) -> Cow<'_, [u8]> {
        Cow::Owned(path.to_string_lossy().into_owned().into_bytes())
    }

    #[cfg(not(unix))]
    fn from_bytes(bytes: Vec<u8>) -> PathBuf {
        PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
    }
}
