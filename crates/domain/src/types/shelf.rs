//! Shelf (temporary blob storage) types

use std::collections::BTreeSet;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{SHELF_NAME_PREFIX, SHELF_USER_NAMESPACE};
use crate::errors::ShelfUploadError;

/// Name of an object on the shelf, without the user namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShelfName(String);

impl ShelfName {
    /// A fresh name that no other upload will ever use.
    pub fn generate() -> Self {
        Self(format!("{SHELF_NAME_PREFIX}-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as the shelf endpoints expect it: scoped under the
    /// implicit-user namespace unless the caller already scoped it.
    pub fn namespaced(&self) -> String {
        if self.0.contains(SHELF_USER_NAMESPACE) {
            self.0.clone()
        } else {
            format!("{SHELF_USER_NAMESPACE}/{}", self.0)
        }
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for ShelfName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ShelfName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ShelfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contiguous slice of an upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfPart {
    pub index: usize,
    pub offset: usize,
    pub data: Bytes,
    pub is_last: bool,
}

/// Split `payload` into parts of `part_length` bytes, the last one holding
/// the remainder.
///
/// An empty payload still yields a single empty last part, so the server
/// gets a finalizing write for the object.
pub fn split_into_parts(payload: &Bytes, part_length: usize) -> Vec<ShelfPart> {
    let part_length = part_length.max(1);
    if payload.is_empty() {
        return vec![ShelfPart { index: 0, offset: 0, data: Bytes::new(), is_last: true }];
    }

    let count = payload.len().div_ceil(part_length);
    (0..count)
        .map(|index| {
            let offset = index * part_length;
            let end = (offset + part_length).min(payload.len());
            ShelfPart { index, offset, data: payload.slice(offset..end), is_last: index + 1 == count }
        })
        .collect()
}

/// Parse a `ShelfUpload` response body: a JSON array of part indices the
/// server has not stored yet. `None` for an empty body.
pub fn parse_missing_parts(body: &[u8]) -> Result<Option<BTreeSet<usize>>, ShelfUploadError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let indices: Vec<usize> = serde_json::from_slice(body)
        .map_err(|e| ShelfUploadError::MalformedMissingParts(e.to_string()))?;
    Ok(Some(indices.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SHELF_PART_LENGTH;

    fn payload(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>())
    }

    #[test]
    fn parts_partition_payload_exactly() {
        for len in [1, 10, SHELF_PART_LENGTH - 1, SHELF_PART_LENGTH, SHELF_PART_LENGTH + 1, 3 * SHELF_PART_LENGTH + 17] {
            let data = payload(len);
            let parts = split_into_parts(&data, SHELF_PART_LENGTH);

            assert_eq!(parts.len(), len.div_ceil(SHELF_PART_LENGTH), "len {len}");
            let mut offset = 0;
            let mut joined = Vec::with_capacity(len);
            for (i, part) in parts.iter().enumerate() {
                assert_eq!(part.index, i);
                assert_eq!(part.offset, offset);
                assert_eq!(part.is_last, i + 1 == parts.len());
                if !part.is_last {
                    assert_eq!(part.data.len(), SHELF_PART_LENGTH);
                }
                offset += part.data.len();
                joined.extend_from_slice(&part.data);
            }
            assert_eq!(joined, data.to_vec());
        }
    }

    #[test]
    fn empty_payload_yields_single_empty_last_part() {
        let parts = split_into_parts(&Bytes::new(), SHELF_PART_LENGTH);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_last);
        assert!(parts[0].data.is_empty());
        assert_eq!(parts[0].index, 0);
    }

    #[test]
    fn generated_names_are_unique_and_namespaced() {
        let a = ShelfName::generate();
        let b = ShelfName::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rust_api-"));
        assert_eq!(a.namespaced(), format!("__userId__/{a}"));
    }

    #[test]
    fn already_namespaced_name_is_kept() {
        let name = ShelfName::from("__userId__/report.zip");
        assert_eq!(name.namespaced(), "__userId__/report.zip");
    }

    #[test]
    fn missing_parts_parsing() {
        assert_eq!(parse_missing_parts(b"").unwrap(), None);
        assert_eq!(parse_missing_parts(b"  \n").unwrap(), None);
        assert_eq!(parse_missing_parts(b"[]").unwrap(), Some(BTreeSet::new()));
        assert_eq!(parse_missing_parts(b"[5, 2, 2]").unwrap(), Some(BTreeSet::from([2, 5])));
        assert!(matches!(
            parse_missing_parts(b"{\"oops\": 1}"),
            Err(ShelfUploadError::MalformedMissingParts(_))
        ));
    }
}
