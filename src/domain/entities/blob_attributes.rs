use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Properties, Sha1Hash};

pub const HEADER_PREFIX: &str = "@";
pub const SHA1_HASH_ATTRIBUTE: &str = "sha1";
pub const CONTENT_SIZE_ATTRIBUTE: &str = "size";
pub const CREATION_TIME_ATTRIBUTE: &str = "creationTime";
pub const DELETED_ATTRIBUTE: &str = "deleted";
pub const DELETED_REASON_ATTRIBUTE: &str = "deletedReason";
pub const DELETED_DATETIME_ATTRIBUTE: &str = "deletedDateTime";

pub const DEFAULT_DELETED_REASON: &str = "No reason supplied";

/// Size, creation time and checksum of a blob's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetrics {
    creation_time: DateTime<Utc>,
    sha1: Sha1Hash,
    content_size: u64,
}

impl BlobMetrics {
    /// Creation time is kept at millisecond precision, the resolution it is persisted with.
    pub fn new(creation_time: DateTime<Utc>, sha1: Sha1Hash, content_size: u64) -> Self {
        Self {
            creation_time: truncate_to_millis(creation_time),
            sha1,
            content_size,
        }
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    pub fn sha1(&self) -> &Sha1Hash {
        &self.sha1
    }

    pub fn content_size(&self) -> u64 {
        self.content_size
    }
}

/// Attribute record kept alongside each blob.
///
/// Persisted as properties: headers under `@`-prefixed keys, the metrics
/// under `sha1`/`size`/`creationTime`, and soft-delete markers only while
/// the blob is marked deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobAttributes {
    headers: BTreeMap<String, String>,
    metrics: BlobMetrics,
    deleted: bool,
    deleted_reason: Option<String>,
    deleted_date_time: Option<DateTime<Utc>>,
}

impl BlobAttributes {
    pub fn new(headers: BTreeMap<String, String>, metrics: BlobMetrics) -> Self {
        Self {
            headers,
            metrics,
            deleted: false,
            deleted_reason: None,
            deleted_date_time: None,
        }
    }

    /// Rebuild the record from a loaded properties resource.
    pub fn read_from(properties: &Properties) -> Result<Self, DomainError> {
        let headers = properties
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(HEADER_PREFIX)
                    .map(|name| (name.to_string(), value.to_string()))
            })
            .collect();

        let sha1 = required(properties, SHA1_HASH_ATTRIBUTE)?
            .parse::<Sha1Hash>()
            .map_err(|e| invalid(SHA1_HASH_ATTRIBUTE, e.to_string()))?;
        let content_size = required(properties, CONTENT_SIZE_ATTRIBUTE)?
            .parse::<u64>()
            .map_err(|e| invalid(CONTENT_SIZE_ATTRIBUTE, e.to_string()))?;
        let creation_time = parse_millis(
            CREATION_TIME_ATTRIBUTE,
            required(properties, CREATION_TIME_ATTRIBUTE)?,
        )?;

        let deleted = properties
            .get(DELETED_ATTRIBUTE)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let (deleted_reason, deleted_date_time) = if deleted {
            let reason = properties
                .get_or(DELETED_REASON_ATTRIBUTE, DEFAULT_DELETED_REASON)
                .to_string();
            let at = properties
                .get(DELETED_DATETIME_ATTRIBUTE)
                .map(|v| parse_millis(DELETED_DATETIME_ATTRIBUTE, v))
                .transpose()?;
            (Some(reason), at)
        } else {
            (None, None)
        };

        Ok(Self {
            headers,
            metrics: BlobMetrics::new(creation_time, sha1, content_size),
            deleted,
            deleted_reason,
            deleted_date_time,
        })
    }

    /// Write the record into `properties`, replacing any previous header
    /// entries and soft-delete markers. Unrelated keys are left alone.
    pub fn write_to(&self, properties: &mut Properties) {
        let stale_headers: Vec<String> = properties
            .iter()
            .filter(|(key, _)| key.starts_with(HEADER_PREFIX))
            .map(|(key, _)| key.to_string())
            .collect();
        for key in stale_headers {
            properties.remove(&key);
        }

        for (name, value) in &self.headers {
            properties.set(format!("{}{}", HEADER_PREFIX, name), value.clone());
        }
        properties.set(SHA1_HASH_ATTRIBUTE, self.metrics.sha1.as_hex());
        properties.set(
            CONTENT_SIZE_ATTRIBUTE,
            self.metrics.content_size.to_string(),
        );
        properties.set(
            CREATION_TIME_ATTRIBUTE,
            self.metrics.creation_time.timestamp_millis().to_string(),
        );

        if self.deleted {
            properties.set(DELETED_ATTRIBUTE, "true");
            properties.set(DELETED_REASON_ATTRIBUTE, self.deleted_reason());
            match self.deleted_date_time {
                Some(at) => {
                    properties.set(DELETED_DATETIME_ATTRIBUTE, at.timestamp_millis().to_string());
                }
                None => {
                    properties.remove(DELETED_DATETIME_ATTRIBUTE);
                }
            }
        } else {
            properties.remove(DELETED_ATTRIBUTE);
            properties.remove(DELETED_REASON_ATTRIBUTE);
            properties.remove(DELETED_DATETIME_ATTRIBUTE);
        }
    }

    /// Soft-delete marker, stamped with the current time
    pub fn mark_deleted(&mut self, reason: impl Into<String>) {
        self.mark_deleted_at(reason, Utc::now());
    }

    pub fn mark_deleted_at(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_reason = Some(reason.into());
        self.deleted_date_time = Some(truncate_to_millis(at));
    }

    pub fn undelete(&mut self) {
        self.deleted = false;
        self.deleted_reason = None;
        self.deleted_date_time = None;
    }

    /// Copy every field of `other` into this record.
    pub fn update_from(&mut self, other: &BlobAttributes) {
        self.clone_from(other);
    }

    // Getters
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn metrics(&self) -> &BlobMetrics {
        &self.metrics
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn deleted_reason(&self) -> &str {
        self.deleted_reason
            .as_deref()
            .unwrap_or(DEFAULT_DELETED_REASON)
    }

    pub fn deleted_date_time(&self) -> Option<DateTime<Utc>> {
        self.deleted_date_time
    }
}

fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

fn required<'a>(properties: &'a Properties, key: &str) -> Result<&'a str, DomainError> {
    properties
        .get(key)
        .ok_or_else(|| DomainError::MissingAttribute(key.to_string()))
}

fn invalid(key: &str, reason: String) -> DomainError {
    DomainError::InvalidAttribute {
        key: key.to_string(),
        reason,
    }
}

fn parse_millis(key: &str, value: &str) -> Result<DateTime<Utc>, DomainError> {
    let millis = value
        .trim()
        .parse::<i64>()
        .map_err(|e| invalid(key, e.to_string()))?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| invalid(key, format!("timestamp {} out of range", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_metrics() -> BlobMetrics {
        BlobMetrics::new(
            Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            Sha1Hash::from_hex("a".repeat(40)).unwrap(),
            2048,
        )
    }

    fn sample_attributes() -> BlobAttributes {
        let mut headers = BTreeMap::new();
        headers.insert("BlobStore.blob-name".to_string(), "foo/bar.jar".to_string());
        headers.insert("BlobStore.created-by".to_string(), "admin".to_string());
        BlobAttributes::new(headers, sample_metrics())
    }

    #[test]
    fn test_write_to_uses_prefixed_headers() {
        let attributes = sample_attributes();
        let mut props = Properties::new();
        attributes.write_to(&mut props);

        assert_eq!(props.get("@BlobStore.blob-name"), Some("foo/bar.jar"));
        assert_eq!(props.get(SHA1_HASH_ATTRIBUTE), Some("a".repeat(40).as_str()));
        assert_eq!(props.get(CONTENT_SIZE_ATTRIBUTE), Some("2048"));
        assert_eq!(props.get(CREATION_TIME_ATTRIBUTE), Some("1700000000123"));
        assert!(!props.contains_key(DELETED_ATTRIBUTE));
    }

    #[test]
    fn test_read_from_restores_written_record() {
        let attributes = sample_attributes();
        let mut props = Properties::new();
        attributes.write_to(&mut props);

        let restored = BlobAttributes::read_from(&props).unwrap();
        assert_eq!(restored, attributes);
    }

    #[test]
    fn test_mark_deleted_writes_markers() {
        let mut attributes = sample_attributes();
        let at = Utc.timestamp_millis_opt(1_700_000_100_000).unwrap();
        attributes.mark_deleted_at("compaction", at);

        let mut props = Properties::new();
        attributes.write_to(&mut props);
        assert_eq!(props.get(DELETED_ATTRIBUTE), Some("true"));
        assert_eq!(props.get(DELETED_REASON_ATTRIBUTE), Some("compaction"));
        assert_eq!(props.get(DELETED_DATETIME_ATTRIBUTE), Some("1700000100000"));

        let restored = BlobAttributes::read_from(&props).unwrap();
        assert!(restored.is_deleted());
        assert_eq!(restored.deleted_reason(), "compaction");
        assert_eq!(restored.deleted_date_time(), Some(at));
    }

    #[test]
    fn test_undelete_clears_markers_from_existing_properties() {
        let mut attributes = sample_attributes();
        attributes.mark_deleted("oops");
        let mut props = Properties::new();
        attributes.write_to(&mut props);

        attributes.undelete();
        attributes.write_to(&mut props);
        assert!(!props.contains_key(DELETED_ATTRIBUTE));
        assert!(!props.contains_key(DELETED_REASON_ATTRIBUTE));
        assert!(!props.contains_key(DELETED_DATETIME_ATTRIBUTE));
    }

    #[test]
    fn test_write_to_drops_stale_headers_but_keeps_unrelated_keys() {
        let mut props = Properties::new();
        props.set("@Old-Header", "gone");
        props.set("custom", "kept");

        sample_attributes().write_to(&mut props);
        assert!(!props.contains_key("@Old-Header"));
        assert_eq!(props.get("custom"), Some("kept"));
    }

    #[test]
    fn test_read_from_deleted_without_reason_uses_default() {
        let mut props = Properties::new();
        sample_attributes().write_to(&mut props);
        props.set(DELETED_ATTRIBUTE, "TRUE");

        let restored = BlobAttributes::read_from(&props).unwrap();
        assert!(restored.is_deleted());
        assert_eq!(restored.deleted_reason(), DEFAULT_DELETED_REASON);
        assert_eq!(restored.deleted_date_time(), None);
    }

    #[test]
    fn test_read_from_missing_size() {
        let mut props = Properties::new();
        sample_attributes().write_to(&mut props);
        props.remove(CONTENT_SIZE_ATTRIBUTE);

        let err = BlobAttributes::read_from(&props).unwrap_err();
        assert_eq!(err, DomainError::MissingAttribute("size".to_string()));
    }

    #[test]
    fn test_read_from_invalid_creation_time() {
        let mut props = Properties::new();
        sample_attributes().write_to(&mut props);
        props.set(CREATION_TIME_ATTRIBUTE, "yesterday");

        let err = BlobAttributes::read_from(&props).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAttribute { ref key, .. } if key == "creationTime"));
    }

    #[test]
    fn test_blob_metrics_truncates_to_millis() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let metrics = BlobMetrics::new(at, Sha1Hash::default(), 1);
        assert_eq!(metrics.creation_time().timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn test_update_from_copies_all_fields() {
        let mut target = BlobAttributes::new(BTreeMap::new(), BlobMetrics::new(Utc::now(), Sha1Hash::default(), 0));
        let mut source = sample_attributes();
        source.mark_deleted("replaced");

        target.update_from(&source);
        assert_eq!(target, source);
    }
}
