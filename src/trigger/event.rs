// file: src/trigger/event.rs
// description: storage change notification envelope
// reference: s3 event notification json records

use crate::error::Result;
use crate::models::ObjectRef;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

const CREATION_PREFIX: &str = "ObjectCreated";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntity {
    /// Form-encoded as delivered by the notification service.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl StorageEvent {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Single creation record for an already-decoded key.
    pub fn synthetic(bucket: &str, key: &str) -> Self {
        let encoded: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
        Self {
            records: vec![EventRecord {
                event_name: Some(format!("{}:Put", CREATION_PREFIX)),
                s3: S3Entity {
                    bucket: BucketEntity {
                        name: bucket.to_string(),
                    },
                    object: ObjectEntity {
                        key: encoded.replace("%2F", "/"),
                        size: None,
                    },
                },
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EventRecord {
    /// Records without an event name are treated as creations.
    pub fn is_creation(&self) -> bool {
        self.event_name
            .as_deref()
            .is_none_or(|name| name.starts_with(CREATION_PREFIX))
    }

    pub fn event_name(&self) -> &str {
        self.event_name.as_deref().unwrap_or("unknown")
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(
            self.s3.bucket.name.as_str(),
            decode_key(&self.s3.object.key),
        )
    }
}

/// `+` becomes a space and `%XX` sequences are decoded.
pub fn decode_key(raw: &str) -> String {
    let escaped = raw.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_default()
}
