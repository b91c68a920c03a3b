//! Event Envelope & Metadata: the on-wire format for bus traffic. `Event` carries the CloudEvents 1.0 attributes; `Metadata` carries
//! correlation/causation/tenant/priority bookkeeping; `Envelope` is the pair
//! plus a schema-evolution stamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const SPEC_VERSION: &str = "1.0";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0.0";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_PRIORITY: u8 = 5;

/// CloudEvents 1.0 attributes. `data` is left as a
/// `serde_json::Value` at the wire boundary; typed payloads are recovered
/// by the consumer dispatcher via the handler-registry deserialiser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub source: String,
    pub specversion: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub datacontenttype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub time: DateTime<Utc>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub correlation_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub published_at: DateTime<Utc>,
    pub priority: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        Metadata {
            correlation_id: Uuid::new_v4(),
            causation_id: None,
            tenant_id: None,
            user_id: None,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            published_at: now,
            priority: DEFAULT_PRIORITY,
            partition_key: None,
            headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: Event,
    pub metadata: Metadata,
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
}

/// Parameters accepted by `Envelope::create` beyond the payload itself
///. All fields are optional; sensible defaults apply.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub subject: Option<String>,
    pub correlation_id: Option<Uuid>,
    pub partition_key: Option<String>,
    pub causation_id: Option<Uuid>,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
    pub priority: Option<u8>,
}

impl Envelope {
    /// Builds a new envelope around `data`, filling `id`, `time`,
    /// `specversion`, `datacontenttype`, `correlationId` and `publishedAt`
    /// per the envelope constructor contract.
    pub fn create<T: Serialize>(
        data: &T,
        event_type: impl Into<String>,
        source: impl Into<String>,
        options: CreateOptions,
    ) -> Result<Envelope, serde_json::Error> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            source: source.into(),
            specversion: SPEC_VERSION.to_string(),
            event_type: event_type.into(),
            datacontenttype: DEFAULT_CONTENT_TYPE.to_string(),
            dataschema: None,
            subject: options.subject,
            time: now,
            data: serde_json::to_value(data)?,
        };

        let metadata = Metadata {
            correlation_id: options.correlation_id.unwrap_or_else(Uuid::new_v4),
            causation_id: options.causation_id,
            tenant_id: options.tenant_id,
            user_id: options.user_id,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            published_at: now,
            priority: options.priority.unwrap_or(DEFAULT_PRIORITY),
            partition_key: options.partition_key,
            headers: HashMap::new(),
        };

        Ok(Envelope {
            event,
            metadata,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        })
    }

    pub fn partition_key(&self) -> String {
        self.metadata
            .partition_key
            .clone()
            .unwrap_or_else(|| self.event.id.to_string())
    }

    /// Selected metadata lifted onto wire headers: always
    /// `correlation-id`, plus whichever of the optional fields are set,
    /// plus any caller-supplied headers.
    pub fn to_headers(&self) -> HashMap<String, String> {
        let mut headers = self.metadata.headers.clone();
        headers.insert("correlation-id".to_string(), self.metadata.correlation_id.to_string());
        if let Some(causation_id) = self.metadata.causation_id {
            headers.insert("causation-id".to_string(), causation_id.to_string());
        }
        if let Some(tenant_id) = &self.metadata.tenant_id {
            headers.insert("tenant-id".to_string(), tenant_id.clone());
        }
        if let Some(user_id) = &self.metadata.user_id {
            headers.insert("user-id".to_string(), user_id.clone());
        }
        headers.insert("priority".to_string(), self.metadata.priority.to_string());
        headers.insert("schema-version".to_string(), self.schema_version.clone());
        headers
    }

    /// Reconstitutes metadata from wire headers: headers win
    /// for `correlationId`, `causationId`, `tenantId`, `userId`, `priority`;
    /// any other header is folded back into `headers`.
    pub fn metadata_from_headers(mut metadata: Metadata, headers: &HashMap<String, String>) -> Metadata {
        let mut leftover = HashMap::new();
        for (key, value) in headers {
            match key.as_str() {
                "correlation-id" => {
                    if let Ok(id) = value.parse() {
                        metadata.correlation_id = id;
                    }
                }
                "causation-id" => {
                    metadata.causation_id = value.parse().ok();
                }
                "tenant-id" => metadata.tenant_id = Some(value.clone()),
                "user-id" => metadata.user_id = Some(value.clone()),
                "priority" => {
                    if let Ok(p) = value.parse() {
                        metadata.priority = p;
                    }
                }
                "schema-version" => {}
                _ => {
                    leftover.insert(key.clone(), value.clone());
                }
            }
        }
        metadata.headers = leftover;
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn create_fills_defaults() {
        let envelope =
            Envelope::create(&Payload { value: 1 }, "ResourceCreated", "catalog", CreateOptions::default())
                .unwrap();
        assert_eq!(envelope.event.specversion, "1.0");
        assert_eq!(envelope.event.datacontenttype, "application/json");
        assert_eq!(envelope.schema_version, "1.0.0");
        assert_eq!(envelope.metadata.retry_count, 0);
        assert_eq!(envelope.metadata.max_retries, 5);
    }

    #[test]
    fn serialise_round_trips() {
        let envelope =
            Envelope::create(&Payload { value: 42 }, "ResourceCreated", "catalog", CreateOptions::default())
                .unwrap();
        let json = serde_json::to_string(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.event.id, envelope.event.id);
        assert_eq!(decoded.metadata.correlation_id, envelope.metadata.correlation_id);
        assert_eq!(decoded.event.data, envelope.event.data);
    }

    #[test]
    fn headers_carry_correlation_id() {
        let envelope =
            Envelope::create(&Payload { value: 1 }, "ResourceCreated", "catalog", CreateOptions::default())
                .unwrap();
        let headers = envelope.to_headers();
        assert_eq!(
            headers.get("correlation-id"),
            Some(&envelope.metadata.correlation_id.to_string())
        );
    }

    #[test]
    fn headers_win_over_stale_metadata_on_reconstitution() {
        let mut headers = HashMap::new();
        let new_correlation = Uuid::new_v4();
        headers.insert("correlation-id".to_string(), new_correlation.to_string());
        headers.insert("x-custom".to_string(), "value".to_string());

        let metadata = Envelope::metadata_from_headers(Metadata::default(), &headers);
        assert_eq!(metadata.correlation_id, new_correlation);
        assert_eq!(metadata.headers.get("x-custom"), Some(&"value".to_string()));
    }
}
