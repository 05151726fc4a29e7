//! Transport-independent view of an inbound request.

use std::collections::HashMap;

use bytes::Bytes;
use serde_json::Value;

use crate::gateway::operation::Source;

/// A buffered file upload.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Declared MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Bytes,
}

impl Attachment {
    /// Extension derived from the MIME subtype (`image/jpeg` → `jpeg`).
    pub fn extension(&self) -> &str {
        let essence = self.content_type.split(';').next().unwrap_or_default();
        essence.split_once('/').map(|(_, sub)| sub.trim()).unwrap_or_default()
    }

    pub fn is_image(&self) -> bool {
        self.content_type.trim_start().to_ascii_lowercase().starts_with("image/")
    }
}

/// Everything an operation may read from the caller's request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
    pub attachment: Option<Attachment>,
    /// Correlation ID forwarded to the upstream.
    pub request_id: Option<String>,
}

impl InboundRequest {
    pub fn with_body(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Top-level body field.
    pub fn body_field(&self, name: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|b| b.get(name))
    }

    /// Resolve a value source. Path and query values surface as JSON strings.
    pub fn lookup(&self, source: Source) -> Option<Value> {
        match source {
            Source::Path(name) => self.path_params.get(name).cloned().map(Value::String),
            Source::Query(name) => self.query.get(name).cloned().map(Value::String),
            Source::Body(name) => self.body_field(name).cloned(),
            Source::Nested(envelope, name) => self
                .body_field(envelope)
                .and_then(|e| e.get(name))
                .cloned(),
        }
    }
}

/// `null` and `""` count as empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attachment_extension() {
        let a = Attachment { content_type: "image/jpeg".into(), bytes: Bytes::new() };
        assert_eq!(a.extension(), "jpeg");
        assert!(a.is_image());

        let b = Attachment { content_type: "image/svg+xml; charset=utf-8".into(), bytes: Bytes::new() };
        assert_eq!(b.extension(), "svg+xml");

        let c = Attachment { content_type: "application/pdf".into(), bytes: Bytes::new() };
        assert!(!c.is_image());
    }

    #[test]
    fn test_lookup_sources() {
        let mut req = InboundRequest::with_body(json!({
            "ProdId": 7,
            "SDTEntrada": { "LocatarioId": "L1" }
        }));
        req.path_params.insert("id".into(), "42".into());
        req.query.insert("nombre".into(), "Ana".into());

        assert_eq!(req.lookup(Source::Path("id")), Some(json!("42")));
        assert_eq!(req.lookup(Source::Query("nombre")), Some(json!("Ana")));
        assert_eq!(req.lookup(Source::Body("ProdId")), Some(json!(7)));
        assert_eq!(req.lookup(Source::Nested("SDTEntrada", "LocatarioId")), Some(json!("L1")));
        assert_eq!(req.lookup(Source::Nested("SDTEntrada", "EntradaObserv")), None);
        assert_eq!(req.lookup(Source::Body("missing")), None);
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!(" ")));
    }
}
