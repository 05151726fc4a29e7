//! Table-driven request reshaping.
//!
//! Turns an [`InboundRequest`] into the [`OutboundRequest`] described by an
//! [`Operation`]: required-field checks first, then path/query rendering and
//! payload construction. Nothing here performs I/O.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

use crate::gateway::clock::Clock;
use crate::gateway::error::GatewayError;
use crate::gateway::inbound::{is_empty_value, InboundRequest};
use crate::gateway::operation::{FieldMap, FieldValue, Operation, Payload, Presence, Source};
use crate::gateway::outbound::{OutboundBody, OutboundRequest};

/// Upstream date format for entries.
pub const ENTRY_DATE_FORMAT: &str = "%m/%d/%Y";
/// Upstream time-of-day format for entries (24-hour).
pub const ENTRY_TIME_FORMAT: &str = "%H:%M:%S";

pub const ENTRY_DATE_FIELD: &str = "EntradaFechaCap";
pub const ENTRY_TIME_FIELD: &str = "EntradaHoraCita";

/// Build the outbound call for `op`, failing fast on missing fields.
pub fn prepare(
    op: &Operation,
    inbound: &InboundRequest,
    clock: &dyn Clock,
) -> Result<OutboundRequest, GatewayError> {
    check_required(op, inbound)?;

    Ok(OutboundRequest {
        verb: op.verb,
        upstream: op.upstream,
        segments: render_segments(op.target, inbound)?,
        query: render_query(op, inbound),
        body: build_body(op, inbound, clock)?,
    })
}

/// Verify every required field of `op`.
pub fn check_required(op: &Operation, inbound: &InboundRequest) -> Result<(), GatewayError> {
    for requirement in op.required {
        let value = inbound.lookup(requirement.source);
        let satisfied = match requirement.presence {
            Presence::NonEmpty => value.as_ref().is_some_and(|v| !is_empty_value(v)),
            Presence::Defined => value.is_some(),
        };
        if !satisfied {
            return Err(GatewayError::validation(format!(
                "\"{}\" is required",
                label(requirement.source)
            )));
        }
    }
    Ok(())
}

fn label(source: Source) -> String {
    match source {
        Source::Path(name) | Source::Query(name) | Source::Body(name) => name.to_string(),
        Source::Nested(envelope, name) => format!("{}.{}", envelope, name),
    }
}

fn render_segments(target: &str, inbound: &InboundRequest) -> Result<Vec<String>, GatewayError> {
    target
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) => inbound
                    .path_params
                    .get(param)
                    .cloned()
                    .ok_or_else(|| GatewayError::validation(format!("\"{}\" is required", param))),
                None => Ok(segment.to_string()),
            }
        })
        .collect()
}

fn render_query(op: &Operation, inbound: &InboundRequest) -> Vec<(String, String)> {
    op.query
        .iter()
        .filter_map(|(name, source)| {
            inbound.lookup(*source).map(|value| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name.to_string(), value)
            })
        })
        .collect()
}

fn build_body(
    op: &Operation,
    inbound: &InboundRequest,
    clock: &dyn Clock,
) -> Result<OutboundBody, GatewayError> {
    match op.payload {
        Payload::Empty => Ok(OutboundBody::Empty),
        Payload::Fields { envelope, fields } => {
            let object = Value::Object(map_fields(fields, inbound));
            Ok(OutboundBody::Json(wrap(envelope, object)))
        }
        Payload::Forward { envelope } => {
            let object = envelope_object(inbound, envelope)?.clone();
            Ok(OutboundBody::Json(wrap(Some(envelope), Value::Object(object))))
        }
        Payload::StampedEntry { envelope } => {
            let mut object = envelope_object(inbound, envelope)?.clone();
            stamp_entry(envelope, &mut object, clock)?;
            Ok(OutboundBody::Json(wrap(Some(envelope), Value::Object(object))))
        }
        Payload::Attachment => {
            let attachment = inbound
                .attachment
                .as_ref()
                .ok_or_else(|| GatewayError::validation("no image was provided"))?;
            if !attachment.is_image() {
                return Err(GatewayError::validation(
                    "invalid file type, only images are accepted",
                ));
            }
            Ok(OutboundBody::Binary {
                content_type: attachment.content_type.clone(),
                extension: attachment.extension().to_string(),
                bytes: attachment.bytes.clone(),
            })
        }
    }
}

/// Apply a mapping table to the inbound body.
pub fn map_fields(fields: &[FieldMap], inbound: &InboundRequest) -> Map<String, Value> {
    let mut out = Map::new();
    for field in fields {
        let value = match field.value {
            FieldValue::Body(name) => inbound.body_field(name).cloned(),
            FieldValue::BodyOr(name, default) => Some(
                inbound
                    .body_field(name)
                    .filter(|v| !is_empty_value(v))
                    .cloned()
                    .unwrap_or_else(|| Value::String(default.to_string())),
            ),
            FieldValue::Const(value) => Some(Value::String(value.to_string())),
        };
        if let Some(value) = value {
            out.insert(field.target.to_string(), value);
        }
    }
    out
}

fn wrap(envelope: Option<&str>, object: Value) -> Value {
    match envelope {
        Some(key) => {
            let mut outer = Map::new();
            outer.insert(key.to_string(), object);
            Value::Object(outer)
        }
        None => object,
    }
}

fn envelope_object<'a>(
    inbound: &'a InboundRequest,
    envelope: &str,
) -> Result<&'a Map<String, Value>, GatewayError> {
    inbound
        .body_field(envelope)
        .and_then(Value::as_object)
        .ok_or_else(|| GatewayError::validation(format!("\"{}\" must be an object", envelope)))
}

fn stamp_entry(
    envelope: &str,
    object: &mut Map<String, Value>,
    clock: &dyn Clock,
) -> Result<(), GatewayError> {
    let date = object
        .get(ENTRY_DATE_FIELD)
        .and_then(Value::as_str)
        .and_then(format_entry_date)
        .ok_or_else(|| {
            GatewayError::validation(format!(
                "\"{}.{}\" is not a valid date",
                envelope, ENTRY_DATE_FIELD
            ))
        })?;

    object.insert(ENTRY_DATE_FIELD.to_string(), Value::String(date));
    object.insert(
        ENTRY_TIME_FIELD.to_string(),
        Value::String(format_entry_time(clock.time_of_day())),
    );
    Ok(())
}

/// Reformat an inbound date as `MM/DD/YYYY`.
///
/// Timestamps keep the calendar date they were written with, independent of
/// the host time zone.
pub fn format_entry_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(raw, ENTRY_DATE_FORMAT))
        .ok()?;
    Some(date.format(ENTRY_DATE_FORMAT).to_string())
}

pub fn format_entry_time(time: NaiveTime) -> String {
    time.format(ENTRY_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::clock::FixedClock;
    use crate::gateway::inbound::Attachment;
    use crate::gateway::operation::{find, OPERATIONS};
    use bytes::Bytes;
    use serde_json::json;

    fn op(name: &str) -> &'static Operation {
        find(name).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(NaiveTime::from_hms_opt(14, 5, 9).unwrap())
    }

    #[test]
    fn test_create_producto_triplicates_price() {
        let inbound = InboundRequest::with_body(json!({
            "LocatarioId": "L1",
            "ProdsSKU": "SKU-1",
            "ProdsPrecio1": 10,
            "ProdsPrecio2": 99,
            "ProdsPrecio3": 98
        }));

        let out = prepare(op("create_producto"), &inbound, &clock()).unwrap();
        let prod = &out.json().unwrap()["SDTProd"];
        assert_eq!(prod["ProdsPrecio1"], json!(10));
        assert_eq!(prod["ProdsPrecio2"], json!(10));
        assert_eq!(prod["ProdsPrecio3"], json!(10));
        assert_eq!(prod["ProdId"], json!(""));
        assert_eq!(out.segments, vec!["CrearProd"]);
    }

    #[test]
    fn test_update_producto_keeps_independent_prices() {
        let inbound = InboundRequest::with_body(json!({
            "ProdId": "P1", "ProdsPrecio1": 1, "ProdsPrecio2": 2, "ProdsPrecio3": 3
        }));

        let out = prepare(op("update_producto"), &inbound, &clock()).unwrap();
        let prod = &out.json().unwrap()["SDTProd"];
        assert_eq!(prod["ProdsPrecio1"], json!(1));
        assert_eq!(prod["ProdsPrecio2"], json!(2));
        assert_eq!(prod["ProdsPrecio3"], json!(3));
    }

    #[test]
    fn test_create_locatario_defaults_and_constants() {
        let inbound = InboundRequest::with_body(json!({
            "LocatarioNombre": "Abarrotes Ana",
            "LocatarioEmail": "ana@example.com",
            "LocatarioActivo": "N",
            "UsuCuenta": "ana"
        }));

        let out = prepare(op("create_locatario"), &inbound, &clock()).unwrap();
        let body = &out.json().unwrap()["SDTCuentaLocatario"];
        assert_eq!(body["LocatarioNombre"], json!("Abarrotes Ana"));
        assert_eq!(body["LocatarioEmail"], json!(""));
        assert_eq!(body["UsuId"], json!("0"));
        assert_eq!(body["LocatarioActivo"], json!("S"));
        assert_eq!(body["LocatarioObservacion"], json!(""));
        assert!(body.get("LocatarioTel2").is_none());
    }

    #[test]
    fn test_update_locatario_defaults_only_when_empty() {
        let inbound = InboundRequest::with_body(json!({
            "LocatarioId": 5,
            "LocatarioActivo": "N",
            "LocatarioTel2": ""
        }));

        let out = prepare(op("update_locatario"), &inbound, &clock()).unwrap();
        let body = out.json().unwrap();
        assert_eq!(body["LocatarioId"], json!(5));
        assert_eq!(body["LocatarioActivo"], json!("N"));
        assert_eq!(body["LocatarioTel2"], json!(""));
        assert_eq!(body["LocatarioObservacion"], json!(""));
    }

    #[test]
    fn test_missing_required_fields_are_reported() {
        let err = prepare(op("update_locatario"), &InboundRequest::with_body(json!({})), &clock())
            .unwrap_err();
        assert_eq!(err.to_string(), "\"LocatarioId\" is required");

        let mut inbound = InboundRequest::default();
        inbound.query.insert("nombre".into(), "".into());
        let err = prepare(op("search_locatario"), &inbound, &clock()).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn test_every_single_omission_fails() {
        for op in OPERATIONS.iter().filter(|op| !op.required.is_empty()) {
            for skipped in 0..op.required.len() {
                let mut inbound = InboundRequest::default();
                let mut body = Map::new();
                let skipped_source = op.required[skipped].source;
                for (i, requirement) in op.required.iter().enumerate() {
                    if i == skipped {
                        continue;
                    }
                    // Filling a nested field would recreate a skipped envelope.
                    if let Source::Nested(envelope, _) = requirement.source {
                        if skipped_source == Source::Body(envelope) {
                            continue;
                        }
                    }
                    match requirement.source {
                        Source::Path(name) => {
                            inbound.path_params.insert(name.into(), "1".into());
                        }
                        Source::Query(name) => {
                            inbound.query.insert(name.into(), "1".into());
                        }
                        Source::Body(name) => {
                            body.entry(name.to_string()).or_insert(json!("1"));
                        }
                        Source::Nested(envelope, name) => {
                            let env = body.entry(envelope.to_string()).or_insert(json!({}));
                            if !env.is_object() {
                                *env = json!({});
                            }
                            env[name] = json!("1");
                        }
                    }
                }
                inbound.body = Some(Value::Object(body));
                let result = check_required(op, &inbound);
                assert!(result.is_err(), "{} accepted a request without requirement #{}", op.name, skipped);
            }
        }
    }

    #[test]
    fn test_check_flag_accepts_false() {
        let inbound = InboundRequest::with_body(json!({
            "EntradaId": 1, "PartEntId": 2, "partEntCheck": false
        }));
        let out = prepare(op("update_part_check"), &inbound, &clock()).unwrap();
        assert_eq!(out.json().unwrap()["partEntCheck"], json!(false));
    }

    #[test]
    fn test_stamped_entry_overwrites_time() {
        let inbound = InboundRequest::with_body(json!({
            "SDTEntrada": {
                "LocatarioId": "L1",
                "EntradaFechaCap": "2024-03-15T00:00:00Z",
                "EntradaHoraCita": "08:00:00",
                "EntradaObserv": "pallets",
                "EntradaTipoDuracion": "1"
            }
        }));

        let out = prepare(op("create_entrada"), &inbound, &clock()).unwrap();
        let entry = &out.json().unwrap()["SDTEntrada"];
        assert_eq!(entry["EntradaFechaCap"], json!("03/15/2024"));
        assert_eq!(entry["EntradaHoraCita"], json!("14:05:09"));
        assert_eq!(entry["EntradaTipoDuracion"], json!("1"));
    }

    #[test]
    fn test_stamped_entry_rejects_bad_date() {
        let inbound = InboundRequest::with_body(json!({
            "SDTEntrada": { "LocatarioId": "L1", "EntradaFechaCap": "mañana", "EntradaObserv": "x" }
        }));
        let err = prepare(op("create_entrada"), &inbound, &clock()).unwrap_err();
        assert_eq!(err.to_string(), "\"SDTEntrada.EntradaFechaCap\" is not a valid date");
    }

    #[test]
    fn test_format_entry_date_variants() {
        assert_eq!(format_entry_date("2024-03-15T00:00:00Z").as_deref(), Some("03/15/2024"));
        assert_eq!(format_entry_date("2024-03-15T23:30:00-06:00").as_deref(), Some("03/15/2024"));
        assert_eq!(format_entry_date("2024-12-01T10:00:00").as_deref(), Some("12/01/2024"));
        assert_eq!(format_entry_date("2024-01-09").as_deref(), Some("01/09/2024"));
        assert_eq!(format_entry_date("07/04/2024").as_deref(), Some("07/04/2024"));
        assert_eq!(format_entry_date("15/03/2024"), None);
    }

    #[test]
    fn test_cita_forwards_envelope() {
        let cita = json!({
            "LocatarioId": "L1", "CitaFecha": "2024-05-01",
            "CitaHoraInicio": "09:00", "CitaHoraFin": "10:00", "Extra": true
        });
        let inbound = InboundRequest::with_body(json!({ "SDTGeneraCita": cita.clone() }));

        let out = prepare(op("create_cita"), &inbound, &clock()).unwrap();
        assert_eq!(out.json().unwrap(), &json!({ "SDTGeneraCita": cita }));
    }

    #[test]
    fn test_path_and_query_rendering() {
        let mut inbound = InboundRequest::default();
        inbound.path_params.insert("id".into(), "a b/c".into());
        let out = prepare(op("get_locatario"), &inbound, &clock()).unwrap();
        assert_eq!(out.segments, vec!["Locatario", "a b/c"]);
        assert_eq!(out.body, OutboundBody::Empty);

        let mut inbound = InboundRequest::default();
        inbound.query.insert("nombre".into(), "José".into());
        let out = prepare(op("search_locatario"), &inbound, &clock()).unwrap();
        assert_eq!(out.query, vec![("Nombre".to_string(), "José".to_string())]);

        let out = prepare(op("list_productos"), &InboundRequest::default(), &clock()).unwrap();
        assert!(out.query.is_empty());
    }

    #[test]
    fn test_attachment_payload() {
        let mut inbound = InboundRequest::default();
        let err = prepare(op("upload_imagen"), &inbound, &clock()).unwrap_err();
        assert_eq!(err.to_string(), "no image was provided");

        inbound.attachment = Some(Attachment {
            content_type: "text/plain".into(),
            bytes: Bytes::from_static(b"hi"),
        });
        assert!(prepare(op("upload_imagen"), &inbound, &clock()).is_err());

        inbound.attachment = Some(Attachment {
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"\x89PNG"),
        });
        let out = prepare(op("upload_imagen"), &inbound, &clock()).unwrap();
        assert_eq!(
            out.body,
            OutboundBody::Binary {
                content_type: "image/png".into(),
                extension: "png".into(),
                bytes: Bytes::from_static(b"\x89PNG"),
            }
        );
    }
}
