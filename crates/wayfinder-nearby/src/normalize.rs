//! Normalization from raw backend JSON to [`wayfinder_core`] types.
//!
//! The places endpoints are not consistent about their envelope: some
//! answer with a bare array of records, others wrap it in an object. Records
//! themselves come in two flavours, a flat one (`name`, `lat`, `lng`, ...)
//! and a GeoJSON feature (`properties` + `geometry.coordinates`). Everything
//! is folded into [`Place`] here so the fetchers only ever see one shape.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wayfinder_core::{GeoPoint, GeocodeResult, Place, RouteData, Weather};

use crate::error::BackendError;

/// Object fields that may carry the record list, checked in order.
const LIST_FIELDS: &[&str] = &["places", "suggestions", "results", "features", "data"];

/// Maximum number of characters of a raw error body quoted in an error message.
const MAX_DETAIL_CHARS: usize = 200;

/// Extracts and normalizes the place list from a backend payload.
///
/// Accepts a bare array or an object holding the array under one of
/// [`LIST_FIELDS`]. Records that cannot be normalized are skipped.
///
/// # Errors
///
/// Returns [`BackendError::Malformed`] if the payload is neither an array
/// nor an object with a recognised list field.
pub fn places_from_payload(payload: &Value, context: &str) -> Result<Vec<Place>, BackendError> {
    let records = record_list(payload, context)?;
    let places: Vec<Place> = records.iter().filter_map(place_from_record).collect();
    let skipped = records.len() - places.len();
    if skipped > 0 {
        tracing::debug!(context, skipped, kept = places.len(), "skipped unusable place records");
    }
    Ok(places)
}

/// Normalizes one place record. Returns `None` when it has no name or no
/// valid coordinates.
#[must_use]
pub fn place_from_record(record: &Value) -> Option<Place> {
    let obj = record.as_object()?;
    // GeoJSON features keep their attributes under `properties`.
    let props = obj
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(obj);

    let name = string_field(props, &["name"])?;
    let location = record_location(obj, props)?;

    let id = props
        .get("id")
        .or_else(|| props.get("place_id"))
        .and_then(id_string)
        .unwrap_or_else(|| format!("{}_{}", location.lat, location.lng));

    let categories = match props.get("categories") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => string_field(props, &["category"]).into_iter().collect(),
    };

    Some(Place {
        id,
        name,
        address: string_field(props, &["address", "formatted", "address_line1"]),
        rating: props.get("rating").and_then(number).filter(|r| r.is_finite()),
        reviews_count: props
            .get("reviews_count")
            .or_else(|| props.get("user_ratings_total"))
            .and_then(number)
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map_or(0, |n| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let count = n.min(f64::from(u32::MAX)) as u32;
                count
            }),
        location,
        categories,
        source: string_field(props, &["source"]),
        phone: string_field(props, &["phone"]),
        website: string_field(props, &["website"]),
    })
}

/// Extracts destination candidates from a forward-geocoding payload.
///
/// Same envelope rules as [`places_from_payload`]. A candidate needs a
/// `name` (or `title`) and valid coordinates; others are skipped.
///
/// # Errors
///
/// Returns [`BackendError::Malformed`] for an unrecognised envelope.
pub fn geocode_results_from_payload(
    payload: &Value,
    context: &str,
) -> Result<Vec<GeocodeResult>, BackendError> {
    let records = record_list(payload, context)?;
    let results: Vec<GeocodeResult> = records
        .iter()
        .filter_map(|record| {
            let obj = record.as_object()?;
            let props = obj
                .get("properties")
                .and_then(Value::as_object)
                .unwrap_or(obj);
            let name = string_field(props, &["name", "title", "formatted"])?;
            let location = record_location(obj, props)?;
            Some(GeocodeResult {
                name,
                lat: location.lat,
                lng: location.lng,
                country: string_field(props, &["country"]),
            })
        })
        .collect();
    if results.len() < records.len() {
        tracing::debug!(
            context,
            skipped = records.len() - results.len(),
            "skipped unusable geocode records"
        );
    }
    Ok(results)
}

/// Decodes a route response.
///
/// # Errors
///
/// Returns [`BackendError::Deserialize`] if the body does not match [`RouteData`].
pub fn route_from_payload(payload: Value, context: &str) -> Result<RouteData, BackendError> {
    typed(payload, context)
}

/// Decodes a weather response.
///
/// # Errors
///
/// Returns [`BackendError::Deserialize`] if the body does not match [`Weather`].
pub fn weather_from_payload(payload: Value, context: &str) -> Result<Weather, BackendError> {
    typed(payload, context)
}

/// Best human-readable address in a reverse-geocoding response.
///
/// Prefers `address`, then `formatted`, then `address_line1`, then
/// `"city, country"` (either part alone is fine).
#[must_use]
pub fn address_from_payload(payload: &Value) -> Option<String> {
    let obj = payload.as_object()?;
    if let Some(address) = string_field(obj, &["address", "formatted", "address_line1"]) {
        return Some(address);
    }
    let parts: Vec<String> = ["city", "country"]
        .iter()
        .filter_map(|key| string_field(obj, &[key]))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// What to show for a fix: the resolved address, or the coordinates to six
/// decimals when the lookup produced nothing.
#[must_use]
pub fn display_address(point: GeoPoint, resolved: Option<String>) -> String {
    resolved.unwrap_or_else(|| point.to_string())
}

/// Pulls a human-readable reason out of a non-2xx response body.
#[must_use]
pub fn error_detail(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "detail", "message"] {
            match map.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_owned(),
                Some(v @ (Value::Object(_) | Value::Array(_))) => return v.to_string(),
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_owned()
    } else if trimmed.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{cut}...")
    } else {
        trimmed.to_owned()
    }
}

/// The record array of a list payload: a bare array, or the first of
/// [`LIST_FIELDS`] holding an array.
fn record_list<'a>(payload: &'a Value, context: &str) -> Result<&'a Vec<Value>, BackendError> {
    match payload {
        Value::Array(items) => Ok(items),
        Value::Object(map) => LIST_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_array))
            .ok_or_else(|| BackendError::Malformed {
                context: context.to_owned(),
                reason: format!("object has none of the list fields {LIST_FIELDS:?}"),
            }),
        other => Err(BackendError::Malformed {
            context: context.to_owned(),
            reason: format!("expected an array or object, got {}", json_kind(other)),
        }),
    }
}

fn typed<T: DeserializeOwned>(payload: Value, context: &str) -> Result<T, BackendError> {
    serde_json::from_value(payload).map_err(|e| BackendError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}

fn record_location(obj: &Map<String, Value>, props: &Map<String, Value>) -> Option<GeoPoint> {
    let from_pair = |lat: Option<&Value>, lng: Option<&Value>| -> Option<GeoPoint> {
        GeoPoint::new(lat.and_then(number)?, lng.and_then(number)?).ok()
    };
    let from_object = |m: &Map<String, Value>| {
        from_pair(m.get("lat"), m.get("lng").or_else(|| m.get("lon")))
    };

    if let Some(point) = props
        .get("coordinates")
        .and_then(Value::as_object)
        .and_then(from_object)
    {
        return Some(point);
    }
    if let Some(point) = from_object(props) {
        return Some(point);
    }
    // GeoJSON order is [lon, lat].
    let coords = obj
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)?;
    from_pair(coords.get(1), coords.first())
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a JSON number, or a string holding one.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
