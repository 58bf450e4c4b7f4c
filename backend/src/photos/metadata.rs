//! Photo metadata as supplied by uploaders and as attached to stored objects.
//!
//! Free-text fields (`locationName`, `group`) are percent-encoded before they
//! become object metadata: they travel as signed `x-amz-meta-*` headers and
//! non-ASCII bytes there break the signature. Coordinates are passed through
//! unvalidated, stringified the way a browser's `String()` would.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Prefix S3 puts in front of user metadata names on the wire
pub const AMZ_META_PREFIX: &str = "x-amz-meta-";

pub const META_UPLOAD_TIME: &str = "upload-time";
pub const META_LOCATION_NAME: &str = "location-name";
pub const META_GEO_LAT: &str = "geo-lat";
pub const META_GEO_LON: &str = "geo-lon";
pub const META_IMG_GROUP: &str = "img-group";

pub const DEFAULT_LOCATION_NAME: &str = "Unknown";
pub const DEFAULT_GROUP: &str = "default";

/// Characters left alone by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Metadata sent by the uploader alongside the filename
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    /// Display name of the place the photo was taken
    #[serde(default)]
    pub location_name: Option<String>,
    /// Latitude, any JSON value; stored as its string form
    #[serde(default, deserialize_with = "present")]
    pub lat: Option<Value>,
    /// Longitude, any JSON value; stored as its string form
    #[serde(default, deserialize_with = "present")]
    pub lon: Option<Value>,
    /// Album or group label
    #[serde(default)]
    pub group: Option<String>,
}

/// Keeps an explicit `null` distinct from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// The exact metadata attached to an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMetadata {
    pub upload_time: String,
    pub location_name: String,
    pub geo_lat: String,
    pub geo_lon: String,
    pub img_group: String,
}

impl PhotoMetadata {
    /// Applies defaults, encoding and coercion to uploader-supplied metadata.
    #[must_use]
    pub fn encode(input: &UploadMetadata, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            upload_time: uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            location_name: encode_component(non_empty_or(
                input.location_name.as_deref(),
                DEFAULT_LOCATION_NAME,
            )),
            geo_lat: js_string(input.lat.as_ref()),
            geo_lon: js_string(input.lon.as_ref()),
            img_group: encode_component(non_empty_or(input.group.as_deref(), DEFAULT_GROUP)),
        }
    }

    /// Metadata entries keyed by their provider-side names.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, String> {
        [
            (META_UPLOAD_TIME, &self.upload_time),
            (META_LOCATION_NAME, &self.location_name),
            (META_GEO_LAT, &self.geo_lat),
            (META_GEO_LON, &self.geo_lon),
            (META_IMG_GROUP, &self.img_group),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
    }

    /// Headers the uploader must send with the presigned PUT.
    #[must_use]
    pub fn upload_headers(&self, content_type: &str) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = self
            .entries()
            .into_iter()
            .map(|(name, value)| (format!("{AMZ_META_PREFIX}{name}"), value))
            .collect();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        headers
    }
}

fn non_empty_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

/// Percent-encodes `value` with the `encodeURIComponent` character set.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Reverses [`encode_component`]. Returns `None` if the bytes are not UTF-8.
#[must_use]
pub fn decode_component(value: &str) -> Option<String> {
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// String form of a JSON value as JavaScript's `String()` renders it.
#[must_use]
pub fn js_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Number(number)) => js_number(number),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn js_number(number: &serde_json::Number) -> String {
    if let Some(int) = number.as_i64() {
        return int.to_string();
    }
    if let Some(int) = number.as_u64() {
        return int.to_string();
    }
    match number.as_f64() {
        Some(float) if float == 0.0 => "0".to_string(),
        Some(float) if float.abs() >= 1e21 || float.abs() < 1e-6 => js_exponent(float),
        Some(float) if float.fract() == 0.0 => format!("{float:.0}"),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

/// `1e-7`, `1.5e+300`: JavaScript always signs the exponent.
fn js_exponent(float: f64) -> String {
    let formatted = format!("{float:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 15).unwrap()
            + chrono::Duration::milliseconds(42)
    }

    fn parse(value: serde_json::Value) -> UploadMetadata {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let metadata = PhotoMetadata::encode(&UploadMetadata::default(), fixed_time());

        assert_eq!(metadata.location_name, "Unknown");
        assert_eq!(metadata.img_group, "default");
        assert_eq!(metadata.geo_lat, "undefined");
        assert_eq!(metadata.geo_lon, "undefined");
        assert_eq!(metadata.upload_time, "2024-05-17T08:30:15.042Z");
    }

    #[test]
    fn test_empty_strings_fall_back_to_defaults() {
        let input = parse(json!({ "locationName": "", "group": "" }));
        let metadata = PhotoMetadata::encode(&input, fixed_time());

        assert_eq!(metadata.location_name, "Unknown");
        assert_eq!(metadata.img_group, "default");
    }

    #[test]
    fn test_non_ascii_names_are_percent_encoded() {
        let input = parse(json!({ "locationName": "東京タワー", "group": "家族 & 朋友" }));
        let metadata = PhotoMetadata::encode(&input, fixed_time());

        assert!(metadata.location_name.is_ascii());
        assert!(metadata.img_group.is_ascii());
        assert_eq!(
            metadata.location_name,
            "%E6%9D%B1%E4%BA%AC%E3%82%BF%E3%83%AF%E3%83%BC"
        );
        assert_eq!(
            decode_component(&metadata.img_group).as_deref(),
            Some("家族 & 朋友")
        );
    }

    #[test]
    fn test_encode_component_matches_uri_component_rules() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)j"), "a-b_c.d!e~f*g'h(i)j");
        assert_eq!(encode_component("a b/c?d=e&f#g"), "a%20b%2Fc%3Fd%3De%26f%23g");
        assert_eq!(encode_component("50%"), "50%25");
    }

    #[test]
    fn test_reserved_characters_round_trip() {
        for original in ["Café de Flore", "100% /path?q=1&r=2#frag", "emoji 📷", "+plus+"] {
            let encoded = encode_component(original);
            assert!(encoded.is_ascii(), "not ascii: {encoded}");
            assert_eq!(decode_component(&encoded).as_deref(), Some(original));
        }
    }

    #[test]
    fn test_coordinates_are_stringified_without_validation() {
        let cases = [
            (json!({ "lat": 35.6586, "lon": 139.7454 }), "35.6586", "139.7454"),
            (json!({ "lat": -90, "lon": 1.0 }), "-90", "1"),
            (json!({ "lat": "north", "lon": 999 }), "north", "999"),
            (json!({ "lat": null, "lon": true }), "null", "true"),
            (json!({ "lat": [1, 2], "lon": {} }), "1,2", "[object Object]"),
            (json!({}), "undefined", "undefined"),
            (json!({ "lat": 1e-7, "lon": 1e21 }), "1e-7", "1e+21"),
            (json!({ "lat": -2.5e-8, "lon": 1.5e300 }), "-2.5e-8", "1.5e+300"),
            (json!({ "lat": 0.000001, "lon": 1e20 }), "0.000001", "100000000000000000000"),
        ];

        for (input, lat, lon) in cases {
            let metadata = PhotoMetadata::encode(&parse(input.clone()), fixed_time());
            assert_eq!(metadata.geo_lat, lat, "lat for {input}");
            assert_eq!(metadata.geo_lon, lon, "lon for {input}");
        }
    }

    #[test]
    fn test_upload_headers_cover_content_type_and_metadata() {
        let input = parse(json!({ "locationName": "Paris", "lat": 48.85, "lon": 2.35, "group": "trip" }));
        let metadata = PhotoMetadata::encode(&input, fixed_time());
        let headers = metadata.upload_headers("image/jpeg");

        let names: Vec<&str> = headers.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "Content-Type",
                "x-amz-meta-geo-lat",
                "x-amz-meta-geo-lon",
                "x-amz-meta-img-group",
                "x-amz-meta-location-name",
                "x-amz-meta-upload-time",
            ]
        );
        assert_eq!(headers["Content-Type"], "image/jpeg");
        assert_eq!(headers["x-amz-meta-location-name"], "Paris");
        assert_eq!(headers["x-amz-meta-geo-lat"], "48.85");
        assert_eq!(headers["x-amz-meta-geo-lon"], "2.35");
        assert_eq!(headers["x-amz-meta-img-group"], "trip");
        assert_eq!(headers["x-amz-meta-upload-time"], "2024-05-17T08:30:15.042Z");

        for (name, value) in metadata.entries() {
            assert_eq!(headers[&format!("x-amz-meta-{name}")], value);
        }
    }
}
