//! Rule points: the request part a rule acts on.
//!
//! Locally a point is a list of segments, `[["post"], ["json_doc"], ["hash", "password"]]`.
//! The API takes the segments as-is but with numeric slots as JSON numbers,
//! and echoes the point back flattened: `["post", "json_doc", "hash", "password"]`.

use crate::condition::PointElement;
use crate::error::{CoreError, Result};

/// Segment kinds whose second slot is a number.
pub const NUMERIC_POINT_KINDS: &[&str] = &[
    "path",
    "array",
    "grpc",
    "json_array",
    "xml_comment",
    "xml_dtd_entity",
    "xml_pi",
    "xml_tag_array",
];

/// Segment kinds followed by a key or index in the flattened form.
pub const KEYED_POINT_KINDS: &[&str] = &[
    "json_array",
    "xml_pi",
    "hash",
    "array",
    "viewstate_array",
    "viewstate_pair",
    "viewstate_triplet",
    "viewstate_dict",
    "header",
    "xml_dtd_entity",
    "xml_tag_array",
    "xml_tag",
    "xml_attr",
    "xml_comment",
    "grpc",
    "protobuf",
    "json_obj",
    "json",
    "jwt",
    "multipart",
    "get",
    "content_disp",
    "form_urlencoded",
    "path",
    "cookie",
    "response_header",
    "viewstate_sparse_array",
];

pub fn is_numeric_kind(kind: &str) -> bool {
    NUMERIC_POINT_KINDS.contains(&kind)
}

pub fn is_keyed_kind(kind: &str) -> bool {
    KEYED_POINT_KINDS.contains(&kind)
}

/// Convert segments to their wire form, turning numeric slots into numbers.
pub fn expand_points(segments: &[Vec<String>]) -> Result<Vec<Vec<PointElement>>> {
    segments
        .iter()
        .map(|segment| {
            let (kind, rest) = segment
                .split_first()
                .ok_or_else(|| CoreError::invalid_point("empty point segment"))?;
            let mut out = Vec::with_capacity(segment.len());
            out.push(PointElement::text(kind.as_str()));
            for (i, raw) in rest.iter().enumerate() {
                if i == 0 && is_numeric_kind(kind) {
                    let number: f64 = raw
                        .trim()
                        .parse()
                        .map_err(|_| CoreError::invalid_number(kind.as_str(), raw.as_str()))?;
                    out.push(PointElement::Number(number));
                } else {
                    out.push(PointElement::text(raw.as_str()));
                }
            }
            Ok(out)
        })
        .collect()
}

pub fn flatten_points(segments: &[Vec<PointElement>]) -> Vec<PointElement> {
    segments.iter().flatten().cloned().collect()
}

/// Render a flat wire point as strings, integral numbers without a fraction.
pub fn align_point(point: &[PointElement]) -> Vec<String> {
    point.iter().map(ToString::to_string).collect()
}

/// Rebuild segments from a flat point. A keyed kind consumes the next
/// element as its selector.
pub fn wrap_point(flat: &[String]) -> Vec<Vec<String>> {
    let mut segments = Vec::new();
    let mut iter = flat.iter();
    while let Some(kind) = iter.next() {
        let mut segment = vec![kind.clone()];
        if is_keyed_kind(kind) {
            if let Some(key) = iter.next() {
                segment.push(key.clone());
            }
        }
        segments.push(segment);
    }
    segments
}
