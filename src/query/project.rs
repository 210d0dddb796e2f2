//! Reading fields out of decoded trees
//!
//! Missing or failed fields project to `None`, so a torn subtree only costs
//! the record that contains it.

use crate::core::types::{RemoteObject, RemoteValue};

pub(crate) fn int(object: &RemoteObject, name: &str) -> Option<i64> {
    object.field(name).and_then(RemoteValue::as_i64)
}

pub(crate) fn int32(object: &RemoteObject, name: &str) -> Option<i32> {
    int(object, name).and_then(|v| i32::try_from(v).ok())
}

pub(crate) fn unsigned(object: &RemoteObject, name: &str) -> Option<u64> {
    match object.field(name)? {
        RemoteValue::Scalar(scalar) => scalar.as_u64(),
        _ => None,
    }
}

pub(crate) fn boolean(object: &RemoteObject, name: &str) -> Option<bool> {
    object.field(name).and_then(RemoteValue::as_bool)
}

pub(crate) fn string(object: &RemoteObject, name: &str) -> Option<String> {
    object
        .field(name)
        .and_then(RemoteValue::as_str)
        .map(str::to_string)
}

pub(crate) fn child<'v>(object: &'v RemoteObject, name: &str) -> Option<&'v RemoteObject> {
    object.field(name).and_then(RemoteValue::as_object)
}

/// Elements of a sequence; anything else is empty
pub(crate) fn items(value: &RemoteValue) -> &[RemoteValue] {
    value.as_sequence().unwrap_or(&[])
}

/// Object elements of a sequence, skipping nulls and failed elements
pub(crate) fn objects(value: &RemoteValue) -> impl Iterator<Item = &RemoteObject> {
    items(value).iter().filter_map(RemoteValue::as_object)
}

/// Values of a decoded `Dictionary<TKey, TValue>`.
///
/// Handles both the `entries` layout and the older `valueSlots` layout.
pub(crate) fn dictionary_values(value: &RemoteValue) -> Vec<&RemoteValue> {
    let Some(dictionary) = value.as_object() else {
        return Vec::new();
    };

    if let Some(entries) = dictionary.field("entries") {
        let count = int(dictionary, "count")
            .or_else(|| int(dictionary, "_count"))
            .map_or(usize::MAX, |c| c.max(0) as usize);
        return items(entries)
            .iter()
            .take(count)
            .filter_map(RemoteValue::as_object)
            .filter(|entry| int(entry, "hashCode").is_some_and(|h| h >= 0))
            .filter_map(|entry| entry.field("value"))
            .collect();
    }

    let touched = int(dictionary, "touchedSlots").map_or(usize::MAX, |c| c.max(0) as usize);
    dictionary
        .field("valueSlots")
        .map(|slots| {
            items(slots)
                .iter()
                .take(touched)
                .filter(|v| !v.is_null())
                .collect()
        })
        .unwrap_or_default()
}
