//! Entry model for Gravity Forms
//!
//! An entry travels as a single flat JSON object that mixes the fixed metadata
//! Gravity Forms knows about (`id`, `form_id`, `date_created`, ...) with the
//! form-specific field values (`"1"`, `"2.3"`, `"email"`, ...). [`Entry`]
//! splits that object into a typed [`EntryMeta`] and an open map of string
//! values, and merges them back on serialization.
//!
//! Decoding is done in two passes over the same object:
//! 1. the strict shape ([`EntryMeta`]) is deserialized, coercing each known
//!    attribute to its declared type;
//! 2. the raw map is walked once and every key outside
//!    [`EntryMeta::FIELD_NAMES`] is coerced to a string through [`FieldValue`].

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::error::{ApiError, Result};

/// Timestamp format used by `date_created`, `date_updated` and `payment_date` (UTC)
pub const ENTRY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wire name of the entry identifier
pub const ID_FIELD: &str = "id";

/// Declares the fixed string attributes once: the struct fields, the
/// allow-list and the by-name accessors are all generated from this list.
macro_rules! entry_meta {
    ( $( $(#[$doc:meta])* $field:ident ),* $(,)? ) => {
        /// Fixed, schema-defined attributes of an entry
        ///
        /// Every attribute is optional. `None` and `Some("")` are both omitted
        /// from the wire representation, and an empty wire value decodes to `None`.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
        pub struct EntryMeta {
            /// Entry identifier, accepted as a JSON number or a numeric string
            #[serde(default, deserialize_with = "deserialize_id")]
            pub id: Option<u64>,
            $(
                $(#[$doc])*
                #[serde(default, deserialize_with = "deserialize_text")]
                pub $field: Option<String>,
            )*
        }

        impl EntryMeta {
            /// Wire names of every fixed attribute, `id` included
            pub const FIELD_NAMES: &'static [&'static str] = &[ID_FIELD, $( stringify!($field) ),*];

            fn text(&self, name: &str) -> Option<&Option<String>> {
                match name {
                    $( stringify!($field) => Some(&self.$field), )*
                    _ => None,
                }
            }

            fn text_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
                match name {
                    $( stringify!($field) => Some(&mut self.$field), )*
                    _ => None,
                }
            }

            /// Non-empty string attributes as `(wire name, value)` pairs
            pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
                [ $( (stringify!($field), self.$field.as_deref()) ),* ]
                    .into_iter()
                    .filter_map(|(name, value)| {
                        value.filter(|v| !v.is_empty()).map(|v| (name, v))
                    })
            }
        }
    };
}

entry_meta! {
    /// Owning form identifier
    form_id,
    /// WordPress post created from this entry
    post_id,
    date_created,
    date_updated,
    is_fulfilled,
    is_starred,
    is_read,
    /// Submitter IP address
    ip,
    source_url,
    user_agent,
    currency,
    /// WordPress user id of the submitter
    created_by,
    /// `active`, `spam` or `trash`
    status,
    payment_amount,
    payment_date,
    payment_status,
    transaction_id,
    transaction_type,
}

impl EntryMeta {
    /// Whether `name` is routed to the fixed attributes rather than the dynamic fields
    pub fn is_fixed(name: &str) -> bool {
        Self::FIELD_NAMES.contains(&name)
    }
}

/// Tagged view of a JSON value appearing where a string is expected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    String(&'a str),
    Bool(bool),
    Number(&'a Number),
    Null,
    Composite(&'a Value),
}

impl<'a> From<&'a Value> for FieldValue<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(s) => Self::String(s),
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n),
            Value::Null => Self::Null,
            Value::Array(_) | Value::Object(_) => Self::Composite(value),
        }
    }
}

impl FieldValue<'_> {
    /// Convert to the string stored in an entry
    ///
    /// Strings pass through, booleans become `"true"`/`"false"`, numbers use
    /// their shortest round-trip decimal form, null becomes `""` and
    /// objects/arrays become compact JSON text.
    pub fn coerce(&self) -> String {
        match self {
            Self::String(s) => (*s).to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => number_to_string(n),
            Self::Null => String::new(),
            Self::Composite(value) => value.to_string(),
        }
    }
}

fn number_to_string(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        i.to_string()
    } else if let Some(u) = number.as_u64() {
        u.to_string()
    } else if let Some(f) = number.as_f64() {
        f.to_string()
    } else {
        number.to_string()
    }
}

/// One Gravity Forms entry: fixed metadata plus dynamic field values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub meta: EntryMeta,
    fields: BTreeMap<String, String>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Entry::set_field`]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn id(&self) -> Option<u64> {
        self.meta.id.filter(|id| *id != 0)
    }

    pub fn set_id(&mut self, id: Option<u64>) {
        self.meta.id = id.filter(|id| *id != 0);
    }

    /// Value stored under `name`, or `None` when absent
    ///
    /// Fixed string attributes are addressed by their wire name. The numeric
    /// identifier is not a string field; read it through [`Entry::id`].
    pub fn get_field(&self, name: &str) -> Option<&str> {
        if let Some(slot) = self.meta.text(name) {
            return slot.as_deref().filter(|v| !v.is_empty());
        }
        self.fields.get(name).map(String::as_str)
    }

    /// Insert or overwrite the value stored under `name`
    ///
    /// Fixed attribute names are routed to [`EntryMeta`], so a key never ends
    /// up on both sides. An `id` that does not parse leaves the identifier untouched.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        if name == ID_FIELD {
            match parse_id(&value) {
                Ok(id) => self.meta.id = id,
                Err(_) => log::warn!("Ignoring non-numeric entry id '{}'", value),
            }
            return;
        }

        if let Some(slot) = self.meta.text_mut(&name) {
            *slot = Some(value).filter(|v| !v.is_empty());
            return;
        }

        self.fields.insert(name, value);
    }

    /// Remove a dynamic field, returning its previous value
    pub fn remove_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Dynamic fields in key order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn date_created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(self.meta.date_created.as_deref()?)
    }

    pub fn date_updated_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(self.meta.date_updated.as_deref()?)
    }

    pub fn payment_date_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(self.meta.payment_date.as_deref()?)
    }

    pub fn set_date_created(&mut self, at: NaiveDateTime) {
        self.meta.date_created = Some(at.format(ENTRY_TIME_FORMAT).to_string());
    }

    /// Flatten into the single JSON object sent on the wire
    pub fn to_flat(&self) -> Map<String, Value> {
        let mut flat = Map::new();

        for (name, value) in &self.fields {
            flat.insert(name.clone(), Value::String(value.clone()));
        }
        for (name, value) in self.meta.attributes() {
            flat.insert(name.to_string(), Value::String(value.to_string()));
        }
        if let Some(id) = self.id() {
            flat.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        }

        flat
    }

    /// Serialize to JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.to_flat())
            .map_err(|e| ApiError::decode("entry", b"<entry>", e))
    }

    /// Build an entry from a flat JSON object
    pub fn from_flat(flat: Map<String, Value>) -> Result<Self> {
        Self::from_value(&Value::Object(flat))
    }

    /// Build an entry from a parsed JSON value, which must be an object
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::decode(value).map_err(|e| ApiError::decode("entry", value.to_string().as_bytes(), e))
    }

    /// Parse an entry from raw JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ApiError::decode("entry", bytes, e))?;
        Self::decode(&value).map_err(|e| ApiError::decode("entry", bytes, e))
    }

    /// Build an entry from a flat name → value mapping, such as an imported row
    pub fn from_record(record: &HashMap<String, String>) -> Result<Self> {
        let flat = record
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Self::from_flat(flat)
    }

    fn decode(value: &Value) -> std::result::Result<Self, serde_json::Error> {
        let Value::Object(object) = value else {
            return Err(de::Error::invalid_type(unexpected(value), &"a JSON object"));
        };

        let meta = EntryMeta::deserialize(value)?;

        let fields = object
            .iter()
            .filter(|(key, _)| !EntryMeta::is_fixed(key))
            .map(|(key, value)| (key.clone(), FieldValue::from(value).coerce()))
            .collect();

        Ok(Self { meta, fields })
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_flat().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(de::Error::custom)
    }
}

/// Parse a textual identifier; blank and `0` mean "no identifier"
pub fn parse_id(text: &str) -> std::result::Result<Option<u64>, std::num::ParseIntError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u64>().map(|id| Some(id).filter(|id| *id != 0))
}

/// Accept an identifier or count as a JSON number, numeric string or null
///
/// A value that is not a non-negative integer is logged and treated as absent.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Null => None,
        Value::Number(n) => match n.as_u64() {
            Some(id) => Some(id).filter(|id| *id != 0),
            None => {
                log::warn!("Ignoring non-integer id {}", n);
                None
            }
        },
        Value::String(s) => match parse_id(s) {
            Ok(id) => id,
            Err(_) => {
                log::warn!("Ignoring non-numeric id '{}'", s);
                None
            }
        },
        other => {
            log::warn!("Ignoring id of unexpected type: {}", other);
            None
        }
    };
    Ok(id)
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let text = FieldValue::from(&value).coerce();
    Ok(Some(text).filter(|t| !t.is_empty()))
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(b) => de::Unexpected::Bool(*b),
        Value::Number(_) => de::Unexpected::Other("number"),
        Value::String(s) => de::Unexpected::Str(s),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, ENTRY_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use chrono::NaiveDate;
    use serde_json::json;

    fn flat(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_allow_list_covers_every_fixed_attribute() {
        assert_eq!(EntryMeta::FIELD_NAMES.len(), 19);
        assert!(EntryMeta::is_fixed("id"));
        assert!(EntryMeta::is_fixed("form_id"));
        assert!(EntryMeta::is_fixed("transaction_type"));
        assert!(!EntryMeta::is_fixed("email"));
        assert!(!EntryMeta::is_fixed("1.3"));
    }

    #[test]
    fn test_fully_populated_meta_serializes_every_allow_listed_key() {
        let mut entry = Entry::new();
        entry.set_id(Some(5));
        for name in EntryMeta::FIELD_NAMES.iter().filter(|n| **n != ID_FIELD) {
            entry.set_field(*name, format!("value-{}", name));
        }

        let out = entry.to_flat();
        let mut keys: Vec<&str> = out.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = EntryMeta::FIELD_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(entry.fields().count(), 0);
    }

    #[test]
    fn test_id_accepts_string_and_number() {
        let from_string = Entry::from_flat(flat(json!({"id": "42"}))).unwrap();
        let from_number = Entry::from_flat(flat(json!({"id": 42}))).unwrap();
        assert_eq!(from_string.id(), Some(42));
        assert_eq!(from_number.id(), Some(42));
        assert_eq!(from_string, from_number);
    }

    #[test]
    fn test_blank_and_zero_ids_are_absent() {
        for raw in [json!(""), json!(null), json!(0), json!("0")] {
            let entry = Entry::from_flat(flat(json!({ "id": raw }))).unwrap();
            assert_eq!(entry.id(), None);
        }
    }

    #[test]
    fn test_invalid_id_is_ignored() {
        for raw in [json!("abc"), json!(-3), json!(1.5), json!([7]), json!({"n": 7})] {
            let entry = Entry::from_flat(flat(json!({ "id": raw, "1": "kept" }))).unwrap();
            assert_eq!(entry.id(), None);
            assert_eq!(entry.get_field("1"), Some("kept"));
        }
    }

    #[test]
    fn test_invalid_id_handled_like_set_field() {
        let decoded = Entry::from_flat(flat(json!({"id": "abc"}))).unwrap();

        let mut assigned = Entry::new();
        assigned.set_field("id", "abc");

        assert_eq!(decoded, assigned);
    }

    #[test]
    fn test_dynamic_values_are_coerced() {
        let entry = Entry::from_flat(flat(json!({
            "yes": true,
            "no": false,
            "pi": 3.14,
            "seven": 7,
            "nothing": null,
            "nested": {"a": 1},
            "list": [1, "two"],
            "text": "hello",
        })))
        .unwrap();

        assert_eq!(entry.get_field("yes"), Some("true"));
        assert_eq!(entry.get_field("no"), Some("false"));
        assert_eq!(entry.get_field("pi"), Some("3.14"));
        assert_eq!(entry.get_field("seven"), Some("7"));
        assert_eq!(entry.get_field("nothing"), Some(""));
        assert_eq!(entry.get_field("nested"), Some(r#"{"a":1}"#));
        assert_eq!(entry.get_field("list"), Some(r#"[1,"two"]"#));
        assert_eq!(entry.get_field("text"), Some("hello"));
    }

    #[test]
    fn test_whole_float_uses_shortest_form() {
        let value = json!(7.0);
        assert_eq!(FieldValue::from(&value).coerce(), "7");
        let value = json!(-12);
        assert_eq!(FieldValue::from(&value).coerce(), "-12");
    }

    #[test]
    fn test_fixed_attributes_are_coerced_and_kept_out_of_fields() {
        let entry = Entry::from_flat(flat(json!({
            "id": "10",
            "form_id": 3,
            "is_starred": 0,
            "is_read": false,
            "status": "active",
            "ip": "",
            "payment_amount": null,
            "1": "Jane",
        })))
        .unwrap();

        assert_eq!(entry.meta.form_id.as_deref(), Some("3"));
        assert_eq!(entry.meta.is_starred.as_deref(), Some("0"));
        assert_eq!(entry.meta.is_read.as_deref(), Some("false"));
        assert_eq!(entry.meta.status.as_deref(), Some("active"));
        assert_eq!(entry.meta.ip, None);
        assert_eq!(entry.meta.payment_amount, None);

        let fields: Vec<_> = entry.fields().collect();
        assert_eq!(fields, vec![("1", "Jane")]);
    }

    #[test]
    fn test_serialize_omits_empty_fixed_attributes() {
        let mut entry = Entry::new().with_field("email", "a@example.com");
        entry.meta.status = Some(String::new());
        entry.meta.currency = Some("USD".to_string());

        let out = Value::Object(entry.to_flat());
        assert_eq!(out, json!({"email": "a@example.com", "currency": "USD"}));
    }

    #[test]
    fn test_serialize_emits_id_as_string() {
        let mut entry = Entry::new();
        entry.set_id(Some(42));
        assert_eq!(Value::Object(entry.to_flat()), json!({"id": "42"}));
    }

    #[test]
    fn test_round_trip_is_stable() {
        let original = flat(json!({
            "id": "77",
            "form_id": "2",
            "date_created": "2024-05-01 10:20:30",
            "is_starred": "0",
            "status": "active",
            "1": "Jane",
            "2.3": "Doe",
            "notes": "",
        }));

        let entry = Entry::from_flat(original.clone()).unwrap();
        let reserialized = entry.to_flat();
        assert_eq!(reserialized, original);

        let again = Entry::from_flat(reserialized).unwrap();
        assert_eq!(again, entry);
    }

    #[test]
    fn test_serde_impls_match_flat_conversion() {
        let entry = Entry::new().with_field("color", "blue").with_field("form_id", "4");
        let text = serde_json::to_string(&entry).unwrap();
        assert_eq!(text, r#"{"color":"blue","form_id":"4"}"#);

        let parsed: Entry = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_from_json_rejects_malformed_payload() {
        let err = Entry::from_json(b"{\"id\": 1,").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("{\"id\": 1,"));

        let err = Entry::from_json(b"[1, 2]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_get_field_on_absent_key() {
        let entry = Entry::new();
        assert_eq!(entry.get_field("missing"), None);
        assert_eq!(entry.get_field("status"), None);
        assert_eq!(entry.get_field("id"), None);
    }

    #[test]
    fn test_set_field_on_fresh_entry() {
        let mut entry = Entry::new();
        entry.set_field("favorite_color", "blue");
        assert_eq!(entry.get_field("favorite_color"), Some("blue"));

        entry.set_field("favorite_color", "green");
        assert_eq!(entry.get_field("favorite_color"), Some("green"));
        assert_eq!(entry.remove_field("favorite_color"), Some("green".to_string()));
        assert_eq!(entry.get_field("favorite_color"), None);
    }

    #[test]
    fn test_set_field_routes_fixed_names() {
        let mut entry = Entry::new();
        entry.set_field("status", "spam");
        entry.set_field("id", "12");
        assert_eq!(entry.meta.status.as_deref(), Some("spam"));
        assert_eq!(entry.get_field("status"), Some("spam"));
        assert_eq!(entry.id(), Some(12));
        assert_eq!(entry.fields().count(), 0);

        entry.set_field("id", "not-a-number");
        assert_eq!(entry.id(), Some(12));
    }

    #[test]
    fn test_from_record() {
        let record = HashMap::from([
            ("email".to_string(), "a@example.com".to_string()),
            ("favorite_color".to_string(), "blue".to_string()),
            ("source_url".to_string(), "https://example.com/form".to_string()),
        ]);
        let entry = Entry::from_record(&record).unwrap();

        assert_eq!(entry.get_field("email"), Some("a@example.com"));
        assert_eq!(entry.get_field("favorite_color"), Some("blue"));
        assert_eq!(entry.meta.source_url.as_deref(), Some("https://example.com/form"));
        assert_eq!(entry.fields().count(), 2);
    }

    #[test]
    fn test_timestamps() {
        let mut entry = Entry::new();
        let at = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        entry.set_date_created(at);

        assert_eq!(entry.meta.date_created.as_deref(), Some("2024-02-29 13:45:00"));
        assert_eq!(entry.date_created_at(), Some(at));
        assert_eq!(entry.date_updated_at(), None);

        entry.meta.payment_date = Some("yesterday".to_string());
        assert_eq!(entry.payment_date_at(), None);
    }
}
