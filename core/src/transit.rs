//! transit+json reader and writer.
//!
//! # Overview
//! The query API speaks transit: JSON arrays and strings whose leading
//! markers carry type information (`"~:status"` is a keyword,
//! `["^ ", k, v]` is a map, `"^0"` refers back to an earlier cached string).
//! Decoding happens in two steps. [`from_slice`] turns bytes into a
//! [`Value`] tree that still knows about keywords, sets and instants, and
//! [`Value::to_json`] flattens that tree into plain JSON that serde can map
//! onto typed structs.
//!
//! # Cache
//! Writers replace repeated map keys, keywords, symbols and tags longer than
//! three characters with `^<code>` references. The reader must record the
//! same strings in the same order to resolve them. Codes are one or two
//! base-44 digits offset from `'0'`; the cache starts over once it holds
//! 44 * 44 entries.
//!
//! The writer never emits references, which every reader accepts.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value as Json};
use thiserror::Error;
use uuid::Uuid;

const ESC: char = '~';
const SUB: char = '^';
const RESERVED: char = '`';
const TAG_PREFIX: &str = "~#";
const MAP_MARKER: &str = "^ ";

const CACHE_CODE_DIGITS: usize = 44;
const CACHE_CODE_BASE: u32 = '0' as u32;
const CACHE_SIZE: usize = CACHE_CODE_DIGITS * CACHE_CODE_DIGITS;
const MIN_CACHEABLE_LEN: usize = 4;

/// Largest integer JSON numbers carry exactly; larger ones are written as `~i`.
const MAX_JSON_INT: u64 = 1 << 53;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown cache reference {0:?}")]
    CacheMiss(String),

    #[error("invalid {kind} {value:?}")]
    InvalidScalar { kind: &'static str, value: String },

    #[error("map has an odd number of elements")]
    OddMap,

    #[error("tag {tag:?} expects {expected}")]
    BadTagRep { tag: String, expected: &'static str },

    #[error("tag {0:?} outside of a tagged value")]
    DanglingTag(String),

    #[error("map key {0} has no json object key form")]
    UnsupportedKey(String),

    #[error("float {0} has no json form")]
    NonFinite(f64),

    #[error("unknown tag {0:?}")]
    UnknownTag(String),
}

/// A decoded transit value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(String),
    Float(f64),
    BigDecimal(String),
    String(String),
    Keyword(String),
    Symbol(String),
    Uuid(Uuid),
    Uri(String),
    Char(String),
    Instant(DateTime<Utc>),
    /// Base64 payload, kept encoded.
    Bytes(String),
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    /// Entries in document order.
    Map(Vec<(Value, Value)>),
    /// A tag this module has no dedicated variant for, with its
    /// representation.
    Tagged(String, Box<Value>),
}

impl Value {
    pub fn keyword(name: impl Into<String>) -> Self {
        Value::Keyword(name.into())
    }

    /// Value stored under `key` when `self` is a map.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::Array(_) | Value::List(_) | Value::Set(_) | Value::Map(_)
        ) && !matches!(self, Value::Tagged(_, rep) if !rep.is_scalar())
    }

    /// Flatten into plain JSON.
    ///
    /// Keywords and symbols become their names (namespace included), instants
    /// become RFC 3339 strings, and sets and lists become arrays.
    pub fn to_json(&self) -> Result<Json, Error> {
        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::Number((*n).into()),
            Value::Float(f) => Json::Number(Number::from_f64(*f).ok_or(Error::NonFinite(*f))?),
            Value::BigInt(s)
            | Value::BigDecimal(s)
            | Value::String(s)
            | Value::Keyword(s)
            | Value::Symbol(s)
            | Value::Uri(s)
            | Value::Char(s)
            | Value::Bytes(s) => Json::String(s.clone()),
            Value::Uuid(u) => Json::String(u.to_string()),
            Value::Instant(t) => Json::String(format_instant(t)),
            Value::Array(items) | Value::List(items) | Value::Set(items) => {
                Json::Array(items.iter().map(Value::to_json).collect::<Result<_, _>>()?)
            }
            Value::Map(entries) => {
                let mut object = Map::with_capacity(entries.len());
                for (k, v) in entries {
                    object.insert(k.to_json_key()?, v.to_json()?);
                }
                Json::Object(object)
            }
            Value::Tagged(tag, _) => return Err(Error::UnknownTag(tag.clone())),
        })
    }

    fn to_json_key(&self) -> Result<String, Error> {
        Ok(match self {
            Value::BigInt(s)
            | Value::BigDecimal(s)
            | Value::String(s)
            | Value::Keyword(s)
            | Value::Symbol(s)
            | Value::Uri(s)
            | Value::Char(s)
            | Value::Bytes(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Instant(t) => format_instant(t),
            other => return Err(Error::UnsupportedKey(format!("{other:?}"))),
        })
    }
}

/// Same layout chrono uses when serializing a `DateTime<Utc>`.
fn format_instant(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Decode a transit+json document.
pub fn from_slice(bytes: &[u8]) -> Result<Value, Error> {
    let json: Json = serde_json::from_slice(bytes)?;
    Reader::default().read(&json, false)
}

#[derive(Debug, Default)]
struct Reader {
    cache: Vec<String>,
}

impl Reader {
    fn read(&mut self, json: &Json, as_key: bool) -> Result<Value, Error> {
        match json {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => Ok(read_number(n)),
            Json::String(s) => {
                let raw = self.resolve(s, as_key)?;
                parse_scalar(&raw)
            }
            Json::Array(items) => self.read_array(items),
            Json::Object(object) => self.read_object(object),
        }
    }

    fn read_array(&mut self, items: &[Json]) -> Result<Value, Error> {
        let Some(Json::String(first)) = items.first() else {
            return self.read_all(items).map(Value::Array);
        };
        if first == MAP_MARKER {
            return self.read_pairs(&items[1..]).map(Value::Map);
        }

        let head = self.resolve(first, false)?;
        if items.len() == 2 {
            if let Some(tag) = head.strip_prefix(TAG_PREFIX) {
                let rep = self.read(&items[1], false)?;
                return tagged(tag, rep);
            }
        }
        let mut values = Vec::with_capacity(items.len());
        values.push(parse_scalar(&head)?);
        for item in &items[1..] {
            values.push(self.read(item, false)?);
        }
        Ok(Value::Array(values))
    }

    fn read_object(&mut self, object: &Map<String, Json>) -> Result<Value, Error> {
        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            let raw = self.resolve(key, true)?;
            if object.len() == 1 {
                if let Some(tag) = raw.strip_prefix(TAG_PREFIX) {
                    let rep = self.read(value, false)?;
                    return tagged(tag, rep);
                }
            }
            entries.push((parse_scalar(&raw)?, self.read(value, false)?));
        }
        Ok(Value::Map(entries))
    }

    fn read_all(&mut self, items: &[Json]) -> Result<Vec<Value>, Error> {
        items.iter().map(|item| self.read(item, false)).collect()
    }

    fn read_pairs(&mut self, items: &[Json]) -> Result<Vec<(Value, Value)>, Error> {
        if items.len() % 2 != 0 {
            return Err(Error::OddMap);
        }
        let mut entries = Vec::with_capacity(items.len() / 2);
        for pair in items.chunks_exact(2) {
            let key = self.read(&pair[0], true)?;
            let value = self.read(&pair[1], false)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    /// Expand a cache reference, or record `s` if it is cacheable.
    fn resolve(&mut self, s: &str, as_key: bool) -> Result<String, Error> {
        if is_cache_ref(s) {
            return cache_index(&s[1..])
                .and_then(|i| self.cache.get(i).cloned())
                .ok_or_else(|| Error::CacheMiss(s.to_string()));
        }
        if is_cacheable(s, as_key) {
            if self.cache.len() == CACHE_SIZE {
                self.cache.clear();
            }
            self.cache.push(s.to_string());
        }
        Ok(s.to_string())
    }
}

fn is_cache_ref(s: &str) -> bool {
    s.len() > 1 && s.starts_with(SUB) && s != MAP_MARKER
}

fn is_cacheable(s: &str, as_key: bool) -> bool {
    s.len() >= MIN_CACHEABLE_LEN
        && (as_key || s.starts_with("~:") || s.starts_with("~$") || s.starts_with(TAG_PREFIX))
}

fn cache_index(code: &str) -> Option<usize> {
    let digit = |c: char| {
        let d = (c as u32).checked_sub(CACHE_CODE_BASE)? as usize;
        (d < CACHE_CODE_DIGITS).then_some(d)
    };
    let mut chars = code.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), None, None) => digit(a),
        (Some(a), Some(b), None) => Some(digit(a)? * CACHE_CODE_DIGITS + digit(b)?),
        _ => None,
    }
}

fn read_number(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if n.is_u64() {
        Value::BigInt(n.to_string())
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn invalid(kind: &'static str, value: &str) -> Error {
    Error::InvalidScalar {
        kind,
        value: value.to_string(),
    }
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_scalar(s: &str) -> Result<Value, Error> {
    let Some(rest) = s.strip_prefix(ESC) else {
        return Ok(Value::String(s.to_string()));
    };
    let mut chars = rest.chars();
    let Some(marker) = chars.next() else {
        return Ok(Value::String(s.to_string()));
    };
    let rep = chars.as_str();

    Ok(match marker {
        ESC | SUB | RESERVED => Value::String(rest.to_string()),
        '_' => Value::Null,
        '?' => match rep {
            "t" => Value::Bool(true),
            "f" => Value::Bool(false),
            _ => return Err(invalid("boolean", rep)),
        },
        ':' => Value::Keyword(rep.to_string()),
        '$' => Value::Symbol(rep.to_string()),
        'i' => match rep.parse() {
            Ok(i) => Value::Int(i),
            Err(_) if is_integer(rep) => Value::BigInt(rep.to_string()),
            Err(_) => return Err(invalid("integer", rep)),
        },
        'n' if is_integer(rep) => Value::BigInt(rep.to_string()),
        'n' => return Err(invalid("big integer", rep)),
        'd' => Value::Float(rep.parse().map_err(|_| invalid("double", rep))?),
        'f' => {
            rep.parse::<f64>().map_err(|_| invalid("big decimal", rep))?;
            Value::BigDecimal(rep.to_string())
        }
        'z' => Value::Float(match rep {
            "NaN" => f64::NAN,
            "INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            _ => return Err(invalid("special number", rep)),
        }),
        'u' => Value::Uuid(Uuid::parse_str(rep).map_err(|_| invalid("uuid", rep))?),
        'r' => Value::Uri(rep.to_string()),
        'c' => Value::Char(rep.to_string()),
        'b' => Value::Bytes(rep.to_string()),
        'm' => {
            let millis: i64 = rep.parse().map_err(|_| invalid("instant", rep))?;
            Value::Instant(DateTime::from_timestamp_millis(millis).ok_or_else(|| invalid("instant", rep))?)
        }
        't' => Value::Instant(
            DateTime::parse_from_rfc3339(rep)
                .map_err(|_| invalid("instant", rep))?
                .with_timezone(&Utc),
        ),
        '#' => return Err(Error::DanglingTag(rep.to_string())),
        other => Value::Tagged(other.to_string(), Box::new(Value::String(rep.to_string()))),
    })
}

fn tagged(tag: &str, rep: Value) -> Result<Value, Error> {
    let items = |rep: Value, expected| match rep {
        Value::Array(items) => Ok(items),
        _ => Err(Error::BadTagRep {
            tag: tag.to_string(),
            expected,
        }),
    };
    match tag {
        "set" => items(rep, "an array").map(Value::Set),
        "list" => items(rep, "an array").map(Value::List),
        "cmap" => {
            let flat = items(rep, "an array of key/value pairs")?;
            if flat.len() % 2 != 0 {
                return Err(Error::OddMap);
            }
            let mut flat = flat.into_iter();
            let mut entries = Vec::new();
            while let (Some(k), Some(v)) = (flat.next(), flat.next()) {
                entries.push((k, v));
            }
            Ok(Value::Map(entries))
        }
        "'" => Ok(rep),
        other => Ok(Value::Tagged(other.to_string(), Box::new(rep))),
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Encode `value` as compact transit+json.
pub fn to_string(value: &Value) -> Result<String, Error> {
    Ok(serde_json::to_string(&emit(value, false)?)?)
}

fn emit(value: &Value, as_key: bool) -> Result<Json, Error> {
    let tagged_str = |marker: char, rep: &str| Json::String(format!("{ESC}{marker}{rep}"));
    Ok(match value {
        Value::Null if as_key => tagged_str('_', ""),
        Value::Null => Json::Null,
        Value::Bool(b) if as_key => tagged_str('?', if *b { "t" } else { "f" }),
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) if as_key || n.unsigned_abs() > MAX_JSON_INT => tagged_str('i', &n.to_string()),
        Value::Int(n) => Json::Number((*n).into()),
        Value::Float(f) if f.is_nan() => tagged_str('z', "NaN"),
        Value::Float(f) if f.is_infinite() => {
            tagged_str('z', if f.is_sign_positive() { "INF" } else { "-INF" })
        }
        Value::Float(f) if as_key => tagged_str('d', &f.to_string()),
        Value::Float(f) => Json::Number(Number::from_f64(*f).ok_or(Error::NonFinite(*f))?),
        Value::BigInt(s) => tagged_str('n', s),
        Value::BigDecimal(s) => tagged_str('f', s),
        Value::String(s) => Json::String(escape(s)),
        Value::Keyword(s) => tagged_str(':', s),
        Value::Symbol(s) => tagged_str('$', s),
        Value::Uuid(u) => tagged_str('u', &u.to_string()),
        Value::Uri(s) => tagged_str('r', s),
        Value::Char(s) => tagged_str('c', s),
        Value::Instant(t) => tagged_str('m', &t.timestamp_millis().to_string()),
        Value::Bytes(s) => tagged_str('b', s),
        Value::Array(items) => Json::Array(emit_all(items)?),
        Value::List(items) => tag_array("list", Json::Array(emit_all(items)?)),
        Value::Set(items) => tag_array("set", Json::Array(emit_all(items)?)),
        Value::Map(entries) if entries.iter().all(|(k, _)| k.is_scalar()) => {
            let mut out = Vec::with_capacity(entries.len() * 2 + 1);
            out.push(Json::String(MAP_MARKER.to_string()));
            for (k, v) in entries {
                out.push(emit(k, true)?);
                out.push(emit(v, false)?);
            }
            Json::Array(out)
        }
        Value::Map(entries) => {
            let mut flat = Vec::with_capacity(entries.len() * 2);
            for (k, v) in entries {
                flat.push(emit(k, false)?);
                flat.push(emit(v, false)?);
            }
            tag_array("cmap", Json::Array(flat))
        }
        Value::Tagged(tag, rep) => match rep.as_ref() {
            Value::String(s) if tag.chars().count() == 1 => Json::String(format!("{ESC}{tag}{s}")),
            rep => tag_array(tag, emit(rep, false)?),
        },
    })
}

fn emit_all(items: &[Value]) -> Result<Vec<Json>, Error> {
    items.iter().map(|item| emit(item, false)).collect()
}

fn tag_array(tag: &str, rep: Json) -> Json {
    Json::Array(vec![Json::String(format!("{TAG_PREFIX}{tag}")), rep])
}

fn escape(s: &str) -> String {
    if s.starts_with(ESC) || s.starts_with(SUB) || s.starts_with(RESERVED) {
        format!("{ESC}{s}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read(s: &str) -> Value {
        from_slice(s.as_bytes()).unwrap()
    }

    #[test]
    fn reads_array_map_with_keywords() {
        let value = read(r#"["^ ","~:type","~:get-workflow-status","~:count",3]"#);
        assert_eq!(
            value,
            Value::Map(vec![
                (Value::keyword("type"), Value::keyword("get-workflow-status")),
                (Value::keyword("count"), Value::Int(3)),
            ])
        );
    }

    #[test]
    fn resolves_cache_references() {
        let value = read(r#"[["^ ","~:name","a","~:state","~:running"],["^ ","^0","b","^1","^2"]]"#);
        let Value::Array(rows) = value else {
            panic!("expected array")
        };
        assert_eq!(rows[1].get(&Value::keyword("name")), Some(&Value::String("b".into())));
        assert_eq!(rows[1].get(&Value::keyword("state")), Some(&Value::keyword("running")));
    }

    #[test]
    fn short_strings_are_not_cached() {
        // "~:id" is four characters and cached; "~:a" is not
        let value = read(r#"[["^ ","~:a",1,"~:id",2],["^ ","~:a",3,"^0",4]]"#);
        let Value::Array(rows) = value else {
            panic!("expected array")
        };
        assert_eq!(rows[1].get(&Value::keyword("id")), Some(&Value::Int(4)));
    }

    #[test]
    fn plain_string_values_are_not_cached() {
        let err = from_slice(br#"["long plain string","^0"]"#).unwrap_err();
        assert!(matches!(err, Error::CacheMiss(code) if code == "^0"));
    }

    #[test]
    fn two_digit_cache_codes() {
        assert_eq!(cache_index("0"), Some(0));
        assert_eq!(cache_index(":"), Some(10));
        assert_eq!(cache_index("10"), Some(44));
        assert_eq!(cache_index("[["), Some(CACHE_SIZE - 1));
        assert_eq!(cache_index("\\"), None);
        assert_eq!(cache_index("000"), None);
    }

    #[test]
    fn cache_resets_when_full() {
        let mut reader = Reader::default();
        for i in 0..CACHE_SIZE {
            reader.resolve(&format!("~:k{i:04}"), false).unwrap();
        }
        assert_eq!(reader.cache.len(), CACHE_SIZE);
        reader.resolve("~:overflow", false).unwrap();
        assert_eq!(reader.cache, vec!["~:overflow".to_string()]);
    }

    #[test]
    fn reads_tagged_collections() {
        assert_eq!(
            read(r#"["~#set",[1,2]]"#),
            Value::Set(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(read(r#"{"~#list":["a"]}"#), Value::List(vec![Value::String("a".into())]));
        assert_eq!(
            read(r#"["~#cmap",[["^ ","~:a",1],"x"]]"#),
            Value::Map(vec![(
                Value::Map(vec![(Value::keyword("a"), Value::Int(1))]),
                Value::String("x".into())
            )])
        );
        assert_eq!(read(r#"["~#'","~:q"]"#), Value::keyword("q"));
    }

    #[test]
    fn cached_tags_are_recognised() {
        let value = read(r#"[["~#set",[1]],["^0",[2]]]"#);
        assert_eq!(
            value,
            Value::Array(vec![Value::Set(vec![Value::Int(1)]), Value::Set(vec![Value::Int(2)])])
        );
    }

    #[test]
    fn reads_scalars() {
        assert_eq!(read(r#""~~tilde""#), Value::String("~tilde".into()));
        assert_eq!(read(r#""~^caret""#), Value::String("^caret".into()));
        assert_eq!(read(r#""~_""#), Value::Null);
        assert_eq!(read(r#""~?t""#), Value::Bool(true));
        assert_eq!(read(r#""~i42""#), Value::Int(42));
        assert_eq!(
            read(r#""~i123456789012345678901234567890""#),
            Value::BigInt("123456789012345678901234567890".into())
        );
        assert_eq!(read(r#""~d1.5""#), Value::Float(1.5));
        assert_eq!(read(r#""~$sym""#), Value::Symbol("sym".into()));
        assert_eq!(read(r#""~rhttps://circleci.com""#), Value::Uri("https://circleci.com".into()));
        assert_eq!(
            read(r#""~m1705314600000""#),
            Value::Instant(DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z").unwrap().into())
        );
        assert_eq!(
            read(r#""~t2024-01-15T10:30:00.000Z""#),
            read(r#""~m1705314600000""#)
        );
        assert!(matches!(read(r#""~zINF""#), Value::Float(f) if f.is_infinite()));
        assert_eq!(
            read(r#""~x custom""#),
            Value::Tagged("x".into(), Box::new(Value::String(" custom".into())))
        );
    }

    #[test]
    fn rejects_bad_scalars() {
        assert!(matches!(
            from_slice(br#""~unot-a-uuid""#),
            Err(Error::InvalidScalar { kind: "uuid", .. })
        ));
        assert!(matches!(from_slice(br#""~?x""#), Err(Error::InvalidScalar { .. })));
        assert!(matches!(from_slice(br#"["^ ","~:a"]"#), Err(Error::OddMap)));
        assert!(matches!(from_slice(br#""~#set""#), Err(Error::DanglingTag(_))));
        assert!(matches!(from_slice(b"[1,"), Err(Error::Json(_))));
    }

    #[test]
    fn converts_to_plain_json() {
        let value = read(
            r#"["^ ","~:run/id","~u5034460f-c7c4-4c43-9457-de07e2029e7b","~:tags",["~#set",["~:a"]],"~:at","~m1705315337250",7,"~_"]"#,
        );
        assert_eq!(
            value.to_json().unwrap(),
            json!({
                "run/id": "5034460f-c7c4-4c43-9457-de07e2029e7b",
                "tags": ["a"],
                "at": "2024-01-15T10:42:17.250Z",
                "7": null,
            })
        );
    }

    #[test]
    fn conversion_rejects_what_json_cannot_hold() {
        let composite_key = Value::Map(vec![(Value::Array(vec![]), Value::Null)]);
        assert!(matches!(composite_key.to_json(), Err(Error::UnsupportedKey(_))));
        assert!(matches!(Value::Float(f64::NAN).to_json(), Err(Error::NonFinite(_))));
        let unknown = Value::Tagged("point".into(), Box::new(Value::Array(vec![])));
        assert!(matches!(unknown.to_json(), Err(Error::UnknownTag(t)) if t == "point"));
    }

    #[test]
    fn writes_request_maps_compactly() {
        let value = Value::Map(vec![
            (Value::keyword("type"), Value::keyword("get-workflow-status")),
            (
                Value::keyword("params"),
                Value::Map(vec![(
                    Value::keyword("run/id"),
                    Value::Tagged("u".into(), Box::new(Value::String("abc-123".into()))),
                )]),
            ),
        ]);
        assert_eq!(
            to_string(&value).unwrap(),
            r#"["^ ","~:type","~:get-workflow-status","~:params",["^ ","~:run/id","~uabc-123"]]"#
        );
    }

    #[test]
    fn writer_escapes_and_tags() {
        let value = Value::Array(vec![
            Value::String("~x".into()),
            Value::String("^0".into()),
            Value::Set(vec![Value::Int(1)]),
            Value::Int(MAX_JSON_INT as i64 + 1),
            Value::Map(vec![(Value::List(vec![]), Value::Bool(false))]),
        ]);
        assert_eq!(
            to_string(&value).unwrap(),
            r#"["~~x","~^0",["~#set",[1]],"~i9007199254740993",["~#cmap",[["~#list",[]],false]]]"#
        );
    }

    #[test]
    fn written_values_read_back() {
        let value = Value::Map(vec![
            (Value::keyword("id"), Value::Uuid(Uuid::nil())),
            (Value::Int(1), Value::Symbol("s".into())),
            (Value::keyword("when"), Value::Instant(DateTime::from_timestamp_millis(1_000).unwrap())),
        ]);
        let encoded = to_string(&value).unwrap();
        assert_eq!(from_slice(encoded.as_bytes()).unwrap(), value);
    }
}
