use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Remote collections the admin pages read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Posts,
    Comments,
}

impl Collection {
    pub fn path(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Comments => "comments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Records that live in a remote collection and are addressed by a string id.
pub trait Entity: Clone + fmt::Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_views")]
    pub views: i64,
    #[serde(rename = "isDeleted", default, deserialize_with = "deserialize_flag")]
    pub is_deleted: bool,
    /// Fields the backend stores that this client does not model. Kept so a
    /// full-replace update never drops them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Post {
    const COLLECTION: Collection = Collection::Posts;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Empty when the backend has no usable reference; renders with the
    /// missing-post label.
    #[serde(rename = "postId", default, deserialize_with = "deserialize_ref_id")]
    pub post_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for Comment {
    const COLLECTION: Collection = Collection::Comments;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Catalog record. Read-only: the catalog pages never mutate products.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default)]
    pub category: Category,
    /// Normalized on decode; see [`ImageField`].
    #[serde(default, deserialize_with = "deserialize_images")]
    pub images: Vec<String>,
}

/// The `images` field as it appears on the wire: either a clean array of
/// URLs, or a JSON-encoded array that was stored as a string (and whose
/// entries may still carry stray brackets and quotes).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    List(Vec<String>),
    Encoded(String),
}

impl ImageField {
    pub fn into_urls(self) -> Vec<String> {
        let raw = match self {
            ImageField::List(entries) => entries,
            ImageField::Encoded(entry) => match serde_json::from_str::<Vec<String>>(&entry) {
                Ok(decoded) => decoded,
                Err(_) => vec![entry],
            },
        };
        raw.iter().flat_map(|entry| entry_urls(entry)).collect()
    }
}

/// A clean entry is kept as is (commas and all); anything else is scanned.
fn entry_urls(entry: &str) -> Vec<String> {
    let trimmed = entry.trim();
    if is_clean_url(trimmed) {
        return vec![trimmed.to_string()];
    }
    extract_urls(trimmed)
}

fn is_clean_url(entry: &str) -> bool {
    if entry.chars().any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '[' | ']')) {
        return false;
    }
    Url::parse(entry)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn url_re() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r#"https?://[^\s"'\[\],]+"#).expect("static regex"))
}

/// Pulls every http(s) URL out of a possibly bracket/quote-polluted string.
pub fn extract_urls(raw: &str) -> Vec<String> {
    url_re()
        .find_iter(raw)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Integer prefix parse: optional sign then leading digits, surrounding
/// whitespace ignored. `"12abc"` is 12, `"abc"` is None.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| n * sign)
}

/// Next id for a create: highest numeric id plus one, stringified. Ids that
/// do not parse count as 0, so an empty collection yields `"1"`.
pub fn next_id<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let max = ids
        .into_iter()
        .map(|id| parse_int_prefix(id).unwrap_or(0))
        .fold(0, i64::max);
    max.saturating_add(1).to_string()
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid id: {other}"))),
    }
}

fn deserialize_ref_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn deserialize_views<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_int_prefix(&s).unwrap_or(0),
        _ => 0,
    })
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<ImageField>::deserialize(deserializer)?;
    Ok(field.map(ImageField::into_urls).unwrap_or_default())
}
