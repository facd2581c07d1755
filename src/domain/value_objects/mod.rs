//! Value Objects for the storefront

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Opaque token correlating a shopper's cart across requests.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    const MAX_LEN: usize = 128;

    pub fn parse(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(SessionIdError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(SessionIdError::TooLong); }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(SessionIdError::InvalidCharacters);
        }
        Ok(Self(value))
    }

    pub fn mint() -> Self { Self(Uuid::new_v4().to_string()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionIdError {
    #[error("session id is required")]
    Empty,
    #[error("session id is too long")]
    TooLong,
    #[error("session id contains invalid characters")]
    InvalidCharacters,
}

/// Catalog identifier of a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    pub fn new(id: Uuid) -> Self { Self(id) }
    pub fn generate() -> Self { Self(Uuid::now_v7()) }
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl FromStr for ProductId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Product reference carried by order lines.
///
/// Orders imported from older data may point at products that were never in
/// the catalog database; those keep their raw value as `Legacy` and are never
/// used as a lookup key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProductRef {
    Known(ProductId),
    Legacy(String),
}

impl ProductRef {
    pub fn parse(raw: &str) -> Self {
        raw.parse::<ProductId>().map(Self::Known).unwrap_or_else(|_| Self::Legacy(raw.to_string()))
    }

    pub fn known(&self) -> Option<ProductId> {
        match self {
            Self::Known(id) => Some(*id),
            Self::Legacy(_) => None,
        }
    }
}

impl From<ProductId> for ProductRef {
    fn from(id: ProductId) -> Self { Self::Known(id) }
}

/// Display data copied from the catalog when a product enters a cart or order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub name: String,
    pub image: Option<String>,
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_country() -> String { "United States".to_string() }

/// Postal address used for shipping and billing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(default = "default_country")]
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
}

/// Order number: two-letter prefix, YYMMDD, six uppercase alphanumerics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub const LEN: usize = 14;

    pub fn parse(value: &str) -> Result<Self, OrderNumberError> {
        let value = value.trim();
        if value.len() != Self::LEN || !value.is_ascii() { return Err(OrderNumberError::Malformed); }
        let (prefix, rest) = value.split_at(2);
        let (date, suffix) = rest.split_at(6);
        let ok = prefix.chars().all(|c| c.is_ascii_uppercase())
            && date.chars().all(|c| c.is_ascii_digit())
            && suffix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !ok { return Err(OrderNumberError::Malformed); }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("order number prefix must be two uppercase letters")]
    InvalidPrefix,
    #[error("malformed order number")]
    Malformed,
}

const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: u32 = 6;
const SUFFIX_SPACE: u64 = 36u64.pow(SUFFIX_LEN);
// Coprime with 36^6, so the affine map below visits every suffix once per cycle.
const SUFFIX_STRIDE: u64 = 2_654_435_761;

/// Issues order numbers.
///
/// Suffixes come from a randomly seeded affine permutation of a counter, so a
/// single generator never repeats itself within 36^6 numbers. Collisions
/// between processes are caught by the store's unique constraint and retried.
#[derive(Debug)]
pub struct OrderNumberGenerator {
    prefix: String,
    offset: u64,
    counter: AtomicU64,
}

impl OrderNumberGenerator {
    pub fn new(prefix: &str) -> Result<Self, OrderNumberError> {
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(OrderNumberError::InvalidPrefix);
        }
        let mut rng = rand::thread_rng();
        Ok(Self {
            prefix: prefix.to_string(),
            offset: rng.gen_range(0..SUFFIX_SPACE),
            counter: AtomicU64::new(rng.gen_range(0..SUFFIX_SPACE)),
        })
    }

    pub fn next(&self) -> OrderNumber { self.next_at(Utc::now()) }

    pub fn next_at(&self, at: DateTime<Utc>) -> OrderNumber {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) % SUFFIX_SPACE;
        let mut value = (self.offset + n * SUFFIX_STRIDE) % SUFFIX_SPACE;
        let mut suffix = [b'0'; SUFFIX_LEN as usize];
        for slot in suffix.iter_mut().rev() {
            *slot = SUFFIX_ALPHABET[(value % 36) as usize];
            value /= 36;
        }
        OrderNumber(format!("{}{}{}", self.prefix, at.format("%y%m%d"), String::from_utf8_lossy(&suffix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    #[test]
    fn test_session_id() {
        assert!(SessionId::parse("  ").is_err());
        assert!(SessionId::parse("abc/def").is_err());
        assert_eq!(SessionId::parse(" guest-42 ").unwrap().as_str(), "guest-42");
        assert!(SessionId::parse(SessionId::mint().as_str()).is_ok());
    }

    #[test]
    fn test_product_ref() {
        let id = ProductId::generate();
        assert_eq!(ProductRef::parse(&id.to_string()), ProductRef::Known(id));
        let legacy = ProductRef::parse("42");
        assert_eq!(legacy, ProductRef::Legacy("42".into()));
        assert_eq!(legacy.known(), None);
    }

    #[test]
    fn test_order_number_format() {
        let generator = OrderNumberGenerator::new("FL").unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let number = generator.next_at(at);
        assert!(number.as_str().starts_with("FL260307"));
        assert_eq!(OrderNumber::parse(number.as_str()), Ok(number));
    }

    #[test]
    fn test_order_numbers_unique() {
        let generator = OrderNumberGenerator::new("FL").unwrap();
        let at = Utc::now();
        let numbers: HashSet<_> = (0..10_000).map(|_| generator.next_at(at)).collect();
        assert_eq!(numbers.len(), 10_000);
    }

    #[test]
    fn test_invalid_prefix() {
        assert_eq!(OrderNumberGenerator::new("fl").unwrap_err(), OrderNumberError::InvalidPrefix);
        assert!(OrderNumberGenerator::new("FLO").is_err());
        assert!(OrderNumber::parse("FL2603071234a5").is_err());
    }
}
