//! Request bodies and response id extraction.
use chrono::{Local, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

const PRODUCT_IMAGE_URL: &str = "https://via.placeholder.com/300";
const USER_IMAGE_URL: &str = "https://bootdey.com/img/Content/avatar/avatar7.png";
const ORDER_DESC: &str = "Performance Test Order";

/// Identifier as handed out by the services: either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Text(String),
    /// Any other JSON number (fractional, or beyond `i64`), kept as the service sent it.
    Raw(Number),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{n}"),
            Id::Text(s) => f.write_str(s),
            Id::Raw(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Num(n)
    }
}

/// Reads `field` out of a JSON object. Missing and `null` both yield `None`.
pub fn id_field(body: &Value, field: &str) -> Option<Id> {
    match body.get(field)? {
        Value::Number(n) => Some(n.as_i64().map_or_else(|| Id::Raw(n.clone()), Id::Num)),
        Value::String(s) => Some(Id::Text(s.clone())),
        _ => None,
    }
}

/// Ids of the first `limit` entries of a `{"collection": [...]}` body.
pub fn collection_ids(body: &Value, field: &str, limit: usize) -> Vec<Id> {
    body.get("collection")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .take(limit)
                .filter_map(|entry| id_field(entry, field))
                .collect()
        })
        .unwrap_or_default()
}

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Millisecond wall-clock stamp, strictly increasing across the whole process.
///
/// Two calls within the same millisecond get consecutive values, so generated SKUs and emails
/// never collide.
pub fn unique_stamp() -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let prev = LAST_STAMP
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
            Some(now.max(prev + 1))
        })
        .unwrap_or_else(|prev| prev);
    now.max(prev + 1)
}

/// `DD-MM-YYYY__HH:MM:SS:ffffff`, microseconds zero padded.
pub fn format_order_date(time: &NaiveDateTime) -> String {
    time.format("%d-%m-%Y__%H:%M:%S:%6f").to_string()
}

fn price<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    (rng.gen_range(low..=high) * 100.).round() / 100.
}

fn phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("+57-300-{}", rng.gen_range(1_000_000..=9_999_999))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub category_id: Id,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product_title: String,
    pub image_url: &'static str,
    pub sku: String,
    pub price_unit: f64,
    pub quantity: u32,
    pub category: CategoryRef,
}

impl NewProduct {
    pub fn generate<R: Rng + ?Sized>(category_id: Id, rng: &mut R) -> Self {
        let stamp = unique_stamp();
        Self {
            product_title: format!("Performance Test Product {stamp}"),
            image_url: PRODUCT_IMAGE_URL,
            sku: format!("PERF-TEST-{stamp}"),
            price_unit: price(rng, 10., 1000.),
            quantity: rng.gen_range(1..=100),
            category: CategoryRef { category_id },
        }
    }
}

/// Which flavour of generated user to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    /// Standalone `create_user` task.
    Performance,
    /// User created on demand by the order flow.
    Order,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: &'static str,
    pub email: String,
    pub phone: String,
    pub image_url: &'static str,
}

impl NewUser {
    pub fn generate<R: Rng + ?Sized>(kind: UserKind, rng: &mut R) -> Self {
        let stamp = unique_stamp();
        let (first_name, last_name, email) = match kind {
            UserKind::Performance => (
                format!("TestUser{stamp}"),
                "Performance",
                format!("perf.test.{stamp}@example.com"),
            ),
            UserKind::Order => (
                format!("OrderUser{stamp}"),
                "Test",
                format!("order.user.{stamp}@example.com"),
            ),
        };

        Self {
            first_name,
            last_name,
            email,
            phone: phone(rng),
            image_url: USER_IMAGE_URL,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCart {
    pub user_id: Id,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRef {
    pub cart_id: Id,
    pub user_id: Id,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_date: String,
    pub order_desc: &'static str,
    pub order_fee: f64,
    pub cart: CartRef,
}

impl NewOrder {
    pub fn generate<R: Rng + ?Sized>(cart_id: Id, user_id: Id, rng: &mut R) -> Self {
        Self {
            order_date: format_order_date(&Local::now().naive_local()),
            order_desc: ORDER_DESC,
            order_fee: price(rng, 10., 500.),
            cart: CartRef { cart_id, user_id },
        }
    }
}
