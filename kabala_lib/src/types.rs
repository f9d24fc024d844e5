//! City records as stored in `cities.json`.
//!
//! Only the parts the updater touches are typed. Everything else in a record
//! (coordinates, currency, tax tables, history...) is carried through
//! untouched in its original key order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Provenance tag appended to `metrics.sources` after a scrape.
pub const NUMBEO_SOURCE: &str = "Numbeo";

/// A price expressed both in local currency and in USD.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoneyAmount {
    #[serde(default, serialize_with = "serialize_number")]
    pub local: f64,
    #[serde(default, serialize_with = "serialize_number")]
    pub usd: f64,
}

impl MoneyAmount {
    pub fn new(local: f64, usd: f64) -> Self {
        Self { local, usd }
    }
}

/// One city in the store.
///
/// The typed fields are views over the stored record and are written back
/// into their original positions on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct City {
    pub id: String,
    pub name: String,
    pub country_code: String,
    pub metrics: CityMetrics,
    record: Map<String, Value>,
}

impl City {
    /// Any other top-level key of the record (`country`, `coordinates`, ...).
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }
}

fn required_string(record: &Map<String, Value>, key: &str) -> Result<String, String> {
    match record.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("city field `{}` must be a string", key)),
        None => Err(format!("missing city field `{}`", key)),
    }
}

impl TryFrom<Map<String, Value>> for City {
    type Error = String;

    fn try_from(mut record: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = required_string(&record, "id")?;
        let name = required_string(&record, "name")?;
        let country_code = match record.get("countryCode") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(_) => return Err("city field `countryCode` must be a string".to_string()),
        };
        // The emptied object stays behind as the position marker for `metrics`.
        let metrics = match record.get_mut("metrics") {
            Some(Value::Object(map)) => CityMetrics(std::mem::take(map)),
            None => CityMetrics::default(),
            Some(_) => return Err("city field `metrics` must be an object".to_string()),
        };
        Ok(Self {
            id,
            name,
            country_code,
            metrics,
            record,
        })
    }
}

impl From<City> for Map<String, Value> {
    fn from(city: City) -> Self {
        let mut record = city.record;
        record.insert("id".to_string(), Value::String(city.id));
        record.insert("name".to_string(), Value::String(city.name));
        if !city.country_code.is_empty() {
            record.insert("countryCode".to_string(), Value::String(city.country_code));
        }
        record.insert("metrics".to_string(), Value::Object(city.metrics.0));
        record
    }
}

/// Metric categories (`salary`, `rent`, `property`, ...) plus the
/// `updatedAt` and `sources` metadata, in stored key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityMetrics(Map<String, Value>);

impl CityMetrics {
    /// Reads the amount stored at `path` (e.g. `["salary", "average"]`).
    pub fn amount(&self, path: &[&str]) -> Option<MoneyAmount> {
        let (first, rest) = path.split_first()?;
        let mut cursor = self.0.get(*first)?;
        for key in rest {
            cursor = cursor.get(*key)?;
        }
        serde_json::from_value(cursor.clone()).ok()
    }

    /// Writes `amount` at `path`, creating missing parent objects.
    ///
    /// A parent that exists but is not an object is replaced.
    pub fn set_amount(&mut self, path: &[&str], amount: MoneyAmount) {
        let Some((leaf, parents)) = path.split_last() else {
            return;
        };
        let mut cursor = &mut self.0;
        for key in parents {
            let entry = cursor
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            cursor = match entry {
                Value::Object(map) => map,
                _ => unreachable!("parent was just made an object"),
            };
        }
        let value = serde_json::to_value(amount).unwrap_or(Value::Null);
        cursor.insert(leaf.to_string(), value);
    }

    /// The salary pair that anchors local/USD conversion, if stored.
    pub fn salary_average(&self) -> Option<MoneyAmount> {
        self.amount(&["salary", "average"])
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.0.get("updatedAt").and_then(Value::as_str)
    }

    pub fn updated_on(&self, date: NaiveDate) -> bool {
        self.updated_at() == Some(date.format("%Y-%m-%d").to_string().as_str())
    }

    /// Sets `updatedAt`, in place when the key already exists.
    pub fn stamp_updated(&mut self, date: NaiveDate) {
        self.0.insert(
            "updatedAt".to_string(),
            Value::String(date.format("%Y-%m-%d").to_string()),
        );
    }

    /// The provenance tags, `None` when the record has no `sources` list.
    pub fn sources(&self) -> Option<Vec<&str>> {
        let list = self.0.get("sources")?.as_array()?;
        Some(list.iter().filter_map(Value::as_str).collect())
    }

    /// Appends `tag` to `sources` unless it is already listed.
    pub fn add_source(&mut self, tag: &str) {
        let entry = self
            .0
            .entry("sources".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !entry.is_array() {
            *entry = Value::Array(Vec::new());
        }
        if let Value::Array(list) = entry {
            if !list.iter().any(|s| s.as_str() == Some(tag)) {
                list.push(Value::String(tag.to_string()));
            }
        }
    }
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Writes integral floats as integers so `2000.0` is stored as `2000`.
pub(crate) fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_SAFE {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// `value` as a JSON number, integral values without a fraction.
pub(crate) fn number_value(value: f64) -> Value {
    serialize_number(&value, serde_json::value::Serializer).unwrap_or(Value::Null)
}
