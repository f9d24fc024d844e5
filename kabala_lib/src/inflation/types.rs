//! IMF response shapes and the `inflation.json` document.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Indicator code for annual average consumer price inflation.
pub const PCPIPCH: &str = "PCPIPCH";

/// Year → rate in percent, rounded to two decimals.
pub type YearlyRates = BTreeMap<i32, f64>;

/// `GET /external/datamapper/api/v1/PCPIPCH/{code}`.
///
/// `values.PCPIPCH.{code}` maps year strings to rates. Unknown codes come
/// back without a `values` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataMapperResponse {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, HashMap<String, Option<f64>>>>,
}

impl DataMapperResponse {
    pub fn series(&self, code: &str) -> Option<&HashMap<String, Option<f64>>> {
        self.values.get(PCPIPCH)?.get(code)
    }
}

/// Wrapped form of `inflation.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedInflation {
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub countries: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `inflation.json` in either of its two accepted shapes.
///
/// Country entries stay as JSON objects so keys the updater does not know
/// about keep their place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InflationDocument {
    Wrapped(WrappedInflation),
    Bare(Map<String, Value>),
}

impl InflationDocument {
    pub fn countries(&self) -> &Map<String, Value> {
        match self {
            Self::Wrapped(doc) => &doc.countries,
            Self::Bare(countries) => countries,
        }
    }

    pub fn countries_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Self::Wrapped(doc) => &mut doc.countries,
            Self::Bare(countries) => countries,
        }
    }
}
