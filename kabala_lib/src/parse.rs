//! Price extraction from Numbeo cost-of-living pages.
//!
//! The page lists prices as two-column table rows: a label cell followed by a
//! `priceValue` cell. Each label is matched against [`LABEL_CATALOG`]; that
//! table is the only place field names come from. When Numbeo rewords a label
//! the field silently stops being extracted, so the catalog has to follow the
//! upstream wording.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("regex compile error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Fields the parser knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceField {
    MealInexpensive,
    Mcdonalds,
    Cappuccino,
    Milk,
    Bread,
    Rice,
    Eggs,
    Cheese,
    Chicken,
    Beef,
    Apples,
    Bananas,
    Tomatoes,
    Potatoes,
    Onions,
    Lettuce,
    #[serde(rename = "water1_5l")]
    Water1_5l,
    Wine,
    MonthlyPass,
    TaxiKm,
    Gasoline,
    BasicUtilities,
    Internet,
    Mobile,
    Gym,
    Cinema,
    Preschool,
    InternationalSchool,
    #[serde(rename = "rent1bedCenter")]
    Rent1bedCenter,
    #[serde(rename = "rent1bedOutside")]
    Rent1bedOutside,
    #[serde(rename = "rent3bedCenter")]
    Rent3bedCenter,
    #[serde(rename = "rent3bedOutside")]
    Rent3bedOutside,
    PricePerSqmCenter,
    PricePerSqmOutside,
    AvgSalary,
}

/// Ordered (label substring, field) pairs. The first substring contained in a
/// row label decides the field for that row.
pub const LABEL_CATALOG: &[(&str, PriceField)] = &[
    ("Meal at an Inexpensive Restaurant", PriceField::MealInexpensive),
    ("Combo Meal at McDonald", PriceField::Mcdonalds),
    ("Cappuccino (Regular", PriceField::Cappuccino),
    ("Milk (Regular", PriceField::Milk),
    ("Fresh White Bread", PriceField::Bread),
    ("White Rice (1 kg)", PriceField::Rice),
    ("Eggs (12", PriceField::Eggs),
    ("Local Cheese (1 kg)", PriceField::Cheese),
    ("Chicken Fillets (1 kg)", PriceField::Chicken),
    ("Beef Round", PriceField::Beef),
    ("Apples (1 kg)", PriceField::Apples),
    ("Bananas (1 kg)", PriceField::Bananas),
    ("Tomatoes (1 kg)", PriceField::Tomatoes),
    ("Potatoes (1 kg)", PriceField::Potatoes),
    ("Onions (1 kg)", PriceField::Onions),
    ("Lettuce (1 Head)", PriceField::Lettuce),
    ("Bottled Water (1.5 Liter)", PriceField::Water1_5l),
    ("Bottle of Wine (Mid-Range)", PriceField::Wine),
    ("Monthly Public Transport Pass", PriceField::MonthlyPass),
    ("Taxi 1 km (Standard Tariff)", PriceField::TaxiKm),
    ("Gasoline (1 Liter)", PriceField::Gasoline),
    ("Basic Utilities for 85 m2", PriceField::BasicUtilities),
    ("Broadband Internet", PriceField::Internet),
    ("Mobile Phone Plan", PriceField::Mobile),
    ("Monthly Fitness Club", PriceField::Gym),
    ("Cinema Ticket", PriceField::Cinema),
    ("Preschool or Kindergarten", PriceField::Preschool),
    ("International Primary School", PriceField::InternationalSchool),
    ("1 Bedroom Apartment in City Centre", PriceField::Rent1bedCenter),
    ("1 Bedroom Apartment Outside", PriceField::Rent1bedOutside),
    ("3 Bedroom Apartment in City Centre", PriceField::Rent3bedCenter),
    ("3 Bedroom Apartment Outside", PriceField::Rent3bedOutside),
    (
        "Price per Square Meter to Buy Apartment in City Centre",
        PriceField::PricePerSqmCenter,
    ),
    (
        "Price per Square Meter to Buy Apartment Outside",
        PriceField::PricePerSqmOutside,
    ),
    ("Average Monthly Net Salary", PriceField::AvgSalary),
];

/// Markers Numbeo shows instead of a price table when a city lacks data.
pub const INSUFFICIENT_DATA_MARKERS: &[&str] = &[
    "There are no enough data points",
    "We don't have enough data",
];

/// Strictly positive prices keyed by field. A missing key means the page did
/// not provide the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFields(BTreeMap<PriceField, f64>);

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` only if it is a positive number.
    pub fn insert(&mut self, field: PriceField, value: f64) -> bool {
        if value.is_finite() && value > 0.0 {
            self.0.insert(field, value);
            true
        } else {
            false
        }
    }

    pub fn get(&self, field: PriceField) -> Option<f64> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: PriceField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PriceField, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(PriceField, f64)> for ExtractedFields {
    fn from_iter<I: IntoIterator<Item = (PriceField, f64)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (field, value) in iter {
            fields.insert(field, value);
        }
        fields
    }
}

pub fn has_insufficient_data(html: &str) -> bool {
    INSUFFICIENT_DATA_MARKERS
        .iter()
        .any(|marker| html.contains(marker))
}

/// Looks up the field for a row label.
pub fn match_label(label: &str) -> Option<PriceField> {
    LABEL_CATALOG
        .iter()
        .find(|(substring, _)| label.contains(substring))
        .map(|(_, field)| *field)
}

/// Extracts every catalogued price from a page.
pub fn parse_price_page(html: &str) -> Result<ExtractedFields, ParseError> {
    let row_re = Regex::new(
        r#"(?i)<tr><td[^>]*>(.*?)</td>\s*<td[^>]*class="priceValue[^"]*"[^>]*>\s*<span[^>]*>(.*?)</span>"#,
    )?;
    let tag_re = Regex::new(r"<[^>]*>")?;

    let mut fields = ExtractedFields::new();
    for cap in row_re.captures_iter(html) {
        let label = tag_re.replace_all(&cap[1], "");
        let label = label.trim();

        let Some(field) = match_label(label) else {
            continue;
        };

        let value = cap[2].replace("&nbsp;", " ").replace("&#36;", "$");
        let value = tag_re.replace_all(&value, "");
        if let Some(price) = parse_number(value.trim()) {
            fields.insert(field, price);
        }
    }

    Ok(fields)
}

/// Reads the leading decimal number after discarding everything but digits,
/// `.` and `-`: `"1,234.50 $"` → `1234.5`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let bytes = cleaned.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        digits += end - frac_start;
    }
    if digits == 0 {
        return None;
    }
    cleaned[..end].trim_end_matches('.').parse().ok()
}
