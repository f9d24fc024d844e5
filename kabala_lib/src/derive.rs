//! Composite metrics derived from raw page prices.

use crate::parse::{ExtractedFields, PriceField};
use crate::types::{round2, MoneyAmount};

/// Staple items and their assumed monthly quantities for one person.
pub const GROCERY_BASKET: &[(PriceField, f64)] = &[
    (PriceField::Milk, 8.0),
    (PriceField::Bread, 4.0),
    (PriceField::Rice, 2.0),
    (PriceField::Eggs, 2.0),
    (PriceField::Cheese, 0.5),
    (PriceField::Chicken, 4.0),
    (PriceField::Beef, 2.0),
    (PriceField::Apples, 2.0),
    (PriceField::Bananas, 2.0),
    (PriceField::Tomatoes, 2.0),
    (PriceField::Potatoes, 3.0),
    (PriceField::Onions, 1.0),
    (PriceField::Lettuce, 4.0),
    (PriceField::Water1_5l, 8.0),
];

/// Fewer priced basket items than this and the estimate is not trusted.
pub const MIN_BASKET_ITEMS: usize = 5;

/// Position of the two-bedroom rent between one- and three-bedroom rent.
pub const TWO_BEDROOM_POSITION: f64 = 0.45;

/// Assumed floor areas (m²) for 1/2/3-bedroom purchases.
pub const UNIT_AREAS_SQM: [f64; 3] = [50.0, 75.0, 110.0];

/// Monthly grocery bill, rounded to a whole amount.
pub fn estimate_monthly_groceries(fields: &ExtractedFields) -> Option<f64> {
    let (total, items) = GROCERY_BASKET
        .iter()
        .filter_map(|(field, qty)| fields.get(*field).map(|price| price * qty))
        .fold((0.0, 0usize), |(total, items), cost| (total + cost, items + 1));

    if items >= MIN_BASKET_ITEMS {
        Some(total.round())
    } else {
        None
    }
}

pub fn interpolate_two_bedroom(one_bedroom: f64, three_bedroom: f64) -> f64 {
    one_bedroom + (three_bedroom - one_bedroom) * TWO_BEDROOM_POSITION
}

/// Purchase prices for 1/2/3-bedroom units at the given price per m².
pub fn purchase_prices(price_per_sqm: f64) -> [f64; 3] {
    UNIT_AREAS_SQM.map(|area| price_per_sqm * area)
}

/// Exchange rate implied by a city's stored salary.
///
/// With no usable salary pair the rate is 1, i.e. the local amount is
/// assumed equal to the USD amount. That is an approximation, not an FX
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeAnchor {
    rate: Option<f64>,
}

impl ExchangeAnchor {
    pub fn from_salary(salary: Option<MoneyAmount>) -> Self {
        let rate = salary
            .filter(|s| s.local > 0.0 && s.usd > 0.0)
            .map(|s| s.local / s.usd);
        Self { rate }
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn local_from_usd(&self, usd: f64) -> f64 {
        match self.rate {
            Some(rate) => round2(usd * rate),
            None => usd,
        }
    }

    /// Both sides rounded to cents.
    pub fn amount(&self, usd: f64) -> MoneyAmount {
        MoneyAmount::new(round2(self.local_from_usd(usd)), round2(usd))
    }
}

/// A derived USD value and where it goes in a city's metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricUpdate {
    /// Short label used in the per-city log line.
    pub label: &'static str,
    pub path: &'static [&'static str],
    pub usd: f64,
}

/// Direct one-to-one mappings from a page field to a metric, in update order
/// after salary, rent, property and groceries.
const DIRECT_METRICS: &[(PriceField, &str, &[&str])] = &[
    (PriceField::MealInexpensive, "food.restaurant", &["food", "restaurantMeal"]),
    (PriceField::Mcdonalds, "food.fastfood", &["food", "fastFood"]),
    (PriceField::MonthlyPass, "transport.pass", &["transport", "monthlyPass"]),
    (PriceField::TaxiKm, "transport.taxi", &["transport", "taxiPerKm"]),
    (PriceField::Gasoline, "transport.gas", &["transport", "gasoline"]),
    (PriceField::BasicUtilities, "utilities.basic", &["utilities", "basic"]),
    (PriceField::Internet, "utilities.internet", &["utilities", "internet"]),
    (PriceField::Mobile, "utilities.mobile", &["utilities", "mobile"]),
    (PriceField::Gym, "lifestyle.gym", &["lifestyle", "gymMembership"]),
    (PriceField::Cinema, "lifestyle.cinema", &["lifestyle", "cinema"]),
    (PriceField::Cappuccino, "lifestyle.cappuccino", &["lifestyle", "cappuccino"]),
    (PriceField::Preschool, "education.preschool", &["education", "preschool"]),
    (
        PriceField::InternationalSchool,
        "education.intlSchool",
        &["education", "internationalSchool"],
    ),
];

const BUY_CENTER: [(&str, &[&str]); 3] = [
    ("property.buy1bed", &["property", "buyCityCenter", "oneBedroom"]),
    ("property.buy2bed", &["property", "buyCityCenter", "twoBedroom"]),
    ("property.buy3bed", &["property", "buyCityCenter", "threeBedroom"]),
];

const BUY_OUTSIDE: [(&str, &[&str]); 3] = [
    ("property.buyOut1bed", &["property", "buyOutside", "oneBedroom"]),
    ("property.buyOut2bed", &["property", "buyOutside", "twoBedroom"]),
    ("property.buyOut3bed", &["property", "buyOutside", "threeBedroom"]),
];

/// Every metric that can be written from `fields`, in a fixed order.
pub fn plan_updates(fields: &ExtractedFields) -> Vec<MetricUpdate> {
    let mut updates = Vec::new();
    let mut push = |label: &'static str, path: &'static [&'static str], usd: f64| {
        updates.push(MetricUpdate { label, path, usd });
    };

    if let Some(salary) = fields.get(PriceField::AvgSalary) {
        push("salary.average", &["salary", "average"], salary);
    }

    let one_bed = fields.get(PriceField::Rent1bedCenter);
    let three_bed = fields.get(PriceField::Rent3bedCenter);
    if let Some(rent) = one_bed {
        push("rent.1bed", &["rent", "oneBedroom"], rent);
    }
    if let Some(rent) = three_bed {
        push("rent.3bed", &["rent", "threeBedroom"], rent);
    }
    if let (Some(one), Some(three)) = (one_bed, three_bed) {
        push(
            "rent.2bed",
            &["rent", "twoBedroom"],
            interpolate_two_bedroom(one, three),
        );
    }

    if let Some(sqm) = fields.get(PriceField::PricePerSqmCenter) {
        push("property.center", &["property", "cityCenter"], sqm);
        for ((label, path), price) in BUY_CENTER.into_iter().zip(purchase_prices(sqm)) {
            push(label, path, price);
        }
    }
    if let Some(sqm) = fields.get(PriceField::PricePerSqmOutside) {
        push("property.outside", &["property", "outside"], sqm);
        for ((label, path), price) in BUY_OUTSIDE.into_iter().zip(purchase_prices(sqm)) {
            push(label, path, price);
        }
    }

    if let Some(groceries) = estimate_monthly_groceries(fields) {
        push("food.groceries", &["food", "groceries"], groceries);
    }

    for &(field, label, path) in DIRECT_METRICS {
        if let Some(value) = fields.get(field) {
            push(label, path, value);
        }
    }

    updates
}
