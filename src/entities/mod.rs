// Entity Models
// Shapes the FinApp backend serves, with Portuguese wire names mapped to
// English fields. The backend is loose about number/string encodings, so
// the helpers below accept both.

pub mod category;
pub mod transaction;

pub use category::{
    Category, CategoryKey, CategoryType, NewCategory, PredefinedCategory, PREDEFINED_CATEGORIES,
};
pub use transaction::{NewTransaction, Transaction};

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

/// `42`, `"42"` and `null` all decode; numbers become their decimal text
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(StringOrNumber::into_string))
}

/// `45.9` or `"45.90"`
pub(crate) fn decimal_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("amount out of range: {}", n))),
        StringOrNumber::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid amount: {:?}", s))),
    }
}

/// `2025-01-05` or `2025-01-05T00:00:00.000Z` (time part ignored)
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| D::Error::custom(format!("invalid date: {:?}", raw)))
}
