//! JSON file persistence for the city and inflation stores.
//!
//! Both files are rewritten wholesale: pretty-printed with two-space indent
//! and a trailing newline. There is no temp-file-and-rename step, so a crash
//! mid-write can leave a truncated file; checkpoints keep the loss small.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;
use crate::inflation::InflationDocument;
use crate::types::City;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    fs::write(path, text).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// `cities.json`: a JSON array of city records.
#[derive(Debug, Clone)]
pub struct CityStore {
    path: PathBuf,
}

impl CityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<City>, StoreError> {
        read_json(&self.path)
    }

    pub fn save(&self, cities: &[City]) -> Result<(), StoreError> {
        write_json(&self.path, cities)
    }
}

/// `inflation.json`: country inflation rates, wrapped or bare.
#[derive(Debug, Clone)]
pub struct InflationStore {
    path: PathBuf,
}

impl InflationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<InflationDocument, StoreError> {
        read_json(&self.path)
    }

    pub fn save(&self, document: &InflationDocument) -> Result<(), StoreError> {
        write_json(&self.path, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "kabala-store-{}-{}-{}.json",
            name,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn city_store_round_trip_is_stable() {
        let path = temp_path("cities");
        let original = r#"[
  {
    "id": "berlin",
    "name": "Berlin",
    "countryCode": "DE",
    "metrics": {
      "salary": {
        "average": {
          "local": 3500,
          "usd": 3800.5
        }
      },
      "updatedAt": "2025-01-01"
    }
  }
]
"#;
        fs::write(&path, original).unwrap();

        let store = CityStore::new(&path);
        let cities = store.load().unwrap();
        store.save(&cities).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn round_trip_keeps_record_key_order() {
        let path = temp_path("order");
        let original = r#"[
  {
    "id": "lisbon",
    "name": "Lisbon",
    "country": "Portugal",
    "countryCode": "PT",
    "region": "Europe",
    "metrics": {
      "updatedAt": "2025-01-01",
      "sources": [
        "INE"
      ],
      "salary": {
        "average": {
          "local": 1400,
          "usd": 1512.25
        }
      }
    },
    "historical": {
      "2024": {
        "rent": 1100
      }
    }
  }
]
"#;
        fs::write(&path, original).unwrap();

        let store = CityStore::new(&path);
        let cities = store.load().unwrap();
        store.save(&cities).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_read_error() {
        let store = CityStore::new(temp_path("missing"));
        assert!(matches!(store.load(), Err(StoreError::Read { .. })));
    }

    #[test]
    fn invalid_json_is_reported_with_path() {
        let path = temp_path("invalid");
        fs::write(&path, "{not json").unwrap();
        let err = CityStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
        assert!(err.to_string().contains("kabala-store-invalid"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn inflation_store_accepts_both_forms() {
        let wrapped = temp_path("wrapped");
        fs::write(
            &wrapped,
            r#"{"lastUpdated": "2025-01-01", "source": "IMF", "countries": {"DE": {"name": "Germany", "inflation2025": 2.1, "inflation2026": 2, "inflation2027": 2, "propertyGrowth2026": 2.6, "notes": ""}}}"#,
        )
        .unwrap();
        let bare = temp_path("bare");
        fs::write(
            &bare,
            r#"{"DE": {"name": "Germany", "inflation2025": 2.1, "inflation2026": 2, "inflation2027": 2, "propertyGrowth2026": 2.6, "notes": ""}}"#,
        )
        .unwrap();

        let wrapped_doc = InflationStore::new(&wrapped).load().unwrap();
        let bare_doc = InflationStore::new(&bare).load().unwrap();

        assert!(matches!(wrapped_doc, InflationDocument::Wrapped(_)));
        assert!(matches!(bare_doc, InflationDocument::Bare(_)));
        assert!(wrapped_doc.countries().contains_key("DE"));
        assert!(bare_doc.countries().contains_key("DE"));

        fs::remove_file(&wrapped).ok();
        fs::remove_file(&bare).ok();
    }
}
