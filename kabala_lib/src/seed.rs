//! Lookup tables embedded from `seed_data/` at compile time.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedDataError {
    #[error("TOML parse error in {file}: {message}")]
    TomlParse { file: &'static str, message: String },
    #[error("Invalid seed data: {0}")]
    InvalidSeedData(String),
}

#[derive(Deserialize, Debug)]
struct SlugEntry {
    city_id: String,
    slug: String,
}

#[derive(Deserialize, Debug)]
struct SlugFile {
    slug: Vec<SlugEntry>,
}

#[derive(Deserialize, Debug)]
struct CountryEntry {
    iso2: String,
    imf: String,
}

#[derive(Deserialize, Debug)]
struct CountryFile {
    country: Vec<CountryEntry>,
}

fn parse_slug_overrides(toml_content: &str) -> Result<HashMap<String, String>, SeedDataError> {
    let file: SlugFile = toml::from_str(toml_content).map_err(|e| SeedDataError::TomlParse {
        file: "numbeo_slugs.toml",
        message: e.to_string(),
    })?;

    let mut overrides = HashMap::with_capacity(file.slug.len());
    for entry in file.slug {
        if entry.slug.trim().is_empty() {
            return Err(SeedDataError::InvalidSeedData(format!(
                "empty slug for city '{}'",
                entry.city_id
            )));
        }
        if overrides.insert(entry.city_id.clone(), entry.slug).is_some() {
            return Err(SeedDataError::InvalidSeedData(format!(
                "duplicate slug override for city '{}'",
                entry.city_id
            )));
        }
    }
    Ok(overrides)
}

fn parse_imf_codes(toml_content: &str) -> Result<Vec<(String, String)>, SeedDataError> {
    let file: CountryFile = toml::from_str(toml_content).map_err(|e| SeedDataError::TomlParse {
        file: "imf_countries.toml",
        message: e.to_string(),
    })?;

    let mut codes = Vec::with_capacity(file.country.len());
    for entry in file.country {
        if entry.iso2.len() != 2 || entry.imf.len() != 3 {
            return Err(SeedDataError::InvalidSeedData(format!(
                "malformed country code pair {} -> {}",
                entry.iso2, entry.imf
            )));
        }
        codes.push((entry.iso2, entry.imf));
    }
    Ok(codes)
}

/// City id → Numbeo URL slug, for cities whose name does not transliterate
/// to the slug Numbeo uses.
pub fn load_slug_overrides() -> Result<HashMap<String, String>, SeedDataError> {
    parse_slug_overrides(include_str!("../../seed_data/numbeo_slugs.toml"))
}

/// ISO alpha-2 → IMF alpha-3 pairs, in file order.
pub fn load_imf_codes() -> Result<Vec<(String, String)>, SeedDataError> {
    parse_imf_codes(include_str!("../../seed_data/imf_countries.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_slug_overrides_load() {
        let overrides = load_slug_overrides().unwrap();
        assert_eq!(overrides.len(), 29);
        assert_eq!(overrides["kyiv"], "Kiev");
        assert_eq!(overrides["san-jose"], "San-Jose-Costa-Rica");
    }

    #[test]
    fn embedded_imf_codes_load() {
        let codes = load_imf_codes().unwrap();
        assert_eq!(codes.len(), 42);
        assert!(codes.contains(&("DE".to_string(), "DEU".to_string())));
        assert!(codes.contains(&("CR".to_string(), "CRI".to_string())));
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let toml = r#"
            [[slug]]
            city_id = "a"
            slug = "A"

            [[slug]]
            city_id = "a"
            slug = "B"
        "#;
        assert!(matches!(
            parse_slug_overrides(toml),
            Err(SeedDataError::InvalidSeedData(_))
        ));
    }

    #[test]
    fn malformed_country_code_is_rejected() {
        let toml = r#"
            [[country]]
            iso2 = "DEU"
            imf = "DE"
        "#;
        assert!(parse_imf_codes(toml).is_err());
    }

    #[test]
    fn invalid_toml_is_reported() {
        assert!(matches!(
            parse_imf_codes("not = [valid"),
            Err(SeedDataError::TomlParse { .. })
        ));
    }
}
