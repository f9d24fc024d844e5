//! Numbeo URL construction for a city.

use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use url::Url;

/// Transliterates a display name into a Numbeo slug.
///
/// Strips diacritics, drops apostrophes and periods, and joins whitespace
/// runs with `-`: `"Saint-Étienne"` → `"Saint-Etienne"`,
/// `"St. John's"` → `"St-Johns"`.
pub fn slugify_name(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '.'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Override table lookup first, transliteration otherwise.
pub fn city_slug(overrides: &HashMap<String, String>, city_id: &str, city_name: &str) -> String {
    match overrides.get(city_id) {
        Some(slug) => slug.clone(),
        None => slugify_name(city_name),
    }
}

/// `{base}/cost-of-living/in/{slug}?displayCurrency=USD`
pub fn city_url(base_url: &str, slug: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url.trim_end_matches('/'))?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["cost-of-living", "in", slug]);
    url.query_pairs_mut().append_pair("displayCurrency", "USD");
    Ok(url)
}
