use crate::error::MarketError;

/// Categories scanned when the caller does not narrow the run to one.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "general stores",
    "textile shops",
    "electronics shops",
    "restaurants",
    "supermarkets",
    "gyms",
];

/// Builds the search queries for one scan.
///
/// A non-empty category yields a single `"<category> in <location>"` query;
/// an empty one expands to [`DEFAULT_CATEGORIES`] in order. The result is
/// never empty on success.
pub fn build_queries(location: &str, category: &str) -> Result<Vec<String>, MarketError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(MarketError::Validation(
            "location must not be empty".to_string(),
        ));
    }

    let category = category.trim();
    let queries = if category.is_empty() {
        DEFAULT_CATEGORIES
            .iter()
            .map(|c| format!("{c} in {location}"))
            .collect()
    } else {
        vec![format!("{category} in {location}")]
    };
    Ok(queries)
}

/// Recovers the category a query was built from: the title-cased text before
/// the first `in` token (matched case-insensitively), or the whole query
/// title-cased when no such token exists.
pub fn category_from_query(query: &str) -> String {
    let words: Vec<&str> = query.split_whitespace().collect();
    let prefix = match words.iter().position(|w| w.eq_ignore_ascii_case("in")) {
        Some(idx) => words[..idx].join(" "),
        None => words.join(" "),
    };
    title_case(&prefix)
}

/// Title-cases a phrase: every alphabetic run starts uppercase and continues
/// lowercase, so `"drive-in theaters"` becomes `"Drive-In Theaters"`.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_alpha = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
