//! Semantic query synthesis.

/// Build the text embedded for product search.
///
/// Crop and pest together yield a treatment sentence naming both; either
/// one alone yields a shorter phrase. The literal query, when present, is
/// prefixed. With neither crop nor pest the literal query is used as-is.
pub fn build_semantic_query(query: &str, crop: Option<&str>, pest: Option<&str>) -> String {
    let query = query.trim();
    let prefixed = |phrase: String| {
        if query.is_empty() {
            phrase
        } else {
            format!("{query} {phrase}")
        }
    };

    match (crop, pest) {
        (Some(crop), Some(pest)) => prefixed(format!(
            "chemicals to treat {pest} on {crop} pesticides for {pest} in {crop}"
        )),
        (Some(crop), None) => prefixed(format!("chemicals for {crop}")),
        (None, Some(pest)) => prefixed(format!("pesticides for {pest}")),
        (None, None) => query.to_string(),
    }
}
