/// Keywords from `keywords` that occur in `text`, compared case-insensitively
/// as plain substrings. Output follows the order of `keywords`; a keyword
/// listed twice (in any casing) is reported once, and blank keywords never match.
pub fn match_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let haystack = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();
    let mut found_lower: Vec<String> = Vec::new();

    for keyword in keywords {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() || found_lower.contains(&needle) {
            continue;
        }
        if haystack.contains(&needle) {
            found.push(keyword.clone());
            found_lower.push(needle);
        }
    }

    found
}
