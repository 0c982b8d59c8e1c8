use log::debug;

const STATE_PREFIX: &str = "CO";

/// Cleans a raw `addr:postcode` value.
///
/// Five-character codes are kept, a leading "CO" state prefix is stripped and
/// ten-character ZIP+4 codes are cut to their first five characters. Anything
/// else is passed through as typed. Returns `None` when nothing is left, in
/// which case the postcode is dropped from the record.
pub fn clean_post(postcode: &str) -> Option<String> {
    let cleaned = if postcode.chars().count() == 5 {
        postcode.to_string()
    } else if let Some(rest) = postcode.strip_prefix(STATE_PREFIX) {
        rest.trim().to_string()
    } else if postcode.trim().chars().count() == 10 {
        postcode.chars().take(5).collect()
    } else {
        debug!(postcode = postcode; "Postcode matches no cleaning rule, keeping it as is");
        postcode.to_string()
    };

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
