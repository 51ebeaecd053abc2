//! Commit trailer parsing for sign-off attribution.
//!
//! The sign-off check only needs the email addresses out of
//! `Signed-off-by:` trailer lines. Keys are matched case-insensitively;
//! the address is the text between the last `<` and `>` pair, which is how
//! git itself renders the trailer.

const SIGN_OFF_KEY: &str = "signed-off-by";

/// Extract the email addresses from `Signed-off-by` trailer lines.
///
/// Lines whose key is not `Signed-off-by`, or which carry no `<email>`
/// part, are skipped.
pub fn sign_off_emails(trailer_lines: &[String]) -> Vec<String> {
    trailer_lines
        .iter()
        .filter_map(|line| parse_trailer(line))
        .filter(|(key, _)| key.eq_ignore_ascii_case(SIGN_OFF_KEY))
        .filter_map(|(_, value)| extract_email(value))
        .collect()
}

/// Split a trailer line into `(key, value)` at the first colon.
fn parse_trailer(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}

/// Pull the address out of a `Name <address>` value.
fn extract_email(value: &str) -> Option<String> {
    let open = value.rfind('<')?;
    let close = value[open..].find('>')? + open;
    let email = value[open + 1..close].trim();
    if email.is_empty() {
        None
    } else {
        Some(email.to_string())
    }
}
