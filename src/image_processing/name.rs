use crate::error::BadgeError;

/// Shorten a full name into the label drawn on the badge.
///
/// `"Jane Doe"` becomes `"Jane D."`; middle names are dropped and a single
/// word is kept as-is. The initial keeps the case it was given with.
pub fn format_name(full_name: &str) -> Result<String, BadgeError> {
    let parts: Vec<&str> = full_name.split_whitespace().collect();

    match parts.as_slice() {
        [] => Err(BadgeError::InvalidName),
        [single] => Ok((*single).to_string()),
        [first, .., last] => {
            // split_whitespace never yields empty tokens
            let initial = last.chars().next().unwrap_or_default();
            Ok(format!("{} {}.", first, initial))
        }
    }
}
