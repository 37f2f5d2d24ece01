//! Host identifier validation.

use crate::error::SoloMachineError;

/// Shortest valid client identifier.
pub const MIN_CLIENT_ID_LENGTH: usize = 9;
/// Longest valid client identifier.
pub const MAX_CLIENT_ID_LENGTH: usize = 64;

const fn is_valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>')
}

/// Checks `id` against the identifier alphabet and the given length bounds.
///
/// # Errors
/// Returns [`SoloMachineError::InvalidIdentifier`] describing the first violation.
pub fn validate_identifier(id: &str, min: usize, max: usize) -> Result<(), SoloMachineError> {
    let invalid = |reason: String| SoloMachineError::InvalidIdentifier {
        id: id.to_string(),
        reason,
    };

    if id.trim().is_empty() {
        return Err(invalid("identifier cannot be blank".to_string()));
    }
    if id.contains('/') {
        return Err(invalid("identifier cannot contain separator '/'".to_string()));
    }
    if !(min..=max).contains(&id.len()) {
        return Err(invalid(format!(
            "length {} is outside [{min}, {max}]",
            id.len()
        )));
    }
    if let Some(c) = id.chars().find(|c| !is_valid_char(*c)) {
        return Err(invalid(format!("invalid character {c:?}")));
    }
    Ok(())
}

/// Checks a client identifier.
///
/// # Errors
/// Returns [`SoloMachineError::InvalidIdentifier`] if `id` is not a valid client identifier.
pub fn validate_client_identifier(id: &str) -> Result<(), SoloMachineError> {
    validate_identifier(id, MIN_CLIENT_ID_LENGTH, MAX_CLIENT_ID_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("06-solomachine-0")]
    #[case("clientidone")]
    #[case("a.b_c+d-e#f[g]<h>")]
    fn accepts_valid_client_ids(#[case] id: &str) {
        assert!(validate_client_identifier(id).is_ok());
    }

    #[rstest::rstest]
    #[case::blank("         ", "blank")]
    #[case::too_short("client", "length")]
    #[case::too_long("abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyzabcdefghijklm", "length")]
    #[case::separator("06-solomachine/0", "separator")]
    #[case::bad_char("06-solomachine 0", "character")]
    fn rejects_invalid_client_ids(#[case] id: &str, #[case] expected: &str) {
        let res = validate_client_identifier(id);
        assert!(
            matches!(
                &res,
                Err(SoloMachineError::InvalidIdentifier { reason, .. })
                    if reason.contains(expected)
            ),
            "{res:?}"
        );
    }
}
