//! Normalization helpers shared by the record drafts.

use crate::error::{Result, ValidationError};

/// Trims a required string, rejecting it when missing or blank.
pub fn required(field: &'static str, value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::required(field)),
    }
}

/// Trims every item and drops blank ones. The resulting list must not be empty.
pub fn non_empty_list(field: &'static str, value: Option<Vec<String>>) -> Result<Vec<String>> {
    let items: Vec<String> = value
        .unwrap_or_default()
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return Err(ValidationError::empty_list(field));
    }
    Ok(items)
}

/// Trims and lowercases an email address.
///
/// Only the shape `local@domain` is checked; deliverability is the mail
/// relay's problem.
pub fn email(field: &'static str, value: Option<String>) -> Result<String> {
    let email = required(field, value)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(ValidationError::InvalidEmail(email)),
    }
}

/// Escapes `%`, `_` and `\` so user input can be embedded in a `LIKE` pattern.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims() {
        assert_eq!(
            required("fullname", Some("  Ada Lovelace ".into())),
            Ok("Ada Lovelace".to_string())
        );
        assert_eq!(
            required("fullname", Some("   ".into())),
            Err(ValidationError::required("fullname"))
        );
        assert_eq!(
            required("fullname", None),
            Err(ValidationError::required("fullname"))
        );
    }

    #[test]
    fn list_drops_blank_items() {
        let list = non_empty_list("diseases", Some(vec![" flu ".into(), "".into(), " ".into()]));
        assert_eq!(list, Ok(vec!["flu".to_string()]));
        assert_eq!(
            non_empty_list("diseases", Some(vec!["  ".into()])),
            Err(ValidationError::empty_list("diseases"))
        );
        assert_eq!(
            non_empty_list("medicine", None),
            Err(ValidationError::empty_list("medicine"))
        );
    }

    #[test]
    fn email_is_lowercased() {
        assert_eq!(
            email("email", Some(" Jane.Doe@Example.COM ".into())),
            Ok("jane.doe@example.com".to_string())
        );
        assert!(matches!(
            email("email", Some("not-an-email".into())),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(email("email", Some("a@b@c".into())).is_err());
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
