use serde::Deserialize;

use super::errors::AppError;

pub const MAX_FIELD_CHARS: usize = 100;

const PAGE_MESSAGE: &str = "Page number must be a positive integer";
const EMPTY_SEARCH_MESSAGE: &str = "At least one search field must be provided";

/// Coerce the raw `p` query value to a page number. Absent means page 1.
///
/// Accepts anything that reads as a whole number, so `" 2 "` and `"3.0"` pass
/// while `""`, `"abc"`, `"1.5"` and `"0"` do not.
pub fn parse_page(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw else {
        return Ok(1);
    };

    let number: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(PAGE_MESSAGE.to_string()))?;

    if !number.is_finite() || number.fract() != 0.0 || number < 1.0 || number > u32::MAX as f64 {
        return Err(AppError::Validation(PAGE_MESSAGE.to_string()));
    }

    Ok(number as u32)
}

/// Search body as posted by the frontend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub id: Option<String>,
    pub sender_account: Option<String>,
    pub receiver_account: Option<String>,
    pub cause: Option<String>,
}

/// Trimmed search fields; at least one is present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub id: Option<String>,
    pub sender_account: Option<String>,
    pub receiver_account: Option<String>,
    pub cause: Option<String>,
}

impl SearchQuery {
    /// First present field in priority order: id, sender account, receiver account, cause
    pub fn query_value(&self) -> Option<&str> {
        [&self.id, &self.sender_account, &self.receiver_account, &self.cause]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }
}

fn normalize_field(label: &str, value: Option<String>, errors: &mut Vec<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.chars().count() > MAX_FIELD_CHARS {
        errors.push(format!("{} must not exceed {} characters", label, MAX_FIELD_CHARS));
        return None;
    }
    (!trimmed.is_empty()).then_some(trimmed)
}

impl SearchRequest {
    pub fn validate(self) -> Result<SearchQuery, AppError> {
        let mut errors = Vec::new();

        let query = SearchQuery {
            id: normalize_field("ID", self.id, &mut errors),
            sender_account: normalize_field("Sender account", self.sender_account, &mut errors),
            receiver_account: normalize_field("Receiver account", self.receiver_account, &mut errors),
            cause: normalize_field("Cause", self.cause, &mut errors),
        };

        if errors.is_empty() && query.query_value().is_none() {
            errors.push(EMPTY_SEARCH_MESSAGE.to_string());
        }

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(AppError::Validation(errors.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_page_defaults_to_one() {
        assert_eq!(parse_page(None).unwrap(), 1);
    }

    #[test]
    fn test_page_coercion() {
        assert_eq!(parse_page(Some("2")).unwrap(), 2);
        assert_eq!(parse_page(Some(" 7 ")).unwrap(), 7);
        assert_eq!(parse_page(Some("3.0")).unwrap(), 3);
    }

    #[test]
    fn test_invalid_pages_rejected() {
        for raw in ["", "0", "-1", "1.5", "abc", "NaN", "inf", "99999999999"] {
            let err = parse_page(Some(raw)).unwrap_err();
            assert_eq!(message(err), "Page number must be a positive integer", "input {:?}", raw);
        }
    }

    #[test]
    fn test_all_blank_search_rejected() {
        let request = SearchRequest {
            id: Some("   ".to_string()),
            sender_account: Some(String::new()),
            receiver_account: None,
            cause: Some("\t".to_string()),
        };
        assert_eq!(message(request.validate().unwrap_err()), "At least one search field must be provided");
        assert!(SearchRequest::default().validate().is_err());
    }

    #[test]
    fn test_single_field_is_trimmed() {
        let request = SearchRequest {
            receiver_account: Some("  antenehgebey ".to_string()),
            ..Default::default()
        };
        let query = request.validate().unwrap();
        assert_eq!(query.receiver_account.as_deref(), Some("antenehgebey"));
        assert_eq!(query.query_value(), Some("antenehgebey"));
    }

    #[test]
    fn test_each_field_alone_becomes_the_query() {
        let cases: [fn(String) -> SearchRequest; 4] = [
            |v| SearchRequest { id: Some(v), ..Default::default() },
            |v| SearchRequest { sender_account: Some(v), ..Default::default() },
            |v| SearchRequest { receiver_account: Some(v), ..Default::default() },
            |v| SearchRequest { cause: Some(v), ..Default::default() },
        ];
        for build in cases {
            let query = build(" Top-up ".to_string()).validate().unwrap();
            assert_eq!(query.query_value(), Some("Top-up"));
        }
    }

    #[test]
    fn test_query_priority_order() {
        let query = SearchRequest {
            id: None,
            sender_account: Some("surafelaraya".to_string()),
            receiver_account: Some("yayawalletpi".to_string()),
            cause: Some("Pay".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(query.query_value(), Some("surafelaraya"));
    }

    #[test]
    fn test_overlong_fields_rejected() {
        let request = SearchRequest {
            id: Some("x".repeat(MAX_FIELD_CHARS + 1)),
            cause: Some("y".repeat(MAX_FIELD_CHARS + 1)),
            ..Default::default()
        };
        assert_eq!(
            message(request.validate().unwrap_err()),
            "ID must not exceed 100 characters, Cause must not exceed 100 characters"
        );
    }

    #[test]
    fn test_length_counted_after_trim() {
        let padded = format!("  {}  ", "a".repeat(MAX_FIELD_CHARS));
        let query = SearchRequest { cause: Some(padded), ..Default::default() }.validate().unwrap();
        assert_eq!(query.cause.map(|c| c.len()), Some(MAX_FIELD_CHARS));
    }
}
