use std::collections::HashMap;

use axum::http::Uri;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("email pattern compiles")
});

/// Field name to messages.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct FormErrors(HashMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|m| m.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Posted form values and the validation errors found in them.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Form {
    pub values: HashMap<String, String>,
    pub errors: FormErrors,
}

impl Form {
    pub fn new(mut values: HashMap<String, String>) -> Self {
        values.remove("csrf_token");
        Self {
            values,
            errors: FormErrors::default(),
        }
    }

    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_owned(), value.into());
    }

    pub fn required(&mut self, fields: &[&str]) {
        for field in fields {
            if self.get(field).trim().is_empty() {
                self.errors.add(field, "This field is required");
            }
        }
    }

    pub fn min_length(&mut self, field: &str, d: usize) {
        let value = self.get(field);
        if !value.is_empty() && value.chars().count() < d {
            self.errors.add(field, format!("This field is too short (minimum is {d} characters)"));
        }
    }

    pub fn max_length(&mut self, field: &str, d: usize) {
        let value = self.get(field);
        if !value.is_empty() && value.chars().count() > d {
            self.errors.add(field, format!("This field is too long (maximum is {d} characters)"));
        }
    }

    pub fn permitted_values(&mut self, field: &str, opts: &[&str]) {
        let value = self.get(field);
        if !value.is_empty() && !opts.contains(&value) {
            self.errors.add(field, "This field is invalid");
        }
    }

    pub fn matches_pattern(&mut self, field: &str, pattern: &Regex) {
        let value = self.get(field);
        if !value.is_empty() && !pattern.is_match(value) {
            self.errors.add(field, "This field is invalid");
        }
    }

    /// Accepts absolute URLs and absolute paths.
    pub fn valid_url(&mut self, field: &str) {
        let value = self.get(field).trim();
        let valid = match value.parse::<Uri>() {
            Ok(uri) => (uri.scheme().is_some() && uri.host().is_some()) || value.starts_with('/'),
            Err(_) => false,
        };
        if !valid {
            self.errors.add(field, "Invalid URL");
        }
    }

    pub fn is_equal(&mut self, field1: &str, field2: &str) {
        if self.get(field1) != self.get(field2) {
            self.errors.add(field2, format!("{field2} must be equal to {field1}"));
        }
    }

    /// At least 8 characters with an uppercase letter, a lowercase letter,
    /// a digit and a symbol.
    pub fn secure_password(&mut self, field: &str) {
        let password = self.get(field);
        let (mut upp, mut low, mut num, mut sym) = (false, false, false, false);
        for c in password.chars() {
            match c {
                c if c.is_uppercase() => upp = true,
                c if c.is_lowercase() => low = true,
                c if c.is_numeric() => num = true,
                c if c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()) => sym = true,
                _ => {}
            }
        }

        if !upp || !low || !num || !sym || password.chars().count() < 8 {
            self.errors.add(
                field,
                "Password length must be at least 8 characters and must contain at least 1 uppercase character, 1 lowercase character, 1 number, and 1 special character",
            );
        }
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Splits a comma separated tag field. Blank input means no tags; blank
/// segments are kept so the repository can reject them.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|t| t.trim().to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Form {
        Form::new(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn required_fields() {
        let mut f = form(&[("title", "  "), ("url", "https://example.com")]);
        f.required(&["title", "url", "description"]);

        assert!(!f.valid());
        assert_eq!(f.errors.get("title"), Some("This field is required"));
        assert_eq!(f.errors.get("description"), Some("This field is required"));
        assert_eq!(f.errors.get("url"), None);
    }

    #[test]
    fn lengths_count_characters() {
        let mut f = form(&[("title", "ééé"), ("name", "ab")]);
        f.max_length("title", 3);
        f.min_length("name", 3);
        f.min_length("missing", 3);

        assert_eq!(f.errors.get("title"), None);
        assert!(f.errors.get("name").is_some());
        assert_eq!(f.errors.get("missing"), None);
    }

    #[test]
    fn urls() {
        for good in ["https://www.rust-lang.org/learn", "http://localhost:4000", "/maybes"] {
            let mut f = form(&[("url", good)]);
            f.valid_url("url");
            assert!(f.valid(), "{good}");
        }
        for bad in ["", "rust-lang.org", "not a url", "mailto"] {
            let mut f = form(&[("url", bad)]);
            f.valid_url("url");
            assert!(!f.valid(), "{bad}");
        }
    }

    #[test]
    fn passwords() {
        let mut f = form(&[("good", "Sup3r$ecret"), ("short", "S3$a"), ("plain", "password123")]);
        f.secure_password("good");
        f.secure_password("short");
        f.secure_password("plain");

        assert_eq!(f.errors.get("good"), None);
        assert!(f.errors.get("short").is_some());
        assert!(f.errors.get("plain").is_some());
    }

    #[test]
    fn equality_and_patterns() {
        let mut f = form(&[("password", "a"), ("password_confirm", "b"), ("email", "nope")]);
        f.is_equal("password", "password_confirm");
        f.matches_pattern("email", &EMAIL_RX);
        f.permitted_values("password", &["a"]);

        assert_eq!(f.errors.get("password_confirm"), Some("password_confirm must be equal to password"));
        assert_eq!(f.errors.get("email"), Some("This field is invalid"));
        assert_eq!(f.errors.get("password"), None);
        assert!(EMAIL_RX.is_match("ann@example.com"));
    }

    #[test]
    fn csrf_token_is_not_kept() {
        let f = form(&[("csrf_token", "abc"), ("title", "t")]);
        assert_eq!(f.get("csrf_token"), "");
        assert_eq!(f.get("title"), "t");
    }

    #[test]
    fn tags() {
        assert!(parse_tags("  ").is_empty());
        assert_eq!(parse_tags(" go, web "), vec!["go", "web"]);
        assert_eq!(parse_tags("go,,web"), vec!["go", "", "web"]);
    }
}
