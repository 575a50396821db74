use crate::error::Error;
use hyper::{
    header::{HeaderName, HeaderValue},
    HeaderMap,
};
use std::collections::HashMap;

/// Lowercase header names mapped to their values. Values that are not
/// visible ASCII are left out; repeated names keep the last value.
pub fn header_strings(header_map: &HeaderMap) -> HashMap<String, String> {
    header_map
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

pub fn put_headers<'a, I: IntoIterator<Item = (&'a str, &'a str)>>(
    header_map: &mut HeaderMap<HeaderValue>,
    headers: I,
) -> Result<(), Error> {
    for (key, value) in headers {
        let header_name = HeaderName::from_lowercase(key.to_lowercase().as_bytes())?;
        let header_value = HeaderValue::from_str(value)?;
        header_map.append(header_name, header_value);
    }

    Ok(())
}

/// Value of the `token` cookie, if the request carries one.
pub fn token_cookie(headers: &HashMap<String, String>) -> Option<&str> {
    headers
        .get("cookie")?
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token="))
        .filter(|token| !token.is_empty())
}

pub fn escape_html<S: AsRef<str>>(text: S) -> String {
    let mut escaped = String::with_capacity(text.as_ref().len());
    for c in text.as_ref().chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_token_among_cookies() {
        let mut headers = HashMap::new();
        headers.insert("cookie".to_string(), "session=1; token=abc123".to_string());
        assert_eq!(token_cookie(&headers), Some("abc123"));

        headers.insert("cookie".to_string(), "token=".to_string());
        assert_eq!(token_cookie(&headers), None);
        assert_eq!(token_cookie(&HashMap::new()), None);
    }

    #[test]
    fn header_strings_skip_opaque_values() {
        let mut header_map = HeaderMap::new();
        put_headers(&mut header_map, vec![("X-Frame-Options", "SAMEORIGIN")]).unwrap();
        header_map.insert("x-label", HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap());

        let headers = header_strings(&header_map);

        assert_eq!(headers.get("x-frame-options").map(String::as_str), Some("SAMEORIGIN"));
        assert!(!headers.contains_key("x-label"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("O'Brien & Sons"), "O&#x27;Brien &amp; Sons");
    }
}
