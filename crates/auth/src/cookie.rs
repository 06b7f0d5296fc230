//! Cookie header parsing and `Set-Cookie` rendering.

use std::collections::HashMap;

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub secure: bool,
    /// Lifetime in seconds; omitted means a browser-session cookie.
    pub max_age: Option<i64>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            secure: false,
            max_age: None,
        }
    }
}

/// Parse a `Cookie` request header into name → value.
///
/// Entries without `=` are skipped. Names and values are percent-decoded;
/// an entry that does not decode is kept with its raw text. A later entry
/// with the same name replaces an earlier one.
pub fn parse(header: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            continue;
        }
        match (urlencoding::decode(name), urlencoding::decode(value)) {
            (Ok(n), Ok(v)) => {
                out.insert(n.into_owned(), v.into_owned());
            }
            _ => {
                out.insert(name.to_string(), value.to_string());
            }
        }
    }
    out
}

/// Render a `Set-Cookie` value. Attribute order is fixed:
/// `Max-Age`, `HttpOnly`, `SameSite`, `Path`, `Secure`.
pub fn build_set_cookie(name: &str, value: &str, attrs: &CookieAttributes) -> String {
    render(name, &urlencoding::encode(value), attrs.max_age, attrs)
}

/// Render a `Set-Cookie` value that makes the browser drop `name` immediately.
pub fn build_clear_cookie(name: &str, attrs: &CookieAttributes) -> String {
    render(name, "", Some(0), attrs)
}

fn render(name: &str, value: &str, max_age: Option<i64>, attrs: &CookieAttributes) -> String {
    let mut out = format!("{name}={value}");
    if let Some(max_age) = max_age {
        out.push_str(&format!("; Max-Age={max_age}"));
    }
    if attrs.http_only {
        out.push_str("; HttpOnly");
    }
    out.push_str("; SameSite=");
    out.push_str(attrs.same_site.as_str());
    if !attrs.path.is_empty() {
        out.push_str("; Path=");
        out.push_str(&attrs.path);
    }
    if attrs.secure {
        out.push_str("; Secure");
    }
    out
}
