//! Injectable name mapping.
//!
//! Parameter-key derivation (`"Billing::Invoice"` → `billing_invoice_id`)
//! and singular/plural munging are locale- and framework-specific, so they
//! live behind the [`NameMapper`] trait rather than inside the engine.
//! [`EnglishNameMapper`] covers the common English conventions.

/// Pure string mapping between canonical type names and parameter keys.
pub trait NameMapper: Send + Sync {
    /// Converts a canonical type name to its underscored key form.
    /// Namespace separators fold into underscores:
    /// `"Billing::InvoiceLine"` → `"billing_invoice_line"`.
    fn underscore(&self, name: &str) -> String;

    /// Strips any namespace qualifier: `"Billing::Invoice"` → `"Invoice"`.
    fn demodulize(&self, name: &str) -> String {
        match name.rsplit_once("::") {
            Some((_, last)) => last.to_string(),
            None => name.to_string(),
        }
    }

    /// Returns the plural form of an underscored word.
    fn pluralize(&self, word: &str) -> String;

    /// Returns the singular form of an underscored word.
    fn singularize(&self, word: &str) -> String;
}

/// Default English-convention mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishNameMapper;

impl EnglishNameMapper {
    /// Creates a new mapper.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NameMapper for EnglishNameMapper {
    fn underscore(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);
        let chars: Vec<char> = name.chars().collect();
        let mut prev: Option<char> = None;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c == ':' {
                // Namespace separator; swallow both colons.
                if !out.is_empty() && !out.ends_with('_') {
                    out.push('_');
                }
                while i + 1 < chars.len() && chars[i + 1] == ':' {
                    i += 1;
                }
                prev = Some('_');
            } else if c.is_ascii_uppercase() {
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let boundary = match prev {
                    Some(p) if p == '_' => false,
                    Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                    // Acronym tail: "HTTPServer" → "http_server".
                    Some(p) if p.is_ascii_uppercase() && next_is_lower => true,
                    _ => false,
                };
                if boundary {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
                prev = Some(c);
            } else {
                out.push(c);
                prev = Some(c);
            }
            i += 1;
        }
        out
    }

    fn pluralize(&self, word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }
        if let Some(stem) = word.strip_suffix('y') {
            let penultimate = stem.chars().last();
            if penultimate.is_some_and(|c| !is_vowel(c)) {
                return format!("{stem}ies");
            }
        }
        if word.ends_with('s')
            || word.ends_with('x')
            || word.ends_with('z')
            || word.ends_with("ch")
            || word.ends_with("sh")
        {
            return format!("{word}es");
        }
        format!("{word}s")
    }

    fn singularize(&self, word: &str) -> String {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
        for suffix in ["ses", "xes", "zes", "ches", "shes"] {
            if let Some(stem) = word.strip_suffix("es") {
                if word.ends_with(suffix) {
                    return stem.to_string();
                }
            }
        }
        if word.ends_with('s') && !word.ends_with("ss") {
            return word[..word.len() - 1].to_string();
        }
        word.to_string()
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}
