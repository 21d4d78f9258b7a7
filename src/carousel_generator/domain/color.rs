use std::fmt;

pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";

/// A fill colour that is safe to embed verbatim in overlay markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextColor(String);

impl TextColor {
    /// Accepts hex colours (`#RGB`, `#RRGGBB`, `#RRGGBBAA`), alphabetic CSS names and
    /// `rgb()`/`rgba()`/`hsl()`/`hsla()` expressions. Anything else becomes white.
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if is_hex_color(value) || is_named_color(value) || is_color_function(value) {
            Self(value.to_string())
        } else {
            tracing::debug!(color = raw, "unsupported text color, falling back to white");
            Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self(DEFAULT_TEXT_COLOR.to_string())
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_named_color(value: &str) -> bool {
    !value.is_empty() && value.len() <= 32 && value.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_color_function(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let Some(open) = lower.find('(') else {
        return false;
    };
    if !matches!(&lower[..open], "rgb" | "rgba" | "hsl" | "hsla") || !lower.ends_with(')') {
        return false;
    }
    lower[open + 1..lower.len() - 1]
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '%' | ' ' | '/'))
}
