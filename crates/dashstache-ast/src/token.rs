//! Raw tag tokens produced by the scanner.

use crate::Position;

/// Sigil that may follow the opening delimiter of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    /// `#` - section open
    Section,
    /// `^` - inverted section open
    Inverted,
    /// `/` - section close
    Close,
}

impl Sigil {
    /// Returns the sigil for a leading character, if any.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Sigil::Section),
            '^' => Some(Sigil::Inverted),
            '/' => Some(Sigil::Close),
            _ => None,
        }
    }

    /// The literal character of the sigil.
    pub fn literal(self) -> char {
        match self {
            Sigil::Section => '#',
            Sigil::Inverted => '^',
            Sigil::Close => '/',
        }
    }
}

/// One tag occurrence as matched in the source, not yet interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    /// Zero-based position of the first `{`.
    pub position: Position,
    /// The literal tag text, delimiters included.
    pub text: String,
}

/// The pieces of a raw tag after delimiter and sigil stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagParts<'a> {
    pub raw: bool,
    pub sigil: Option<Sigil>,
    pub name: &'a str,
}

impl RawTag {
    pub fn new(position: Position, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }

    /// Byte width of the literal tag text.
    pub fn width(&self) -> usize {
        self.text.len()
    }

    /// Strip delimiters, detect the raw-markup brace and split off the sigil.
    pub fn parts(&self) -> TagParts<'_> {
        let inner = self.text.strip_prefix("{{").unwrap_or(&self.text);
        let inner = inner.strip_suffix("}}").unwrap_or(inner);

        let (raw, inner) = match inner.strip_prefix('{') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };
        let inner = inner.strip_suffix('}').unwrap_or(inner);

        let sigil = inner.chars().next().and_then(Sigil::from_char);
        let name = match sigil {
            Some(s) => &inner[s.literal().len_utf8()..],
            None => inner,
        };

        TagParts { raw, sigil, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(text: &str) -> (bool, Option<Sigil>, String) {
        let tag = RawTag::new(Position::default(), text);
        let p = tag.parts();
        (p.raw, p.sigil, p.name.to_string())
    }

    #[test]
    fn test_plain_variable() {
        assert_eq!(parts("{{name}}"), (false, None, "name".to_string()));
    }

    #[test]
    fn test_raw_variable() {
        assert_eq!(parts("{{{host.ip}}}"), (true, None, "host.ip".to_string()));
    }

    #[test]
    fn test_sigils() {
        assert_eq!(parts("{{#items}}").1, Some(Sigil::Section));
        assert_eq!(parts("{{^items}}").1, Some(Sigil::Inverted));
        assert_eq!(parts("{{/items}}"), (false, Some(Sigil::Close), "items".to_string()));
    }

    #[test]
    fn test_width() {
        assert_eq!(RawTag::new(Position::default(), "{{a}}").width(), 5);
        assert_eq!(RawTag::new(Position::default(), "{{#a}}").width(), 6);
        assert_eq!(RawTag::new(Position::default(), "{{{a}}}").width(), 7);
    }
}
