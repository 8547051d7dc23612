use std::borrow::Cow;

/// Escape HTML special characters: & < > " '
///
/// Borrows the input when there is nothing to escape.
pub fn escape(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_each_special_character() {
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("a < b > c"), "a &lt; b &gt; c");
        assert_eq!(escape("say \"hi\""), "say &quot;hi&quot;");
        assert_eq!(escape("it's"), "it&#39;s");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape("<span class='up'>on</span>"),
            "&lt;span class=&#39;up&#39;&gt;on&lt;/span&gt;"
        );
    }

    #[test]
    fn test_nothing_to_escape_borrows() {
        assert!(matches!(escape("10.0.0.7"), Cow::Borrowed("10.0.0.7")));
    }
}
