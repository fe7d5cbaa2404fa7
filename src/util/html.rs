use std::borrow::Cow;

/// Escapes a string for use inside a double-quoted HTML attribute value.
///
/// Returns `Cow::Borrowed` when nothing needs escaping (the common case for
/// URLs and alt text), so callers only allocate for hostile or unusual input.
///
/// # Examples
///
/// ```
/// use article_composer::util::escape_attr;
///
/// assert_eq!(escape_attr("plain"), "plain");
/// assert_eq!(escape_attr(r#"say "hi" & <go>"#), "say &quot;hi&quot; &amp; &lt;go&gt;");
/// ```
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '"', '\'', '<', '>']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
