/// Return the identifier without surrounding backticks or double quotes.
pub fn unquote_identifier(ident: &str) -> &str {
    ident
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .or_else(|| ident.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(ident)
}

/// Split a potentially schema-qualified name into its dot-separated parts.
///
/// Dots inside quoted identifiers do not split, e.g. `` `my.db`.`users` ``.
pub fn split_qualified_name(name: &str) -> Vec<String> {
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    let mut parts = Vec::new();

    for (idx, ch) in name.char_indices() {
        match ch {
            '`' | '"' if quote == Some(ch) => quote = None,
            '`' | '"' if quote.is_none() => quote = Some(ch),
            '.' if quote.is_none() => {
                parts.push(unquote_identifier(name[start..idx].trim()).to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(unquote_identifier(name[start..].trim()).to_string());
    parts
}

/// Normalize an object name to its terminal relation identifier.
///
/// Examples:
/// - `"app.users"` -> `"users"`
/// - ``"`app`.`user_items`"`` -> `"user_items"`
pub fn relation_name(name: &str) -> String {
    split_qualified_name(name.trim())
        .pop()
        .unwrap_or_default()
}

/// Normalize a column reference from an index definition.
///
/// Index columns may render with a sort order or prefix length
/// (`` `name`(10) DESC ``); only the identifier is kept.
pub fn index_column_name(rendered: &str) -> String {
    let rendered = rendered.trim();
    let ident_end = if rendered.starts_with('`') || rendered.starts_with('"') {
        let quote = rendered.chars().next().unwrap_or('`');
        rendered[1..]
            .find(quote)
            .map_or(rendered.len(), |pos| pos + 2)
    } else {
        rendered
            .find(|ch: char| ch == '(' || ch.is_ascii_whitespace())
            .unwrap_or(rendered.len())
    };
    unquote_identifier(&rendered[..ident_end]).to_string()
}
