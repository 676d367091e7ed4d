/// Split a raw BACnet identifier into non-empty word tokens (§4.1).
///
/// 1. Split on runs of `{ , _ - . }` (and plain spaces/slashes, which occur
///    in contractor-typed display names).
/// 2. Within each piece, insert a boundary at every lowercase→uppercase
///    adjacency (camelCase split); runs of uppercase letters are left
///    intact so ALLCAPS acronyms like `HGR` or `SA` survive as one token.
/// 3. Discard empty tokens. Purely numeric tokens are retained — they may
///    carry index meaning (`ROOM TEMP 4`).
pub fn tokenize(identifier: &str) -> Vec<String> {
    identifier
        .split(|c: char| matches!(c, ',' | '_' | '-' | '.' | ' ' | '/'))
        .filter(|s| !s.is_empty())
        .flat_map(split_camel_case)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split one delimiter-bounded piece on lowercase→uppercase boundaries.
/// Unicode letters are treated as letters for the case test, so `café`-style
/// tokens split the same way ASCII ones do.
fn split_camel_case(piece: &str) -> Vec<String> {
    let chars: Vec<char> = piece.chars().collect();
    if chars.is_empty() {
        return vec![];
    }

    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && chars[i - 1].is_lowercase() && c.is_uppercase() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
