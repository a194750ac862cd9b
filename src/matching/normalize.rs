//! Text normalization for identity comparison.
//!
//! Artist and title strings from tags, Plex and MusicBrainz disagree on case,
//! punctuation and spacing. Everything is reduced to lowercase alphanumeric
//! words separated by single spaces before comparing.
//!
//! Titles additionally lose trailing bracketed qualifiers such as
//! `(Remastered)` or `[Live]`. Artist names keep them: `Nirvana (UK)` and
//! `Nirvana` are different bands.

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_space = false;

    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '_' {
            pending_space = true;
        }
        // other punctuation is dropped without splitting the word
    }

    out
}

/// Normalize an artist name. Parentheticals are kept.
pub fn normalize_artist(artist: &str) -> String {
    normalize_text(artist)
}

/// Normalize a title, removing trailing bracketed qualifiers first.
pub fn normalize_title(title: &str) -> String {
    normalize_text(strip_bracketed_suffixes(title))
}

/// Normalize an album name. Albums are advisory, so they get title treatment.
pub fn normalize_album(album: &str) -> String {
    normalize_text(strip_bracketed_suffixes(album))
}

/// Remove trailing `(...)` / `[...]` groups, never leaving an empty title.
pub fn strip_bracketed_suffixes(title: &str) -> &str {
    let mut current = title.trim_end();

    loop {
        let open = match current.chars().last() {
            Some(')') => '(',
            Some(']') => '[',
            _ => break,
        };
        let Some(idx) = current.rfind(open) else {
            break;
        };
        let prefix = current[..idx].trim_end();
        if prefix.is_empty() {
            break;
        }
        current = prefix;
    }

    current
}
