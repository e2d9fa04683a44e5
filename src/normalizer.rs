// 🔤 Name normalization - comparable keys for clubs and players
//
// "Man City", "Manchester City FC", "manchester  city" → "man city"
// Pure functions: unmapped input passes through lightly transformed.

/// Club-specific contractions, applied in order to the lowercased name
const CLUB_CONTRACTIONS: &[(&str, &str)] = &[
    ("manchester city", "man city"),
    ("manchester united", "man united"),
    ("tottenham hotspur", "tottenham"),
    ("brighton & hove albion", "brighton"),
    ("brighton and hove albion", "brighton"),
    ("wolverhampton wanderers", "wolves"),
    ("west ham united", "west ham"),
    ("nottingham forest", "notts forest"),
    ("nottm forest", "notts forest"),
    ("sheffield united", "sheffield utd"),
    ("leicester city", "leicester"),
    ("ipswich town", "ipswich"),
    ("spurs", "tottenham"),
];

/// Canonicalize a free-text club name into a comparison key.
///
/// Lowercases, collapses whitespace, strips a leading `fc`/`afc` and a
/// trailing `fc`, applies [`CLUB_CONTRACTIONS`], then shortens a trailing
/// `united` to `utd`.
pub fn normalize_club_name(name: &str) -> String {
    let mut club = collapse_whitespace(&name.to_lowercase());

    for prefix in ["fc ", "afc "] {
        if let Some(rest) = club.strip_prefix(prefix) {
            club = rest.to_string();
        }
    }
    if let Some(rest) = club.strip_suffix(" fc") {
        club = rest.to_string();
    }

    for (long, short) in CLUB_CONTRACTIONS {
        if club.contains(long) {
            club = club.replacen(long, short, 1);
        }
    }

    if let Some(rest) = club.strip_suffix(" united") {
        club = format!("{} utd", rest);
    }

    club.trim().to_string()
}

/// Canonicalize a player name: lowercase, drop apostrophes, periods and
/// hyphens, collapse whitespace.
pub fn normalize_player_name(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '.' | '-'))
        .collect();

    collapse_whitespace(&stripped)
}

/// Fuzzy club equality: normalized forms equal, or either contains the other.
///
/// An empty normalized name never matches (missing club fields must not
/// land a record in every club's bucket).
pub fn is_club_match(club_name: &str, target_club: &str) -> bool {
    let club = normalize_club_name(club_name);
    let target = normalize_club_name(target_club);

    if club.is_empty() || target.is_empty() {
        return false;
    }

    club == target || club.contains(&target) || target.contains(&club)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
