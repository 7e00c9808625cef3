//! Deterministic text canonicalization for cross-source matching.
//!
//! Every rule here is a pure function of its input: the same raw strings
//! always produce the same keys, and running a rule on its own output
//! changes nothing. That is what makes the merge reproducible across runs
//! and input orderings.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The unified position vocabulary every known source label maps into.
pub const CANONICAL_POSITIONS: [&str; 4] = ["GK", "DEF", "MID", "FWD"];

static POSITION_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for label in ["gk", "gkp", "goalkeeper", "keeper"] {
        map.insert(label, "GK");
    }
    for label in ["def", "defender", "defence"] {
        map.insert(label, "DEF");
    }
    for label in ["mid", "midfielder", "midfield"] {
        map.insert(label, "MID");
    }
    for label in ["fwd", "fw", "forward", "striker", "attacker", "st"] {
        map.insert(label, "FWD");
    }
    map
});

/// Matching key for a player name: diacritics folded, lower-cased, reduced
/// to the final whitespace-separated token. Sources disagree on how much of
/// a name they print ("Rodrigo Muniz" vs "Muniz"); the family-name token is
/// the part they agree on.
pub fn normalize_name(raw: &str) -> String {
    fold(raw).split_whitespace().last().unwrap_or("").to_string()
}

/// Matching key for a team name: diacritics folded, lower-cased, all
/// whitespace removed.
pub fn normalize_team(raw: &str) -> String {
    fold(raw).split_whitespace().collect()
}

/// Unify a raw position label into the canonical vocabulary. Labels outside
/// the known synonyms fail open: they pass through trimmed and lower-cased
/// instead of being rejected, so upstream label drift never drops a player.
/// Callers decide whether a pass-through warrants a warning.
pub fn normalize_position(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match POSITION_SYNONYMS.get(lowered.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => lowered,
    }
}

/// Whether a label is one of the four canonical position codes.
pub fn is_canonical_position(label: &str) -> bool {
    CANONICAL_POSITIONS.contains(&label)
}

/// Lower-case and strip diacritics, leaving whitespace intact.
fn fold(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        push_folded(&mut out, c);
    }
    out
}

fn push_folded(out: &mut String, c: char) {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' => out.push('a'),
        'ç' | 'ć' | 'č' | 'ĉ' => out.push('c'),
        'ď' | 'đ' | 'ð' => out.push('d'),
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => out.push('e'),
        'ğ' | 'ģ' | 'ĝ' => out.push('g'),
        'í' | 'ì' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => out.push('i'),
        'ł' | 'ľ' | 'ļ' | 'ĺ' => out.push('l'),
        'ñ' | 'ń' | 'ň' | 'ņ' => out.push('n'),
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' | 'ő' => out.push('o'),
        'ř' | 'ŕ' => out.push('r'),
        'š' | 'ś' | 'ş' | 'ș' => out.push('s'),
        'ť' | 'ţ' | 'ț' => out.push('t'),
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => out.push('u'),
        'ý' | 'ÿ' | 'ŷ' => out.push('y'),
        'ž' | 'ź' | 'ż' => out.push('z'),
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        'ß' => out.push_str("ss"),
        'þ' => out.push_str("th"),
        _ => out.push(c),
    }
}
