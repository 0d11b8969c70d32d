//! Title normalization shared by index builds and queries.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex_lite::Regex;

static RELEASE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\d{4}\)").expect("release year pattern"));

static SPECIAL_EDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:the |digital )?(?:goty|deluxe|standard|ultimate|definitive|enhanced|collector's|premium|digital|limited|game of the year|reloaded|\d{4}) edition",
    )
    .expect("special edition pattern")
});

static DIRECTORS_CUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"director's cut").expect("director's cut pattern"));

/// Normalize a repack title or a search query.
///
/// Folds to lowercase ASCII, drops release years and edition suffixes, and
/// reduces punctuation to single spaces. The same function must be used on
/// both sides of a lookup; the index ignores the spaces when comparing, so
/// "Half-Life" and "HalfLife" still meet.
pub fn format_name(name: &str) -> String {
    let folded = deunicode(name).to_lowercase();

    let stripped = RELEASE_YEAR.replace_all(&folded, " ");
    let stripped = SPECIAL_EDITION.replace_all(&stripped, " ");
    let stripped = DIRECTORS_CUT.replace_all(&stripped, " ");

    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for c in stripped.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_punctuation() {
        assert_eq!(format_name("Counter-Strike: Source"), "counter strike source");
        assert_eq!(format_name("  DARK   SOULS  "), "dark souls");
    }

    #[test]
    fn test_diacritics_folded() {
        assert_eq!(format_name("Pokémon Légendes"), "pokemon legendes");
        assert_eq!(format_name("Ōkami HD"), "okami hd");
    }

    #[test]
    fn test_apostrophes_removed_without_split() {
        assert_eq!(format_name("Assassin's Creed"), "assassins creed");
        assert_eq!(format_name("Assassin’s Creed"), "assassins creed");
    }

    #[test]
    fn test_release_year_removed() {
        assert_eq!(format_name("Doom (2016)"), "doom");
        assert_eq!(format_name("Doom 2016"), "doom 2016");
    }

    #[test]
    fn test_special_editions_removed() {
        assert_eq!(
            format_name("The Witcher 3: Wild Hunt - Game of the Year Edition"),
            "the witcher 3 wild hunt"
        );
        assert_eq!(format_name("Dark Souls III Deluxe Edition"), "dark souls iii");
        assert_eq!(
            format_name("Skyrim: The Anniversary Edition"),
            "skyrim the anniversary edition"
        );
        assert_eq!(format_name("Blade Runner Director's Cut"), "blade runner");
    }

    #[test]
    fn test_edition_words_inside_other_words_kept() {
        assert_eq!(
            format_name("Nonstandard Edition Tales"),
            "nonstandard edition tales"
        );
        assert_eq!(format_name("Hyperlimited Edition"), "hyperlimited edition");
        assert_eq!(format_name("Doom Standard Edition"), "doom");
    }

    #[test]
    fn test_underscores_become_spaces() {
        assert_eq!(format_name("Half_Life_2"), "half life 2");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(format_name(""), "");
        assert_eq!(format_name("  :: -- !! "), "");
        assert_eq!(format_name("(2020)"), "");
    }

    #[test]
    fn test_idempotent() {
        let once = format_name("Counter-Strike: Global Offensive (2012)");
        assert_eq!(format_name(&once), once);
    }
}
