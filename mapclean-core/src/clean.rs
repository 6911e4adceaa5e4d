//! Value normalisation rules for address and building tags.
//!
//! Every rule is a pure function of the input value and an immutable
//! [`CleaningTables`] (or a [`PostcodeOrder`]). Values that match no rule are
//! returned unchanged.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest postcode accepted by [`clean_postcode`].
pub const POSTCODE_MIN: &str = "10001";
/// Highest postcode accepted by [`clean_postcode`].
pub const POSTCODE_MAX: &str = "11102";
/// Replacement for postcodes outside [`POSTCODE_MIN`]..=[`POSTCODE_MAX`].
pub const POSTCODE_FALLBACK: &str = "10001";

/// Default street-type abbreviations and their expansions.
pub const STREET_ABBREVIATIONS: [(&str, &str); 14] = [
    ("ave", "Avenue"),
    ("Ave", "Avenue"),
    ("Blvd", "Boulevard"),
    ("Brg", "Bridge"),
    ("Dr", "Drive"),
    ("Expy", "Expressway"),
    ("Pky", "Parkway"),
    ("Pl", "Place"),
    ("Plz", "Plaza"),
    ("Rd", "Road"),
    ("S", "South"),
    ("Sq", "Square"),
    ("St", "Street"),
    ("Ter", "Terrace"),
];

/// Default compass abbreviations and their expansions.
pub const DIRECTION_ABBREVIATIONS: [(&str, &str); 8] = [
    ("E", "East"),
    ("E.", "East"),
    ("W", "West"),
    ("W.", "West"),
    ("N", "North"),
    ("N.", "North"),
    ("S", "South"),
    ("S.", "South"),
];

/// Immutable abbreviation tables consulted by the street and direction rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningTables {
    streets: BTreeMap<String, String>,
    directions: BTreeMap<String, String>,
}

impl CleaningTables {
    /// Build tables from explicit abbreviation pairs.
    pub fn new<S, D, K, V>(streets: S, directions: D) -> Self
    where
        S: IntoIterator<Item = (K, V)>,
        D: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let collect = |pairs: Vec<(K, V)>| {
            pairs
                .into_iter()
                .map(|(abbreviation, expansion)| (abbreviation.into(), expansion.into()))
                .collect::<BTreeMap<String, String>>()
        };
        Self {
            streets: collect(streets.into_iter().collect()),
            directions: collect(directions.into_iter().collect()),
        }
    }

    /// Full street type for an abbreviation, if known.
    #[must_use]
    pub fn street(&self, abbreviation: &str) -> Option<&str> {
        self.streets.get(abbreviation).map(String::as_str)
    }

    /// Full direction word for an abbreviation, if known.
    #[must_use]
    pub fn direction(&self, abbreviation: &str) -> Option<&str> {
        self.directions.get(abbreviation).map(String::as_str)
    }
}

impl Default for CleaningTables {
    fn default() -> Self {
        Self::new(STREET_ABBREVIATIONS, DIRECTION_ABBREVIATIONS)
    }
}

/// How postcodes are compared against the valid range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostcodeOrder {
    /// Five ASCII digits whose numeric value lies within the range.
    #[default]
    Numeric,
    /// Byte-wise string comparison against the range bounds. Matches the
    /// output of earlier exports, including their misclassifications.
    Lexicographic,
}

impl PostcodeOrder {
    /// Lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Lexicographic => "lexicographic",
        }
    }
}

impl fmt::Display for PostcodeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a postcode order name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown postcode order `{0}` (expected `numeric` or `lexicographic`)")]
pub struct ParsePostcodeOrderError(pub String);

impl FromStr for PostcodeOrder {
    type Err = ParsePostcodeOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "numeric" => Ok(Self::Numeric),
            "lexicographic" => Ok(Self::Lexicographic),
            _ => Err(ParsePostcodeOrderError(s.to_owned())),
        }
    }
}

/// The cleaning rules bound to one set of tables and postcode mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueCleaner {
    tables: CleaningTables,
    postcode_order: PostcodeOrder,
}

impl ValueCleaner {
    /// Bind the rules to `tables` and `postcode_order`.
    #[must_use]
    pub const fn new(tables: CleaningTables, postcode_order: PostcodeOrder) -> Self {
        Self {
            tables,
            postcode_order,
        }
    }

    /// Tables used by the street and direction rules.
    #[must_use]
    pub const fn tables(&self) -> &CleaningTables {
        &self.tables
    }

    /// Postcode comparison mode.
    #[must_use]
    pub const fn postcode_order(&self) -> PostcodeOrder {
        self.postcode_order
    }

    /// Expand a leading compass abbreviation, then a trailing street type.
    #[must_use]
    pub fn street_name(&self, value: &str) -> String {
        clean_street(&clean_direction(value, &self.tables), &self.tables)
    }

    /// See [`clean_postcode`].
    #[must_use]
    pub fn postcode(&self, value: &str) -> String {
        clean_postcode(value, self.postcode_order)
    }

    /// See [`clean_house_number`].
    #[must_use]
    pub fn house_number(&self, value: &str) -> String {
        clean_house_number(value)
    }

    /// See [`clean_height`].
    #[must_use]
    pub fn height(&self, value: &str) -> String {
        clean_height(value)
    }
}

/// Expand an abbreviated trailing street type.
///
/// # Examples
/// ```
/// use mapclean_core::{CleaningTables, clean_street};
///
/// let tables = CleaningTables::default();
/// assert_eq!(clean_street("5th Ave", &tables), "5th Avenue");
/// assert_eq!(clean_street("Main Street", &tables), "Main Street");
/// ```
#[must_use]
pub fn clean_street(value: &str, tables: &CleaningTables) -> String {
    let Some(token) = trailing_token(value) else {
        return value.to_owned();
    };
    match (tables.street(token), value.strip_suffix(token)) {
        (Some(expansion), Some(head)) => format!("{head}{expansion}"),
        _ => value.to_owned(),
    }
}

/// Expand a compass abbreviation at the start of the street name.
///
/// Leading purely numeric tokens (house numbers) are skipped, so both
/// `"W 34th St"` and `"123 W Main St"` have their `W` expanded.
///
/// # Examples
/// ```
/// use mapclean_core::{CleaningTables, clean_direction};
///
/// let tables = CleaningTables::default();
/// assert_eq!(clean_direction("123 W Main St", &tables), "123 West Main St");
/// assert_eq!(clean_direction("E. 4th Street", &tables), "East 4th Street");
/// assert_eq!(clean_direction("Washington St", &tables), "Washington St");
/// ```
#[must_use]
pub fn clean_direction(value: &str, tables: &CleaningTables) -> String {
    let Some((head, token, tail)) = leading_name_token(value) else {
        return value.to_owned();
    };
    let is_compass = |letter: &u8| matches!(letter.to_ascii_uppercase(), b'E' | b'W' | b'S' | b'N');
    let candidate = match token.as_bytes() {
        [letter] => is_compass(letter) && !tail.is_empty(),
        [letter, b'.'] => is_compass(letter),
        _ => false,
    };
    match tables.direction(token) {
        Some(direction) if candidate => format!("{head}{direction}{tail}"),
        _ => value.to_owned(),
    }
}

/// Replace postcodes outside the valid range with [`POSTCODE_FALLBACK`].
///
/// # Examples
/// ```
/// use mapclean_core::{PostcodeOrder, clean_postcode};
///
/// assert_eq!(clean_postcode("07302", PostcodeOrder::Numeric), "10001");
/// assert_eq!(clean_postcode("11101", PostcodeOrder::Numeric), "11101");
/// assert_eq!(clean_postcode("1050", PostcodeOrder::Lexicographic), "1050");
/// ```
#[must_use]
pub fn clean_postcode(value: &str, order: PostcodeOrder) -> String {
    if postcode_in_range(value, order) {
        value.to_owned()
    } else {
        POSTCODE_FALLBACK.to_owned()
    }
}

/// Whether `value` lies within the valid postcode range under `order`.
#[must_use]
pub fn postcode_in_range(value: &str, order: PostcodeOrder) -> bool {
    match order {
        PostcodeOrder::Lexicographic => (POSTCODE_MIN..=POSTCODE_MAX).contains(&value),
        PostcodeOrder::Numeric => {
            value.len() == POSTCODE_MIN.len()
                && value.bytes().all(|byte| byte.is_ascii_digit())
                && matches!(
                    (value.parse::<u32>(), POSTCODE_MIN.parse::<u32>(), POSTCODE_MAX.parse::<u32>()),
                    (Ok(code), Ok(min), Ok(max)) if (min..=max).contains(&code)
                )
        }
    }
}

/// Reduce a house number to its primary numeric part.
///
/// Purely numeric values pass through. Otherwise the first rule that applies
/// wins: keep the text before the first whitespace (and before any `;` in
/// it); keep the text before the first `-`; drop a trailing character when
/// anything other than ASCII letters is present.
///
/// # Examples
/// ```
/// use mapclean_core::clean_house_number;
///
/// assert_eq!(clean_house_number("123-125"), "123");
/// assert_eq!(clean_house_number("123 REAR"), "123");
/// assert_eq!(clean_house_number("12A"), "12");
/// assert_eq!(clean_house_number("42"), "42");
/// ```
#[must_use]
pub fn clean_house_number(value: &str) -> String {
    if value.is_empty() || value.bytes().all(|byte| byte.is_ascii_digit()) {
        return value.to_owned();
    }
    if let Some((first, _)) = value.split_once(char::is_whitespace) {
        return first
            .split_once(';')
            .map_or(first, |(before, _)| before)
            .to_owned();
    }
    if let Some((before, _)) = value.split_once('-') {
        return before.to_owned();
    }
    if value.chars().any(|ch| !ch.is_ascii_alphabetic()) {
        let mut trimmed = value.to_owned();
        trimmed.pop();
        return trimmed;
    }
    value.to_owned()
}

/// Give heights without a decimal point an explicit `.0`.
///
/// # Examples
/// ```
/// use mapclean_core::clean_height;
///
/// assert_eq!(clean_height("12"), "12.0");
/// assert_eq!(clean_height("12.5"), "12.5");
/// ```
#[must_use]
pub fn clean_height(value: &str) -> String {
    if value.contains('.') {
        value.to_owned()
    } else {
        format!("{value}.0")
    }
}

fn trailing_token(value: &str) -> Option<&str> {
    let token = value.split_whitespace().next_back()?;
    value.ends_with(token).then_some(token)
}

/// Split `value` into the text before the first non-numeric token, the token
/// itself and everything after it.
fn leading_name_token(value: &str) -> Option<(&str, &str, &str)> {
    let mut rest = value;
    let mut consumed = 0;
    loop {
        let trimmed = rest.trim_start();
        consumed += rest.len() - trimmed.len();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (token, tail) = trimmed.split_at(end);
        if token.is_empty() {
            return None;
        }
        if !token.bytes().all(|byte| byte.is_ascii_digit()) {
            let (head, _) = value.split_at(consumed);
            return Some((head, token, tail));
        }
        consumed += end;
        rest = tail;
    }
}
