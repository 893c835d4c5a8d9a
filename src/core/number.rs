use std::{env, sync::OnceLock};

use serde::{Deserialize, Serialize};

/// Digits per group when grouping separators are emitted.
const GROUPING_SIZE: usize = 3;

/// Environment variables consulted, in order, to find the process locale.
const LOCALE_VARIABLES: [&str; 3] = ["LC_ALL", "LC_NUMERIC", "LANG"];

static ENV_DEFAULT: OnceLock<NumberFormat> = OnceLock::new();

/// Locale-sensitive strategy used to parse and format numeric cells.
///
/// A `NumberFormat` knows the decimal separator and the grouping (thousands)
/// separator of a locale. Parsing reads the longest numeric prefix of a text,
/// skipping grouping separators placed between digits, so that `"1,234.5 kg"`
/// parses to `1234.5` with the English format. Formatting never emits
/// grouping separators unless [`NumberFormat::grouping_used`] is enabled.
///
/// # Examples
///
/// ```
/// use datafile::core::number::NumberFormat;
///
/// let german = NumberFormat::for_locale("de_DE.UTF-8");
/// assert_eq!(german.parse_f64("1.234,5"), Some(1234.5));
/// assert_eq!(german.format_f64(0.25), "0,25");
///
/// let english = NumberFormat::english().grouping_used(true);
/// assert_eq!(english.format_i64(1234567), "1,234,567");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    decimal_separator: char,
    grouping_separator: Option<char>,
    grouping_used: bool,
    max_fraction_digits: Option<usize>,
}

/// Pieces of a number recognized by [`NumberFormat::scan`].
struct Scanned {
    negative: bool,
    integer: String,
    fraction: String,
    exponent: Option<i32>,
}

impl NumberFormat {
    /// Creates a format with the given separators.
    ///
    /// A grouping separator equal to the decimal separator is ignored.
    pub fn new(decimal_separator: char, grouping_separator: Option<char>) -> Self {
        Self {
            decimal_separator,
            grouping_separator: grouping_separator.filter(|sep| *sep != decimal_separator),
            grouping_used: false,
            max_fraction_digits: None,
        }
    }

    /// `.` as decimal separator, `,` for grouping.
    pub fn english() -> Self {
        Self::new('.', Some(','))
    }

    /// Resolves the numeric conventions of a locale tag.
    ///
    /// Both POSIX (`de_DE.UTF-8`, `fr_FR@euro`) and BCP-47 (`de-CH`) tags are
    /// understood. Unknown languages, `C` and `POSIX` use [`NumberFormat::english`].
    pub fn for_locale(tag: &str) -> Self {
        let tag = tag.split(['.', '@']).next().unwrap_or_default();
        let mut parts = tag.split(['_', '-']);
        let language = parts.next().unwrap_or_default().to_ascii_lowercase();
        let region = parts.next().unwrap_or_default().to_ascii_uppercase();

        match (language.as_str(), region.as_str()) {
            ("de" | "fr" | "it", "CH" | "LI") => Self::new('.', Some('\'')),
            ("es", "MX" | "US") | ("pt", "MZ") => Self::english(),
            (
                "de" | "es" | "it" | "nl" | "pt" | "da" | "id" | "tr" | "el" | "ro" | "hr" | "sl"
                | "sr" | "ca",
                _,
            ) => Self::new(',', Some('.')),
            (
                "fr" | "ru" | "pl" | "cs" | "sk" | "sv" | "fi" | "nb" | "no" | "nn" | "uk" | "hu"
                | "bg" | "lt" | "lv" | "et",
                _,
            ) => Self::new(',', Some('\u{a0}')),
            _ => Self::english(),
        }
    }

    /// Resolves the process locale from `LC_ALL`, `LC_NUMERIC` and `LANG`.
    pub fn from_env() -> Self {
        LOCALE_VARIABLES
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.is_empty())
            .map_or_else(Self::english, |tag| Self::for_locale(&tag))
    }

    /// Sets whether grouping separators are emitted when formatting.
    pub fn grouping_used(mut self, yes: bool) -> Self {
        self.grouping_used = yes;
        self
    }

    /// Rounds formatted fractions to at most `digits` places; trailing zeros are dropped.
    pub fn max_fraction_digits(mut self, digits: usize) -> Self {
        self.max_fraction_digits = Some(digits);
        self
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn grouping_separator(&self) -> Option<char> {
        self.grouping_separator
    }

    /// Parses the numeric prefix of `text` as a floating point value.
    ///
    /// Returns `None` when `text` does not start with a number.
    pub fn parse_f64(&self, text: &str) -> Option<f64> {
        let scanned = self.scan(text)?;
        scanned_to_f64(&scanned)
    }

    /// Parses the numeric prefix of `text` as an integer, truncating any fraction.
    ///
    /// Returns `None` when `text` does not start with a number or the value
    /// does not fit in an `i64`.
    pub fn parse_i64(&self, text: &str) -> Option<i64> {
        let scanned = self.scan(text)?;

        if scanned.exponent.is_some() {
            let value = scanned_to_f64(&scanned)?.trunc();
            // i64::MAX is not representable; the upper bound is exclusive
            return (value >= i64::MIN as f64 && value < i64::MAX as f64).then_some(value as i64);
        }

        if scanned.integer.is_empty() {
            return Some(0);
        }

        let sign = if scanned.negative { "-" } else { "" };
        format!("{sign}{}", scanned.integer).parse().ok()
    }

    pub fn format_i64(&self, value: i64) -> String {
        let digits = value.unsigned_abs().to_string();
        let sign = if value < 0 { "-" } else { "" };
        format!("{sign}{}", self.group(&digits))
    }

    pub fn format_f64(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_owned();
        }
        if value.is_infinite() {
            return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
        }

        let text = match self.max_fraction_digits {
            Some(digits) => trim_fraction(format!("{value:.digits$}")),
            None => value.to_string(),
        };

        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };

        let mut out = String::with_capacity(text.len() + 4);
        out.push_str(sign);
        match unsigned.split_once('.') {
            Some((integer, fraction)) => {
                out.push_str(&self.group(integer));
                out.push(self.decimal_separator);
                out.push_str(fraction);
            }
            None => out.push_str(&self.group(unsigned)),
        }
        out
    }

    fn group(&self, digits: &str) -> String {
        let separator = match self.grouping_separator {
            Some(separator) if self.grouping_used => separator,
            _ => return digits.to_owned(),
        };

        let mut out = String::with_capacity(digits.len() + digits.len() / GROUPING_SIZE);
        for (i, digit) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % GROUPING_SIZE == 0 {
                out.push(separator);
            }
            out.push(digit);
        }
        out
    }

    /// Reads an optional `-`, digits with embedded grouping separators, an
    /// optional fraction and an optional `E` exponent. Stops at the first
    /// character that cannot continue the number.
    fn scan(&self, text: &str) -> Option<Scanned> {
        let chars: Vec<char> = text.chars().collect();
        let negative = chars.first() == Some(&'-');
        let mut i = usize::from(negative);

        let mut integer = String::new();
        while let Some(&c) = chars.get(i) {
            if c.is_ascii_digit() {
                integer.push(c);
            } else if Some(c) == self.grouping_separator
                && !integer.is_empty()
                && chars.get(i + 1).is_some_and(char::is_ascii_digit)
            {
                // grouping separator between digits
            } else {
                break;
            }
            i += 1;
        }

        let mut fraction = String::new();
        if chars.get(i) == Some(&self.decimal_separator) {
            i += 1;
            while let Some(&c) = chars.get(i).filter(|c| c.is_ascii_digit()) {
                fraction.push(c);
                i += 1;
            }
        }

        if integer.is_empty() && fraction.is_empty() {
            return None;
        }

        let mut exponent = None;
        if chars.get(i) == Some(&'E') {
            let negative_exponent = chars.get(i + 1) == Some(&'-');
            let start = i + 1 + usize::from(negative_exponent);
            let digits: String = chars[start.min(chars.len())..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            exponent = digits
                .parse::<i32>()
                .ok()
                .map(|e| if negative_exponent { -e } else { e });
        }

        Some(Scanned {
            negative,
            integer,
            fraction,
            exponent,
        })
    }
}

impl Default for NumberFormat {
    /// The format of the process locale, resolved once.
    fn default() -> Self {
        *ENV_DEFAULT.get_or_init(NumberFormat::from_env)
    }
}

fn scanned_to_f64(scanned: &Scanned) -> Option<f64> {
    let mut literal = String::with_capacity(scanned.integer.len() + scanned.fraction.len() + 8);
    if scanned.negative {
        literal.push('-');
    }
    if scanned.integer.is_empty() {
        literal.push('0');
    } else {
        literal.push_str(&scanned.integer);
    }
    if !scanned.fraction.is_empty() {
        literal.push('.');
        literal.push_str(&scanned.fraction);
    }
    if let Some(exponent) = scanned.exponent {
        literal.push('e');
        literal.push_str(&exponent.to_string());
    }
    literal.parse().ok()
}

fn trim_fraction(text: String) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        text
    }
}
