//! Component value parsing.
//!
//! OCR hands us strings like `10kΩ`, `100μF`, `4k7` or `2R2`. They are
//! parsed into a [`Value`] carrying both the SPICE spelling and the numeric
//! magnitude in base SI units. Anything unparseable falls back to a
//! per-kind default and is marked `is_default`.
//!
//! Prefix case matters only for `M`/`m`: upper case is mega (written `meg`
//! in SPICE), lower case is milli. `meg` in any case is mega.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Resistance,
    Capacitance,
    Inductance,
    Voltage,
    Current,
}

impl ValueKind {
    /// Fallback used when no value is given or it cannot be parsed.
    pub fn default_text(&self) -> &'static str {
        match self {
            ValueKind::Resistance => "1k",
            ValueKind::Capacitance => "1n",
            ValueKind::Inductance => "1u",
            ValueKind::Voltage => "5",
            ValueKind::Current => "1m",
        }
    }

    fn default_magnitude(&self) -> f64 {
        match self {
            ValueKind::Resistance => 1e3,
            ValueKind::Capacitance => 1e-9,
            ValueKind::Inductance => 1e-6,
            ValueKind::Voltage => 5.0,
            ValueKind::Current => 1e-3,
        }
    }

    /// Unit spellings stripped from the end of a value, longest first.
    fn unit_suffixes(&self) -> &'static [&'static str] {
        match self {
            ValueKind::Resistance => &["ohms", "ohm", "Ω", "Ω"],
            ValueKind::Capacitance => &["farads", "farad", "F"],
            ValueKind::Inductance => &["henries", "henrys", "henry", "H", "h"],
            ValueKind::Voltage => &["volts", "volt", "V", "v"],
            ValueKind::Current => &["amps", "amp", "A"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Prefix {
    Tera,
    Giga,
    Mega,
    Kilo,
    /// `R` in RKM resistor codes: a decimal point with unit multiplier.
    Unit,
    Milli,
    Micro,
    Nano,
    Pico,
    Femto,
}

impl Prefix {
    fn multiplier(self) -> f64 {
        match self {
            Prefix::Tera => 1e12,
            Prefix::Giga => 1e9,
            Prefix::Mega => 1e6,
            Prefix::Kilo => 1e3,
            Prefix::Unit => 1.0,
            Prefix::Milli => 1e-3,
            Prefix::Micro => 1e-6,
            Prefix::Nano => 1e-9,
            Prefix::Pico => 1e-12,
            Prefix::Femto => 1e-15,
        }
    }

    fn spice_suffix(self) -> &'static str {
        match self {
            Prefix::Tera => "t",
            Prefix::Giga => "g",
            Prefix::Mega => "meg",
            Prefix::Kilo => "k",
            Prefix::Unit => "",
            Prefix::Milli => "m",
            Prefix::Micro => "u",
            Prefix::Nano => "n",
            Prefix::Pico => "p",
            Prefix::Femto => "f",
        }
    }

    /// Recognize a prefix at the start of `rest`; returns it and its byte length.
    fn lex(rest: &str, kind: ValueKind) -> Option<(Prefix, usize)> {
        if rest.get(..3).map_or(false, |p| p.eq_ignore_ascii_case("meg")) {
            return Some((Prefix::Mega, 3));
        }
        let c = rest.chars().next()?;
        let prefix = match c {
            'T' | 't' => Prefix::Tera,
            'G' | 'g' => Prefix::Giga,
            'M' => Prefix::Mega,
            'k' | 'K' => Prefix::Kilo,
            'm' => Prefix::Milli,
            'u' | 'U' => Prefix::Micro,
            'n' | 'N' => Prefix::Nano,
            'p' | 'P' => Prefix::Pico,
            'f' => Prefix::Femto,
            'R' | 'r' if kind == ValueKind::Resistance => Prefix::Unit,
            _ => return None,
        };
        Some((prefix, c.len_utf8()))
    }
}

/// A parsed component value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub kind: ValueKind,
    /// Numeric value in ohms, farads, henries, volts or amperes.
    pub magnitude: f64,
    /// The text as received, or empty when none was given.
    pub raw_text: String,
    /// SPICE spelling, e.g. `4.7k`, `100u`, `1meg`.
    pub spice: String,
    pub is_default: bool,
}

impl Value {
    pub fn default_for(kind: ValueKind, raw_text: &str) -> Self {
        Self {
            kind,
            magnitude: kind.default_magnitude(),
            raw_text: raw_text.to_string(),
            spice: kind.default_text().to_string(),
            is_default: true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spice)
    }
}

pub struct ValueParser;

impl ValueParser {
    /// Parse `text` as a value of `kind`. Never fails: missing or malformed
    /// input yields the kind's default.
    pub fn parse(kind: ValueKind, text: Option<&str>) -> Value {
        let raw = match text.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Value::default_for(kind, ""),
        };

        match Self::parse_text(kind, raw) {
            Some((magnitude, spice)) => Value {
                kind,
                magnitude,
                raw_text: raw.to_string(),
                spice,
                is_default: false,
            },
            None => {
                tracing::debug!(
                    "Unparseable {:?} value {:?}, using default {}",
                    kind,
                    raw,
                    kind.default_text()
                );
                Value::default_for(kind, raw)
            }
        }
    }

    fn parse_text(kind: ValueKind, raw: &str) -> Option<(f64, String)> {
        let mut s: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == 'μ' || c == 'µ' { 'u' } else { c })
            .collect();
        Self::strip_unit(&mut s, kind);

        let bytes = s.as_bytes();
        let mut pos = 0;
        if pos < bytes.len() && (bytes[pos] == b'-' || bytes[pos] == b'+') {
            pos += 1;
        }
        let int_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let int_part = &s[int_start..pos];
        let mut frac_part = "";
        if pos < bytes.len() && bytes[pos] == b'.' {
            let frac_start = pos + 1;
            pos = frac_start;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            frac_part = &s[frac_start..pos];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let sign = &s[..int_start];

        let rest = &s[pos..];
        let (prefix, tail) = if rest.is_empty() {
            (None, "")
        } else {
            let (prefix, len) = Prefix::lex(rest, kind)?;
            (Some(prefix), &rest[len..])
        };

        // RKM notation: the prefix stands in for the decimal point.
        let has_point = s[int_start..pos].contains('.');
        if !tail.is_empty() && (has_point || !tail.bytes().all(|b| b.is_ascii_digit())) {
            return None;
        }

        let int_text = if int_part.is_empty() { "0" } else { int_part };
        let mut mantissa = format!("{}{}", sign, int_text);
        if !frac_part.is_empty() {
            mantissa.push('.');
            mantissa.push_str(frac_part);
        }
        if !tail.is_empty() {
            mantissa.push('.');
            mantissa.push_str(tail);
        }

        let number: f64 = mantissa.parse().ok()?;
        let multiplier = prefix.map_or(1.0, Prefix::multiplier);
        let suffix = prefix.map_or("", Prefix::spice_suffix);
        Some((number * multiplier, format!("{}{}", mantissa, suffix)))
    }

    /// Drop a trailing unit. Single letters match case-insensitively only
    /// right after a prefix (`22pf`), so a bare `1f` stays femto.
    fn strip_unit(s: &mut String, kind: ValueKind) {
        for suffix in kind.unit_suffixes() {
            let cut = match s.len().checked_sub(suffix.len()) {
                Some(c) if c > 0 && s.is_char_boundary(c) => c,
                _ => continue,
            };
            let tail = &s[cut..];
            let multi_letter = suffix.chars().count() > 1;
            let after_prefix = s[..cut].chars().last().map_or(false, char::is_alphabetic);
            if tail == *suffix || ((multi_letter || after_prefix) && tail.eq_ignore_ascii_case(suffix))
            {
                s.truncate(cut);
                return;
            }
        }
    }
}
