//! # Duration Parsing
//!
//! Parses Kubernetes/Go style duration strings such as `"168h"`, `"1h30m"`,
//! `"1.5h"` or `"7d"` into a signed [`TimeDelta`].

use chrono::TimeDelta;
use regex::Regex;

use crate::error::{Error, Result};

/// Longest fraction kept per component; finer digits are below a nanosecond
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a duration string into a [`TimeDelta`]
///
/// Accepts everything Go's `time.ParseDuration` does: decimal components with
/// optional fractions and the units `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`.
/// `d` is accepted as well. Components may be chained (`"1h0m0.5s"`) and the
/// whole value may carry a leading sign. A bare `"0"` is zero.
///
/// # Errors
/// Returns a validation error if the format is invalid or the value overflows
pub fn parse_duration(duration_str: &str) -> Result<TimeDelta> {
    let trimmed = duration_str.trim();

    if trimmed.is_empty() {
        return Err(Error::validation("duration string cannot be empty"));
    }
    if matches!(trimmed, "0" | "-0" | "+0") {
        return Ok(TimeDelta::zero());
    }

    let format_regex =
        Regex::new(r"^(?P<sign>[-+])?(?:(?:\d+\.?\d*|\.\d+)(?:ns|us|µs|μs|ms|s|m|h|d))+$")
            .map_err(|e| Error::validation(format!("failed to compile regex: {e}")))?;
    let component_regex =
        Regex::new(r"(?P<int>\d*)(?:\.(?P<frac>\d*))?(?P<unit>ns|us|µs|μs|ms|s|m|h|d)")
            .map_err(|e| Error::validation(format!("failed to compile regex: {e}")))?;

    let lower = trimmed.to_lowercase();
    let captures = format_regex.captures(&lower).ok_or_else(|| {
        Error::validation(format!(
            "invalid duration format '{trimmed}'. Expected <number><unit> components (e.g. '30h', '1h30m', '1.5h')"
        ))
    })?;
    let negative = captures.name("sign").is_some_and(|s| s.as_str() == "-");

    let overflow = || Error::validation(format!("duration '{trimmed}' is out of range"));

    let mut total_ns: u128 = 0;
    for component in component_regex.captures_iter(&lower) {
        let unit_ns: u128 = match &component["unit"] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            "d" => 86_400_000_000_000,
            unit => {
                return Err(Error::validation(format!(
                    "invalid unit '{unit}' in duration '{trimmed}'. Expected: ns, us, ms, s, m, h or d"
                )))
            }
        };

        let int_digits = &component["int"];
        // Only digits reach here, so a parse failure means the number overflows
        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().ok().ok_or_else(overflow)?
        };

        let frac_digits = component.name("frac").map_or("", |f| f.as_str());
        let frac_digits = &frac_digits[..frac_digits.len().min(MAX_FRACTION_DIGITS)];
        let fraction_ns = if frac_digits.is_empty() {
            0
        } else {
            let numerator: u128 = frac_digits.parse().ok().ok_or_else(overflow)?;
            let scale = 10u128.pow(u32::try_from(frac_digits.len()).ok().ok_or_else(overflow)?);
            numerator * unit_ns / scale
        };

        total_ns = whole
            .checked_mul(unit_ns)
            .and_then(|ns| ns.checked_add(fraction_ns))
            .and_then(|ns| total_ns.checked_add(ns))
            .ok_or_else(overflow)?;
    }

    let total_ns = i64::try_from(total_ns).ok().ok_or_else(overflow)?;
    let delta = TimeDelta::nanoseconds(total_ns);
    Ok(if negative { -delta } else { delta })
}
