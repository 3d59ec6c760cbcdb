use jiff::{
    SignedDuration, Timestamp,
    civil::{Date, Time},
    fmt::strtime,
    tz::Offset,
};

/// Parses the conventional boolean tokens.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Rejects values that only became infinite by overflowing the target type.
#[inline]
pub(crate) fn finite_or_explicit(value_is_infinite: bool, raw: &str) -> bool {
    !value_is_infinite || raw.to_ascii_lowercase().contains("inf")
}

/// Parses `s` against the strftime-style `layout`.
///
/// An offset (or instant) in the input is honoured; otherwise the civil
/// time is read as UTC. Fields the layout leaves out default to year 0,
/// January, the 1st and midnight.
pub(crate) fn parse_time(layout: &str, s: &str) -> Option<Timestamp> {
    let tm = strtime::parse(layout, s).ok()?;
    if let Ok(ts) = tm.to_timestamp() {
        return Some(ts);
    }
    let date = match (tm.year(), tm.month(), tm.day()) {
        (Some(_), Some(_), Some(_)) => tm.to_date().ok()?,
        (year, month, day) => {
            Date::new(year.unwrap_or(0), month.unwrap_or(1), day.unwrap_or(1)).ok()?
        }
    };
    let time = if tm.hour().is_some() {
        tm.to_time().ok()?
    } else {
        Time::midnight()
    };
    let offset = tm.offset().unwrap_or(Offset::UTC);
    offset.to_timestamp(date.to_datetime(time)).ok()
}

const DURATION_UNITS: [&str; 8] = ["ns", "us", "\u{b5}s", "\u{3bc}s", "ms", "s", "m", "h"];

/// Checks `[+-]` followed by one or more `<decimal><unit>` terms.
fn is_unit_suffixed(s: &str) -> bool {
    let mut rest = s.strip_prefix(['+', '-']).unwrap_or(s);
    if rest.is_empty() {
        return false;
    }
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return false;
        }
        rest = &rest[number_len..];
        let Some(unit) = DURATION_UNITS
            .iter()
            .filter(|unit| rest.starts_with(**unit))
            .max_by_key(|unit| unit.len())
        else {
            return false;
        };
        rest = &rest[unit.len()..];
    }
    true
}

/// Parses a unit-suffixed duration such as `1m12s`, `-1.5h` or `250ms`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare number is
/// rejected unless it is zero.
pub(crate) fn parse_duration(s: &str) -> Option<SignedDuration> {
    if matches!(s, "0" | "+0" | "-0") {
        return Some(SignedDuration::ZERO);
    }
    if !is_unit_suffixed(s) {
        return None;
    }
    s.parse::<SignedDuration>().ok()
}
