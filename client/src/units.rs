//! Exact unit conversions for display and re-submission
//!
//! The wire convention: "e6" fields carry 6 implied decimals, "bps" fields
//! are basis points (100 bps = 1%), "e2bps" fields are hundredths of a
//! basis point (1_000_000 e2bps = 100%). All conversions here are integer
//! and string operations; a value formatted and parsed back is bit-exact,
//! which float round-trips cannot guarantee.

/// Slots in eight hours at ~400ms per slot.
pub const SLOTS_PER_8H: i128 = 72_000;

fn split_abs(value: i128) -> (&'static str, u128) {
    if value < 0 {
        ("-", value.unsigned_abs())
    } else {
        ("", value.unsigned_abs())
    }
}

/// Render an e6 fixed-point value with all six decimals.
/// `150_000_000` becomes `"150.000000"`.
pub fn format_e6(value: i128) -> String {
    let (sign, abs) = split_abs(value);
    format!("{sign}{}.{:06}", abs / 1_000_000, abs % 1_000_000)
}

/// Parse a decimal string into e6 fixed-point. At most six fraction
/// digits; shorter fractions are right-padded. Returns `None` on any
/// malformed input rather than rounding.
pub fn parse_e6(input: &str) -> Option<i128> {
    let (sign, rest) = match input.strip_prefix('-') {
        Some(rest) => (-1i128, rest),
        None => (1i128, input),
    };
    let (whole, frac) = match rest.split_once('.') {
        Some((w, f)) => (w, f),
        None => (rest, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 6 {
        return None;
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac: i128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<6}").parse().ok()?
    };
    Some(sign * (whole.checked_mul(1_000_000)?.checked_add(frac)?))
}

/// Render a native-unit amount at the mint's decimals, trimming trailing
/// zeros from the fraction. `1_500_000_000` at 9 decimals is `"1.5"`.
pub fn format_native(amount: i128, decimals: u32) -> String {
    let (sign, abs) = split_abs(amount);
    let divisor = 10u128.pow(decimals);
    let whole = abs / divisor;
    let frac = abs % divisor;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    format!("{sign}{whole}.{frac}")
}

/// Basis points as a percent string with two decimals. `133` is `"1.33%"`.
pub fn bps_to_percent(bps: i128) -> String {
    let (sign, abs) = split_abs(bps);
    format!("{sign}{}.{:02}%", abs / 100, abs % 100)
}

/// Hundredths of a basis point as a percent string with four decimals.
/// `500` e2bps is `"0.0500%"`; `1_000_000` is `"100.0000%"`.
pub fn e2bps_to_percent(e2bps: i128) -> String {
    let (sign, abs) = split_abs(e2bps);
    format!("{sign}{}.{:04}%", abs / 10_000, abs % 10_000)
}

/// Per-slot funding rate extrapolated to an eight-hour percent figure.
/// Always signed; `+` for non-negative.
pub fn funding_rate_8h_percent(bps_per_slot: i128) -> String {
    let percent_e4 = bps_per_slot * SLOTS_PER_8H * 100;
    let (sign, abs) = if percent_e4 < 0 {
        ("-", percent_e4.unsigned_abs())
    } else {
        ("+", percent_e4.unsigned_abs())
    };
    format!("{sign}{}.{:04}%", abs / 10_000, abs % 10_000)
}

/// Slot count as hours, one decimal. `72_000` is `"8.0h"`.
pub fn slots_to_hours(slots: u64) -> String {
    // 9000 slots per hour at 400ms per slot
    let tenths = slots as u128 * 10 / 9_000;
    format!("{}.{}h", tenths / 10, tenths % 10)
}
