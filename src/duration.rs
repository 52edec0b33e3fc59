//! ISO-8601 duration decoding for SIRI `<Delay>` values.

/// Decodes an ISO-8601 duration (`PT5M`, `-PT3M`, `PT1H30M`) into signed
/// whole minutes.
///
/// Accepts an optional leading `-` and the pattern `P[T[<h>H][<m>M][<s>S]]`;
/// missing sub-fields default to 0. Seconds are truncated, not rounded, when
/// converting to minutes; the sign is applied after truncation, so `-PT90S`
/// is `-1`. Returns `None` on any structural mismatch, never panics.
pub fn parse_duration_minutes(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let body = body.strip_prefix(['P', 'p'])?;
    if body.is_empty() {
        return Some(0);
    }
    let body = body.strip_prefix(['T', 't'])?;

    let mut hours: u32 = 0;
    let mut minutes: u32 = 0;
    let mut seconds: u32 = 0;
    // Units must appear at most once, in H-M-S order.
    let mut last_rank = 0u8;
    let mut digits = String::new();

    for c in body.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return None;
        }
        let value: u32 = digits.parse().ok()?;
        digits.clear();

        let rank = match c.to_ascii_uppercase() {
            'H' => 1,
            'M' => 2,
            'S' => 3,
            _ => return None,
        };
        if rank <= last_rank {
            return None;
        }
        last_rank = rank;

        match rank {
            1 => hours = value,
            2 => minutes = value,
            _ => seconds = value,
        }
    }

    if !digits.is_empty() {
        // Trailing number with no unit letter.
        return None;
    }

    let total = i64::from(hours) * 60 + i64::from(minutes) + i64::from(seconds) / 60;
    Some(if negative { -total } else { total })
}
