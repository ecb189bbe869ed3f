//! Display formatting for prices and timestamps.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use std::time::{SystemTime, UNIX_EPOCH};

use super::i18n::{Locale, translate};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Current wall-clock time in epoch milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

/// Group digits by thousands with a space: `1250` → `"1 250"`.
#[must_use]
pub fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// `1250` → `"1 250 DZD"`.
#[must_use]
pub fn format_price(price: i64) -> String {
    format!("{} DZD", group_digits(price))
}

/// Coarse "n minutes ago" label. Future timestamps read as "just now".
#[must_use]
pub fn relative_time(locale: Locale, now_ms: i64, then_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(then_ms);
    let (key, n) = if elapsed < MINUTE_MS {
        return translate(locale, "time.justNow").to_owned();
    } else if elapsed < HOUR_MS {
        ("time.minutes", elapsed / MINUTE_MS)
    } else if elapsed < DAY_MS {
        ("time.hours", elapsed / HOUR_MS)
    } else {
        ("time.days", elapsed / DAY_MS)
    };
    translate(locale, key).replace("{n}", &n.to_string())
}
