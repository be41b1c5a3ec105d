//! Cost and overlay label helpers.

/// Cost of `minutes` at `cost_per_minute`, rounded to cents.
///
/// The sign of `minutes` is ignored: removing time is priced the same as
/// adding it.
pub fn cost_for(minutes: i64, cost_per_minute: f64) -> f64 {
    round_cents(minutes.unsigned_abs() as f64 * cost_per_minute)
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `+3 m` / `-3 m`.
pub fn minutes_label(minutes: i64) -> String {
    if minutes > 0 {
        format!("+{minutes} m")
    } else {
        format!("{minutes} m")
    }
}

/// `+$1.05` / `-$1.05`. Zero renders as `+$0.00`.
pub fn cost_label(minutes: i64, cost_per_minute: f64) -> String {
    let sign = if minutes >= 0 { '+' } else { '-' };
    format!("{sign}${:.2}", cost_for(minutes, cost_per_minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_rounds_to_cents() {
        assert_eq!(cost_for(3, 0.35), 1.05);
        assert_eq!(cost_for(-3, 0.35), 1.05);
        assert_eq!(cost_for(7, 0.333), 2.33);
        assert_eq!(cost_for(0, 0.35), 0.0);
    }

    #[test]
    fn labels_carry_sign() {
        assert_eq!(minutes_label(4), "+4 m");
        assert_eq!(minutes_label(-4), "-4 m");
        assert_eq!(cost_label(4, 0.5), "+$2.00");
        assert_eq!(cost_label(-4, 0.5), "-$2.00");
    }
}
