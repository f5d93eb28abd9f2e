//! Value formatting and escaping for the text format.

/// Decimal exponents outside `[-4, 15)` switch to exponent notation.
const MIN_PLAIN_EXP: i32 = -4;
const MAX_PLAIN_EXP: i32 = 15;

/// Shortest round-trip representation of `v`.
///
/// `2` rather than `2.0`, `1e+15` / `1e-05` outside the plain range, and the
/// literals `+Inf`, `-Inf`, `NaN`.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // LowerExp yields the shortest round-trip digits, e.g. "1.5e-7".
    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = match exp.parse() {
        Ok(e) => e,
        Err(_) => return sci,
    };

    if (MIN_PLAIN_EXP..MAX_PLAIN_EXP).contains(&exp) {
        // Display prints the same shortest digits without an exponent.
        return format!("{v}");
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

/// Escape `\` and newline in help text.
pub fn escape_help(s: &str) -> String {
    escape(s, false)
}

/// Escape `\`, `"` and newline in a label value.
pub fn escape_label_value(s: &str) -> String {
    escape(s, true)
}

fn escape(s: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '"' if quotes => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}
