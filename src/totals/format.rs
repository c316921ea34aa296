//! printf-style formatting for totals
//!
//! Supports one argument and the conversions `d`, `f`, `e` and `s` with
//! the flags `-`, `0` and `,`, an optional width and precision, plus the
//! literals `%%` and `%n`. Anything else makes the pattern inapplicable.
//! Numbers are formatted from their exact decimal digits; only `e` goes
//! through `f64`.

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Most fraction digits a `Decimal` carries
const MAX_SCALE: u32 = 28;

static DIRECTIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%([-0,]*)(\d+)?(?:\.(\d+))?([dfesn%])").expect("valid regex")
});

/// The single argument a pattern is applied to
#[derive(Debug, Clone, Copy)]
pub(crate) enum Arg<'a> {
    Number(Decimal),
    Text(&'a str),
}

#[derive(Debug, Default)]
struct Directive {
    left: bool,
    zero: bool,
    grouping: bool,
    width: usize,
    precision: Option<usize>,
}

/// Apply `pattern` to `arg`; `None` if the pattern does not fit the argument
pub(crate) fn printf(pattern: &str, arg: Arg<'_>) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut last = 0;
    let mut consumed = false;

    for caps in DIRECTIVE_REGEX.captures_iter(pattern) {
        let whole = caps.get(0)?;
        let literal = &pattern[last..whole.start()];
        if literal.contains('%') {
            return None;
        }
        out.push_str(literal);
        last = whole.end();

        let conversion = caps.get(4)?.as_str();
        match conversion {
            "%" => {
                out.push('%');
                continue;
            }
            "n" => {
                out.push('\n');
                continue;
            }
            _ => {}
        }

        // One argument only
        if consumed {
            return None;
        }
        consumed = true;

        let flags = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let directive = Directive {
            left: flags.contains('-'),
            zero: flags.contains('0'),
            grouping: flags.contains(','),
            width: match caps.get(2) {
                Some(w) => w.as_str().parse().ok()?,
                None => 0,
            },
            precision: match caps.get(3) {
                Some(p) => Some(p.as_str().parse().ok()?),
                None => None,
            },
        };

        let body = convert(conversion, &directive, arg)?;
        out.push_str(&pad(body, &directive, conversion != "s"));
    }

    let tail = &pattern[last..];
    if tail.contains('%') {
        return None;
    }
    out.push_str(tail);
    Some(out)
}

fn convert(conversion: &str, directive: &Directive, arg: Arg<'_>) -> Option<String> {
    match (conversion, arg) {
        ("d", Arg::Number(x)) if x.fract().is_zero() && directive.precision.is_none() => {
            let body = x.trunc().normalize().to_string();
            Some(if directive.grouping { group(&body) } else { body })
        }
        ("f", Arg::Number(x)) => {
            let body = fixed(x, directive.precision.unwrap_or(6))?;
            Some(if directive.grouping { group(&body) } else { body })
        }
        ("e", Arg::Number(x)) if !directive.grouping => {
            Some(scientific(x.to_f64()?, directive.precision.unwrap_or(6)))
        }
        ("s", arg) if !directive.grouping && !directive.zero => {
            let text = match arg {
                Arg::Number(x) => x.normalize().to_string(),
                Arg::Text(s) => s.to_string(),
            };
            Some(match directive.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            })
        }
        _ => None,
    }
}

/// Exactly `precision` fraction digits, half away from zero
fn fixed(x: Decimal, precision: usize) -> Option<String> {
    let scale = u32::try_from(precision).ok().filter(|s| *s <= MAX_SCALE)?;
    let mut rounded = x;
    rounded.rescale(scale);
    // Too many integer digits for the scale leaves a smaller one
    (rounded.scale() == scale).then(|| rounded.to_string())
}

/// `6.000000e+01` rather than Rust's `6.000000e1`
fn scientific(x: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, x);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => raw,
    }
}

/// Insert thousands separators into the integer digits
fn group(body: &str) -> String {
    let (sign, rest) = match body.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", body),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn pad(body: String, directive: &Directive, numeric: bool) -> String {
    let len = body.chars().count();
    if len >= directive.width {
        return body;
    }
    let fill = directive.width - len;

    if directive.left {
        format!("{}{}", body, " ".repeat(fill))
    } else if directive.zero && numeric {
        let (sign, digits) = match body.strip_prefix('-') {
            Some(d) => ("-", d),
            None => ("", body.as_str()),
        };
        format!("{}{}{}", sign, "0".repeat(fill), digits)
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Arg<'static> {
        Arg::Number(text.parse().unwrap())
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(printf("%.2f", num("60.0")).unwrap(), "60.00");
        assert_eq!(printf("%d items", num("3.0")).unwrap(), "3 items");
        assert_eq!(printf("%,.2f", num("1234567.891")).unwrap(), "1,234,567.89");
        assert_eq!(printf("%,d", num("-1234.0")).unwrap(), "-1,234");
        assert_eq!(printf("%.3e", num("60.0")).unwrap(), "6.000e+01");
        assert_eq!(printf("%08.2f", num("-3.5")).unwrap(), "-0003.50");
    }

    #[test]
    fn test_width_and_alignment() {
        assert_eq!(printf("[%6.1f]", num("2.5")).unwrap(), "[   2.5]");
        assert_eq!(printf("[%-6s]", Arg::Text("ab")).unwrap(), "[ab    ]");
        assert_eq!(printf("%.3s", Arg::Text("Berlin")).unwrap(), "Ber");
    }

    #[test]
    fn test_literals() {
        assert_eq!(printf("%.0f%%", num("42.0")).unwrap(), "42%");
        assert_eq!(printf("Total", num("1.0")).unwrap(), "Total");
    }

    #[test]
    fn test_inapplicable_patterns() {
        assert!(printf("%d", num("2.5")).is_none());
        assert!(printf("%d", Arg::Text("x")).is_none());
        assert!(printf("%f %f", num("1.0")).is_none());
        assert!(printf("%q", num("1.0")).is_none());
        assert!(printf("50%", num("1.0")).is_none());
    }

    #[test]
    fn test_exact_digits() {
        assert_eq!(printf("%.2f", num("0.30")).unwrap(), "0.30");
        assert_eq!(printf("%d", num("9007199254740993")).unwrap(), "9007199254740993");
        assert_eq!(printf("%,d", num("100000000000000000000")).unwrap(), "100,000,000,000,000,000,000");
        assert_eq!(printf("%.1f", num("0.25")).unwrap(), "0.3");
        assert_eq!(printf("%.1f", num("-0.25")).unwrap(), "-0.3");
        assert_eq!(printf("%s", num("12.500")).unwrap(), "12.5");
        assert!(printf("%.40f", num("1.5")).is_none());
    }
}
