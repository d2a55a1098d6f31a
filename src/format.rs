use rust_decimal::Decimal;

/// US dollar formatting with thousands separators, e.g. `-$1,234.50`
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
}

pub fn format_currency_f64(amount: f64) -> String {
    format_currency(Decimal::try_from(amount).unwrap_or(Decimal::ZERO))
}

/// Percentage with one decimal place and grouped thousands; `value` is
/// already in percent units
pub fn format_percentage(value: f64) -> String {
    let text = format!("{:.1}", value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "0"));
    let sign = if value < 0.0 && text != "0.0" { "-" } else { "" };
    format!("{}{}.{}%", sign, group_thousands(int_part), frac_part)
}

pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    if value < 0 {
        format!("-{}", group_thousands(&digits))
    } else {
        group_thousands(&digits)
    }
}

/// Inverse of `format_currency`; anything unparseable reads as zero
pub fn parse_currency(text: &str) -> Decimal {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<Decimal>().unwrap_or(Decimal::ZERO)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(1234.5)), "$1,234.50");
        assert_eq!(format_currency(dec!(-987654.321)), "-$987,654.32");
        assert_eq!(format_currency(dec!(999)), "$999.00");
        assert_eq!(format_currency_f64(1000000.0), "$1,000,000.00");
    }

    #[test]
    fn test_format_number_and_percentage() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(52_345_678), "52,345,678");
        assert_eq!(format_number(-1200), "-1,200");
        assert_eq!(format_percentage(12.345), "12.3%");
        assert_eq!(format_percentage(123456.78), "123,456.8%");
        assert_eq!(format_percentage(-1500.0), "-1,500.0%");
        assert_eq!(format_percentage(-0.01), "0.0%");
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("$1,234.56"), dec!(1234.56));
        assert_eq!(parse_currency("-$20.00"), dec!(-20.00));
        assert_eq!(parse_currency(""), Decimal::ZERO);
        assert_eq!(parse_currency("n/a"), Decimal::ZERO);
    }
}
