/// Group the digits of `n` in threes: `1250` becomes `"1,250"`
pub fn format_with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Short form for counters and badges.
///
/// Below 1000 the number is printed as is, then `1k`/`1.1k` up to a
/// million and `1M+`/`1.1M+` beyond. One decimal, dropped when it is zero.
pub fn format_compact_number(n: usize) -> String {
    if n < 1_000 {
        n.to_string()
    } else if n < 1_000_000 {
        format!("{}k", one_decimal(n as f64 / 1_000.0))
    } else {
        format!("{}M+", one_decimal(n as f64 / 1_000_000.0))
    }
}

fn one_decimal(value: f64) -> String {
    let tenths = (value * 10.0).floor() / 10.0;
    if tenths.fract() == 0.0 {
        format!("{}", tenths as u64)
    } else {
        format!("{:.1}", tenths)
    }
}
