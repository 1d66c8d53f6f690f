/// Phone number normalization. US-centric defaults: bare 10-digit numbers
/// get a `+1`, longer strings are assumed to already carry a country code.
pub fn format_phone_number(phone_number: &str) -> String {
    let cleaned: String = phone_number.chars().filter(|c| c.is_ascii_digit()).collect();

    match cleaned.len() {
        10 => format!("+1{}", cleaned),
        11 => format!("+{}", cleaned),
        n if n > 11 => {
            // Take the last 10 digits and treat as US
            format!("+1{}", &cleaned[cleaned.len() - 10..])
        }
        7..=9 => format!("+1{}", cleaned),
        _ => format!("+{}", cleaned),
    }
}

/// 7 to 15 digits after cleaning, per the international numbering plan.
pub fn validate_phone_number(phone_number: &str) -> bool {
    let digits = phone_number.chars().filter(|c| c.is_ascii_digit()).count();
    (7..=15).contains(&digits)
}
