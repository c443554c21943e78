//! Display formatting for the portal (pt-BR conventions)

use chrono::{DateTime, Datelike, Utc};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::validation::digits_only;

const MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho",
    "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
];

// ============================================================================
// Contacts & Documents
// ============================================================================

/// `(99) 9999-9999` for landlines, `(99) 99999-9999` for mobiles.
/// Anything else is returned unchanged.
pub fn format_whatsapp(whatsapp: &str) -> String {
    let d = digits_only(whatsapp);
    match d.len() {
        10 => format!("({}) {}-{}", &d[..2], &d[2..6], &d[6..]),
        11 => format!("({}) {}-{}", &d[..2], &d[2..7], &d[7..]),
        _ => whatsapp.to_string(),
    }
}

/// `wa.me` link; numbers without the country code get `55` prepended.
pub fn whatsapp_link(whatsapp: &str, message: Option<&str>) -> String {
    let d = digits_only(whatsapp);
    let number = if d.starts_with("55") { d } else { format!("55{}", d) };

    match message {
        Some(text) => format!("https://wa.me/{}?text={}", number, urlencoding::encode(text)),
        None => format!("https://wa.me/{}", number),
    }
}

pub fn format_cep(cep: &str) -> String {
    let d = digits_only(cep);
    if d.len() == 8 {
        format!("{}-{}", &d[..5], &d[5..])
    } else {
        d
    }
}

pub fn format_cnpj(cnpj: &str) -> String {
    let d = digits_only(cnpj);
    if d.len() == 14 {
        format!("{}.{}.{}/{}-{}", &d[..2], &d[2..5], &d[5..8], &d[8..12], &d[12..])
    } else {
        d
    }
}

/// URL slug: lowercase, accents stripped, spaces to hyphens, no edge hyphens.
pub fn generate_slug(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    stripped
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Numbers & Currency
// ============================================================================

/// pt-BR grouping: `.` for thousands, `,` for decimals.
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed, None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && value.abs() >= 0.5 * 10f64.powi(-(decimals as i32)) {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(f) => format!("{}{},{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// `R$ 1.234,56`
pub fn format_currency(value: f64) -> String {
    let formatted = format_number(value, 2);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-R$ {}", rest),
        None => format!("R$ {}", formatted),
    }
}

/// Parse user-typed currency (`R$ 1.234,56`, `12,5`). Unparseable input is zero.
pub fn parse_currency(value: &str) -> f64 {
    let kept: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    kept.replacen(',', ".", 1).parse().unwrap_or(0.0)
}

/// `1.5K`, `2.3M`; smaller values use plain grouping.
pub fn format_compact(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format_number(value, 0)
    }
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Change between two periods, as shown on dashboard cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Variation {
    pub percentage: f64,
    pub is_positive: bool,
    pub formatted: String,
}

pub fn format_variation(current: f64, previous: f64) -> Variation {
    if previous == 0.0 {
        let grew = current > 0.0;
        return Variation {
            percentage: if grew { 100.0 } else { 0.0 },
            is_positive: grew,
            formatted: if grew { "+100%".to_string() } else { "0%".to_string() },
        };
    }

    let percentage = (current - previous) / previous * 100.0;
    let is_positive = percentage >= 0.0;
    Variation {
        percentage: percentage.abs(),
        is_positive,
        formatted: format!("{}{:.1}%", if is_positive { '+' } else { '-' }, percentage.abs()),
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const SIZES: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut index = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && index < SIZES.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZES[index])
}

// ============================================================================
// Dates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `10/01/2024`
    Short,
    /// `10 de janeiro de 2024`
    Long,
}

pub fn format_date(date: DateTime<Utc>, style: DateStyle) -> String {
    match style {
        DateStyle::Short => date.format("%d/%m/%Y").to_string(),
        DateStyle::Long => format!(
            "{:02} de {} de {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year()
        ),
    }
}

pub fn format_date_time(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y, %H:%M").to_string()
}

pub fn format_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let start = format_date(start, DateStyle::Short);
    let end = format_date(end, DateStyle::Short);
    if start == end {
        start
    } else {
        format!("{} - {}", start, end)
    }
}

fn plural(count: i64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {} atrás", singular)
    } else {
        format!("{} {} atrás", count, plural)
    }
}

/// Day-granularity relative date (`Hoje`, `Ontem`, `3 dias atrás`, ...).
pub fn format_relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - date).num_days();
    match days {
        i64::MIN..=0 => "Hoje".to_string(),
        1 => "Ontem".to_string(),
        2..=6 => format!("{} dias atrás", days),
        7..=29 => plural(days / 7, "semana", "semanas"),
        30..=364 => plural(days / 30, "mês", "meses"),
        _ => plural(days / 365, "ano", "anos"),
    }
}

/// Minute-granularity elapsed time; falls back to the short date after a week.
pub fn format_time_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - date;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Agora mesmo".to_string()
    } else if minutes < 60 {
        format!("{} min atrás", minutes)
    } else if hours < 24 {
        format!("{}h atrás", hours)
    } else if days < 7 {
        format!("{} dias atrás", days)
    } else {
        format_date(date, DateStyle::Short)
    }
}

pub fn format_business_hours(opening: &str, closing: &str) -> String {
    if opening.is_empty() || closing.is_empty() {
        return "Não informado".to_string();
    }
    format!("{} às {}", opening, closing)
}

// ============================================================================
// Text
// ============================================================================

pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    }
}

pub fn capitalize_words(text: &str) -> String {
    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to `max_len` characters including `suffix`.
pub fn truncate_text(text: &str, max_len: usize, suffix: &str) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(suffix.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(suffix);
    truncated
}

/// Two-letter avatar initials.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .take(2)
        .collect()
}

/// `a, b e c`
pub fn format_list(items: &[&str], conjunction: &str) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second] => format!("{} {} {}", first, conjunction, second),
        [rest @ .., last] => format!("{} {} {}", rest.join(", "), conjunction, last),
    }
}

/// Badge shown next to companies and plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLabel {
    pub label: &'static str,
    pub variant: &'static str,
}

pub fn status_label(active: bool) -> StatusLabel {
    if active {
        StatusLabel { label: "Ativo", variant: "default" }
    } else {
        StatusLabel { label: "Inativo", variant: "secondary" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_whatsapp_masks() {
        assert_eq!(format_whatsapp("11987654321"), "(11) 98765-4321");
        assert_eq!(format_whatsapp("1133334444"), "(11) 3333-4444");
        assert_eq!(format_whatsapp("12345"), "12345");
    }

    #[test]
    fn test_whatsapp_link() {
        assert_eq!(whatsapp_link("(11) 98765-4321", None), "https://wa.me/5511987654321");
        assert_eq!(whatsapp_link("5511987654321", None), "https://wa.me/5511987654321");
        assert_eq!(
            whatsapp_link("11987654321", Some("Olá, tudo bem?")),
            "https://wa.me/5511987654321?text=Ol%C3%A1%2C%20tudo%20bem%3F"
        );
    }

    #[test]
    fn test_documents() {
        assert_eq!(format_cep("01310100"), "01310-100");
        assert_eq!(format_cnpj("12345678000190"), "12.345.678/0001-90");
    }

    #[test]
    fn test_slug() {
        assert_eq!(generate_slug("Padaria São João"), "padaria-sao-joao");
        assert_eq!(generate_slug("  Café & Cia -- Centro "), "cafe-cia-centro");
        assert_eq!(generate_slug("Açaí 100%"), "acai-100");
    }

    #[test]
    fn test_currency() {
        assert_eq!(format_currency(1234.5), "R$ 1.234,50");
        assert_eq!(format_currency(0.0), "R$ 0,00");
        assert_eq!(format_currency(-89.9), "-R$ 89,90");
        assert_eq!(format_currency(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(parse_currency("R$ 1.234,56"), 1234.56);
        assert_eq!(parse_currency("abc"), 0.0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(format_number(1234567.0, 0), "1.234.567");
        assert_eq!(format_compact(1500.0), "1.5K");
        assert_eq!(format_compact(2_300_000.0), "2.3M");
        assert_eq!(format_compact(999.0), "999");
        assert_eq!(format_percentage(12.345, 1), "12.3%");
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn test_variation() {
        assert_eq!(format_variation(150.0, 100.0).formatted, "+50.0%");
        let drop = format_variation(50.0, 100.0);
        assert!(!drop.is_positive);
        assert_eq!(drop.formatted, "-50.0%");
        assert_eq!(format_variation(10.0, 0.0).formatted, "+100%");
        assert_eq!(format_variation(0.0, 0.0).formatted, "0%");
    }

    #[test]
    fn test_dates() {
        let date = at(2024, 1, 10, 14, 5);
        assert_eq!(format_date(date, DateStyle::Short), "10/01/2024");
        assert_eq!(format_date(date, DateStyle::Long), "10 de janeiro de 2024");
        assert_eq!(format_date_time(date), "10/01/2024, 14:05");
        assert_eq!(format_date_range(date, date), "10/01/2024");
        assert_eq!(format_date_range(date, at(2024, 1, 12, 0, 0)), "10/01/2024 - 12/01/2024");
    }

    #[test]
    fn test_relative_dates() {
        let now = at(2024, 6, 30, 12, 0);
        assert_eq!(format_relative_date(at(2024, 6, 30, 8, 0), now), "Hoje");
        assert_eq!(format_relative_date(at(2024, 6, 29, 8, 0), now), "Ontem");
        assert_eq!(format_relative_date(at(2024, 6, 26, 12, 0), now), "4 dias atrás");
        assert_eq!(format_relative_date(at(2024, 6, 20, 12, 0), now), "1 semana atrás");
        assert_eq!(format_relative_date(at(2024, 5, 1, 12, 0), now), "2 meses atrás");
        assert_eq!(format_relative_date(at(2022, 6, 1, 12, 0), now), "2 anos atrás");

        assert_eq!(format_time_ago(at(2024, 6, 30, 11, 59), now), "1 min atrás");
        assert_eq!(format_time_ago(at(2024, 6, 30, 12, 0), now), "Agora mesmo");
        assert_eq!(format_time_ago(at(2024, 6, 30, 9, 0), now), "3h atrás");
        assert_eq!(format_time_ago(at(2024, 6, 1, 9, 0), now), "01/06/2024");
    }

    #[test]
    fn test_text_helpers() {
        assert_eq!(capitalize_first("fIDELICARD"), "Fidelicard");
        assert_eq!(capitalize_words("padaria são joão"), "Padaria São João");
        assert_eq!(truncate_text("Cartão fidelidade", 10, "..."), "Cartão ...");
        assert_eq!(truncate_text("Curto", 10, "..."), "Curto");
        assert_eq!(initials("maria da silva"), "MD");
        assert_eq!(format_list(&["a", "b", "c"], "e"), "a, b e c");
        assert_eq!(format_list(&["a", "b"], "ou"), "a ou b");
        assert_eq!(format_business_hours("08:00", "18:00"), "08:00 às 18:00");
        assert_eq!(format_business_hours("", "18:00"), "Não informado");
        assert_eq!(status_label(false).label, "Inativo");
    }
}
