//! Input validation for portal forms
//!
//! Brazilian document/contact formats (WhatsApp, CEP, CNPJ) plus the password
//! policies used by the login and password-change screens.

use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap())
}

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap())
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+[^\s]*$").unwrap())
}

/// Keep only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// WhatsApp numbers carry the area code: 10 or 11 digits.
pub fn validate_whatsapp(whatsapp: &str) -> bool {
    matches!(digits_only(whatsapp).len(), 10 | 11)
}

pub fn clean_whatsapp(whatsapp: &str) -> String {
    digits_only(whatsapp)
}

pub fn validate_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn validate_cep(cep: &str) -> bool {
    digits_only(cep).len() == 8
}

/// Length-only check; check digits are verified by the registry, not here.
pub fn validate_cnpj(cnpj: &str) -> bool {
    digits_only(cnpj).len() == 14
}

pub fn validate_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

pub fn validate_url(url: &str) -> bool {
    url_pattern().is_match(url)
}

/// `HH:MM`, 24-hour clock.
pub fn validate_time(time: &str) -> bool {
    time_pattern().is_match(time)
}

/// Password policy for account passwords
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 50,
            require_lowercase: true,
            require_uppercase: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    /// Stricter policy applied on the password-change screen.
    pub fn password_change() -> Self {
        Self {
            min_length: 8,
            ..Self::default()
        }
    }

    /// Validate a password, returning every violated rule.
    pub fn validate(&self, password: &str) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            errors.push(format!("Senha deve ter pelo menos {} caracteres", self.min_length));
        }

        if length > self.max_length {
            errors.push(format!("Senha deve ter no máximo {} caracteres", self.max_length));
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Senha deve conter pelo menos uma letra minúscula".to_string());
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Senha deve conter pelo menos uma letra maiúscula".to_string());
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Senha deve conter pelo menos um número".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Accepted upload types for logos, banners and card images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// 5 MiB
pub const MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;

pub fn validate_image_upload(content_type: &str, size_bytes: u64) -> Result<(), String> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err("Tipo de arquivo não permitido. Use JPG, PNG ou WebP.".to_string());
    }

    if size_bytes > MAX_IMAGE_SIZE {
        return Err("Arquivo muito grande. Máximo 5MB.".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_lengths() {
        assert!(validate_whatsapp("(11) 98765-4321"));
        assert!(validate_whatsapp("1133334444"));
        assert!(!validate_whatsapp("98765-4321"));
        assert!(!validate_whatsapp("+55 (11) 98765-4321"));
        assert_eq!(clean_whatsapp("(11) 98765-4321"), "11987654321");
    }

    #[test]
    fn test_email() {
        assert!(validate_email("user@example.com"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("user example@mail.com"));
    }

    #[test]
    fn test_documents() {
        assert!(validate_cep("01310-100"));
        assert!(!validate_cep("0131-100"));
        assert!(validate_cnpj("12.345.678/0001-90"));
        assert!(!validate_cnpj("12.345.678/0001"));
    }

    #[test]
    fn test_slug_time_url() {
        assert!(validate_slug("padaria-central"));
        assert!(!validate_slug("Padaria Central"));
        assert!(!validate_slug("padaria--central"));

        assert!(validate_time("08:30"));
        assert!(validate_time("23:59"));
        assert!(!validate_time("24:00"));

        assert!(validate_url("https://fidelicard.com.br/login"));
        assert!(!validate_url("fidelicard.com.br"));
    }

    #[test]
    fn test_password_policy_collects_all_violations() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Senha123").is_ok());

        let errors = policy.validate("abc").unwrap_err();
        assert_eq!(errors.len(), 3); // too short, no uppercase, no digit
    }

    #[test]
    fn test_password_change_policy_is_stricter() {
        assert!(PasswordPolicy::default().validate("Abc123").is_ok());
        assert!(PasswordPolicy::password_change().validate("Abc123").is_err());
        assert!(PasswordPolicy::password_change().validate("Abcd1234").is_ok());
    }

    #[test]
    fn test_image_upload() {
        assert!(validate_image_upload("image/png", 1024).is_ok());
        assert!(validate_image_upload("image/gif", 1024).is_err());
        assert!(validate_image_upload("image/webp", MAX_IMAGE_SIZE + 1).is_err());
    }
}
