//! Message catalog for user-facing strings.
//!
//! Every message that can reach a response body is a [`Message`] key and is
//! only turned into text once the caller's [`Locale`] is known.

use axum::http::{HeaderMap, header::ACCEPT_LANGUAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl Locale {
    /// Picks the locale from the first language tag of an `Accept-Language` value.
    #[must_use]
    pub fn from_accept_language(value: &str) -> Self {
        let primary = value
            .split(',')
            .next()
            .and_then(|tag| tag.split(';').next())
            .and_then(|tag| tag.trim().split(['-', '_']).next())
            .unwrap_or_default();

        if primary.eq_ignore_ascii_case("tr") {
            Self::Tr
        } else {
            Self::En
        }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Self::from_accept_language)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    UserCreated,
    UserActivated,
    ActivationResent,

    ValidationFailed,
    EmailInUse,
    NotificationFailed,
    InvalidToken,
    UserNotFound,
    AuthenticationRequired,
    Forbidden,
    Unexpected,
    MalformedRequest,

    UsernameBlank,
    UsernameSize,
    EmailBlank,
    EmailInvalid,
    PasswordBlank,
    PasswordSize,
    PasswordPattern,
    PageSizeOutOfRange,
    PageOutOfRange,
    IdNotNumeric,
}

impl Message {
    #[must_use]
    pub const fn resolve(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en(),
            Locale::Tr => self.tr(),
        }
    }

    const fn en(self) -> &'static str {
        match self {
            Self::UserCreated => "User is created",
            Self::UserActivated => "Account is activated",
            Self::ActivationResent => {
                "If a pending account exists for this address, an activation email has been sent"
            }
            Self::ValidationFailed => "Validation error",
            Self::EmailInUse => "E-mail in use",
            Self::NotificationFailed => "Failed to send activation email",
            Self::InvalidToken => "Activation token is invalid",
            Self::UserNotFound => "User not found",
            Self::AuthenticationRequired => "Authentication required",
            Self::Forbidden => "You are not allowed to modify this user",
            Self::Unexpected => "An unexpected error occurred",
            Self::MalformedRequest => "Request could not be read",
            Self::UsernameBlank => "Username cannot be blank",
            Self::UsernameSize => "Username must be between 4 and 255 characters",
            Self::EmailBlank => "E-mail cannot be blank",
            Self::EmailInvalid => "E-mail is not valid",
            Self::PasswordBlank => "Password cannot be blank",
            Self::PasswordSize => "Password must be between 8 and 255 characters",
            Self::PasswordPattern => {
                "Password must have at least 1 uppercase letter, 1 lowercase letter and 1 number"
            }
            Self::PageSizeOutOfRange => "Page size must be between 1 and 100",
            Self::PageOutOfRange => "Page number is too large",
            Self::IdNotNumeric => "User id must be a number",
        }
    }

    const fn tr(self) -> &'static str {
        match self {
            Self::UserCreated => "Kullanıcı oluşturuldu",
            Self::UserActivated => "Hesap aktifleştirildi",
            Self::ActivationResent => {
                "Bu adrese ait bekleyen bir hesap varsa aktivasyon e-postası gönderildi"
            }
            Self::ValidationFailed => "Doğrulama hatası",
            Self::EmailInUse => "E-posta kullanımda",
            Self::NotificationFailed => "Aktivasyon e-postası gönderilemedi",
            Self::InvalidToken => "Aktivasyon kodu geçersiz",
            Self::UserNotFound => "Kullanıcı bulunamadı",
            Self::AuthenticationRequired => "Kimlik doğrulaması gerekli",
            Self::Forbidden => "Bu kullanıcıyı değiştirme yetkiniz yok",
            Self::Unexpected => "Beklenmeyen bir hata oluştu",
            Self::MalformedRequest => "İstek okunamadı",
            Self::UsernameBlank => "Kullanıcı adı boş olamaz",
            Self::UsernameSize => "Kullanıcı adı 4 ile 255 karakter arasında olmalı",
            Self::EmailBlank => "E-posta boş olamaz",
            Self::EmailInvalid => "E-posta geçerli değil",
            Self::PasswordBlank => "Şifre boş olamaz",
            Self::PasswordSize => "Şifre 8 ile 255 karakter arasında olmalı",
            Self::PasswordPattern => "Şifre en az 1 büyük harf, 1 küçük harf ve 1 rakam içermeli",
            Self::PageSizeOutOfRange => "Sayfa boyutu 1 ile 100 arasında olmalı",
            Self::PageOutOfRange => "Sayfa numarası çok büyük",
            Self::IdNotNumeric => "Kullanıcı kimliği sayı olmalı",
        }
    }
}
