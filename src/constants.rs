pub const API_PREFIX: &str = "/api/v1";

/// Realm sent with Basic authentication challenges.
pub const AUTH_REALM: &str = "accountd";

pub mod limits {

    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    pub const MAX_PAGE_SIZE: u64 = 100;

    pub const USERNAME_MIN: usize = 4;

    pub const USERNAME_MAX: usize = 255;

    pub const PASSWORD_MIN: usize = 8;

    pub const PASSWORD_MAX: usize = 255;
}
