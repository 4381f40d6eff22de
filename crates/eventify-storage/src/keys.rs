//! Storage key constants.

/// Storage keys used by the session client
pub struct StorageKeys;

impl StorageKeys {
    /// Last known identity (JSON, advisory only)
    pub const AUTH_STORAGE: &'static str = "auth-storage";

    /// Email that requested an OTP and has not verified it yet
    pub const OTP_EMAIL: &'static str = "otp_email";

    /// Session cookies replayed into the HTTP client's jar on startup
    pub const SAVED_COOKIES: &'static str = "saved_cookies";
}
