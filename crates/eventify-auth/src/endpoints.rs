//! Backend paths used by the session client.

pub const IDENTITY: &str = "/api/user/profile/me";
pub const SIGN_IN: &str = "/api/auth/signin";
pub const VERIFY_OTP: &str = "/api/auth/login/verify";
pub const REFRESH: &str = "/api/auth/token/refresh";
pub const LOGOUT: &str = "/api/auth/logout";
pub const SIGN_UP: &str = "/api/auth/signup";
pub const PASSWORD_RESET_REQUEST: &str = "/api/auth/password/reset";
pub const PASSWORD_RESET_VERIFY: &str = "/api/auth/password/verify";
pub const ADMIN_CREATE_ACCOUNT: &str = "/api/auth/admin/create-account";

pub const PARTICIPANT_EVENTS: &str = "/api/participant/events/all";
pub const ORGANIZER_EVENTS: &str = "/api/event/all/me";
pub const ALL_USERS: &str = "/api/user/all";
pub const USER_ROLE: &str = "/api/user/profile/role";

pub fn profile(user_id: &str) -> String {
    format!("/api/user/profile/{user_id}")
}

pub fn profile_password(user_id: &str) -> String {
    format!("/api/user/profile/{user_id}/password")
}

pub fn delete_user(user_id: &str) -> String {
    format!("/api/user/delete/{user_id}")
}
