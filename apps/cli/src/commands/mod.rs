//! CLI command implementations.

mod account;
mod auth;
mod dashboard;
mod users;

pub use account::{forgot_password, reset_password, signup};
pub use auth::{login, logout, status, verify_otp};
pub use dashboard::dashboard;
pub use users::{delete as delete_user, set_role};

use anyhow::Result;
use std::io::{self, Write};

/// Read one trimmed line from stdin after showing `label`.
fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Use `value` when given, otherwise ask for it. Empty input is an error.
fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    let value = match value {
        Some(value) => value,
        None => prompt(label)?,
    };
    if value.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(value)
}

/// Read a password without echo.
fn prompt_password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(format!("{}: ", label))?;
    if password.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(password)
}
