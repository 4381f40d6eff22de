//! Account commands that work without a session.

use super::{prompt_password, value_or_prompt};
use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use eventify_auth::{Role, SignUp};

fn new_password() -> Result<String> {
    let password = prompt_password("New password")?;
    let confirmation = prompt_password("Repeat password")?;
    if password != confirmation {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

/// Register a participant or organizer account.
pub async fn signup(
    ctx: &AppContext,
    name: Option<String>,
    email: Option<String>,
    role: Role,
    format: &OutputFormat,
) -> Result<()> {
    let full_name = value_or_prompt(name, "Full name")?;
    let email = value_or_prompt(email, "Email")?;
    let password = new_password()?;

    ctx.session
        .sign_up(&SignUp {
            full_name,
            email: email.clone(),
            password,
            role,
        })
        .await?;

    output::print_success(
        &format!("Account created for {}. Run 'eventify login' to sign in", email),
        format,
    );
    Ok(())
}

/// Email a password reset link.
pub async fn forgot_password(ctx: &AppContext, email: Option<String>, format: &OutputFormat) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;
    ctx.session.forgot_password(&email).await?;
    output::print_success(&format!("A reset link was sent to {}", email), format);
    Ok(())
}

/// Set a new password with the token from the reset link.
pub async fn reset_password(ctx: &AppContext, token: String, format: &OutputFormat) -> Result<()> {
    let password = new_password()?;
    ctx.session.reset_password(&token, &password).await?;
    output::print_success("Password updated. Run 'eventify login' to sign in", format);
    Ok(())
}
