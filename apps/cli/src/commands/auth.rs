//! Authentication commands.

use super::{prompt_password, value_or_prompt};
use crate::context::AppContext;
use crate::navigator::TerminalNavigator;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use eventify_auth::Identity;

fn print_identity(identity: &Identity, format: &OutputFormat, destination: Option<&str>) {
    output::print(identity, format, |identity| {
        output::print_heading("Signed in");
        output::print_row("Name", &identity.full_name);
        output::print_row("Email", &identity.email);
        output::print_row("Role", identity.role.as_str());
        if let Some(path) = destination {
            output::print_row("Dashboard", path);
        }
    });
}

/// Sign in with email and password, then the emailed OTP.
pub async fn login(ctx: &AppContext, email: Option<String>, format: &OutputFormat) -> Result<()> {
    if let Some(identity) = ctx.session.fetch_identity().await {
        output::print_success(&format!("Already logged in as {}", identity.email), format);
        return Ok(());
    }

    let email = value_or_prompt(email, "Email")?;
    let password = prompt_password("Password")?;

    ctx.session.sign_in(&email, &password).await?;
    output::print_success(&format!("An OTP was sent to {}", email), format);

    verify_otp(ctx, None, format).await
}

/// Finish a sign-in started with `login`.
pub async fn verify_otp(ctx: &AppContext, otp: Option<String>, format: &OutputFormat) -> Result<()> {
    let Some(email) = ctx.session.pending_otp_email()? else {
        output::print_error("No sign-in is waiting for an OTP. Run 'eventify login' first", format);
        return Ok(());
    };

    let otp = value_or_prompt(otp, &format!("OTP for {}", email))?;
    let identity = ctx.session.verify_otp(&otp).await?;

    let navigator = TerminalNavigator::new(*format);
    let destination = ctx.session.redirect_by_role(&navigator);
    print_identity(&identity, format, destination);
    Ok(())
}

/// Log out. Local state is cleared even if the server cannot be reached.
pub async fn logout(ctx: &AppContext, format: &OutputFormat) -> Result<()> {
    ctx.session.clear().await;
    ctx.forget_session();
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Show who the current session belongs to.
pub async fn status(ctx: &AppContext, format: &OutputFormat) -> Result<()> {
    let identity = ctx.session.fetch_identity().await;
    let hint = ctx.session.persisted_hint();

    match format {
        OutputFormat::Text => {
            println!("API:      {}", ctx.config.api_base_url);
            match &identity {
                Some(identity) => {
                    println!("Auth:     logged in");
                    println!("User ID:  {}", identity.id);
                    println!("Email:    {}", identity.email);
                    println!("Role:     {}", identity.role);
                }
                None => {
                    println!("Auth:     not logged in");
                    if let Some(hint) = &hint {
                        println!("Last:     {} ({})", hint.email, hint.role);
                    }
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "api_base_url": ctx.config.api_base_url,
                "logged_in": identity.is_some(),
                "user": identity,
                "last_user": hint,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
