//! Super admin user management.

use super::prompt;
use crate::context::AppContext;
use crate::navigator::TerminalNavigator;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use eventify_auth::{GuardDecision, Role, RouteGuard};

/// Run the super admin guard. `false` means the command must stop.
async fn require_super_admin(ctx: &AppContext, format: &OutputFormat) -> Result<bool> {
    let navigator = TerminalNavigator::new(*format);
    let mut guard = RouteGuard::new(ctx.session.clone(), Role::SuperAdmin);
    match guard.check(&navigator).await? {
        GuardDecision::Authorized(_) => Ok(true),
        GuardDecision::Redirected(to) => {
            output::print_error(
                &format!("User management needs a super admin session; redirected to {}", to),
                format,
            );
            Ok(false)
        }
    }
}

/// Change another account's role.
pub async fn set_role(ctx: &AppContext, id: String, role: Role, format: &OutputFormat) -> Result<()> {
    if !require_super_admin(ctx, format).await? {
        return Ok(());
    }
    let user = ctx.session.update_user_role(&id, role).await?;
    output::print(&user, format, |user| {
        output::print_heading("Role updated");
        output::print_row("User", &user.email);
        output::print_row("Role", user.role.as_str());
    });
    Ok(())
}

/// Delete an account after confirmation.
pub async fn delete(ctx: &AppContext, id: String, yes: bool, format: &OutputFormat) -> Result<()> {
    if !require_super_admin(ctx, format).await? {
        return Ok(());
    }
    if !yes {
        let answer = prompt(&format!("Delete user {}? Type the id to confirm", id))?;
        if answer != id {
            output::print_error("Deletion cancelled", format);
            return Ok(());
        }
    }
    ctx.session.delete_user(&id).await?;
    output::print_success(&format!("User {} deleted", id), format);
    Ok(())
}
