//! Open a role dashboard through the route guard.

use crate::context::AppContext;
use crate::navigator::TerminalNavigator;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use eventify_auth::{
    DashboardPage, GuardOutcome, MountHandle, OrganizerDashboard, ParticipantDashboard,
    ProtectedPage, Role, RouteGuard, SuperAdminDashboard,
};

pub async fn dashboard(
    ctx: &AppContext,
    role: Role,
    page: u32,
    search: String,
    format: &OutputFormat,
) -> Result<()> {
    match role {
        Role::Participant => open(ctx, &ParticipantDashboard { page, search }, format).await,
        Role::Organizer => open(ctx, &OrganizerDashboard { page, search }, format).await,
        Role::SuperAdmin => open(ctx, &SuperAdminDashboard { page, search }, format).await,
    }
}

async fn open<P>(ctx: &AppContext, page: &P, format: &OutputFormat) -> Result<()>
where
    P: ProtectedPage<Data = DashboardPage>,
{
    let navigator = TerminalNavigator::new(*format);
    let mut guard = RouteGuard::for_page(ctx.session.clone(), page);

    match guard.mount(page, &navigator, &MountHandle::new()).await? {
        GuardOutcome::Rendered { identity, data } => match format {
            OutputFormat::Text => {
                output::print_heading(page.required_role().dashboard_path());
                output::print_row("User", &identity.email);
                if let Some(pagination) = data.pagination {
                    output::print_row(
                        "Page",
                        &format!("{} of {}", pagination.current_page, pagination.total_pages),
                    );
                    output::print_row("Total", &pagination.total_items.to_string());
                }
                for item in &data.items {
                    let label = item
                        .get("title")
                        .or_else(|| item.get("fullName"))
                        .or_else(|| item.get("name"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("(untitled)");
                    let id = item.get("id").and_then(|v| v.as_str()).unwrap_or("-");
                    println!("  {:<28} {}", id, label);
                }
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "user": identity,
                    "items": data.items,
                    "pagination": data.pagination.map(|p| serde_json::json!({
                        "totalItems": p.total_items,
                        "totalPages": p.total_pages,
                        "currentPage": p.current_page,
                        "perPage": p.per_page,
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        },
        GuardOutcome::Redirected { to } => {
            output::print_error(
                &format!(
                    "Access to {} denied; redirected to {}",
                    page.required_role().dashboard_path(),
                    to
                ),
                format,
            );
        }
        GuardOutcome::Unmounted => {}
    }
    Ok(())
}
