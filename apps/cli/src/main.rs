//! Eventify CLI - sign in and open role dashboards from the terminal.

mod commands;
mod context;
mod navigator;
mod output;

use clap::{Parser, Subcommand};
use context::AppContext;
use eventify_auth::Role;
use eventify_config_and_utils::{init_logging, Paths};
use tracing::debug;

/// Eventify CLI - Manage your Eventify session.
#[derive(Parser)]
#[command(name = "eventify")]
#[command(about = "Eventify CLI for authentication and dashboards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Backend base URL (overrides config and EVENTIFY_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email, password and OTP
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Finish a pending sign-in with the emailed OTP
    VerifyOtp {
        /// One-time password (prompted when omitted)
        otp: Option<String>,
    },

    /// Check authentication status
    Status,

    /// Logout and clear session
    Logout,

    /// Open a role dashboard
    Dashboard {
        /// participant, organizer or super-admin
        role: Role,
        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Search filter
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Create a participant or organizer account
    Signup {
        /// Full name (prompted when omitted)
        #[arg(short, long)]
        name: Option<String>,
        /// Email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
        /// participant or organizer
        #[arg(short, long, default_value = "participant")]
        role: Role,
    },

    /// Request a password reset email
    ForgotPassword {
        /// Account email (prompted when omitted)
        email: Option<String>,
    },

    /// Set a new password with a reset token
    ResetPassword {
        /// Token from the reset link
        token: String,
    },

    /// Manage user accounts (super admin)
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
}

#[derive(Subcommand)]
enum UsersCommands {
    /// Give a user another role
    SetRole {
        /// User ID
        id: String,
        /// participant, organizer or super-admin
        role: Role,
    },

    /// Delete a user account
    Delete {
        /// User ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

async fn run(cli: Cli, paths: Paths) -> anyhow::Result<()> {
    let ctx = AppContext::load(&paths, cli.api_url)?;
    let format = cli.format;

    let result = match cli.command {
        Commands::Login { email } => commands::login(&ctx, email, &format).await,
        Commands::VerifyOtp { otp } => commands::verify_otp(&ctx, otp, &format).await,
        Commands::Status => commands::status(&ctx, &format).await,
        Commands::Logout => return commands::logout(&ctx, &format).await,
        Commands::Dashboard { role, page, search } => {
            commands::dashboard(&ctx, role, page, search, &format).await
        }
        Commands::Signup { name, email, role } => {
            commands::signup(&ctx, name, email, role, &format).await
        }
        Commands::ForgotPassword { email } => commands::forgot_password(&ctx, email, &format).await,
        Commands::ResetPassword { token } => commands::reset_password(&ctx, token, &format).await,
        Commands::Users { command } => match command {
            UsersCommands::SetRole { id, role } => commands::set_role(&ctx, id, role, &format).await,
            UsersCommands::Delete { id, yes } => commands::delete_user(&ctx, id, yes, &format).await,
        },
    };

    ctx.save_cookies();
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match Paths::new() {
        Ok(paths) => paths,
        Err(e) => {
            output::print_error(&e.to_string(), &cli.format);
            std::process::exit(1);
        }
    };

    // CLI doesn't need stderr output by default
    init_logging("cli", &cli.log_level, Some(&paths), false);
    debug!(base_dir = %paths.base_dir().display(), "Starting eventify CLI");

    let format = cli.format;
    if let Err(e) = run(cli, paths).await {
        output::print_error(&e.to_string(), &format);
        std::process::exit(1);
    }
}
