//! Authentication commands.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use finwatch_auth::{Role, UserProfile};
use std::io::{self, Write};
use tracing::info;

/// Login with email and password, prompting for whatever was not passed.
pub async fn login(ctx: &Context, email: Option<String>, password: Option<String>) -> Result<()> {
    let status = ctx.gateway().status();
    if status.authenticated && !status.expired {
        if let Some(profile) = &status.profile {
            output::print_success(&format!("Already logged in as {}", profile.email), &ctx.format);
            return Ok(());
        }
    }

    let email = match email {
        Some(email) => email,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut email = String::new();
            io::stdin().read_line(&mut email)?;
            email
        }
    };
    let email = email.trim().to_string();
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    let profile = ctx.gateway().login(&email, &password).await?;
    info!(user_id = %profile.id, "Login complete");

    match ctx.format {
        OutputFormat::Text => {
            println!("Logged in as {} ({})", profile.display_name(), profile.role)
        }
        OutputFormat::Json => output::print_json(&profile)?,
    }

    Ok(())
}

/// Logout and clear the local session.
pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.gateway().logout().await;
    output::print_success("Logged out successfully", &ctx.format);
    Ok(())
}

/// Show the locally stored session without contacting the backend.
pub async fn status(ctx: &Context) -> Result<()> {
    let snapshot = ctx.gateway().status();

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading("Session");
            output::print_row("API", &ctx.config.api_url);
            output::print_row(
                "Credentials",
                &ctx.paths.credentials_file().display().to_string(),
            );
            output::print_row(
                "Logged in",
                if snapshot.authenticated { "yes" } else { "no" },
            );
            if let Some(expires_at) = snapshot.token_expires_at {
                let suffix = if snapshot.expired {
                    " (expired, refreshed on next request)"
                } else {
                    ""
                };
                output::print_row("Token expires", &format!("{}{}", expires_at, suffix));
            }
            if let Some(profile) = &snapshot.profile {
                print_profile(profile);
            }
        }
        OutputFormat::Json => output::print_json(&snapshot)?,
    }

    Ok(())
}

/// Fetch the current profile from the backend, optionally enforcing a
/// minimum role.
pub async fn whoami(ctx: &Context, require: Option<Role>) -> Result<()> {
    let profile = ctx.gateway().fetch_profile().await?;

    if let Some(role) = require {
        ctx.gateway().require_role(role)?;
    }

    match ctx.format {
        OutputFormat::Text => {
            output::print_heading("Profile");
            print_profile(&profile);
        }
        OutputFormat::Json => output::print_json(&profile)?,
    }

    Ok(())
}

fn print_profile(profile: &UserProfile) {
    output::print_row("User ID", &profile.id);
    output::print_row("Email", &profile.email);
    output::print_row("Name", profile.display_name());
    output::print_row("Role", profile.role.as_str());
}
