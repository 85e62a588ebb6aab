//! Implementation of the `hubqueue auth` commands.

use clap::Subcommand;
use tracing::info;

use crate::{
    commands::{password, text},
    context::Context,
    error::Result,
    github::{
        GitHubClient,
        oauth::{self, ACCESS_TOKEN_URL},
    },
    palette,
};

/// Authentication subcommands.
#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Save a personal access token after checking it with GitHub.
    Login {
        /// Token to save (prompted for when omitted).
        #[arg(long = "with-token")]
        token: Option<String>,
    },
    /// Remove the saved token.
    Logout,
    /// Show the authenticated account.
    Status,
    /// Authorize through an OAuth app and save the granted token.
    Oauth {
        /// OAuth app client id.
        #[arg(long, env = "HUBQUEUE_CLIENT_ID")]
        client_id: String,
        /// OAuth app client secret.
        #[arg(long, env = "HUBQUEUE_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
    },
}

/// Execute an auth subcommand.
pub async fn run(ctx: &mut Context, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::Login { token } => login(ctx, token).await,
        AuthCommand::Logout => logout(ctx),
        AuthCommand::Status => status(ctx).await,
        AuthCommand::Oauth {
            client_id,
            client_secret,
        } => oauth_login(ctx, &client_id, &client_secret).await,
    }
}

/// Verify a token against `/user`, save it, and report the login.
async fn save_verified(ctx: &mut Context, token: &str) -> Result<()> {
    let client = GitHubClient::new(&ctx.config().api_url(), token)?;
    let user = client.current_user().await?;
    ctx.config_mut().set_token(token)?;
    info!(login = %user.login, "saved token");
    println!(
        "Logged in as {}",
        palette::fmt_name(&user.login, ctx.use_color())
    );
    Ok(())
}

/// `auth login`.
async fn login(ctx: &mut Context, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => password("GitHub personal access token:")?,
    };
    save_verified(ctx, token.trim()).await
}

/// `auth logout`.
fn logout(ctx: &mut Context) -> Result<()> {
    if ctx.config_mut().clear_token()? {
        println!("Logged out. Token removed from configuration.");
    } else {
        println!("No token found in configuration.");
    }
    Ok(())
}

/// `auth status`.
async fn status(ctx: &Context) -> Result<()> {
    let user = ctx.client()?.current_user().await?;
    let color = ctx.use_color();
    println!("Logged in as {}", palette::fmt_name(&user.login, color));
    if let Some(name) = &user.name {
        println!("{} {name}", palette::fmt_label("Name:", color));
    }
    if let Some(email) = &user.email {
        println!("{} {email}", palette::fmt_label("Email:", color));
    }
    println!(
        "{} {}",
        palette::fmt_label("Public repositories:", color),
        user.public_repos
    );
    if let Some(private) = user.total_private_repos {
        println!(
            "{} {private}",
            palette::fmt_label("Private repositories:", color)
        );
    }
    println!(
        "{} {}",
        palette::fmt_label("Profile:", color),
        palette::fmt_path(&user.html_url, color)
    );
    Ok(())
}

/// `auth oauth`.
async fn oauth_login(ctx: &mut Context, client_id: &str, client_secret: &str) -> Result<()> {
    println!("Open this URL in your browser to authorize hubqueue:");
    println!("  {}", oauth::authorize_url(client_id)?);
    let code = text("Authorization code from the redirect URL:")?;
    let token = oauth::exchange_code(ACCESS_TOKEN_URL, client_id, client_secret, &code).await?;
    save_verified(ctx, &token).await
}
