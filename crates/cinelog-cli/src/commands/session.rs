use super::{prompts, AppContext};
use crate::output::Output;
use cinelog_api::{AuthSession, HttpCatalogApi};
use cinelog_models::User;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use tracing::info;

pub async fn run_login(mut context: AppContext, email: Option<String>, output: &Output) -> Result<()> {
    let email = match email {
        Some(email) => {
            prompts::check_email(&email).map_err(|e| eyre!(e))?;
            email.trim().to_string()
        }
        None => prompts::prompt_email()?,
    };
    let password = prompts::prompt_password()?;

    let mut api = HttpCatalogApi::new(&context.config.api);
    let session = api
        .login(&email, &password)
        .await
        .map_err(|e| eyre!("Login failed: {}", e))?;

    store_session(&mut context, &session)?;
    output.success(format!("Logged in as {}", session.user.username.bold()));
    Ok(())
}

pub async fn run_register(
    mut context: AppContext,
    username: Option<String>,
    email: Option<String>,
    output: &Output,
) -> Result<()> {
    let username = match username {
        Some(username) => {
            prompts::check_username(&username).map_err(|e| eyre!(e))?;
            username.trim().to_string()
        }
        None => prompts::prompt_username()?,
    };
    let email = match email {
        Some(email) => {
            prompts::check_email(&email).map_err(|e| eyre!(e))?;
            email.trim().to_string()
        }
        None => prompts::prompt_email()?,
    };
    let password = prompts::prompt_new_password()?;

    let mut api = HttpCatalogApi::new(&context.config.api);
    let session = api
        .register(&username, &email, &password)
        .await
        .map_err(|e| eyre!("Registration failed: {}", e))?;

    store_session(&mut context, &session)?;
    output.success(format!("Account created, logged in as {}", session.user.username.bold()));
    Ok(())
}

pub fn run_logout(mut context: AppContext, output: &Output) -> Result<()> {
    if context.credentials.get_session_token().is_none() {
        output.info("Not logged in");
        return Ok(());
    }
    context.credentials.clear_session();
    context
        .credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    info!("Stored session cleared");
    output.success("Logged out");
    Ok(())
}

pub async fn run_whoami(context: AppContext, output: &Output) -> Result<()> {
    let store = context.authenticated_store().await?;
    let snapshot = store.get_snapshot();
    let user = snapshot
        .session
        .user
        .as_ref()
        .ok_or_else(|| eyre!("Session has no user"))?;

    output.render(|| user_table(user, &context), user);
    Ok(())
}

fn store_session(context: &mut AppContext, session: &AuthSession) -> Result<()> {
    context.credentials.set_session_token(session.token.clone());
    context.credentials.set_username(session.user.username.clone());
    context
        .credentials
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))
}

fn user_table(user: &User, context: &AppContext) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Account").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new(""),
    ]);
    table.add_row(vec![Cell::new("Username"), Cell::new(&user.username)]);
    table.add_row(vec![Cell::new("User ID"), Cell::new(&user.id)]);
    if let Some(email) = &user.email {
        table.add_row(vec![Cell::new("Email"), Cell::new(email)]);
    }
    if let Some(joined) = user.join_date {
        table.add_row(vec![Cell::new("Joined"), Cell::new(joined.format("%Y-%m-%d").to_string())]);
    }
    if let Some(created) = context.credentials.get_session_created() {
        table.add_row(vec![
            Cell::new("Session since"),
            Cell::new(created.format("%Y-%m-%d %H:%M UTC").to_string()),
        ]);
    }
    table
}
