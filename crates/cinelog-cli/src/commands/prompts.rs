use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Input, Password};

/// Loose shape check; the server has the final say on addresses
pub fn check_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') => Ok(()),
        _ => Err(format!("'{}' is not an email address", email)),
    }
}

pub fn check_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().any(char::is_whitespace) {
        return Err("Username cannot contain spaces".to_string());
    }
    Ok(())
}

pub fn check_review_text(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        Err("Review text cannot be empty".to_string())
    } else {
        Ok(())
    }
}

pub fn prompt_email() -> Result<String> {
    let email: String = Input::new()
        .with_prompt("Email")
        .validate_with(|input: &String| check_email(input))
        .interact_text()
        .map_err(|e| eyre!("Failed to read email: {}", e))?;
    Ok(email.trim().to_string())
}

pub fn prompt_username() -> Result<String> {
    let username: String = Input::new()
        .with_prompt("Username")
        .validate_with(|input: &String| check_username(input))
        .interact_text()
        .map_err(|e| eyre!("Failed to read username: {}", e))?;
    Ok(username.trim().to_string())
}

pub fn prompt_password() -> Result<String> {
    Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| eyre!("Failed to read password: {}", e))
}

/// New account password, typed twice
pub fn prompt_new_password() -> Result<String> {
    Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| eyre!("Failed to read password: {}", e))
}

pub fn prompt_review_text(movie_id: &str, rating: u8) -> Result<String> {
    Input::new()
        .with_prompt(format!("Review for {} ({}/5)", movie_id, rating))
        .validate_with(|input: &String| check_review_text(input))
        .interact_text()
        .map_err(|e| eyre!("Failed to read review: {}", e))
}

pub fn confirm_review_delete(review_id: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("Delete review {}?", review_id))
        .default(false)
        .interact()
        .map_err(|e| eyre!("Failed to read confirmation: {}", e))
}
