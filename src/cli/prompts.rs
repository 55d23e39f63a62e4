//! Interactive prompts used by the menu when no subcommand is given.

use super::{LoginArgs, RegisterArgs};
use crate::error::Result;
use dialoguer::{theme::ColorfulTheme, Input, Password};

fn prompt_email() -> Result<String> {
    let email = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Email")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Email must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(email)
}

fn prompt_password(confirm: bool) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

pub fn prompt_register() -> Result<RegisterArgs> {
    let username = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Username")
        .interact_text()?;
    Ok(RegisterArgs {
        username,
        email: prompt_email()?,
        password: prompt_password(true)?,
    })
}

pub fn prompt_login() -> Result<LoginArgs> {
    Ok(LoginArgs {
        email: prompt_email()?,
        password: prompt_password(false)?,
    })
}
