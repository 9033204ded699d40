// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{BufRead, Write};

use fm_client::api::endpoints;
use fm_client::{ApiError, FallbackApi};
use serde_json::Value;
use tracing::info;

use super::Session;
use crate::error::{Error, Result};

/// Token and display name from a login response.
pub(crate) fn parse_login_response(body: &Value) -> Result<(String, Option<String>)> {
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::LoginFailed("response has no token".to_string()))?;
    let username = body
        .pointer("/user/username")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok((token.to_string(), username))
}

/// Reads the password from the first line of `input`.
pub(crate) fn read_password(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(Error::EmptyInput("password".to_string()));
    }
    Ok(password)
}

pub async fn login(session: &Session, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            eprint!("password for {username}: ");
            std::io::stderr().flush()?;
            read_password(&mut std::io::stdin().lock())?
        }
    };

    let body = session
        .api()
        .call(endpoints::login(username, &password))
        .await
        .map_err(|e| match e {
            ApiError::Unauthorized => Error::LoginFailed("invalid username or password".into()),
            ApiError::Status { message, .. } => Error::LoginFailed(message),
            other => Error::Api(other),
        })?;
    let (token, display_name) = parse_login_response(&body)?;
    session.credentials.set_token(Some(token))?;

    let name = display_name.as_deref().unwrap_or(username);
    info!(username = name, "logged in");
    println!("Logged in as {name}");
    Ok(())
}

pub fn logout(session: &Session) -> Result<()> {
    session.credentials.set_token(None)?;
    println!("Logged out");
    Ok(())
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
