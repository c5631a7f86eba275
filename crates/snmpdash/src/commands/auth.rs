//! `snmpdash auth`: session endpoints.

use dialoguer::Password;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use snmpdash_core::{Monitor, SignUpRequest};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::with_profile;

#[derive(Serialize)]
struct SessionReport {
    username: Option<String>,
    authenticated: bool,
}

#[derive(Serialize)]
struct AddressReport {
    ip_address: String,
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Sign in with the profile's credentials, if it has any.
async fn sign_in_if_configured(monitor: &Monitor, profile_name: &str) -> Result<bool, CliError> {
    let Some(ref creds) = monitor.config().credentials else {
        return Ok(false);
    };
    monitor
        .client()
        .sign_in(&creds.username, &creds.password)
        .await
        .map_err(|e| with_profile(e.into(), profile_name))?;
    Ok(true)
}

fn print_session(report: &SessionReport, global: &GlobalOpts) {
    let out = output::render_single(
        &global.output,
        report,
        |r| match (&r.username, r.authenticated) {
            (Some(user), true) => format!("Authenticated as {user}"),
            (None, true) => "Authenticated".into(),
            (_, false) => "Not authenticated".into(),
        },
        |r| format!("authenticated={}", r.authenticated),
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    monitor: &Monitor,
    args: AuthArgs,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let username = monitor.config().credentials.as_ref().map(|c| c.username.clone());

    match args.command {
        AuthCommand::Signin => {
            if !sign_in_if_configured(monitor, profile_name).await? {
                return Err(CliError::NoUsername {
                    command: "auth signin".into(),
                });
            }
            let authenticated = monitor.client().check_auth().await;
            print_session(
                &SessionReport {
                    username,
                    authenticated,
                },
                global,
            );
            Ok(())
        }

        AuthCommand::Signup { username, email } => {
            let password = match std::env::var("SNMPDASH_PASSWORD") {
                Ok(pw) => SecretString::from(pw),
                Err(_) => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords do not match")
                    .interact()
                    .map(SecretString::from)
                    .map_err(prompt_err)?,
            };
            let request = SignUpRequest {
                username,
                email,
                password: password.expose_secret().to_owned(),
            };
            let response = monitor
                .client()
                .sign_up(&request)
                .await
                .map_err(|e| with_profile(e.into(), profile_name))?;

            let out = output::render_single(
                &global.output,
                &response,
                |v| match v {
                    serde_json::Value::Null => format!("Registered {}", request.username),
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                |_| request.username.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Signout => {
            sign_in_if_configured(monitor, profile_name).await?;
            monitor
                .client()
                .sign_out()
                .await
                .map_err(|e| with_profile(e.into(), profile_name))?;
            if !global.quiet {
                eprintln!("✓ Signed out");
            }
            Ok(())
        }

        AuthCommand::Check => {
            if let Err(e) = sign_in_if_configured(monitor, profile_name).await {
                tracing::warn!(error = %e, "sign-in failed; checking anonymous session");
            }
            let authenticated = monitor.client().check_auth().await;
            print_session(
                &SessionReport {
                    username: username.filter(|_| authenticated),
                    authenticated,
                },
                global,
            );
            Ok(())
        }

        AuthCommand::Ip => {
            let ip_address = monitor
                .client()
                .ip_address()
                .await
                .map_err(|e| with_profile(e.into(), profile_name))?;
            let report = AddressReport { ip_address };
            let out = output::render_single(
                &global.output,
                &report,
                |r| r.ip_address.clone(),
                |r| r.ip_address.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
