//! Config subcommand handlers.

use dialoguer::{Input, Password, Select};

use snmpdash_config::{Config, Profile, config_path, load_config_or_default, save_config, store_password};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("must be {expected}"),
    })
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Hide plaintext passwords before printing a config.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    cfg
}

const VALID_KEYS: &str = "api_base, ws_url, username, password_env, heartbeat_ms, \
                          reconnect_delay_ms, insecure, timeout, ca_cert";

/// Apply one `config set` assignment to a profile.
fn set_field(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_base" | "api-base" => profile.api_base = value,
        "ws_url" | "ws-url" => profile.ws_url = value,
        "username" => profile.username = Some(value),
        "password_env" | "password-env" => profile.password_env = Some(value),
        "heartbeat_ms" | "heartbeat-ms" => {
            profile.heartbeat_ms = parse_field(key, &value, "a number (milliseconds)")?;
        }
        "reconnect_delay_ms" | "reconnect-delay-ms" => {
            let delay: u64 = parse_field(key, &value, "a number (milliseconds)")?;
            if delay == 0 {
                return Err(CliError::Validation {
                    field: key.into(),
                    reason: "must be greater than zero".into(),
                });
            }
            profile.reconnect_delay_ms = delay;
        }
        "insecure" => profile.insecure = Some(parse_field(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_field(key, &value, "a number (seconds)")?),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("error: {e}")),
                |_| config_path().display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = load_config_or_default();
            let profile_name = active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            set_field(profile, &key, value)?;

            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = load_config_or_default();
            let profile_name = active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(profile_name, &cfg));
            }

            let password = Password::new()
                .with_prompt(format!("Password for '{profile_name}'"))
                .interact()
                .map_err(prompt_err)?;
            store_password(&profile_name, &password)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: snmpdash config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let path = config_path();
    eprintln!("snmpdash configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let defaults = Profile::default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let api_base: String = Input::new()
        .with_prompt("REST API base URL")
        .default(defaults.api_base.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let ws_url: String = Input::new()
        .with_prompt("Push channel WebSocket URL")
        .default(defaults.ws_url.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("Username (leave empty for anonymous)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile {
        api_base,
        ws_url,
        ..defaults
    };

    if !username.is_empty() {
        let password = Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(prompt_err)?;

        let store_choices = &[
            "Store password in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let store_selection = Select::new()
            .with_prompt("Where to store the password?")
            .items(store_choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;

        if store_selection == 0 {
            store_password(&profile_name, &password)?;
            eprintln!("   ✓ Password stored in system keyring");
        } else {
            profile.password = Some(password);
        }
        profile.username = Some(username);
    }

    let mut cfg = load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: snmpdash snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_known_fields() {
        let mut profile = Profile::default();
        set_field(&mut profile, "ws-url", "wss://lab/ws".into()).unwrap();
        set_field(&mut profile, "heartbeat_ms", "10000".into()).unwrap();
        set_field(&mut profile, "insecure", "true".into()).unwrap();
        assert_eq!(profile.ws_url, "wss://lab/ws");
        assert_eq!(profile.heartbeat_ms, 10_000);
        assert_eq!(profile.insecure, Some(true));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut profile = Profile::default();
        assert!(set_field(&mut profile, "timeout", "soon".into()).is_err());
        assert!(set_field(&mut profile, "reconnect_delay_ms", "0".into()).is_err());
        let err = set_field(&mut profile, "colour", "red".into()).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn show_hides_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["lab"].password.as_deref(), Some("********"));
    }
}
