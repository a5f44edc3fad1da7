//! Config subcommand handlers.

use dialoguer::{Confirm, Input};
use william_api::{DEFAULT_ADMIN_BASE_URL, DEFAULT_USER_BASE_URL};
use william_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
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

fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# unable to render config: {e}"))
}

fn prompt_url(prompt: &str, default: &str) -> Result<String, CliError> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_owned())
        .validate_with(|input: &String| -> Result<(), String> {
            url::Url::parse(input.trim())
                .map(|_| ())
                .map_err(|e| format!("invalid URL: {e}"))
        })
        .interact_text()
        .map_err(prompt_err)?;
    Ok(raw.trim().to_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("william: configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let admin_url = prompt_url("Admin service URL", DEFAULT_ADMIN_BASE_URL)?;
            let user_url = prompt_url("Public service URL", DEFAULT_USER_BASE_URL)?;

            let email: String = Input::new()
                .with_prompt("Your email (sent as X-Email, blank to skip)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let proxied = Confirm::new()
                .with_prompt("Is the identity injected by an authenticating proxy?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            let profile = Profile {
                admin_url: Some(admin_url),
                user_url: Some(user_url),
                email: Some(email.trim().to_owned()).filter(|e| !e.is_empty()),
                require_identity: proxied.then_some(false),
                ..Profile::default()
            };

            // Keep other profiles from an existing file.
            let mut cfg = config::load_config_or_default();
            if cfg.profiles.insert(profile_name.clone(), profile).is_some() {
                eprintln!("   Replacing existing profile '{profile_name}'");
            }
            cfg.default_profile = Some(profile_name.clone());

            let written = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", written.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: william interfaces list");

            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}
