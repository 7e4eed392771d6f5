use std::env;

use rememberly_core::config::{SUMMARIZER_URL_ENV, SUPABASE_ANON_KEY_ENV, SUPABASE_URL_ENV};
use rememberly_core::util::normalize_text_option;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config_profiles::{default_config_path, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            summarizer_url,
            no_activate,
        } => run_config_init(
            global_profile,
            InitValues {
                supabase_url,
                supabase_anon_key,
                summarizer_url,
            },
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

/// Values passed to `config init`; empty ones fall back to env, then to the
/// existing profile.
#[derive(Debug, Default)]
pub struct InitValues {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub summarizer_url: Option<String>,
}

fn run_config_init(
    profile_name: Option<&str>,
    values: InitValues,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let profile = merge_profile(&mut config, &profile_name, values, |name| env::var(name).ok())?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing_fields = missing_fields(&profile);
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Run `rememberly auth login --email <email> --password <password>`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }
    Ok(())
}

/// Fold `values` into the named profile and validate the result.
pub fn merge_profile(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    values: InitValues,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CliProfile, CliError> {
    let existing = config.profile(profile_name).cloned().unwrap_or_default();

    let merged = CliProfile {
        supabase_url: normalize_text_option(values.supabase_url)
            .or_else(|| normalize_text_option(env(SUPABASE_URL_ENV)))
            .or_else(|| existing.supabase_url()),
        supabase_anon_key: normalize_text_option(values.supabase_anon_key)
            .or_else(|| normalize_text_option(env(SUPABASE_ANON_KEY_ENV)))
            .or_else(|| existing.supabase_anon_key()),
        summarizer_url: normalize_text_option(values.summarizer_url)
            .or_else(|| normalize_text_option(env(SUMMARIZER_URL_ENV)))
            .or_else(|| existing.summarizer_url()),
    };

    if merged.supabase_url.is_some() && merged.supabase_anon_key.is_some() {
        merged.client_config_with(|_| None)?;
    } else if let Some(url) = merged.supabase_url.as_deref() {
        if !rememberly_core::util::is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }

    *config.profile_mut_or_default(profile_name) = merged.clone();
    Ok(merged)
}

fn missing_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.supabase_url().is_none() {
        missing.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing.push("supabase_anon_key");
    }
    missing
}

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    config_path: String,
    profile: &'a str,
    active: bool,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    summarizer_url: Option<String>,
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    let path = default_config_path().map_err(CliError::Config)?;

    let view = ProfileView {
        config_path: path.display().to_string(),
        profile: &profile_name,
        active: config.active_profile.as_deref() == Some(profile_name.as_str()),
        supabase_url: profile.supabase_url(),
        supabase_anon_key: profile.supabase_anon_key().map(|key| mask_secret(&key)),
        summarizer_url: profile.summarizer_url(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Keep the first and last four characters of a key.
pub fn mask_secret(value: &str) -> String {
    let chars = value.chars().collect::<Vec<_>>();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head = chars[..4].iter().collect::<String>();
    let tail = chars[chars.len() - 4..].iter().collect::<String>();
    format!("{head}...{tail}")
}
