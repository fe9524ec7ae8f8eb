use std::path::Path;

use nook_core::config;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config_profiles::{
    default_config_path, trimmed_non_empty, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

/// Values passed to `nook config init`
#[derive(Debug, Clone, Default)]
pub struct ProfileInit {
    pub api_base_url: Option<String>,
    pub user_id: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sync_dir: Option<String>,
    pub activate: bool,
}

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    active: bool,
    path: String,
    #[serde(flatten)]
    profile: &'a CliProfile,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let path = default_config_path();
    match command {
        ConfigCommands::Init {
            api_base_url,
            user_id,
            timeout_secs,
            sync_dir,
            no_activate,
        } => run_config_init(
            &path,
            global_profile,
            ProfileInit {
                api_base_url,
                user_id,
                timeout_secs,
                sync_dir: sync_dir.map(|dir| dir.display().to_string()),
                activate: !no_activate,
            },
        ),
        ConfigCommands::Show => run_config_show(&path, global_profile),
    }
}

pub fn run_config_init(
    path: &Path,
    profile_name: Option<&str>,
    init: ProfileInit,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load_from_path(path).map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    apply_profile_init(&mut config, &profile_name, init)?;
    config.save_to_path(path).map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let ready = config
        .profile(&profile_name)
        .is_some_and(|profile| profile.api_base_url.is_some() || profile.sync_dir.is_some());
    if !ready {
        println!(
            "Profile '{profile_name}' has no api_base_url or sync_dir; notes stay local until one is set."
        );
    }
    Ok(())
}

/// Merge `init` into the named profile. Fields left unset keep their value.
pub fn apply_profile_init(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    init: ProfileInit,
) -> Result<(), CliError> {
    let api_base_url = trimmed_non_empty(init.api_base_url.as_deref())
        .map(|url| normalize_api_base_url(&url))
        .transpose()?;
    if init.timeout_secs == Some(0) {
        return Err(CliError::Config(
            "timeout_secs must be a positive integer".to_string(),
        ));
    }

    let profile = config.profile_mut_or_default(profile_name);
    if let Some(url) = api_base_url {
        profile.api_base_url = Some(url);
    }
    if let Some(user_id) = trimmed_non_empty(init.user_id.as_deref()) {
        profile.user_id = Some(user_id);
    }
    if let Some(sync_dir) = trimmed_non_empty(init.sync_dir.as_deref()) {
        profile.sync_dir = Some(sync_dir);
    }
    if let Some(timeout_secs) = init.timeout_secs {
        profile.timeout_secs = Some(timeout_secs);
    }
    profile.ensure_guest_id();

    if init.activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

pub fn normalize_api_base_url(url: &str) -> Result<String, CliError> {
    config::normalize_api_base_url(url).map_err(|error| CliError::Config(error.to_string()))
}

fn run_config_show(path: &Path, profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load_from_path(path).map_err(CliError::Config)?;
    let name = config.resolve_profile_name(profile_name);
    let profile = config.profile(&name).cloned().unwrap_or_default();

    let view = ProfileView {
        name: &name,
        active: config.active_profile.as_deref() == Some(name.as_str()),
        path: path.display().to_string(),
        profile: &profile,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
