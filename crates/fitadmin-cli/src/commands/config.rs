use fitadmin_core::config::API_BASE_URL_ENV;
use fitadmin_core::util::normalize_base_url;

use crate::cli::ConfigCommands;
use crate::config_profiles::{
    default_config_path, normalize_text_option, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

/// Values given to `config init`; unset ones keep what the profile had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInit {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub offline_demo: Option<bool>,
    pub activate: bool,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            request_timeout_secs,
            offline_demo,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            ProfileInit {
                api_base_url,
                request_timeout_secs,
                offline_demo,
                activate: !no_activate,
            },
        ),
        ConfigCommands::Show { profile } => run_config_show(profile.as_deref().or(global_profile)),
    }
}

pub fn run_config_init(profile_name: Option<&str>, init: ProfileInit) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    apply_profile_init(&mut config, &profile_name, init, |name| {
        std::env::var(name).ok()
    })?;

    let path = default_config_path().map_err(CliError::Config)?;
    config.save_to_path(&path).map_err(CliError::Config)?;

    println!("Saved profile '{profile_name}' to {}", path.display());
    if config.active_profile.as_deref() == Some(profile_name.as_str()) {
        println!("Active profile: {profile_name}");
    }
    Ok(())
}

/// Merge `init` into the named profile: explicit flags first, then the
/// `FITADMIN_API_BASE_URL` variable, then the stored value.
pub fn apply_profile_init(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    init: ProfileInit,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), CliError> {
    let existing = config.profile(profile_name).cloned().unwrap_or_default();

    let api_base_url = normalize_text_option(init.api_base_url)
        .or_else(|| normalize_text_option(lookup(API_BASE_URL_ENV)))
        .or(existing.api_base_url)
        .map(|url| normalize_base_url(&url))
        .transpose()
        .map_err(CliError::Config)?;

    let request_timeout_secs = init.request_timeout_secs.or(existing.request_timeout_secs);
    if request_timeout_secs == Some(0) {
        return Err(CliError::Config(
            "request timeout must be greater than zero".to_string(),
        ));
    }

    *config.profile_mut_or_default(profile_name) = CliProfile {
        api_base_url,
        request_timeout_secs,
        offline_demo: init.offline_demo.or(existing.offline_demo),
    };
    if init.activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(())
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let effective = config.client_config(&profile_name)?;

    println!("# profile: {profile_name}");
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}
