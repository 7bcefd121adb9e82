use fitadmin_core::auth::{token_expiry, AdminAuthClient, AuthContext};

use crate::auth::{credential_store, restore_auth};
use crate::cli::AuthCommands;
use crate::commands::common::format_timestamp;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    match command {
        AuthCommands::Login {
            profile,
            login,
            password,
        } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let client_config = config.client_config(&profile_name)?;
            let auth = AuthContext::new(credential_store(&profile_name)?);
            let client = AdminAuthClient::new(
                &client_config.api_base_url,
                client_config.request_timeout(),
            )?;
            client.login(&login, &password, &auth).await?;
            println!(
                "Signed in profile '{profile_name}' at {}",
                client_config.api_base_url
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let auth = restore_auth(&profile_name)?;
            println!("{}", describe_status(&profile_name, &auth));
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let client_config = config.client_config(&profile_name)?;
            let auth = restore_auth(&profile_name)?;
            AdminAuthClient::new(
                &client_config.api_base_url,
                client_config.request_timeout(),
            )?
            .logout(&auth);
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}

/// One line on whether `auth` holds a usable token. An expired token is
/// discarded by the check.
pub fn describe_status(profile_name: &str, auth: &AuthContext) -> String {
    let Ok(token) = auth.bearer_token() else {
        return format!("Profile '{profile_name}' is not signed in.");
    };
    token_expiry(&token).map_or_else(
        || format!("Profile '{profile_name}' is signed in (no expiry claim)"),
        |expires_at| {
            format!(
                "Profile '{profile_name}' is signed in until {}",
                format_timestamp(expires_at)
            )
        },
    )
}
