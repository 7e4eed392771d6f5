use rememberly_core::auth::SignUpOutcome;

use crate::auth::{clear_stored_session, load_stored_session};
use crate::cli::AuthCommands;
use crate::commands::common::{load_profile, open_workspace};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Signup { email, password } => {
            let workspace = open_workspace(profile)?;
            let outcome = workspace
                .auth
                .sign_up(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            match outcome {
                SignUpOutcome::SignedIn(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!(
                        "Created account and signed in profile '{}' as {email_label}",
                        workspace.profile_name
                    );
                }
                SignUpOutcome::ConfirmationRequired => {
                    println!(
                        "Account created. Check {} for a confirmation link, then run `rememberly auth login`.",
                        email.trim()
                    );
                }
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let workspace = open_workspace(profile)?;
            let session = workspace
                .auth
                .sign_in(&email, &password)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let email_label = session.user.email.as_deref().unwrap_or("(no email)");
            println!(
                "Signed in profile '{}' as {email_label}",
                workspace.profile_name
            );
            Ok(())
        }
        AuthCommands::Status => {
            let workspace = open_workspace(profile)?;
            let user = workspace
                .auth
                .current_user()
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;

            match (user, load_stored_session(&workspace.profile_name)) {
                (Some(user), Ok(Some(session))) => {
                    let email_label = user.email.as_deref().unwrap_or("(no email)");
                    println!(
                        "Profile '{}' is signed in as {} (expires_at={})",
                        workspace.profile_name, email_label, session.expires_at
                    );
                }
                (None, Ok(Some(_))) => {
                    println!(
                        "Profile '{}' has a stored session but the server could not verify it.",
                        workspace.profile_name
                    );
                }
                (_, Err(error)) => return Err(CliError::Auth(error.to_string())),
                _ => println!("Profile '{}' is not signed in.", workspace.profile_name),
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let workspace = match open_workspace(profile) {
                Ok(workspace) => workspace,
                Err(CliError::Core(error)) => {
                    tracing::warn!("Clearing session without contacting server: {}", error);
                    let (profile_name, _) = load_profile(profile)?;
                    clear_stored_session(&profile_name)
                        .map_err(|error| CliError::Auth(error.to_string()))?;
                    println!("Signed out profile '{profile_name}'");
                    return Ok(());
                }
                Err(error) => return Err(error),
            };

            workspace.context.scheduler().cancel_all().await;
            let stored_session = load_stored_session(&workspace.profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;
            let signed_out_remotely = match stored_session {
                Some(session) => match workspace.auth.sign_out(&session.access_token).await {
                    Ok(()) => true,
                    Err(error) => {
                        tracing::warn!("Server sign-out failed, clearing local session: {}", error);
                        false
                    }
                },
                None => false,
            };
            if !signed_out_remotely {
                clear_stored_session(&workspace.profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            }
            workspace.context.dispose().await;

            println!("Signed out profile '{}'", workspace.profile_name);
            Ok(())
        }
    }
}
