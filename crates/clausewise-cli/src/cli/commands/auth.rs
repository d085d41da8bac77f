use std::time::Duration;

use clausewise_client::{AuthPhase, UserProfile};
use dialoguer::Password;

use crate::cli::args::CredentialArgs;
use crate::cli::context::App;
use crate::cli::output::{print_json, timestamp};
use crate::exit_codes::{SUCCESS, UNAUTHORIZED};

const SERVER_LOGOUT_GRACE: Duration = Duration::from_secs(5);

pub async fn register(app: &App, args: CredentialArgs) -> anyhow::Result<i32> {
    let password = resolve_password(args.password, true)?;
    let user = app.auth.register(&args.email, &password).await?;
    print_user(app, &user)?;
    Ok(SUCCESS)
}

pub async fn login(app: &App, args: CredentialArgs) -> anyhow::Result<i32> {
    let password = resolve_password(args.password, false)?;
    let user = app.auth.login(&args.email, &password).await?;
    print_user(app, &user)?;
    Ok(SUCCESS)
}

pub async fn logout(app: &App) -> anyhow::Result<i32> {
    if let Some(pending) = app.auth.logout() {
        // Local teardown is already done; give the server call a moment
        // before the process exits.
        let _ = tokio::time::timeout(SERVER_LOGOUT_GRACE, pending).await;
    }
    Ok(SUCCESS)
}

pub async fn whoami(app: &App) -> anyhow::Result<i32> {
    if !app.auth.is_authenticated() {
        eprintln!("Not logged in. Run `clausewise login` to sign in.");
        return Ok(UNAUTHORIZED);
    }

    match (app.auth.check_auth().await, app.auth.user()) {
        (AuthPhase::Authenticated, Some(user)) => {
            print_user(app, &user)?;
            Ok(SUCCESS)
        }
        _ => {
            eprintln!("Not logged in. Run `clausewise login` to sign in.");
            Ok(UNAUTHORIZED)
        }
    }
}

fn print_user(app: &App, user: &UserProfile) -> anyhow::Result<()> {
    if app.json {
        return print_json(user);
    }
    println!("email:   {}", user.email);
    println!("id:      {}", user.id);
    println!("active:  {}", user.is_active.map_or("-".to_string(), |a| a.to_string()));
    println!("created: {}", timestamp(user.created_at.as_ref()));
    Ok(())
}

fn resolve_password(given: Option<String>, confirm: bool) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}
