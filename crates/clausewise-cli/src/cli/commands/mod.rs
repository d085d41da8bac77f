use clausewise_client::ClientError;

use super::args::*;
use super::context::App;
use crate::exit_codes::COMMAND_FAILED;

pub mod analysis;
pub mod auth;
pub mod documents;
pub mod health;
pub mod playbooks;

pub async fn dispatch(cli: Cli) -> i32 {
    let redirect_hint = !matches!(cli.cmd, Command::Login(_) | Command::Register(_));
    let app = match App::build(&cli.global, redirect_hint) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            return e.exit_code();
        }
    };

    let result = match cli.cmd {
        Command::Health => health::run(&app).await,
        Command::Register(args) => auth::register(&app, args).await,
        Command::Login(args) => auth::login(&app, args).await,
        Command::Logout => auth::logout(&app).await,
        Command::Whoami => auth::whoami(&app).await,
        Command::Docs(args) => match args.cmd {
            DocsSub::List => documents::list(&app).await,
            DocsSub::Show(a) => documents::show(&app, a).await,
            DocsSub::Upload(a) => documents::upload(&app, a).await,
            DocsSub::Status(a) => documents::status(&app, a).await,
            DocsSub::Analysis(a) => documents::analysis(&app, a).await,
            DocsSub::Delete(a) => documents::delete(&app, a).await,
        },
        Command::Playbooks(args) => match args.cmd {
            PlaybooksSub::List => playbooks::list(&app).await,
            PlaybooksSub::Show(a) => playbooks::show(&app, a).await,
            PlaybooksSub::Create(a) => playbooks::create(&app, a).await,
            PlaybooksSub::Update(a) => playbooks::update(&app, a).await,
            PlaybooksSub::Delete(a) => playbooks::delete(&app, a).await,
        },
        Command::Analyze(args) => analysis::analyze(&app, args).await,
        Command::Job(args) => analysis::job(&app, args).await,
        Command::Stats => analysis::stats(&app).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => report(&app, e),
    }
}

/// Print a failed command's error (unless a store already did) and pick
/// the exit code.
fn report(app: &App, err: anyhow::Error) -> i32 {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) => {
            if !app.notifier.error_shown() {
                eprintln!("error: {}", client_err.user_message());
            }
            client_err.exit_code()
        }
        None => {
            eprintln!("error: {err:#}");
            COMMAND_FAILED
        }
    }
}
