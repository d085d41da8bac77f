use crate::cli::context::App;
use crate::cli::output::print_json;
use crate::exit_codes::{COMMAND_FAILED, SUCCESS};

pub async fn run(app: &App) -> anyhow::Result<i32> {
    let health = app.api.health().await?;

    if app.json {
        print_json(&health)?;
    } else {
        match &health.service {
            Some(service) => println!("{}: {}", service, health.status),
            None => println!("{}", health.status),
        }
    }

    Ok(if health.is_healthy() {
        SUCCESS
    } else {
        COMMAND_FAILED
    })
}
