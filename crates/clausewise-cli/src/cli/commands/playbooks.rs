use std::path::Path;

use anyhow::{bail, Context};
use clausewise_client::{NewPlaybook, Page, Playbook, PlaybookUpdate, ResourceId};
use serde_json::{Map, Value};

use crate::cli::args::{PlaybookCreateArgs, PlaybookIdArg, PlaybookUpdateArgs};
use crate::cli::context::App;
use crate::cli::output::{print_json, timestamp, truncate};
use crate::exit_codes::SUCCESS;

pub async fn list(app: &App) -> anyhow::Result<i32> {
    let playbooks = app.api.list_playbooks(Page::default()).await?;

    if app.json {
        print_json(&playbooks)?;
        return Ok(SUCCESS);
    }

    if playbooks.is_empty() {
        println!("No playbooks defined.");
        return Ok(SUCCESS);
    }

    println!("{:<26} {:<28} {:<8} {:<6}  DESCRIPTION", "ID", "NAME", "VERSION", "ACTIVE");
    for playbook in &playbooks {
        println!(
            "{:<26} {:<28} {:<8} {:<6}  {}",
            playbook.id,
            truncate(&playbook.name, 28),
            playbook.version.as_deref().unwrap_or("-"),
            active_label(playbook),
            truncate(playbook.description.as_deref().unwrap_or(""), 40),
        );
    }
    Ok(SUCCESS)
}

pub async fn show(app: &App, args: PlaybookIdArg) -> anyhow::Result<i32> {
    let playbook = app.api.get_playbook(&ResourceId::from(args.id)).await?;
    render(app, &playbook)?;
    Ok(SUCCESS)
}

pub async fn create(app: &App, args: PlaybookCreateArgs) -> anyhow::Result<i32> {
    let rules = match &args.rules {
        Some(path) => read_rules(path)?,
        None => Map::new(),
    };

    let playbook = app
        .api
        .create_playbook(&NewPlaybook {
            name: args.name,
            description: args.description,
            rules,
        })
        .await?;
    render(app, &playbook)?;
    Ok(SUCCESS)
}

pub async fn update(app: &App, args: PlaybookUpdateArgs) -> anyhow::Result<i32> {
    let update = PlaybookUpdate {
        name: args.name,
        description: args.description,
        rules: args.rules.as_deref().map(read_rules).transpose()?,
        is_active: match (args.activate, args.deactivate) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
    };
    if update.is_empty() {
        bail!("nothing to update: pass --name, --description, --rules, --activate or --deactivate");
    }

    let playbook = app
        .api
        .update_playbook(&ResourceId::from(args.id), &update)
        .await?;
    render(app, &playbook)?;
    Ok(SUCCESS)
}

pub async fn delete(app: &App, args: PlaybookIdArg) -> anyhow::Result<i32> {
    let id = ResourceId::from(args.id);
    app.api.delete_playbook(&id).await?;

    if app.json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    } else {
        eprintln!("Playbook {id} deleted");
    }
    Ok(SUCCESS)
}

/// Rules are free-form, but the backend expects a JSON object.
fn read_rules(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    match serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("rules file {} must contain a JSON object", path.display()),
    }
}

fn render(app: &App, playbook: &Playbook) -> anyhow::Result<()> {
    if app.json {
        return print_json(playbook);
    }
    println!("id:          {}", playbook.id);
    println!("name:        {}", playbook.name);
    println!(
        "description: {}",
        playbook.description.as_deref().unwrap_or("-")
    );
    println!("version:     {}", playbook.version.as_deref().unwrap_or("-"));
    println!("active:      {}", active_label(playbook));
    println!("created:     {}", timestamp(playbook.created_at.as_ref()));
    Ok(())
}

fn active_label(playbook: &Playbook) -> &'static str {
    match playbook.is_active {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}
