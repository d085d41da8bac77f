use std::sync::Arc;
use std::time::Duration;

use clausewise_client::{
    DocumentAnalysis, DocumentStatus, DocumentStatusUpdate, DocumentSummary, ProgressCallback,
    ResourceId, RiskLevel, UploadCandidate,
};

use crate::cli::args::{AnalysisArgs, DocumentIdArg, StatusArgs, UploadArgs, WaitArgs};
use crate::cli::context::App;
use crate::cli::output::{file_size, print_json, timestamp, truncate};
use crate::exit_codes::{COMMAND_FAILED, SUCCESS};

pub async fn list(app: &App) -> anyhow::Result<i32> {
    let documents = app.documents.fetch_documents().await?;

    if app.json {
        print_json(&documents)?;
        return Ok(SUCCESS);
    }

    if documents.is_empty() {
        println!("No documents uploaded yet.");
        return Ok(SUCCESS);
    }

    println!(
        "{:<26} {:<32} {:<11} {:>7} {:>9}  UPLOADED",
        "ID", "NAME", "STATUS", "CLAUSES", "SIZE"
    );
    for doc in &documents {
        println!(
            "{:<26} {:<32} {:<11} {:>7} {:>9}  {}",
            doc.id,
            truncate(doc.display_name(), 32),
            doc.status,
            doc.total_clauses_found,
            file_size(doc.file_size),
            timestamp(doc.created_at.as_ref()),
        );
    }
    Ok(SUCCESS)
}

pub async fn show(app: &App, args: DocumentIdArg) -> anyhow::Result<i32> {
    let doc = app.api.get_document(&ResourceId::from(args.id)).await?;

    if app.json {
        print_json(&doc)?;
    } else {
        print_document(&doc);
    }
    Ok(SUCCESS)
}

pub async fn upload(app: &App, args: UploadArgs) -> anyhow::Result<i32> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(UploadCandidate::from_path(path).await?);
    }

    let listener = match (app.json, files.as_slice()) {
        (false, [only]) => Some(progress_printer(only.file_name.clone())),
        _ => None,
    };

    let ack = app.documents.upload_document(&files, listener).await?;

    if app.json {
        print_json(&ack)?;
    } else {
        println!("{} ({})", ack.document_id, ack.status);
    }

    if args.wait.wait {
        return settle(app, &ack.document_id, args.wait).await;
    }
    Ok(SUCCESS)
}

pub async fn status(app: &App, args: StatusArgs) -> anyhow::Result<i32> {
    let id = ResourceId::from(args.id);
    if args.wait.wait {
        return settle(app, &id, args.wait).await;
    }

    let update = app.documents.poll_document_status(&id).await?;
    print_status(app, &update)?;
    Ok(SUCCESS)
}

pub async fn analysis(app: &App, args: AnalysisArgs) -> anyhow::Result<i32> {
    let analysis = app
        .documents
        .fetch_document_analysis(&ResourceId::from(args.id))
        .await?;

    if app.json {
        print_json(&analysis)?;
    } else {
        print_analysis(&analysis, args.min_risk.unwrap_or(RiskLevel::Low));
    }
    Ok(SUCCESS)
}

pub async fn delete(app: &App, args: DocumentIdArg) -> anyhow::Result<i32> {
    let id = ResourceId::from(args.id);
    app.documents.delete_document(&id).await?;

    if app.json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    }
    Ok(SUCCESS)
}

async fn settle(app: &App, id: &ResourceId, wait: WaitArgs) -> anyhow::Result<i32> {
    let update = app
        .documents
        .wait_until_settled(id, Duration::from_secs(wait.interval), wait.max_polls)
        .await?;
    print_status(app, &update)?;

    Ok(match update.status {
        DocumentStatus::Complete => SUCCESS,
        DocumentStatus::Error => COMMAND_FAILED,
        other => {
            eprintln!(
                "Document {} is still {} after {} polls",
                id, other, wait.max_polls
            );
            COMMAND_FAILED
        }
    })
}

/// Single-line progress meter on stderr.
fn progress_printer(file_name: String) -> ProgressCallback {
    Arc::new(move |percent| {
        eprint!("\rUploading {file_name}: {percent:>3}%");
        if percent == 100 {
            eprintln!();
        }
    })
}

fn print_status(app: &App, update: &DocumentStatusUpdate) -> anyhow::Result<()> {
    if app.json {
        return print_json(update);
    }

    let mut line = format!("{}: {}", update.id, update.status);
    if let Some(progress) = update.progress {
        line.push_str(&format!(" ({progress}%)"));
    }
    if update.status == DocumentStatus::Complete {
        line.push_str(&format!(", {} clauses found", update.total_clauses_found));
    }
    println!("{line}");
    if let Some(message) = &update.error_message {
        println!("  error: {message}");
    }
    Ok(())
}

fn print_document(doc: &DocumentSummary) {
    println!("id:        {}", doc.id);
    println!("name:      {}", doc.display_name());
    println!("status:    {}", doc.status);
    println!("size:      {}", file_size(doc.file_size));
    println!("clauses:   {}", doc.total_clauses_found);
    println!("uploaded:  {}", timestamp(doc.created_at.as_ref()));
    println!(
        "processed: {}",
        timestamp(doc.processing_completed_at.as_ref())
    );
    if let Some(message) = &doc.error_message {
        println!("error:     {message}");
    }
}

fn print_analysis(analysis: &DocumentAnalysis, min_risk: RiskLevel) {
    let summary = &analysis.analysis_summary;

    println!("{} ({})", analysis.document.display_name(), analysis.document.status);
    println!(
        "Overall risk: {:.2} ({})  clauses: {}  high risk: {}",
        summary.overall_risk_score,
        summary.overall_risk_level(),
        summary.total_clauses,
        summary.high_risk_clauses(),
    );

    if !summary.risk_distribution.is_empty() {
        let parts: Vec<String> = summary
            .risk_distribution
            .iter()
            .map(|(level, count)| format!("{level}={count}"))
            .collect();
        println!("Risk distribution: {}", parts.join(" "));
    }
    if !summary.category_breakdown.is_empty() {
        let parts: Vec<String> = summary
            .category_breakdown
            .iter()
            .map(|(category, count)| format!("{category}={count}"))
            .collect();
        println!("Categories: {}", parts.join(" "));
    }
    for recommendation in &summary.recommendations {
        println!("  * {recommendation}");
    }

    let clauses: Vec<_> = analysis.clauses_at_least(min_risk).collect();
    if clauses.is_empty() {
        println!("\nNo clauses at {min_risk} risk or above.");
        return;
    }

    println!();
    for clause in clauses {
        let page = clause
            .page_number
            .map(|p| format!(" p.{p}"))
            .unwrap_or_default();
        println!(
            "[{:<8}] {:.2} {}{}: {}",
            clause.risk_level,
            clause.risk_score,
            clause.category,
            page,
            truncate(&clause.text, 80),
        );
        if let Some(advice) = &clause.recommendations {
            println!("           -> {}", truncate(advice, 80));
        }
    }
}
