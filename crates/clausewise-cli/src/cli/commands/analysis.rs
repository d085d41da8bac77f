use std::collections::BTreeMap;
use std::time::Duration;

use clausewise_client::{AnalysisRequest, JobState, JobStatus, ResourceId};

use crate::cli::args::{AnalyzeArgs, JobArgs};
use crate::cli::context::App;
use crate::cli::output::print_json;
use crate::exit_codes::{COMMAND_FAILED, SUCCESS};

const JOB_POLL_INTERVAL: Duration = Duration::from_secs(2);
const JOB_MAX_POLLS: u32 = 300;

pub async fn analyze(app: &App, args: AnalyzeArgs) -> anyhow::Result<i32> {
    let request = AnalysisRequest {
        document_id: ResourceId::from(args.document_id),
        playbook_id: args.playbook.map(ResourceId::from),
        analysis_type: args.analysis_type,
    };
    let ack = app.api.submit_analysis(&request).await?;

    if !args.wait {
        if app.json {
            print_json(&ack)?;
        } else {
            println!("{}", ack.job_id);
        }
        return Ok(SUCCESS);
    }

    if !app.json {
        eprintln!("Submitted job {}", ack.job_id);
    }
    let mut polls = 0;
    let status = loop {
        let status = app.api.job_status(&ack.job_id).await?;
        polls += 1;
        if status.state.is_finished() || polls >= JOB_MAX_POLLS {
            break status;
        }
        if !app.json {
            eprint!("\r{:>3}% {}", status.progress, status.status);
        }
        tokio::time::sleep(JOB_POLL_INTERVAL).await;
    };
    if !app.json {
        eprintln!();
    }

    render_job(app, &status)?;
    Ok(job_exit_code(&status.state))
}

pub async fn job(app: &App, args: JobArgs) -> anyhow::Result<i32> {
    let status = app.api.job_status(&args.job_id).await?;
    render_job(app, &status)?;
    Ok(SUCCESS)
}

pub async fn stats(app: &App) -> anyhow::Result<i32> {
    let stats = app.api.statistics().await?;

    if app.json {
        print_json(&stats)?;
        return Ok(SUCCESS);
    }

    println!("Documents:          {}", stats.summary.total_documents);
    println!("Clauses:            {}", stats.summary.total_clauses);
    println!("Average risk score: {:.2}", stats.summary.average_risk_score);
    print_counts("Document status", &stats.document_status);
    print_counts("Risk distribution", &stats.risk_distribution);
    print_counts("Categories", &stats.category_breakdown);
    Ok(SUCCESS)
}

fn render_job(app: &App, status: &JobStatus) -> anyhow::Result<()> {
    if app.json {
        return print_json(status);
    }

    println!(
        "{}: {} ({}%)",
        status.job_id,
        String::from(status.state.clone()),
        status.progress
    );
    if !status.status.is_empty() {
        println!("  {}", status.status);
    }
    if let Some(error) = &status.error {
        println!("  error: {error}");
    }
    Ok(())
}

fn print_counts(title: &str, counts: &BTreeMap<String, u64>) {
    if counts.is_empty() {
        return;
    }
    println!("\n{title}:");
    for (key, count) in counts {
        println!("  {key:<20} {count}");
    }
}

fn job_exit_code(state: &JobState) -> i32 {
    match state {
        JobState::Success => SUCCESS,
        _ => COMMAND_FAILED,
    }
}
