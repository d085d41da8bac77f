use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clausewise_client::{AnalysisType, RiskLevel};

#[derive(Parser, Debug)]
#[command(
    name = "clausewise",
    version,
    about = "Upload contracts, track processing, and review clause-level risk"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// API base URL
    #[arg(long, global = true, env = "CLAUSEWISE_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "CLAUSEWISE_API_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Where the session is persisted
    #[arg(long, global = true, env = "CLAUSEWISE_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the API is reachable
    Health,
    /// Create an account and log in
    Register(CredentialArgs),
    /// Log in and persist the session
    Login(CredentialArgs),
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage documents
    Docs(DocsArgs),
    /// Manage analysis playbooks
    Playbooks(PlaybooksArgs),
    /// Submit an analysis job for a document
    Analyze(AnalyzeArgs),
    /// Show the status of an analysis job
    Job(JobArgs),
    /// Show analysis statistics across all documents
    Stats,
}

#[derive(Args, Debug)]
pub struct CredentialArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "CLAUSEWISE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct DocsArgs {
    #[command(subcommand)]
    pub cmd: DocsSub,
}

#[derive(Subcommand, Debug)]
pub enum DocsSub {
    /// List uploaded documents
    List,
    /// Show one document
    Show(DocumentIdArg),
    /// Upload a PDF, DOC or DOCX file (max 10 MB)
    Upload(UploadArgs),
    /// Poll the processing status of a document
    Status(StatusArgs),
    /// Show the clause analysis of a processed document
    Analysis(AnalysisArgs),
    /// Delete a document and its analysis
    Delete(DocumentIdArg),
}

#[derive(Args, Debug)]
pub struct DocumentIdArg {
    /// Document id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Document id
    pub id: String,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct WaitArgs {
    /// Keep polling until processing is complete or failed
    #[arg(long)]
    pub wait: bool,

    /// Seconds between polls
    #[arg(long, default_value_t = 2)]
    pub interval: u64,

    /// Give up after this many polls
    #[arg(long, default_value_t = 150)]
    pub max_polls: u32,
}

#[derive(Args, Debug)]
pub struct AnalysisArgs {
    /// Document id
    pub id: String,

    /// Only list clauses at or above this risk level
    #[arg(long, value_parser = parse_risk_level)]
    pub min_risk: Option<RiskLevel>,
}

#[derive(Args, Debug)]
pub struct PlaybooksArgs {
    #[command(subcommand)]
    pub cmd: PlaybooksSub,
}

#[derive(Subcommand, Debug)]
pub enum PlaybooksSub {
    /// List playbooks
    List,
    /// Show one playbook
    Show(PlaybookIdArg),
    /// Create a playbook
    Create(PlaybookCreateArgs),
    /// Update a playbook
    Update(PlaybookUpdateArgs),
    /// Delete a playbook
    Delete(PlaybookIdArg),
}

#[derive(Args, Debug)]
pub struct PlaybookIdArg {
    /// Playbook id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct PlaybookCreateArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    /// JSON file holding the rules object
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PlaybookUpdateArgs {
    /// Playbook id
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// JSON file holding the rules object
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Activate the playbook
    #[arg(long, conflicts_with = "deactivate")]
    pub activate: bool,

    /// Deactivate the playbook
    #[arg(long)]
    pub deactivate: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Document id
    pub document_id: String,

    /// Playbook to analyze against
    #[arg(long)]
    pub playbook: Option<String>,

    /// comprehensive, quick or focused
    #[arg(long = "type", default_value = "comprehensive", value_parser = parse_analysis_type)]
    pub analysis_type: AnalysisType,

    /// Poll the job until it finishes
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct JobArgs {
    /// Job id
    pub job_id: String,
}

fn parse_risk_level(s: &str) -> Result<RiskLevel, String> {
    s.parse()
}

fn parse_analysis_type(s: &str) -> Result<AnalysisType, String> {
    s.parse()
}
