use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use claimd::applications::ApplicationFilter;
use claimd::config::ClientOptions;
use claimd::fixture::Fixture;
use claimd::models::Recommendation;
use claimd::submission::{Attachment, BenefitApplicationForm};
use claimd::view::{ApplicationRow, DashboardView, Route};
use claimd::Claimd;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[clap(name = "claimd", version)]
#[clap(about = "Command line front end for the Claimd benefit review service", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Service base URL
    #[clap(long, env = "CLAIMD_URL", default_value = "http://localhost:8000")]
    url: String,

    /// Where the sign-in session is kept between runs
    #[clap(long, env = "CLAIMD_SESSION_PATH", default_value = ".claimd/session.json")]
    session_file: PathBuf,

    /// Never serve bundled fixture data when the service is unreachable
    #[clap(long)]
    no_fallback: bool,

    /// Offline dataset to serve instead of the bundled one
    #[clap(long, env = "CLAIMD_FIXTURE")]
    fixture: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and show the dashboard
    SignIn {
        #[clap(long)]
        name: String,
        /// Social security number, with or without dashes
        #[clap(long)]
        identifier: String,
    },
    /// Forget the stored sign-in
    SignOut,
    /// Show the signed-in identity
    Whoami,
    /// Show the applicant dashboard
    Dashboard,
    /// Show one application
    Show {
        application_id: String,
        /// Write the attached document to this file
        #[clap(long)]
        save: Option<PathBuf>,
    },
    /// List every application
    Admin {
        /// Match applicant name or application id
        #[clap(long)]
        search: Option<String>,
        /// approve, deny or further_review
        #[clap(long, value_parser = parse_recommendation)]
        recommendation: Option<Recommendation>,
    },
    /// Approve an application
    Approve { application_id: String },
    /// Deny an application
    Deny { application_id: String },
    /// Submit a benefit application described by a JSON file
    Submit {
        form: PathBuf,
        #[clap(long)]
        medical_records: Option<PathBuf>,
        #[clap(long)]
        income_documents: Option<PathBuf>,
    },
    /// Check that the service is up
    Health,
}

fn parse_recommendation(value: &str) -> Result<Recommendation, String> {
    Recommendation::parse(value).ok_or_else(|| format!("unknown recommendation: {value}"))
}

fn print_rows(rows: &[ApplicationRow]) {
    for row in rows {
        println!(
            "{:>3}. {}  {:>4}  {:<14} {}",
            row.ordinal,
            row.short_id,
            row.confidence,
            row.badge,
            row.applicant_name.as_deref().unwrap_or(&row.status)
        );
        if !row.summary.is_empty() {
            println!("     {}", row.summary);
        }
    }
}

fn print_dashboard(view: &DashboardView) {
    match view {
        DashboardView::SignedOut => println!("Not signed in. Use `claimd sign-in`."),
        DashboardView::NoApplications { identity } => {
            println!("Welcome back, {}", identity.name);
            println!("{}", DashboardView::EMPTY_MESSAGE);
        }
        DashboardView::Applications { identity, rows } => {
            println!("Welcome back, {}", identity.name);
            print_rows(rows);
        }
        DashboardView::Reviewer { identity } => {
            println!("Signed in as reviewer {}. See `claimd admin`.", identity.name);
        }
    }
}

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    let cli = Cli::parse();

    let options = ClientOptions::from_env()?
        .with_session_path(cli.session_file.clone())
        .with_fallback_to_fixture(!cli.no_fallback);
    let claimd = match &cli.fixture {
        Some(path) => {
            let fixture = Fixture::from_path(path)
                .with_context(|| format!("failed to load fixture {}", path.display()))?;
            Claimd::with_fixture(&cli.url, options, fixture)
        }
        None => Claimd::new_with_options(&cli.url, options),
    };

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });
    let dashboard = claimd.dashboard(Some(&shutdown));

    match cli.command {
        Commands::SignIn { name, identifier } => {
            let view = dashboard.sign_in(&name, &identifier).await?;
            print_dashboard(&view);
        }
        Commands::SignOut => {
            dashboard.sign_out().await?;
            println!("Signed out.");
        }
        Commands::Whoami => match claimd.session().load().await? {
            Some(identity) => println!("{} ({:?})", identity, identity.role),
            None => println!("Not signed in."),
        },
        Commands::Dashboard => {
            let view = dashboard.load().await?;
            print_dashboard(&view);
        }
        Commands::Show { application_id, save } => {
            let detail = dashboard.detail(&application_id).await?;
            println!("Application {}", detail.application_id);
            if let Some(name) = &detail.applicant_name {
                println!("Applicant:      {}", name);
            }
            println!("Identifier:     {}", detail.masked_identifier);
            println!("Confidence:     {}", detail.confidence);
            println!("Recommendation: {}", detail.recommendation.label());
            if let Some(status) = detail.admin_status {
                println!("Status:         {:?}", status);
            }
            println!("Summary:        {}", detail.summary);
            for doc in &detail.documents {
                println!("Document:       {}", doc);
            }
            match (&detail.document, save) {
                (Some(source), Some(path)) => {
                    tokio::fs::write(&path, source.decode()?)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Saved {} to {}", detail.download_name, path.display());
                }
                (Some(_), None) => println!("Document attached ({})", detail.download_name),
                (None, _) => {
                    if let Some(message) = detail.document_message() {
                        println!("{}", message);
                    }
                }
            }
        }
        Commands::Admin { search, recommendation } => {
            let mut filter = ApplicationFilter::new();
            if let Some(term) = search {
                filter = filter.with_search(&term);
            }
            if let Some(recommendation) = recommendation {
                filter = filter.with_recommendation(recommendation);
            }
            let view = dashboard.admin(&filter).await?;
            println!("{} of {} applications", view.rows.len(), view.total);
            if view.rows.is_empty() {
                println!("{}", view.empty_message());
            }
            print_rows(&view.rows);
        }
        Commands::Approve { application_id } => {
            let notice = dashboard.approve(&application_id).await?;
            println!("{}", notice.message);
            println!("Back to {}", notice.next);
        }
        Commands::Deny { application_id } => {
            let notice = dashboard.deny(&application_id).await?;
            println!("{}", notice.message);
            println!("Back to {}", notice.next);
        }
        Commands::Submit { form, medical_records, income_documents } => {
            let json = tokio::fs::read_to_string(&form)
                .await
                .with_context(|| format!("failed to read {}", form.display()))?;
            let mut form: BenefitApplicationForm = serde_json::from_str(&json)?;
            if let Some(path) = medical_records {
                form.medical_records_file = Some(Attachment::from_path(path).await?);
            }
            if let Some(path) = income_documents {
                form.income_documents_file = Some(Attachment::from_path(path).await?);
            }
            let receipt = claimd.submissions().submit(form, Some(&shutdown)).await?;
            println!("{}", receipt.message);
            if let Some(id) = receipt.application_id {
                println!("Application id: {}", id);
            }
            if let Some(eta) = receipt.estimated_processing_time {
                println!("Estimated processing time: {}", eta);
            }
            println!("Next: {}", Route::UserDashboard);
        }
        Commands::Health => {
            let health = claimd.health().await?;
            println!("{}: {}", health.status, health.message);
            if !health.is_healthy() {
                anyhow::bail!("service reported {}", health.status);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
