//! CLI for access control administration
//!
//! Issues API keys and evaluates policies against the live directory.
//! Outputs JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prereview_core::common::auth::{Credential, Policy, Principal, RequestContext, RequestState};
use prereview_core::config::Config;
use prereview_core::kernel::PgDirectory;
use prereview_core::server::build_evaluator;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "access_cli")]
#[command(about = "Access control administration for PREreview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered policies
    Policies,

    /// Issue (or rotate) an API key for a user
    IssueKey {
        user_id: String,
        #[arg(long)]
        app: String,
    },

    /// Evaluate a policy for a user against a request path
    Check {
        policy: String,
        path: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        orcid: String,
    },
}

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    policies: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed: Option<bool>,
}

impl Response {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
            policies: None,
            secret: None,
            allowed: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            ..Self::ok()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let response = match run(cli.command).await {
        Ok(response) => response,
        Err(e) => Response::error(format!("{:#}", e)),
    };

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize response: {}", e),
    }

    if !response.success {
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<Response> {
    match command {
        Commands::Policies => Ok(Response {
            policies: Some(Policy::ALL.iter().map(Policy::name).collect()),
            ..Response::ok()
        }),
        Commands::IssueKey { user_id, app } => {
            let (_, directory) = connect().await?;
            let secret = Uuid::new_v4().simple().to_string();
            directory.issue_api_key(&user_id, &app, &secret).await?;
            Ok(Response {
                message: Some(format!("Issued key for app '{}'", app)),
                secret: Some(secret),
                ..Response::ok()
            })
        }
        Commands::Check {
            policy,
            path,
            user_id,
            orcid,
        } => {
            let (config, directory) = connect().await?;
            let evaluator = build_evaluator(directory, config.admin_users);
            let ctx = RequestContext::new(
                Credential::Session(Principal::new(user_id, orcid)),
                RequestState::from_path(&path),
            );
            let allowed = evaluator.evaluate_named(&policy, &ctx).await?;
            Ok(Response {
                allowed: Some(allowed),
                ..Response::ok()
            })
        }
    }
}

async fn connect() -> Result<(Config, Arc<PgDirectory>)> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    Ok((config, Arc::new(PgDirectory::new(pool))))
}
