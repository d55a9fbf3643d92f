use std::sync::Arc;

use clap::{Parser, Subcommand};
use deskboard::config::ClientConfig;
use deskboard::controllers::ai_panel::{AiPanelController, AiPanelInputs};
use deskboard::controllers::participants::{MutationOutcome, ParticipantsController, ParticipantsView};
use deskboard::error::ClientError;
use deskboard::net::api::{DeskApi, HttpDeskApi};
use deskboard::net::types::Role;
use deskboard::state::session::SessionContext;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("recommendation failed: {0}")]
    JobFailed(String),
    #[error("participant update not applied ({outcome:?}): {message}")]
    Mutation { outcome: MutationOutcome, message: String },
    #[error("{0}")]
    Participants(String),
}

#[derive(Parser, Debug)]
#[command(name = "deskboard", about = "Headless desk client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Request an AI recommendation for a task and wait for the result.
    Recommend {
        #[arg(long, env = "DESK_ID")]
        desk_id: String,
        #[arg(long, env = "TASK_ID")]
        task_id: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_delimiter = ',')]
        stack: Vec<String>,
        #[arg(long)]
        context_time_ms: Option<i64>,
    },
    /// List desk participants.
    Participants {
        #[arg(long, env = "DESK_ID")]
        desk_id: String,
    },
    /// Change a participant's role.
    SetRole {
        #[arg(long, env = "DESK_ID")]
        desk_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        role: Role,
    },
    /// Remove a participant from the desk.
    Remove {
        #[arg(long, env = "DESK_ID")]
        desk_id: String,
        #[arg(long)]
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let api: Arc<dyn DeskApi> = Arc::new(HttpDeskApi::from_config(&config)?);
    tracing::info!(base_url = %config.api_base_url, "desk client configured");

    match cli.command {
        Command::Recommend { desk_id, task_id, description, stack, context_time_ms } => {
            let inputs = AiPanelInputs { desk_id, task_id, description, stack, context_time_ms };
            run_recommend(api, &config, inputs).await
        }
        Command::Participants { desk_id } => {
            let ctrl = ParticipantsController::new(api, SessionContext::new(), config.participants);
            ctrl.load(&desk_id).await;
            print_participants(&ctrl.snapshot())
        }
        Command::SetRole { desk_id, user_id, role } => {
            let ctrl = participants_for(api, &config, &desk_id).await?;
            let outcome = ctrl.change_role(&user_id, role).await;
            report(&ctrl, outcome)
        }
        Command::Remove { desk_id, user_id } => {
            let ctrl = participants_for(api, &config, &desk_id).await?;
            let outcome = ctrl.remove(&user_id).await;
            report(&ctrl, outcome)
        }
    }
}

async fn run_recommend(api: Arc<dyn DeskApi>, config: &ClientConfig, inputs: AiPanelInputs) -> Result<(), CliError> {
    let mut panel = AiPanelController::new(api, config.ai_panel);
    let mut rx = panel.subscribe();
    panel.set_inputs(inputs, true);

    while let Some(job) = rx.recv().await {
        tracing::info!(state = job.label(), "recommendation job transition");
        if let Some(recommendation) = job.result() {
            println!("{}", recommendation.text);
            return Ok(());
        }
        if let Some(message) = job.error_message() {
            return Err(CliError::JobFailed(message.to_owned()));
        }
    }
    Ok(())
}

async fn participants_for(
    api: Arc<dyn DeskApi>,
    config: &ClientConfig,
    desk_id: &str,
) -> Result<ParticipantsController, ClientError> {
    let session = SessionContext::new();
    session.login(api.fetch_current_user().await?);
    let ctrl = ParticipantsController::new(api, session, config.participants);
    ctrl.load(desk_id).await;
    Ok(ctrl)
}

fn report(ctrl: &ParticipantsController, outcome: MutationOutcome) -> Result<(), CliError> {
    let view = ctrl.snapshot();
    match outcome {
        MutationOutcome::Applied | MutationOutcome::Unchanged => {
            tracing::info!(?outcome, "participant mutation settled");
            print_participants(&view)
        }
        MutationOutcome::Busy | MutationOutcome::Rejected | MutationOutcome::RolledBack => {
            let message = view.error.unwrap_or_else(|| "another update is in progress".to_owned());
            tracing::error!(?outcome, %message, "participant mutation failed");
            Err(CliError::Mutation { outcome, message })
        }
    }
}

fn print_participants(view: &ParticipantsView) -> Result<(), CliError> {
    if let Some(message) = &view.error {
        return Err(CliError::Participants(message.clone()));
    }
    for p in view.participants.items() {
        println!("{}\t{}\t{}", p.id, p.role, p.name);
    }
    Ok(())
}
