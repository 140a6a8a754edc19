use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use sprout_todo::config::{CliArgs, Command, Config};
use sprout_todo::error::ClientError;
use sprout_todo::host::{announce_ready, NullHost};
use sprout_todo::models::Task;
use sprout_todo::session::{Credential, CredentialStore, SessionManager};
use sprout_todo::sync::TaskSyncClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;

    // Initialize logging with the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // One process-wide session, injected into every dependent component
    let store = CredentialStore::open(&config.session_file)?;
    let session = Arc::new(SessionManager::new(&config.api_url, store)?);

    session
        .on_expired(|| {
            eprintln!("Session expired; run `sprout login` to sign in again.");
        })
        .await;

    run(args.command, &config, session).await?;
    Ok(())
}

async fn run(
    command: Command,
    config: &Config,
    session: Arc<SessionManager>,
) -> Result<(), ClientError> {
    match command {
        Command::Login { identity, secret } => {
            let secret = match secret {
                Some(secret) => secret,
                None => prompt_secret("Secret")?,
            };

            let credential = session.login(&identity, &secret).await?;
            println!("Logged in as {}.", credential.identity);

            // Fresh client bound to the new credential, then the initial load
            let client = task_client(&session, config, credential)?;
            client.load().await?;
            announce_ready(&NullHost);
            render(&client.view().await);
        }

        Command::Register { identity, secret } => {
            let (secret, confirm) = match secret {
                Some(secret) => (secret.clone(), secret),
                None => (prompt_secret("Secret")?, prompt_secret("Confirm secret")?),
            };

            session.register(&identity, &secret, &confirm).await?;
            println!("Registered {}. Run `sprout login` to sign in.", identity);
        }

        Command::Logout => {
            session.logout().await?;
            println!("Logged out.");
        }

        Command::List => {
            let client = restored_client(&session, config).await?;
            client.load().await?;
            announce_ready(&NullHost);
            render(&client.view().await);
        }

        Command::Add { name } => {
            let client = restored_client(&session, config).await?;
            client.load().await?;
            announce_ready(&NullHost);
            client.create(&name).await?;
            render(&client.view().await);
        }

        Command::Done { id } => {
            let client = restored_client(&session, config).await?;
            client.load().await?;
            announce_ready(&NullHost);
            client.set_done(&id, true).await?;
            render(&client.view().await);
        }

        Command::Undone { id } => {
            let client = restored_client(&session, config).await?;
            client.load().await?;
            announce_ready(&NullHost);
            client.set_done(&id, false).await?;
            render(&client.view().await);
        }

        Command::Rm { id, yes } => {
            let client = restored_client(&session, config).await?;
            client.load().await?;
            announce_ready(&NullHost);

            if !yes && !confirm_delete(&id)? {
                println!("Aborted.");
                return Ok(());
            }

            client.delete(&id).await?;
            render(&client.view().await);
        }
    }

    Ok(())
}

/// Build a task client from the persisted session, or fail when logged out
async fn restored_client(
    session: &Arc<SessionManager>,
    config: &Config,
) -> Result<TaskSyncClient, ClientError> {
    let credential = match session.restore().await? {
        Some(credential) => credential,
        None => {
            return Err(ClientError::Auth(
                "not logged in (run `sprout login`)".to_string(),
            ))
        }
    };

    task_client(session, config, credential)
}

fn task_client(
    session: &Arc<SessionManager>,
    config: &Config,
    credential: Credential,
) -> Result<TaskSyncClient, ClientError> {
    Ok(TaskSyncClient::new(
        Arc::clone(session),
        credential,
        &config.api_url,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?)
}

fn prompt_secret(prompt: &str) -> Result<String, ClientError> {
    let secret = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .context("Failed to read secret")?;
    Ok(secret)
}

fn confirm_delete(id: &str) -> Result<bool, ClientError> {
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(format!("Delete task {}?", id))
        .default(false)
        .interact()
        .context("Failed to read confirmation")?;
    Ok(confirmed)
}

fn render(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    for task in tasks {
        let mark = if task.done { "x" } else { " " };
        println!(
            "[{}] {:<8} {}  ({})",
            mark,
            task.id,
            task.name,
            task.created_at.format("%Y-%m-%d")
        );
    }
}
