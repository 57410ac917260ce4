use anyhow::Context;
use clap::{Parser, Subcommand};
use huddle_config::load as load_config;
use huddle_database::{seed::seed_default_users, UserId, UserRepository};
use huddle_gateway::{build_router, GatewayState};
use huddle_runtime::{telemetry, BackendServices};
use sqlx::Row;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "huddle-server")]
#[command(about = "Huddle messaging backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server
    Serve,
    /// Insert the default test users
    SeedUsers,
    /// Issue a session token for an existing user
    IssueToken {
        /// Id of the user the token authenticates
        user_id: String,
    },
    /// Dump conversations, members and messages from the database
    DumpData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::SeedUsers => seed_users().await,
        Commands::IssueToken { user_id } => issue_token(user_id).await,
        Commands::DumpData => dump_data().await,
    }
}

async fn bootstrap() -> anyhow::Result<(huddle_config::AppConfig, BackendServices)> {
    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    Ok((config, services))
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Huddle backend");

    let (config, services) = bootstrap().await?;

    let state = GatewayState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        services.responder(),
        &config,
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(huddle_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_users() -> anyhow::Result<()> {
    let (_, services) = bootstrap().await?;

    let users = seed_default_users(&UserRepository::new(services.db_pool.clone()))
        .await
        .context("failed to seed users")?;

    println!("Seeded {} users:", users.len());
    for user in users {
        println!("  {:<10} {}", user.id, user.display_name);
    }
    println!("Run 'issue-token <user_id>' to get a session token");

    Ok(())
}

async fn issue_token(user_id: String) -> anyhow::Result<()> {
    let (_, services) = bootstrap().await?;

    let session = services
        .authenticator
        .issue_session(&UserId::from(user_id.clone()))
        .await
        .with_context(|| format!("failed to issue a token for {user_id}"))?;

    println!("{}", session.token);
    info!(user_id = %session.user_id, expires_at = %session.expires_at, "session issued");

    Ok(())
}

async fn dump_data() -> anyhow::Result<()> {
    let (_, services) = bootstrap().await?;

    println!("=== CONVERSATIONS ===");
    let conversations = sqlx::query(
        r#"
        SELECT id, kind, name, created_at
        FROM conversations
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch conversations")?;

    if conversations.is_empty() {
        println!("No conversations found in database");
    } else {
        println!("Found {} conversations:", conversations.len());
        println!(
            "{:<26} {:<10} {:<30} {:<30}",
            "ID", "Kind", "Name", "Created At"
        );
        println!("{}", "-".repeat(100));

        for conversation in conversations {
            let id: String = conversation.get("id");
            let kind: String = conversation.get("kind");
            let name: Option<String> = conversation.get("name");
            let created_at: String = conversation.get("created_at");

            println!(
                "{:<26} {:<10} {:<30} {:<30}",
                id,
                kind,
                name.as_deref().unwrap_or("NULL"),
                created_at
            );
        }
    }

    println!("\n=== MEMBERS ===");
    let members = sqlx::query(
        r#"
        SELECT conversation_id, user_id, joined_at
        FROM conversation_members
        ORDER BY conversation_id, joined_at ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch conversation members")?;

    if members.is_empty() {
        println!("No members found in database");
    } else {
        println!("Found {} memberships:", members.len());
        println!("{:<26} {:<16} {:<30}", "Conversation", "User", "Joined At");
        println!("{}", "-".repeat(75));

        for member in members {
            let conversation_id: String = member.get("conversation_id");
            let user_id: String = member.get("user_id");
            let joined_at: String = member.get("joined_at");

            println!("{:<26} {:<16} {:<30}", conversation_id, user_id, joined_at);
        }
    }

    println!("\n=== MESSAGES ===");
    let messages = sqlx::query(
        r#"
        SELECT id, conversation_id, sender_id, is_assistant, body, created_at
        FROM messages
        ORDER BY conversation_id, id ASC
        "#,
    )
    .fetch_all(&services.db_pool)
    .await
    .context("failed to fetch messages")?;

    if messages.is_empty() {
        println!("No messages found in database");
    } else {
        println!("Found {} messages:", messages.len());
        println!(
            "{:<6} {:<26} {:<16} {:<50} {:<30}",
            "ID", "Conversation", "Sender", "Body (truncated)", "Created At"
        );
        println!("{}", "-".repeat(130));

        for message in messages {
            let id: i64 = message.get("id");
            let conversation_id: String = message.get("conversation_id");
            let sender_id: Option<String> = message.get("sender_id");
            let is_assistant: bool = message.get("is_assistant");
            let body: String = message.get("body");
            let created_at: String = message.get("created_at");

            let sender = if is_assistant {
                "<assistant>".to_string()
            } else {
                sender_id.unwrap_or_else(|| "NULL".to_string())
            };
            let body_display = if body.chars().count() > 47 {
                format!("{}...", body.chars().take(44).collect::<String>())
            } else {
                body
            };

            println!(
                "{:<6} {:<26} {:<16} {:<50} {:<30}",
                id, conversation_id, sender, body_display, created_at
            );
        }
    }

    Ok(())
}
