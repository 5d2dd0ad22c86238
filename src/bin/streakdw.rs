use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "streakdw", about = "Contribution streak tracker")]
struct Cli {
    /// Database path (default: ~/.streakdw/streakdw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch contributions and update the stored streak
    Sync {
        /// Username or profile URL (default: the `identity` config key)
        identity: Option<String>,
        /// Sync even if already attempted today
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored streak and last sync result
    Status {
        /// Username or profile URL (default: the `identity` config key)
        identity: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compute streaks from a local contribution payload file
    Compute {
        /// Path to a JSON payload
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

const CONFIG_KEYS: &[&str] = &["identity", "primary_url", "fallback_url", "timeout_secs"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Compute { file, json } => {
            handle_compute(&file, json)?;
        }
        Commands::Config { action } => {
            let db = open_db(cli.db.as_deref()).await?;
            handle_config(&db, action).await?;
        }
        Commands::Sync {
            identity,
            force,
            json,
        } => {
            let db = open_db(cli.db.as_deref()).await?;
            let dw = streakdw::StreakDW::from_config(db).await?;
            let identity = dw.identity(identity.as_deref()).await?;
            let outcome = dw.sync(&identity, force).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let state = dw.state(&identity).await?;
                print_outcome(&identity, &outcome, state.as_ref());
            }
        }
        Commands::Status { identity, json } => {
            let db = open_db(cli.db.as_deref()).await?;
            let dw = streakdw::StreakDW::from_config(db).await?;
            let identity = dw.identity(identity.as_deref()).await?;
            let state = dw.state(&identity).await?;
            if json {
                match &state {
                    Some(state) => println!("{}", serde_json::to_string_pretty(state)?),
                    None => {
                        let outcome = dw
                            .outcome_on(&identity, streakdw::CalendarDay::today_utc())
                            .await?;
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    }
                }
            } else {
                let outcome = dw
                    .outcome_on(&identity, streakdw::CalendarDay::today_utc())
                    .await?;
                print_outcome(&identity, &outcome, state.as_ref());
                if state.is_none() {
                    println!("  Profile: {}", streakdw::url::profile_url(&identity));
                }
            }
        }
    }

    Ok(())
}

async fn open_db(path: Option<&str>) -> anyhow::Result<streakdw::Database> {
    Ok(match path {
        Some(path) => streakdw::Database::open_at(path).await?,
        None => streakdw::Database::open().await?,
    })
}

fn handle_compute(file: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;
    let days = streakdw::normalize(&payload);
    let record = streakdw::compute_streaks(&days);

    if json {
        let out = serde_json::json!({
            "active_days": days.len(),
            "first_active_date": days.first(),
            "streak": record,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Active days: {}", days.len());
        print_record(&record);
    }
    Ok(())
}

async fn handle_config(db: &streakdw::Database, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let val: Option<String> = db
                .reader()
                .call({
                    let key = key.clone();
                    move |conn| streakdw::storage::repository::get_config(conn, &key)
                })
                .await?;
            match val {
                Some(v) => println!("{key} = {v}"),
                None => println!("{key} is not set"),
            }
        }
        ConfigAction::Set { key, value } => {
            if !CONFIG_KEYS.contains(&key.as_str()) {
                log::warn!("Unknown config key '{key}' (known: {})", CONFIG_KEYS.join(", "));
            }
            db.writer()
                .call(move |conn| {
                    streakdw::storage::repository::set_config(conn, &key, &value)?;
                    Ok::<(), rusqlite::Error>(())
                })
                .await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items: Vec<(String, String)> = db
                .reader()
                .call(|conn| streakdw::storage::repository::list_config(conn))
                .await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

fn print_outcome(
    identity: &str,
    outcome: &streakdw::SyncOutcome,
    state: Option<&streakdw::SyncState>,
) {
    println!("Sync: {identity} ({})", outcome.attempted_on);
    match &outcome.status {
        streakdw::SyncStatus::Synced(record) => {
            println!("  Status:  synced");
            print_record(record);
            if !record.is_active_on(outcome.attempted_on) {
                if let Some(gap) = record.days_since_active(outcome.attempted_on) {
                    println!("  Note:    last activity was {gap} days ago");
                }
            }
        }
        streakdw::SyncStatus::Error { message } => {
            println!("  Status:  error contacting sources");
            println!("  Error:   {message}");
            if let Some(state) = state {
                println!("  Stored streak:");
                print_record(&state.streak);
            }
        }
        streakdw::SyncStatus::Pending => {
            println!("  Status:  not synced yet");
        }
    }
}

fn print_record(record: &streakdw::StreakRecord) {
    println!("  Current: {} day(s)", record.current);
    println!("  Longest: {} day(s)", record.longest);
    println!(
        "  Last active: {}",
        record
            .last_active_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "never".to_string())
    );
}
