use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use resq_core::config::notification_capacity_from_env_value;
use resq_core::constants::{DEFAULT_DATA_DIR, STORE_DIR_NAME};
use resq_core::{
    AdmissionDesk, AdmissionRequest, AdmissionStatus, Decision, FileStore, KeyValueStore,
    Notification, NotificationRelay,
};
use resq_llm::{
    http_timeout_from_env_value, AdvancedTriageInput, AssessConditionInput, GeminiGateway,
    LlmConfig,
};

#[derive(Parser)]
#[command(name = "resq")]
#[command(about = "ResQ dispatch and hospital relay CLI")]
struct Cli {
    /// Data directory (defaults to RESQ_DATA_DIR, then `resq_data`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum DecisionArg {
    Accept,
    Reject,
    Divert,
}

#[derive(Subcommand)]
enum Commands {
    /// List relayed notifications, newest first
    Notifications,
    /// Publish a notification read from a JSON file
    Notify {
        /// Path to the notification JSON
        file: PathBuf,
    },
    /// Mark one notification as read
    MarkRead {
        /// Notification id
        id: String,
    },
    /// Mark every notification as read
    MarkAllRead,
    /// List admission requests, pending first
    Requests {
        /// Only requests in this state
        #[arg(long)]
        status: Option<String>,
    },
    /// Submit an admission request read from a JSON file
    SubmitRequest {
        /// Path to the admission request JSON
        file: PathBuf,
    },
    /// Accept, reject or divert a pending admission request
    Decide {
        /// Admission request id
        id: String,
        decision: DecisionArg,
        /// Required for `reject`
        #[arg(long)]
        reason: Option<String>,
    },
    /// Classify a patient's state from a field report (needs RESQ_LLM_API_KEY)
    Assess {
        /// The field report
        voice_input: String,
    },
    /// KTAS triage from a patient description (needs RESQ_LLM_API_KEY)
    Triage {
        /// Patient description
        description: String,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'resq --help' for commands");
        return Ok(());
    };

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        std::env::var("RESQ_DATA_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    });
    let (relay, desk) = open_services(&data_dir)?;

    match command {
        Commands::Notifications => {
            let notifications = relay.get_notifications();
            if notifications.is_empty() {
                println!("No notifications.");
            } else {
                for n in &notifications {
                    print_notification(n);
                }
                println!("{} unread", relay.unread_count());
            }
        }
        Commands::Notify { file } => match read_json::<Notification>(&file) {
            Ok(notification) => {
                let stored = relay.notify(notification);
                println!("Published notification: {}", stored.id);
            }
            Err(e) => eprintln!("Error reading notification: {}", e),
        },
        Commands::MarkRead { id } => {
            relay.mark_as_read(&id);
            println!("Marked {} as read ({} unread)", id, relay.unread_count());
        }
        Commands::MarkAllRead => {
            relay.mark_all_as_read();
            println!("Marked all notifications as read");
        }
        Commands::Requests { status } => {
            let filter = match status.as_deref().map(str::parse::<AdmissionStatus>).transpose() {
                Ok(filter) => filter,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(());
                }
            };
            match desk.list() {
                Ok(requests) => {
                    let requests: Vec<_> = requests
                        .into_iter()
                        .filter(|r| filter.map_or(true, |s| r.status == s))
                        .collect();
                    if requests.is_empty() {
                        println!("No admission requests found.");
                    }
                    for r in requests {
                        println!(
                            "ID: {}, Status: {}, Hospital: {}, Ambulance: {}, Condition: {}, ETA: {}",
                            r.id,
                            r.status,
                            r.hospital_id,
                            r.ambulance_id,
                            r.assessed_condition,
                            r.eta_to_hospital
                        );
                    }
                }
                Err(e) => eprintln!("Error listing admission requests: {}", e),
            }
        }
        Commands::SubmitRequest { file } => {
            match read_json::<AdmissionRequest>(&file).map(|r| desk.submit(r)) {
                Ok(Ok(stored)) => println!("Submitted admission request: {}", stored.id),
                Ok(Err(e)) => eprintln!("Error submitting admission request: {}", e),
                Err(e) => eprintln!("Error reading admission request: {}", e),
            }
        }
        Commands::Decide {
            id,
            decision,
            reason,
        } => {
            let decision = match decision {
                DecisionArg::Accept => Decision::Accept,
                DecisionArg::Reject => Decision::Reject {
                    reason: reason.unwrap_or_default(),
                },
                DecisionArg::Divert => Decision::Divert { reason },
            };
            match desk.decide(&id, decision) {
                Ok(notification) => print_notification(&notification),
                Err(e) => eprintln!("Error deciding admission request {}: {}", id, e),
            }
        }
        Commands::Assess { voice_input } => {
            let Some(gateway) = gateway()? else {
                eprintln!("Error: RESQ_LLM_API_KEY is not set");
                return Ok(());
            };
            let input = AssessConditionInput { voice_input };
            match resq_llm::assess_condition(&gateway, &input).await {
                Ok(output) => println!("Patient state: {}", output.patient_state),
                Err(e) => eprintln!("Error assessing condition: {}", e),
            }
        }
        Commands::Triage {
            description,
            age,
            gender,
        } => {
            let Some(gateway) = gateway()? else {
                eprintln!("Error: RESQ_LLM_API_KEY is not set");
                return Ok(());
            };
            let input = AdvancedTriageInput {
                patient_description: description,
                vital_signs: None,
                age,
                gender,
            };
            match resq_llm::advanced_triage(&gateway, &input).await {
                Ok(output) => {
                    println!("KTAS level: {}", output.ktas_level);
                    println!("Reasoning: {}", output.ktas_reasoning);
                    for c in &output.potential_conditions {
                        println!("  {} ({}%)", c.condition, c.probability);
                    }
                    println!("Tests: {}", output.recommended_tests.join(", "));
                    println!("Time to treatment: {}", output.time_to_treatment_recommendation);
                }
                Err(e) => eprintln!("Error running triage: {}", e),
            }
        }
    }

    Ok(())
}

fn open_services(
    data_dir: &Path,
) -> Result<(Arc<NotificationRelay>, AdmissionDesk), Box<dyn std::error::Error>> {
    let capacity =
        notification_capacity_from_env_value(std::env::var("RESQ_NOTIFICATION_CAPACITY").ok())?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(data_dir.join(STORE_DIR_NAME))?);
    let relay = Arc::new(NotificationRelay::new(store.clone(), capacity));
    let desk = AdmissionDesk::new(store, relay.clone());
    Ok((relay, desk))
}

fn gateway() -> Result<Option<GeminiGateway>, Box<dyn std::error::Error>> {
    let timeout = http_timeout_from_env_value(std::env::var("RESQ_HTTP_TIMEOUT_SECS").ok())?;
    let config = LlmConfig::from_env_values(
        std::env::var("RESQ_LLM_API_KEY").ok(),
        std::env::var("RESQ_LLM_MODEL").ok(),
        std::env::var("RESQ_LLM_BASE_URL").ok(),
        timeout,
    );
    Ok(config.map(GeminiGateway::new).transpose()?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_notification(n: &Notification) {
    println!(
        "{} [{:?}] {} request {} at {}{}",
        if n.is_read() { " " } else { "*" },
        n.kind,
        n.id,
        n.request.id,
        n.timestamp.format("%Y-%m-%d %H:%M:%S"),
        n.message
            .as_deref()
            .map(|m| format!(": {m}"))
            .unwrap_or_default()
    );
}
