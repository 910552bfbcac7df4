//! Background worker turning change-feed events into user notifications.

use std::env;

use config::Config;
use dotenvy::dotenv;

use leadflow_crm::changes::{ChangePublisher, ZmqChangePublisher, decode_frames};
use leadflow_crm::db::{PoolSettings, establish_connection_pool};
use leadflow_crm::domain::change::{ChangeEvent, RowChange};
use leadflow_crm::models::config::ServerConfig;
use leadflow_crm::repository::{DieselRepository, NotificationWriter};
use leadflow_crm::services::ServiceResult;
use leadflow_crm::services::notifications::{notify_assignment, notify_mentions};

/// Topic prefixes this worker reacts to.
const SUBSCRIPTIONS: [&[u8]; 2] = [b"messages:", b"assignments"];

fn process_change<R>(
    event: ChangeEvent,
    repo: &R,
    publisher: &dyn ChangePublisher,
) -> ServiceResult<()>
where
    R: NotificationWriter + ?Sized,
{
    match event {
        ChangeEvent::Messages(RowChange::Inserted(message)) => {
            let created = notify_mentions(repo, publisher, &message)?;
            if !created.is_empty() {
                log::info!(
                    "Notified {} mentioned users of message {}",
                    created.len(),
                    message.id
                );
            }
        }
        ChangeEvent::Assignments(assignment) => {
            notify_assignment(repo, publisher, &assignment)?;
            log::info!(
                "Notified user {} of lead {} assignment",
                assignment.agent_id,
                assignment.lead_id
            );
        }
        other => log::info!("Skipping {} change", other.topic()),
    }
    Ok(())
}

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        // Add `./config/default.yaml`
        .add_source(config::File::with_name("config/default"))
        // Add environment-specific overrides
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        // Add settings from the environment (with a prefix of APP)
        .add_source(config::Environment::with_prefix("APP"))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let server_config = match settings.try_deserialize::<ServerConfig>() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {}", err);
            std::process::exit(1);
        }
    };

    let context = zmq::Context::new();
    let subscriber = match context.socket(zmq::SUB) {
        Ok(socket) => socket,
        Err(err) => {
            log::error!("Cannot create zmq socket: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = subscriber.connect(&server_config.zmq_changes_sub) {
        log::error!("Cannot connect to {}: {err}", server_config.zmq_changes_sub);
        std::process::exit(1);
    }
    for topic in SUBSCRIPTIONS {
        if let Err(err) = subscriber.set_subscribe(topic) {
            log::error!("Subscribe failed: {err}");
            std::process::exit(1);
        }
    }

    let pool = match establish_connection_pool(
        &server_config.database_url,
        PoolSettings::from(&server_config),
    ) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);
    // The HTTP server owns `zmq_changes_pub`; feed consumers also connect here
    // to receive `notifications:<user_id>` rows created by this worker.
    let publisher = match ZmqChangePublisher::start(&server_config.zmq_worker_pub) {
        Ok(publisher) => publisher,
        Err(err) => {
            log::error!("Cannot bind {}: {err}", server_config.zmq_worker_pub);
            std::process::exit(1);
        }
    };

    log::info!("Starting notification worker");

    loop {
        let frames = match subscriber.recv_multipart(0) {
            Ok(frames) => frames,
            Err(err) => {
                log::error!("Error receiving change event: {err}");
                continue;
            }
        };
        let event = match decode_frames(&frames) {
            Ok(event) => event,
            Err(err) => {
                log::error!("Error decoding change event: {err}");
                continue;
            }
        };
        if let Err(err) = process_change(event, &repo, &publisher) {
            log::error!("Error processing change event: {err}");
        }
    }
}
