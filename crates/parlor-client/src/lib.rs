pub mod backend;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod http;
pub mod notify;
pub mod realtime;
pub mod state;
pub mod unread;
pub mod view;

use tracing_subscriber::{fmt, EnvFilter};

use parlor_shared::constants::APP_NAME;

pub use backend::{Backend, BackendRequest, BackendResponse, LocalFile};
pub use config::ClientConfig;
pub use coordinator::{Coordinator, Effect};
pub use driver::{run_session, Frontend, UserAction};
pub use error::{ClientError, Result};
pub use http::HttpBackend;
pub use notify::{Notification, NotificationCenter, Severity};
pub use realtime::{channel_pair, RealtimeEndpoint, RealtimeLink};
pub use state::SessionState;

const DEFAULT_LOG_FILTER: &str = "parlor_client=debug,parlor_shared=info,warn";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling it again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting {APP_NAME} client");
    }
}
