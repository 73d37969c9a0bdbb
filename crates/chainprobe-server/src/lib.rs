//! Service and terminal front ends for chainprobe sessions.

pub mod config;
pub mod console;
pub mod error;
pub mod render;
pub mod routes;

use chainprobe_clients::NetworkClients;

use crate::config::AppConfig;
use crate::error::CliError;
use crate::routes::AppState;

/// Wires live clients into the state shared by every route.
pub fn app_state(config: &AppConfig) -> Result<AppState, CliError> {
    let clients = NetworkClients::new(config.endpoints.clone())?;
    Ok(AppState {
        multiplexer: chainprobe_core::Multiplexer::new(clients.probe_set(&config.probes)),
        estimator: clients.estimator(&config.probes),
    })
}
