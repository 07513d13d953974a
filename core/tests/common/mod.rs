//! Shared helpers: run the mock API on a random local port.

#![allow(dead_code)]

use devsec_core::{Config, DevSecClient};
use mock_server::AppState;
use tokio::net::TcpListener;

/// Start the mock server on the current runtime and return its base URL.
pub async fn spawn_server(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with_state(listener, state));
    format!("http://{addr}")
}

pub fn client_for(base_url: &str) -> DevSecClient {
    DevSecClient::with_config(Config::default().with_base_url(base_url)).unwrap()
}

/// A base URL on which nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
