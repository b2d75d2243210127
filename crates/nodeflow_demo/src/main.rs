// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeflow` demo - a node graph in a desktop window.
//!
//! Drag from a pin socket to another pin to link them, click a link and press
//! Delete to remove it, right-click the canvas to add nodes and drag with the
//! middle button to pan. Settings are read from `nodeflow.ron` when present.

mod app;
mod nodes;
mod render;

use app::DemoApp;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting nodeflow demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = DemoApp::run() {
        tracing::error!("Demo crashed: {e}");
        std::process::exit(1);
    }
}

const DEFAULT_FILTER: &str = "nodeflow=debug,nodeflow_demo=debug,wgpu=warn,naga=warn";
