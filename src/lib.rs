// ABOUTME: Library root for proago - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod activity;
pub mod chart;
pub mod cluster;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gitinfo;
pub mod promote;
pub mod provider;
pub mod types;
pub mod version;

use std::path::PathBuf;

/// The proago state directory (`~/.local/state/proago` on Linux).
///
/// Holds the activity ledger, release records and cached GitOps clones.
pub fn state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("state")
        })
        .join("proago")
}
