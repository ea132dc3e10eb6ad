// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Letter Exchange: send scanned letters to people you follow elsewhere.
//!
//! This crate provides the backend API: remote account linking and token
//! lifecycle, contact sync from the remote social graph, and letter metadata.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::UserRecordStore;
use services::LinkingService;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserRecordStore>,
    pub linking: LinkingService,
}
