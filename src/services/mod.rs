// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod linking;
pub mod reconcile;
pub mod remote;

pub use linking::{Clock, LinkingService, SystemClock, TokenStatus};
pub use reconcile::{ContactReconciler, ReconcileReport};
pub use remote::{ContactPage, ContactQuery, RemoteAccountClient, RemoteProfile, TokenGrant};
