// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod contact;
pub mod letter;
pub mod link_state;
pub mod user;

pub use contact::{Contact, ContactSource};
pub use letter::Letter;
pub use link_state::LinkState;
pub use user::{UserAccount, UserAccountPatch};
