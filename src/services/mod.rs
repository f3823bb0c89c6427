// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity_log;
pub mod assistant;
pub mod completion;
pub mod kms;
pub mod realtime;
pub mod session;
pub mod task;
pub mod wizard;

pub use activity_log::{ActivityLogFailure, ActivityLogger};
pub use assistant::Assistant;
pub use completion::CompletionGateway;
pub use kms::KmsService;
pub use realtime::RealtimeBridge;
pub use session::{IdentityProvider, SessionStore};
pub use task::{Task, TaskError};
