// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session and role resolution for role-gated editor applications.
//!
//! `drawbridge` sits between an external identity provider and the views of an application which
//! gates features by role (for example "editors" who may change documents and "viewers" who may
//! only read them). It reconciles two unreliable, asynchronous inputs:
//!
//! - An **identity stream** which announces the currently signed-in identity (or the absence of
//!   one) whenever session state changes.
//! - A **role store**, a remote document database holding a role attribute per identity. Lookups
//!   against it can be slow, can fail and can hang.
//!
//! The [`SessionResolver`] subscribes to the identity stream and resolves a [`Role`] exactly once
//! per identity, bounding lookup latency with a timeout and falling back to the default
//! (lowest-privilege) role whenever the store misbehaves. Consumers observe session state as
//! read-only [`SessionState`] snapshots over a watch channel and never see an error or an
//! indefinitely-loading session.
//!
//! The [`guard`] module provides the pure decision function protected views call on every state
//! change to choose between rendering content, a loading indicator, a denial view or a redirect
//! to login.

mod config;
pub mod guard;
mod identity;
mod resolver;
mod role;
mod store;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use config::ResolverConfig;
pub use guard::AccessDecision;
pub use identity::{Identity, IdentityId};
pub use resolver::{ResolveFailure, Session, SessionError, SessionResolver, SessionState};
pub use role::{Role, UnknownRole};
pub use store::{MemoryRoleStore, RoleStore, UserDocument};
