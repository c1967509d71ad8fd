//! Concrete collaborators backed by the hosted Supabase project: GoTrue for
//! sessions and PostgREST for the entry table.

pub mod auth;
pub mod client;
pub mod rest;

pub use auth::{Grant, SupabaseSession};
pub use client::SupabaseClient;
pub use rest::SupabaseEntries;
