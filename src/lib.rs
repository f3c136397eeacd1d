//! dexdiag - diagnostic collector for multi-tenant data-engineering clusters

pub mod auth;
pub mod bundle;
pub mod cli;
pub mod client;
pub mod collect;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod output;
pub mod query;
pub mod report;
pub mod tenant;
