//! Command handlers

pub mod bookmark;
pub mod config;
