// ABOUTME: Library crate for kube-term exposing the terminal session API for testing and reuse

pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod preferences;
pub mod terminal;
