// src/personadocs/mod.rs

pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod conversation;
pub mod event;
pub mod observer;
pub mod orchestration;
pub mod participant;
pub mod personas;
pub mod selection;
pub mod termination;
pub mod tracker;
pub mod transcript;

// Let's explicitly export Orchestrator so we don't have to access it via personadocs::orchestration::Orchestrator
// and instead as personadocs::Orchestrator
pub use orchestration::Orchestrator;
