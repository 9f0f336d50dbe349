//! Dossier - Document-Grounded Conversation Backend
//!
//! This crate orchestrates retrieval-augmented conversations: clients upload
//! a document, an external search service indexes it, and subsequent chat
//! turns are answered by a language model grounded in retrieved passages.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
