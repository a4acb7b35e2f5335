//! Scrivano is a terminal chat client for Gemini-style generative APIs with
//! an attached multi-file code workspace.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: settings, chat sessions, the code
//!   workspace with its undo/redo histories, code-block extraction, preview
//!   assembly, and turn orchestration.
//! - [`api`] defines the generative-API payloads and the HTTP client behind
//!   the `ChatBackend` seam.
//! - [`auth`] resolves the credential and runs the debounced validation
//!   probe.
//! - [`storage`] is the flat string key-value store everything persists
//!   through.
//! - [`commands`] implements slash-command parsing used by the chat loop.
//! - [`repl`] runs the interactive event loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod repl;
pub mod storage;
pub mod utils;
