//! Monocle core library.
//!
//! Turns the target/dependency structure of a Makefile into Mermaid
//! flowchart code. The pipeline is tokenize ([`tokenizer`]), sanitise
//! prerequisites ([`sanitize`]), assign node identifiers ([`registry`]) and
//! emit text ([`mermaid_gen`]). The remaining modules provide the command
//! line front end.

pub mod cli;
pub mod config;
pub mod mermaid_gen;
pub mod record;
pub mod registry;
pub mod runner;
pub mod sanitize;
pub mod source;
pub mod tokenizer;
