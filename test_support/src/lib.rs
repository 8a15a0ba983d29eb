//! Test utilities shared by the integration suites.
//!
//! Provides Makefile fixtures with their expected diagrams and a minimal HTTP
//! server for exercising remote loading.

pub mod http;

pub use http::{HttpResponse, HttpServer, spawn_http_server, spawn_http_sequence};

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A Makefile mixing continuations, stray shell lines and an inline comment.
///
/// Lines 3 and 5 are not Makefile syntax, so strict tokenizing fails at
/// line 3.
pub const SCENARIO_MAKEFILE: &str = concat!(
    "a: b c \\\n",
    "d\n",
    "ls -al \\\n",
    "  run arg1 arg2\n",
    "// comment\n",
    "b: c # other comment\n",
);

/// Expected left-to-right diagram for [`SCENARIO_MAKEFILE`].
pub const SCENARIO_DIAGRAM_LR: &str = concat!(
    "%% Mermaid diagram\n",
    "graph LR\n",
    "  node_0[\"a\"]:::target\n",
    "    node_0[\"a\"] --> node_1[\"b\"]\n",
    "    node_0[\"a\"] --> node_2[\"c\"]\n",
    "    node_0[\"a\"] --> node_3[\"d\"]\n",
    "  node_1[\"b\"]:::target\n",
    "    node_1[\"b\"] --> node_2[\"c\"]",
);

/// Expected diagram for [`SCENARIO_MAKEFILE`] drawn top to bottom.
#[must_use]
pub fn scenario_diagram_tb() -> String {
    SCENARIO_DIAGRAM_LR.replacen("graph LR", "graph TB", 1)
}

/// Write `content` to a `Makefile` inside a fresh temporary directory.
///
/// Returns the directory guard and the Makefile path.
pub fn write_makefile(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("Makefile");
    fs::write(&path, content).expect("write Makefile");
    (dir, path)
}
