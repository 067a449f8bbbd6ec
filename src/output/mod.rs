// src/output/mod.rs
//! Output handling with clear separation of planning and execution.
//!
//! [`paths`] decides where artifacts live (pure), [`writer`] performs the
//! atomic writes and reads.

pub mod paths;
pub mod writer;

pub use paths::{artifact_file_name, artifact_path, get_relative_path, manifest_path, ArtifactKind};
pub use writer::{read_json, write_atomic, write_json_atomic};
