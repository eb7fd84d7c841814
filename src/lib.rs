//! repo-builder scaffolds a new repository from a template directory and a spec.
//! Rendering is deterministic: files are processed in canonical path order,
//! variables are substituted strictly and everything else is copied byte for byte.

/// Content-based text/binary classification of template files
pub mod classify;

/// Command-line interface module for the repo-builder application
pub mod cli;

/// Common constants used throughout the application
pub mod constants;

/// Render context assembly from a parsed spec
pub mod context;

/// Error types and handling for the repo-builder application
pub mod error;

/// Version-control materialization: init, commit and push with git2
pub mod git;

/// GitHub REST API client for repository lookup and creation
pub mod github;

/// Template root resolution inside the templates directory
pub mod loader;

/// Logger initialization for the binary
pub mod logger;

/// Atomic, permission-preserving writes into the destination tree
pub mod materialize;

/// Core template processing orchestration
/// Combines all components to render a template root into a destination
pub mod processor;

/// Strict MiniJinja substitution for text templates
pub mod renderer;

/// Spec document parsing (YAML frontmatter or key/value lines)
pub mod spec;

/// Deterministic enumeration of template files
pub mod walker;
