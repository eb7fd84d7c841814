//! Error handling for the repo-builder application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for repo-builder operations.
///
/// This enum represents all possible errors that can occur within the application.
/// Rendering errors carry the template-relative path of the offending file.
#[derive(Error, Debug)]
pub enum Error {
    /// The template root is missing or is not a directory.
    #[error("Template directory not found: {template_dir}.")]
    InvalidTemplateRoot { template_dir: String },

    /// A template file (or the target of a symlink) could not be read.
    #[error("Cannot read template file '{path}': {source}.")]
    UnreadableSourceFile {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Malformed marker syntax or a strict-lookup miss while rendering a file.
    #[error("Failed rendering template file '{path}': {reason}.")]
    SubstitutionFailure {
        path: String,
        /// The missing variable, when it could be determined.
        variable: Option<String>,
        reason: String,
    },

    /// Creating a directory or writing a file in the destination failed.
    #[error("Cannot write '{path}': {source}.")]
    DestinationWriteFailure {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Represents errors that occur while reading or interpreting the spec document
    #[error("Spec error: {0}.")]
    SpecError(String),

    /// The working directory has content and overwriting was not requested.
    #[error("Workdir is not empty: {workdir} (use --overwrite to allow).")]
    WorkdirNotEmptyError { workdir: String },

    /// Represents errors reported by the GitHub REST API
    #[error("GitHub error: {0}.")]
    GitHubError(String),

    /// Represents invalid command-line usage that clap cannot express
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("HTTP error: {0}.")]
    HttpError(#[from] reqwest::Error),

    #[error("Git error: {0}.")]
    Git2Error(#[from] git2::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
