//! Common constants used throughout the repo-builder application.

/// Opening sequences of the three marker forms: interpolation, control block, comment.
pub const MARKERS: [&str; 3] = ["{{", "{%", "{#"];

/// Directory holding the available templates, relative to the working directory
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Template used when neither the spec nor the command line names one
pub const DEFAULT_TEMPLATE: &str = "fastapi-api";

/// Parent of the default working directory (`generated/<repo_name>`)
pub const DEFAULT_WORKDIR_PARENT: &str = "generated";

/// Branch created and pushed by the git step
pub const DEFAULT_BRANCH: &str = "main";

pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Commit identity used when no `GIT_*` override is set
pub const DEFAULT_GIT_NAME: &str = "builder-v1";
pub const DEFAULT_GIT_EMAIL: &str = "builder-v1@example.invalid";

pub mod github {
    pub const API_BASE: &str = "https://api.github.com";
    pub const API_VERSION: &str = "2022-11-28";
    pub const ACCEPT: &str = "application/vnd.github+json";
    pub const USER_AGENT: &str = "builder-v1";
    pub const TIMEOUT_SECS: u64 = 30;
    /// Username GitHub accepts alongside an access token for HTTPS git operations
    pub const TOKEN_USERNAME: &str = "x-access-token";
    pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
}
