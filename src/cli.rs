//! Command-line interface implementation for repo-builder.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, Args as ClapArgs, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::DEFAULT_TEMPLATES_DIR;

/// Command-line arguments structure for repo-builder.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "repo-builder: deterministic template-to-repository generator",
    long_about = None
)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a template from a spec, create the GitHub repository, commit and push
    Build(BuildArgs),
}

#[derive(ClapArgs, Debug)]
pub struct BuildArgs {
    /// Path to the spec markdown file
    #[arg(value_name = "SPEC_PATH")]
    pub spec_path: PathBuf,

    /// Directory containing the templates
    #[arg(long, default_value = DEFAULT_TEMPLATES_DIR)]
    pub templates_dir: PathBuf,

    /// Template name (overrides the spec's template)
    #[arg(long)]
    pub template: Option<String>,

    /// Directory to render into and run git operations in (default: generated/<repo_name>)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Allow a non-empty workdir
    #[arg(long)]
    pub overwrite: bool,

    /// Do not create or look up the GitHub repository
    #[arg(long)]
    pub skip_github: bool,

    /// Do not push to GitHub (still commits locally)
    #[arg(long)]
    pub skip_push: bool,

    /// GitHub owner (user or organization)
    #[arg(long)]
    pub github_owner: Option<String>,

    /// GitHub token (or set GITHUB_TOKEN)
    #[arg(long)]
    pub github_token: Option<String>,

    /// Create a private repository
    #[arg(long, overrides_with = "public")]
    pub private: bool,

    /// Create a public repository
    #[arg(long, overrides_with = "private")]
    pub public: bool,

    /// Use deterministic git author/commit timestamps (default: enabled)
    #[arg(long, overrides_with = "no_deterministic_git")]
    pub deterministic_git: bool,

    /// Disable deterministic git commit timestamps
    #[arg(long, overrides_with = "deterministic_git")]
    pub no_deterministic_git: bool,
}

impl BuildArgs {
    /// GitHub owner given on the command line; a blank value counts as not given.
    pub fn github_owner(&self) -> Option<String> {
        self.github_owner
            .as_deref()
            .map(str::trim)
            .filter(|owner| !owner.is_empty())
            .map(str::to_string)
    }

    /// Repository visibility requested on the command line, if any; the last flag wins.
    pub fn private_override(&self) -> Option<bool> {
        match (self.private, self.public) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Whether commits use fixed identity timestamps; enabled unless explicitly disabled.
    pub fn deterministic_git(&self) -> bool {
        !self.no_deterministic_git
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument | ErrorKind::MissingSubcommand
            ) {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
