//! repo-builder's main application entry point and orchestration logic.
//! Parses the command line, then sequences spec parsing, rendering, GitHub
//! provisioning and the git commit/push.

use std::env;
use std::path::Path;

use log::info;
use repo_builder::{
    cli::{get_args, Args, BuildArgs, Command},
    constants::{github::TOKEN_ENV, DEFAULT_WORKDIR_PARENT},
    context::build_context,
    error::{default_error_handler, Error, Result},
    git::{init_commit_push, GitOptions},
    github::GitHubClient,
    loader::load_template,
    logger::init_logger,
    processor::{prepare_workdir, render_template_dir},
    spec::{parse_spec, GitHubSpec, Spec},
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Build(build_args) => build(build_args),
    }
}

/// Executes the `build` command.
///
/// # Flow
/// 1. Parses the spec and applies command-line overrides
/// 2. Prepares the working directory
/// 3. Checks GitHub settings unless `--skip-github`
/// 4. Renders the template into the working directory
/// 5. Looks up or creates the GitHub repository
/// 6. Commits on `main` and pushes unless `--skip-push`
fn build(args: BuildArgs) -> Result<()> {
    let spec = parse_spec(&args.spec_path)?;
    let spec = Spec {
        template: args.template.clone().unwrap_or(spec.template),
        github: GitHubSpec {
            owner: args.github_owner().or(spec.github.owner),
            private: args.private_override().unwrap_or(spec.github.private),
        },
        ..spec
    };

    let workdir = match &args.workdir {
        Some(workdir) => workdir.clone(),
        None => Path::new(DEFAULT_WORKDIR_PARENT).join(&spec.repo_name),
    };
    let workdir = prepare_workdir(&workdir, args.overwrite)?;

    let github = if args.skip_github {
        None
    } else {
        let owner = spec.github.owner.clone().ok_or_else(|| {
            Error::ConfigError("--github-owner is required unless --skip-github is set".into())
        })?;
        let token = args
            .github_token
            .clone()
            .or_else(|| env::var(TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "GitHub token is required (use --github-token or set {TOKEN_ENV})"
                ))
            })?;
        Some((owner, token))
    };

    let template_root = load_template(&args.templates_dir, &spec.template)?;
    println!("Using template from '{}'", template_root.display());

    let context = build_context(&spec);
    let result = render_template_dir(&template_root, &workdir, &context)?;
    println!(
        "Rendered {} files, copied {} files into '{}'",
        result.rendered_files,
        result.copied_files,
        workdir.display()
    );

    let mut remote_url = None;
    if let Some((owner, token)) = &github {
        let client = GitHubClient::new(token)?;
        let repo = match client.get_repo(owner, &spec.repo_name)? {
            Some(repo) => {
                info!("Using existing repository {}", repo.html_url);
                repo
            }
            None => {
                let repo = client.create_repo(
                    owner,
                    &spec.repo_name,
                    spec.github.private,
                    &spec.description,
                )?;
                println!("Created repository {}", repo.html_url);
                repo
            }
        };
        remote_url = Some(repo.clone_url);
    }

    let options = GitOptions {
        remote_url: remote_url.as_deref(),
        token: github.as_ref().map(|(_, token)| token.as_str()),
        push: !args.skip_push,
        deterministic: args.deterministic_git(),
    };
    init_commit_push(&workdir, &options)?;

    println!("Repository generation completed successfully in {}.", workdir.display());
    Ok(())
}
