//! Version-control materialization of a rendered directory.
//! Initializes the repository, commits everything on `main` and optionally
//! pushes it to `origin`.

use git2::{
    Commit, Cred, IndexAddOption, Oid, PushOptions, RemoteCallbacks, Repository, Signature, Time,
};
use log::{debug, info};
use std::env;
use std::path::Path;

use crate::constants::{
    github::TOKEN_USERNAME, DEFAULT_BRANCH, DEFAULT_GIT_EMAIL, DEFAULT_GIT_NAME,
    INITIAL_COMMIT_MESSAGE,
};
use crate::error::Result;

const REMOTE_NAME: &str = "origin";

/// What the git step should do after committing.
#[derive(Debug, Clone, Default)]
pub struct GitOptions<'a> {
    /// URL registered as `origin`; nothing is pushed without it.
    pub remote_url: Option<&'a str>,
    /// Access token offered to the remote as `x-access-token` credentials.
    pub token: Option<&'a str>,
    pub push: bool,
    /// Commit with the Unix epoch as author and committer time.
    pub deterministic: bool,
}

/// Initializes (or reuses) the repository in `workdir`, commits its whole content on
/// `main`, registers `origin` and pushes when requested.
///
/// # Returns
/// * `Result<Oid>` - Id of the new commit
pub fn init_commit_push<P: AsRef<Path>>(workdir: P, options: &GitOptions) -> Result<Oid> {
    let workdir = workdir.as_ref();
    let repo = if workdir.join(".git").exists() {
        debug!("Using existing repository in {}", workdir.display());
        Repository::open(workdir)?
    } else {
        debug!("Initializing repository in {}", workdir.display());
        Repository::init(workdir)?
    };

    checkout_main(&repo)?;
    let oid = commit_all(&repo, options.deterministic)?;
    info!("Committed {oid} on {DEFAULT_BRANCH}");

    if let Some(url) = options.remote_url {
        set_origin(&repo, url)?;
        if options.push {
            push_main(&repo, options.token)?;
            info!("Pushed {DEFAULT_BRANCH} to {REMOTE_NAME}");
        }
    }

    Ok(oid)
}

/// Points `main` at the current HEAD commit (if any) and makes it the current branch.
fn checkout_main(repo: &Repository) -> Result<()> {
    if let Ok(head) = repo.head() {
        if head.shorthand() != Some(DEFAULT_BRANCH) {
            let commit = head.peel_to_commit()?;
            repo.branch(DEFAULT_BRANCH, &commit, true)?;
        }
    }
    repo.set_head(&format!("refs/heads/{DEFAULT_BRANCH}"))?;
    Ok(())
}

/// Stages every change in the worktree, removals included, and commits it.
fn commit_all(repo: &Repository, deterministic: bool) -> Result<Oid> {
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let author = signature(repo, "GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL", deterministic)?;
    let committer = signature(repo, "GIT_COMMITTER_NAME", "GIT_COMMITTER_EMAIL", deterministic)?;

    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();

    Ok(repo.commit(Some("HEAD"), &author, &committer, INITIAL_COMMIT_MESSAGE, &tree, &parents)?)
}

/// Commit identity: `GIT_*` environment overrides, else the default identity.
///
/// Deterministic signatures use the Unix epoch so identical trees give identical commits.
/// Otherwise the current time is used and the repository's configured identity is
/// preferred over the default.
fn signature(
    repo: &Repository,
    name_var: &str,
    email_var: &str,
    deterministic: bool,
) -> Result<Signature<'static>> {
    let name = env::var(name_var).ok().filter(|v| !v.is_empty());
    let email = env::var(email_var).ok().filter(|v| !v.is_empty());

    if deterministic {
        let epoch = Time::new(0, 0);
        return Ok(Signature::new(
            name.as_deref().unwrap_or(DEFAULT_GIT_NAME),
            email.as_deref().unwrap_or(DEFAULT_GIT_EMAIL),
            &epoch,
        )?);
    }

    match (name, email) {
        (Some(name), Some(email)) => Ok(Signature::now(&name, &email)?),
        _ => Ok(repo
            .signature()
            .or_else(|_| Signature::now(DEFAULT_GIT_NAME, DEFAULT_GIT_EMAIL))?),
    }
}

fn set_origin(repo: &Repository, url: &str) -> Result<()> {
    if repo.find_remote(REMOTE_NAME).is_ok() {
        debug!("Updating {REMOTE_NAME} to {url}");
        repo.remote_set_url(REMOTE_NAME, url)?;
    } else {
        debug!("Adding {REMOTE_NAME} {url}");
        repo.remote(REMOTE_NAME, url)?;
    }
    Ok(())
}

/// Pushes `main` to `origin` and records it as the upstream branch.
fn push_main(repo: &Repository, token: Option<&str>) -> Result<()> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(token) = token {
        callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
            Cred::userpass_plaintext(TOKEN_USERNAME, token)
        });
    }
    callbacks.push_update_reference(|refname, status| match status {
        Some(message) => Err(git2::Error::from_str(&format!("push of {refname} rejected: {message}"))),
        None => Ok(()),
    });

    let mut push_options = PushOptions::new();
    push_options.remote_callbacks(callbacks);

    let refspec = format!("refs/heads/{DEFAULT_BRANCH}:refs/heads/{DEFAULT_BRANCH}");
    let mut remote = repo.find_remote(REMOTE_NAME)?;
    remote.push(&[refspec.as_str()], Some(&mut push_options))?;

    let mut config = repo.config()?;
    config.set_str(&format!("branch.{DEFAULT_BRANCH}.remote"), REMOTE_NAME)?;
    config.set_str(
        &format!("branch.{DEFAULT_BRANCH}.merge"),
        &format!("refs/heads/{DEFAULT_BRANCH}"),
    )?;
    Ok(())
}
