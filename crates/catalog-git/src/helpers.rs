//! Shared git2 helper functions for working-copy operations

use git2::{
    AutotagOption, Config, Cred, CredentialType, ErrorClass, ErrorCode, FetchOptions,
    RemoteCallbacks, Repository,
};

use crate::Error;

/// Credential attempts before giving up; libgit2 re-asks on every rejection.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Build remote callbacks that authenticate the way the `git` CLI would.
///
/// SSH URLs use the running SSH agent, HTTPS URLs use the credential
/// helpers configured in git config.
pub(crate) fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::new(
                ErrorCode::Auth,
                ErrorClass::Net,
                "credentials rejected",
            ));
        }

        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = Config::open_default()?;
            return Cred::credential_helper(&config, url, username);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        Err(git2::Error::new(
            ErrorCode::Auth,
            ErrorClass::Net,
            "no supported credential type offered by remote",
        ))
    });

    callbacks
}

/// Fetch options shared by clone and fetch; tags are never needed.
pub(crate) fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks());
    options.download_tags(AutotagOption::None);
    options
}

/// Map a libgit2 failure during clone/fetch onto the catalog error taxonomy.
pub(crate) fn classify(url: &str, branch: Option<&str>, err: git2::Error) -> Error {
    let message = err.message().to_string();

    if err.code() == ErrorCode::Auth {
        return Error::AuthenticationFailed {
            url: url.to_string(),
            message,
        };
    }

    if let Some(name) = branch
        && err.code() == ErrorCode::NotFound
        && (message.contains("remote ref") || err.class() == ErrorClass::Reference)
    {
        return Error::BranchNotFound {
            name: name.to_string(),
            url: url.to_string(),
        };
    }

    // Everything else that goes wrong while talking to the remote (DNS,
    // refused connections, TLS, a vanished local path) leaves the source
    // unobservable for this run.
    Error::RemoteUnreachable {
        url: url.to_string(),
        message,
    }
}

/// Name of the branch HEAD points to, or `None` when HEAD is detached or
/// unborn.
pub(crate) fn head_branch(repo: &Repository) -> Option<String> {
    let head = repo.head().ok()?;
    if head.is_branch() {
        head.shorthand().map(str::to_string)
    } else {
        None
    }
}
