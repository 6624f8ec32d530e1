//! Source checkout: git/svn working copies and the version stamp file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::local_files::local;
use crate::utils::command;

/// Name of the stamp file written at the root of every working copy.
pub const VERSION_STAMP: &str = "version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmKind {
    Git,
    Svn,
}

impl ScmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScmKind::Git => "git",
            ScmKind::Svn => "svn",
        }
    }

    /// Reference used when none is configured or passed.
    pub fn default_ref(&self) -> &'static str {
        match self {
            ScmKind::Git => "master",
            ScmKind::Svn => "trunk",
        }
    }
}

/// Contents of the version stamp file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub rev: String,
    pub url: String,
    pub branch: String,
    pub fetched_at: String,
}

/// A working copy ready for template rendering and transfer.
///
/// Both checkout and dirty mode produce the same downstream contract: a
/// directory to render templates into and sync from.
#[derive(Debug, Clone)]
pub struct FetchedSource {
    pub workdir: PathBuf,
    pub info: Option<ScmInfo>,
    pub dirty: bool,
}

/// Fetch a working copy. With `dirty`, the current working directory is
/// used in place and no checkout command runs.
pub fn fetch(
    kind: ScmKind,
    url: &str,
    reference: Option<&str>,
    dirty: bool,
) -> Result<FetchedSource> {
    let cwd = std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("current dir".to_string())))?;
    fetch_in(kind, url, reference, dirty, &cwd)
}

/// Like [`fetch`], with an explicit directory standing in for the current
/// working directory in dirty mode.
pub fn fetch_in(
    kind: ScmKind,
    url: &str,
    reference: Option<&str>,
    dirty: bool,
    cwd: &Path,
) -> Result<FetchedSource> {
    let reference = reference.unwrap_or_else(|| kind.default_ref());

    if dirty {
        log_status!("scm", "Dirty mode: using {} in place", cwd.display());
        // Stamp refresh is best effort here; the in-place tree may not be
        // a working copy at all.
        let info = match info(kind, cwd, url, reference) {
            Ok(info) => {
                write_version_stamp(cwd, &info)?;
                Some(info)
            }
            Err(_) => None,
        };
        return Ok(FetchedSource {
            workdir: cwd.to_path_buf(),
            info,
            dirty: true,
        });
    }

    let workdir = checkout(kind, url, reference)?;
    let info = info(kind, &workdir, url, reference)?;
    write_version_stamp(&workdir, &info)?;

    Ok(FetchedSource {
        workdir,
        info: Some(info),
        dirty: false,
    })
}

fn checkout(kind: ScmKind, url: &str, reference: &str) -> Result<PathBuf> {
    let tempdir = tempfile::Builder::new()
        .prefix("deckhand-")
        .tempdir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create tempdir".to_string())))?
        .keep();

    // The checkout gets rsynced by an unprivileged user later.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tempdir, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| Error::internal_io(e.to_string(), Some("chmod tempdir".to_string())))?;
    }

    let target = tempdir.to_string_lossy().to_string();

    match kind {
        ScmKind::Git => {
            log_status!("scm", "Cloning {} into {}", url, target);
            run_scm("git", &["clone", url, &target], None)?;
            if reference != ScmKind::Git.default_ref() {
                log_status!("scm", "Checking out {}", reference);
                run_scm("git", &["checkout", reference], Some(&tempdir))?;
            }
        }
        ScmKind::Svn => {
            let checkout_url = format!("{}/{}", url.trim_end_matches('/'), reference);
            log_status!("scm", "Checking out {} into {}", checkout_url, target);
            run_scm(
                "svn",
                &[
                    "checkout",
                    "--quiet",
                    "--config-option",
                    "config:miscellany:use-commit-times=yes",
                    &checkout_url,
                    &target,
                ],
                None,
            )?;
        }
    }

    Ok(tempdir)
}

fn run_scm(program: &str, args: &[&str], dir: Option<&Path>) -> Result<()> {
    let output = command::output_of(program, args, dir).map_err(|e| {
        Error::scm_command_failed(format!("Failed to run {} {}: {}", program, args.join(" "), e))
    })?;

    if !output.status.success() {
        return Err(Error::scm_command_failed(format!(
            "{} {} failed: {}",
            program,
            args.join(" "),
            command::error_text(&output)
        )));
    }

    Ok(())
}

/// Read revision and repository URL from a working copy.
///
/// `fallback_url` is recorded when the working copy does not report one.
pub fn info(kind: ScmKind, dir: &Path, fallback_url: &str, branch: &str) -> Result<ScmInfo> {
    let (rev, url) = match kind {
        ScmKind::Git => {
            let rev = command::run_in_optional(dir, "git", &["describe", "--always"]);
            let url = command::run_in_optional(dir, "git", &["remote", "get-url", "origin"]);
            (rev, url)
        }
        ScmKind::Svn => {
            let rev = command::run_in_optional(dir, "svn", &["info", "--show-item", "revision"]);
            let url = command::run_in_optional(dir, "svn", &["info", "--show-item", "url"]);
            (rev, url)
        }
    };

    let rev = rev.ok_or_else(|| {
        Error::scm_command_failed(format!(
            "Could not read {} revision from {}",
            kind.as_str(),
            dir.display()
        ))
    })?;

    Ok(ScmInfo {
        kind: kind.as_str().to_string(),
        rev,
        url: url.unwrap_or_else(|| fallback_url.to_string()),
        branch: branch.to_string(),
        fetched_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Write the version stamp file at the working-copy root.
pub fn write_version_stamp(dir: &Path, info: &ScmInfo) -> Result<PathBuf> {
    let path = dir.join(VERSION_STAMP);
    let content = serde_json::to_string_pretty(info)
        .map_err(|e| Error::internal_json(e.to_string(), Some("version stamp".to_string())))?;
    local().write(&path, &content)?;
    Ok(path)
}

/// Delete a fetched working copy. Dirty checkouts are left alone.
pub fn delete_source(source: &FetchedSource) -> Result<()> {
    if source.dirty {
        return Ok(());
    }

    std::fs::remove_dir_all(&source.workdir)
        .map_err(|e| Error::internal_io(e.to_string(), Some("delete working copy".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_defaults() {
        assert_eq!(ScmKind::Git.default_ref(), "master");
        assert_eq!(ScmKind::Svn.default_ref(), "trunk");
    }

    #[test]
    fn stamp_round_trips_through_json() {
        let info = ScmInfo {
            kind: "git".to_string(),
            rev: "abc1234".to_string(),
            url: "git@example.com:blog.git".to_string(),
            branch: "master".to_string(),
            fetched_at: "2024-01-01T00:00:00+00:00".to_string(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"type\":\"git\""));
        let back: ScmInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rev, "abc1234");
        assert_eq!(back.branch, "master");
    }
}
