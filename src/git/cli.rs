use super::parse::{self, SEP};
use super::{
    into_stdout, CommandRunner, GitError, PreviewTarget, PullMode, PushOptions, RepoSource,
};
use crate::models::Commit;
use crate::panels::{PanelData, PanelKind, PanelRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Commits listed per log panel.
const LOG_LIMIT: usize = 300;

/// Previews are cut at this many bytes.
const MAX_PREVIEW_BYTES: usize = 512 * 1024;

/// [`RepoSource`] backed by the `git` binary.
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn CommandRunner>,
    binary: String,
}

impl GitCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            binary: "git".to_string(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String, GitError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        tracing::debug!(args = ?args, "Running git");
        let output = self
            .runner
            .run(&self.binary, &args)
            .await
            .map_err(|source| GitError::Spawn {
                program: self.binary.clone(),
                source,
            })?;
        into_stdout(output)
    }

    fn log_format() -> String {
        format!("--format=%H{s}%an{s}%at{s}%D{s}%s", s = SEP)
    }

    async fn log(&self, extra: &[&str]) -> Result<Vec<Commit>, GitError> {
        let format = Self::log_format();
        let limit = format!("-{}", LOG_LIMIT);
        let mut args = vec!["log", "--no-color", limit.as_str(), format.as_str()];
        args.extend_from_slice(extra);
        parse::commits(&self.git(&args).await?)
    }
}

fn scope(request: &PanelRequest) -> Result<&str, GitError> {
    request
        .scope
        .as_deref()
        .ok_or_else(|| GitError::Parse(format!("{:?} requested without a scope", request.kind)))
}

fn truncate_preview(mut text: String) -> String {
    if text.len() > MAX_PREVIEW_BYTES {
        let mut cut = MAX_PREVIEW_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("\n... (truncated)");
    }
    text
}

#[async_trait]
impl RepoSource for GitCli {
    async fn load(&self, request: &PanelRequest) -> Result<PanelData, GitError> {
        let data = match request.kind {
            PanelKind::Files => {
                let out = self
                    .git(&["status", "--porcelain", "--untracked-files=all"])
                    .await?;
                PanelData::Files(parse::files(&out))
            }
            PanelKind::Branches => {
                let format = format!(
                    "--format=%(HEAD){s}%(refname:short){s}%(upstream:short){s}%(upstream:track,nobracket){s}%(committerdate:unix)",
                    s = SEP
                );
                let out = self
                    .git(&[
                        "for-each-ref",
                        "--sort=-committerdate",
                        format.as_str(),
                        "refs/heads",
                    ])
                    .await?;
                PanelData::Branches(parse::branches(&out, chrono::Utc::now())?)
            }
            PanelKind::Remotes => {
                PanelData::Remotes(parse::remotes(&self.git(&["remote", "-v"]).await?))
            }
            PanelKind::RemoteBranches => {
                let remote = scope(request)?;
                let refs = format!("refs/remotes/{}", remote);
                let out = self
                    .git(&["for-each-ref", "--format=%(refname:short)", refs.as_str()])
                    .await?;
                PanelData::RemoteBranches(parse::remote_branches(&out, remote))
            }
            PanelKind::Tags => {
                let out = self.git(&["tag", "--list", "--sort=-creatordate"]).await?;
                PanelData::Tags(parse::tags(&out))
            }
            PanelKind::Commits => PanelData::Commits(self.log(&[]).await?),
            PanelKind::ReflogCommits => PanelData::ReflogCommits(self.log(&["-g"]).await?),
            PanelKind::SubCommits => {
                let reference = scope(request)?;
                PanelData::SubCommits(self.log(&[reference, "--"]).await?)
            }
            PanelKind::CommitFiles => {
                let sha = scope(request)?;
                let out = self
                    .git(&["show", "--no-color", "--name-status", "--format=", sha])
                    .await?;
                PanelData::CommitFiles(parse::commit_files(&out, sha))
            }
            PanelKind::Stash => {
                let out = self.git(&["stash", "list", "--format=%gs"]).await?;
                PanelData::Stash(parse::stash(&out))
            }
        };
        Ok(data)
    }

    async fn preview(&self, target: &PreviewTarget) -> Result<String, GitError> {
        let text = match target {
            PreviewTarget::File { name, tracked: false, .. } => {
                tokio::fs::read_to_string(name)
                    .await
                    .map_err(|source| GitError::Spawn {
                        program: format!("read {}", name),
                        source,
                    })?
            }
            PreviewTarget::File { name, staged_only, .. } => {
                let mut args = vec!["diff", "--no-color"];
                if *staged_only {
                    args.push("--cached");
                }
                args.extend(["--", name.as_str()]);
                self.git(&args).await?
            }
            PreviewTarget::Branch(name)
            | PreviewTarget::RemoteBranch(name)
            | PreviewTarget::Tag(name) => {
                self.git(&[
                    "log",
                    "--no-color",
                    "--graph",
                    "--oneline",
                    "--decorate",
                    "-100",
                    name.as_str(),
                    "--",
                ])
                .await?
            }
            PreviewTarget::Commit(sha) => {
                self.git(&["show", "--no-color", "--stat", "-p", sha.as_str()]).await?
            }
            PreviewTarget::CommitFile { sha, name } => {
                self.git(&["show", "--no-color", "--format=", sha.as_str(), "--", name.as_str()])
                    .await?
            }
            PreviewTarget::Stash(index) => {
                let reference = format!("stash@{{{}}}", index);
                self.git(&["stash", "show", "--no-color", "-p", reference.as_str()])
                    .await?
            }
        };
        Ok(truncate_preview(text))
    }

    async fn fetch(&self) -> Result<(), GitError> {
        self.git(&["fetch"]).await.map(|_| ())
    }

    async fn pull(&self, mode: PullMode) -> Result<(), GitError> {
        self.git(&["pull", "--no-edit", mode.flag()]).await.map(|_| ())
    }

    async fn push(&self, options: &PushOptions) -> Result<(), GitError> {
        let mut args = vec!["push"];
        if options.force {
            args.push("--force-with-lease");
        }
        if let Some(target) = &options.target {
            args.extend(["--set-upstream", target.remote.as_str(), target.branch.as_str()]);
        } else if options.set_upstream_current {
            args.extend(["--set-upstream", "origin", "HEAD"]);
        }

        match self.git(&args).await {
            Err(GitError::Failed(msg)) if !options.force && msg.contains("Updates were rejected") => {
                Err(GitError::PushRejected)
            }
            other => other.map(|_| ()),
        }
    }

    async fn set_upstream(&self, upstream: &str) -> Result<(), GitError> {
        let arg = format!("--set-upstream-to={}", upstream);
        self.git(&["branch", arg.as_str()]).await.map(|_| ())
    }

    async fn stage(&self, path: &str) -> Result<(), GitError> {
        self.git(&["add", "--", path]).await.map(|_| ())
    }

    async fn unstage(&self, path: &str) -> Result<(), GitError> {
        self.git(&["reset", "-q", "HEAD", "--", path]).await.map(|_| ())
    }

    async fn stage_all(&self) -> Result<(), GitError> {
        self.git(&["add", "-A"]).await.map(|_| ())
    }

    async fn unstage_all(&self) -> Result<(), GitError> {
        self.git(&["reset", "-q"]).await.map(|_| ())
    }

    async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        self.git(&["checkout", branch]).await.map(|_| ())
    }
}
