//! Parsers for git's machine-readable output.
use super::GitError;
use crate::models::{Branch, Commit, CommitFile, File, Remote, RemoteBranch, StashEntry, Tag};
use chrono::{DateTime, Utc};

/// Field separator used in every `--format` string.
pub const SEP: char = '\x1f';

const CONFLICT_STATUSES: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// Parse `git status --porcelain --untracked-files=all`.
pub fn files(output: &str) -> Vec<File> {
    output
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let (status, path) = line.split_at(2);
            let path = path[1..].trim_matches('"');
            // Renames are reported as "old -> new"
            let name = path.rsplit(" -> ").next().unwrap_or(path);
            let x = status.chars().next().unwrap_or(' ');
            let y = status.chars().nth(1).unwrap_or(' ');
            let untracked = status == "??";
            let conflicted = CONFLICT_STATUSES.contains(&status);

            File {
                name: name.to_string(),
                short_status: status.to_string(),
                has_staged_changes: !matches!(x, ' ' | '?' | 'U') && !conflicted,
                has_unstaged_changes: y != ' ',
                tracked: !untracked && x != 'A',
                added: untracked || x == 'A',
                deleted: x == 'D' || y == 'D',
                has_merge_conflicts: conflicted,
                has_inline_merge_conflicts: matches!(status, "UU" | "AA"),
            }
        })
        .collect()
}

/// Parse `git for-each-ref refs/heads` with the format
/// `%(HEAD) SEP %(refname:short) SEP %(upstream:short) SEP %(upstream:track,nobracket) SEP %(committerdate:unix)`.
///
/// The checked-out branch is moved to the front.
pub fn branches(output: &str, now: DateTime<Utc>) -> Result<Vec<Branch>, GitError> {
    let mut result = Vec::new();
    for line in output.lines().filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split(SEP).collect();
        let [head, name, upstream, track, date] = fields[..] else {
            return Err(GitError::Parse(format!("branch line: {line}")));
        };

        let (pushables, pullables) = if upstream.is_empty() {
            ("?".to_string(), "?".to_string())
        } else {
            ahead_behind(track)
        };

        let recency = date
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|at| recency(now, at))
            .unwrap_or_default();

        result.push(Branch {
            name: name.to_string(),
            recency,
            pushables,
            pullables,
            upstream_name: (!upstream.is_empty()).then(|| upstream.to_string()),
            head: head == "*",
        });
    }

    if let Some(pos) = result.iter().position(|b| b.head) {
        let head = result.remove(pos);
        result.insert(0, head);
    }
    Ok(result)
}

/// `"ahead 2, behind 1"` -> `("2", "1")`. `"gone"` is treated as no upstream.
fn ahead_behind(track: &str) -> (String, String) {
    if track == "gone" {
        return ("?".to_string(), "?".to_string());
    }
    let mut ahead = "0".to_string();
    let mut behind = "0".to_string();
    for part in track.split(", ") {
        if let Some(n) = part.strip_prefix("ahead ") {
            ahead = n.to_string();
        } else if let Some(n) = part.strip_prefix("behind ") {
            behind = n.to_string();
        }
    }
    (ahead, behind)
}

/// Compact age label: `"5m"`, `"3h"`, `"2d"`, `"6w"`, `"4M"`, `"1y"`.
pub fn recency(now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    let (value, unit) = match secs {
        s if s < 60 => (s, "s"),
        s if s < 3_600 => (s / 60, "m"),
        s if s < 86_400 => (s / 3_600, "h"),
        s if s < 604_800 => (s / 86_400, "d"),
        s if s < 2_629_800 => (s / 604_800, "w"),
        s if s < 31_557_600 => (s / 2_629_800, "M"),
        s => (s / 31_557_600, "y"),
    };
    format!("{value}{unit}")
}

/// Parse `git remote -v`, one entry per remote in first-seen order.
pub fn remotes(output: &str) -> Vec<Remote> {
    let mut result: Vec<Remote> = Vec::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        match result.iter_mut().find(|r| r.name == name) {
            Some(remote) => {
                if !remote.urls.iter().any(|u| u == url) {
                    remote.urls.push(url.to_string());
                }
            }
            None => result.push(Remote {
                name: name.to_string(),
                urls: vec![url.to_string()],
            }),
        }
    }
    result
}

/// Parse `git for-each-ref --format=%(refname:short) refs/remotes/<remote>`.
pub fn remote_branches(output: &str, remote: &str) -> Vec<RemoteBranch> {
    let prefix = format!("{remote}/");
    output
        .lines()
        .filter_map(|line| line.strip_prefix(&prefix))
        .filter(|name| *name != "HEAD")
        .map(|name| RemoteBranch {
            name: name.to_string(),
            remote_name: remote.to_string(),
        })
        .collect()
}

pub fn tags(output: &str) -> Vec<Tag> {
    output
        .lines()
        .filter(|l| !l.is_empty())
        .map(|name| Tag {
            name: name.to_string(),
        })
        .collect()
}

/// Parse `git log` with the format `%H SEP %an SEP %at SEP %D SEP %s`.
pub fn commits(output: &str) -> Result<Vec<Commit>, GitError> {
    output
        .lines()
        .filter(|l| !l.is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.splitn(5, SEP).collect();
            let [sha, author, timestamp, decorations, subject] = fields[..] else {
                return Err(GitError::Parse(format!("commit line: {line}")));
            };
            let tags = decorations
                .split(", ")
                .filter_map(|d| d.strip_prefix("tag: "))
                .map(str::to_string)
                .collect();
            Ok(Commit {
                sha: sha.to_string(),
                name: subject.to_string(),
                author: author.to_string(),
                unix_timestamp: timestamp.parse().unwrap_or_default(),
                tags,
            })
        })
        .collect()
}

/// Parse `git stash list --format=%gs`.
pub fn stash(output: &str) -> Vec<StashEntry> {
    output
        .lines()
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(index, name)| StashEntry {
            index,
            name: name.to_string(),
        })
        .collect()
}

/// Parse `git show --name-status --format= <sha>`.
pub fn commit_files(output: &str, sha: &str) -> Vec<CommitFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let status = parts.next()?;
            // Renames and copies list old and new path; show the new one
            let name = parts.last()?;
            Some(CommitFile {
                sha: sha.to_string(),
                name: name.to_string(),
                change_status: status.chars().next()?.to_string(),
            })
        })
        .collect()
}
