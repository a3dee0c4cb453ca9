//! Template resolver for custom command strings.
//!
//! Supports the subset of Go template syntax that custom commands use in
//! practice:
//!
//! - `{{.SelectedLocalBranch.Name}}`: a field of a selected object
//! - `{{.SelectedFile}}`: the object's natural key
//! - `{{index .PromptResponses 0}}`: an earlier prompt answer
//! - `{{index .SelectedRemote.Urls 0}}`: an element of a list field
//! - `{{- ... -}}`: trim whitespace around the action
//!
//! Resolution is pure: the same template and context always give the same
//! output. A missing selection is an error only if the template references it.
use crate::models::{Branch, Commit, CommitFile, File, Remote, RemoteBranch, StashEntry, Tag};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed action in template \"{0}\"")]
    Unclosed(String),

    #[error("can't evaluate field {0}")]
    UnknownField(String),

    #[error("{0} is not available because nothing is selected")]
    NilObject(String),

    #[error("index {index} out of range for {target} (length {len})")]
    IndexOutOfRange {
        target: String,
        index: usize,
        len: usize,
    },

    #[error("unsupported template action \"{0}\"")]
    Unsupported(String),

    #[error("template pattern failed to compile: {0}")]
    Pattern(String),
}

// ============================================================================
// Field Values
// ============================================================================

/// A value a template field can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    fn text(value: impl ToString) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            // Same rendering Go uses for a slice of strings
            Self::List(items) => write!(f, "[{}]", items.join(" ")),
        }
    }
}

/// A domain object whose fields templates may reference by name.
pub trait TemplateObject: fmt::Display {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

impl TemplateObject for Commit {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Sha" => FieldValue::text(&self.sha),
            "ShortSha" => FieldValue::text(self.short_sha()),
            "Name" => FieldValue::text(&self.name),
            "Author" => FieldValue::text(&self.author),
            "UnixTimestamp" => FieldValue::text(self.unix_timestamp),
            "Tags" => FieldValue::List(self.tags.clone()),
            _ => return None,
        })
    }
}

impl TemplateObject for File {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Name" => FieldValue::text(&self.name),
            "DisplayString" => FieldValue::text(self.display_string()),
            "ShortStatus" => FieldValue::text(&self.short_status),
            "HasStagedChanges" => FieldValue::text(self.has_staged_changes),
            "HasUnstagedChanges" => FieldValue::text(self.has_unstaged_changes),
            "Tracked" => FieldValue::text(self.tracked),
            "Added" => FieldValue::text(self.added),
            "Deleted" => FieldValue::text(self.deleted),
            "HasMergeConflicts" => FieldValue::text(self.has_merge_conflicts),
            "HasInlineMergeConflicts" => FieldValue::text(self.has_inline_merge_conflicts),
            _ => return None,
        })
    }
}

impl TemplateObject for Branch {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Name" => FieldValue::text(&self.name),
            "Recency" => FieldValue::text(&self.recency),
            "Pushables" => FieldValue::text(&self.pushables),
            "Pullables" => FieldValue::text(&self.pullables),
            "UpstreamName" => FieldValue::text(self.upstream_name.as_deref().unwrap_or_default()),
            "Head" => FieldValue::text(self.head),
            _ => return None,
        })
    }
}

impl TemplateObject for RemoteBranch {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Name" => FieldValue::text(&self.name),
            "RemoteName" => FieldValue::text(&self.remote_name),
            "FullName" => FieldValue::text(self.full_name()),
            _ => return None,
        })
    }
}

impl TemplateObject for Remote {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Name" => FieldValue::text(&self.name),
            "Urls" => FieldValue::List(self.urls.clone()),
            _ => return None,
        })
    }
}

impl TemplateObject for Tag {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "Name" => Some(FieldValue::text(&self.name)),
            _ => None,
        }
    }
}

impl TemplateObject for StashEntry {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Index" => FieldValue::text(self.index),
            "Name" => FieldValue::text(&self.name),
            "RefName" => FieldValue::text(self.ref_name()),
            _ => return None,
        })
    }
}

impl TemplateObject for CommitFile {
    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "Sha" => FieldValue::text(&self.sha),
            "Name" => FieldValue::text(&self.name),
            "ChangeStatus" => FieldValue::text(&self.change_status),
            _ => return None,
        })
    }
}

// ============================================================================
// Template Context
// ============================================================================

/// Snapshot of the current selections plus the prompt answers so far.
///
/// Built fresh for every resolution so each prompt sees the answers given
/// before it.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub selected_local_commit: Option<Commit>,
    pub selected_reflog_commit: Option<Commit>,
    pub selected_sub_commit: Option<Commit>,
    pub selected_file: Option<File>,
    pub selected_local_branch: Option<Branch>,
    pub selected_remote_branch: Option<RemoteBranch>,
    pub selected_remote: Option<Remote>,
    pub selected_tag: Option<Tag>,
    pub selected_stash_entry: Option<StashEntry>,
    pub selected_commit_file: Option<CommitFile>,
    pub checked_out_branch: Option<Branch>,
    pub prompt_responses: Vec<String>,
}

enum Root<'a> {
    Object(Option<&'a dyn TemplateObject>),
    Responses(&'a [String]),
}

fn object<T: TemplateObject>(value: &Option<T>) -> Root<'_> {
    Root::Object(value.as_ref().map(|v| v as &dyn TemplateObject))
}

impl TemplateContext {
    fn root(&self, name: &str) -> Option<Root<'_>> {
        Some(match name {
            "SelectedLocalCommit" => object(&self.selected_local_commit),
            "SelectedReflogCommit" => object(&self.selected_reflog_commit),
            "SelectedSubCommit" => object(&self.selected_sub_commit),
            "SelectedFile" => object(&self.selected_file),
            "SelectedLocalBranch" => object(&self.selected_local_branch),
            "SelectedRemoteBranch" => object(&self.selected_remote_branch),
            "SelectedRemote" => object(&self.selected_remote),
            "SelectedTag" => object(&self.selected_tag),
            "SelectedStashEntry" => object(&self.selected_stash_entry),
            "SelectedCommitFile" => object(&self.selected_commit_file),
            "CheckedOutBranch" => object(&self.checked_out_branch),
            "PromptResponses" => Root::Responses(&self.prompt_responses),
            _ => return None,
        })
    }

    /// Evaluate a `.Root` or `.Root.Field` reference.
    fn lookup(&self, path: &str) -> Result<FieldValue, TemplateError> {
        let unknown = || TemplateError::UnknownField(path.to_string());
        let segments: Vec<&str> = path
            .strip_prefix('.')
            .ok_or_else(|| TemplateError::Unsupported(path.to_string()))?
            .split('.')
            .collect();

        let root = self.root(segments[0]).ok_or_else(unknown)?;
        match (root, &segments[1..]) {
            (Root::Responses(responses), []) => Ok(FieldValue::List(responses.to_vec())),
            (Root::Responses(_), _) => Err(unknown()),
            (Root::Object(None), _) => Err(TemplateError::NilObject(segments[0].to_string())),
            (Root::Object(Some(obj)), []) => Ok(FieldValue::Text(obj.to_string())),
            (Root::Object(Some(obj)), [field]) => obj.field(field).ok_or_else(unknown),
            (Root::Object(Some(_)), _) => Err(unknown()),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn action_pattern() -> Result<&'static Regex, TemplateError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)\{\{(?:(-)\s)?\s*(.*?)\s*(?:\s(-))?\}\}"))
        .as_ref()
        .map_err(|e| TemplateError::Pattern(e.to_string()))
}

fn evaluate(action: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
    let tokens: Vec<&str> = action.split_whitespace().collect();
    match tokens.as_slice() {
        [path] if path.starts_with('.') => ctx.lookup(path).map(|v| v.to_string()),
        ["index", target, index] => {
            let index: usize = index
                .parse()
                .map_err(|_| TemplateError::Unsupported(action.to_string()))?;
            match ctx.lookup(target)? {
                FieldValue::List(items) => {
                    items
                        .get(index)
                        .cloned()
                        .ok_or_else(|| TemplateError::IndexOutOfRange {
                            target: target.to_string(),
                            index,
                            len: items.len(),
                        })
                }
                FieldValue::Text(_) => Err(TemplateError::Unsupported(action.to_string())),
            }
        }
        _ => Err(TemplateError::Unsupported(action.to_string())),
    }
}

/// Substitute every `{{ ... }}` action in `template`.
pub fn resolve(template: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
    let pattern = action_pattern()?;
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    let mut trim_next = false;

    for caps in pattern.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let mut literal = &template[last..whole.start()];
        check_closed(literal, template)?;

        if trim_next {
            literal = literal.trim_start();
        }
        if caps.get(1).is_some() {
            literal = literal.trim_end();
        }
        out.push_str(literal);

        let action = caps.get(2).map_or("", |m| m.as_str());
        out.push_str(&evaluate(action, ctx)?);

        trim_next = caps.get(3).is_some();
        last = whole.end();
    }

    let mut tail = &template[last..];
    check_closed(tail, template)?;
    if trim_next {
        tail = tail.trim_start();
    }
    out.push_str(tail);
    Ok(out)
}

fn check_closed(literal: &str, template: &str) -> Result<(), TemplateError> {
    if literal.contains("{{") {
        return Err(TemplateError::Unclosed(template.to_string()));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
