//! Fakes shared by the integration tests.
//!
//! `FakeRepo` serves canned panel data and scripted push results;
//! `RecordingRunner` records every shell command instead of running it.

#![allow(dead_code)]

use async_trait::async_trait;
use gitdeck::app::{App, AppEvent};
use gitdeck::config::Config;
use gitdeck::git::{CommandRunner, GitError, PreviewTarget, PullMode, PushOptions, RepoSource};
use gitdeck::keybindings::{BindingTable, KeyConfig};
use gitdeck::panels::{PanelData, PanelKind, PanelRequest};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::PathBuf;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

#[derive(Default)]
pub struct FakeRepo {
    data: Mutex<HashMap<PanelKind, PanelData>>,
    loads: Mutex<Vec<PanelKind>>,
    /// When set, every load waits for a permit.
    gate: Option<Semaphore>,
    push_results: Mutex<VecDeque<Result<(), GitError>>>,
    pushes: Mutex<Vec<PushOptions>>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads block until [`FakeRepo::release`] hands out permits.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn release(&self, loads: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(loads);
        }
    }

    pub fn set(&self, data: PanelData) {
        self.data.lock().unwrap().insert(data.kind(), data);
    }

    pub fn script_push(&self, result: Result<(), GitError>) {
        self.push_results.lock().unwrap().push_back(result);
    }

    pub fn loads_of(&self, kind: PanelKind) -> usize {
        self.loads.lock().unwrap().iter().filter(|k| **k == kind).count()
    }

    pub fn pushes(&self) -> Vec<PushOptions> {
        self.pushes.lock().unwrap().clone()
    }
}

fn empty(kind: PanelKind) -> PanelData {
    match kind {
        PanelKind::Files => PanelData::Files(Vec::new()),
        PanelKind::Branches => PanelData::Branches(Vec::new()),
        PanelKind::Remotes => PanelData::Remotes(Vec::new()),
        PanelKind::RemoteBranches => PanelData::RemoteBranches(Vec::new()),
        PanelKind::Tags => PanelData::Tags(Vec::new()),
        PanelKind::Commits => PanelData::Commits(Vec::new()),
        PanelKind::ReflogCommits => PanelData::ReflogCommits(Vec::new()),
        PanelKind::SubCommits => PanelData::SubCommits(Vec::new()),
        PanelKind::CommitFiles => PanelData::CommitFiles(Vec::new()),
        PanelKind::Stash => PanelData::Stash(Vec::new()),
    }
}

#[async_trait]
impl RepoSource for FakeRepo {
    async fn load(&self, request: &PanelRequest) -> Result<PanelData, GitError> {
        self.loads.lock().unwrap().push(request.kind);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let data = self.data.lock().unwrap().get(&request.kind).cloned();
        Ok(data.unwrap_or_else(|| empty(request.kind)))
    }

    async fn preview(&self, target: &PreviewTarget) -> Result<String, GitError> {
        Ok(format!("{:?}", target))
    }

    async fn fetch(&self) -> Result<(), GitError> {
        Ok(())
    }

    async fn pull(&self, _mode: PullMode) -> Result<(), GitError> {
        Ok(())
    }

    async fn push(&self, options: &PushOptions) -> Result<(), GitError> {
        self.pushes.lock().unwrap().push(options.clone());
        self.push_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn set_upstream(&self, _upstream: &str) -> Result<(), GitError> {
        Ok(())
    }

    async fn stage(&self, _path: &str) -> Result<(), GitError> {
        Ok(())
    }

    async fn unstage(&self, _path: &str) -> Result<(), GitError> {
        Ok(())
    }

    async fn stage_all(&self) -> Result<(), GitError> {
        Ok(())
    }

    async fn unstage_all(&self) -> Result<(), GitError> {
        Ok(())
    }

    async fn checkout(&self, _branch: &str) -> Result<(), GitError> {
        Ok(())
    }
}

/// Records shell command lines and reports success.
#[derive(Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[cfg(unix)]
fn success() -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(0)
}

#[cfg(windows)]
fn success() -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(0)
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, _program: &str, args: &[String]) -> io::Result<Output> {
        // Shell invocations are `<flag> <command line>`
        if let Some(command) = args.last() {
            self.commands.lock().unwrap().push(command.clone());
        }
        Ok(Output {
            status: success(),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

/// Build an app from a TOML config against the given fakes.
pub fn app_with(config: &str, repo: Arc<FakeRepo>, runner: Arc<RecordingRunner>) -> App {
    let config = Config::parse(config).unwrap();
    let (keys, _) = KeyConfig::with_overrides(&config.keybinding_overrides().unwrap());
    let bindings = BindingTable::build(&keys, &config.custom_commands).unwrap();
    App::new(config, PathBuf::from("config.toml"), keys, bindings, repo, runner)
}

pub fn channel() -> (mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
    mpsc::channel(64)
}

/// Wait for the next background task event.
pub async fn next_event(rx: &mut mpsc::Receiver<AppEvent>) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an app event")
        .expect("event channel closed")
}

/// Feed events back into the app until one matches `done`.
pub async fn pump_until(
    app: &mut App,
    tx: &mpsc::Sender<AppEvent>,
    rx: &mut mpsc::Receiver<AppEvent>,
    done: impl Fn(&AppEvent) -> bool,
) {
    loop {
        let event = next_event(rx).await;
        let stop = done(&event);
        gitdeck::ui::handle_app_event(app, event, tx);
        if stop {
            return;
        }
    }
}
