//! Prompt chains: the compiled, runnable form of a custom command.
//!
//! A chain is a singly linked list of prompt nodes ending in the command
//! itself. It is built back to front at startup so the head is prompt 0, and
//! walked front to back at runtime by a [`ChainRun`]. The event loop drives the
//! run one step at a time: show the step's modal, feed the answer back, ask for
//! the next step. Nothing blocks while a modal is open.
use super::template::{resolve, TemplateContext, TemplateError};
use super::{MenuOption, PromptSpec};
use std::sync::Arc;

/// Text shown while a background custom command runs without its own `loading_text`.
pub const DEFAULT_LOADING_TEXT: &str = "Running custom command...";

/// An unresolved prompt as written in config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStep {
    Input {
        title: String,
        initial_value: String,
    },
    Menu {
        title: String,
        options: Vec<MenuOption>,
    },
}

#[derive(Debug)]
pub struct ChainNode {
    /// Slot in the response vector this prompt fills.
    index: usize,
    step: PromptStep,
    next: Option<Arc<ChainNode>>,
}

/// A compiled custom command.
#[derive(Debug)]
pub struct PromptChain {
    head: Option<Arc<ChainNode>>,
    len: usize,
    command: String,
    subprocess: bool,
    loading_text: String,
}

impl PromptChain {
    /// Link `prompts` into a chain ending in `command`. Prompt types are
    /// validated by the caller.
    pub(super) fn link(
        prompts: Vec<PromptStep>,
        command: String,
        subprocess: bool,
        loading_text: String,
    ) -> Self {
        let len = prompts.len();
        let mut head = None;
        for (index, step) in prompts.into_iter().enumerate().rev() {
            head = Some(Arc::new(ChainNode {
                index,
                step,
                next: head,
            }));
        }

        let loading_text = if loading_text.is_empty() {
            DEFAULT_LOADING_TEXT.to_string()
        } else {
            loading_text
        };

        Self {
            head,
            len,
            command,
            subprocess,
            loading_text,
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.len
    }

    pub fn is_subprocess(&self) -> bool {
        self.subprocess
    }

    /// Begin a fresh evaluation with an empty response vector.
    pub fn start(self: &Arc<Self>) -> ChainRun {
        ChainRun {
            chain: Arc::clone(self),
            cursor: self.head.clone(),
            responses: vec![String::new(); self.len],
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// A menu entry after template resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOption {
    pub name: String,
    pub description: String,
    pub value: String,
}

/// The fully resolved command at the end of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub command: String,
    /// Hand the terminal to the command instead of running it in the background.
    pub subprocess: bool,
    pub loading_text: String,
}

/// What the event loop should do next for a running chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStep {
    Input {
        title: String,
        initial_value: String,
    },
    Menu {
        title: String,
        options: Vec<ResolvedOption>,
    },
    Run(ResolvedCommand),
}

/// One in-progress evaluation of a [`PromptChain`].
#[derive(Debug, Clone)]
pub struct ChainRun {
    chain: Arc<PromptChain>,
    cursor: Option<Arc<ChainNode>>,
    responses: Vec<String>,
}

impl ChainRun {
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    /// Resolve the current step against `ctx`, whose prompt responses are
    /// replaced with the answers given so far.
    pub fn next_step(&self, mut ctx: TemplateContext) -> Result<ChainStep, TemplateError> {
        ctx.prompt_responses = self.responses.clone();

        let Some(node) = &self.cursor else {
            return Ok(ChainStep::Run(ResolvedCommand {
                command: resolve(&self.chain.command, &ctx)?,
                subprocess: self.chain.subprocess,
                loading_text: self.chain.loading_text.clone(),
            }));
        };

        match &node.step {
            PromptStep::Input {
                title,
                initial_value,
            } => Ok(ChainStep::Input {
                title: resolve(title, &ctx)?,
                initial_value: resolve(initial_value, &ctx)?,
            }),
            PromptStep::Menu { title, options } => {
                let options = options
                    .iter()
                    .map(|option| {
                        // Options may give only a value
                        let name_template = if option.name.is_empty() {
                            &option.value
                        } else {
                            &option.name
                        };
                        Ok(ResolvedOption {
                            name: resolve(name_template, &ctx)?,
                            description: resolve(&option.description, &ctx)?,
                            value: resolve(&option.value, &ctx)?,
                        })
                    })
                    .collect::<Result<Vec<_>, TemplateError>>()?;
                Ok(ChainStep::Menu {
                    title: resolve(title, &ctx)?,
                    options,
                })
            }
        }
    }

    /// Store the answer to the current prompt and move to the next step.
    /// Returns `false` if the chain was already at its command.
    pub fn answer(&mut self, value: impl Into<String>) -> bool {
        let Some(node) = self.cursor.take() else {
            return false;
        };
        self.responses[node.index] = value.into();
        self.cursor = node.next.clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_commands::{compile_chain, CustomCommand};
    use crate::models::Branch;
    use pretty_assertions::assert_eq;

    fn input(title: &str, initial: &str) -> PromptSpec {
        PromptSpec {
            kind: "input".into(),
            title: title.into(),
            initial_value: initial.into(),
            options: vec![],
        }
    }

    fn chain(command: &str, prompts: Vec<PromptSpec>) -> Arc<PromptChain> {
        let cmd = CustomCommand {
            key: "x".into(),
            context: "global".into(),
            command: command.into(),
            prompts,
            ..Default::default()
        };
        Arc::new(compile_chain(&cmd).unwrap())
    }

    #[test]
    fn test_no_prompts_runs_immediately() {
        let chain = chain("echo {{.SelectedLocalBranch.Name}}", vec![]);
        let ctx = TemplateContext {
            selected_local_branch: Some(Branch {
                name: "main".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let run = chain.start();
        assert_eq!(
            run.next_step(ctx).unwrap(),
            ChainStep::Run(ResolvedCommand {
                command: "echo main".into(),
                subprocess: false,
                loading_text: DEFAULT_LOADING_TEXT.into(),
            })
        );
    }

    #[test]
    fn test_prompts_run_in_order_and_see_earlier_answers() {
        let chain = chain(
            "git commit -m '{{index .PromptResponses 1}}'",
            vec![
                input("Scope", ""),
                input("Message for {{index .PromptResponses 0}}", "{{index .PromptResponses 0}}: "),
            ],
        );
        let mut run = chain.start();

        let step = run.next_step(TemplateContext::default()).unwrap();
        assert_eq!(
            step,
            ChainStep::Input {
                title: "Scope".into(),
                initial_value: String::new()
            }
        );
        assert!(run.answer("ui"));

        let step = run.next_step(TemplateContext::default()).unwrap();
        assert_eq!(
            step,
            ChainStep::Input {
                title: "Message for ui".into(),
                initial_value: "ui: ".into()
            }
        );
        assert!(run.answer("ui: fix"));

        let ChainStep::Run(cmd) = run.next_step(TemplateContext::default()).unwrap() else {
            panic!("expected command");
        };
        assert_eq!(cmd.command, "git commit -m 'ui: fix'");
        assert!(!run.answer("extra"));
    }

    #[test]
    fn test_earlier_prompt_sees_later_slot_empty() {
        let chain = chain(
            "true",
            vec![input("{{index .PromptResponses 1}}", ""), input("b", "")],
        );
        let run = chain.start();
        let ChainStep::Input { title, .. } = run.next_step(TemplateContext::default()).unwrap()
        else {
            panic!("expected input");
        };
        assert_eq!(title, "");
    }

    #[test]
    fn test_menu_option_without_name_shows_value() {
        let chain = chain(
            "git fetch {{index .PromptResponses 0}}",
            vec![PromptSpec {
                kind: "menu".into(),
                title: "Remote".into(),
                initial_value: String::new(),
                options: vec![MenuOption {
                    name: String::new(),
                    description: String::new(),
                    value: "origin".into(),
                }],
            }],
        );
        let mut run = chain.start();
        let ChainStep::Menu { options, .. } = run.next_step(TemplateContext::default()).unwrap()
        else {
            panic!("expected menu");
        };
        assert_eq!(options[0].name, "origin");
        assert_eq!(options[0].value, "origin");

        run.answer(options[0].value.clone());
        assert_eq!(run.responses(), &["origin".to_string()]);
        let ChainStep::Run(cmd) = run.next_step(TemplateContext::default()).unwrap() else {
            panic!("expected command");
        };
        assert_eq!(cmd.command, "git fetch origin");
    }

    #[test]
    fn test_template_error_aborts_step() {
        let chain = chain("echo {{.SelectedFile.Name}}", vec![]);
        let run = chain.start();
        assert!(run.next_step(TemplateContext::default()).is_err());
    }

    #[test]
    fn test_runs_are_independent() {
        let chain = chain("echo {{index .PromptResponses 0}}", vec![input("t", "")]);
        let mut first = chain.start();
        let second = chain.start();
        first.answer("a");
        assert_eq!(second.responses(), &[String::new()]);
    }
}
