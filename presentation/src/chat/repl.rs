//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::{COMMANDS, ChatCommand, CommandError};
use super::helper::ChatHelper;
use crate::config::ReplConfig;
use crate::{ConsoleFormatter, ProgressReporter};
use musing_application::{
    ArchiveError, ChatError, ChatState, ConversationArchive, NoProgress, ProgressNotifier,
    SendMessageOutput, SendMessageUseCase,
};
use musing_domain::{DomainError, SamplingSettings};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Editor, Result as RlResult};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Errors reported back to the user after a REPL action.
#[derive(Error, Debug)]
pub enum ReplError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Storage is disabled (set [storage] backend in the config)")]
    NoStorage,

    #[error("Could not write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What the loop should do after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplOutput {
    Text(String),
    Quit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    state: ChatState,
    chat: SendMessageUseCase,
    archive: Option<ConversationArchive>,
    config: ReplConfig,
}

impl ChatRepl {
    pub fn new(state: ChatState, chat: SendMessageUseCase) -> Self {
        Self {
            state,
            chat,
            archive: None,
            config: ReplConfig::default(),
        }
    }

    /// Enable `/save`, `/load` and `/saved`.
    pub fn with_archive(mut self, archive: ConversationArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl: Editor<ChatHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ChatHelper));

        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let prompt = format!("{}> ", self.state.registry.current_name());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(line);

                    match self.handle_line(line).await {
                        Ok(ReplOutput::Quit) => {
                            println!("Bye!");
                            break;
                        }
                        Ok(ReplOutput::Text(text)) => {
                            if !text.is_empty() {
                                println!("{text}");
                            }
                        }
                        Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
                    }
                    if self.chat.is_degraded() {
                        println!(
                            "{}",
                            ConsoleFormatter::warning(
                                "Degraded mode: automatic retries are off. Type /ack to re-enable."
                            )
                        );
                    }
                    println!();
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path
            && let Err(e) = rl.save_history(path)
        {
            warn!("Could not save history to {}: {}", path.display(), e);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              Musing - Chat Mode             │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        if let Ok(conversation) = self.state.current() {
            println!(
                "{}",
                ConsoleFormatter::settings(conversation, self.chat.params().model.as_str())
            );
        }
        println!("Type a message, or /help for commands.");
        println!();
    }

    /// Handle one input line: a slash command or a prompt.
    pub async fn handle_line(&mut self, line: &str) -> Result<ReplOutput, ReplError> {
        if line.starts_with('/') {
            let command = ChatCommand::parse(line)?;
            self.execute(command).await
        } else {
            self.ask(line).await.map(ReplOutput::Text)
        }
    }

    fn progress(&self) -> Box<dyn ProgressNotifier> {
        if self.config.show_progress {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(NoProgress)
        }
    }

    fn render_reply(&self, output: &SendMessageOutput) -> String {
        let reasoning = self.state.visible_reasoning(output.result.reasoning());
        let mut text = ConsoleFormatter::reply(&output.result.visible_text, reasoning);
        let usage = ConsoleFormatter::usage_line(output.usage, output.attempts);
        if !usage.is_empty() {
            text.push_str(&format!("\n{usage}"));
        }
        text
    }

    async fn ask(&mut self, prompt: &str) -> Result<String, ReplError> {
        let progress = self.progress();
        let conversation = self.state.registry.current_mut()?;
        let output = self.chat.send(conversation, prompt, progress.as_ref()).await?;
        Ok(self.render_reply(&output))
    }

    fn archive(&self) -> Result<&ConversationArchive, ReplError> {
        self.archive.as_ref().ok_or(ReplError::NoStorage)
    }

    fn update_sampling(
        &mut self,
        update: impl FnOnce(SamplingSettings) -> SamplingSettings,
    ) -> Result<String, ReplError> {
        let conversation = self.state.current_mut()?;
        let sampling = update(conversation.sampling());
        conversation.set_sampling(sampling)?;
        Ok(ConsoleFormatter::success(&format!(
            "Temperature {}, max tokens {}",
            sampling.temperature, sampling.max_output_tokens
        )))
    }

    /// Execute a parsed slash command.
    pub async fn execute(&mut self, command: ChatCommand) -> Result<ReplOutput, ReplError> {
        let text = match command {
            ChatCommand::New(name) => {
                self.state.registry.create(&name)?;
                ConsoleFormatter::success(&format!("Created '{name}'"))
            }
            ChatCommand::Switch(name) => {
                self.state.registry.select(&name)?;
                ConsoleFormatter::success(&format!("Switched to '{name}'"))
            }
            ChatCommand::List => ConsoleFormatter::conversation_list(&self.state),
            ChatCommand::DeleteChat(name) => {
                self.state.registry.remove(&name)?;
                ConsoleFormatter::success(&format!(
                    "Deleted '{name}', now in '{}'",
                    self.state.registry.current_name()
                ))
            }
            ChatCommand::History => {
                ConsoleFormatter::history(self.state.current()?, &self.state)
            }
            ChatCommand::System(prompt) => {
                self.state.current_mut()?.set_system_prompt(&prompt);
                ConsoleFormatter::success("System prompt updated")
            }
            ChatCommand::Thinking(on) => {
                self.state.current_mut()?.set_force_reasoning(on);
                ConsoleFormatter::success(&format!(
                    "Chain-of-thought {}",
                    if on { "requested" } else { "not requested" }
                ))
            }
            ChatCommand::ShowThinking(on) => {
                self.state.show_reasoning = on;
                ConsoleFormatter::success(&format!(
                    "Reasoning {}",
                    if on { "shown" } else { "hidden" }
                ))
            }
            ChatCommand::Temperature(temperature) => {
                self.update_sampling(|s| SamplingSettings { temperature, ..s })?
            }
            ChatCommand::MaxTokens(max_output_tokens) => {
                self.update_sampling(|s| SamplingSettings {
                    max_output_tokens,
                    ..s
                })?
            }
            ChatCommand::Edit { index, text } => {
                self.state.current_mut()?.edit_turn(index, text)?;
                ConsoleFormatter::success(&format!("Edited turn {}", index + 1))
            }
            ChatCommand::Delete(index) => {
                let removed = self.state.current_mut()?.delete_turn(index)?;
                ConsoleFormatter::success(&format!(
                    "Deleted turn {} ({})",
                    index + 1,
                    removed.role
                ))
            }
            ChatCommand::Retry(index) => {
                let progress = self.progress();
                let conversation = self.state.registry.current_mut()?;
                let output = self
                    .chat
                    .regenerate(conversation, index, progress.as_ref())
                    .await?;
                self.render_reply(&output)
            }
            ChatCommand::Clear => {
                self.state.current_mut()?.clear_turns();
                ConsoleFormatter::success("Conversation cleared")
            }
            ChatCommand::Save => {
                let archive = self.archive()?;
                let conversation = self.state.current()?;
                archive.save(conversation.name(), conversation).await?;
                ConsoleFormatter::success(&format!(
                    "Saved '{}' ({})",
                    conversation.name(),
                    archive.backend()
                ))
            }
            ChatCommand::Load(name) => {
                let name = name.unwrap_or_else(|| self.state.registry.current_name().to_string());
                let loaded = self.archive()?.load(&name).await?;
                match loaded {
                    Some(conversation) => {
                        let turns = conversation.len();
                        self.state.registry.insert(conversation);
                        self.state.registry.select(&name)?;
                        ConsoleFormatter::success(&format!("Loaded '{name}' ({turns} turns)"))
                    }
                    None => ConsoleFormatter::warning(&format!("No saved conversation '{name}'")),
                }
            }
            ChatCommand::Saved => {
                let names = self.archive()?.list_names().await;
                if names.is_empty() {
                    "(no saved conversations)".to_string()
                } else {
                    names.join("\n")
                }
            }
            ChatCommand::Export { format, path } => {
                let rendered = format
                    .render(self.state.current()?)
                    .map_err(|source| ReplError::Export {
                        path: path.clone(),
                        source,
                    })?;
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|source| ReplError::Export {
                            path: path.clone(),
                            source,
                        })?;
                }
                tokio::fs::write(&path, rendered)
                    .await
                    .map_err(|source| ReplError::Export {
                        path: path.clone(),
                        source,
                    })?;
                ConsoleFormatter::success(&format!("Exported to {}", path.display()))
            }
            ChatCommand::Ack => {
                if self.chat.is_degraded() {
                    self.chat.acknowledge_degraded();
                    ConsoleFormatter::success("Automatic retries re-enabled")
                } else {
                    "Not in degraded mode".to_string()
                }
            }
            ChatCommand::Help => Self::help(),
            ChatCommand::Quit => return Ok(ReplOutput::Quit),
        };
        Ok(ReplOutput::Text(text))
    }

    fn help() -> String {
        let mut lines = vec!["Commands:".to_string()];
        lines.extend(COMMANDS.iter().map(|(_, usage)| format!("  {usage}")));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::export::ExportFormat;
    use async_trait::async_trait;
    use musing_application::{
        ChatParams, CompletionInvoker, CompletionRequest, CompletionResponse,
        ConversationStore, GatewayError, LlmGateway, RetryPolicy, StorageError,
    };
    use musing_domain::{ConversationDefaults, ReasoningDisplay, Role};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Replies with a fixed text, or fails every call.
    struct FixedGateway {
        reply: Result<String, GatewayError>,
    }

    #[async_trait]
    impl LlmGateway for FixedGateway {
        fn provider(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, GatewayError> {
            self.reply.clone().map(CompletionResponse::from_text)
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl ConversationStore for MemoryStore {
        fn backend(&self) -> &str {
            "memory"
        }

        async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
            self.objects.lock().unwrap().insert(key.to_string(), bytes);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(self.objects.lock().unwrap().get(key).cloned())
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    fn repl(reply: Result<&str, GatewayError>) -> ChatRepl {
        colored::control::set_override(false);
        let gateway = Arc::new(FixedGateway {
            reply: reply.map(str::to_string),
        });
        let params = ChatParams::default()
            .with_completion_retry(RetryPolicy::immediate(2))
            .with_degraded_threshold(2);
        let chat = SendMessageUseCase::new(CompletionInvoker::new(gateway), params);
        let state =
            ChatState::new(ConversationDefaults::default(), true, ReasoningDisplay::WhenPresent)
                .unwrap();
        ChatRepl::new(state, chat).with_config(ReplConfig {
            show_progress: false,
            history_file: None,
        })
    }

    fn text(output: ReplOutput) -> String {
        match output {
            ReplOutput::Text(text) => text,
            ReplOutput::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_prompt_appends_turns_and_shows_reasoning() {
        let mut repl = repl(Ok("<thinking>add the numbers</thinking>4"));

        let output = text(repl.handle_line("2+2?").await.unwrap());

        assert_eq!(output, "Thinking:\n  add the numbers\n\n4");
        let conversation = repl.state().current().unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[1].reasoning.as_deref(), Some("add the numbers"));
    }

    #[tokio::test]
    async fn test_show_thinking_off_hides_reasoning() {
        let mut repl = repl(Ok("<thinking>x</thinking>4"));
        repl.handle_line("/show-thinking off").await.unwrap();

        let output = text(repl.handle_line("2+2?").await.unwrap());
        assert_eq!(output, "4");
    }

    #[tokio::test]
    async fn test_conversation_management() {
        let mut repl = repl(Ok("ok"));

        repl.handle_line("/new math").await.unwrap();
        assert_eq!(repl.state().registry.current_name(), "math");
        assert!(repl.handle_line("/new math").await.is_err());

        repl.handle_line("/switch Default").await.unwrap();
        repl.handle_line("/delete-chat Default").await.unwrap();
        assert_eq!(repl.state().registry.current_name(), "math");
        assert!(matches!(
            repl.handle_line("/switch nowhere").await,
            Err(ReplError::Domain(DomainError::UnknownConversation(_)))
        ));
    }

    #[tokio::test]
    async fn test_settings_commands() {
        let mut repl = repl(Ok("ok"));

        repl.handle_line("/system   Be terse.  ").await.unwrap();
        repl.handle_line("/thinking on").await.unwrap();
        repl.handle_line("/temp 0.2").await.unwrap();
        repl.handle_line("/max-tokens 64").await.unwrap();

        let conversation = repl.state().current().unwrap();
        assert_eq!(conversation.system_prompt(), "Be terse.");
        assert!(conversation.force_reasoning());
        assert_eq!(conversation.sampling().temperature, 0.2);
        assert_eq!(conversation.sampling().max_output_tokens, 64);

        assert!(matches!(
            repl.handle_line("/temp 1.5").await,
            Err(ReplError::Domain(DomainError::InvalidSampling(_)))
        ));
        assert!(matches!(
            repl.handle_line("/max-tokens 0").await,
            Err(ReplError::Domain(DomainError::InvalidSampling(_)))
        ));
    }

    #[tokio::test]
    async fn test_edit_delete_retry_clear() {
        let mut repl = repl(Ok("4"));
        repl.handle_line("2+2?").await.unwrap();
        repl.handle_line("3+3?").await.unwrap();

        repl.handle_line("/edit 3 what is 5+5?").await.unwrap();
        repl.handle_line("/retry 1").await.unwrap();
        let conversation = repl.state().current().unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[0].text, "2+2?");

        assert!(matches!(
            repl.handle_line("/retry 2").await,
            Err(ReplError::Chat(ChatError::Domain(DomainError::NotAUserTurn(1))))
        ));

        repl.handle_line("/delete 2").await.unwrap();
        assert_eq!(repl.state().current().unwrap().turns()[0].role, Role::User);
        assert!(repl.handle_line("/delete 9").await.is_err());

        repl.handle_line("/clear").await.unwrap();
        assert!(repl.state().current().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_enter_degraded_mode_until_ack() {
        let mut repl = repl(Err(GatewayError::Timeout));

        assert!(repl.handle_line("hi").await.is_err());
        assert!(repl.handle_line("hi").await.is_err());
        assert!(repl.chat.is_degraded());

        let output = text(repl.handle_line("/ack").await.unwrap());
        assert!(output.contains("re-enabled"));
        assert!(!repl.chat.is_degraded());
        // Failed sends keep their user turns.
        assert_eq!(repl.state().current().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_storage_commands_need_an_archive() {
        let mut repl = repl(Ok("ok"));
        assert!(matches!(
            repl.handle_line("/save").await,
            Err(ReplError::NoStorage)
        ));
    }

    #[tokio::test]
    async fn test_save_load_and_list() {
        let archive = ConversationArchive::new(
            Arc::new(MemoryStore::default()),
            RetryPolicy::no_retry(),
        );
        let mut repl = repl(Ok("4")).with_archive(archive);

        repl.handle_line("2+2?").await.unwrap();
        repl.handle_line("/save").await.unwrap();
        repl.handle_line("/delete-chat Default").await.unwrap();
        assert!(repl.state().current().unwrap().is_empty());

        let output = text(repl.handle_line("/load Default").await.unwrap());
        assert!(output.contains("2 turns"));
        assert_eq!(repl.state().current().unwrap().len(), 2);

        let saved = text(repl.handle_line("/saved").await.unwrap());
        assert_eq!(saved, "Default");

        let missing = text(repl.handle_line("/load nothing").await.unwrap());
        assert!(missing.contains("No saved conversation"));
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/chat.csv");
        let mut repl = repl(Ok("4"));
        repl.handle_line("2+2?").await.unwrap();

        repl.execute(ChatCommand::Export {
            format: ExportFormat::Csv,
            path: path.clone(),
        })
        .await
        .unwrap();

        let csv = std::fs::read_to_string(path).unwrap();
        assert!(csv.starts_with("role,content,reasoning,timestamp\r\nuser,2+2?,,"));
    }

    #[tokio::test]
    async fn test_quit_and_help() {
        let mut repl = repl(Ok("ok"));
        assert_eq!(repl.handle_line("/quit").await.unwrap(), ReplOutput::Quit);
        let help = text(repl.handle_line("/help").await.unwrap());
        assert!(help.contains("/export csv|md PATH"));
        assert!(matches!(
            repl.handle_line("/bogus").await,
            Err(ReplError::Command(CommandError::Unknown(_)))
        ));
    }
}
