//! CLI entrypoint for musing
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use musing_application::{
    ChatState, CompletionInvoker, ConversationArchive, ConversationLogger, ConversationStore,
    LlmGateway, NoConversationLogger, NoProgress, ProgressNotifier, SendMessageUseCase,
};
use musing_domain::Model;
use musing_infrastructure::config::expand_home;
use musing_infrastructure::{
    ConfigLoader, FileConfig, JsonlConversationLogger, LocalConversationStore, ProviderKind,
    StorageBackend,
};
use musing_presentation::{
    ChatRepl, Cli, ConsoleFormatter, ProgressReporter, ProviderArg, ReplConfig,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        let config = if cli.no_config {
            ConfigLoader::load_defaults()
        } else {
            ConfigLoader::load(cli.config.as_deref())?
        };
        println!();
        println!("{}", ConfigLoader::render(&config)?);
        return Ok(());
    }

    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;
    info!("Starting musing");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        let (config, warnings) = ConfigLoader::load_validated(cli.config.as_deref())?;
        for warning in &warnings {
            warn!("{}", warning.message);
        }
        config
    };

    if !config.output.color {
        colored::control::set_override(false);
    }

    let (mut params, _) = config.to_chat_params();
    if let Some(model) = &cli.model {
        let Ok(model) = model.parse::<Model>();
        params = params.with_model(model);
    }
    let (mut defaults, _) = config.conversation_defaults();
    if cli.thinking {
        defaults.force_reasoning = true;
    }
    let (reasoning_display, _) = config.chat.parse_reasoning_display();

    // === Dependency Injection ===
    let conversation_logger = build_conversation_logger(&config);
    let provider = match cli.provider {
        Some(ProviderArg::Bedrock) => ProviderKind::Bedrock,
        Some(ProviderArg::Anthropic) => ProviderKind::Anthropic,
        None => config.providers.parse_default().0,
    };
    let gateway = build_gateway(provider, &config).await?;
    info!(provider = gateway.provider(), model = %params.model, "Completion transport ready");

    let archive = build_store(&config).await.map(|store| {
        ConversationArchive::new(store, params.storage_retry)
            .with_conversation_logger(conversation_logger.clone())
    });

    let invoker =
        CompletionInvoker::new(gateway).with_conversation_logger(conversation_logger.clone());
    let chat = SendMessageUseCase::new(invoker, params);

    let mut state = ChatState::new(
        defaults,
        config.chat.show_reasoning && !cli.hide_thinking,
        reasoning_display,
    )?;
    state.open(&cli.conversation)?;

    if cli.resume {
        resume(&mut state, archive.as_ref(), &cli.conversation).await?;
    }

    // Chat mode
    let Some(prompt) = cli.prompt.as_deref() else {
        let repl_config = ReplConfig {
            show_progress: config.repl.show_progress && !cli.quiet,
            history_file: config.repl.history_file.as_deref().map(expand_home),
        };
        let mut repl = ChatRepl::new(state, chat).with_config(repl_config);
        if let Some(archive) = archive {
            repl = repl.with_archive(archive);
        }
        repl.run().await?;
        return Ok(());
    };

    // Single-shot mode
    let progress: Box<dyn ProgressNotifier> = if cli.quiet || !config.repl.show_progress {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    let output = {
        let conversation = state.current_mut()?;
        chat.send(conversation, prompt, progress.as_ref()).await?
    };
    let reasoning = state.visible_reasoning(output.result.reasoning());
    println!(
        "{}",
        ConsoleFormatter::reply(&output.result.visible_text, reasoning)
    );

    if cli.save {
        let archive = archive
            .as_ref()
            .context("--save needs a storage backend ([storage] backend = \"none\")")?;
        let conversation = state.current()?;
        archive.save(conversation.name(), conversation).await?;
        info!("Saved '{}' to {}", conversation.name(), archive.backend());
    }

    Ok(())
}

/// Install the tracing subscriber. The returned guard flushes the log file on drop.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Could not create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn build_conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    config
        .logging
        .conversation_log
        .as_deref()
        .and_then(|path| JsonlConversationLogger::open(expand_home(path)))
        .map(|logger| {
            info!("Transcript log: {}", logger.path().display());
            Arc::new(logger) as Arc<dyn ConversationLogger>
        })
        .unwrap_or_else(|| Arc::new(NoConversationLogger))
}

async fn build_gateway(provider: ProviderKind, config: &FileConfig) -> Result<Arc<dyn LlmGateway>> {
    match provider {
        #[cfg(feature = "bedrock")]
        ProviderKind::Bedrock => Ok(Arc::new(
            musing_infrastructure::BedrockGateway::new(&config.providers.bedrock).await,
        )),
        #[cfg(feature = "anthropic")]
        ProviderKind::Anthropic => Ok(Arc::new(musing_infrastructure::AnthropicGateway::new(
            &config.providers.anthropic,
        )?)),
        #[allow(unreachable_patterns)]
        other => {
            let _ = config;
            bail!(
                "Provider '{}' is not available: musing was built without the `{}` feature",
                other.as_str(),
                other.as_str()
            )
        }
    }
}

async fn build_store(config: &FileConfig) -> Option<Arc<dyn ConversationStore>> {
    let (backend, _) = config.storage.parse_backend();
    match backend {
        StorageBackend::None => None,
        StorageBackend::Local => {
            let store = LocalConversationStore::new(expand_home(&config.storage.local_root));
            info!(root = %store.root().display(), "Local conversation store");
            Some(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        StorageBackend::S3 => Some(Arc::new(
            musing_infrastructure::S3ConversationStore::new(
                &config.storage.s3_bucket,
                &config.storage.s3_region,
            )
            .await,
        )),
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => {
            warn!("S3 storage requested but musing was built without the `s3` feature");
            None
        }
    }
}

/// Replace the named conversation with its saved copy, if there is one.
async fn resume(
    state: &mut ChatState,
    archive: Option<&ConversationArchive>,
    name: &str,
) -> Result<()> {
    let Some(archive) = archive else {
        bail!("--resume needs a storage backend ([storage] backend is \"none\")");
    };
    match archive.load(name).await? {
        Some(conversation) => {
            info!("Resumed '{}' ({} turns)", name, conversation.len());
            state.registry.insert(conversation);
            state.registry.select(name)?;
        }
        None => warn!("No saved conversation '{}', starting fresh", name),
    }
    Ok(())
}
