use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use muse_contracts::chat::{parse_command, ChatCommand, CHAT_HELP_COMMANDS};
use muse_contracts::models::{Capability, ModelSelection, ModelSelector};
use muse_contracts::{ChatMessage, ChatRequest, ConversationContext};
use muse_engine::clarification::ClarificationAdvisor;
use muse_engine::providers::{image_generator_for, text_generator_for, ReplicateClient};
use muse_engine::{ChatSession, DecisionEngine, Router};
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_TEXT_MODEL: &str = "claude-3.7-sonnet";
const DEFAULT_IMAGE_MODEL: &str = "flux-schnell";

#[derive(Debug, Parser)]
#[command(
    name = "muse",
    version,
    about = "Chat assistant that routes each turn to text, image or clarification"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat session.
    Chat(ChatArgs),
    /// Score a prompt and print the routing decision without dispatching.
    Decide(DecideArgs),
    /// Run one API-shaped turn from a request file.
    Route(RouteArgs),
    /// Report backend configuration.
    Health,
}

#[derive(Debug, Args)]
struct ModelArgs {
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[command(flatten)]
    models: ModelArgs,
}

#[derive(Debug, Parser)]
struct DecideArgs {
    #[arg(long)]
    prompt: String,
    /// Conversation context JSON, as written by `/export`.
    #[arg(long)]
    context: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct RouteArgs {
    /// JSON body with `message` and `context`.
    #[arg(long)]
    request: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[command(flatten)]
    models: ModelArgs,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("muse error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Decide(args) => run_decide(args),
        Command::Route(args) => run_route(args),
        Command::Health => run_health(),
    }
}

struct SelectedModels {
    text: ModelSelection,
    image: ModelSelection,
}

impl SelectedModels {
    fn event_payload(&self) -> Value {
        json!({
            "text_model": self.text.model.name,
            "text_fallback_reason": self.text.fallback_reason,
            "image_model": self.image.model.name,
            "image_fallback_reason": self.image.fallback_reason,
        })
    }
}

fn select(
    selector: &ModelSelector,
    requested: &str,
    capability: Capability,
) -> Result<ModelSelection> {
    selector
        .select(Some(requested), capability)
        .map_err(|message| anyhow!(message))
}

fn build_router(models: &ModelArgs, out_dir: &Path) -> Result<(Router, SelectedModels)> {
    let selector = ModelSelector::new(None);
    let text = select(&selector, &models.text_model, Capability::Text)?;
    let image = select(&selector, &models.image_model, Capability::Image)?;
    for selection in [&text, &image] {
        if let Some(reason) = selection.fallback_reason.as_deref() {
            eprintln!("{reason} Using {}.", selection.model.name);
        }
    }

    let router = Router::new(
        text_generator_for(&text.model)?,
        image_generator_for(&image.model, out_dir)?,
        Box::new(ClarificationAdvisor::new()),
    );
    Ok((router, SelectedModels { text, image }))
}

fn run_chat(args: ChatArgs) -> Result<()> {
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let (router, selected) = build_router(&args.models, &args.out)?;
    let mut session = ChatSession::new(router).record_events(&events_path);

    session.emit(
        "session_started",
        json!({
            "out_dir": args.out.to_string_lossy(),
            "events": events_path.to_string_lossy(),
        }),
    )?;
    session.emit("models_selected", selected.event_payload())?;
    info!(session_id = session.session_id(), "chat session started");

    let selector = ModelSelector::new(None);
    let stdin = io::stdin();
    let mut line = String::new();

    println!("Muse chat started. Type /help for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        match parse_command(input) {
            ChatCommand::Noop => continue,
            ChatCommand::Help => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
            }
            ChatCommand::SetTextModel(name) => {
                if name.is_empty() {
                    println!("Text model: {}", session.router().text_backend());
                    continue;
                }
                match switch_model(&mut session, &selector, &name, Capability::Text, &args.out) {
                    Ok(model) => println!("Text model set to {model}"),
                    Err(err) => println!("Could not switch text model: {err:#}"),
                }
            }
            ChatCommand::SetImageModel(name) => {
                if name.is_empty() {
                    println!("Image model: {}", session.router().image_backend());
                    continue;
                }
                match switch_model(&mut session, &selector, &name, Capability::Image, &args.out) {
                    Ok(model) => println!("Image model set to {model}"),
                    Err(err) => println!("Could not switch image model: {err:#}"),
                }
            }
            ChatCommand::Explain(text) => {
                if text.is_empty() {
                    println!("/explain requires some text");
                    continue;
                }
                let analysis = session.explain(&text);
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            }
            ChatCommand::UseImage(path) => {
                if path.is_empty() {
                    println!("/use requires an image path or URL");
                    continue;
                }
                println!("Next image turn will build on {path}");
                session.use_image(path);
            }
            ChatCommand::History => {
                if session.context().is_empty() {
                    println!("No messages yet.");
                }
                for message in &session.context().messages {
                    println!("{}", history_line(message));
                }
            }
            ChatCommand::Reset => {
                session.reset();
                println!("Conversation cleared.");
            }
            ChatCommand::Export(path) => {
                let path = if path.is_empty() {
                    args.out.join("context.json")
                } else {
                    PathBuf::from(path)
                };
                match session.export(&path) {
                    Ok(()) => println!("Conversation exported to {}", path.display()),
                    Err(err) => println!("Export failed: {err:#}"),
                }
            }
            ChatCommand::Unknown { command, .. } => {
                println!("Unknown command: /{command}. Type /help for commands.");
            }
            ChatCommand::Turn(text) => match session.send(&text) {
                Ok(reply) => print_reply(&reply),
                Err(err) => println!("Message rejected: {err:#}"),
            },
        }
    }

    session.finish()?;
    Ok(())
}

/// Swaps the backend for `capability` and returns the chosen model name.
fn switch_model(
    session: &mut ChatSession,
    selector: &ModelSelector,
    requested: &str,
    capability: Capability,
    out_dir: &Path,
) -> Result<String> {
    let selection = select(selector, requested, capability)?;
    if let Some(reason) = selection.fallback_reason.as_deref() {
        println!("{reason}");
    }
    let payload = match capability {
        Capability::Text => {
            session
                .router_mut()
                .set_text_generator(text_generator_for(&selection.model)?);
            json!({
                "text_model": selection.model.name,
                "text_fallback_reason": selection.fallback_reason,
            })
        }
        Capability::Image => {
            session
                .router_mut()
                .set_image_generator(image_generator_for(&selection.model, out_dir)?);
            json!({
                "image_model": selection.model.name,
                "image_fallback_reason": selection.fallback_reason,
            })
        }
    };
    session.emit("models_selected", payload)?;
    Ok(selection.model.name)
}

fn history_line(message: &ChatMessage) -> String {
    let mut line = message.render_line();
    if let Some(tool) = message.tool_used() {
        line = format!("{line} [{tool}]");
    }
    if let Some(url) = message.image_url.as_deref() {
        line = format!("{line} ({url})");
    }
    line
}

fn print_reply(reply: &ChatMessage) {
    println!("{}", reply.content);
    if let Some(url) = reply.image_url.as_deref() {
        println!("Image: {url}");
    }
    if let Some(log) = reply.action_log.as_ref() {
        let model = log.model_used.as_deref().unwrap_or("unknown");
        let elapsed = log.execution_time.unwrap_or_default();
        println!("[{} | {model} | {elapsed} ms] {}", log.tool_used, log.reasoning);
    }
}

fn run_decide(args: DecideArgs) -> Result<i32> {
    let context = match args.context.as_deref() {
        Some(path) => ConversationContext::load(path)?,
        None => ConversationContext::new("cli"),
    };
    let analysis = DecisionEngine::new().analyze(&args.prompt, &context);
    let output = json!({
        "factors": analysis.factors,
        "imageScore": analysis.affinity.map(|affinity| affinity.image_score),
        "textScore": analysis.affinity.map(|affinity| affinity.text_score),
        "decision": analysis.decision,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}

fn run_route(args: RouteArgs) -> Result<i32> {
    let raw = fs::read_to_string(&args.request)
        .with_context(|| format!("failed reading request {}", args.request.display()))?;
    let request: ChatRequest = serde_json::from_str(&raw)
        .with_context(|| format!("invalid chat request in {}", args.request.display()))?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let (router, selected) = build_router(&args.models, &args.out)?;
    let session = ChatSession::new(router).record_events(&events_path);
    session.emit("models_selected", selected.event_payload())?;

    let response = session.handle_request(&request);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(if response.success { 0 } else { 1 })
}

fn run_health() -> Result<i32> {
    let replicate = if ReplicateClient::from_env().has_token() {
        "configured"
    } else {
        "missing"
    };
    let output = json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "services": { "replicate": replicate },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}
