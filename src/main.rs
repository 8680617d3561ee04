//! Interactive terminal front-end
//!
//! Reads one line per turn, classifies it with [`parse_directive`] and routes
//! it to the session or the automode controller.

use anyhow::{Context, Result};
use clap::Parser;
use groq_engineer::{
    AutomodeController, AutomodeEvent, Directive, GatewayOptions, GroqGateway, Session,
    SessionOptions, TurnEvent, get_api_key, get_base_url, get_model, parse_directive, ui,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "groq-engineer", version, about = "Chat with Groq-hosted models from the terminal")]
struct Cli {
    /// Model name (defaults to GROQ_MODEL, then llama3-8b-8192)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible endpoint (defaults to GROQ_BASE_URL, then the Groq API)
    #[arg(long)]
    base_url: Option<String>,

    /// Directory that file instructions and chat exports are relative to
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Only send the most recent N messages to the model (at least 1)
    #[arg(long)]
    max_context_messages: Option<NonZeroUsize>,

    /// Model context size in tokens, for the usage display and the near-full warning
    #[arg(long, default_value_t = 8192)]
    context_window: usize,

    /// Timeout for one code run, in seconds
    #[arg(long, default_value_t = 10)]
    code_timeout: u64,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// Maximum tokens per reply
    #[arg(long)]
    max_tokens: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let api_key = match get_api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{}", ui::error_line(&e));
            std::process::exit(1);
        }
    };

    let model = get_model(cli.model.as_deref());
    let mut builder = GatewayOptions::builder()
        .model(&model)
        .base_url(get_base_url(cli.base_url.as_deref()))
        .api_key(api_key)
        .temperature(cli.temperature);
    if let Some(max_tokens) = cli.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    let gateway = GroqGateway::new(builder.build().context("invalid gateway options")?)?;

    let mut options = SessionOptions::new()
        .with_work_dir(&cli.workdir)
        .with_code_timeout(Duration::from_secs(cli.code_timeout))
        .with_context_window(cli.context_window);
    if let Some(max) = cli.max_context_messages {
        options = options.with_max_context_messages(max.get());
    }

    let mut session = Session::new(Arc::new(gateway), options);
    let mut controller = AutomodeController::new();
    let mut editor = DefaultEditor::new().context("failed to open the terminal")?;

    let automode_active = Arc::new(AtomicBool::new(false));
    spawn_interrupt_listener(controller.interrupt_handle(), automode_active.clone());

    print!("{}", ui::banner(&model, &cli.workdir));

    loop {
        let line = match editor.readline(&ui::user_prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = editor.add_history_entry(line.as_str()) {
            log::debug!("Could not record history entry: {}", e);
        }

        let directive = match parse_directive(&line) {
            Ok(directive) => directive,
            Err(e) => {
                eprintln!("{}", ui::error_line(&e));
                continue;
            }
        };

        match directive {
            Directive::Exit => break,
            Directive::Reset => {
                session.reset();
                println!("{}", ui::system_line("Conversation history has been reset."));
            }
            Directive::SaveChat => match session.save_chat() {
                Ok(path) => println!(
                    "{}",
                    ui::system_line(&format!("Chat saved to {}", path.display()))
                ),
                Err(e) => eprintln!("{}", ui::error_line(&e)),
            },
            Directive::Image => {
                let Some(path) = ask(&mut editor, "Image path: ") else {
                    continue;
                };
                let path = path.trim().trim_matches(['\'', '"']).to_string();
                let Some(text) = ask(&mut editor, &ui::user_prompt()) else {
                    continue;
                };
                println!("{}", ui::assistant_header());
                let result = session
                    .chat_with_image(Path::new(&path), &text, &mut print_turn_event)
                    .await;
                finish_turn(&session, result.map(|_| ()));
            }
            Directive::Automode(budget) => {
                let Some(goal) = ask(&mut editor, "Goal for automode: ") else {
                    continue;
                };
                automode_active.store(true, Ordering::SeqCst);
                run_automode(&mut controller, &mut session, &goal, budget).await;
                automode_active.store(false, Ordering::SeqCst);
            }
            Directive::Message(text) => {
                println!("{}", ui::assistant_header());
                let result = session.chat(&text, &mut print_turn_event).await;
                finish_turn(&session, result.map(|_| ()));
            }
        }
    }

    println!("{}", ui::system_line("Goodbye!"));
    Ok(())
}

/// Read a follow-up line; `None` when the user cancels
fn ask(editor: &mut DefaultEditor, prompt: &str) -> Option<String> {
    match editor.readline(prompt) {
        Ok(line) if !line.trim().is_empty() => Some(line),
        Ok(_) => {
            eprintln!("{}", ui::system_line("Nothing entered, cancelled."));
            None
        }
        Err(_) => None,
    }
}

fn print_turn_event(event: TurnEvent<'_>) {
    match event {
        TurnEvent::Delta(text) => {
            print!("{}", text);
            if let Err(e) = std::io::stdout().flush() {
                log::debug!("Could not flush stdout: {}", e);
            }
        }
        TurnEvent::Instruction(report) => {
            println!();
            println!("{}", ui::report_line(report));
        }
    }
}

fn finish_turn(session: &Session, result: groq_engineer::Result<()>) {
    println!();
    match result {
        Ok(()) => print_usage(session),
        Err(e) => eprintln!("{}", ui::error_line(&e)),
    }
}

fn print_usage(session: &Session) {
    println!("{}", ui::usage_line(session.usage()));
    if session.near_context_limit() {
        println!(
            "{}",
            ui::system_line("The context window is nearly full; `reset` starts a fresh conversation.")
        );
    }
}

/// What a Ctrl+C delivered as a signal means
#[derive(Debug, PartialEq, Eq)]
enum CtrlC {
    StopAutomode,
    Quit,
}

/// During automode, Ctrl+C raises the controller's interrupt flag; otherwise
/// the program ends
fn on_ctrl_c(automode_active: &AtomicBool, interrupt: &AtomicBool) -> CtrlC {
    if automode_active.load(Ordering::SeqCst) {
        interrupt.store(true, Ordering::SeqCst);
        CtrlC::StopAutomode
    } else {
        CtrlC::Quit
    }
}

/// One SIGINT listener for the whole run
///
/// At the prompt rustyline reads Ctrl+C as a key, so this only sees it while
/// a turn or an automode run is in progress.
fn spawn_interrupt_listener(interrupt: Arc<AtomicBool>, automode_active: Arc<AtomicBool>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Ctrl+C handling unavailable: {}", e);
                return;
            }
            match on_ctrl_c(&automode_active, &interrupt) {
                CtrlC::StopAutomode => eprintln!(
                    "{}",
                    ui::system_line("Interrupt received, stopping after the current round-trip.")
                ),
                CtrlC::Quit => {
                    println!();
                    eprintln!("{}", ui::system_line("Interrupted."));
                    std::process::exit(130);
                }
            }
        }
    });
}

async fn run_automode(
    controller: &mut AutomodeController,
    session: &mut Session,
    goal: &str,
    budget: u32,
) {
    let summary = controller
        .run(session, goal, budget, &mut |event| match event {
            AutomodeEvent::IterationStarted { iteration, budget } => {
                println!("{}", ui::automode_iteration(iteration, budget));
                println!("{}", ui::assistant_header());
            }
            AutomodeEvent::Turn(event) => print_turn_event(event),
        })
        .await;

    println!();
    println!("{}", ui::automode_summary(&summary));
    print_usage(session);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_c_outside_automode_quits() {
        let active = AtomicBool::new(false);
        let interrupt = AtomicBool::new(false);

        assert_eq!(on_ctrl_c(&active, &interrupt), CtrlC::Quit);
        assert!(!interrupt.load(Ordering::SeqCst));
    }

    #[test]
    fn test_ctrl_c_during_automode_raises_interrupt() {
        let active = AtomicBool::new(true);
        let interrupt = AtomicBool::new(false);

        assert_eq!(on_ctrl_c(&active, &interrupt), CtrlC::StopAutomode);
        assert!(interrupt.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cli_rejects_zero_context_messages() {
        let parsed = Cli::try_parse_from(["groq-engineer", "--max-context-messages", "0"]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from(["groq-engineer", "--max-context-messages", "4"]).unwrap();
        assert_eq!(cli.max_context_messages.map(NonZeroUsize::get), Some(4));
        assert_eq!(cli.context_window, 8192);
    }

    #[test]
    fn test_cli_context_window() {
        let cli = Cli::try_parse_from(["groq-engineer", "--context-window", "32768"]).unwrap();
        assert_eq!(cli.context_window, 32768);
    }
}
