use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use astro_remote::audio::AudioCoordinator;
use astro_remote::completion::CompletionDetector;
use astro_remote::config::{load_config, AppConfig};
use astro_remote::dispatcher::{Action, Dispatcher, CELESTIAL_OBJECTS};
use astro_remote::llm::{command_parser_prompt, ChatClient, LlmCommandParser};
use astro_remote::remote::{CapabilityRegistry, ConnectionManager};
use astro_remote::services::{speaker_from_command, ConsoleListener, ContinuousListener, SpeechOutput};
use astro_remote::session::{SessionConfig, VoiceSession};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Type commands at a prompt
    Text,
    /// Sequential speak/listen/execute loop
    Voice,
    /// Background listener dispatching every utterance
    Continuous,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the Gaia Sky REST bridge (overrides ASTRO_RENDERER_URL)
    #[arg(long)]
    renderer_url: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::Text)]
    mode: Mode,

    /// Run a single command and exit
    #[arg(long)]
    command: Option<String>,

    /// Speech program such as `say` or `espeak` (overrides ASTRO_TTS_COMMAND)
    #[arg(long)]
    tts_command: Option<String>,

    /// Read environment variables from this file instead of `.env`
    #[arg(long)]
    env_file: Option<PathBuf>,
}

/// Composition root: one instance of every shared component
struct Controller {
    coordinator: Arc<AudioCoordinator>,
    dispatcher: Arc<Dispatcher>,
    session: SessionConfig,
    tts_command: Option<String>,
}

impl Controller {
    fn new(config: AppConfig) -> Self {
        let coordinator = Arc::new(AudioCoordinator::new());
        let capabilities = Arc::new(CapabilityRegistry::new());
        let connection = Arc::new(ConnectionManager::from_config(&config.renderer));
        let completion = Arc::new(CompletionDetector::new(
            config.completion,
            Arc::clone(&capabilities),
        ));

        let prompt = command_parser_prompt(&Action::names(), CELESTIAL_OBJECTS);
        let parser = LlmCommandParser::new(ChatClient::new(&config.llm), prompt);
        log::info!("🧠 Command parser using model {}", config.llm.model);

        let dispatcher = Arc::new(Dispatcher::new(
            connection,
            capabilities,
            completion,
            Box::new(parser),
        ));

        Self {
            coordinator,
            dispatcher,
            session: config.session,
            tts_command: config.tts_command,
        }
    }

    fn speaker(&self) -> astro_remote::Result<Box<dyn SpeechOutput>> {
        let speaker =
            speaker_from_command(self.tts_command.as_deref(), Arc::clone(&self.coordinator))?;
        Ok(speaker)
    }

    fn listener(&self) -> ConsoleListener {
        ConsoleListener::stdin(Arc::clone(&self.coordinator))
            .with_permission_timeout(self.session.listen_permission_timeout)
    }

    fn print_status(&self) {
        let state = self.dispatcher.current_state();
        let audio = self.coordinator.status();
        println!(
            "🔌 Connected: {}",
            if state.connected { "yes" } else { "no" }
        );
        if let Some(error) = &state.error {
            println!("⚠️ {}", error);
        }
        match state.camera_position {
            Some([x, y, z]) => println!("📍 Camera: ({:.1}, {:.1}, {:.1})", x, y, z),
            None => println!("📍 Camera: unknown"),
        }
        println!(
            "🎯 Last target: {}",
            state.last_target.as_deref().unwrap_or("none")
        );
        println!("🎚️ Audio: {} ({} transitions)", audio.state, audio.transitions);
    }

    fn run_text(&self) -> Result<()> {
        println!("🌌 Astro Remote ready. Type a command, 'status', or 'quit'.");
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("🚀 > ");
            io::stdout().flush().context("Failed to flush prompt")?;

            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("Failed to read command")?;
            match line.trim() {
                "" => continue,
                "quit" | "exit" => break,
                "status" => self.print_status(),
                command => println!("{}", self.dispatcher.execute_command(command)),
            }
        }

        log::info!("👋 Text session ended");
        Ok(())
    }

    fn run_voice(&self) -> astro_remote::Result<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let executor = move |command: &str| -> String {
            let result = dispatcher.execute_command(command);
            println!("{}", result);
            result
        };

        let mut session = VoiceSession::new(
            self.listener(),
            self.speaker()?,
            executor,
            Arc::clone(&self.coordinator),
            self.session.clone(),
        );
        session.run_loop();
        Ok(())
    }

    fn run_continuous(&self) -> astro_remote::Result<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let speaker = self.speaker()?;
        speaker.speak("Listening for voice commands")?;

        let worker = ContinuousListener::start(
            self.listener(),
            Arc::clone(&self.coordinator),
            move |command: &str| -> String {
                let result = dispatcher.execute_command(command);
                println!("{}", result);
                result
            },
        );
        worker.join();
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("🚀 Starting astro-remote with args: {:?}", args);

    let mut config = load_config(args.env_file.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = args.renderer_url {
        config.renderer.base_url = url;
    }
    if args.tts_command.is_some() {
        config.tts_command = args.tts_command;
    }

    let controller = Controller::new(config);

    if let Some(command) = args.command {
        println!("{}", controller.dispatcher.execute_command(&command));
        return Ok(());
    }

    match args.mode {
        Mode::Text => controller.run_text(),
        Mode::Voice => controller
            .run_voice()
            .context("Voice session failed to start"),
        Mode::Continuous => controller
            .run_continuous()
            .context("Continuous listening failed to start"),
    }
}
