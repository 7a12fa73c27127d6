use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};

use voicefair_core::accent::domain::accent_catalog::{find_accent, AccentOption, ACCENTS};
use voicefair_core::audio::infrastructure::audio_file::{
    audio_cache_dir, load_source_audio, read_audio_file, write_audio_file, CachedAudioFile,
};
use voicefair_core::audio::infrastructure::elevenlabs_transformer::{
    validate_audio, ElevenLabsTransformer,
};
use voicefair_core::audio::infrastructure::microphone_recorder;
use voicefair_core::session::blind_test::{BlindTest, Slot};
use voicefair_core::session::transform_session::{Completion, TransformSession};
use voicefair_core::shared::audio_asset::transformed_name;
use voicefair_core::shared::constants::{API_BASE_URL, MAX_RECORDING_SECS};
use voicefair_core::startup::build_version::startup_check;
use voicefair_core::storage::domain::credentials::{
    clear_api_key, load_api_key, mask_api_key, save_api_key,
};
use voicefair_core::storage::domain::key_value_store::KeyValueStore;
use voicefair_core::storage::infrastructure::json_file_store::JsonFileStore;
use voicefair_core::storage::infrastructure::memory_store::MemoryStore;

/// Transform a voice recording to a different accent and run blind listening tests.
#[derive(Parser)]
#[command(name = "voicefair", version)]
struct Cli {
    /// ElevenLabs API key for this run only (overrides the stored key).
    #[arg(long, env = "VOICEFAIR_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base URL of the ElevenLabs API.
    #[arg(long, env = "VOICEFAIR_API_BASE", default_value = API_BASE_URL, global = true)]
    api_base: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform an audio file to the chosen accent.
    Transform {
        /// Input audio file (at most 10 MiB).
        input: PathBuf,

        /// Target accent id (see `voicefair accents`).
        #[arg(long, short)]
        accent: String,

        /// Output file (default: `<stem>_<accent>.<ext>` next to the input).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Record from the default microphone (stops at 30 seconds).
    Record {
        /// Output WAV file (default: `recording-<time>.wav` in the current directory).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// List the available accents.
    Accents,
    /// List the voices available to the API key.
    Voices,
    /// Manage the stored API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Blind A/B test: guess which of two clips was transformed.
    BlindTest {
        /// The untransformed recording.
        original: PathBuf,

        /// The transformed recording.
        transformed: PathBuf,

        /// Accent the transformed clip was produced with.
        #[arg(long, short)]
        accent: String,

        /// Number of trials to run.
        #[arg(long, default_value = "1")]
        rounds: u32,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Validate and store a key.
    Set {
        key: String,

        /// Store the key without checking it against the API.
        #[arg(long)]
        no_verify: bool,
    },
    /// Show whether a key is stored and whether the API accepts it.
    Status,
    /// Remove the stored key.
    Clear,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let persisted = Arc::new(JsonFileStore::open_default()?);
    run_startup_check(persisted.as_ref());

    let store: Arc<dyn KeyValueStore> = match &cli.api_key {
        Some(key) => Arc::new(MemoryStore::with_api_key(key)),
        None => persisted.clone(),
    };
    let transformer = ElevenLabsTransformer::with_base_url(store, &cli.api_base);

    match cli.command {
        Command::Transform {
            input,
            accent,
            output,
        } => run_transform(&transformer, &input, &accent, output),
        Command::Record { output } => run_record(output),
        Command::Accents => {
            print_accents();
            Ok(())
        }
        Command::Voices => run_voices(&transformer),
        Command::Key { action } => run_key(&transformer, persisted.as_ref(), action),
        Command::BlindTest {
            original,
            transformed,
            accent,
            rounds,
        } => run_blind_test(&original, &transformed, &accent, rounds),
    }
}

/// Clears stale cached clips once per new build. Failure is not fatal.
fn run_startup_check(store: &dyn KeyValueStore) {
    if let Err(e) = startup_check(store) {
        log::warn!("Startup check failed: {e}");
    }
}

fn run_transform(
    transformer: &ElevenLabsTransformer,
    input: &Path,
    accent_id: &str,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    let accent = parse_accent(accent_id)?;
    let audio = load_source_audio(input)?;
    let output =
        output.unwrap_or_else(|| input.with_file_name(transformed_name(audio.name(), accent.id)));

    let mut session = TransformSession::new();
    session.load_audio(audio);
    session.select_accent(accent);

    eprintln!("Transforming to {} accent\u{2026}", accent.display_name);
    let completion = session.run_transform(transformer)?;
    if completion != Completion::Applied {
        return Err("transformation result was discarded".into());
    }

    if let Some(err) = session.last_error() {
        if err.needs_settings() {
            eprintln!("Hint: run `voicefair key set <KEY>` or pass --api-key.");
        }
        return Err(err.clone().into());
    }

    let comparison = session
        .comparison()
        .ok_or("transformation produced no audio")?;
    write_audio_file(&output, comparison.right())?;

    println!(
        "{:<24} {} ({} bytes)",
        comparison.left_label(),
        input.display(),
        comparison.left().size_bytes()
    );
    println!(
        "{:<24} {} ({} bytes)",
        comparison.right_label(),
        output.display(),
        comparison.right().size_bytes()
    );
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_record(output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_enter = stop.clone();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().read_line(&mut line);
        stop_on_enter.store(true, Ordering::Relaxed);
    });

    eprintln!("Recording\u{2026} press Enter to stop (at most {MAX_RECORDING_SECS} s).");
    let audio = microphone_recorder::record(&stop)?;
    validate_audio(&audio)?;

    let output = output.unwrap_or_else(|| PathBuf::from(audio.name()));
    write_audio_file(&output, &audio)?;
    println!("Saved {} ({} bytes)", output.display(), audio.size_bytes());
    Ok(())
}

fn print_accents() {
    for accent in ACCENTS {
        println!(
            "{:<12} {:<18} {}",
            accent.id, accent.display_name, accent.description
        );
    }
}

fn run_voices(transformer: &ElevenLabsTransformer) -> Result<(), Box<dyn std::error::Error>> {
    let voices = transformer.list_voices()?;
    if voices.is_empty() {
        println!("No voices available.");
    }
    for voice in voices {
        let accent = voice.labels.get("accent").map(String::as_str).unwrap_or("-");
        println!("{:<24} {:<24} {accent}", voice.voice_id, voice.name);
    }
    Ok(())
}

fn run_key(
    transformer: &ElevenLabsTransformer,
    store: &dyn KeyValueStore,
    action: KeyAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        KeyAction::Set { key, no_verify } => {
            let key = key.trim();
            if key.is_empty() {
                return Err("API key must not be empty".into());
            }
            if !no_verify && !transformer.validate_key(key) {
                return Err("The API key was rejected by ElevenLabs".into());
            }
            save_api_key(store, key)?;
            println!("API key saved ({}).", mask_api_key(key));
        }
        KeyAction::Status => match load_api_key(store) {
            Some(key) => {
                let valid = transformer.validate_key(&key);
                println!(
                    "Stored key {}: {}",
                    mask_api_key(&key),
                    if valid { "valid" } else { "rejected" }
                );
            }
            None => println!("No API key stored."),
        },
        KeyAction::Clear => {
            clear_api_key(store)?;
            println!("API key removed.");
        }
    }
    Ok(())
}

fn run_blind_test(
    original_path: &Path,
    transformed_path: &Path,
    accent_id: &str,
    rounds: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let accent = parse_accent(accent_id)?;
    let original = read_audio_file(original_path)?;
    let transformed = read_audio_file(transformed_path)?;
    let cache_dir = audio_cache_dir()?.join("blind");

    let mut rng = rand::thread_rng();
    let mut test = BlindTest::new(original, transformed, accent, &mut rng);
    let stdin = io::stdin();
    let mut correct = 0;

    for round in 1..=rounds.max(1) {
        if round > 1 {
            test.reset(&mut rng);
        }
        // Neutral copies so the file names do not give the answer away.
        let files = Slot::ALL
            .iter()
            .map(|&slot| {
                let audio = test.audio(slot);
                CachedAudioFile::create_named(&cache_dir, &slot.file_name(audio), audio)
            })
            .collect::<Result<Vec<_>, _>>()?;

        println!("Round {round}: which clip has the {} accent?", accent.display_name);
        for (slot, file) in Slot::ALL.iter().zip(&files) {
            println!("  {}: {}", slot.label(), file.path().display());
        }

        let selected = prompt_slot(&mut stdin.lock())?;
        let verdict = test.submit(selected)?;
        if verdict.correct {
            correct += 1;
        }
        if let Some(message) = test.reveal_message() {
            println!("{message}");
        }
    }

    println!("Score: {correct}/{}", rounds.max(1));
    Ok(())
}

fn prompt_slot(input: &mut impl BufRead) -> Result<Slot, Box<dyn std::error::Error>> {
    loop {
        print!("Answer [A/B]: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err("no answer given".into());
        }
        match parse_slot(&line) {
            Some(slot) => return Ok(slot),
            None => eprintln!("Please answer A or B."),
        }
    }
}

fn parse_slot(answer: &str) -> Option<Slot> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "a" | "audio a" | "1" => Some(Slot::Left),
        "b" | "audio b" | "2" => Some(Slot::Right),
        _ => None,
    }
}

fn parse_accent(id: &str) -> Result<AccentOption, Box<dyn std::error::Error>> {
    find_accent(id).copied().ok_or_else(|| {
        let known: Vec<_> = ACCENTS.iter().map(|a| a.id).collect();
        format!("Unknown accent '{id}'. Available: {}", known.join(", ")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a", Some(Slot::Left))]
    #[case(" B\n", Some(Slot::Right))]
    #[case("Audio A", Some(Slot::Left))]
    #[case("2", Some(Slot::Right))]
    #[case("c", None)]
    #[case("", None)]
    fn test_parse_slot(#[case] answer: &str, #[case] expected: Option<Slot>) {
        assert_eq!(parse_slot(answer), expected);
    }

    #[test]
    fn test_prompt_slot_retries_until_valid() {
        let mut input = io::Cursor::new("x\nb\n");
        assert_eq!(prompt_slot(&mut input).unwrap(), Slot::Right);
    }

    #[test]
    fn test_prompt_slot_eof_is_error() {
        let mut input = io::Cursor::new("");
        assert!(prompt_slot(&mut input).is_err());
    }

    #[test]
    fn test_parse_accent_rejects_unknown_ids() {
        assert_eq!(parse_accent("Irish").unwrap().id, "irish");
        let err = parse_accent("martian").unwrap_err().to_string();
        assert!(err.contains("british"));
    }

    #[test]
    fn test_cli_parses_record() {
        let cli = Cli::try_parse_from(["voicefair", "record", "-o", "take.wav"]).unwrap();
        match cli.command {
            Command::Record { output } => assert_eq!(output, Some(PathBuf::from("take.wav"))),
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn test_cli_parses_transform() {
        let cli = Cli::try_parse_from([
            "voicefair",
            "transform",
            "sample.wav",
            "--accent",
            "british",
        ])
        .unwrap();
        match cli.command {
            Command::Transform { input, accent, output } => {
                assert_eq!(input, PathBuf::from("sample.wav"));
                assert_eq!(accent, "british");
                assert!(output.is_none());
            }
            _ => panic!("expected transform"),
        }
    }
}
