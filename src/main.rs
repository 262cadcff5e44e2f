//! Command-line entry point
//!
//! Thin wiring over the library for manual end-to-end runs: stream a WAV
//! file (or the default microphone) to the configured endpoint and print
//! reconciled transcript entries as they arrive.

use std::process::ExitCode;
use std::time::Duration;

use callstream::{speaker_turns, CaptureMode, Session, SessionConfig};

fn print_usage() {
    eprintln!("Usage: callstream [--endpoint <ws-url>] [--file <path.wav>]");
    eprintln!();
    eprintln!("Without --file, records from the default microphone until Ctrl-C.");
}

struct Args {
    endpoint: Option<String>,
    file: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        endpoint: None,
        file: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--endpoint" => {
                args.endpoint = Some(iter.next().ok_or("--endpoint requires a value")?);
            }
            "--file" => {
                args.file = Some(iter.next().ok_or("--file requires a value")?);
            }
            "--help" | "-h" => return Err(String::new()),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(args)
}

/// Print entries that arrived since the last call.
fn print_new_entries(session: &Session, printed: &mut usize) {
    let entries = session.transcript_snapshot();
    if *printed > entries.len() {
        // Transcript was cleared since the last poll.
        *printed = entries.len();
    }
    for entry in &entries[*printed..] {
        println!(
            "[{}] {} ({}): {}",
            entry.timestamp,
            entry.speaker_label,
            entry.sentiment.as_str(),
            entry.text
        );
    }
    *printed = entries.len();
}

fn print_turn_summary(session: &Session) {
    let transcript = session.transcript();
    let rec = match transcript.lock() {
        Ok(guard) => guard,
        Err(_) => return,
    };

    let turns = speaker_turns(rec.entries(), rec.colors());
    if turns.is_empty() {
        return;
    }

    println!();
    println!("--- Transcript ({} turns) ---", turns.len());
    for turn in turns {
        let color = turn
            .color
            .map(|c| c.to_css())
            .unwrap_or_else(|| "unassigned".to_string());
        println!("{} [{}]", turn.speaker_label, color);
        for entry in turn.entries {
            println!("  {}", entry.text);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("{}", msg);
            }
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let mut config = SessionConfig::load();
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let mut session = Session::new(config);
    if let Err(e) = session.connect().await {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut printed = 0usize;

    match args.file {
        Some(path) => {
            if !path.to_ascii_lowercase().ends_with(".wav") {
                log::error!("Only WAV files are supported: {}", path);
                return ExitCode::FAILURE;
            }
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("Failed to read {}: {}", path, e);
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = session.stream_file(&bytes, "audio/wav").await {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }

            // Replay until the file is exhausted or the user interrupts.
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {
                        print_new_entries(&session, &mut printed);
                        if session.capture_mode() == CaptureMode::Idle {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        log::info!("Interrupted, cancelling replay");
                        session.cancel_stream().await;
                        break;
                    }
                }
            }
        }
        None => {
            if let Err(e) = session.start_recording().await {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
            log::info!("Recording; press Ctrl-C to stop");

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {
                        print_new_entries(&session, &mut printed);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        session.stop_recording();
                        break;
                    }
                }
            }
        }
    }

    // Grace period for trailing transcript messages.
    tokio::time::sleep(Duration::from_secs(1)).await;
    print_new_entries(&session, &mut printed);
    print_turn_summary(&session);

    session.close().await;
    ExitCode::SUCCESS
}
