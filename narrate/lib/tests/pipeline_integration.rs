//! Integration tests for the synthesize-then-mix pipeline.
//!
//! Speech comes from a wiremock server speaking the batchexecute protocol;
//! ffmpeg is replaced by a shell script that records its arguments into the
//! output file.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use narrate_lib::{
    AudioJob, BatchRunner, GoogleTts, MixSettings, Mixer, RunnerConfig, load_jobs,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn batchexecute_body(audio: &[u8]) -> String {
    let payload = json!([STANDARD.encode(audio)]).to_string();
    let line = json!([["wrb.fr", "jQ1olc", payload, null, null, null, "generic"]]).to_string();
    format!(")]}}'\n\n{}\n{line}\n", line.len())
}

async fn speech_server(audio: &[u8]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(batchexecute_body(audio)))
        .mount(&server)
        .await;
    server
}

fn fake_ffmpeg(dir: &Path) -> PathBuf {
    let path = dir.join("ffmpeg");
    std::fs::write(
        &path,
        "#!/bin/sh\nfor last; do :; done\nprintf '%s' \"$*\" > \"$last\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn runner(server: &MockServer, work: &Path) -> BatchRunner<GoogleTts> {
    let tts = GoogleTts::new().with_endpoint(server.uri());
    let mixer = Mixer::with_executable(fake_ffmpeg(work), MixSettings::default());
    let config = RunnerConfig {
        output_dir: work.join("output"),
        ..RunnerConfig::default()
    };
    BatchRunner::new(tts, mixer, config)
}

#[tokio::test]
async fn alarm_job_produces_voice_and_mixed_files() {
    let work = TempDir::new().unwrap();
    let server = speech_server(b"ID3 alarm").await;
    let background = work.path().join("bg.wav");
    std::fs::write(&background, b"RIFF").unwrap();

    let job = AudioJob::new("Alarm", work.path().join("a.mp3"))
        .with_language("en")
        .with_background(&background, 0.3);

    let report = runner(&server, work.path()).run_batch(&[job]).await;

    assert!(report.is_complete_success());
    let voice = work.path().join("a.mp3");
    let mixed = work.path().join("output").join("mixed_a.mp3");
    assert_eq!(std::fs::read(&voice).unwrap(), b"ID3 alarm");
    assert!(mixed.exists());
    assert_eq!(report.completed[0].final_artifact(), mixed);

    let args = std::fs::read_to_string(&mixed).unwrap();
    assert!(args.contains("volume=0.3"));
    assert!(args.contains("duration=shortest"));
}

#[tokio::test]
async fn out_of_range_volume_still_mixes() {
    let work = TempDir::new().unwrap();
    let server = speech_server(b"voice").await;
    let background = work.path().join("bg.wav");
    std::fs::write(&background, b"RIFF").unwrap();

    let job = AudioJob::new("Loud", work.path().join("loud.mp3")).with_background(&background, 1.5);

    let report = runner(&server, work.path()).run_batch(&[job]).await;

    assert!(report.is_complete_success());
    let args = std::fs::read_to_string(work.path().join("output").join("mixed_loud.mp3")).unwrap();
    assert!(args.contains("volume=1.5"));
}

#[tokio::test]
async fn failing_job_does_not_stop_the_batch() {
    let work = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(batchexecute_body(b"ok")))
        .with_priority(2)
        .mount(&server)
        .await;

    let jobs = vec![
        AudioJob::new("first", work.path().join("1.mp3")),
        AudioJob::new("broken", work.path().join("2.mp3")),
        AudioJob::new("third", work.path().join("3.mp3")),
    ];

    let report = runner(&server, work.path()).run_batch(&jobs).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert!(report.failures[0].error.contains("500"));
    assert!(work.path().join("1.mp3").exists());
    assert!(!work.path().join("2.mp3").exists());
    assert!(work.path().join("3.mp3").exists());
}

#[tokio::test]
async fn jobs_loaded_from_file_run_end_to_end() {
    let work = TempDir::new().unwrap();
    let server = speech_server(b"voice").await;
    let background = work.path().join("rain.wav");
    std::fs::write(&background, b"RIFF").unwrap();

    let config_path = work.path().join("config.json");
    let document = json!({
        "audio_jobs": [
            { "text": "Buna", "output_filename": work.path().join("buna.mp3") },
            {
                "text": "Ploaie",
                "output_filename": work.path().join("ploaie.mp3"),
                "background_sound": background,
                "background_volume": 0.1
            }
        ]
    });
    std::fs::write(&config_path, document.to_string()).unwrap();

    let jobs = load_jobs(&config_path).unwrap();
    assert_eq!(jobs[0].language(), "ro");

    let report = runner(&server, work.path()).run_batch(&jobs).await;

    assert!(report.is_complete_success());
    assert!(report.completed[0].mixed.is_none());
    assert_eq!(
        report.completed[1].mixed.as_deref(),
        Some(work.path().join("output").join("mixed_ploaie.mp3").as_path())
    );
}
