use crate::audio::capture::CpalSource;
use crate::audio::pipeline;
use crate::audio::recorder::Recorder;
use crate::chat::ChatAssistant;
use crate::client::api::AnalysisClient;
use crate::client::upload::UploadPolicy;
use crate::config::AppConfig;
use crate::error::prelude::*;
use crate::report;
use crate::session::{Session, SessionState};
use crate::types::analysis::AnalysisResult;
use crate::types::asset::AudioAsset;
use clap::{Args, Subcommand};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// How often the live input level is redrawn while recording.
const METER_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the analysis server is reachable
    Health,
    /// Upload an audio file for analysis
    Analyze {
        /// wav, mp3, ogg, m4a, flac or webm file
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Record from the default microphone, then analyze
    Record {
        /// Stop after this many seconds (Enter stops earlier)
        #[arg(short, long)]
        seconds: Option<u64>,
        /// Also write the final recording to this path
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Only record, do not upload
        #[arg(long)]
        no_analyze: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Decode an audio file, normalize quiet audio and write 16-bit PCM WAV
    Convert { input: PathBuf, output: PathBuf },
    /// Ask a question about a saved analysis result
    Ask {
        /// JSON written by --save-result
        #[arg(short, long)]
        result: PathBuf,
        question: String,
    },
    /// Show the active configuration
    Config {
        /// Write the active configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Print the analysis result as JSON instead of a report
    #[arg(long)]
    pub json: bool,
    /// Save the analysis result as JSON
    #[arg(long, value_name = "PATH")]
    pub save_result: Option<PathBuf>,
    /// Ask a question about the result once it arrives
    #[arg(long, value_name = "QUESTION")]
    pub ask: Option<String>,
}

pub struct VoiceApp {
    config: AppConfig,
    client: AnalysisClient,
    assistant: ChatAssistant,
}

impl VoiceApp {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let client = AnalysisClient::new(
            &config.server.base_url,
            Duration::from_secs(config.server.timeout_secs),
        )?;
        let assistant = ChatAssistant::from_config(&config.chat);
        Ok(Self {
            config,
            client,
            assistant,
        })
    }

    pub async fn run(&self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Health => self.health().await,
            Command::Analyze { file, output } => self.analyze_file(&file, &output).await,
            Command::Record {
                seconds,
                out,
                no_analyze,
                output,
            } => {
                self.record(seconds, out.as_deref(), no_analyze, &output)
                    .await
            }
            Command::Convert { input, output } => self.convert(&input, &output).await,
            Command::Ask { result, question } => self.ask(&result, &question).await,
            Command::Config { init } => self.show_config(init),
        }
    }

    async fn health(&self) -> Result<(), AppError> {
        let status = self.client.health().await?;
        println!(
            "{} is {} ({} {})",
            self.client.base_url(),
            status.status,
            status.service.as_deref().unwrap_or("unknown service"),
            status.version.as_deref().unwrap_or("")
        );
        Ok(())
    }

    async fn analyze_file(&self, path: &Path, output: &OutputArgs) -> Result<(), AppError> {
        let asset = AudioAsset::from_path(path).map_err(|e| AppError::file(path, e))?;
        let file_name = asset
            .file_name
            .clone()
            .unwrap_or_else(|| path.display().to_string());

        let mut session = Session::new();
        session.select_file(asset, &file_name)?;
        if let Some(selection) = session.selection() {
            println!("{}", selection.status_line());
        }
        self.analyze_selection(&mut session, output).await
    }

    async fn record(
        &self,
        seconds: Option<u64>,
        out: Option<&Path>,
        no_analyze: bool,
        output: &OutputArgs,
    ) -> Result<(), AppError> {
        let mut recorder = Recorder::new(CpalSource::new(), self.config.audio.constraints());
        let mut session = Session::new();

        if let Err(e) = session.toggle_recording(&mut recorder) {
            session.reset();
            if e.is_device_error() {
                eprintln!("Could not start recording. Check that a microphone is connected and that this terminal may use it.");
            }
            return Err(e.into());
        }

        let mut secs = seconds.unwrap_or(self.config.audio.max_record_secs);
        if !no_analyze {
            let channels = recorder.format().map_or(1, |f| f.channels);
            let ceiling = upload_ceiling_secs(
                self.client.policy(),
                self.config.audio.sample_rate,
                channels,
            );
            if secs > ceiling {
                println!(
                    "Limiting the recording to {ceiling}s so it stays under the upload size limit"
                );
                secs = ceiling;
            }
        }
        let limit = Duration::from_secs(secs);
        println!(
            "Recording... press Enter to stop (stops by itself after {}s)",
            limit.as_secs()
        );
        wait_for_stop(limit, &recorder).await;

        session.stop_recording(&mut recorder)?;
        println!("Processing recording...");
        session.finish_conversion()?;
        let Some(selection) = session.selection() else {
            return Err(AppError::NothingSelected);
        };
        println!("{}", selection.status_line());

        if let Some(path) = out {
            tokio::fs::write(path, &selection.asset().bytes)
                .await
                .map_err(|e| AppError::file(path, e))?;
            println!("Saved recording to {}", path.display());
        }

        if no_analyze {
            return Ok(());
        }
        self.analyze_selection(&mut session, output).await
    }

    async fn analyze_selection(
        &self,
        session: &mut Session,
        output: &OutputArgs,
    ) -> Result<(), AppError> {
        if session.state() != SessionState::Ready || !session.begin_analysis() {
            return Err(AppError::NothingSelected);
        }
        let (asset, file_name) = session
            .upload_target()
            .map(|(asset, name)| (asset.clone(), name.to_string()))
            .ok_or(AppError::NothingSelected)?;

        println!("Analyzing...");
        let outcome = self.client.analyze(&asset, &file_name).await;
        let result = session.finish_analysis(outcome)?;

        if output.json {
            println!("{}", to_json(result)?);
        } else {
            print!("{}", report::render(result));
        }

        if let Some(path) = &output.save_result {
            tokio::fs::write(path, to_json(result)?)
                .await
                .map_err(|e| AppError::file(path, e))?;
            println!("Saved result to {}", path.display());
        }

        if let Some(question) = &output.ask {
            println!();
            println!("Q: {question}");
            println!("A: {}", self.assistant.answer(question, result).await);
        }
        Ok(())
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        let asset = AudioAsset::from_path(input).map_err(|e| AppError::file(input, e))?;
        let wav = pipeline::convert_to_wav(&asset)?;
        tokio::fs::write(output, &wav.bytes)
            .await
            .map_err(|e| AppError::file(output, e))?;
        println!(
            "Wrote {} ({} bytes, {})",
            output.display(),
            wav.len(),
            wav.mime_type
        );
        Ok(())
    }

    async fn ask(&self, path: &Path, question: &str) -> Result<(), AppError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file(path, e))?;
        let result = parse_saved_result(path, &text)?;
        println!("{}", self.assistant.answer(question, &result).await);
        Ok(())
    }

    fn show_config(&self, init: bool) -> Result<(), AppError> {
        if init {
            let path = self.config.save()?;
            println!("Wrote {}", path.display());
        } else if let Some(path) = AppConfig::config_path() {
            println!("# {}", path.display());
        }
        println!(
            "# chat answers: {}",
            if self.assistant.has_llm() {
                "language model, rules as fallback"
            } else {
                "built-in rules"
            }
        );
        let text = toml::to_string_pretty(&self.config)
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        print!("{text}");
        Ok(())
    }
}

/// Block until Enter is pressed or `limit` elapses, redrawing the level meter.
async fn wait_for_stop<S: crate::audio::capture::CaptureSource>(
    limit: Duration,
    recorder: &Recorder<S>,
) {
    let meter = recorder.meter();
    let deadline = tokio::time::sleep(limit);
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(METER_INTERVAL);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => break,
                // Piped or closed stdin: record until the deadline.
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = ticker.tick() => {
                let percent = meter.percent();
                eprint!(
                    "\r[{:<20}] {:>3.0}%  {:<30}",
                    "#".repeat((percent / 5.0) as usize),
                    percent,
                    meter.hint().message()
                );
                let _ = std::io::stderr().flush();
            }
        }
    }
    eprintln!();
}

/// Longest recording whose 16-bit WAV still passes the upload check. A
/// one-second floor keeps a tiny configured limit from recording nothing.
fn upload_ceiling_secs(policy: &UploadPolicy, sample_rate: u32, channels: u16) -> u64 {
    policy.max_pcm_secs(sample_rate, channels).max(1)
}

fn to_json(result: &AnalysisResult) -> Result<String, AppError> {
    serde_json::to_string_pretty(result).map_err(|e| AppError::ResultFile {
        path: "<stdout>".to_string(),
        message: e.to_string(),
    })
}

fn parse_saved_result(path: &Path, text: &str) -> Result<AnalysisResult, AppError> {
    serde_json::from_str::<AnalysisResult>(text)
        .map(AnalysisResult::sanitized)
        .map_err(|e| AppError::ResultFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> VoiceApp {
        VoiceApp::new(AppConfig::default()).unwrap()
    }

    #[test]
    fn saved_result_round_trips_through_json() {
        let mut result = AnalysisResult::default().sanitized();
        result.emotion = "calm".into();
        let text = to_json(&result).unwrap();
        let parsed = parse_saved_result(Path::new("r.json"), &text).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn malformed_saved_result_names_the_file() {
        let err = parse_saved_result(Path::new("broken.json"), "{not json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn recording_ceiling_follows_upload_limit() {
        let policy = UploadPolicy::default();
        assert_eq!(upload_ceiling_secs(&policy, 44_100, 1), 118);
        assert_eq!(upload_ceiling_secs(&policy, 44_100, 2), 59);
        let tiny = UploadPolicy {
            max_bytes: 100,
            ..UploadPolicy::default()
        };
        assert_eq!(upload_ceiling_secs(&tiny, 44_100, 1), 1);
        let app = app();
        assert!(
            app.config.audio.max_record_secs
                <= upload_ceiling_secs(app.client.policy(), 44_100, 1)
        );
    }

    #[tokio::test]
    async fn convert_writes_pcm_wav() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("quiet.wav");
        let output = dir.path().join("out.wav");
        let audio = crate::audio::DecodedAudio::new(16_000, vec![vec![0.01, -0.02, 0.0, 0.015]])
            .unwrap();
        std::fs::write(&input, crate::audio::wav::encode(&audio).unwrap()).unwrap();

        app().convert(&input, &output).await.unwrap();

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.len(), 4);
    }

    #[tokio::test]
    async fn ask_reads_saved_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        std::fs::write(&path, r#"{"emotion":"sad","stress_level":12}"#).unwrap();
        app().ask(&path, "am I stressed?").await.unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            app().ask(&missing, "hello").await,
            Err(AppError::File { .. })
        ));
    }

    #[tokio::test]
    async fn analyze_rejects_unsupported_files_locally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = app()
            .analyze_file(&path, &OutputArgs::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Rejected(_))));
    }
}
