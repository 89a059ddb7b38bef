use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::platform::settings::SettingsOverrides;

/// Submit narrated-video jobs and follow their progress.
#[derive(Parser, Debug)]
#[command(name = "reelwatch")]
#[command(about = "Submit video generation jobs and follow their progress", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "REELWATCH_SERVER", default_value = "http://127.0.0.1:8888", global = true)]
    pub server: String,

    /// Directory holding the active task, saved settings and the log file
    #[arg(long, env = "REELWATCH_STATE_DIR", default_value = ".reelwatch", global = true)]
    pub state_dir: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to reelwatch.log in the state directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a script and follow the task until it finishes
    ///
    /// A task left over from an earlier run is resumed instead.
    Generate(GenerateArgs),

    /// Follow the persisted task again after a lost connection or a detach
    Resume(TrackArgs),

    /// Abort the persisted task
    Abort,

    /// List voices, resolutions, music, subtitle presets and fonts
    Options,

    /// Print the persisted task id, or "idle"
    Status,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: TextSource,

    /// Narration voice id
    #[arg(long)]
    pub voice: Option<String>,

    /// Aspect ratio, e.g. 9:16
    #[arg(long)]
    pub resolution: Option<String>,

    /// Background music id, or "none"
    #[arg(long)]
    pub bgm: Option<String>,

    /// Subtitle preset id; an empty value lets the backend choose
    #[arg(long)]
    pub subtitle_style: Option<String>,

    /// Subtitle font name
    #[arg(long = "font")]
    pub font_name: Option<String>,

    #[command(flatten)]
    pub track: TrackArgs,
}

impl GenerateArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            voice: self.voice.clone(),
            resolution: self.resolution.clone(),
            bgm: self.bgm.clone(),
            subtitle_style: self.subtitle_style.clone(),
            font_name: self.font_name.clone(),
        }
    }
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TextSource {
    /// Script text
    #[arg(long)]
    pub text: Option<String>,

    /// Read the script from a file
    #[arg(long)]
    pub text_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Download the finished video into this directory
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Reconnect attempts after a lost connection, 2 seconds apart
    #[arg(long, default_value_t = 0)]
    pub reconnect: u32,
}
