use std::env;
use std::path::PathBuf;

use anyhow::Context as _;
use anyhow::ensure;

use crate::alarm::{Player, Repeat};

pub const SOUND_ENV: &str = "ALARM_NOTIFY_SOUND";

#[cfg(target_os = "macos")]
const DEFAULT_SOUNDS: &[&str] = &[
    "/System/Library/Sounds/Glass.aiff",
    "/System/Library/Sounds/Ping.aiff",
    "/System/Library/Sounds/Purr.aiff",
];
#[cfg(not(target_os = "macos"))]
const DEFAULT_SOUNDS: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
    "/usr/share/sounds/freedesktop/stereo/complete.oga",
    "/usr/share/sounds/sound-icons/bell.wav",
    "/usr/share/sounds/alsa/Front_Left.wav",
];

const BANNER_REPEAT: u32 = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AlertStyle {
    /// Desktop notification banner; the sound plays a fixed number of times
    #[default]
    Banner,
    /// Modal dialog; the sound loops until the dialog is dismissed
    Dialog,
}

fn default_repeat(styles: &[AlertStyle]) -> Repeat {
    if styles.contains(&AlertStyle::Dialog) {
        Repeat::UntilStopped
    } else {
        Repeat::Times(BANNER_REPEAT)
    }
}

#[derive(clap::Args, Debug, Default)]
pub struct AlarmOptions {
    /// How the alert is shown (repeat or comma-separate to combine)
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [AlertStyle::Banner])]
    pub style: Vec<AlertStyle>,

    /// Sound file to play [default: $ALARM_NOTIFY_SOUND or a system sound]
    #[arg(long, value_name = "FILE")]
    pub sound: Option<String>,

    /// Command that plays the sound file, e.g. "paplay --volume 40000"
    #[arg(long, value_name = "COMMAND")]
    pub player: Option<String>,

    /// How many times to play the sound [default: 3 for banner, until dismissed for dialog]
    #[arg(long, value_name = "N")]
    pub repeat: Option<u32>,

    /// Don't play any sound
    #[arg(long)]
    pub silent: bool,
}

pub struct SoundConfig {
    pub player: Player,
    pub file: PathBuf,
    pub repeat: Repeat,
}

pub struct AlarmConfig {
    pub styles: Vec<AlertStyle>,
    pub sound: Option<SoundConfig>,
}

impl AlarmConfig {
    pub fn new(options: &AlarmOptions) -> anyhow::Result<Self> {
        Self::with_sound_env(options, env::var(SOUND_ENV).ok())
    }

    fn with_sound_env(options: &AlarmOptions, sound_env: Option<String>) -> anyhow::Result<Self> {
        if let Some(repeat) = options.repeat {
            ensure!(repeat > 0, "Invalid repeat count: expected at least 1, got {}", repeat);
        }

        let sound = if options.silent {
            None
        } else {
            Self::sound(options, sound_env)?
        };

        let mut styles: Vec<AlertStyle> = Vec::new();
        for style in &options.style {
            if !styles.contains(style) {
                styles.push(*style);
            }
        }
        if styles.is_empty() {
            styles.push(AlertStyle::default());
        }

        Ok(Self { styles, sound })
    }

    fn sound(options: &AlarmOptions, sound_env: Option<String>) -> anyhow::Result<Option<SoundConfig>> {
        let explicit = options
            .sound
            .clone()
            .or(sound_env)
            .map(|path| explicit_sound_file(&path))
            .transpose()?;

        let player = if let Some(command) = &options.player {
            let mut parts = command.split_whitespace();
            let program = parts.next().context("Invalid player: empty command")?;
            Player::new(program, &parts.collect::<Vec<_>>())
        } else if let Some(player) = Player::platform_default() {
            player
        } else {
            log::warn!("No sound player found, set one with --player");
            return Ok(None);
        };

        let Some(file) = explicit.or_else(|| default_sound_file(&player, DEFAULT_SOUNDS)) else {
            log::warn!(
                "No alarm sound that '{}' can play was found, set one with --sound or {}",
                player,
                SOUND_ENV
            );
            return Ok(None);
        };

        if !player.can_play(&file) {
            log::warn!("'{}' may not be able to play '{}'", player, file.display());
        }

        Ok(Some(SoundConfig {
            player,
            file,
            repeat: options
                .repeat
                .map_or_else(|| default_repeat(&options.style), Repeat::Times),
        }))
    }
}

fn explicit_sound_file(path: &str) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(shellexpand::tilde(path).as_ref());
    ensure!(path.is_file(), "Sound file '{}' doesn't exist", path.display());
    Ok(path)
}

/// First installed sound in `candidates` that `player` can decode.
fn default_sound_file(player: &Player, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|x| x.is_file() && player.can_play(x))
}
