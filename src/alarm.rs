use core::fmt;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[cfg(target_os = "macos")]
const DEFAULT_PLAYERS: &[&str] = &["afplay"];
#[cfg(not(target_os = "macos"))]
const DEFAULT_PLAYERS: &[&str] = &["paplay", "pw-play", "aplay"];

/// Containers `aplay` can read; it has no Ogg or compressed-audio decoder.
const ALSA_FORMATS: &[&str] = &["wav", "voc", "au"];

/// A command that plays one sound file and exits when it's done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    program: String,
    args: Vec<String>,
}

impl Player {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|x| (*x).to_owned()).collect(),
        }
    }

    /// First platform sound player found on `PATH`.
    pub fn platform_default() -> Option<Self> {
        DEFAULT_PLAYERS
            .iter()
            .find(|program| is_on_path(program))
            .map(|program| Self::new(program, &[]))
    }

    /// Whether the player can decode `sound`, judged by its extension.
    pub fn can_play(&self, sound: &Path) -> bool {
        let program = Path::new(&self.program).file_name().and_then(|x| x.to_str());
        if program != Some("aplay") {
            return true;
        }

        sound
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|ext| ALSA_FORMATS.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }

    fn command(&self, sound: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

fn is_on_path(program: &str) -> bool {
    env::var_os("PATH")
        .is_some_and(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Times(u32),
    UntilStopped,
}

impl Repeat {
    fn allows(self, played: u32) -> bool {
        match self {
            Self::Times(n) => played < n,
            Self::UntilStopped => true,
        }
    }
}

/// A sounding alarm. The player process is killed when the handle is
/// stopped or dropped.
pub struct Alarm {
    repeat: Repeat,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Alarm {
    pub fn start(player: Player, sound: PathBuf, repeat: Repeat) -> Self {
        let (stop, stopped) = oneshot::channel();

        log::debug!("Playing '{}' with '{}' ({:?})", sound.display(), player, repeat);

        Self {
            repeat,
            stop: Some(stop),
            task: Some(tokio::spawn(play(player, sound, repeat, stopped))),
        }
    }

    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            // The task may already be done, in which case nobody is listening.
            let _ = stop.send(());
        }

        self.join().await;
    }

    /// Lets a counted alarm play out; an endless one is stopped.
    pub async fn finish(mut self) {
        match self.repeat {
            Repeat::Times(_) => self.join().await,
            Repeat::UntilStopped => self.stop().await,
        }
    }

    async fn join(&mut self) {
        // Left in place while awaiting, so a cancelled join still aborts on drop.
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                log::error!("Alarm task failed: {}", e);
            }
            self.task = None;
        }
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn play(player: Player, sound: PathBuf, repeat: Repeat, mut stopped: oneshot::Receiver<()>) {
    let mut played = 0;

    while repeat.allows(played) {
        let mut child = match player.command(&sound).spawn() {
            Ok(child) => child,
            Err(e) => {
                log::warn!("Failed to start sound player '{}': {}", player, e);
                return;
            }
        };

        tokio::select! {
            _ = &mut stopped => {
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to stop sound player '{}': {}", player, e);
                }

                return;
            }
            status = child.wait() => match status {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    log::warn!("Sound player '{}' exited with {}", player, status);
                    return;
                }
                Err(e) => {
                    log::warn!("Sound player '{}' failed: {}", player, e);
                    return;
                }
            }
        }

        played += 1;
    }
}
