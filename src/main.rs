#![warn(clippy::pedantic)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::str_to_string)]
#![warn(clippy::unused_trait_names)]

mod alarm;
mod config;
mod notifier;
mod request;
mod timespan;

use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser as _;
use futures::stream::StreamExt as _;
use signal_hook_tokio::Signals;
use tokio::sync::Notify;
use tokio::time;

use crate::alarm::Alarm;
use crate::config::{AlarmConfig, AlarmOptions, AlertStyle, SoundConfig};
use crate::notifier::{CompositeNotifier, DesktopNotifier, DialogNotifier, DynNotifier, Notifier as _};
use crate::request::TimerRequest;
use crate::timespan::TimeSpan;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Wait for a timespan, then raise an alert
    Set {
        /// Timespan like 3h30m, 20m or 1m15s
        #[arg(allow_hyphen_values = true)]
        timespan: String,

        /// Message shown in the alert
        message: Vec<String>,

        #[command(flatten)]
        alarm: AlarmOptions,
    },

    /// Wait for a raw number of seconds, then raise an alert
    Run {
        /// Whole number of seconds
        #[arg(allow_hyphen_values = true)]
        seconds: String,

        /// Message shown in the alert
        message: Vec<String>,

        #[command(flatten)]
        alarm: AlarmOptions,
    },

    /// Print what an alarm query would do without setting it
    Describe {
        /// Timespan followed by an optional message, e.g. "3h30m take the bread out"
        #[arg(required = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            if record.level() == log::Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "[{}] {}", record.level(), record.args())
            }
        })
        .init();

    if let Err(e) = run(args.command).await {
        log::error!("{e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(command: Command) -> anyhow::Result<()> {
    let (request, config) = match command {
        Command::Set {
            timespan,
            message,
            alarm,
        } => (
            TimerRequest::new(timespan.parse()?, &message),
            AlarmConfig::new(&alarm)?,
        ),
        Command::Run {
            seconds,
            message,
            alarm,
        } => (
            TimerRequest::new(TimeSpan::from_seconds_text(&seconds)?, &message),
            AlarmConfig::new(&alarm)?,
        ),
        Command::Describe { query } => {
            let arguments: Vec<String> = query
                .iter()
                .flat_map(|x| x.split_whitespace())
                .map(ToOwned::to_owned)
                .collect();
            let request = TimerRequest::from_arguments(&arguments)?;

            println!("{}", request.title());
            println!("{}", request.message());
            return Ok(());
        }
    };

    let signals = Signals::new([signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM])?;
    let shutdown = Arc::new(Notify::new());
    tokio::spawn(signal_handler(signals, Arc::clone(&shutdown)));

    let notifier = build_notifier(&config.styles);
    alert_after_timeout(&request, config.sound.as_ref(), &notifier, &shutdown).await;

    Ok(())
}

/// Turns every SIGINT/SIGTERM into one shutdown permit, so a signal that
/// lands between two waits isn't lost.
async fn signal_handler(mut signals: Signals, shutdown: Arc<Notify>) {
    while let Some(signal) = signals.next().await {
        log::debug!("Received signal {}", signal);
        shutdown.notify_one();
    }
}

fn build_notifier(styles: &[AlertStyle]) -> CompositeNotifier {
    let notifiers = styles
        .iter()
        .map(|style| -> Box<DynNotifier> {
            match style {
                AlertStyle::Banner => Box::new(DesktopNotifier::new()),
                AlertStyle::Dialog => Box::new(DialogNotifier::new()),
            }
        })
        .collect();

    CompositeNotifier::new(notifiers)
}

async fn alert_after_timeout(
    request: &TimerRequest,
    sound: Option<&SoundConfig>,
    notifier: &DynNotifier,
    shutdown: &Notify,
) {
    log::info!("{}: {}", request.title(), request.message());
    log::debug!(
        "Timer due in {} ({} s)",
        request.span.to_shorthand(),
        request.span.as_secs()
    );

    tokio::select! {
        () = time::sleep(request.span.as_duration()) => {}
        () = shutdown.notified() => {
            log::info!("Timer cancelled");
            return;
        }
    }

    let alarm = sound.map(|sound| Alarm::start(sound.player.clone(), sound.file.clone(), sound.repeat));
    let title = format!("Timer for {} finished", request.span);

    log::info!(">> {}", request.message());

    let dismissed = tokio::select! {
        () = notifier.notify(&title, request.message()) => false,
        () = shutdown.notified() => true,
    };

    if let Some(alarm) = alarm {
        if dismissed {
            log::info!("Alarm stopped");
            alarm.stop().await;
        } else {
            // Dropping an unfinished alarm kills the player.
            tokio::select! {
                () = alarm.finish() => {}
                () = shutdown.notified() => log::info!("Alarm stopped"),
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use core::time::Duration;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use clap::CommandFactory as _;
    use clap::Parser as _;

    use super::*;
    use crate::alarm::{Player, Repeat};
    use crate::notifier::Notifier;
    use crate::timespan::TimeSpanError;

    /// Records each alert, along with how many plays had been logged by the
    /// time it resolved.
    struct Recorder {
        alerts: Mutex<Vec<(String, String, usize)>>,
        linger: Duration,
        plays: PathBuf,
    }

    impl Recorder {
        fn new(plays: &Path, linger: Duration) -> Self {
            Self {
                alerts: Mutex::new(Vec::new()),
                linger,
                plays: plays.to_owned(),
            }
        }

        fn alerts(&self) -> Vec<(String, String, usize)> {
            self.alerts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        async fn notify(&self, title: &str, body: &str) {
            time::sleep(self.linger).await;
            let plays = count_plays(&self.plays);
            self.alerts
                .lock()
                .unwrap()
                .push((title.to_owned(), body.to_owned(), plays));
        }
    }

    /// A dialog nobody dismisses.
    struct Unanswered;

    #[async_trait]
    impl Notifier for Unanswered {
        async fn notify(&self, _title: &str, _body: &str) {
            futures::future::pending::<()>().await;
        }
    }

    fn scratch_file(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("alarm-notify-main-{}-{name}", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    fn count_plays(path: &Path) -> usize {
        fs::read_to_string(path).map_or(0, |x| x.lines().count())
    }

    fn counting_sound(log: &Path, repeat: Repeat) -> SoundConfig {
        SoundConfig {
            player: Player::new("sh", &["-c", "echo played >> \"$0\"; sleep 0.1"]),
            file: log.to_owned(),
            repeat,
        }
    }

    fn request(arguments: &[&str]) -> TimerRequest {
        let arguments: Vec<String> = arguments.iter().map(|x| (*x).to_owned()).collect();
        TimerRequest::from_arguments(&arguments).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn negative_timespan_reaches_the_parser() {
        let args = Args::try_parse_from(["alarm-notify-rs", "set", "-5m", "--silent"]).unwrap();
        let Command::Set { timespan, alarm, .. } = args.command else {
            panic!("expected the set command");
        };

        assert!(alarm.silent);
        assert_eq!(
            timespan.parse::<TimeSpan>(),
            Err(TimeSpanError::InvalidFormat {
                input: "-5m".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn signal_before_expiry_cancels_the_timer() {
        let log = scratch_file("cancelled");
        let notifier = Recorder::new(&log, Duration::ZERO);
        let sound = counting_sound(&log, Repeat::Times(1));
        let shutdown = Notify::new();
        shutdown.notify_one();

        time::timeout(
            Duration::from_secs(5),
            alert_after_timeout(&request(&["1h"]), Some(&sound), &notifier, &shutdown),
        )
        .await
        .expect("timer cancelled");

        assert!(notifier.alerts().is_empty());
        assert_eq!(count_plays(&log), 0);
    }

    #[tokio::test]
    async fn alarm_sounds_while_the_alert_is_open() {
        let log = scratch_file("ordering");
        let notifier = Recorder::new(&log, Duration::from_millis(500));
        let sound = counting_sound(&log, Repeat::UntilStopped);
        let shutdown = Notify::new();

        time::timeout(
            Duration::from_secs(10),
            alert_after_timeout(
                &request(&["0s", "take", "the", "bread", "out"]),
                Some(&sound),
                &notifier,
                &shutdown,
            ),
        )
        .await
        .expect("alert finished");

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        let (title, body, plays_during_alert) = &alerts[0];
        assert_eq!(title, "Timer for 0 seconds finished");
        assert_eq!(body, "take the bread out");
        assert!(*plays_during_alert > 0);

        // The endless alarm is stopped once the alert resolves.
        let plays_after_alert = count_plays(&log);
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count_plays(&log), plays_after_alert);
        let _ = fs::remove_file(&log);
    }

    #[tokio::test]
    async fn counted_alarm_plays_out_after_the_alert() {
        let log = scratch_file("counted");
        let notifier = Recorder::new(&log, Duration::ZERO);
        let sound = counting_sound(&log, Repeat::Times(3));
        let shutdown = Notify::new();

        time::timeout(
            Duration::from_secs(10),
            alert_after_timeout(&request(&["0s"]), Some(&sound), &notifier, &shutdown),
        )
        .await
        .expect("alert finished");

        assert_eq!(notifier.alerts()[0].1, "Time's up!");
        assert_eq!(count_plays(&log), 3);
        let _ = fs::remove_file(&log);
    }

    #[tokio::test]
    async fn signal_during_the_alert_stops_the_alarm() {
        let log = scratch_file("dismissed");
        let sound = counting_sound(&log, Repeat::UntilStopped);
        let shutdown = Arc::new(Notify::new());

        let signal = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move {
                time::sleep(Duration::from_millis(300)).await;
                shutdown.notify_one();
            })
        };

        time::timeout(
            Duration::from_secs(5),
            alert_after_timeout(&request(&["0s"]), Some(&sound), &Unanswered, &shutdown),
        )
        .await
        .expect("alarm stopped");
        signal.await.unwrap();

        let plays = count_plays(&log);
        assert!(plays > 0);
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count_plays(&log), plays);
        let _ = fs::remove_file(&log);
    }

    #[tokio::test]
    async fn silent_alert_still_notifies() {
        let log = scratch_file("silent");
        let notifier = Recorder::new(&log, Duration::ZERO);
        let shutdown = Notify::new();

        alert_after_timeout(&request(&["0s", "stretch"]), None, &notifier, &shutdown).await;

        assert_eq!(notifier.alerts().len(), 1);
        assert_eq!(count_plays(&log), 0);
    }
}
