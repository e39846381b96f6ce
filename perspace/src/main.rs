mod app;
mod core;
mod effect;
mod event_emitter;
mod ipc;
mod logging;
mod platform;

use anyhow::{bail, Result};
use argh::FromArgs;
use crate::core::Config;
use ipc::IpcClient;
use perspace_ipc::{Command, Direction, EventFilter, Response};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Perspace - per-monitor workspaces for single-workspace compositors
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    SwitchToWorkspace(SwitchToWorkspaceCmd),
    MoveWindowToWorkspace(MoveWindowToWorkspaceCmd),
    WarpToMonitor(WarpToMonitorCmd),
    CycleFocus(CycleFocusCmd),
    SwapWindow(SwapWindowCmd),
    GetState(GetStateCmd),
    ListMonitors(ListMonitorsCmd),
    ListWindows(ListWindowsCmd),
    ReloadConfig(ReloadConfigCmd),
    Subscribe(SubscribeCmd),
    Quit(QuitCmd),
}

/// Start the perspace daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Show a workspace on the monitor under the pointer
#[derive(FromArgs)]
#[argh(subcommand, name = "switch-to-workspace")]
struct SwitchToWorkspaceCmd {
    /// workspace index (0-9)
    #[argh(positional)]
    workspace: usize,
}

/// Move the focused window to a workspace
#[derive(FromArgs)]
#[argh(subcommand, name = "move-window-to-workspace")]
struct MoveWindowToWorkspaceCmd {
    /// workspace index (0-9)
    #[argh(positional)]
    workspace: usize,
}

/// Move the pointer and focus to a monitor
#[derive(FromArgs)]
#[argh(subcommand, name = "warp-to-monitor")]
struct WarpToMonitorCmd {
    /// monitor index
    #[argh(positional)]
    monitor: usize,
}

/// Focus the next or previous window on the pointer's monitor
#[derive(FromArgs)]
#[argh(subcommand, name = "cycle-focus")]
struct CycleFocusCmd {
    /// direction: forward, backward
    #[argh(positional)]
    direction: String,
}

/// Swap the focused window with the next or previous monitor's window
#[derive(FromArgs)]
#[argh(subcommand, name = "swap-window")]
struct SwapWindowCmd {
    /// direction: forward, backward
    #[argh(positional)]
    direction: String,
}

/// Show the monitor to workspace mapping
#[derive(FromArgs)]
#[argh(subcommand, name = "get-state")]
struct GetStateCmd {}

/// List monitors and the workspace each one shows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-monitors")]
struct ListMonitorsCmd {}

/// List all windows
#[derive(FromArgs)]
#[argh(subcommand, name = "list-windows")]
struct ListWindowsCmd {}

/// Re-read config.json and the wallpaper groups
#[derive(FromArgs)]
#[argh(subcommand, name = "reload-config")]
struct ReloadConfigCmd {}

/// Print state events as JSON lines
#[derive(FromArgs)]
#[argh(subcommand, name = "subscribe")]
struct SubscribeCmd {
    /// send a full snapshot first
    #[argh(switch)]
    snapshot: bool,
    /// mapping changes
    #[argh(switch)]
    mapping: bool,
    /// monitor rebuilds
    #[argh(switch)]
    monitors: bool,
    /// focus changes
    #[argh(switch)]
    focus: bool,
    /// enable and disable
    #[argh(switch)]
    lifecycle: bool,
}

/// Quit the perspace daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["perspace", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            let config = Config::load(&Config::default_path());
            logging::init(&config)?;
            tracing::info!("perspace {} starting", VERSION);
            app::App::run(config)
        }
        Some(SubCommand::Version(_)) => {
            println!("perspace {}", VERSION);
            Ok(())
        }
        Some(SubCommand::Subscribe(cmd)) => {
            let filter = EventFilter {
                mapping: cmd.mapping,
                monitors: cmd.monitors,
                focus: cmd.focus,
                lifecycle: cmd.lifecycle,
            };
            ipc::subscribe_and_print(cmd.snapshot, Some(filter))
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::State { state } => {
            println!("Enabled: {}", state.enabled);
            println!("Active workspace: {}", state.active_workspace);
            println!("Focused window: {:?}", state.focused_window_id);
            for m in state.mappings {
                println!(
                    "Monitor {}{} -> workspace {}",
                    m.monitor,
                    if m.is_primary { " (primary)" } else { "" },
                    m.workspace
                );
            }
            if state.operation_in_flight {
                println!("Switch in progress, {} queued", state.queued_requests);
            }
        }
        Response::Monitors { monitors } => {
            for m in monitors {
                let workspace = m
                    .workspace
                    .map(|w| w.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}: {}x{} @ ({},{}) workspace={}{}",
                    m.index,
                    m.width,
                    m.height,
                    m.x,
                    m.y,
                    workspace,
                    if m.is_primary { " *" } else { "" }
                );
            }
        }
        Response::Windows { windows } => {
            for w in windows {
                let opt = |v: Option<usize>| {
                    v.map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string())
                };
                println!(
                    "{}: {} [monitor={}, workspace={}, {}x{} @ ({},{})]{}{}",
                    w.id,
                    w.title,
                    opt(w.monitor),
                    opt(w.workspace),
                    w.width,
                    w.height,
                    w.x,
                    w.y,
                    if w.is_pending { " (pending)" } else { "" },
                    if w.is_focused { " *" } else { "" }
                );
            }
        }
    }

    Ok(())
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) | SubCommand::Subscribe(_) => {
            bail!("not a daemon command")
        }
        SubCommand::SwitchToWorkspace(cmd) => Ok(Command::SwitchToWorkspace {
            workspace: cmd.workspace,
        }),
        SubCommand::MoveWindowToWorkspace(cmd) => Ok(Command::MoveWindowToWorkspace {
            workspace: cmd.workspace,
        }),
        SubCommand::WarpToMonitor(cmd) => Ok(Command::WarpToMonitor {
            monitor: cmd.monitor,
        }),
        SubCommand::CycleFocus(cmd) => Ok(Command::CycleFocus {
            direction: parse_direction(&cmd.direction)?,
        }),
        SubCommand::SwapWindow(cmd) => Ok(Command::SwapWindow {
            direction: parse_direction(&cmd.direction)?,
        }),
        SubCommand::GetState(_) => Ok(Command::GetState),
        SubCommand::ListMonitors(_) => Ok(Command::ListMonitors),
        SubCommand::ListWindows(_) => Ok(Command::ListWindows),
        SubCommand::ReloadConfig(_) => Ok(Command::ReloadConfig),
        SubCommand::Quit(_) => Ok(Command::Quit),
    }
}

fn parse_direction(s: &str) -> Result<Direction> {
    match s.to_lowercase().as_str() {
        "forward" | "next" => Ok(Direction::Forward),
        "backward" | "prev" => Ok(Direction::Backward),
        _ => bail!("Unknown direction: {} (use forward or backward)", s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("forward").unwrap(), Direction::Forward);
        assert_eq!(parse_direction("Prev").unwrap(), Direction::Backward);
        assert!(parse_direction("left").is_err());
    }

    #[test]
    fn test_to_command() {
        let cmd = to_command(SubCommand::SwitchToWorkspace(SwitchToWorkspaceCmd {
            workspace: 3,
        }))
        .unwrap();
        assert_eq!(cmd, Command::SwitchToWorkspace { workspace: 3 });

        let cmd = to_command(SubCommand::SwapWindow(SwapWindowCmd {
            direction: "backward".to_string(),
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::SwapWindow {
                direction: Direction::Backward
            }
        );

        assert!(to_command(SubCommand::Version(VersionCmd {})).is_err());
    }

    #[test]
    fn test_cli_parses_subscribe_flags() {
        let cli = Cli::from_args(&["perspace"], &["subscribe", "--snapshot", "--mapping"]).unwrap();
        match cli.command {
            Some(SubCommand::Subscribe(cmd)) => {
                assert!(cmd.snapshot);
                assert!(cmd.mapping);
                assert!(!cmd.focus);
            }
            _ => panic!("expected subscribe"),
        }
    }
}
