use perspace_ipc::{Command, Direction};

use super::{workspace_digit, Config, MonitorIndex, WorkspaceIndex, WORKSPACE_COUNT};

/// Number of warp-to-monitor shortcuts registered.
pub const MONITOR_SHORTCUT_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    SwitchToWorkspace(WorkspaceIndex),
    MoveWindowToWorkspace(WorkspaceIndex),
    WarpToMonitor(MonitorIndex),
    CycleFocus(Direction),
    SwapWindow(Direction),
}

impl ShortcutAction {
    pub fn all() -> Vec<ShortcutAction> {
        let mut actions = Vec::new();
        actions.extend((0..WORKSPACE_COUNT).map(ShortcutAction::SwitchToWorkspace));
        actions.extend((0..WORKSPACE_COUNT).map(ShortcutAction::MoveWindowToWorkspace));
        actions.extend((0..MONITOR_SHORTCUT_COUNT).map(ShortcutAction::WarpToMonitor));
        for direction in [Direction::Forward, Direction::Backward] {
            actions.push(ShortcutAction::CycleFocus(direction));
            actions.push(ShortcutAction::SwapWindow(direction));
        }
        actions
    }

    /// Registration name. Numbers are indices, so `switch-to-workspace-9` sits on key 0.
    pub fn name(&self) -> String {
        match self {
            ShortcutAction::SwitchToWorkspace(ws) => format!("switch-to-workspace-{}", ws),
            ShortcutAction::MoveWindowToWorkspace(ws) => {
                format!("move-window-to-workspace-{}", ws)
            }
            ShortcutAction::WarpToMonitor(m) => format!("warp-to-monitor-{}", m),
            ShortcutAction::CycleFocus(d) => format!("cycle-focus-{}", direction_name(*d)),
            ShortcutAction::SwapWindow(d) => format!("swap-window-{}", direction_name(*d)),
        }
    }

    pub fn parse(name: &str) -> Option<ShortcutAction> {
        let numbered = |prefix: &str, limit: usize| -> Option<usize> {
            let n: usize = name.strip_prefix(prefix)?.parse().ok()?;
            (n < limit).then_some(n)
        };
        if let Some(ws) = numbered("switch-to-workspace-", WORKSPACE_COUNT) {
            return Some(ShortcutAction::SwitchToWorkspace(ws));
        }
        if let Some(ws) = numbered("move-window-to-workspace-", WORKSPACE_COUNT) {
            return Some(ShortcutAction::MoveWindowToWorkspace(ws));
        }
        if let Some(m) = numbered("warp-to-monitor-", MONITOR_SHORTCUT_COUNT) {
            return Some(ShortcutAction::WarpToMonitor(m));
        }
        match name {
            "cycle-focus-forward" => Some(ShortcutAction::CycleFocus(Direction::Forward)),
            "cycle-focus-backward" => Some(ShortcutAction::CycleFocus(Direction::Backward)),
            "swap-window-forward" => Some(ShortcutAction::SwapWindow(Direction::Forward)),
            "swap-window-backward" => Some(ShortcutAction::SwapWindow(Direction::Backward)),
            _ => None,
        }
    }

    pub fn to_command(&self) -> Command {
        match *self {
            ShortcutAction::SwitchToWorkspace(workspace) => Command::SwitchToWorkspace { workspace },
            ShortcutAction::MoveWindowToWorkspace(workspace) => {
                Command::MoveWindowToWorkspace { workspace }
            }
            ShortcutAction::WarpToMonitor(monitor) => Command::WarpToMonitor { monitor },
            ShortcutAction::CycleFocus(direction) => Command::CycleFocus { direction },
            ShortcutAction::SwapWindow(direction) => Command::SwapWindow { direction },
        }
    }

    fn default_accelerators(&self, config: &Config) -> Vec<String> {
        let prefix = config.modifier.accelerator_prefix();
        match *self {
            ShortcutAction::SwitchToWorkspace(ws) => {
                vec![format!("{}{}", prefix, workspace_digit(ws))]
            }
            ShortcutAction::MoveWindowToWorkspace(ws) => {
                vec![format!("{}<Shift>{}", prefix, workspace_digit(ws))]
            }
            ShortcutAction::WarpToMonitor(m) => vec![format!("<Super><Control>{}", m + 1)],
            ShortcutAction::CycleFocus(Direction::Forward) => vec!["<Super>period".to_string()],
            ShortcutAction::CycleFocus(Direction::Backward) => vec!["<Super>comma".to_string()],
            ShortcutAction::SwapWindow(Direction::Forward) => {
                vec!["<Super><Shift>period".to_string()]
            }
            ShortcutAction::SwapWindow(Direction::Backward) => {
                vec!["<Super><Shift>comma".to_string()]
            }
        }
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "forward",
        Direction::Backward => "backward",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub name: String,
    pub accelerators: Vec<String>,
}

/// Every shortcut to register, with config overrides applied.
/// An override with no accelerators leaves the shortcut unbound.
pub fn shortcut_table(config: &Config) -> Vec<ShortcutBinding> {
    ShortcutAction::all()
        .into_iter()
        .filter_map(|action| {
            let name = action.name();
            let accelerators = config
                .bindings
                .get(&name)
                .cloned()
                .unwrap_or_else(|| action.default_accelerators(config));
            (!accelerators.is_empty()).then_some(ShortcutBinding { name, accelerators })
        })
        .collect()
}

/// Built-in host bindings that collide with the workspace digit shortcuts.
pub fn conflicting_host_keys() -> Vec<String> {
    (1..=WORKSPACE_COUNT)
        .flat_map(|n| {
            [
                format!("switch-to-workspace-{}", n),
                format!("move-to-workspace-{}", n),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perspace_ipc::Modifier;

    fn binding<'a>(table: &'a [ShortcutBinding], name: &str) -> Option<&'a ShortcutBinding> {
        table.iter().find(|b| b.name == name)
    }

    #[test]
    fn test_table_uses_configured_modifier() {
        let config = Config {
            modifier: Modifier::Alt,
            ..Default::default()
        };
        let table = shortcut_table(&config);
        assert_eq!(
            binding(&table, "switch-to-workspace-0").unwrap().accelerators,
            vec!["<Alt>1"]
        );
        assert_eq!(
            binding(&table, "switch-to-workspace-9").unwrap().accelerators,
            vec!["<Alt>0"]
        );
        assert_eq!(
            binding(&table, "move-window-to-workspace-2").unwrap().accelerators,
            vec!["<Alt><Shift>3"]
        );
    }

    #[test]
    fn test_table_overrides() {
        let mut config = Config::default();
        config
            .bindings
            .insert("cycle-focus-forward".to_string(), vec!["<Super>j".to_string()]);
        config.bindings.insert("swap-window-backward".to_string(), vec![]);
        let table = shortcut_table(&config);
        assert_eq!(
            binding(&table, "cycle-focus-forward").unwrap().accelerators,
            vec!["<Super>j"]
        );
        assert!(binding(&table, "swap-window-backward").is_none());
        assert_eq!(table.len(), ShortcutAction::all().len() - 1);
    }

    #[test]
    fn test_parse_names() {
        for action in ShortcutAction::all() {
            assert_eq!(ShortcutAction::parse(&action.name()), Some(action));
        }
        assert_eq!(ShortcutAction::parse("switch-to-workspace-10"), None);
        assert_eq!(ShortcutAction::parse("switch-to-workspace--1"), None);
        assert_eq!(ShortcutAction::parse("warp-to-monitor-8"), None);
        assert_eq!(ShortcutAction::parse("unknown"), None);
    }

    #[test]
    fn test_to_command() {
        assert_eq!(
            ShortcutAction::parse("switch-to-workspace-9")
                .unwrap()
                .to_command(),
            Command::SwitchToWorkspace { workspace: 9 }
        );
        assert_eq!(
            ShortcutAction::parse("warp-to-monitor-1").unwrap().to_command(),
            Command::WarpToMonitor { monitor: 1 }
        );
    }

    #[test]
    fn test_conflicting_host_keys() {
        let keys = conflicting_host_keys();
        assert_eq!(keys.len(), 20);
        assert!(keys.contains(&"switch-to-workspace-1".to_string()));
        assert!(keys.contains(&"move-to-workspace-10".to_string()));
    }
}
