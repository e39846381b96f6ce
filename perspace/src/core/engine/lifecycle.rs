use perspace_ipc::{
    SessionMode, StateEvent, SETTING_DYNAMIC_WORKSPACES, SETTING_WORKSPACES_ONLY_ON_PRIMARY,
};

use super::{DeferredTask, Lifecycle, MappingEngine};
use crate::core::{
    conflicting_host_keys, preserve_record, relocate, shortcut_table, Config, WindowLocator,
    WorkspaceIndex,
};
use crate::effect::Effect;
use crate::platform::WindowSystem;

impl MappingEngine {
    pub(super) fn enable<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        if self.lifecycle != Lifecycle::Disabled {
            return vec![];
        }
        let unmet = ws.settings().unmet_prerequisites();
        if !unmet.is_empty() {
            tracing::info!("Host settings need changing first: {:?}", unmet);
            self.lifecycle = Lifecycle::AwaitingConsent;
            return vec![Effect::PromptPrerequisites { settings: unmet }];
        }
        self.complete_enable(ws)
    }

    pub(super) fn on_consent_reply<W: WindowSystem>(&mut self, ws: &W, accepted: bool) -> Vec<Effect> {
        if self.lifecycle != Lifecycle::AwaitingConsent {
            return vec![];
        }
        if !accepted {
            tracing::warn!("Required host settings declined, disabling");
            self.lifecycle = Lifecycle::Disabled;
            self.host_wants_enabled = false;
            return vec![Effect::DisableSelf];
        }

        let settings = ws.settings();
        let mut effects = Vec::new();
        if !settings.workspaces_only_on_primary {
            effects.push(Effect::SetSetting {
                key: SETTING_WORKSPACES_ONLY_ON_PRIMARY.to_string(),
                value: true,
            });
        }
        if settings.dynamic_workspaces {
            effects.push(Effect::SetSetting {
                key: SETTING_DYNAMIC_WORKSPACES.to_string(),
                value: false,
            });
        }
        effects.extend(self.complete_enable(ws));
        effects
    }

    fn complete_enable<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        self.registry.rebuild(ws.monitors());
        if self.registry.is_empty() {
            tracing::warn!("Enabling without any monitors");
        }
        self.mapper.initialize(&self.registry, ws.active_workspace());
        self.lifecycle = Lifecycle::Enabled;
        self.expected_activations.clear();
        self.ensured_workspaces = 0;
        tracing::info!("Per-monitor workspaces enabled");

        let mut effects = vec![Effect::AcquireSubscriptions];
        if let Some(highest) = self.mapper.highest_workspace() {
            effects.extend(self.ensure_workspace(highest));
        }
        effects.extend(self.bind_shortcuts());
        effects.extend(self.displace_host_bindings(ws));
        if self.placement.has_preserved() {
            let delay = self.config.delays.snapshot_restore();
            effects.push(self.schedule(delay, DeferredTask::RestorePreserved));
        }
        effects.push(Effect::Notify(StateEvent::LifecycleChanged { enabled: true }));
        effects.push(Effect::Notify(StateEvent::MonitorsRebuilt {
            monitors: self.monitor_info(),
        }));
        effects.push(self.mapping_changed(ws));
        effects
    }

    pub(super) fn disable<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        match self.lifecycle {
            Lifecycle::Disabled => return vec![],
            Lifecycle::AwaitingConsent => {
                self.lifecycle = Lifecycle::Disabled;
                return vec![];
            }
            Lifecycle::Enabled => {}
        }
        tracing::info!("Per-monitor workspaces disabled");

        let mut effects = vec![Effect::CancelScheduled];
        effects.extend(self.collapse_secondaries(ws));
        effects.push(Effect::ReleaseSubscriptions);
        effects.extend(self.unbind_shortcuts());
        effects.extend(self.restore_host_bindings());

        self.placement.clear_all_pending();
        self.placement.record_lock(Vec::new());
        self.mapper.clear();
        self.gate.reset();
        self.focus.end_internal_switch();
        self.expected_activations.clear();
        self.lifecycle = Lifecycle::Disabled;

        effects.push(Effect::Notify(StateEvent::LifecycleChanged { enabled: false }));
        effects
    }

    /// Pull every window off the secondary monitors onto the primary's active
    /// workspace, remembering where each one sat.
    fn collapse_secondaries<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        let Some(primary) = self.registry.primary().cloned() else {
            return vec![];
        };
        let active = ws.active_workspace();
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);

        let mut effects = Vec::new();
        let mut preserved = 0;
        for monitor in self.registry.secondaries() {
            let workspace = self.mapper.workspace_for_monitor(monitor.index);
            for window in locator.windows_on_monitor(monitor.index, true) {
                preserved += 1;
                self.placement
                    .preserve(window.id, preserve_record(window, monitor, workspace));
                effects.extend(Effect::relocate(
                    window.id,
                    relocate(&window.frame, monitor, &primary),
                    primary.index,
                ));
                effects.push(Effect::SetWindowWorkspace {
                    window_id: window.id,
                    workspace: active,
                });
            }
        }
        tracing::debug!("Preserved {} windows from secondary monitors", preserved);
        effects
    }

    /// Put windows collapsed by the last disable back on the monitor they
    /// came from. Windows whose monitor has gone stay parked on their workspace.
    pub(super) fn restore_preserved<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        let active = self.primary_workspace().unwrap_or_else(|| ws.active_workspace());
        let mut effects = Vec::new();
        for (window_id, record) in self.placement.take_preserved() {
            if ws.window(window_id).is_none() {
                continue;
            }
            match self.registry.get(record.monitor).cloned() {
                Some(monitor) => {
                    effects.extend(Effect::relocate(
                        window_id,
                        record.rect_on(&monitor),
                        monitor.index,
                    ));
                    let workspace = if monitor.is_primary {
                        record.workspace
                    } else {
                        active
                    };
                    effects.push(Effect::SetWindowWorkspace {
                        window_id,
                        workspace,
                    });
                }
                None => {
                    // Its monitor is gone; it reappears at its old offset when shown
                    self.placement
                        .remember_offset(window_id, record.workspace, record.offset);
                    effects.push(Effect::SetWindowWorkspace {
                        window_id,
                        workspace: record.workspace,
                    });
                }
            }
        }
        effects
    }

    pub(super) fn on_monitors_changed<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        self.registry.rebuild(ws.monitors());
        self.mapper.initialize(&self.registry, ws.active_workspace());
        self.placement.clear_all_pending();

        let mut effects = Vec::new();
        if let Some(highest) = self.mapper.highest_workspace() {
            effects.extend(self.ensure_workspace(highest));
        }
        effects.push(Effect::Notify(StateEvent::MonitorsRebuilt {
            monitors: self.monitor_info(),
        }));
        effects.push(self.mapping_changed(ws));
        effects
    }

    pub(super) fn on_session_mode_changed<W: WindowSystem>(
        &mut self,
        ws: &W,
        mode: SessionMode,
    ) -> Vec<Effect> {
        match mode {
            SessionMode::Locked if self.placement.has_lock_records() => {
                // Relocked before the unlock refresh ran; the earlier record still holds
                tracing::info!("Session locked again, keeping the earlier record");
                vec![]
            }
            SessionMode::Locked => {
                let windows = ws.windows();
                let locator = WindowLocator::new(&self.registry, &windows);
                let mut records = Vec::new();
                for monitor in self.registry.secondaries() {
                    let workspace = self.mapper.workspace_for_monitor(monitor.index);
                    for window in locator.windows_on_monitor(monitor.index, false) {
                        records.push((window.id, preserve_record(window, monitor, workspace)));
                    }
                }
                tracing::info!("Session locked, recorded {} secondary windows", records.len());
                self.placement.record_lock(records);
                vec![]
            }
            SessionMode::User => {
                let delay = self.config.delays.unlock_refresh();
                vec![self.schedule(delay, DeferredTask::RefreshAfterUnlock)]
            }
        }
    }

    /// The host may shuffle secondary windows while locked; put them back.
    pub(super) fn refresh_after_unlock<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        if ws.session_mode() == SessionMode::Locked {
            tracing::debug!("Session locked again before the unlock refresh");
            return vec![];
        }
        let active = self.primary_workspace().unwrap_or_else(|| ws.active_workspace());
        let records = self.placement.take_lock_records();
        if records.is_empty() {
            return self.resettle_secondaries(ws, active);
        }
        let mut effects = Vec::new();
        for (window_id, record) in records {
            let Some(window) = ws.window(window_id) else {
                continue;
            };
            let Some(monitor) = self.registry.get(record.monitor).filter(|m| !m.is_primary) else {
                continue;
            };
            let rect = record.rect_on(monitor);
            if window.frame != rect {
                effects.extend(Effect::relocate(window_id, rect, monitor.index));
            }
            if window.workspace != active {
                effects.push(Effect::SetWindowWorkspace {
                    window_id,
                    workspace: active,
                });
            }
        }
        if !effects.is_empty() {
            tracing::info!("Refreshed secondary windows after unlock");
        }
        effects
    }

    /// Nothing recorded at lock time: keep whatever sits on the secondaries sticky.
    fn resettle_secondaries<W: WindowSystem>(
        &self,
        ws: &W,
        active: WorkspaceIndex,
    ) -> Vec<Effect> {
        let windows = ws.windows();
        let locator = WindowLocator::new(&self.registry, &windows);
        self.registry
            .secondaries()
            .flat_map(|monitor| locator.windows_on_monitor(monitor.index, false))
            .filter(|w| w.workspace != active)
            .map(|w| Effect::SetWindowWorkspace {
                window_id: w.id,
                workspace: active,
            })
            .collect()
    }

    pub fn reload_config<W: WindowSystem>(&mut self, _ws: &W, config: Config) -> Vec<Effect> {
        self.config = config;
        if !self.is_enabled() {
            return vec![];
        }
        let mut effects = self.unbind_shortcuts();
        effects.extend(self.bind_shortcuts());
        effects
    }

    fn bind_shortcuts(&mut self) -> Vec<Effect> {
        let table = shortcut_table(&self.config);
        self.bound_shortcuts = table.iter().map(|b| b.name.clone()).collect();
        vec![Effect::BindShortcuts(table)]
    }

    fn unbind_shortcuts(&mut self) -> Vec<Effect> {
        let names = std::mem::take(&mut self.bound_shortcuts);
        if names.is_empty() {
            return vec![];
        }
        vec![Effect::UnbindShortcuts(names)]
    }

    /// Blank the host's own workspace bindings. Originals already on disk
    /// from an earlier run are kept as they are.
    fn displace_host_bindings<W: WindowSystem>(&mut self, ws: &W) -> Vec<Effect> {
        let keys = conflicting_host_keys();
        let mut effects = Vec::new();
        if self.saved_bindings.is_empty() {
            for key in &keys {
                if let Some(original) = ws.host_binding(key) {
                    self.saved_bindings.0.insert(key.clone(), original);
                }
            }
            if !self.saved_bindings.is_empty() {
                effects.push(Effect::PersistSavedBindings(Some(
                    self.saved_bindings.clone(),
                )));
            }
        }
        for key in keys {
            if ws.host_binding(&key).is_some_and(|a| !a.is_empty()) {
                effects.push(Effect::SetHostBinding {
                    key,
                    accelerators: vec![],
                });
            }
        }
        effects
    }

    fn restore_host_bindings(&mut self) -> Vec<Effect> {
        if self.saved_bindings.is_empty() {
            return vec![];
        }
        let saved = std::mem::take(&mut self.saved_bindings);
        let mut effects: Vec<Effect> = saved
            .0
            .into_iter()
            .map(|(key, accelerators)| Effect::SetHostBinding { key, accelerators })
            .collect();
        effects.push(Effect::PersistSavedBindings(None));
        effects
    }
}
