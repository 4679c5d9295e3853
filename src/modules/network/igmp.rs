//! Global IGMP settings for NX-OS
//!
//! NX-OS exposes two global IGMP knobs that this crate manages:
//!
//! - `ip igmp flush-routes` - flush multicast routes when the IGMP process restarts
//! - `ip igmp enforce-router-alert` - drop IGMP packets without the router-alert option
//!
//! Both are off by default, and a disabled knob does not appear in
//! `show running-config igmp`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command that restarts the IGMP process. Always sent after configuration lines.
pub const RESTART_COMMAND: &str = "restart igmp";

/// Show command used to read the current global IGMP configuration
pub const SHOW_COMMAND: &str = "show running-config igmp";

/// A single global IGMP setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgmpKey {
    FlushRoutes,
    EnforceRtrAlert,
}

impl IgmpKey {
    /// All keys, in reporting order
    pub const ALL: [IgmpKey; 2] = [IgmpKey::FlushRoutes, IgmpKey::EnforceRtrAlert];

    /// Parameter name used in module arguments and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            IgmpKey::FlushRoutes => "flush_routes",
            IgmpKey::EnforceRtrAlert => "enforce_rtr_alert",
        }
    }

    /// NX-OS configuration line that enables this setting
    pub fn cli_line(&self) -> &'static str {
        match self {
            IgmpKey::FlushRoutes => "ip igmp flush-routes",
            IgmpKey::EnforceRtrAlert => "ip igmp enforce-router-alert",
        }
    }

    /// Configuration line that puts the setting into the given state
    pub fn command(&self, enabled: bool) -> String {
        if enabled {
            self.cli_line().to_string()
        } else {
            format!("no {}", self.cli_line())
        }
    }
}

impl fmt::Display for IgmpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state global IGMP settings. `None` means "leave unspecified".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgmpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_routes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_rtr_alert: Option<bool>,
}

impl IgmpSettings {
    /// Settings NX-OS ships with
    pub fn defaults() -> Self {
        Self {
            flush_routes: Some(false),
            enforce_rtr_alert: Some(false),
        }
    }

    pub fn get(&self, key: IgmpKey) -> Option<bool> {
        match key {
            IgmpKey::FlushRoutes => self.flush_routes,
            IgmpKey::EnforceRtrAlert => self.enforce_rtr_alert,
        }
    }

    pub fn set(&mut self, key: IgmpKey, value: Option<bool>) {
        match key {
            IgmpKey::FlushRoutes => self.flush_routes = value,
            IgmpKey::EnforceRtrAlert => self.enforce_rtr_alert = value,
        }
    }

    /// Specified settings as an ordered key/value list
    pub fn pairs(&self) -> Vec<(IgmpKey, bool)> {
        IgmpKey::ALL
            .iter()
            .filter_map(|key| self.get(*key).map(|value| (*key, value)))
            .collect()
    }

    /// Build settings from a key/value list; later pairs win
    pub fn from_pairs(pairs: &[(IgmpKey, bool)]) -> Self {
        let mut settings = Self::default();
        for (key, value) in pairs {
            settings.set(*key, Some(*value));
        }
        settings
    }

    pub fn is_empty(&self) -> bool {
        self.flush_routes.is_none() && self.enforce_rtr_alert.is_none()
    }

    /// Ordered map of the specified settings, for reports
    pub fn to_map(&self) -> IndexMap<String, bool> {
        self.pairs()
            .into_iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect()
    }
}

/// Pairs in `proposed` that do not appear identically in `existing`.
///
/// A key present on both sides with different values yields exactly one entry,
/// carrying the proposed value. Keys only in `existing` are ignored.
pub fn compute_delta(
    proposed: &[(IgmpKey, bool)],
    existing: &[(IgmpKey, bool)],
) -> Vec<(IgmpKey, bool)> {
    let mut delta: Vec<(IgmpKey, bool)> = Vec::new();
    for pair in proposed {
        if !existing.contains(pair) && !delta.contains(pair) {
            delta.push(*pair);
        }
    }
    delta
}

/// Configuration lines that apply exactly the settings in `delta`
pub fn config_commands(delta: &[(IgmpKey, bool)]) -> Vec<String> {
    delta
        .iter()
        .map(|(key, value)| key.command(*value))
        .collect()
}

/// Read global IGMP settings out of `show running-config igmp` text.
///
/// Both keys are always populated: a missing line means the setting is off.
pub fn parse_running_config(text: &str) -> IgmpSettings {
    let enabled = |key: IgmpKey| text.lines().any(|line| line.trim() == key.cli_line());

    IgmpSettings {
        flush_routes: Some(enabled(IgmpKey::FlushRoutes)),
        enforce_rtr_alert: Some(enabled(IgmpKey::EnforceRtrAlert)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING_CONFIG: &str = "\
!Command: show running-config igmp
!Time: Tue Mar  1 10:22:41 2016

version 7.0(3)I2(1)
ip igmp flush-routes
";

    #[test]
    fn test_key_names() {
        assert_eq!(IgmpKey::FlushRoutes.as_str(), "flush_routes");
        assert_eq!(IgmpKey::EnforceRtrAlert.to_string(), "enforce_rtr_alert");
    }

    #[test]
    fn test_commands_for_each_state() {
        assert_eq!(IgmpKey::FlushRoutes.command(true), "ip igmp flush-routes");
        assert_eq!(
            IgmpKey::EnforceRtrAlert.command(false),
            "no ip igmp enforce-router-alert"
        );
    }

    #[test]
    fn test_pairs_skip_unset_keys() {
        let settings = IgmpSettings {
            flush_routes: None,
            enforce_rtr_alert: Some(true),
        };
        assert_eq!(settings.pairs(), vec![(IgmpKey::EnforceRtrAlert, true)]);
        assert!(IgmpSettings::default().pairs().is_empty());
        assert!(IgmpSettings::default().is_empty());
    }

    #[test]
    fn test_from_pairs_round_trips_through_pairs() {
        let settings = IgmpSettings::from_pairs(&[(IgmpKey::FlushRoutes, true)]);
        assert_eq!(settings.flush_routes, Some(true));
        assert_eq!(settings.enforce_rtr_alert, None);
    }

    #[test]
    fn test_delta_changed_value() {
        let existing = IgmpSettings::defaults().pairs();
        let proposed = vec![(IgmpKey::FlushRoutes, true)];

        assert_eq!(
            compute_delta(&proposed, &existing),
            vec![(IgmpKey::FlushRoutes, true)]
        );
    }

    #[test]
    fn test_delta_empty_when_subset() {
        let existing = vec![(IgmpKey::FlushRoutes, true), (IgmpKey::EnforceRtrAlert, false)];
        let proposed = vec![(IgmpKey::FlushRoutes, true)];

        assert!(compute_delta(&proposed, &existing).is_empty());
    }

    #[test]
    fn test_delta_new_key() {
        let existing = vec![(IgmpKey::FlushRoutes, false)];
        let proposed = vec![(IgmpKey::EnforceRtrAlert, false)];

        assert_eq!(
            compute_delta(&proposed, &existing),
            vec![(IgmpKey::EnforceRtrAlert, false)]
        );
    }

    #[test]
    fn test_config_commands_follow_delta_order() {
        let delta = vec![(IgmpKey::EnforceRtrAlert, true), (IgmpKey::FlushRoutes, false)];
        assert_eq!(
            config_commands(&delta),
            vec!["ip igmp enforce-router-alert", "no ip igmp flush-routes"]
        );
    }

    #[test]
    fn test_parse_running_config() {
        let settings = parse_running_config(RUNNING_CONFIG);
        assert_eq!(settings.flush_routes, Some(true));
        assert_eq!(settings.enforce_rtr_alert, Some(false));
    }

    #[test]
    fn test_parse_ignores_negated_lines() {
        let settings = parse_running_config("no ip igmp flush-routes\n");
        assert_eq!(settings, IgmpSettings::defaults());
    }

    #[test]
    fn test_parse_empty_output_is_defaults() {
        assert_eq!(parse_running_config(""), IgmpSettings::defaults());
    }

    #[test]
    fn test_to_map_preserves_key_order() {
        let map = IgmpSettings {
            flush_routes: Some(true),
            enforce_rtr_alert: Some(false),
        }
        .to_map();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["flush_routes", "enforce_rtr_alert"]);
    }
}
