use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Protocol-level identifier of a client window, as handed to us by the display
/// layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl WindowId {
    pub const NONE: WindowId = WindowId(0);

    pub fn is_none(self) -> bool { self == Self::NONE }
}

/// The managed part of a client window: the properties layout decisions depend
/// on. Everything else about the window lives in the display layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    #[serde(default)]
    pub class_instance: Option<String>,
    #[serde(default)]
    pub class_class: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    uses_net_wm_name: bool,
    #[serde(default)]
    pub leader: Option<WindowId>,
    #[serde(default)]
    pub transient_for: Option<WindowId>,
}

/// A property change notification. `None` payloads mean the property could not
/// be fetched or was empty, in which case the stored value is left alone.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowProperty {
    /// Raw `WM_CLASS`: instance and class as two NUL-terminated strings.
    Class(Option<Vec<u8>>),
    /// UTF-8 `_NET_WM_NAME`.
    Name(Option<String>),
    /// Legacy `WM_NAME`, ignored once the window has set a UTF-8 name.
    LegacyName(Option<String>),
    Leader(Option<WindowId>),
    TransientFor(Option<WindowId>),
}

impl Window {
    pub fn new(id: WindowId) -> Self {
        Self {
            id,
            class_instance: None,
            class_class: None,
            name: None,
            uses_net_wm_name: false,
            leader: None,
            transient_for: None,
        }
    }

    /// Applies a property update. Returns whether anything changed.
    pub fn update(&mut self, property: WindowProperty) -> bool {
        match property {
            WindowProperty::Class(raw) => self.update_class(raw),
            WindowProperty::Name(name) => self.update_name(name),
            WindowProperty::LegacyName(name) => self.update_name_legacy(name),
            WindowProperty::Leader(leader) => {
                let Some(leader) = leader.filter(|l| !l.is_none()) else {
                    debug!(window = ?self.id, "leader not set, not updating");
                    return false;
                };
                debug!(window = ?self.id, ?leader, "client leader changed");
                self.leader = Some(leader);
                true
            }
            WindowProperty::TransientFor(parent) => {
                let Some(parent) = parent.filter(|p| !p.is_none()) else {
                    debug!(window = ?self.id, "transient_for not set, not updating");
                    return false;
                };
                debug!(window = ?self.id, ?parent, "transient for changed");
                self.transient_for = Some(parent);
                true
            }
        }
    }

    fn update_class(&mut self, raw: Option<Vec<u8>>) -> bool {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            debug!(window = ?self.id, "empty WM_CLASS, not updating");
            return false;
        };
        let mut parts = raw.split(|b| *b == 0);
        let instance = parts.next().map(|p| String::from_utf8_lossy(p).into_owned());
        let class = parts
            .next()
            .filter(|p| !p.is_empty())
            .map(|p| String::from_utf8_lossy(p).into_owned());
        info!(window = ?self.id, ?instance, ?class, "WM_CLASS changed");
        self.class_instance = instance;
        self.class_class = class;
        true
    }

    fn update_name(&mut self, name: Option<String>) -> bool {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            debug!(window = ?self.id, "_NET_WM_NAME not specified, not changing");
            return false;
        };
        info!(window = ?self.id, %name, "_NET_WM_NAME changed");
        self.name = Some(name);
        self.uses_net_wm_name = true;
        true
    }

    fn update_name_legacy(&mut self, name: Option<String>) -> bool {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            debug!(window = ?self.id, "WM_NAME empty, not changing");
            return false;
        };
        if self.uses_net_wm_name {
            return false;
        }
        info!(window = ?self.id, %name, "using legacy window title");
        self.name = Some(name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_splits_instance_and_class() {
        let mut w = Window::new(WindowId(7));
        assert!(w.update(WindowProperty::Class(Some(b"urxvt\0URxvt\0".to_vec()))));
        assert_eq!(w.class_instance.as_deref(), Some("urxvt"));
        assert_eq!(w.class_class.as_deref(), Some("URxvt"));
    }

    #[test]
    fn class_without_second_string_clears_class() {
        let mut w = Window::new(WindowId(7));
        w.update(WindowProperty::Class(Some(b"only".to_vec())));
        assert_eq!(w.class_instance.as_deref(), Some("only"));
        assert_eq!(w.class_class, None);
    }

    #[test]
    fn legacy_name_is_ignored_after_utf8_name() {
        let mut w = Window::new(WindowId(1));
        assert!(w.update(WindowProperty::LegacyName(Some("legacy".into()))));
        assert!(w.update(WindowProperty::Name(Some("utf8".into()))));
        assert!(!w.update(WindowProperty::LegacyName(Some("again".into()))));
        assert_eq!(w.name.as_deref(), Some("utf8"));
    }

    #[test]
    fn failed_fetches_leave_state_alone() {
        let mut w = Window::new(WindowId(1));
        w.update(WindowProperty::Leader(Some(WindowId(5))));
        assert!(!w.update(WindowProperty::Leader(None)));
        assert!(!w.update(WindowProperty::Leader(Some(WindowId::NONE))));
        assert_eq!(w.leader, Some(WindowId(5)));
        assert!(!w.update(WindowProperty::Class(None)));
    }
}
