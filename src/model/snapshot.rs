//! Persisting the tree across in-place restarts.
//!
//! Handles are meaningless outside a running session, so the snapshot is a
//! plain nested structure. Focus order and `old_parent` are stored as
//! positions: focus as indices into the children of a node, `old_parent` as a
//! path of child indices from the root.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::con::{BorderStyle, ConId, ConLayout, ConType, FloatingState, FullscreenMode};
use super::rect::Rect;
use super::tree::{ConTree, MAX_DEPTH};
use super::window::{Window, WindowId};
use crate::common::config::LayoutSettings;
use crate::layout_engine::Orientation;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("could not parse snapshot: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("top-level container is a {0}, not the root")]
    NotARoot(ConType),
    #[error("invalid focus order at {0:?}")]
    InvalidFocus(Vec<usize>),
    #[error("old parent path {0:?} does not exist")]
    DanglingOldParent(Vec<usize>),
    #[error("tree is nested too deeply")]
    TooDeep,
    #[error("restored tree has no container to focus")]
    NothingToFocus,
    #[error("restored tree is inconsistent: {0:?}")]
    Inconsistent(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TreeSnapshot {
    #[serde(default = "snapshot_version")]
    pub version: u32,
    pub root: ConSnapshot,
}

fn snapshot_version() -> u32 { SNAPSHOT_VERSION }

fn no_num() -> i32 { -1 }

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConSnapshot {
    pub kind: ConType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layout: ConLayout,
    #[serde(default)]
    pub orientation: Option<Orientation>,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub geometry: Rect,
    #[serde(default)]
    pub border_style: BorderStyle,
    #[serde(default)]
    pub fullscreen_mode: FullscreenMode,
    #[serde(default)]
    pub floating: FloatingState,
    #[serde(default)]
    pub window: Option<Window>,
    #[serde(default = "no_num")]
    pub num: i32,
    #[serde(default)]
    pub urgent: bool,
    /// Set on exactly one container: the one focused when the snapshot was
    /// taken.
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub nodes: Vec<ConSnapshot>,
    #[serde(default)]
    pub floating_nodes: Vec<ConSnapshot>,
    /// Indices into `nodes` followed by `floating_nodes`, most recent first.
    #[serde(default)]
    pub focus: Vec<usize>,
    #[serde(default)]
    pub old_parent: Option<Vec<usize>>,
}

impl TreeSnapshot {
    pub fn from_ron(buf: &str) -> Result<Self, RestoreError> {
        let snapshot: TreeSnapshot = ron::from_str(buf)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RestoreError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    pub fn serialize_to_string(&self) -> String {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).unwrap()
    }
}

impl ConTree {
    /// Position of `con` as child indices from the root.
    pub fn path_of(&self, con: ConId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = con;
        while let Some(parent) = self.cons[current].parent {
            let index = self
                .children(parent)
                .position(|c| c == current)
                .unwrap_or_else(|| panic!("{current:?} missing from children of {parent:?}"));
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn con_at_path(&self, path: &[usize]) -> Option<ConId> {
        let mut current = self.root?;
        for &index in path {
            current = self.children(current).nth(index)?;
        }
        Some(current)
    }

    pub fn snapshot(&self) -> Option<TreeSnapshot> {
        let root = self.root?;
        Some(TreeSnapshot {
            version: SNAPSHOT_VERSION,
            root: self.snapshot_con(root, 0),
        })
    }

    fn snapshot_con(&self, con: ConId, depth: usize) -> ConSnapshot {
        debug_assert!(depth < MAX_DEPTH, "snapshot recursion too deep at {con:?}");
        let c = &self.cons[con];
        let children: Vec<ConId> = self.children(con).collect();
        ConSnapshot {
            kind: c.kind,
            name: c.name.clone(),
            layout: c.layout,
            orientation: c.orientation,
            percent: c.percent,
            rect: c.rect,
            geometry: c.geometry,
            border_style: c.border_style,
            fullscreen_mode: c.fullscreen_mode,
            floating: c.floating,
            window: c.window.clone(),
            num: c.num,
            urgent: c.urgent,
            focused: self.focused == Some(con),
            nodes: c.nodes.iter().map(|&n| self.snapshot_con(n, depth + 1)).collect(),
            floating_nodes: c.floating_nodes.iter().map(|&n| self.snapshot_con(n, depth + 1)).collect(),
            focus: c
                .focus
                .iter()
                .filter_map(|f| children.iter().position(|c| c == f))
                .collect(),
            old_parent: c.old_parent.filter(|&p| self.cons.contains_key(p)).map(|p| self.path_of(p)),
        }
    }

    /// Rebuilds a tree from a snapshot. Leaves whose window no longer exists
    /// according to `is_live` are closed afterwards, which also reaps
    /// containers left empty by that.
    pub fn restore(
        snapshot: TreeSnapshot,
        settings: LayoutSettings,
        is_live: impl Fn(WindowId) -> bool,
    ) -> Result<ConTree, RestoreError> {
        if snapshot.root.kind != ConType::Root {
            return Err(RestoreError::NotARoot(snapshot.root.kind));
        }
        let mut tree = ConTree::new(settings);
        let mut old_parents = Vec::new();
        let mut focused = None;
        let mut path = Vec::new();
        let root = tree.build(snapshot.root, None, &mut path, &mut old_parents, &mut focused)?;
        tree.root = Some(root);

        for (con, path) in old_parents {
            let parent = tree.con_at_path(&path).ok_or(RestoreError::DanglingOldParent(path))?;
            tree.cons[con].old_parent = Some(parent);
        }

        let focused = match focused {
            Some(f) if f != root => f,
            _ => tree.descend_focused(root),
        };
        if focused == root {
            return Err(RestoreError::NothingToFocus);
        }
        tree.focus(focused);

        let gone: Vec<ConId> = tree
            .windows
            .iter()
            .filter(|(window, _)| !is_live(**window))
            .map(|(_, con)| *con)
            .collect();
        for con in gone {
            if tree.cons.contains_key(con) {
                debug!(con = ?con, "window vanished while restarting");
                tree.close(con, false, false);
            }
        }
        // nothing was framed yet, so there is nothing to release
        tree.pending.clear();

        let issues = tree.check_invariants();
        if !issues.is_empty() {
            warn!(?issues, "restored tree is inconsistent");
            return Err(RestoreError::Inconsistent(issues));
        }
        info!(containers = tree.len(), "restored tree");
        Ok(tree)
    }

    fn build(
        &mut self,
        snap: ConSnapshot,
        parent: Option<ConId>,
        path: &mut Vec<usize>,
        old_parents: &mut Vec<(ConId, Vec<usize>)>,
        focused: &mut Option<ConId>,
    ) -> Result<ConId, RestoreError> {
        if path.len() >= MAX_DEPTH {
            return Err(RestoreError::TooDeep);
        }
        let id = self.cons.insert(super::con::Con::new(snap.kind, snap.border_style));
        {
            let c = &mut self.cons[id];
            c.name = snap.name;
            c.layout = snap.layout;
            c.orientation = snap.orientation;
            c.percent = snap.percent;
            c.rect = snap.rect;
            c.geometry = snap.geometry;
            c.fullscreen_mode = snap.fullscreen_mode;
            c.floating = snap.floating;
            c.num = snap.num;
            c.urgent = snap.urgent;
            c.parent = parent;
        }
        if let Some(window) = snap.window {
            self.windows.insert(window.id, id);
            self.cons[id].window = Some(window);
        }
        if snap.focused {
            *focused = Some(id);
        }
        if let Some(old) = snap.old_parent {
            old_parents.push((id, old));
        }

        let tiling = snap.nodes.len();
        let mut children = Vec::with_capacity(tiling + snap.floating_nodes.len());
        for (index, child) in snap.nodes.into_iter().chain(snap.floating_nodes).enumerate() {
            path.push(index);
            children.push(self.build(child, Some(id), path, old_parents, focused)?);
            path.pop();
        }

        let mut focus = Vec::with_capacity(children.len());
        for index in snap.focus {
            let Some(&child) = children.get(index) else {
                return Err(RestoreError::InvalidFocus(path.clone()));
            };
            if focus.contains(&child) {
                return Err(RestoreError::InvalidFocus(path.clone()));
            }
            focus.push(child);
        }
        // children missing from the stored order go to the back
        for &child in &children {
            if !focus.contains(&child) {
                focus.push(child);
            }
        }

        let c = &mut self.cons[id];
        c.floating_nodes = children.split_off(tiling);
        c.nodes = children;
        c.focus = focus;
        Ok(id)
    }

    pub fn load(
        path: &Path,
        settings: LayoutSettings,
        is_live: impl Fn(WindowId) -> bool,
    ) -> anyhow::Result<Self> {
        let mut buf = String::new();
        File::open(path)?.read_to_string(&mut buf)?;
        let snapshot = TreeSnapshot::from_ron(&buf)?;
        Ok(Self::restore(snapshot, settings, is_live)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let Some(snapshot) = self.snapshot() else {
            anyhow::bail!("cannot save an uninitialized tree");
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?.write_all(snapshot.serialize_to_string().as_bytes())?;
        Ok(())
    }

    /// JSON dump of the tree, for inspection tools.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}
