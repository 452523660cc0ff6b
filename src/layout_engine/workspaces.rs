use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::{ConId, ConTree, ConType, FullscreenMode, Rect};

/// A physical output as reported by the display layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputInfo {
    pub name: String,
    pub rect: Rect,
    #[serde(default = "yes")]
    pub active: bool,
}

fn yes() -> bool { true }

impl OutputInfo {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self { name: name.into(), rect, active: true }
    }
}

impl ConTree {
    /// Builds the initial tree: the root, one output per active output and one
    /// visible workspace on each, numbered from 1. The last workspace gets
    /// focus.
    pub fn init(&mut self, outputs: &[OutputInfo]) {
        assert!(self.root.is_none(), "container tree initialized twice");
        let root = self.new_con(ConType::Root);
        self.cons[root].name = "root".to_string();
        self.root = Some(root);

        let mut last = None;
        for (num, output) in outputs.iter().filter(|o| o.active).enumerate() {
            let oc = self.new_con(ConType::Output);
            {
                let c = &mut self.cons[oc];
                c.name = output.name.clone();
                c.rect = output.rect;
            }
            self.attach(oc, root, false);

            let num = num as i32 + 1;
            let ws = self.new_con(ConType::Workspace);
            {
                let c = &mut self.cons[ws];
                c.name = num.to_string();
                c.num = num;
                c.orientation = Some(self.settings.default_orientation);
                c.fullscreen_mode = FullscreenMode::Output;
                c.rect = output.rect;
            }
            self.attach(ws, oc, false);
            info!(output = %output.name, workspace = num, "initialized output");
            last = Some(ws);
        }

        if let Some(ws) = last {
            self.focus(ws);
        }
    }

    pub fn find_workspace(&self, name: &str) -> Option<ConId> {
        self.workspaces().into_iter().find(|&ws| self.cons[ws].name == name)
    }

    /// Returns the workspace called `name`, creating it on the focused output
    /// if it does not exist yet.
    pub fn workspace_get(&mut self, name: &str) -> ConId {
        if let Some(ws) = self.find_workspace(name) {
            return ws;
        }
        let output = self.output_of(self.focused());
        let ws = self.new_con(ConType::Workspace);
        {
            let c = &mut self.cons[ws];
            c.name = name.to_string();
            c.num = name.parse::<i32>().ok().filter(|n| *n >= 0).unwrap_or(-1);
            c.orientation = Some(self.settings.default_orientation);
        }
        self.cons[ws].rect = self.cons[output].rect;
        self.attach(ws, output, false);
        debug!(workspace = ?ws, %name, "created workspace");
        ws
    }

    /// The workspace currently shown on `output`.
    pub fn visible_workspace(&self, output: ConId) -> Option<ConId> {
        let o = &self.cons[output];
        o.nodes
            .iter()
            .copied()
            .find(|&ws| self.cons[ws].fullscreen_mode == FullscreenMode::Output)
            .or_else(|| o.focus.first().copied())
    }

    /// Shows `ws` on its output and focuses what was last focused on it. The
    /// previously visible workspace is closed when it is empty.
    pub fn workspace_show(&mut self, ws: ConId) {
        assert_eq!(self.cons[ws].kind, ConType::Workspace, "{ws:?} is not a workspace");
        let output = self.output_of(ws);
        let old = self.visible_workspace(output);
        if old == Some(ws) && self.workspace_of_opt(self.focused()) == Some(ws) {
            debug!(workspace = ?ws, "workspace already shown");
            return;
        }
        if let Some(old) = old {
            self.cons[old].fullscreen_mode = FullscreenMode::None;
        }
        self.cons[ws].fullscreen_mode = FullscreenMode::Output;
        let target = self.descend_focused(ws);
        self.focus(target);
        info!(workspace = %self.cons[ws].name, "showing workspace");

        if let Some(old) = old.filter(|&o| o != ws) {
            let c = &self.cons[old];
            if c.nodes.is_empty() && c.floating_nodes.is_empty() {
                debug!(workspace = ?old, "closing empty workspace");
                self.close(old, false, true);
            }
        }
    }

    /// Switches to the workspace called `name`, creating it if necessary.
    pub fn workspace_switch(&mut self, name: &str) -> ConId {
        let ws = self.workspace_get(name);
        self.workspace_show(ws);
        ws
    }
}
