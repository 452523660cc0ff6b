use slotmap::SlotMap;
use tracing::{debug, trace};

use super::con::{Con, ConId, ConType};
use super::window::WindowId;
use crate::common::collections::HashMap;
use crate::common::config::LayoutSettings;
use crate::sys::display::DisplayOp;

/// Trees deeper than this are assumed to contain a cycle.
pub(crate) const MAX_DEPTH: usize = 256;

/// The tree session: every container, the root, the focused container and the
/// window lookup table. All layout operations go through this object.
pub struct ConTree {
    pub(crate) cons: SlotMap<ConId, Con>,
    pub(crate) root: Option<ConId>,
    pub(crate) focused: Option<ConId>,
    pub(crate) windows: HashMap<WindowId, ConId>,
    pub(crate) settings: LayoutSettings,
    pub(crate) pending: Vec<DisplayOp>,
}

impl ConTree {
    /// An empty session without a root. Use [`ConTree::init`] or
    /// [`ConTree::restore`] to populate it.
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            cons: SlotMap::with_key(),
            root: None,
            focused: None,
            windows: HashMap::default(),
            settings,
            pending: Vec::new(),
        }
    }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    pub fn root(&self) -> Option<ConId> { self.root }

    /// The root container. Calling this on an uninitialized tree is a bug.
    pub fn croot(&self) -> ConId {
        self.root.unwrap_or_else(|| panic!("container tree used before initialization"))
    }

    pub fn focused(&self) -> ConId {
        self.focused.unwrap_or_else(|| panic!("container tree has no focused container"))
    }

    pub fn con(&self, id: ConId) -> &Con { &self.cons[id] }

    pub fn con_mut(&mut self, id: ConId) -> &mut Con { &mut self.cons[id] }

    pub fn get(&self, id: ConId) -> Option<&Con> { self.cons.get(id) }

    pub fn contains(&self, id: ConId) -> bool { self.cons.contains_key(id) }

    pub fn len(&self) -> usize { self.cons.len() }

    pub fn is_empty(&self) -> bool { self.cons.is_empty() }

    pub fn con_by_window_id(&self, window: WindowId) -> Option<ConId> {
        self.windows.get(&window).copied()
    }

    /// Requests accumulated for the display layer since the last render.
    pub fn pending_requests(&self) -> &[DisplayOp] { &self.pending }

    /// Allocates a detached container. The caller attaches (or explicitly
    /// parents) it right away.
    pub(crate) fn new_con(&mut self, kind: ConType) -> ConId {
        let con = Con::new(kind, self.settings.default_border);
        let id = self.cons.insert(con);
        trace!(con = ?id, %kind, "new container");
        id
    }

    /// Drops a detached container from the arena. Children must be gone.
    pub(crate) fn free(&mut self, id: ConId) {
        let con = self.cons.remove(id).unwrap_or_else(|| panic!("freeing unknown container {id:?}"));
        assert!(
            con.nodes.is_empty() && con.floating_nodes.is_empty(),
            "freeing container {id:?} that still has children"
        );
        if let Some(window) = con.window {
            if self.windows.get(&window.id) == Some(&id) {
                self.windows.remove(&window.id);
            }
        }
        self.pending.push(DisplayOp::DestroyFrame(id));
    }

    /// Inserts `con` into the right list of `parent`. The container is always
    /// appended to the focus list; [`ConTree::focus`] promotes it later.
    pub fn attach(&mut self, con: ConId, parent: ConId, ignore_focus: bool) {
        let kind = self.cons[con].kind;
        self.cons[con].parent = Some(parent);
        match kind {
            ConType::Workspace => {
                let num = self.cons[con].num;
                let pos = if num == -1 {
                    None
                } else {
                    self.cons[parent].nodes.iter().position(|&sibling| {
                        let n = self.cons[sibling].num;
                        n == -1 || n > num
                    })
                };
                debug!(workspace = ?con, num, "attaching workspace");
                let nodes = &mut self.cons[parent].nodes;
                match pos {
                    Some(pos) => nodes.insert(pos, con),
                    None => nodes.push(con),
                }
            }
            ConType::FloatingCon => {
                debug!(con = ?con, "inserting into floating containers");
                self.cons[parent].floating_nodes.push(con);
            }
            _ => {
                let after = if ignore_focus {
                    None
                } else {
                    self.first_tiling_focus(parent)
                };
                let nodes = &mut self.cons[parent].nodes;
                match after.and_then(|a| nodes.iter().position(|&n| n == a)) {
                    Some(pos) => {
                        trace!(con = ?con, after = ?nodes[pos], "inserting after focused tiling container");
                        nodes.insert(pos + 1, con)
                    }
                    None => nodes.push(con),
                }
            }
        }
        self.cons[parent].focus.push(con);
    }

    /// Removes `con` from its parent's structural and focus lists. The parent
    /// handle is kept so callers can still find where the container was.
    pub fn detach(&mut self, con: ConId) {
        let kind = self.cons[con].kind;
        let parent = self.cons[con]
            .parent
            .unwrap_or_else(|| panic!("detaching container {con:?} which has no parent"));
        let p = &mut self.cons[parent];
        if kind == ConType::FloatingCon {
            p.floating_nodes.retain(|&c| c != con);
        } else {
            p.nodes.retain(|&c| c != con);
        }
        p.focus.retain(|&c| c != con);
    }

    /// Puts `new` at the exact structural and focus position of `old`, leaving
    /// `old` detached.
    pub(crate) fn replace(&mut self, old: ConId, new: ConId) {
        let parent = self.cons[old]
            .parent
            .unwrap_or_else(|| panic!("replacing container {old:?} which has no parent"));
        let p = &mut self.cons[parent];
        for list in [&mut p.nodes, &mut p.focus] {
            if let Some(slot) = list.iter_mut().find(|c| **c == old) {
                *slot = new;
            }
        }
        self.cons[new].parent = Some(parent);
    }

    /// The first child of `con` in focus order that takes part in tiling.
    pub(crate) fn first_tiling_focus(&self, con: ConId) -> Option<ConId> {
        self.cons[con]
            .focus
            .iter()
            .copied()
            .find(|&c| self.cons[c].kind != ConType::FloatingCon)
    }

    /// Structural children: tiling first, then floating.
    pub(crate) fn children(&self, con: ConId) -> impl Iterator<Item = ConId> + '_ {
        let c = &self.cons[con];
        c.nodes.iter().chain(c.floating_nodes.iter()).copied()
    }

    pub fn ancestors(&self, con: ConId) -> impl Iterator<Item = ConId> + '_ {
        std::iter::successors(self.cons[con].parent, move |&p| self.cons.get(p).and_then(|c| c.parent))
    }

    /// Whether `con` lies in the subtree rooted at `ancestor` (inclusive).
    pub fn is_inside(&self, con: ConId, ancestor: ConId) -> bool {
        con == ancestor || self.ancestors(con).any(|a| a == ancestor)
    }

    fn first_of_kind(&self, con: ConId, kind: ConType) -> Option<ConId> {
        std::iter::once(con).chain(self.ancestors(con)).find(|&c| self.cons[c].kind == kind)
    }

    pub fn workspace_of_opt(&self, con: ConId) -> Option<ConId> {
        self.first_of_kind(con, ConType::Workspace)
    }

    /// The workspace `con` is on. Only valid below a workspace.
    pub fn workspace_of(&self, con: ConId) -> ConId {
        self.workspace_of_opt(con)
            .unwrap_or_else(|| panic!("container {con:?} is not on a workspace"))
    }

    pub fn output_of(&self, con: ConId) -> ConId {
        self.first_of_kind(con, ConType::Output)
            .unwrap_or_else(|| panic!("container {con:?} is not on an output"))
    }

    /// The floating wrapper `con` is in, if it is floating or inside floating
    /// content.
    pub fn inside_floating(&self, con: ConId) -> Option<ConId> {
        let mut current = con;
        loop {
            let c = &self.cons[current];
            if c.kind == ConType::FloatingCon {
                return Some(current);
            }
            if c.is_floating() {
                return c.parent;
            }
            if c.kind == ConType::Workspace {
                return None;
            }
            current = c.parent?;
        }
    }

    /// Breadth-first search for the first fullscreen container below `con`.
    pub fn fullscreen_con_below(&self, con: ConId) -> Option<ConId> {
        let mut queue = std::collections::VecDeque::from([con]);
        while let Some(current) = queue.pop_front() {
            if current != con
                && self.cons[current].fullscreen_mode != super::con::FullscreenMode::None
            {
                return Some(current);
            }
            queue.extend(self.children(current));
        }
        None
    }

    /// Preorder walk over the subtree rooted at `con`.
    pub fn traverse(&self, con: ConId) -> Vec<ConId> {
        let mut out = Vec::new();
        self.traverse_into(con, &mut out, 0);
        out
    }

    fn traverse_into(&self, con: ConId, out: &mut Vec<ConId>, depth: usize) {
        debug_assert!(depth < MAX_DEPTH, "container tree too deep, cycle at {con:?}?");
        out.push(con);
        for child in self.children(con) {
            self.traverse_into(child, out, depth + 1);
        }
    }

    pub fn workspaces(&self) -> Vec<ConId> {
        let Some(root) = self.root else { return Vec::new() };
        self.traverse(root)
            .into_iter()
            .filter(|&c| self.cons[c].kind == ConType::Workspace)
            .collect()
    }

    /// Checks every structural invariant and returns a description of each
    /// violation. An empty result means the tree is consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let Some(root) = self.root else {
            if self.focused.is_some() {
                issues.push("focused container set on a tree without root".to_string());
            }
            return issues;
        };
        if self.cons[root].parent.is_some() {
            issues.push(format!("root {root:?} has a parent"));
        }
        let reachable = self.traverse(root);
        let mut seen = crate::common::collections::HashSet::default();
        for &con in &reachable {
            if !seen.insert(con) {
                issues.push(format!("container {con:?} reachable twice"));
                continue;
            }
            let c = &self.cons[con];
            for &child in c.nodes.iter().chain(&c.floating_nodes) {
                if self.cons[child].parent != Some(con) {
                    issues.push(format!("{child:?} is listed under {con:?} but has another parent"));
                }
                let in_focus = c.focus.iter().filter(|&&f| f == child).count();
                if in_focus != 1 {
                    issues.push(format!("{child:?} appears {in_focus} times in focus list of {con:?}"));
                }
            }
            if c.focus.len() != c.nodes.len() + c.floating_nodes.len() {
                issues.push(format!("focus list of {con:?} does not match its children"));
            }
            if !c.floating_nodes.is_empty() && c.kind != ConType::Workspace {
                issues.push(format!("{con:?} has floating children but is a {}", c.kind));
            }
            for &f in &c.floating_nodes {
                if self.cons[f].kind != ConType::FloatingCon {
                    issues.push(format!("{f:?} is in the floating list but not a floating wrapper"));
                }
            }
            if c.kind == ConType::FloatingCon {
                if c.nodes.len() != 1 {
                    issues.push(format!("floating wrapper {con:?} has {} children", c.nodes.len()));
                }
                match c.parent.map(|p| &self.cons[p]) {
                    Some(p) if p.kind == ConType::Workspace && p.floating_nodes.contains(&con) => {}
                    _ => issues.push(format!("floating wrapper {con:?} is not on a workspace")),
                }
                if self.focused == Some(con) {
                    issues.push(format!("floating wrapper {con:?} holds the focus"));
                }
            }
            if c.window.is_some() && !c.nodes.is_empty() {
                issues.push(format!("{con:?} holds a window and has children"));
            }
            if !c.nodes.is_empty() && !matches!(c.kind, ConType::Root | ConType::Output) {
                let sum: f64 = c.nodes.iter().map(|&n| self.cons[n].percent).sum();
                if (sum - 1.0).abs() > 1e-9 {
                    issues.push(format!("percentages below {con:?} sum to {sum}"));
                }
            }
            if let Some(window) = &c.window {
                if self.windows.get(&window.id) != Some(&con) {
                    issues.push(format!("window {:?} of {con:?} is not registered", window.id));
                }
            }
            if let Some(old) = c.old_parent {
                if !self.cons.contains_key(old) {
                    issues.push(format!("old_parent of {con:?} is dangling"));
                }
            }
        }
        match self.focused {
            Some(f) if !seen.contains(&f) => {
                issues.push(format!("focused container {f:?} is not reachable from root"))
            }
            None => issues.push("no focused container".to_string()),
            _ => {}
        }
        if seen.len() != self.cons.len() {
            issues.push(format!(
                "{} containers allocated but only {} reachable",
                self.cons.len(),
                seen.len()
            ));
        }
        issues
    }

    pub fn draw_tree(&self) -> String {
        let Some(root) = self.root else { return String::new() };
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &self.ascii_tree(root));
        out
    }

    fn ascii_tree(&self, con: ConId) -> ascii_tree::Tree {
        let c = &self.cons[con];
        let mut desc = format!("{con:?} {}", c.kind);
        if !c.name.is_empty() {
            desc.push_str(&format!(" {:?}", c.name));
        }
        if c.kind != ConType::Root && c.kind != ConType::Output {
            desc.push_str(&format!(" {} {:?} {:.3}", c.layout, c.orientation, c.percent));
        }
        if let Some(w) = &c.window {
            desc.push_str(&format!(" window={:?}", w.id));
        }
        if c.is_floating() {
            desc.push_str(" floating");
        }
        if self.focused == Some(con) {
            desc.push_str(" *");
        }
        let children: Vec<_> = self.children(con).map(|c| self.ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }
}
