use tracing::trace;

use super::con::ConId;
use super::tree::ConTree;

impl ConTree {
    /// Normalizes the shares of the tiling children of `parent` so that they
    /// add up to 1.0.
    ///
    /// Children without a share (0.0) get the average of the shares seen so
    /// far. The average is computed incrementally while walking the children,
    /// so several fresh children in a row get slightly different shares.
    pub fn fix_percent(&mut self, parent: ConId) {
        let children = self.cons[parent].nodes.clone();
        if children.is_empty() {
            return;
        }

        let mut total = 0.0;
        let mut set = 0usize;
        for &child in &children {
            let percent = self.cons[child].percent;
            if percent > 0.0 {
                total += percent;
                set += 1;
            }
        }

        for &child in &children {
            let c = &mut self.cons[child];
            if c.percent <= 0.0 {
                c.percent = if set == 0 { 1.0 } else { total / set as f64 };
                total += c.percent;
            }
        }

        if total == 0.0 {
            let share = 1.0 / children.len() as f64;
            for &child in &children {
                self.cons[child].percent = share;
            }
        } else {
            for &child in &children {
                self.cons[child].percent /= total;
            }
        }
        trace!(parent = ?parent, children = children.len(), "fixed percentages");
    }
}
