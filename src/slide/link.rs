//! Paired views that mirror each other's navigation
//!
//! Links live in a registry keyed by view id instead of references between
//! views. A mirrored operation replays the same input on the peer with
//! [`Mirror::No`], so it never bounces back.

use std::collections::HashMap;

use super::view::SlideView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub usize);

/// Whether an operation should also be applied to the linked peer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirror {
    Yes,
    No,
}

/// Symmetric peer registry; each view has at most one peer
#[derive(Clone, Debug, Default)]
pub struct ViewLinks {
    peers: HashMap<ViewId, ViewId>,
}

impl ViewLinks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `a` with `b`, dropping any links either had before.
    /// Linking a view to itself does nothing.
    pub fn link(&mut self, a: ViewId, b: ViewId) {
        if a == b {
            return;
        }
        self.unlink(a);
        self.unlink(b);
        self.peers.insert(a, b);
        self.peers.insert(b, a);
    }

    /// Remove `a`'s link, and the peer's link back to `a`
    pub fn unlink(&mut self, a: ViewId) {
        if let Some(peer) = self.peers.remove(&a) {
            if self.peers.get(&peer) == Some(&a) {
                self.peers.remove(&peer);
            }
        }
    }

    #[must_use]
    pub fn peer(&self, id: ViewId) -> Option<ViewId> {
        self.peers.get(&id).copied()
    }

    #[must_use]
    pub fn is_linked(&self, id: ViewId) -> bool {
        self.peers.contains_key(&id)
    }
}

/// Views sharing one host, with their link registry
#[derive(Default)]
pub struct ViewGroup {
    views: Vec<SlideView>,
    links: ViewLinks,
}

impl ViewGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, view: SlideView) -> ViewId {
        self.views.push(view);
        ViewId(self.views.len() - 1)
    }

    #[must_use]
    pub fn get(&self, id: ViewId) -> Option<&SlideView> {
        self.views.get(id.0)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut SlideView> {
        self.views.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = ViewId> + use<> {
        (0..self.views.len()).map(ViewId)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ViewId, &mut SlideView)> {
        self.views
            .iter_mut()
            .enumerate()
            .map(|(i, view)| (ViewId(i), view))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[must_use]
    pub fn links(&self) -> &ViewLinks {
        &self.links
    }

    pub fn link(&mut self, a: ViewId, b: ViewId) {
        if a.0 < self.views.len() && b.0 < self.views.len() {
            self.links.link(a, b);
        }
    }

    pub fn unlink(&mut self, a: ViewId) {
        self.links.unlink(a);
    }

    pub fn pan(&mut self, id: ViewId, dx: i64, dy: i64, mirror: Mirror) {
        self.apply(id, mirror, |view| view.pan(dx, dy));
    }

    pub fn translate(&mut self, id: ViewId, dx: i64, dy: i64, mirror: Mirror) {
        self.apply(id, mirror, |view| view.translate(dx, dy));
    }

    pub fn zoom_at(&mut self, id: ViewId, x: i64, y: i64, steps: i32, mirror: Mirror) {
        self.apply(id, mirror, |view| view.zoom_at(x, y, steps));
    }

    pub fn center(&mut self, id: ViewId, mirror: Mirror) {
        self.apply(id, mirror, SlideView::center);
    }

    fn apply(&mut self, id: ViewId, mirror: Mirror, op: impl Fn(&mut SlideView)) {
        let Some(view) = self.views.get_mut(id.0) else {
            return;
        };
        op(view);

        if mirror == Mirror::No {
            return;
        }
        if let Some(peer) = self.links.peer(id) {
            if let Some(view) = self.views.get_mut(peer.0) {
                op(view);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_is_symmetric() {
        let mut links = ViewLinks::new();
        links.link(ViewId(0), ViewId(1));

        assert_eq!(links.peer(ViewId(0)), Some(ViewId(1)));
        assert_eq!(links.peer(ViewId(1)), Some(ViewId(0)));
    }

    #[test]
    fn unlink_clears_both_sides() {
        let mut links = ViewLinks::new();
        links.link(ViewId(0), ViewId(1));
        links.unlink(ViewId(0));

        assert_eq!(links.peer(ViewId(0)), None);
        assert_eq!(links.peer(ViewId(1)), None);
    }

    #[test]
    fn relinking_drops_prior_peers() {
        let mut links = ViewLinks::new();
        links.link(ViewId(0), ViewId(1));
        links.link(ViewId(2), ViewId(3));
        links.link(ViewId(1), ViewId(2));

        assert_eq!(links.peer(ViewId(1)), Some(ViewId(2)));
        assert_eq!(links.peer(ViewId(2)), Some(ViewId(1)));
        assert!(!links.is_linked(ViewId(0)));
        assert!(!links.is_linked(ViewId(3)));
    }

    #[test]
    fn self_link_is_ignored() {
        let mut links = ViewLinks::new();
        links.link(ViewId(4), ViewId(4));

        assert!(!links.is_linked(ViewId(4)));
    }

    #[test]
    fn unlink_unlinked_is_noop() {
        let mut links = ViewLinks::new();
        links.link(ViewId(0), ViewId(1));
        links.unlink(ViewId(7));

        assert_eq!(links.peer(ViewId(0)), Some(ViewId(1)));
    }
}
