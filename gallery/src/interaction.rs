//! Per-viewer like and sort state for one album session.

use api_client::Asset;

/// Asset ids liked by the current viewer, in the order they were liked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikedSet {
    ids: Vec<String>,
}

impl LikedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Flip membership of `id`. Returns whether it is liked afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|i| i == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhotoInteraction {
    liked: LikedSet,
    sort_by_liked: bool,
}

impl PhotoInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// No membership check against the album here; see `AlbumView::toggle_like`.
    pub fn toggle_like(&mut self, asset_id: &str) -> bool {
        self.liked.toggle(asset_id)
    }

    pub fn is_liked(&self, asset_id: &str) -> bool {
        self.liked.contains(asset_id)
    }

    pub fn liked(&self) -> &LikedSet {
        &self.liked
    }

    pub fn sort_by_liked(&self) -> bool {
        self.sort_by_liked
    }

    pub fn set_sort_by_liked(&mut self, enabled: bool) {
        self.sort_by_liked = enabled;
    }

    pub fn toggle_sort(&mut self) -> bool {
        self.sort_by_liked = !self.sort_by_liked;
        self.sort_by_liked
    }

    /// Display order of `assets`. With sorting on, liked assets come first and
    /// both groups keep their server order.
    pub fn effective_order<'a>(&self, assets: &'a [Asset]) -> Vec<&'a Asset> {
        if !self.sort_by_liked {
            return assets.iter().collect();
        }
        let (liked, rest): (Vec<&Asset>, Vec<&Asset>) =
            assets.iter().partition(|a| self.liked.contains(&a.id));
        liked.into_iter().chain(rest).collect()
    }

    pub fn reset(&mut self) {
        self.liked.clear();
        self.sort_by_liked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str) -> Asset {
        Asset {
            id: id.to_string(),
            file_path: format!("media/{}.jpg", id),
            thumb_path: None,
            album_id: None,
        }
    }

    fn ids(order: &[&Asset]) -> Vec<String> {
        order.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn toggle_twice_restores_set() {
        let mut set = LikedSet::new();
        set.toggle("a");
        let before = set.clone();
        assert!(set.toggle("b"));
        assert!(!set.toggle("b"));
        assert_eq!(set, before);
    }

    #[test]
    fn sort_by_liked_is_stable_partition() {
        let assets = vec![asset("A"), asset("B"), asset("C"), asset("D")];
        let mut state = PhotoInteraction::new();
        state.toggle_like("A");
        state.toggle_like("C");

        state.set_sort_by_liked(true);
        assert_eq!(ids(&state.effective_order(&assets)), ["A", "C", "B", "D"]);

        state.set_sort_by_liked(false);
        assert_eq!(ids(&state.effective_order(&assets)), ["A", "B", "C", "D"]);
    }

    #[test]
    fn partition_keeps_server_order_not_like_order() {
        let assets = vec![asset("A"), asset("B"), asset("C"), asset("D")];
        let mut state = PhotoInteraction::new();
        state.toggle_like("D");
        state.toggle_like("B");
        state.toggle_sort();
        assert_eq!(ids(&state.effective_order(&assets)), ["B", "D", "A", "C"]);
    }

    #[test]
    fn unknown_ids_are_accepted_at_this_layer() {
        let mut state = PhotoInteraction::new();
        assert!(state.toggle_like("ghost"));
        assert!(state.is_liked("ghost"));
        assert!(state.effective_order(&[]).is_empty());
    }

    #[test]
    fn reset_clears_likes_and_sort() {
        let mut state = PhotoInteraction::new();
        state.toggle_like("A");
        state.toggle_sort();
        state.reset();
        assert!(state.liked().is_empty());
        assert!(!state.sort_by_liked());
    }
}
