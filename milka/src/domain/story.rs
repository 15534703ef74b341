//! Story (status) types
//!
//! A story group is the set of ephemeral items one contact has posted. The
//! order of `items` is playback order.

use serde::{Deserialize, Serialize};

/// A single story item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryItem {
    pub id: u64,
    /// Image URL or path
    pub image: String,
    /// When the item was posted, already formatted for display
    pub posted_at: String,
}

impl StoryItem {
    pub fn new(id: u64, image: impl Into<String>, posted_at: impl Into<String>) -> Self {
        Self {
            id,
            image: image.into(),
            posted_at: posted_at.into(),
        }
    }
}

/// A contact's stories, in playback order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryGroup {
    pub id: u64,
    pub owner_name: String,
    pub owner_avatar: String,
    /// Display label for the last update ("Today, 14:23")
    pub last_updated: String,
    #[serde(default)]
    pub items: Vec<StoryItem>,
}

impl StoryGroup {
    pub fn new(
        id: u64,
        owner_name: impl Into<String>,
        owner_avatar: impl Into<String>,
        last_updated: impl Into<String>,
        items: Vec<StoryItem>,
    ) -> Self {
        Self {
            id,
            owner_name: owner_name.into(),
            owner_avatar: owner_avatar.into(),
            last_updated: last_updated.into(),
            items,
        }
    }

    /// Groups without items (e.g. your own status before posting) are inert
    pub fn is_playable(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_group_is_not_playable() {
        let group = StoryGroup::new(1, "My status", "👤", "Tap to add", vec![]);
        assert!(!group.is_playable());
        assert!(group.is_empty());
    }

    #[test]
    fn test_group_with_items_is_playable() {
        let group = StoryGroup::new(
            2,
            "Anna",
            "👩",
            "Today, 14:23",
            vec![StoryItem::new(1, "a.jpg", "14:23"), StoryItem::new(2, "b.jpg", "15:10")],
        );
        assert!(group.is_playable());
        assert_eq!(group.len(), 2);
        assert_eq!(group.items[1].posted_at, "15:10");
    }

    #[test]
    fn test_items_default_to_empty_when_missing() {
        let yaml = "id: 7\nowner_name: Me\nowner_avatar: \"👤\"\nlast_updated: never\n";
        let group: StoryGroup = serde_yaml::from_str(yaml).unwrap();
        assert!(group.items.is_empty());
    }
}
