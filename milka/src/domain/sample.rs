//! Built-in sample directory shown when no data file or backend is configured

use super::directory::{Call, CallKind, Channel, Chat, Contact, Directory};
use super::story::{StoryGroup, StoryItem};

const UNSPLASH: &str = "https://images.unsplash.com";

fn photo(id: &str) -> String {
    format!("{}/photo-{}?w=400", UNSPLASH, id)
}

impl Directory {
    /// Sample data for the local (offline) variant
    pub fn sample() -> Self {
        let statuses = vec![
            StoryGroup::new(1, "My status", "👤", "Tap to add a status", vec![]),
            StoryGroup::new(
                2,
                "Anna",
                "👩",
                "Today, 14:23",
                vec![
                    StoryItem::new(1, photo("1506905925346-21bda4d32df4"), "14:23"),
                    StoryItem::new(2, photo("1501594907352-04cda38ebc29"), "15:10"),
                ],
            ),
            StoryGroup::new(
                3,
                "Maxim",
                "👨",
                "Today, 12:45",
                vec![StoryItem::new(1, photo("1511593358241-7eea1f3c84e5"), "12:45")],
            ),
            StoryGroup::new(
                4,
                "Elena",
                "👩‍🦰",
                "Yesterday, 22:15",
                vec![StoryItem::new(1, photo("1469474968028-56623f02e42e"), "22:15")],
            ),
            StoryGroup::new(
                5,
                "Dmitry",
                "🧑",
                "Yesterday, 19:30",
                vec![StoryItem::new(1, photo("1472214103451-9374bd1c798e"), "19:30")],
            ),
        ];

        let chats = vec![
            chat(1, "Anna Petrova", "👩", "Hi! How are you?", "14:23", 2),
            chat(2, "Work group", "👥", "Meeting at 15:00", "13:45", 5),
            chat(3, "Maxim", "👨", "Sent the files", "12:30", 0),
            chat(4, "Mom", "❤️", "Come over this weekend", "Yesterday", 0),
        ];

        let channels = vec![
            channel(1, "IT News", "📱", "12.5K", "2 hours ago"),
            channel(2, "Design & UX", "🎨", "8.3K", "5 hours ago"),
            channel(3, "Programming", "💻", "25K", "1 hour ago"),
        ];

        let calls = vec![
            call(1, "Anna Petrova", "👩", CallKind::Incoming, "Today, 14:23", Some("5:32")),
            call(2, "Maxim", "👨", CallKind::Outgoing, "Today, 12:15", Some("2:10")),
            call(3, "Work group", "👥", CallKind::Missed, "Yesterday, 18:45", None),
        ];

        let contacts = vec![
            contact(1, "Anna Petrova", "👩", "+7 900 123-45-67", true),
            contact(2, "Maxim Ivanov", "👨", "+7 900 987-65-43", false),
            contact(3, "Elena Sidorova", "👩‍🦰", "+7 900 555-55-55", true),
            contact(4, "Dmitry Petrov", "🧑", "+7 900 111-22-33", false),
        ];

        Self {
            statuses,
            chats,
            channels,
            calls,
            contacts,
        }
    }
}

fn chat(id: u64, name: &str, avatar: &str, last_message: &str, time: &str, unread: u32) -> Chat {
    Chat {
        id,
        name: name.to_string(),
        avatar: avatar.to_string(),
        last_message: last_message.to_string(),
        time: time.to_string(),
        unread,
    }
}

fn channel(id: u64, name: &str, avatar: &str, subscribers: &str, last_post: &str) -> Channel {
    Channel {
        id,
        name: name.to_string(),
        avatar: avatar.to_string(),
        subscribers: subscribers.to_string(),
        last_post: last_post.to_string(),
    }
}

fn call(id: u64, name: &str, avatar: &str, kind: CallKind, time: &str, duration: Option<&str>) -> Call {
    Call {
        id,
        name: name.to_string(),
        avatar: avatar.to_string(),
        kind,
        time: time.to_string(),
        duration: duration.map(str::to_string),
    }
}

fn contact(id: u64, name: &str, avatar: &str, phone: &str, online: bool) -> Contact {
    Contact {
        id,
        name: name.to_string(),
        avatar: avatar.to_string(),
        phone: phone.to_string(),
        online,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_own_status_is_inert() {
        let dir = Directory::sample();
        assert!(!dir.statuses[0].is_playable());
        assert!(dir.statuses[1..].iter().all(|s| s.is_playable()));
    }

    #[test]
    fn test_sample_missed_calls_have_no_duration() {
        let dir = Directory::sample();
        for call in &dir.calls {
            assert_eq!(call.kind == CallKind::Missed, call.duration.is_none());
        }
    }
}
