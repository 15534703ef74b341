//! Integration tests for status playback
//!
//! Drives the viewer through the public API the way the TUI and the `play`
//! command do: open, pump signals, react.

use std::time::Duration;

use milka::story::{PlaybackSignal, StoryViewer, ViewerEvent};
use milka::{Directory, StoryGroup, StoryItem};

const TICK: Duration = Duration::from_millis(3000);
const FINISH: Duration = Duration::from_millis(300);

fn two_items() -> StoryGroup {
    StoryGroup::new(
        7,
        "Anna",
        "👩",
        "Today, 14:23",
        vec![StoryItem::new(1, "a.jpg", "14:23"), StoryItem::new(2, "b.jpg", "15:10")],
    )
}

async fn pump(viewer: &mut StoryViewer) -> (PlaybackSignal, ViewerEvent) {
    let signal = viewer.next_signal().await.expect("schedule channel open");
    let event = viewer.handle(signal);
    (signal, event)
}

#[tokio::test(start_paused = true)]
async fn test_two_item_scenario() {
    let mut viewer = StoryViewer::new(TICK, FINISH);
    let start = tokio::time::Instant::now();
    assert!(viewer.open(two_items()));
    assert_eq!(viewer.controller().progress_percent(), 0.0);
    assert_eq!(viewer.controller().current_item_index(), Some(0));

    let (_, event) = pump(&mut viewer).await;
    assert_eq!(event, ViewerEvent::Advanced);
    assert_eq!(viewer.controller().progress_percent(), 50.0);
    assert_eq!(viewer.controller().segment_fills(), vec![1.0, 0.0]);
    assert!(start.elapsed() >= TICK);

    let (_, event) = pump(&mut viewer).await;
    assert_eq!(event, ViewerEvent::Finishing);
    assert_eq!(viewer.controller().progress_percent(), 100.0);
    assert_eq!(viewer.controller().current_item_index(), Some(1));
    assert!(viewer.controller().is_finishing());

    let (signal, event) = pump(&mut viewer).await;
    assert!(matches!(signal, PlaybackSignal::Finish(_)));
    assert_eq!(event, ViewerEvent::Closed);
    assert!(!viewer.is_open());
    assert_eq!(viewer.controller().progress_percent(), 0.0);
    assert!(start.elapsed() >= TICK * 2 + FINISH);
}

#[tokio::test(start_paused = true)]
async fn test_sample_statuses_play_to_completion() {
    let directory = Directory::sample();
    for group in directory.statuses.iter().filter(|g| g.is_playable()) {
        let mut viewer = StoryViewer::new(TICK, FINISH);
        assert!(viewer.open(group.clone()));

        let mut ticks = 0;
        loop {
            let (signal, event) = pump(&mut viewer).await;
            if matches!(signal, PlaybackSignal::Tick(_)) {
                ticks += 1;
            }
            if event == ViewerEvent::Closed {
                break;
            }
        }
        assert_eq!(ticks, group.len(), "group {}", group.owner_name);
    }
}

#[tokio::test(start_paused = true)]
async fn test_empty_group_is_inert() {
    let directory = Directory::sample();
    let mine = directory.status(1).expect("own status").clone();
    assert!(mine.is_empty());

    let mut viewer = StoryViewer::new(TICK, FINISH);
    assert!(!viewer.open(mine));
    assert!(!viewer.is_open());
    assert!(!viewer.is_ticking());

    tokio::time::sleep(TICK * 3).await;
    assert!(viewer.try_signal().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_switching_groups_drops_old_schedule() {
    let directory = Directory::sample();
    let mut viewer = StoryViewer::new(TICK, FINISH);

    assert!(viewer.open(directory.status(2).expect("anna").clone()));
    tokio::time::sleep(TICK + Duration::from_millis(1)).await;

    // A tick from the first group is already queued when the user switches
    viewer.close();
    assert!(viewer.open(directory.status(3).expect("maxim").clone()));

    let mut closed = false;
    while !closed {
        let (_, event) = pump(&mut viewer).await;
        if event == ViewerEvent::Closed {
            closed = true;
        }
        if event == ViewerEvent::Advanced {
            panic!("single-item group should complete on its first tick");
        }
    }
    assert!(!viewer.is_open());
}
