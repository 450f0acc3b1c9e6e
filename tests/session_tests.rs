/// End-to-end drives through a road session built from the RON fixtures.

use endless_road::core::director::DirectorEvent;
use endless_road::core::host::{HeadlessHost, SanityMeter, SanityProvider};
use endless_road::core::session::{RoadNotification, RoadSession};
use endless_road::core::streamer::StreamEvent;
use endless_road::schema::geometry::{Pose, Vec3};
use endless_road::schema::segment::Segment;

fn fixture_session(seed: u64) -> RoadSession {
    RoadSession::builder()
        .config_file("tests/fixtures/config.ron")
        .segments_file("tests/fixtures/segments.ron")
        .events_file("tests/fixtures/events.ron")
        .seed(seed)
        .build()
        .unwrap()
}

fn midpoint(segment: &Segment) -> Vec3 {
    segment
        .entry()
        .compose(&Pose::at(Vec3::new(0.0, 0.0, segment.length() * 0.5)))
        .position
}

/// Drives `segments` segments forward, one segment per second, ticking four
/// times a second.
fn drive(
    road: &mut RoadSession,
    segments: usize,
    sanity: &mut SanityMeter,
    host: &mut HeadlessHost,
) -> Vec<RoadNotification> {
    let mut out = road.start(Pose::IDENTITY);
    let mut observer = road.start_pose().position;
    let mut now = 0.0;
    for _ in 0..segments {
        for _ in 0..4 {
            out.extend(road.tick(now, observer, sanity, host));
            now += 0.25;
        }
        if let Some(next) = road
            .streamer()
            .current_id()
            .and_then(|id| road.streamer().next_after(id))
        {
            observer = midpoint(next);
        }
    }
    out
}

#[test]
fn builder_reads_fixture_files() {
    let road = fixture_session(1);
    let config = road.streamer().config();
    assert_eq!(config.segments_ahead, 4);
    assert_eq!(config.prewarm_per_type, 2);
    assert_eq!(config.seed, 1);
    assert_eq!(road.director().config().max_events_per_category, 2);
    assert_eq!(road.streamer().catalog().len(), 10);
    assert_eq!(road.director().catalog().len(), 13);
}

#[test]
fn long_drive_keeps_window_and_fires_events() {
    let mut road = fixture_session(2024);
    let mut host = HeadlessHost::new();
    let mut sanity = SanityMeter::new(100.0);

    let out = drive(&mut road, 200, &mut sanity, &mut host);

    assert!(road.streamer().ahead_count() >= 4);
    assert!(road.streamer().behind_count() <= 2);
    assert!(road.streamer().len() <= 4 + 2 + 1);
    assert!(road.director().stats().triggered > 0);
    assert!(sanity.sanity_percent() < 1.0);
    for category in endless_road::schema::event::EventCategory::ALL {
        assert!(road.director().active_count(category) <= 2);
    }

    let entered = out
        .iter()
        .filter(|n| matches!(n, RoadNotification::Stream(StreamEvent::Entered(_))))
        .count();
    assert!(entered >= 200);
}

#[test]
fn triggers_follow_the_entered_segment() {
    let mut road = fixture_session(7);
    let mut host = HeadlessHost::new();
    let mut sanity = SanityMeter::new(100.0);

    let out = drive(&mut road, 120, &mut sanity, &mut host);
    let mut last_entered = None;
    for notification in &out {
        match notification {
            RoadNotification::Stream(StreamEvent::Entered(id)) => last_entered = Some(*id),
            RoadNotification::Director(DirectorEvent::Triggered { segment, .. }) => {
                assert_eq!(Some(*segment), last_entered);
            }
            _ => {}
        }
    }
}

#[test]
fn equal_seeds_replay_identically() {
    let run = |seed| {
        let mut road = fixture_session(seed);
        let mut host = HeadlessHost::new();
        let mut sanity = SanityMeter::new(100.0);
        drive(&mut road, 60, &mut sanity, &mut host)
    };
    assert_eq!(run(31), run(31));
}

#[test]
fn shutdown_releases_everything() {
    let mut road = fixture_session(3);
    let mut host = HeadlessHost::new();
    let mut sanity = SanityMeter::at_percent(0.2);

    drive(&mut road, 80, &mut sanity, &mut host);
    road.shutdown(&mut host);

    assert!(road.streamer().is_empty());
    assert_eq!(road.director().total_active(), 0);
    assert_eq!(host.live_count(), 0);
    assert_eq!(road.streamer().stats().pooled, 0);
}
