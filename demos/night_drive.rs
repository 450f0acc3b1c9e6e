/// Night Drive example: a scripted drive built entirely in code.
///
/// The road is a handful of straights, gentle curves, a tunnel and a rest
/// stop. The driver's sanity drops steadily, so the events that fire drift
/// from radio static toward things in the trees.
///
/// Run with: cargo run --example night_drive

use endless_road::core::catalog::{EventCatalog, SegmentCatalog};
use endless_road::core::config::{DirectorConfig, StreamerConfig};
use endless_road::core::director::DirectorEvent;
use endless_road::core::host::{HeadlessHost, SanityMeter, SanityProvider};
use endless_road::core::session::{RoadNotification, RoadSession};
use endless_road::core::streamer::StreamEvent;
use endless_road::schema::event::{EventCategory, EventDefinition, EventDifficulty};
use endless_road::schema::geometry::{Pose, Vec3};
use endless_road::schema::segment::{SegmentTemplate, SegmentType, SpawnPoint, SpawnPointKind};

fn curve(segment_type: SegmentType, bend: f32) -> SegmentTemplate {
    SegmentTemplate {
        segment_type,
        exit: Pose::new(Vec3::new(bend * 10.0, 0.0, 19.8), bend),
        ..SegmentTemplate::straight(20.0)
    }
}

fn segments() -> SegmentCatalog {
    let mut straight = SegmentTemplate::straight(25.0);
    straight.spawn_points.push(SpawnPoint {
        kind: SpawnPointKind::Event,
        local: Pose::new(Vec3::new(-6.0, 0.0, 14.0), 1.57),
    });

    SegmentCatalog::new()
        .with(straight)
        .with(curve(SegmentType::SlightLeft, -0.26))
        .with(curve(SegmentType::SlightRight, 0.26))
        .with(SegmentTemplate {
            segment_type: SegmentType::Tunnel,
            trigger_chance: Some(0.8),
            ..SegmentTemplate::straight(60.0)
        })
        .with(SegmentTemplate {
            segment_type: SegmentType::RestStop,
            allow_events: false,
            ..SegmentTemplate::straight(40.0)
        })
}

fn events() -> EventCatalog {
    EventCatalog::new(0.35, 0.45)
        .with(
            EventDefinition::new("Radio static", EventCategory::Atmospheric, EventDifficulty::Harmless)
                .with_sound("radio_static"),
        )
        .with(
            EventDefinition::new("Fog rolls in", EventCategory::Atmospheric, EventDifficulty::Unsettling)
                .with_payload("fog_bank")
                .with_duration(10.0)
                .with_sanity_impact(3.0),
        )
        .with(
            EventDefinition::new("Lights die", EventCategory::Atmospheric, EventDifficulty::Terrifying)
                .with_payload("lights_out")
                .with_duration(6.0)
                .with_sanity_impact(8.0),
        )
        .with(
            EventDefinition::new("Deer", EventCategory::Creature, EventDifficulty::Harmless)
                .with_payload("deer")
                .with_duration(4.0)
                .at_spawn_point(),
        )
        .with(
            EventDefinition::new("It follows", EventCategory::Creature, EventDifficulty::Nightmare)
                .with_payload("follower")
                .with_duration(12.0)
                .with_sanity_impact(15.0)
                .at_spawn_point()
                .with_sound("footsteps"),
        )
        .with(
            EventDefinition::new("Stalled car", EventCategory::Obstacle, EventDifficulty::Unsettling)
                .with_payload("stalled_car")
                .with_duration(20.0),
        )
        .with(
            EventDefinition::new("Figure in the trees", EventCategory::Apparition, EventDifficulty::Dangerous)
                .with_payload("tree_figure")
                .with_duration(3.0)
                .with_sanity_impact(6.0)
                .at_spawn_point(),
        )
}

fn main() {
    let mut road = RoadSession::builder()
        .seed(1987)
        .streamer_config(StreamerConfig {
            segments_ahead: 4,
            segments_behind: 1,
            check_interval: 0.25,
            ..StreamerConfig::default()
        })
        .director_config(DirectorConfig {
            min_segments_between_events: 2,
            max_events_per_category: 1,
            seed: 0,
        })
        .with_segments(segments())
        .with_events(events())
        .build()
        .expect("Failed to build road session");

    let mut host = HeadlessHost::new();
    let mut sanity = SanityMeter::new(100.0);

    road.start(Pose::IDENTITY);
    let mut observer = road.start_pose().position;

    println!("=== Night Drive ===\n");

    let mut now = 0.0;
    for _ in 0..40 {
        for _ in 0..8 {
            for notification in road.tick(now, observer, &mut sanity, &mut host) {
                match notification {
                    RoadNotification::Stream(StreamEvent::Entered(id)) => {
                        let ty = road
                            .streamer()
                            .segment(id)
                            .map_or("?", |s| s.segment_type().name());
                        println!(
                            "[{:5.1}s] segment {:>3} {:<13} sanity {:>3.0}%",
                            now,
                            id.0,
                            ty,
                            sanity.sanity_percent() * 100.0
                        );
                    }
                    RoadNotification::Director(DirectorEvent::Triggered { definition, .. }) => {
                        if let Some(def) = road.director().catalog().get(definition) {
                            println!("          !! {} ({:?})", def.name, def.difficulty);
                        }
                    }
                    _ => {}
                }
            }
            sanity.reduce_sanity(0.4);
            now += 0.25;
        }

        let next = road
            .streamer()
            .current_id()
            .and_then(|id| road.streamer().next_after(id))
            .map(|s| s.entry().compose(&Pose::at(Vec3::new(0.0, 0.0, 2.0))).position);
        if let Some(next) = next {
            observer = next;
        }
    }

    road.shutdown(&mut host);

    let stats = road.director().stats();
    println!("\n--- {} events triggered, {} payloads spawned ---", stats.triggered, host.spawned.len());
    println!("Final sanity: {:.0}%", sanity.sanity_percent() * 100.0);
}
