/// Road Preview: drives a headless observer down the road and prints what
/// the streamer and the director do along the way.
///
/// Usage: road_preview --segments <path> --events <path> [--config <path>]
///                     [--seed <n>] [--distance <m>] [--speed <m/s>]
///                     [--decay <sanity/s>] [--expire-every <s>] [--verbose]
///
/// Logging follows RUST_LOG (default `endless_road=info`).

use endless_road::core::director::DirectorEvent;
use endless_road::core::host::{HeadlessHost, SanityMeter, SanityProvider};
use endless_road::core::session::{RoadNotification, RoadSession};
use endless_road::core::streamer::StreamEvent;
use endless_road::schema::geometry::{Pose, Vec3};
use endless_road::schema::segment::SegmentId;
use std::process;

/// Simulation step in seconds.
const FRAME: f64 = 0.1;

struct Options {
    segments: Option<String>,
    events: Option<String>,
    config: Option<String>,
    seed: Option<u64>,
    distance: f32,
    speed: f32,
    decay: f32,
    expire_every: f64,
    verbose: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("endless_road=info")),
        )
        .init();

    let options = parse_args();

    let mut builder = RoadSession::builder();
    if let Some(ref path) = options.config {
        builder = builder.config_file(path);
    }
    if let Some(ref path) = options.segments {
        builder = builder.segments_file(path);
    }
    if let Some(ref path) = options.events {
        builder = builder.events_file(path);
    }
    if let Some(seed) = options.seed {
        builder = builder.seed(seed);
    }
    let mut road = match builder.build() {
        Ok(road) => road,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let mut host = HeadlessHost::new();
    let mut sanity = SanityMeter::default();

    let seeded = road.start(Pose::IDENTITY);
    report(&road, seeded, &options);

    // The observer's own notion of where it is: a segment plus distance into it.
    let start = road.start_pose().position;
    let first = road.streamer().active_segments().next();
    let mut tracked: Option<SegmentId> = first.map(|s| s.id());
    let mut along = first.map_or(0.0, |s| s.distance_along(start));
    let mut travelled = 0.0f32;
    let mut now = 0.0f64;
    let mut next_expiry = options.expire_every;

    while travelled < options.distance {
        let step = options.speed * FRAME as f32;
        travelled += step;
        along += step;

        while let Some(segment) = tracked.and_then(|id| road.streamer().segment(id)) {
            if along <= segment.length() {
                break;
            }
            let Some(next) = road.streamer().next_after(segment.id()) else {
                break;
            };
            along -= segment.length();
            tracked = Some(next.id());
        }
        if tracked.and_then(|id| road.streamer().segment(id)).is_none() {
            tracked = road.streamer().current_id();
        }

        let observer = tracked
            .and_then(|id| road.streamer().segment(id))
            .map(|s| s.entry().compose(&Pose::at(Vec3::new(0.0, 0.0, along))).position)
            .unwrap_or(Vec3::ZERO);

        sanity.reduce_sanity(options.decay * FRAME as f32);
        let notifications = road.tick(now, observer, &mut sanity, &mut host);
        report(&road, notifications, &options);

        if options.expire_every > 0.0 && now >= next_expiry {
            host.expire_all();
            next_expiry += options.expire_every;
        }
        now += FRAME;
    }

    let ended = road.shutdown(&mut host);
    report(&road, ended, &options);

    let stream = road.streamer().stats();
    let director = road.director().stats();
    println!("\n=== Drive Summary ===\n");
    println!("Distance:           {:.0} m in {:.1} s", travelled, now);
    println!("Final sanity:       {:.0}%", sanity.sanity_percent() * 100.0);
    println!("Segments spawned:   {}", stream.spawned_total);
    println!("Segments despawned: {}", stream.despawned_total);
    println!("Instances created:  {}", stream.instances_created);
    println!("Events triggered:   {}", director.triggered);
    println!("Events ended:       {}", director.ended);
    println!("Rolls missed:       {}", director.rolls_failed);
    println!("Cooldown skips:     {}", director.skipped_cooldown);
    println!("Capped categories:  {}", director.capped);
    println!("Payloads spawned:   {}", host.spawned.len());
    println!("Sounds played:      {}", host.sounds.len());
}

fn report(road: &RoadSession, notifications: Vec<RoadNotification>, options: &Options) {
    for notification in notifications {
        match notification {
            RoadNotification::Stream(StreamEvent::Entered(id)) => {
                let ty = road
                    .streamer()
                    .segment(id)
                    .map_or("?", |s| s.segment_type().name());
                println!("-> segment {} ({})", id.0, ty);
            }
            RoadNotification::Stream(event) => {
                if options.verbose {
                    println!("   {:?}", event);
                }
            }
            RoadNotification::Director(DirectorEvent::Triggered {
                instance,
                definition,
                ..
            }) => {
                let name = road
                    .director()
                    .catalog()
                    .get(definition)
                    .map_or("?", |d| d.name.as_str());
                println!("   ! {} [#{}]", name, instance.0);
            }
            RoadNotification::Director(DirectorEvent::Ended { instance, .. }) => {
                if options.verbose {
                    println!("   ~ event #{} ended", instance.0);
                }
            }
        }
    }
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        process::exit(0);
    }

    let mut options = Options {
        segments: None,
        events: None,
        config: None,
        seed: None,
        distance: 2_000.0,
        speed: 20.0,
        decay: 0.5,
        expire_every: 20.0,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--segments" if i + 1 < args.len() => {
                i += 1;
                options.segments = Some(args[i].clone());
            }
            "--events" if i + 1 < args.len() => {
                i += 1;
                options.events = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                options.config = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                options.seed = args[i].parse().ok();
            }
            "--distance" if i + 1 < args.len() => {
                i += 1;
                options.distance = args[i].parse().unwrap_or(options.distance);
            }
            "--speed" if i + 1 < args.len() => {
                i += 1;
                options.speed = args[i].parse().unwrap_or(options.speed);
            }
            "--decay" if i + 1 < args.len() => {
                i += 1;
                options.decay = args[i].parse().unwrap_or(options.decay);
            }
            "--expire-every" if i + 1 < args.len() => {
                i += 1;
                options.expire_every = args[i].parse().unwrap_or(options.expire_every);
            }
            "--verbose" | "-v" => options.verbose = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if options.segments.is_none() {
        eprintln!("ERROR: --segments is required");
        process::exit(1);
    }
    if !(options.speed > 0.0) {
        eprintln!("ERROR: --speed must be positive");
        process::exit(1);
    }
    options
}

fn print_usage() {
    println!("Usage: road_preview --segments <path> --events <path> [options]");
    println!();
    println!("Options:");
    println!("  --config <path>       RoadConfig RON file");
    println!("  --seed <n>            override both seeds");
    println!("  --distance <m>        how far to drive (default 2000)");
    println!("  --speed <m/s>         observer speed (default 20)");
    println!("  --decay <sanity/s>    sanity lost per second (default 0.5)");
    println!("  --expire-every <s>    expire live payloads periodically (default 20, 0 = never)");
    println!("  --verbose, -v         print spawns, despawns and event ends");
}
