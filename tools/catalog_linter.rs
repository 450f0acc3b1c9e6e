/// Catalog Linter: validates segment templates and event definitions.
///
/// Usage: catalog_linter [--segments <file_or_dir>] [--events <file_or_dir>]

use endless_road::core::catalog::{CatalogError, EventCatalog, SegmentCatalog};
use endless_road::core::director::max_difficulty_for;
use endless_road::schema::event::{EndPolicy, EventCategory, EventDifficulty};
use endless_road::schema::segment::{SegmentType, SpawnPointKind};
use std::collections::HashSet;
use std::path::Path;
use std::process;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("endless_road=warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: catalog_linter [--segments <file_or_dir>] [--events <file_or_dir>]");
        process::exit(0);
    }

    let mut segments_path = None;
    let mut events_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--segments" if i + 1 < args.len() => {
                i += 1;
                segments_path = Some(args[i].clone());
            }
            "--events" if i + 1 < args.len() => {
                i += 1;
                events_path = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let segments = segments_path.map(|path| {
        let mut catalog = SegmentCatalog::new();
        load_recursive(Path::new(&path), &mut errors, &mut |p: &Path| -> Result<(), CatalogError> {
            catalog.merge(SegmentCatalog::load_from_ron(p)?);
            Ok(())
        });
        println!("Loaded {} segment templates", catalog.len());
        catalog
    });

    let events = events_path.map(|path| {
        let mut catalog: Option<EventCatalog> = None;
        load_recursive(Path::new(&path), &mut errors, &mut |p: &Path| -> Result<(), CatalogError> {
            let loaded = EventCatalog::load_from_ron(p)?;
            if let Some(c) = catalog.as_mut() {
                c.merge(loaded);
            } else {
                catalog = Some(loaded);
            }
            Ok(())
        });
        let mut catalog = catalog.unwrap_or_default();
        catalog.build();
        println!("Loaded {} event definitions", catalog.len());
        catalog
    });

    if let Some(ref catalog) = segments {
        lint_segments(catalog, &mut errors, &mut warnings);
    }
    if let Some(ref catalog) = events {
        lint_events(catalog, &mut errors, &mut warnings);
    }
    if let (Some(segments), Some(events)) = (&segments, &events) {
        lint_spawn_points(segments, events, &mut warnings);
    }

    println!("\n=== Catalog Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_recursive(
    path: &Path,
    errors: &mut Vec<String>,
    loader: &mut dyn FnMut(&Path) -> Result<(), CatalogError>,
) {
    if path.is_file() {
        if let Err(e) = loader(path) {
            errors.push(format!("{}: {}", path.display(), e));
        }
    } else if path.is_dir() {
        if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.flatten() {
                let child = entry.path();
                if child.is_dir() || child.extension().and_then(|s| s.to_str()) == Some("ron") {
                    load_recursive(&child, errors, loader);
                }
            }
        }
    } else {
        errors.push(format!("path '{}' does not exist", path.display()));
    }
}

fn lint_segments(catalog: &SegmentCatalog, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    if !catalog.contains(SegmentType::Straight) {
        errors.push("no Straight template: missing types cannot fall back".to_string());
    }

    for ty in SegmentType::ALL {
        if !catalog.contains(ty) && ty != SegmentType::Straight {
            warnings.push(format!(
                "no {} template; spawns of that type fall back to straight",
                ty.name()
            ));
        }
    }

    for template in catalog.templates() {
        let name = template.segment_type.name();
        if !(template.length > 0.0) {
            errors.push(format!("{} template has non-positive length", name));
            continue;
        }

        let run = template.entry.inverse_transform_point(template.exit.position).z;
        if (run - template.length).abs() > template.length * 0.25 {
            warnings.push(format!(
                "{} template: exit is {:.1} along the entry axis but length is {:.1}",
                name, run, template.length
            ));
        }

        for point in &template.spawn_points {
            let d = template.entry.inverse_transform_point(point.local.position).z;
            if !(0.0..=template.length).contains(&d) {
                warnings.push(format!(
                    "{} template: {:?} spawn point lies outside the segment ({:.1})",
                    name, point.kind, d
                ));
            }
        }

        if !template.allow_events && template.trigger_chance.is_some() {
            warnings.push(format!(
                "{} template: trigger chance set but events are disallowed",
                name
            ));
        }
    }
}

fn lint_events(catalog: &EventCatalog, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let mut names = HashSet::new();
    for def in catalog.definitions() {
        if !names.insert(def.name.as_str()) {
            errors.push(format!("duplicate event name '{}'", def.name));
        }
    }

    for category in EventCategory::ALL {
        let ids = catalog.by_category(category);
        if ids.is_empty() {
            warnings.push(format!("no {} events", category.name()));
            continue;
        }
        let calm = max_difficulty_for(1.0);
        let reachable = ids
            .iter()
            .filter_map(|id| catalog.get(*id))
            .any(|d| d.difficulty <= calm);
        if !reachable {
            warnings.push(format!(
                "no {} event at or below {:?}; full-sanity picks ignore difficulty",
                category.name(),
                calm
            ));
        }
    }

    for def in catalog.definitions() {
        if def.payload.is_none() {
            if def.duration > 0.0 {
                warnings.push(format!(
                    "'{}' has a duration but no payload; it ends immediately",
                    def.name
                ));
            }
            if def.self_managed {
                warnings.push(format!("'{}' is self-managed but has no payload", def.name));
            }
            if def.use_spawn_point {
                warnings.push(format!(
                    "'{}' uses a spawn point but spawns nothing",
                    def.name
                ));
            }
        }
        if def.end_policy() == EndPolicy::WhenPayloadGone && !def.self_managed {
            warnings.push(format!(
                "'{}' has no duration; it lasts until its payload destroys itself",
                def.name
            ));
        }
        if def.sanity_impact < 0.0 {
            warnings.push(format!("'{}' restores sanity ({})", def.name, def.sanity_impact));
        }
        if def.difficulty == EventDifficulty::Harmless && def.sanity_impact > 0.0 {
            warnings.push(format!("'{}' is harmless but drains sanity", def.name));
        }
    }
}

fn lint_spawn_points(segments: &SegmentCatalog, events: &EventCatalog, warnings: &mut Vec<String>) {
    let wants_points = events.definitions().iter().any(|d| d.use_spawn_point);
    if !wants_points {
        return;
    }
    for template in segments.templates() {
        let has_point = template
            .spawn_points
            .iter()
            .any(|p| p.kind == SpawnPointKind::Event);
        if template.allow_events && !has_point {
            warnings.push(format!(
                "{} template has no event spawn points; spawn-point events use its origin",
                template.segment_type.name()
            ));
        }
    }
}
