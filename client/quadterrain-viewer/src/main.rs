//! Headless driver for the quadterrain LOD engine.
//!
//! Flies a camera over a procedural height field, feeds elevation to the
//! tiles the terrain displays, and logs what every frame did.

mod elevation_source;
mod flight;
mod launch_params;
mod settings;

use elevation_source::ElevationSource;
use quadterrain::Terrain;
use settings::Settings;

fn main() -> anyhow::Result<()> {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let params = launch_params::parse();
    let mut settings = Settings::load(params.config.as_deref())?;
    settings.apply(&params);

    let mut terrain = Terrain::new(settings.terrain.clone())?;
    let mut source = settings
        .terrain
        .elevation_enabled
        .then(|| ElevationSource::new(settings.elevation.clone()));

    for frame in 0..params.frames {
        let view = settings.flight.view(
            terrain.config(),
            frame,
            params.frames,
            params.fov,
            params.viewport_height,
        );

        // Data requested last frame arrives before this frame's pass.
        let delivery = match source.as_mut() {
            Some(source) => source.deliver(&mut terrain)?,
            None => elevation_source::Delivery::default(),
        };
        let report = terrain.update(&view);
        if let Some(source) = source.as_mut() {
            source.request(&terrain, &report);
        }

        let ground = terrain.sample(view.position.truncate());
        tracing::info!(
            frame = report.frame,
            tiles = terrain.tiles().len(),
            displayed = report.displayed.len(),
            subdivided = report.subdivided,
            merged = report.merged,
            restitched = report.restitched,
            pending = report.pending,
            previews = delivery.previews,
            finals = delivery.finals,
            dropped = delivery.dropped,
            ground = ground.map(|sample| sample.elevation),
            "frame"
        );
    }

    let deepest = terrain.leaves().iter().map(|leaf| leaf.level).max();
    tracing::info!(
        frames = terrain.frame(),
        tiles = terrain.tiles().len(),
        deepest,
        in_flight = source.as_ref().map(ElevationSource::in_flight),
        "done"
    );
    Ok(())
}
