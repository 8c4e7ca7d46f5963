//! A scripted camera circling over the terrain.

use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use quadterrain::{Projection, TerrainConfig, View};
use serde::{Deserialize, Serialize};

/// Parameters of the fly-over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightPath {
    /// Height above the terrain origin.
    pub altitude: f64,
    /// Circle radius as a fraction of the terrain's smaller side.
    pub radius: f64,
    /// Full circles flown over the whole run.
    pub laps: f64,
    /// How far ahead along the circle the camera looks, in radians.
    pub look_ahead: f64,
    /// Width over height of the viewport.
    pub aspect: f64,
}

impl Default for FlightPath {
    fn default() -> Self {
        Self {
            altitude: 1500.0,
            radius: 0.35,
            laps: 1.0,
            look_ahead: 0.6,
            aspect: 16.0 / 9.0,
        }
    }
}

impl FlightPath {
    /// The camera for `frame` out of `frames`.
    pub fn view(
        &self,
        config: &TerrainConfig,
        frame: u32,
        frames: u32,
        fov_degrees: f64,
        viewport_height: f64,
    ) -> View {
        let progress = f64::from(frame) / f64::from(frames.max(1));
        let angle = progress * self.laps * TAU;

        let center = config.extent.center() + config.origin.truncate();
        let radius = config.extent.size().min_element() * self.radius;
        let on_circle = |angle: f64| center + DVec2::from_angle(angle) * radius;

        let position = on_circle(angle).extend(config.origin.z + self.altitude);
        let target = on_circle(angle + self.look_ahead).extend(config.origin.z);
        let far = config.extent.size().length() * 2.0 + self.altitude;

        View::look_at(
            position,
            target,
            DVec3::Z,
            Projection::Perspective {
                fov_y: fov_degrees.to_radians(),
                aspect: self.aspect,
                near: 1.0,
                far,
            },
            viewport_height,
        )
    }
}
