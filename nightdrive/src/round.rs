use bevy::prelude::*;
use thiserror::Error;

use crate::camera::ChaseView;
use crate::centerline::CurveVariant;
use crate::collision;
use crate::lights::{self, PointLightSample, WINDOW_SIZE};
use crate::track::{self, TrackMesh, TrackSpec};
use crate::track_format::GameConfig;
use crate::vehicle::{self, Action, InputFlags, VehicleState};

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundState {
    #[default]
    Menu,
    Playing,
    GameOver,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("cannot {action} while in {from:?}")]
    InvalidTransition {
        from: RoundState,
        action: &'static str,
    },
}

/// The map a round is being driven on.
pub struct ActiveTrack {
    pub spec: TrackSpec,
    pub mesh: TrackMesh,
}

/// Everything the simulation owns between ticks.
#[derive(Resource)]
pub struct SimulationContext {
    config: GameConfig,
    round: RoundState,
    vehicle: VehicleState,
    input: InputFlags,
    track: Option<ActiveTrack>,
}

impl SimulationContext {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            round: RoundState::Menu,
            vehicle: VehicleState::default(),
            input: InputFlags::default(),
            track: None,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn round(&self) -> RoundState {
        self.round
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    pub fn input(&self) -> &InputFlags {
        &self.input
    }

    pub fn track(&self) -> Option<&ActiveTrack> {
        self.track.as_ref()
    }

    pub fn set_action(&mut self, action: Action, pressed: bool) {
        self.input.set(action, pressed);
    }

    /// Menu -> Playing. The track mesh is rebuilt from scratch every time.
    pub fn select_variant(&mut self, variant: CurveVariant) -> Result<(), RoundError> {
        if self.round != RoundState::Menu {
            return Err(RoundError::InvalidTransition {
                from: self.round,
                action: "select a map",
            });
        }

        let spec = self.config.track_spec(variant);
        let mesh = track::build_track_mesh(&spec);
        info!(
            "starting round on {} ({} map): {} road + {} sidewalk vertices",
            self.config.map(variant).name,
            variant.label(),
            mesh.road.count,
            mesh.sidewalk.count,
        );

        self.vehicle = VehicleState::spawn(variant);
        self.input.clear();
        self.track = Some(ActiveTrack { spec, mesh });
        self.round = RoundState::Playing;
        Ok(())
    }

    /// One fixed tick: integrate, then test the road boundary. Frozen outside Playing.
    pub fn tick(&mut self) -> RoundState {
        if self.round != RoundState::Playing {
            return self.round;
        }
        let Some(active) = &self.track else {
            return self.round;
        };

        let params = &self.config.simulation;
        self.vehicle = vehicle::integrate(self.vehicle, &self.input, params);
        self.round = collision::detect(&active.spec, &self.vehicle, params.collision_radius);

        if self.round == RoundState::GameOver {
            info!(
                "left the road at z={:.1} (offset {:.2}, limit {:.2})",
                self.vehicle.z,
                collision::lateral_offset(&active.spec, &self.vehicle),
                collision::drivable_limit(&active.spec, params.collision_radius),
            );
        }
        self.round
    }

    /// GameOver -> Menu. The finished track is dropped.
    pub fn restart(&mut self) -> Result<(), RoundError> {
        if self.round != RoundState::GameOver {
            return Err(RoundError::InvalidTransition {
                from: self.round,
                action: "restart",
            });
        }
        info!("back to map selection");
        self.track = None;
        self.round = RoundState::Menu;
        Ok(())
    }

    /// Point lights around the car, if a track is loaded.
    pub fn light_window(&self) -> Option<[PointLightSample; WINDOW_SIZE]> {
        self.track
            .as_ref()
            .map(|active| lights::light_window(&active.spec, &self.config.lights, self.vehicle.z))
    }

    pub fn chase_view(&self) -> ChaseView {
        self.config.camera.chase(&self.vehicle)
    }

    /// How far down the track the car has got, never negative.
    pub fn distance_travelled(&self) -> f32 {
        if self.vehicle.z < 0.0 {
            -self.vehicle.z
        } else {
            0.0
        }
    }
}
