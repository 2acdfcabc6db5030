use std::{path::Path, time::Duration};

use bevy::{
    asset::LoadState,
    diagnostic::FrameTimeDiagnosticsPlugin,
    image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor},
    prelude::*,
};

use nightdrive::centerline::CurveVariant;
use nightdrive::lights::{self, WINDOW_SIZE};
use nightdrive::round::{RoundState, SimulationContext};
use nightdrive::track::TrackPartition;
use nightdrive::track_format::GameConfig;
use nightdrive::vehicle::{Action, heading_rotation};

mod ui;

/// Attenuation factor at which a street light stops contributing.
const LIGHT_CUTOFF: f32 = 1.0 / 256.0;
const CAR_SIZE: f32 = 0.5;
const ROAD_FALLBACK: Color = Color::srgb(0.22, 0.22, 0.25);
const SIDEWALK_FALLBACK: Color = Color::srgb(0.45, 0.36, 0.26);

const DRIVING_BINDINGS: [(Action, [KeyCode; 2]); 4] = [
    (Action::Forward, [KeyCode::ArrowUp, KeyCode::KeyW]),
    (Action::Backward, [KeyCode::ArrowDown, KeyCode::KeyS]),
    (Action::TurnLeft, [KeyCode::ArrowLeft, KeyCode::KeyA]),
    (Action::TurnRight, [KeyCode::ArrowRight, KeyCode::KeyD]),
];

fn main() {
    let (loaded, origin) = match std::env::args().nth(1) {
        Some(path) => (GameConfig::load(Path::new(&path)), path),
        None => (GameConfig::load_builtin(), "built-in config".to_string()),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!("nightdrive: {err}");
            std::process::exit(1);
        }
    };
    let tick = Duration::from_millis(config.simulation.tick_ms);

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Night Drive".to_string(),
                    ..default()
                }),
                ..default()
            }),
            FrameTimeDiagnosticsPlugin::default(),
            ui::OverlayPlugin,
        ))
        .init_state::<RoundState>()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.1)))
        .insert_resource(Time::<Fixed>::from_duration(tick))
        .insert_resource(SimulationContext::new(config))
        .insert_resource(ConfigOrigin(origin))
        .add_systems(
            Startup,
            (log_config_origin, setup_camera, setup_light_slots, load_track_materials),
        )
        .add_systems(OnEnter(RoundState::Playing), spawn_round_scene)
        .add_systems(OnEnter(RoundState::Menu), despawn_round_scene)
        .add_systems(
            Update,
            (handle_round_keys, read_driving_input, sync_round_state).chain(),
        )
        // Integrator + collision: only while Playing
        .add_systems(
            FixedUpdate,
            tick_simulation.run_if(in_state(RoundState::Playing)),
        )
        .add_systems(
            Update,
            (
                update_car_transform,
                update_light_slots,
                update_chase_camera,
                apply_texture_fallback,
            ),
        )
        .run();
}

// ── Components & resources ──────────────────────────────────────────────────

/// Marker: despawned when the round ends and the menu comes back.
#[derive(Component)]
struct RoundScene;

#[derive(Component)]
struct Car;

#[derive(Resource)]
struct ConfigOrigin(String);

#[derive(Component)]
struct ChaseCamera;

/// One of the fixed point-light entities the light window is written into.
#[derive(Component)]
struct LightSlot(usize);

struct TexturedSurface {
    label: &'static str,
    image: Handle<Image>,
    material: Handle<StandardMaterial>,
    /// Flat colour used once the texture is known to be missing.
    fallback: Color,
    degraded: bool,
}

#[derive(Resource)]
struct TrackMaterials {
    road: TexturedSurface,
    sidewalk: TexturedSurface,
}

// ── Startup ─────────────────────────────────────────────────────────────────

fn log_config_origin(origin: Res<ConfigOrigin>, ctx: Res<SimulationContext>) {
    let sim = &ctx.config().simulation;
    info!(
        "loaded {} (tick {} ms, speed {}, turn rate {})",
        origin.0, sim.tick_ms, sim.speed, sim.rot_speed
    );
}

fn setup_camera(mut commands: Commands, ctx: Res<SimulationContext>) {
    let rig = ctx.config().camera;
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(rig.perspective()),
        ctx.chase_view().transform(),
        ChaseCamera,
    ));
}

fn setup_light_slots(mut commands: Commands) {
    for slot in 0..WINDOW_SIZE {
        commands.spawn((
            PointLight {
                shadows_enabled: false,
                ..default()
            },
            Transform::default(),
            Visibility::Hidden,
            LightSlot(slot),
        ));
    }
}

fn repeating_sampler(settings: &mut ImageLoaderSettings) {
    settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        ..ImageSamplerDescriptor::linear()
    });
}

fn textured_surface(
    asset_server: &AssetServer,
    materials: &mut Assets<StandardMaterial>,
    label: &'static str,
    path: &str,
    roughness: f32,
    fallback: Color,
) -> TexturedSurface {
    let image: Handle<Image> = asset_server.load_with_settings(path.to_string(), repeating_sampler);
    let material = materials.add(StandardMaterial {
        base_color_texture: Some(image.clone()),
        perceptual_roughness: roughness,
        ..default()
    });
    TexturedSurface {
        label,
        image,
        material,
        fallback,
        degraded: false,
    }
}

fn load_track_materials(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    ctx: Res<SimulationContext>,
) {
    let textures = &ctx.config().textures;
    let road = textured_surface(
        &asset_server,
        &mut materials,
        "road",
        &textures.road,
        0.8,
        ROAD_FALLBACK,
    );
    let sidewalk = textured_surface(
        &asset_server,
        &mut materials,
        "sidewalk",
        &textures.sidewalk,
        0.95,
        SIDEWALK_FALLBACK,
    );
    commands.insert_resource(TrackMaterials { road, sidewalk });
}

// ── Round lifecycle ─────────────────────────────────────────────────────────

fn handle_round_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut ctx: ResMut<SimulationContext>,
    mut exit: MessageWriter<AppExit>,
) {
    if keyboard.any_just_pressed([KeyCode::Escape, KeyCode::KeyQ]) {
        exit.write(AppExit::Success);
        return;
    }

    let result = if keyboard.just_pressed(KeyCode::Digit1) {
        ctx.select_variant(CurveVariant::Gentle)
    } else if keyboard.just_pressed(KeyCode::Digit2) {
        ctx.select_variant(CurveVariant::Complex)
    } else if keyboard.just_pressed(KeyCode::KeyR) {
        ctx.restart()
    } else {
        Ok(())
    };
    if let Err(err) = result {
        debug!("ignored key: {err}");
    }
}

fn read_driving_input(keyboard: Res<ButtonInput<KeyCode>>, mut ctx: ResMut<SimulationContext>) {
    for (action, keys) in DRIVING_BINDINGS {
        let pressed = keyboard.any_pressed(keys);
        if ctx.input().held(action) != pressed {
            ctx.set_action(action, pressed);
        }
    }
}

/// Mirror the context's round into Bevy's state so OnEnter schedules fire.
fn sync_round_state(
    ctx: Res<SimulationContext>,
    state: Res<State<RoundState>>,
    mut next_state: ResMut<NextState<RoundState>>,
) {
    if ctx.round() != *state.get() {
        next_state.set(ctx.round());
    }
}

fn tick_simulation(mut ctx: ResMut<SimulationContext>) {
    ctx.tick();
}

fn spawn_round_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    track_materials: Res<TrackMaterials>,
    ctx: Res<SimulationContext>,
) {
    let Some(active) = ctx.track() else {
        warn!("entered Playing without a track");
        return;
    };

    // Track surface and sidewalks+curbs, one draw range each
    for (partition, surface) in [
        (TrackPartition::Road, &track_materials.road),
        (TrackPartition::Sidewalk, &track_materials.sidewalk),
    ] {
        commands.spawn((
            Mesh3d(meshes.add(active.mesh.partition_mesh(partition))),
            MeshMaterial3d(surface.material.clone()),
            Transform::default(),
            RoundScene,
        ));
    }

    // Streetlight props
    let lamp = ctx.config().lights;
    let pole_mesh = meshes.add(Cuboid::new(0.2, lamp.bulb_height + 0.3, 0.2));
    let arm_length = lamp.arm_offset + 0.1;
    let arm_mesh = meshes.add(Cuboid::new(arm_length, 0.15, 0.15));
    let bulb_mesh = meshes.add(Cuboid::new(0.3, 0.3, 0.3));
    let pole_material = materials.add(Color::srgb(0.5, 0.5, 0.5));
    let [r, g, b] = lamp.color;
    let bulb_material = materials.add(StandardMaterial {
        base_color: Color::srgb(r, g, b),
        emissive: LinearRgba::rgb(r * 4.0, g * 4.0, b * 4.0),
        unlit: true,
        ..default()
    });

    let placements = lights::streetlight_placements(&active.spec, &lamp);
    for placement in &placements {
        // Only the post follows the road; arm and bulb stay on the light's x offset
        let bulb = placement.bulb(&lamp) - placement.base;
        commands
            .spawn((
                Transform::from_translation(placement.base),
                Visibility::default(),
                RoundScene,
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(pole_mesh.clone()),
                    MeshMaterial3d(pole_material.clone()),
                    Transform::from_xyz(0.0, (lamp.bulb_height + 0.3) * 0.5, 0.0)
                        .with_rotation(heading_rotation(placement.heading)),
                ));
                parent.spawn((
                    Mesh3d(arm_mesh.clone()),
                    MeshMaterial3d(pole_material.clone()),
                    Transform::from_xyz(placement.reach * arm_length * 0.5, bulb.y + 0.2, 0.0),
                ));
                parent.spawn((
                    Mesh3d(bulb_mesh.clone()),
                    MeshMaterial3d(bulb_material.clone()),
                    Transform::from_translation(bulb),
                ));
            });
    }

    // Car
    let vehicle = ctx.vehicle();
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(CAR_SIZE, CAR_SIZE, CAR_SIZE))),
        MeshMaterial3d(materials.add(Color::srgb(1.0, 0.2, 0.2))),
        Transform::from_translation(vehicle.translation(car_y(&ctx)))
            .with_rotation(vehicle.rotation()),
        Car,
        RoundScene,
    ));

    info!("spawned round scene with {} streetlights", placements.len());
}

fn despawn_round_scene(mut commands: Commands, scene_query: Query<Entity, With<RoundScene>>) {
    for entity in &scene_query {
        commands.entity(entity).despawn();
    }
}

// ── Per-frame ───────────────────────────────────────────────────────────────

fn car_y(ctx: &SimulationContext) -> f32 {
    let surface = ctx.track().map_or(0.0, |active| active.spec.surface_y);
    surface + CAR_SIZE * 0.5
}

fn update_car_transform(
    ctx: Res<SimulationContext>,
    mut car_query: Query<&mut Transform, With<Car>>,
) {
    let Ok(mut transform) = car_query.single_mut() else {
        return;
    };
    let vehicle = ctx.vehicle();
    transform.translation = vehicle.translation(car_y(&ctx));
    transform.rotation = vehicle.rotation();
}

fn update_light_slots(
    ctx: Res<SimulationContext>,
    mut slot_query: Query<(&LightSlot, &mut PointLight, &mut Transform, &mut Visibility)>,
) {
    let window = ctx.light_window();
    let intensity = ctx.config().lights.intensity;

    for (slot, mut light, mut transform, mut visibility) in &mut slot_query {
        let Some(sample) = window.map(|lights| lights[slot.0]) else {
            *visibility = Visibility::Hidden;
            continue;
        };
        transform.translation = sample.position;
        light.color = Color::srgb(sample.color.x, sample.color.y, sample.color.z);
        light.intensity = intensity;
        light.range = sample.attenuation.effective_range(LIGHT_CUTOFF);
        *visibility = Visibility::Visible;
    }
}

fn update_chase_camera(
    ctx: Res<SimulationContext>,
    mut camera_query: Query<&mut Transform, With<ChaseCamera>>,
) {
    let Ok(mut transform) = camera_query.single_mut() else {
        return;
    };
    *transform = ctx.chase_view().transform();
}

/// A texture that fails to load leaves its surface drawn in a flat colour.
fn apply_texture_fallback(
    asset_server: Res<AssetServer>,
    mut track_materials: ResMut<TrackMaterials>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let TrackMaterials { road, sidewalk } = &mut *track_materials;
    for surface in [road, sidewalk] {
        if surface.degraded {
            continue;
        }
        if let LoadState::Failed(err) = asset_server.load_state(&surface.image) {
            warn!("{} texture unavailable, drawing untextured: {err}", surface.label);
            if let Some(mut material) = materials.get_mut(&surface.material) {
                material.base_color_texture = None;
                material.base_color = surface.fallback;
            }
            surface.degraded = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_textures_fall_back_to_flat_colours() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<StandardMaterial>()
            .add_systems(Update, apply_texture_fallback);

        let track_materials = {
            let world = app.world_mut();
            let asset_server = world.resource::<AssetServer>().clone();
            let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
            let road = textured_surface(
                &asset_server,
                &mut materials,
                "road",
                "textures/no_such_road.png",
                0.8,
                ROAD_FALLBACK,
            );
            let sidewalk = textured_surface(
                &asset_server,
                &mut materials,
                "sidewalk",
                "textures/no_such_dirt.png",
                0.95,
                SIDEWALK_FALLBACK,
            );
            TrackMaterials { road, sidewalk }
        };
        app.insert_resource(track_materials);

        // Loading happens on the task pool
        for _ in 0..400 {
            app.update();
            let track = app.world().resource::<TrackMaterials>();
            if track.road.degraded && track.sidewalk.degraded {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let track = app.world().resource::<TrackMaterials>();
        assert!(track.road.degraded, "road texture never reported as failed");
        assert!(track.sidewalk.degraded, "sidewalk texture never reported as failed");

        let materials = app.world().resource::<Assets<StandardMaterial>>();
        let road = materials.get(&track.road.material).expect("road material");
        let sidewalk = materials.get(&track.sidewalk.material).expect("sidewalk material");
        assert!(road.base_color_texture.is_none());
        assert!(sidewalk.base_color_texture.is_none());
        assert_eq!(road.base_color, ROAD_FALLBACK);
        assert_eq!(sidewalk.base_color, SIDEWALK_FALLBACK);
        assert_ne!(road.base_color, sidewalk.base_color);
    }
}
