use bevy::{
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

use nightdrive::centerline::CurveVariant;
use nightdrive::round::{RoundState, SimulationContext};

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_overlay)
            // Round triggers must land before the state mirror runs this frame
            .add_systems(
                Update,
                (handle_map_buttons, handle_restart_button).before(crate::sync_round_state),
            )
            .add_systems(
                Update,
                (
                    update_status_text,
                    update_button_visibility,
                    update_fps_counter,
                ),
            );
    }
}

#[derive(Component)]
struct StatusText;
#[derive(Component)]
struct FpsCounterText;
#[derive(Component)]
struct MapButton(CurveVariant);
#[derive(Component)]
struct RestartButton;

const PANEL_BG: Color = Color::srgba(0.0, 0.0, 0.0, 0.55);
const BTN_BG: Color = Color::srgb(0.25, 0.25, 0.35);
const RESTART_BG: Color = Color::srgb(0.55, 0.15, 0.15);
const TEXT_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);

fn px(val: f32) -> Val {
    Val::Px(val)
}

fn text_font(size: f32) -> TextFont {
    TextFont {
        font_size: size,
        ..default()
    }
}

fn button_style() -> Node {
    Node {
        padding: UiRect::axes(px(10.0), px(4.0)),
        margin: UiRect::all(px(2.0)),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    }
}

/// Status line for the current round.
pub fn overlay_text(ctx: &SimulationContext) -> String {
    let config = ctx.config();
    match ctx.round() {
        RoundState::Menu => format!(
            "Select a map: [1] {}  [2] {}",
            config.map(CurveVariant::Gentle).name,
            config.map(CurveVariant::Complex).name,
        ),
        RoundState::Playing => {
            let name = ctx
                .track()
                .map_or("", |active| config.map(active.spec.variant).name.as_str());
            format!("{name}  distance {:.0}", ctx.distance_travelled())
        }
        RoundState::GameOver => format!(
            "GAME OVER after {:.0}  [R] restart",
            ctx.distance_travelled()
        ),
    }
}

fn setup_overlay(mut commands: Commands, ctx: Res<SimulationContext>) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            top: px(8.0),
            left: px(8.0),
            padding: UiRect::axes(px(8.0), px(4.0)),
            ..default()
        },
        BackgroundColor(PANEL_BG),
        Text::new("FPS: --"),
        text_font(18.0),
        TextColor(TEXT_COLOR),
        FpsCounterText,
    ));

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: px(8.0),
                right: px(8.0),
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::End,
                padding: UiRect::all(px(8.0)),
                row_gap: px(6.0),
                ..default()
            },
            BackgroundColor(PANEL_BG),
        ))
        .with_children(|panel| {
            panel.spawn((
                Text::new(overlay_text(&ctx)),
                text_font(20.0),
                TextColor(TEXT_COLOR),
                StatusText,
            ));

            panel
                .spawn(Node {
                    flex_direction: FlexDirection::Row,
                    column_gap: px(6.0),
                    ..default()
                })
                .with_children(|row| {
                    for variant in CurveVariant::ALL {
                        let label = ctx.config().map(variant).name.clone();
                        row.spawn((
                            Button,
                            MapButton(variant),
                            button_style(),
                            BackgroundColor(BTN_BG),
                        ))
                        .with_children(|btn| {
                            btn.spawn((Text::new(label), text_font(14.0), TextColor(TEXT_COLOR)));
                        });
                    }

                    row.spawn((
                        Button,
                        RestartButton,
                        Node {
                            display: Display::None,
                            ..button_style()
                        },
                        BackgroundColor(RESTART_BG),
                    ))
                    .with_children(|btn| {
                        btn.spawn((Text::new("Restart"), text_font(14.0), TextColor(TEXT_COLOR)));
                    });
                });
        });
}

fn handle_map_buttons(
    query: Query<(&Interaction, &MapButton), Changed<Interaction>>,
    mut ctx: ResMut<SimulationContext>,
) {
    for (interaction, button) in &query {
        if *interaction == Interaction::Pressed {
            if let Err(err) = ctx.select_variant(button.0) {
                debug!("ignored map button: {err}");
            }
        }
    }
}

fn handle_restart_button(
    query: Query<&Interaction, (Changed<Interaction>, With<RestartButton>)>,
    mut ctx: ResMut<SimulationContext>,
) {
    for interaction in &query {
        if *interaction == Interaction::Pressed {
            if let Err(err) = ctx.restart() {
                debug!("ignored restart button: {err}");
            }
        }
    }
}

fn update_status_text(
    ctx: Res<SimulationContext>,
    mut text_query: Query<&mut Text, With<StatusText>>,
) {
    if !ctx.is_changed() {
        return;
    }
    let Ok(mut text) = text_query.single_mut() else {
        return;
    };
    text.0 = overlay_text(&ctx);
}

fn update_button_visibility(
    state: Res<State<RoundState>>,
    mut map_buttons: Query<&mut Node, (With<MapButton>, Without<RestartButton>)>,
    mut restart_buttons: Query<&mut Node, (With<RestartButton>, Without<MapButton>)>,
) {
    if !state.is_changed() {
        return;
    }
    let shown = |visible: bool| if visible { Display::Flex } else { Display::None };

    for mut node in &mut map_buttons {
        node.display = shown(*state.get() == RoundState::Menu);
    }
    for mut node in &mut restart_buttons {
        node.display = shown(*state.get() == RoundState::GameOver);
    }
}

fn update_fps_counter(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsCounterText>>,
) {
    let Ok(mut text) = query.single_mut() else {
        return;
    };

    if let Some(fps) = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|value| value.smoothed())
    {
        text.0 = format!("FPS: {fps:>3.0}");
    }
}
