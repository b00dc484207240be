use crate::agent::{CHARACTER_FEATURES, FrameView, GRID_HEIGHT, GRID_WIDTH, PROXIMITY_FEATURES};
use crate::infra::SharedView;
use bevy::camera::visibility::ViewVisibility;
use bevy::prelude::*;
use std::sync::{Arc, Mutex, mpsc};

const CELL_SIZE: f32 = 8.0;
const GRID_GAP: f32 = 32.0;
const FEATURE_CELL_WIDTH: f32 = 10.0;
const FEATURE_CELL_HEIGHT: f32 = 24.0;
const FEATURE_CELLS: usize = 2 * CHARACTER_FEATURES + PROXIMITY_FEATURES;
const WINDOW_WIDTH: f32 = 1100.0;
const WINDOW_HEIGHT: f32 = 640.0;

#[derive(Resource)]
pub struct SharedViewResource {
    pub view: Arc<Mutex<SharedView>>,
}

#[derive(Resource)]
pub struct ReadySignal {
    sender: Option<mpsc::Sender<()>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum GridKind {
    Platform,
    Opponent,
}

#[derive(Component)]
struct GridCell {
    grid: GridKind,
    index: usize,
}

/// One slot of the strip: player features, opponent features, proximity.
#[derive(Component)]
struct FeatureCell {
    index: usize,
}

#[derive(Component)]
struct StatusText;

/// Open the inputs window. Blocks until the window is closed or the control
/// loop has stopped.
pub fn run_visualizer(view: Arc<Mutex<SharedView>>, ready_tx: mpsc::Sender<()>) {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Fightbot Inputs".to_string(),
                resolution: (WINDOW_WIDTH as u32, WINDOW_HEIGHT as u32).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)))
        .insert_resource(SharedViewResource { view })
        .insert_resource(ReadySignal {
            sender: Some(ready_tx),
        })
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (signal_ready, update_cells, update_status, exit_when_finished),
        )
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Transform::default(),
        GlobalTransform::default(),
        Visibility::default(),
        InheritedVisibility::default(),
        ViewVisibility::default(),
    ));

    let grid_width = GRID_WIDTH as f32 * CELL_SIZE;
    let grid_height = GRID_HEIGHT as f32 * CELL_SIZE;
    let top = grid_height / 2.0 + 60.0;

    for (grid, left) in [
        (GridKind::Platform, -grid_width - GRID_GAP / 2.0),
        (GridKind::Opponent, GRID_GAP / 2.0),
    ] {
        for index in 0..GRID_WIDTH * GRID_HEIGHT {
            let col = index % GRID_WIDTH;
            let row = index / GRID_WIDTH;
            let x = left + col as f32 * CELL_SIZE + CELL_SIZE / 2.0;
            let y = top - row as f32 * CELL_SIZE - CELL_SIZE / 2.0;

            commands.spawn((
                Sprite {
                    color: shade(0.0),
                    custom_size: Some(Vec2::new(CELL_SIZE, CELL_SIZE)),
                    ..default()
                },
                Transform::from_xyz(x, y, 0.0),
                GridCell { grid, index },
            ));
        }
    }

    let strip_left = -(FEATURE_CELLS as f32 * FEATURE_CELL_WIDTH) / 2.0;
    let strip_y = top - grid_height - 40.0;
    for index in 0..FEATURE_CELLS {
        // Gap between the player, opponent and proximity sections
        let section = (index / CHARACTER_FEATURES) as f32;
        let x = strip_left + index as f32 * FEATURE_CELL_WIDTH + section * 6.0;

        commands.spawn((
            Sprite {
                color: shade(0.0),
                custom_size: Some(Vec2::new(FEATURE_CELL_WIDTH - 1.0, FEATURE_CELL_HEIGHT)),
                ..default()
            },
            Transform::from_xyz(x, strip_y, 0.0),
            FeatureCell { index },
        ));
    }

    commands.spawn((
        Text::new("Waiting for a match..."),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        StatusText,
    ));
}

fn signal_ready(mut ready_signal: ResMut<ReadySignal>) {
    if let Some(sender) = ready_signal.sender.take() {
        let _ = sender.send(());
        tracing::info!("Visualizer ready, signaling control loop to start...");
    }
}

fn update_cells(
    shared: Res<SharedViewResource>,
    mut grid_cells: Query<(&GridCell, &mut Sprite), Without<FeatureCell>>,
    mut feature_cells: Query<(&FeatureCell, &mut Sprite), Without<GridCell>>,
) {
    let Ok(view) = shared.view.lock() else {
        tracing::warn!("Failed to lock shared view for drawing");
        return;
    };
    let frame = view.frame.as_ref();

    for (cell, mut sprite) in &mut grid_cells {
        let value = frame.map_or(0.0, |frame| grid_value(frame, cell.grid, cell.index));
        sprite.color = shade(value);
    }

    for (cell, mut sprite) in &mut feature_cells {
        let value = frame.map_or(0.0, |frame| feature_value(frame, cell.index));
        sprite.color = shade(value);
    }
}

fn update_status(
    shared: Res<SharedViewResource>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    let Ok(view) = shared.view.lock() else {
        return;
    };
    let status = status_line(&view);
    for mut text in &mut query {
        text.0 = status.clone();
    }
}

fn exit_when_finished(shared: Res<SharedViewResource>, mut app_exit: MessageWriter<AppExit>) {
    let Ok(view) = shared.view.lock() else {
        return;
    };
    if let Some(exit) = exit_for(&view) {
        tracing::info!("Control loop stopped, closing visualizer");
        app_exit.write(exit);
    }
}

fn exit_for(view: &SharedView) -> Option<AppExit> {
    if !view.finished {
        return None;
    }
    Some(match view.failure {
        Some(_) => AppExit::error(),
        None => AppExit::Success,
    })
}

fn grid_value(frame: &FrameView, grid: GridKind, index: usize) -> f32 {
    let values = match grid {
        GridKind::Platform => &frame.spatial.platform_grid,
        GridKind::Opponent => &frame.spatial.opponent_grid,
    };
    values.get(index).copied().unwrap_or(0.0)
}

fn feature_value(frame: &FrameView, index: usize) -> f32 {
    frame
        .player
        .as_slice()
        .iter()
        .chain(frame.opponent.as_slice())
        .chain(&frame.spatial.proximity)
        .nth(index)
        .copied()
        .unwrap_or(0.0)
}

fn status_line(view: &SharedView) -> String {
    if let Some(error) = &view.failure {
        return format!("Stopped: {}", error);
    }
    if view.finished {
        return "Game closed".to_string();
    }
    match &view.frame {
        None => "Waiting for a match...".to_string(),
        Some(frame) => format!(
            "Frame: {} | Keys: {} | Stock: {:.2} vs {:.2} | Skipped: {}{}",
            frame.frame,
            frame.keys.describe(),
            frame.player.stock_fraction(),
            frame.opponent.stock_fraction(),
            view.skipped,
            if view.paused { " | PAUSED" } else { "" }
        ),
    }
}

fn shade(value: f32) -> Color {
    let v = value.clamp(0.0, 1.0);
    Color::srgb(v, v, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::ConfigurationError;

    #[test]
    fn test_status_line() {
        let mut view = SharedView::default();
        assert_eq!(status_line(&view), "Waiting for a match...");

        view.finished = true;
        assert_eq!(status_line(&view), "Game closed");
    }

    #[test]
    fn test_status_line_shows_failure() {
        let mut view = SharedView::default();
        view.fail(ConfigurationError::MissingSetting("FIGHTBOT_REPLAY"));
        assert_eq!(
            status_line(&view),
            "Stopped: missing required setting FIGHTBOT_REPLAY"
        );
    }

    #[test]
    fn test_exit_once_loop_stops() {
        let mut view = SharedView::default();
        assert!(exit_for(&view).is_none());

        view.finished = true;
        assert!(matches!(exit_for(&view), Some(AppExit::Success)));

        view.fail(ConfigurationError::MissingSetting("FIGHTBOT_REPLAY"));
        assert!(matches!(exit_for(&view), Some(AppExit::Error(_))));
    }

    #[test]
    fn test_shade_clamps() {
        assert_eq!(shade(2.0), Color::srgb(1.0, 1.0, 1.0));
        assert_eq!(shade(-1.0), Color::srgb(0.0, 0.0, 0.0));
    }
}
