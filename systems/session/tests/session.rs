use tilecraft_core::{BuildMode, Command, LayerName, Rotation, TileDescriptor, Tool};
use tilecraft_system_session::{Session, SessionEffect};

fn wall_tile() -> TileDescriptor {
    TileDescriptor::new("wallTiles", 4)
}

#[test]
fn entering_build_mode_is_idempotent() {
    let mut once = Session::new();
    assert_eq!(
        once.enter_build_mode(),
        SessionEffect::ModeChanged {
            mode: BuildMode::Building,
        }
    );

    let mut twice = Session::new();
    let _ = twice.enter_build_mode();
    assert_eq!(twice.enter_build_mode(), SessionEffect::Unchanged);

    assert_eq!(once, twice, "second enter must not alter the session");
    assert!(twice.is_building());
}

#[test]
fn exiting_build_mode_is_idempotent() {
    let mut session = Session::new();
    assert_eq!(
        session.exit_build_mode(),
        SessionEffect::Unchanged,
        "a fresh session is already idle"
    );

    let _ = session.enter_build_mode();
    let first = session.exit_build_mode();
    let snapshot = session.clone();
    let second = session.exit_build_mode();

    assert_eq!(
        first,
        SessionEffect::ModeChanged {
            mode: BuildMode::Idle,
        }
    );
    assert_eq!(second, SessionEffect::Unchanged);
    assert_eq!(session, snapshot);
}

#[test]
fn selecting_a_layer_always_clears_the_tile() {
    let mut session = Session::new();
    let _ = session.select_layer(LayerName::Wall);
    let _ = session.select_tile(wall_tile());
    assert_eq!(session.tile(), Some(&wall_tile()));

    let effect = session.select_layer(LayerName::Wall);
    assert_eq!(
        effect,
        SessionEffect::LayerChanged {
            layer: Some(LayerName::Wall),
        }
    );
    assert!(
        session.tile().is_none(),
        "reselecting the same layer still invalidates the tile"
    );
}

#[test]
fn clearing_the_layer_clears_the_tile() {
    let mut session = Session::new();
    let _ = session.select_layer(LayerName::Roof);
    let _ = session.select_tile(TileDescriptor::new("roofTiles", 1));
    let _ = session.clear_layer();
    assert!(session.layer().is_none());
    assert!(session.tile().is_none());
}

#[test]
fn setters_do_not_change_mode() {
    let mut session = Session::new();
    let commands = [
        Command::SelectTool { tool: Tool::Hammer },
        Command::SelectLayer {
            layer: LayerName::Floor,
        },
        Command::SelectTile {
            descriptor: TileDescriptor::new("floorTiles", 0),
        },
        Command::RotateClockwise,
        Command::ClearTool,
        Command::ClearLayer,
    ];
    for command in commands {
        let _ = session.apply(command);
        assert_eq!(session.mode(), BuildMode::Idle);
    }
    assert!(session.tool().is_none());
}

#[test]
fn rotation_is_unbounded() {
    let mut session = Session::new();
    for _ in 0..5 {
        let _ = session.apply(Command::RotateClockwise);
    }
    assert_eq!(session.rotation(), Rotation::from_degrees(450));
    assert_eq!(session.rotation().normalized(), 90);

    for _ in 0..8 {
        let _ = session.rotate_counter_clockwise();
    }
    assert_eq!(session.rotation().degrees(), -270);
    assert_eq!(session.rotation().normalized(), 90);
}

#[test]
fn tool_selection_is_reported() {
    let mut session = Session::new();
    assert_eq!(
        session.apply(Command::SelectTool { tool: Tool::Pick }),
        SessionEffect::ToolChanged {
            tool: Some(Tool::Pick),
        }
    );
    assert_eq!(
        session.apply(Command::ClearTool),
        SessionEffect::ToolChanged { tool: None }
    );
}
