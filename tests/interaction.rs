//! End-to-end behaviour of the event loop core: events in, model state and
//! effects out. Runs on the host and, via wasm-bindgen-test, in the browser.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::wasm_bindgen_test as test;

use glam::{Vec2, Vec3};
use neon_wasm::mesh::parse_obj;
use neon_wasm::scene::{MaterialRef, ModelId};
use neon_wasm::video::{VideoCommand, VideoMode};
use neon_wasm::{App, AppEvent, Effect, SceneConfig};

const SQUARE: &str = "v -2 -2 0\nv 2 -2 0\nv 2 2 0\nv -2 2 0\nf 1 2 3 4\n";

/// Square viewport, camera at (-4, 27), one untransformed 4x4 square
/// centred under the camera.
fn app_with(extra: &str) -> App {
    let json = format!(
        r#"{{ "models": {{ "position": [-4, 27, 0], "rotation": [0, 0, 0], "scale": [1, 1, 1] }}{} }}"#,
        extra
    );
    let config = SceneConfig::from_json(&json).unwrap();
    let mut app = App::new(config, 600, 600, 7);
    app.handle(AppEvent::ModelLoaded {
        id: 14,
        meshes: parse_obj(SQUARE).unwrap(),
    });
    app
}

fn add_square(app: &mut App, id: u32) {
    app.handle(AppEvent::ModelLoaded {
        id,
        meshes: parse_obj(SQUARE).unwrap(),
    });
}

fn assert_near(a: Vec3, b: Vec3) {
    assert!(a.abs_diff_eq(b, 1e-3), "{:?} != {:?}", a, b);
}

#[test]
fn drag_keeps_grab_offset_and_clamps_to_bounds() {
    let mut app = app_with("");
    let first = ModelId(0);

    // Half-width is 30 world units, so ndc 0.05 is 1.5 right of centre.
    app.handle(AppEvent::PointerDown { ndc: Vec2::new(0.05, 0.0) });
    assert!(app.drag().is_dragging());

    // y = 27 lies above the bounds and is pulled down to 10.
    app.handle(AppEvent::PointerMove { ndc: Vec2::new(0.5, 0.0) });
    assert_near(app.model_position(first).unwrap(), Vec3::new(9.5, 10.0, 0.0));

    app.handle(AppEvent::PointerMove { ndc: Vec2::new(1.0, -1.0) });
    assert_near(app.model_position(first).unwrap(), Vec3::new(24.5, -3.0, 0.0));

    app.handle(AppEvent::PointerUp);
    assert!(!app.drag().is_dragging());
    assert_near(app.model_position(first).unwrap(), Vec3::new(24.5, -3.0, 0.0));

    // Moves after release do nothing.
    app.handle(AppEvent::PointerMove { ndc: Vec2::ZERO });
    assert_near(app.model_position(first).unwrap(), Vec3::new(24.5, -3.0, 0.0));
}

#[test]
fn pointer_down_on_empty_space_starts_nothing() {
    let mut app = app_with("");
    app.handle(AppEvent::PointerDown { ndc: Vec2::new(-0.9, 0.9) });
    assert!(!app.drag().is_dragging());
    app.handle(AppEvent::PointerMove { ndc: Vec2::new(0.5, 0.5) });
    assert_eq!(app.model_position(ModelId(0)), Some(Vec3::new(-4.0, 27.0, 0.0)));
}

#[test]
fn snap_back_release_restores_start() {
    let mut app = app_with(r#", "drag": { "release": "snap_back" }"#);
    app.handle(AppEvent::PointerDown { ndc: Vec2::ZERO });
    app.handle(AppEvent::PointerMove { ndc: Vec2::new(0.3, -0.3) });
    assert_ne!(app.model_position(ModelId(0)), Some(Vec3::new(-4.0, 27.0, 0.0)));
    app.handle(AppEvent::PointerUp);
    assert_eq!(app.model_position(ModelId(0)), Some(Vec3::new(-4.0, 27.0, 0.0)));
}

#[test]
fn reset_restores_exact_positions_and_twist() {
    let mut app = app_with("");
    add_square(&mut app, 15);
    let initial: Vec<Vec3> = app.models().iter().map(|m| m.transform.position).collect();

    app.handle(AppEvent::PointerDown { ndc: Vec2::new(0.01, 0.01) });
    app.handle(AppEvent::PointerMove { ndc: Vec2::new(0.37, -0.61) });
    app.handle(AppEvent::PointerUp);
    app.handle(AppEvent::Twist(0.5));

    let effects = app.handle(AppEvent::Reset);
    assert_eq!(effects, vec![Effect::TwistControl(0.0)]);

    let after: Vec<Vec3> = app.models().iter().map(|m| m.transform.position).collect();
    assert_eq!(after, initial);
    for model in app.models().iter() {
        assert!(model.meshes.iter().all(|m| m.rotation_z == 0.0));
    }
}

#[test]
fn twist_alternates_direction_between_models() {
    let mut app = app_with("");
    add_square(&mut app, 15);
    add_square(&mut app, 16);
    app.handle(AppEvent::Twist(0.4));
    let angles: Vec<f32> = app.models().iter().map(|m| m.meshes[0].rotation_z).collect();
    assert_eq!(angles, vec![0.4, -0.4, 0.4]);

    // Out-of-range input is clamped to the slider range.
    app.handle(AppEvent::Twist(3.0));
    assert_eq!(app.models().get(ModelId(1)).unwrap().meshes[0].rotation_z, -1.0);
}

#[test]
fn toggling_video_twice_restores_material_and_selection() {
    let mut app = app_with("");
    app.handle(AppEvent::SelectVideo(2));

    let off = app.handle(AppEvent::ToggleVideo);
    assert_eq!(
        off,
        vec![Effect::Video(VideoCommand::Stop), Effect::VideoControls(VideoMode::Off)]
    );
    assert!(app.models().iter().all(|m| m.material == MaterialRef::Fallback));

    // Selecting while off only remembers the choice and moves the selector.
    assert_eq!(app.handle(AppEvent::SelectVideo(3)), vec![Effect::VideoIndex(3)]);

    // Models loaded while off use the fallback material too.
    add_square(&mut app, 15);
    assert_eq!(app.models().get(ModelId(1)).unwrap().material, MaterialRef::Fallback);

    let on = app.handle(AppEvent::ToggleVideo);
    assert!(matches!(
        &on[0],
        Effect::Video(VideoCommand::Play { index: 3, rate, .. }) if *rate == -10.0
    ));
    assert_eq!(on[1], Effect::VideoControls(VideoMode::On));
    assert!(app.models().iter().all(|m| m.material == MaterialRef::Video));
    assert_eq!(app.video().current(), 3);
}

#[test]
fn selecting_videos() {
    let mut app = app_with("");
    assert!(app.handle(AppEvent::SelectVideo(0)).is_empty(), "already playing");
    assert!(app.handle(AppEvent::SelectVideo(99)).is_empty(), "out of range");

    let effects = app.handle(AppEvent::SelectVideo(4));
    assert_eq!(
        effects,
        vec![
            Effect::Video(VideoCommand::Play {
                index: 4,
                source: "./videos/video5.mp4".to_string(),
                rate: -10.0,
            }),
            Effect::VideoIndex(4),
        ]
    );

    // Next wraps around to the first source and moves the selector with it.
    let effects = app.handle(AppEvent::NextVideo);
    assert!(matches!(&effects[0], Effect::Video(VideoCommand::Play { index: 0, .. })));
    assert_eq!(effects[1], Effect::VideoIndex(0));
}

#[test]
fn thickness_drives_camera_and_depth_scale() {
    let mut app = app_with("");
    app.handle(AppEvent::Thickness(1.0));
    assert_eq!(app.camera().position.x, -4.0);

    app.handle(AppEvent::Thickness(9.0));
    assert_eq!(app.camera().position.x, -40.0);
    assert_eq!(app.models().get(ModelId(0)).unwrap().transform.scale.z, 9.0);

    app.handle(AppEvent::Thickness(50.0));
    assert_eq!(app.camera().position.x, -40.0);
    assert_eq!(app.camera().position.y, 27.0);
}

#[test]
fn randomize_gives_every_model_the_same_scale_in_range() {
    let mut app = app_with("");
    for id in 15..20 {
        add_square(&mut app, id);
    }
    for _ in 0..50 {
        app.handle(AppEvent::RandomizeScale);
        let z = app.models().get(ModelId(0)).unwrap().transform.scale.z;
        assert!((1.0..=20.0).contains(&z));
        assert_eq!(z.fract(), 0.0);
        assert!(app.models().iter().all(|m| m.transform.scale.z == z));
    }
}

#[test]
fn tint_sets_emission_on_both_materials() {
    let mut app = app_with("");
    let red = neon_wasm::config::Rgb([1.0, 0.0, 0.0]);
    app.handle(AppEvent::Tint(red));
    assert_eq!(app.material().emissive, red);
    assert_eq!(app.material().emissive_intensity, 1.5);
    assert_eq!(app.fallback().emissive, red);
}

#[test]
fn scroll_offset_stays_in_unit_range() {
    let mut app = app_with("");
    let mut wrapped = false;
    let mut last = 0.0;
    for _ in 0..3000 {
        let o = app.tick();
        assert!((0.0..1.0).contains(&o));
        wrapped |= o < last;
        last = o;
    }
    assert!(wrapped);
    assert_eq!(app.material().uv_offset.y, 0.0);
}

#[test]
fn panel_toggle_and_resize_emit_effects() {
    let mut app = app_with("");
    let state = app.panel().state;
    let effects = app.handle(AppEvent::TogglePanel);
    assert_eq!(effects, vec![Effect::Panel(state.toggled())]);

    let effects = app.handle(AppEvent::Resize { width: 1200, height: 600 });
    assert_eq!(effects, vec![Effect::Viewport { width: 1200, height: 600 }]);
    assert_eq!(app.camera().aspect, 2.0);
    assert_eq!(app.camera().position, Vec3::new(-4.0, 27.0, 200.0));
}

#[test]
fn reset_zeroes_rotation_even_with_a_nonzero_twist_default() {
    let mut app = app_with(r#", "twist": { "min": -1, "max": 1, "step": 0.05, "default": 0.3 }"#);
    add_square(&mut app, 15);
    assert_eq!(app.models().get(ModelId(0)).unwrap().meshes[0].rotation_z, 0.0);

    app.handle(AppEvent::Twist(0.8));
    let effects = app.handle(AppEvent::Reset);

    assert_eq!(effects, vec![Effect::TwistControl(0.3)]);
    assert_eq!(app.panel().twist, 0.3);
    for model in app.models().iter() {
        assert!(model.meshes.iter().all(|m| m.rotation_z == 0.0));
    }
}

#[test]
fn bloom_strength_follows_the_slider_and_clamps() {
    let mut app = app_with("");
    assert_eq!(app.bloom_strength(), 0.0);

    assert!(app.handle(AppEvent::Bloom(0.7)).is_empty());
    assert_eq!(app.bloom_strength(), 0.7);

    app.handle(AppEvent::Bloom(4.0));
    assert_eq!(app.bloom_strength(), 1.5);
    app.handle(AppEvent::Bloom(-1.0));
    assert_eq!(app.bloom_strength(), 0.0);
}
