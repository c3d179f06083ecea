#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod app;
pub mod camera;
pub mod config;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod panel;
pub mod scene;
pub mod scroll;
pub mod video;

pub use app::{App, AppEvent, Effect, EventQueue};
pub use config::SceneConfig;
pub use error::{NeonError, Result};

// Browser glue; everything above builds and tests on the host as well.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    use crate::app::{App, EventQueue};
    use crate::config::SceneConfig;

    mod input;
    mod loader;
    mod panel;
    mod render;
    mod video;

    const CONFIG_URL: &str = "./scene.json";

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();
        log::info!("neon starting");

        wasm_bindgen_futures::spawn_local(async {
            if let Err(e) = run().await {
                log::error!("startup failed: {:?}", e);
            }
        });
        Ok(())
    }

    async fn run() -> Result<(), JsValue> {
        let config = match loader::fetch_config(CONFIG_URL).await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}: {}; using built-in defaults", CONFIG_URL, e);
                SceneConfig::default()
            }
        };

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .get_element_by_id(&config.canvas_id)
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let (width, height) = input::window_size(&window);
        canvas.set_width(width);
        canvas.set_height(height);

        let queue = EventQueue::new();
        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        let app = App::new(config, width, height, seed);

        let video = video::VideoSource::new(&document)?;
        let panel = panel::Panel::build(&document, app.config(), &queue)?;
        input::attach(&window, &canvas, &queue)?;
        loader::spawn_model_loads(&app.config().models, &queue);

        render::start(canvas, app, queue, video, panel)
    }
}
