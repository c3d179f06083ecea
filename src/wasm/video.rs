use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, HtmlVideoElement};

use crate::video::VideoCommand;

/// `HTMLMediaElement.HAVE_CURRENT_DATA`
const HAVE_CURRENT_DATA: u16 = 2;

/// Looping, muted `<video>` element used as the shader's texture source.
pub struct VideoSource {
    element: HtmlVideoElement,
    rate: Rc<Cell<f64>>,
}

impl VideoSource {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let element = document
            .create_element("video")?
            .dyn_into::<HtmlVideoElement>()?;
        element.set_loop(true);
        element.set_muted(true);
        element.set_autoplay(true);
        element.set_cross_origin(Some("anonymous"));
        element.set_attribute("playsinline", "")?;

        let rate = Rc::new(Cell::new(1.0));

        let on_can_play = {
            let element = element.clone();
            let rate = rate.clone();
            Closure::wrap(Box::new(move || {
                start_playback(&element, rate.get());
            }) as Box<dyn FnMut()>)
        };
        element.add_event_listener_with_callback("canplay", on_can_play.as_ref().unchecked_ref())?;
        on_can_play.forget();

        let on_error = {
            let element = element.clone();
            Closure::wrap(Box::new(move || {
                let code = element.error().map(|e| e.code()).unwrap_or(0);
                log::error!("video load failed: {} (media error {})", element.current_src(), code);
            }) as Box<dyn FnMut()>)
        };
        element.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())?;
        on_error.forget();

        Ok(Self { element, rate })
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }

    /// True once the element has a frame that can be uploaded.
    pub fn has_frame(&self) -> bool {
        self.element.ready_state() >= HAVE_CURRENT_DATA && self.element.video_width() > 0
    }

    pub fn apply(&self, command: &VideoCommand) {
        match command {
            VideoCommand::Play { index, source, rate } => {
                log::info!("loading video #{}: {}", index, source);
                self.rate.set(*rate);
                self.element.set_src(source);
                self.element.load();
            }
            VideoCommand::Stop => {
                if let Err(e) = self.element.pause() {
                    log::warn!("video pause failed: {:?}", e);
                }
                // An empty src raises a media error; drop the attribute instead.
                if let Err(e) = self.element.remove_attribute("src") {
                    log::warn!("clearing video source failed: {:?}", e);
                }
                self.element.load();
            }
        }
    }
}

fn start_playback(element: &HtmlVideoElement, rate: f64) {
    match element.play() {
        Ok(promise) => spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("video play() rejected: {:?}", e);
            }
        }),
        Err(e) => log::warn!("video play() failed: {:?}", e),
    }
    // Browsers may refuse negative rates; Reflect::set surfaces that as an Err.
    if let Err(e) = js_sys::Reflect::set(element, &JsValue::from_str("playbackRate"), &JsValue::from_f64(rate)) {
        log::warn!("playback rate {} rejected: {:?}", rate, e);
    }
}
