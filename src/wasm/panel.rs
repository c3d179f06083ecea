//! DOM widgets for the control panel. Widgets only enqueue events; the frame
//! loop feeds layout changes back through [`Panel::apply`].

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, EventTarget, HtmlButtonElement, HtmlElement, HtmlInputElement};

use crate::app::{AppEvent, Effect, EventQueue};
use crate::config::{PanelConfig, Rgb, SceneConfig, SliderSpec};
use crate::panel::PanelState;
use crate::video::VideoMode;

pub struct Panel {
    container: HtmlElement,
    chord: HtmlElement,
    chord_line: HtmlElement,
    toggle_video: HtmlButtonElement,
    video_row: HtmlElement,
    video_index: HtmlInputElement,
    tint_row: HtmlElement,
    twist: HtmlInputElement,
    layout: PanelConfig,
}

fn create<T: JsCast>(document: &Document, tag: &str) -> Result<T, JsValue> {
    Ok(document.create_element(tag)?.dyn_into::<T>()?)
}

fn style(el: &HtmlElement, props: &[(&str, &str)]) -> Result<(), JsValue> {
    let css = el.style();
    for (k, v) in props {
        css.set_property(k, v)?;
    }
    Ok(())
}

fn on(target: &EventTarget, kind: &str, mut f: impl FnMut() + 'static) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move || f()) as Box<dyn FnMut()>);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn label(document: &Document, text: &str) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = create(document, "label")?;
    el.set_text_content(Some(text));
    style(&el, &[("color", "#ffffff"), ("font-size", "18px"), ("display", "block")])?;
    Ok(el)
}

fn row(document: &Document) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = create(document, "div")?;
    style(&el, &[("margin-top", "14px")])?;
    Ok(el)
}

/// Labelled range input that enqueues `event(value)` on every input.
fn slider(
    document: &Document,
    text: &str,
    spec: &SliderSpec,
    queue: &EventQueue,
    event: fn(f32) -> AppEvent,
) -> Result<(HtmlElement, HtmlInputElement), JsValue> {
    let wrap = row(document)?;
    let input: HtmlInputElement = create(document, "input")?;
    input.set_type("range");
    input.set_min(&spec.min.to_string());
    input.set_max(&spec.max.to_string());
    input.set_step(&spec.step.to_string());
    input.set_value(&spec.default.to_string());
    style(&input, &[("width", "150px")])?;

    let reader = input.clone();
    let queue = queue.clone();
    let name = text.to_string();
    on(&input, "input", move || match reader.value().parse::<f32>() {
        Ok(v) => queue.push(event(v)),
        Err(_) => log::warn!("{}: ignoring non-numeric value {:?}", name, reader.value()),
    })?;

    wrap.append_child(&label(document, text)?)?;
    wrap.append_child(&input)?;
    Ok((wrap, input))
}

fn button(document: &Document, text: &str, color: &str, queue: &EventQueue, event: AppEvent) -> Result<HtmlButtonElement, JsValue> {
    let el: HtmlButtonElement = create(document, "button")?;
    el.set_text_content(Some(text));
    style(
        &el,
        &[
            ("padding", "10px 15px"),
            ("margin", "4px 6px 0 0"),
            ("font-size", "16px"),
            ("background-color", color),
            ("color", "#ffffff"),
            ("border", "none"),
            ("border-radius", "100px"),
            ("cursor", "pointer"),
        ],
    )?;
    let queue = queue.clone();
    on(&el, "click", move || queue.push(event.clone()))?;
    Ok(el)
}

impl Panel {
    pub fn build(document: &Document, config: &SceneConfig, queue: &EventQueue) -> Result<Self, JsValue> {
        let body = document.body().ok_or("no body")?;

        let container: HtmlElement = create(document, "div")?;
        let transition = format!("height {}s ease-in-out", config.panel.transition_secs);
        style(
            &container,
            &[
                ("position", "absolute"),
                ("top", "0px"),
                ("left", "5px"),
                ("width", "200px"),
                ("height", "0px"),
                ("overflow", "hidden"),
                ("padding", "0 10px"),
                ("border-radius", "10px"),
                ("background-color", "#000"),
                ("font-family", "monospace"),
                ("z-index", "99999"),
                ("transition", transition.as_str()),
            ],
        )?;

        let buttons = row(document)?;
        buttons.append_child(&button(document, "Reset", "#ff5733", queue, AppEvent::Reset)?)?;
        let toggle_video = button(document, "Off", "#888888", queue, AppEvent::ToggleVideo)?;
        buttons.append_child(&toggle_video)?;
        buttons.append_child(&button(document, "Next", "#33aaff", queue, AppEvent::NextVideo)?)?;
        buttons.append_child(&button(document, "Randomize", "#ffcc00", queue, AppEvent::RandomizeScale)?)?;
        container.append_child(&buttons)?;

        let video_spec = SliderSpec::new(0.0, config.video.sources.len().saturating_sub(1) as f32, 1.0, 0.0);
        let (video_row, video_index) = slider(document, "Video:", &video_spec, queue, |v| {
            AppEvent::SelectVideo(v.max(0.0).round() as usize)
        })?;
        container.append_child(&video_row)?;

        let tint_row = row(document)?;
        let picker: HtmlInputElement = create(document, "input")?;
        picker.set_type("color");
        picker.set_value(&config.material.tint.to_hex());
        {
            let reader = picker.clone();
            let queue = queue.clone();
            on(&picker, "input", move || match Rgb::from_hex(&reader.value()) {
                Ok(color) => queue.push(AppEvent::Tint(color)),
                Err(e) => log::warn!("{}", e),
            })?;
        }
        tint_row.append_child(&label(document, "Color:")?)?;
        tint_row.append_child(&picker)?;
        container.append_child(&tint_row)?;

        let (thickness_row, _) = slider(document, "Thickness:", &config.thickness.slider, queue, AppEvent::Thickness)?;
        container.append_child(&thickness_row)?;
        let (bloom_row, _) = slider(document, "Glow:", &config.bloom.slider, queue, AppEvent::Bloom)?;
        container.append_child(&bloom_row)?;
        let (twist_row, twist) = slider(document, "Rotate:", &config.twist, queue, AppEvent::Twist)?;
        container.append_child(&twist_row)?;

        body.append_child(&container)?;

        // Pull chord: dashed line plus a cone that opens and closes the panel.
        let chord_line: HtmlElement = create(document, "div")?;
        style(
            &chord_line,
            &[
                ("position", "absolute"),
                ("left", "1.9%"),
                ("top", "-50%"),
                ("width", "3px"),
                ("height", "100%"),
                ("z-index", "9999"),
                ("background", "repeating-linear-gradient(transparent, transparent 4px, white 4px, white 8px)"),
                ("transition", "height 1s ease-in-out"),
            ],
        )?;
        body.append_child(&chord_line)?;

        let chord: HtmlElement = create(document, "div")?;
        style(
            &chord,
            &[
                ("position", "absolute"),
                ("left", "2%"),
                ("top", "50%"),
                ("transform", "translate(-50%, -50%)"),
                ("width", "0"),
                ("height", "0"),
                ("cursor", "pointer"),
                ("z-index", "9999"),
                ("border-left", "20px solid transparent"),
                ("border-right", "20px solid transparent"),
                ("border-bottom", "40px solid #ccc"),
                ("transition", "top 1s ease-in-out"),
            ],
        )?;
        {
            let queue = queue.clone();
            on(&chord, "click", move || queue.push(AppEvent::TogglePanel))?;
        }
        body.append_child(&chord)?;

        Ok(Self {
            container,
            chord,
            chord_line,
            toggle_video,
            video_row,
            video_index,
            tint_row,
            twist,
            layout: config.panel.clone(),
        })
    }

    pub fn apply(&self, effect: &Effect) -> Result<(), JsValue> {
        match effect {
            Effect::TwistControl(v) => self.twist.set_value(&v.to_string()),
            Effect::VideoIndex(i) => self.video_index.set_value(&i.to_string()),
            Effect::VideoControls(mode) => {
                let (label, video, tint) = match mode {
                    VideoMode::On => ("Off", "block", "none"),
                    VideoMode::Off => ("On", "none", "block"),
                };
                self.toggle_video.set_text_content(Some(label));
                style(&self.video_row, &[("display", video)])?;
                style(&self.tint_row, &[("display", tint)])?;
            }
            Effect::Panel(state) => {
                let (height, chord_top, line_height) = match state {
                    PanelState::Expanded => (self.layout.open_height.as_str(), "80%", "130%"),
                    PanelState::Collapsed => ("0%", "50%", "100%"),
                };
                style(&self.container, &[("height", height)])?;
                style(&self.chord, &[("top", chord_top)])?;
                style(&self.chord_line, &[("height", line_height)])?;
            }
            Effect::Video(_) | Effect::Viewport { .. } => {}
        }
        Ok(())
    }
}
