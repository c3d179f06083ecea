use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{HtmlCanvasElement, MouseEvent, Window};

use crate::app::{AppEvent, EventQueue};
use crate::geometry::ndc_from_client;

pub fn window_size(window: &Window) -> (u32, u32) {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
    let w = dim(window.inner_width());
    let h = dim(window.inner_height());
    (w.max(1.0) as u32, h.max(1.0) as u32)
}

fn pointer_ndc(window: &Window, event: &MouseEvent) -> glam::Vec2 {
    let (w, h) = window_size(window);
    ndc_from_client(event.client_x() as f32, event.client_y() as f32, w as f32, h as f32)
}

/// Mouse and resize listeners. They only enqueue events; the frame loop
/// applies them.
pub fn attach(window: &Window, canvas: &HtmlCanvasElement, queue: &EventQueue) -> Result<(), JsValue> {
    // Pointer-down only on the canvas so clicks on the panel never start a drag.
    let down = {
        let window = window.clone();
        let queue = queue.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            queue.push(AppEvent::PointerDown { ndc: pointer_ndc(&window, &event) });
        }) as Box<dyn FnMut(MouseEvent)>)
    };
    canvas.add_event_listener_with_callback("mousedown", down.as_ref().unchecked_ref())?;
    down.forget();

    let moved = {
        let window = window.clone();
        let queue = queue.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            queue.push(AppEvent::PointerMove { ndc: pointer_ndc(&window, &event) });
        }) as Box<dyn FnMut(MouseEvent)>)
    };
    window.add_event_listener_with_callback("mousemove", moved.as_ref().unchecked_ref())?;
    moved.forget();

    let up = {
        let queue = queue.clone();
        Closure::wrap(Box::new(move |_: MouseEvent| {
            queue.push(AppEvent::PointerUp);
        }) as Box<dyn FnMut(MouseEvent)>)
    };
    window.add_event_listener_with_callback("mouseup", up.as_ref().unchecked_ref())?;
    up.forget();

    // Resize canvas to fit window
    let resize = {
        let window = window.clone();
        let canvas = canvas.clone();
        let queue = queue.clone();
        Closure::wrap(Box::new(move || {
            let (width, height) = window_size(&window);
            canvas.set_width(width);
            canvas.set_height(height);
            queue.push(AppEvent::Resize { width, height });
        }) as Box<dyn FnMut()>)
    };
    window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
    resize.forget();

    Ok(())
}
