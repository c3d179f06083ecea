use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::Response;

use crate::app::{AppEvent, EventQueue};
use crate::config::{ModelConfig, SceneConfig};
use crate::error::{NeonError, Result};
use crate::mesh::{parse_obj, MeshData};

fn js_error(e: JsValue) -> NeonError {
    NeonError::Js(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

async fn fetch_text(url: &str) -> Result<String> {
    let window = web_sys::window().ok_or_else(|| NeonError::Js("no window".into()))?;
    let resp: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    if !resp.ok() {
        return Err(NeonError::Js(format!("{} -> HTTP {}", url, resp.status())));
    }
    let body = JsFuture::from(resp.text().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    body.as_string()
        .ok_or_else(|| NeonError::Js(format!("{}: body is not text", url)))
}

pub async fn fetch_config(url: &str) -> Result<SceneConfig> {
    let text = fetch_text(url).await?;
    SceneConfig::from_json(&text)
}

async fn load_model(path: &str) -> Result<Vec<MeshData>> {
    let text = fetch_text(path).await?;
    parse_obj(&text)
}

/// Start one independent fetch per model id. Completions are queued in
/// whatever order they finish; failures are logged and not retried.
pub fn spawn_model_loads(models: &ModelConfig, queue: &EventQueue) {
    for id in models.ids() {
        let path = models.path_for(id);
        let queue = queue.clone();
        spawn_local(async move {
            match load_model(&path).await {
                Ok(meshes) => {
                    log::debug!("{}: {} mesh(es)", path, meshes.len());
                    queue.push(AppEvent::ModelLoaded { id, meshes });
                }
                Err(e) => log::error!("failed to load {}: {}", path, e),
            }
        });
    }
}
