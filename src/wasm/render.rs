use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    window, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlFramebuffer,
    WebGlProgram, WebGlRenderbuffer, WebGlShader, WebGlTexture, WebGlUniformLocation,
    WebGlVertexArrayObject,
};

use super::panel::Panel;
use super::video::VideoSource;
use crate::app::{App, Effect, EventQueue};
use crate::mesh::{MeshData, Vertex};
use crate::scene::MaterialRef;

const MESH_VS: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec2 a_uv;
uniform mat4 u_view_proj;
uniform mat4 u_model;
out vec2 v_uv;
out vec3 v_normal;
out vec3 v_world;
void main() {
    vec4 world = u_model * vec4(a_position, 1.0);
    v_uv = a_uv;
    v_normal = mat3(transpose(inverse(u_model))) * a_normal;
    v_world = world.xyz;
    gl_Position = u_view_proj * world;
}
"#;

const VIDEO_FS: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
uniform sampler2D u_video;
uniform float u_brightness;
uniform vec2 u_offset;
uniform vec2 u_video_size;
uniform vec3 u_emissive;
uniform float u_emissive_intensity;
out vec4 frag;
void main() {
    vec2 uv = (v_uv + u_offset) * u_video_size;
    vec4 c = texture(u_video, uv);
    frag = vec4(c.rgb * u_brightness + u_emissive * u_emissive_intensity, c.a);
}
"#;

const FALLBACK_FS: &str = r#"#version 300 es
precision highp float;
in vec3 v_normal;
in vec3 v_world;
uniform vec3 u_color;
uniform vec3 u_emissive;
uniform float u_emissive_intensity;
uniform float u_ambient;
uniform vec3 u_light_pos;
uniform vec3 u_light_color;
uniform float u_light_intensity;
out vec4 frag;
void main() {
    vec3 n = normalize(v_normal);
    vec3 l = normalize(u_light_pos - v_world);
    float diffuse = abs(dot(n, l));
    vec3 lit = u_color * u_light_color * (u_ambient + diffuse * u_light_intensity);
    frag = vec4(lit + u_emissive * u_emissive_intensity, 1.0);
}
"#;

// Single oversized triangle covering the viewport; no vertex buffer needed.
const FULLSCREEN_VS: &str = r#"#version 300 es
out vec2 v_uv;
void main() {
    vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2));
    v_uv = p;
    gl_Position = vec4(p * 2.0 - 1.0, 0.0, 1.0);
}
"#;

const BRIGHT_FS: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
uniform sampler2D u_source;
uniform float u_threshold;
out vec4 frag;
void main() {
    vec4 c = texture(u_source, v_uv);
    float luma = dot(c.rgb, vec3(0.2126, 0.7152, 0.0722));
    frag = vec4(c.rgb * smoothstep(u_threshold, u_threshold + 0.1, luma), 1.0);
}
"#;

const BLUR_FS: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
uniform sampler2D u_source;
uniform vec2 u_direction;
out vec4 frag;
const float W[5] = float[](0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
void main() {
    vec3 sum = texture(u_source, v_uv).rgb * W[0];
    for (int i = 1; i < 5; i++) {
        vec2 o = u_direction * float(i);
        sum += texture(u_source, v_uv + o).rgb * W[i];
        sum += texture(u_source, v_uv - o).rgb * W[i];
    }
    frag = vec4(sum, 1.0);
}
"#;

const COMPOSITE_FS: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
uniform sampler2D u_scene;
uniform sampler2D u_bloom;
uniform float u_strength;
out vec4 frag;
void main() {
    vec4 s = texture(u_scene, v_uv);
    vec3 b = texture(u_bloom, v_uv).rgb * u_strength;
    frag = vec4(s.rgb + b, max(s.a, max(b.r, max(b.g, b.b))));
}
"#;

/// Horizontal + vertical blur passes per frame.
const BLUR_ITERATIONS: usize = 2;

fn compile_shader(gl: &GL, kind: u32, src: &str) -> Result<WebGlShader, String> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| String::from("unable to create shader object"))?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(format!("shader compile failed: {}", log))
    }
}

struct Program {
    program: WebGlProgram,
    uniforms: HashMap<&'static str, WebGlUniformLocation>,
}

impl Program {
    fn new(gl: &GL, vs: &str, fs: &str, uniforms: &[&'static str]) -> Result<Self, String> {
        let vs = compile_shader(gl, GL::VERTEX_SHADER, vs)?;
        let fs = compile_shader(gl, GL::FRAGMENT_SHADER, fs)?;
        let program = gl
            .create_program()
            .ok_or_else(|| String::from("unable to create program object"))?;
        gl.attach_shader(&program, &vs);
        gl.attach_shader(&program, &fs);
        gl.link_program(&program);
        gl.delete_shader(Some(&vs));
        gl.delete_shader(Some(&fs));
        if !gl
            .get_program_parameter(&program, GL::LINK_STATUS)
            .as_bool()
            .unwrap_or(false)
        {
            return Err(format!(
                "program link failed: {}",
                gl.get_program_info_log(&program).unwrap_or_default()
            ));
        }
        // Uniforms the compiler optimized away simply have no location.
        let uniforms = uniforms
            .iter()
            .filter_map(|&name| gl.get_uniform_location(&program, name).map(|loc| (name, loc)))
            .collect();
        Ok(Self { program, uniforms })
    }

    fn loc(&self, name: &str) -> Option<&WebGlUniformLocation> {
        self.uniforms.get(name)
    }
}

struct GpuMesh {
    vao: WebGlVertexArrayObject,
    _vertices: WebGlBuffer,
    _indices: WebGlBuffer,
    count: i32,
}

impl GpuMesh {
    fn upload(gl: &GL, mesh: &MeshData) -> Result<Self, JsValue> {
        let vao = gl.create_vertex_array().ok_or("unable to create vertex array")?;
        gl.bind_vertex_array(Some(&vao));

        let vertices = gl.create_buffer().ok_or("unable to create vertex buffer")?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&vertices));
        let data = js_sys::Float32Array::from(mesh.interleaved().as_slice());
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &data, GL::STATIC_DRAW);

        let stride = (Vertex::STRIDE * 4) as i32;
        for (location, size, offset) in [(0u32, 3, 0), (1, 3, 12), (2, 2, 24)] {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(location, size, GL::FLOAT, false, stride, offset);
        }

        let indices = gl.create_buffer().ok_or("unable to create index buffer")?;
        gl.bind_buffer(GL::ELEMENT_ARRAY_BUFFER, Some(&indices));
        let data = js_sys::Uint32Array::from(mesh.indices.as_slice());
        gl.buffer_data_with_array_buffer_view(GL::ELEMENT_ARRAY_BUFFER, &data, GL::STATIC_DRAW);

        gl.bind_vertex_array(None);
        Ok(Self {
            vao,
            _vertices: vertices,
            _indices: indices,
            count: mesh.indices.len() as i32,
        })
    }
}

/// Color texture with an optional depth buffer, bound as a framebuffer.
struct Target {
    fbo: WebGlFramebuffer,
    texture: WebGlTexture,
    depth: Option<WebGlRenderbuffer>,
    width: i32,
    height: i32,
}

impl Target {
    fn new(gl: &GL, width: i32, height: i32, with_depth: bool) -> Result<Self, JsValue> {
        let texture = gl.create_texture().ok_or("unable to create texture")?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            width,
            height,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            None,
        )?;
        set_sampling(gl, GL::CLAMP_TO_EDGE);

        let fbo = gl.create_framebuffer().ok_or("unable to create framebuffer")?;
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&fbo));
        gl.framebuffer_texture_2d(GL::FRAMEBUFFER, GL::COLOR_ATTACHMENT0, GL::TEXTURE_2D, Some(&texture), 0);

        let depth = if with_depth {
            let rb = gl.create_renderbuffer().ok_or("unable to create renderbuffer")?;
            gl.bind_renderbuffer(GL::RENDERBUFFER, Some(&rb));
            gl.renderbuffer_storage(GL::RENDERBUFFER, GL::DEPTH_COMPONENT16, width, height);
            gl.framebuffer_renderbuffer(GL::FRAMEBUFFER, GL::DEPTH_ATTACHMENT, GL::RENDERBUFFER, Some(&rb));
            Some(rb)
        } else {
            None
        };

        let status = gl.check_framebuffer_status(GL::FRAMEBUFFER);
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        if status != GL::FRAMEBUFFER_COMPLETE {
            return Err(JsValue::from_str(&format!("framebuffer incomplete: 0x{:x}", status)));
        }
        Ok(Self { fbo, texture, depth, width, height })
    }

    fn bind(&self, gl: &GL) {
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&self.fbo));
        gl.viewport(0, 0, self.width, self.height);
    }

    fn delete(self, gl: &GL) {
        gl.delete_framebuffer(Some(&self.fbo));
        gl.delete_texture(Some(&self.texture));
        if let Some(rb) = &self.depth {
            gl.delete_renderbuffer(Some(rb));
        }
    }
}

/// Offscreen targets for the bloom chain: full-size scene plus two
/// half-size buffers the blur ping-pongs between.
struct BloomTargets {
    scene: Target,
    ping: Target,
    pong: Target,
}

impl BloomTargets {
    fn new(gl: &GL, width: i32, height: i32) -> Result<Self, JsValue> {
        let (hw, hh) = ((width / 2).max(1), (height / 2).max(1));
        Ok(Self {
            scene: Target::new(gl, width, height, true)?,
            ping: Target::new(gl, hw, hh, false)?,
            pong: Target::new(gl, hw, hh, false)?,
        })
    }

    fn delete(self, gl: &GL) {
        self.scene.delete(gl);
        self.ping.delete(gl);
        self.pong.delete(gl);
    }
}

fn set_sampling(gl: &GL, wrap: u32) {
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, wrap as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, wrap as i32);
}

struct Renderer {
    gl: GL,
    video: Program,
    fallback: Program,
    bright: Program,
    blur: Program,
    composite: Program,
    video_texture: WebGlTexture,
    fullscreen: WebGlVertexArrayObject,
    meshes: Vec<Vec<GpuMesh>>,
    bloom: Option<BloomTargets>,
    width: i32,
    height: i32,
}

impl Renderer {
    fn new(gl: GL, width: u32, height: u32) -> Result<Self, JsValue> {
        let video = Program::new(
            &gl,
            MESH_VS,
            VIDEO_FS,
            &[
                "u_view_proj", "u_model", "u_video", "u_brightness", "u_offset", "u_video_size",
                "u_emissive", "u_emissive_intensity",
            ],
        )?;
        let fallback = Program::new(
            &gl,
            MESH_VS,
            FALLBACK_FS,
            &[
                "u_view_proj", "u_model", "u_color", "u_emissive", "u_emissive_intensity",
                "u_ambient", "u_light_pos", "u_light_color", "u_light_intensity",
            ],
        )?;
        let bright = Program::new(&gl, FULLSCREEN_VS, BRIGHT_FS, &["u_source", "u_threshold"])?;
        let blur = Program::new(&gl, FULLSCREEN_VS, BLUR_FS, &["u_source", "u_direction"])?;
        let composite = Program::new(&gl, FULLSCREEN_VS, COMPOSITE_FS, &["u_scene", "u_bloom", "u_strength"])?;

        // 1x1 black until the first video frame arrives.
        let video_texture = gl.create_texture().ok_or("unable to create video texture")?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&video_texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            1,
            1,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            Some(&[0, 0, 0, 255]),
        )?;
        // The scroll offset walks past 1.0 in UV space, so the texture must repeat.
        set_sampling(&gl, GL::REPEAT);

        let fullscreen = gl.create_vertex_array().ok_or("unable to create vertex array")?;

        Ok(Self {
            gl,
            video,
            fallback,
            bright,
            blur,
            composite,
            video_texture,
            fullscreen,
            meshes: Vec::new(),
            bloom: None,
            width: width as i32,
            height: height as i32,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1) as i32;
        self.height = height.max(1) as i32;
        if let Some(bloom) = self.bloom.take() {
            bloom.delete(&self.gl);
        }
    }

    /// Upload geometry for models added since the last frame.
    fn sync_models(&mut self, app: &App) -> Result<(), JsValue> {
        for model in app.models().iter().skip(self.meshes.len()) {
            let gpu = model
                .meshes
                .iter()
                .map(|m| GpuMesh::upload(&self.gl, &m.data))
                .collect::<Result<Vec<_>, _>>()?;
            self.meshes.push(gpu);
        }
        Ok(())
    }

    fn upload_video_frame(&self, video: &VideoSource) -> Result<(), JsValue> {
        if !video.has_frame() {
            return Ok(());
        }
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.video_texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        let result = gl.tex_image_2d_with_u32_and_u32_and_html_video_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            video.element(),
        );
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        result
    }

    fn draw(&mut self, app: &App, video: &VideoSource) -> Result<(), JsValue> {
        self.upload_video_frame(video)?;

        let strength = app.bloom_strength();
        if strength <= 0.0 {
            self.gl.bind_framebuffer(GL::FRAMEBUFFER, None);
            self.gl.viewport(0, 0, self.width, self.height);
            self.draw_scene(app);
            return Ok(());
        }

        if self.bloom.is_none() {
            self.bloom = Some(BloomTargets::new(&self.gl, self.width, self.height)?);
        }
        let Some(bloom) = self.bloom.as_ref() else {
            return Ok(());
        };
        let gl = &self.gl;
        let config = &app.config().bloom;

        bloom.scene.bind(gl);
        self.draw_scene(app);

        gl.disable(GL::DEPTH_TEST);
        gl.bind_vertex_array(Some(&self.fullscreen));
        gl.active_texture(GL::TEXTURE0);

        bloom.ping.bind(gl);
        gl.use_program(Some(&self.bright.program));
        gl.bind_texture(GL::TEXTURE_2D, Some(&bloom.scene.texture));
        gl.uniform1i(self.bright.loc("u_source"), 0);
        gl.uniform1f(self.bright.loc("u_threshold"), config.threshold);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        gl.use_program(Some(&self.blur.program));
        gl.uniform1i(self.blur.loc("u_source"), 0);
        let texel_x = config.radius / bloom.ping.width as f32;
        let texel_y = config.radius / bloom.ping.height as f32;
        for _ in 0..BLUR_ITERATIONS {
            bloom.pong.bind(gl);
            gl.bind_texture(GL::TEXTURE_2D, Some(&bloom.ping.texture));
            gl.uniform2f(self.blur.loc("u_direction"), texel_x, 0.0);
            gl.draw_arrays(GL::TRIANGLES, 0, 3);

            bloom.ping.bind(gl);
            gl.bind_texture(GL::TEXTURE_2D, Some(&bloom.pong.texture));
            gl.uniform2f(self.blur.loc("u_direction"), 0.0, texel_y);
            gl.draw_arrays(GL::TRIANGLES, 0, 3);
        }

        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        gl.viewport(0, 0, self.width, self.height);
        gl.use_program(Some(&self.composite.program));
        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&bloom.scene.texture));
        gl.active_texture(GL::TEXTURE1);
        gl.bind_texture(GL::TEXTURE_2D, Some(&bloom.ping.texture));
        gl.uniform1i(self.composite.loc("u_scene"), 0);
        gl.uniform1i(self.composite.loc("u_bloom"), 1);
        gl.uniform1f(self.composite.loc("u_strength"), strength);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.draw_arrays(GL::TRIANGLES, 0, 3);

        gl.active_texture(GL::TEXTURE0);
        gl.bind_vertex_array(None);
        Ok(())
    }

    /// Draw every model into the currently bound framebuffer.
    fn draw_scene(&self, app: &App) {
        let gl = &self.gl;
        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
        gl.enable(GL::DEPTH_TEST);

        let view_proj = app.camera().view_projection().to_cols_array();
        let shared = app.material();
        let fallback = app.fallback();
        let lights = &app.config().material;

        for (model, meshes) in app.models().iter().zip(&self.meshes) {
            let program = match model.material {
                MaterialRef::Video => {
                    let p = &self.video;
                    gl.use_program(Some(&p.program));
                    gl.active_texture(GL::TEXTURE0);
                    gl.bind_texture(GL::TEXTURE_2D, Some(&self.video_texture));
                    gl.uniform1i(p.loc("u_video"), 0);
                    gl.uniform1f(p.loc("u_brightness"), shared.brightness);
                    gl.uniform2f(p.loc("u_offset"), shared.uv_offset.x, shared.uv_offset.y);
                    gl.uniform2f(p.loc("u_video_size"), shared.video_size.x, shared.video_size.y);
                    gl.uniform3fv_with_f32_array(p.loc("u_emissive"), &shared.emissive.0);
                    gl.uniform1f(p.loc("u_emissive_intensity"), shared.emissive_intensity);
                    p
                }
                MaterialRef::Fallback => {
                    let p = &self.fallback;
                    gl.use_program(Some(&p.program));
                    gl.uniform3fv_with_f32_array(p.loc("u_color"), &fallback.color.0);
                    gl.uniform3fv_with_f32_array(p.loc("u_emissive"), &fallback.emissive.0);
                    gl.uniform1f(p.loc("u_emissive_intensity"), fallback.emissive_intensity);
                    gl.uniform1f(p.loc("u_ambient"), lights.ambient);
                    gl.uniform3fv_with_f32_array(p.loc("u_light_pos"), &lights.light_position);
                    gl.uniform3fv_with_f32_array(p.loc("u_light_color"), &lights.light_color.0);
                    gl.uniform1f(p.loc("u_light_intensity"), lights.light_intensity);
                    p
                }
            };
            gl.uniform_matrix4fv_with_f32_array(program.loc("u_view_proj"), false, &view_proj);

            for (world, gpu) in model.mesh_matrices().zip(meshes) {
                gl.uniform_matrix4fv_with_f32_array(program.loc("u_model"), false, &world.to_cols_array());
                gl.bind_vertex_array(Some(&gpu.vao));
                gl.draw_elements_with_i32(GL::TRIANGLES, gpu.count, GL::UNSIGNED_INT, 0);
            }
        }
        gl.bind_vertex_array(None);
    }
}

fn apply_effect(effect: Effect, video: &VideoSource, panel: &Panel, renderer: &mut Renderer) {
    match effect {
        Effect::Video(command) => video.apply(&command),
        Effect::Viewport { width, height } => renderer.resize(width, height),
        other => {
            if let Err(e) = panel.apply(&other) {
                log::warn!("panel update failed: {:?}", e);
            }
        }
    }
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    let Some(win) = window() else { return };
    if let Err(e) = win.request_animation_frame(f.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", e);
    }
}

/// Set up GL and run the frame loop: drain events, apply effects, tick, draw.
pub fn start(
    canvas: HtmlCanvasElement,
    mut app: App,
    queue: EventQueue,
    video: VideoSource,
    panel: Panel,
) -> Result<(), JsValue> {
    let gl: GL = canvas
        .get_context("webgl2")?
        .ok_or("WebGL2 not supported")?
        .dyn_into()?;
    let mut renderer = Renderer::new(gl, canvas.width(), canvas.height())?;

    for effect in app.startup_effects() {
        apply_effect(effect, &video, &panel, &mut renderer);
    }

    // The frame closure re-registers itself through `f`.
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let mut last_error: Option<String> = None;
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        for event in queue.drain() {
            for effect in app.handle(event) {
                apply_effect(effect, &video, &panel, &mut renderer);
            }
        }

        app.tick();
        let result = renderer
            .sync_models(&app)
            .and_then(|_| renderer.draw(&app, &video));
        match result {
            Ok(()) => last_error = None,
            Err(e) => {
                let msg = format!("{:?}", e);
                if last_error.as_deref() != Some(msg.as_str()) {
                    log::error!("frame failed: {}", msg);
                }
                last_error = Some(msg);
            }
        }

        if let Some(cb) = f.borrow().as_ref() {
            request_animation_frame(cb);
        }
    }) as Box<dyn FnMut()>));

    if let Some(cb) = g.borrow().as_ref() {
        request_animation_frame(cb);
    }
    Ok(())
}
