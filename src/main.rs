//! Host-side helper: `cargo run` builds the WASM bundle into `static/pkg`
//! and serves `static/` on a local HTTP port (`NEON_PORT`, default 8000).

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::process::{Command, Stdio};
    use std::{env, thread, time::Duration};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = env::var("NEON_PORT").unwrap_or_else(|_| "8000".to_string());
    if port.parse::<u16>().is_err() {
        log::error!("NEON_PORT={} is not a valid port", port);
        std::process::exit(2);
    }

    log::info!("building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(st) => {
            log::error!("wasm-pack exited with {}", st);
            std::process::exit(1);
        }
        Err(e) => {
            log::warn!("wasm-pack not runnable ({}); serving whatever is already in static/pkg", e);
        }
    }

    log::info!("serving static/ at http://127.0.0.1:{}", port);
    let mut server = match Command::new("python3")
        .args(["-m", "http.server", &port, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            log::error!("failed to start http server: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        match server.try_wait() {
            Ok(Some(status)) => {
                log::error!("http server exited with {}", status);
                std::process::exit(1);
            }
            Ok(None) => thread::sleep(Duration::from_secs(1)),
            Err(e) => {
                log::error!("lost track of http server: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
