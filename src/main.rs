use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use cursorlink::App;
use cursorlink::engine::CommandBatch;
use cursorlink::headless::{self, HeadlessGui};
use cursorlink::host::{EngineTransport, TransportError};
use cursorlink::model::config::AppConfig;
use cursorlink::model::mode::ModeState;
use cursorlink::msg::Msg;
use cursorlink::replay::{self, Scene, Script};

fn main() -> Result<()> {
    let script_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: cursorlink <script.toml>"))?;

    let config = AppConfig::load()?;

    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "cursorlink")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("cursorlink"));
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "cursorlink.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::new(&config.log.filter))
        .init();

    tracing::info!("cursorlink starting");

    let script = Script::load(&script_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(config, script));

    if let Err(e) = &result {
        tracing::error!("replay failed: {e:?}");
    }
    result
}

/// Prints each batch as one JSON line.
struct StdoutTransport;

#[async_trait]
impl EngineTransport for StdoutTransport {
    async fn send_batch(&self, batch: CommandBatch) -> Result<(), TransportError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", batch.to_wire())?;
        out.flush()?;
        Ok(())
    }
}

async fn run(config: AppConfig, script: Script) -> Result<()> {
    let gui = Arc::new(HeadlessGui::new());
    let scene = script.build(&gui)?;
    let actions = script.actions(&scene)?;

    let modes = Arc::new(ModeState::new());
    let host = headless::collaborators(gui.clone(), modes.clone(), Arc::new(StdoutTransport));
    let mut app = App::new(config, host, modes);

    let (tx, mut rx) = mpsc::unbounded_channel::<Msg>();
    replay::spawn_driver(actions, gui.clone(), tx);
    app.run(&mut rx).await?;

    app.shutdown().await;
    print_final_state(&gui, &scene);
    Ok(())
}

fn print_final_state(gui: &HeadlessGui, scene: &Scene) {
    for (index, editor) in scene.editors.iter().enumerate() {
        let Some(view) = gui.editor(*editor) else {
            println!("editor {index}: closed");
            continue;
        };
        let selections: Vec<String> = view
            .selections
            .iter()
            .map(|sel| {
                format!(
                    "{}:{}-{}:{}",
                    sel.anchor.line, sel.anchor.character, sel.active.line, sel.active.character
                )
            })
            .collect();
        let reveal = view
            .last_reveal
            .map(|(_, reveal)| format!("{reveal:?}"))
            .unwrap_or_else(|| "-".to_string());
        let shape = view.cursor_shape.map(|s| s.label()).unwrap_or("-");
        println!(
            "editor {index}: selections [{}] reveal {reveal} cursor {shape}",
            selections.join(", ")
        );
    }
}
