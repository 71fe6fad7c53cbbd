use clap::Parser;
use macroquad::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use water_bucket::config::Args;
use water_bucket::gameplay::GameEngine;
use water_bucket::model::ControlAction;

fn window_conf() -> Conf {
    Conf {
        window_title: "Water Bucket Puzzle".to_string(),
        window_width: 1100,
        window_height: 800,
        window_resizable: false,
        ..Default::default()
    }
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let session = match args.build_session() {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "could not set up the puzzle");
            eprintln!("water-bucket: {err}");
            std::process::exit(2);
        }
    };
    info!(goal = session.get_goal(), difficulty = ?session.get_difficulty(), "starting");

    macroquad::Window::from_config(window_conf(), async move {
        let mut engine = GameEngine::new(session);
        loop {
            engine.render();
            if is_mouse_button_pressed(MouseButton::Left) {
                let (x, y) = mouse_position();
                engine.handle_click(x, y);
            }
            if is_key_pressed(KeyCode::Escape) {
                engine.handle_game_action(ControlAction::Dismiss);
            }
            next_frame().await;
        }
    });
}
