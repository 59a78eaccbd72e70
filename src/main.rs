mod app;
mod settings;

use crate::app::App;
use crate::settings::{SETTINGS_FILE, Settings, ThemeStore};
use vitrine_runtime::Graphics;
use winit::event_loop::EventLoop;

fn run_app(event_loop: EventLoop<Graphics>, mut app: App) -> anyhow::Result<()> {
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = Settings::load_or_default(SETTINGS_FILE);
    let themes = ThemeStore::load(settings.state_path());

    let event_loop = EventLoop::<Graphics>::with_user_event().build()?;
    let app = App::new(&event_loop, settings, themes);
    run_app(event_loop, app)
}
