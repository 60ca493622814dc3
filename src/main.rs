mod app;
mod config;
mod debug;
mod heat;
mod input;
mod palette;
mod render;
mod rng;
mod sim;
mod spark;

fn main() {
    env_logger::init();
    log::info!("Fire Demo starting up");

    if let Err(e) = app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
