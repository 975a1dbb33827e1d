use crate::cli::run;

pub mod assets;
pub mod cli;
pub mod config;
pub mod domain;
pub mod game;
pub mod host;
pub mod http;
pub mod library;
pub mod media;
pub mod player;
pub mod suggest;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run()
}
