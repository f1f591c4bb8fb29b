mod access;
mod app;
mod cli;
mod config;
mod error;
mod input;
mod inventory;
mod model;
mod playtime;
mod render;
mod sim;
mod storage;
mod ticker;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    cli::run(cli::Cli::parse())
}
