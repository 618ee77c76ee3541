//! mlcache simulator binary.

mod cli;
mod sim;

fn main() -> eyre::Result<()> {
    cli::run()
}
