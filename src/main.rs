use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = katal::cli::parse();
    app::run(args)
}
