use vergen::{
    vergen,
    Config,
};

fn main() -> anyhow::Result<()> {
    if let Err(e) = vergen(Config::default()) {
        eprintln!("vergen failed: {}", e);
    }

    Ok(())
}
