use pokodoro_core::Config;

use super::open_session;

pub fn run(user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let generator = config.build_generator()?;
    let session = open_session(&config, user, generator)?;
    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}
