use log::info;
use timetable_solver::{Catalogue, Config, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!("Starting with {:?}", config);

    let catalogue = Catalogue::from_path(&config.data_path)?;
    run_server(config, catalogue).await?;

    Ok(())
}
