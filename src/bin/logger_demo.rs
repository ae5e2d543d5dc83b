use rotor::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "rotor=trace,warn".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!(principal_id = "00000000-0000-0000-0000-000000000000", "application trace log");
    debug!("application debug log");
    warn!(reason = "demo", "refresh rejected");

    Ok(())
}
