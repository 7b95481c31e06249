fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Catalog fetches and file dialogs run on this runtime.
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    power_lora_loader::run_app()?;
    Ok(())
}
