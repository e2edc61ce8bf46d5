use waitlist::{config::try_init_config, App, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // We have a different logging mechanism for production
    #[cfg(not(debug_assertions))]
    {
        waitlist::init_production_tracing()
    }
    #[cfg(debug_assertions)]
    {
        waitlist::init_dbg_tracing();
    }

    let config = try_init_config()?;
    let app = App::build_from_config(config).await?;

    waitlist::serve(app).await?;

    Ok(())
}
