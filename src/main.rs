use bgx_ripper::cli::Cli;
use bgx_ripper::domain::settings::SettingsService;
use bgx_ripper::domain::target::load_target_spec;
use bgx_ripper::infrastructure::bluetooth::btle::BtleplugHost;
use bgx_ripper::infrastructure::bluetooth::service::failure_event;
use bgx_ripper::infrastructure::bluetooth::AcquisitionPipeline;
use bgx_ripper::infrastructure::logging::init_logger;
use bgx_ripper::presentation::console::spawn_console;
use bgx_ripper::presentation::theme::BANNER;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();
    println!("{}", BANNER);

    let settings_service = SettingsService::new();
    let settings = settings_service.get().clone();
    let _log_guard = init_logger(&settings.log_settings, args.verbose)?;
    if let Some(path) = settings_service.path() {
        debug!(path = %path.display(), "Settings location");
    }

    let target = match load_target_spec(&args.config_file) {
        Ok(target) => target,
        Err(e) => {
            println!("{}", e);
            return Ok(ExitCode::from(1));
        }
    };
    let timing = args.timing();
    info!(address = %target.device_address, service = %target.service_uuid, "Configuration loaded");

    let stack = match BtleplugHost::new(timing.connection_timeout).await {
        Ok(stack) => Arc::new(stack),
        Err(e) => {
            println!("Bluetooth unavailable: {}", e);
            return Ok(ExitCode::from(1));
        }
    };

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C");
            interrupt.cancel();
        }
    });

    let (event_sender, events) = mpsc::unbounded_channel();
    let console = spawn_console(events);

    let pipeline =
        AcquisitionPipeline::new(stack, event_sender.clone(), token).with_settings(&settings);
    if let Err(e) = pipeline.run(&target, &timing).await {
        info!(error = %e, "Run ended early");
        let _ = event_sender.send(failure_event(&e));
    }

    // Console exits once every sender is gone.
    drop(pipeline);
    drop(event_sender);
    console.await?;

    Ok(ExitCode::SUCCESS)
}
