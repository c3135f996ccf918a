//! `vmbeacon advertise`: publish a debug session until Ctrl-C.

use std::sync::Arc;

use clap::Args;
use tracing::info;
use vmbeacon_discover::{
    AdvertiseOutcome, Advertiser, CiBotDetector, DiscoveryConfig, StaticDevice, StaticVersions,
    ZeroconfTransport,
};

#[derive(Args, Debug)]
pub struct AdvertiseArgs {
    /// Application (project) name to advertise under
    #[arg(long)]
    pub app_name: String,

    /// VM service URI, published verbatim
    #[arg(long)]
    pub vm_service_uri: Option<String>,

    /// Dev Tools Daemon URI
    #[arg(long)]
    pub dtd_uri: Option<String>,

    /// Device name (defaults to this machine's hostname)
    #[arg(long)]
    pub device_name: Option<String>,

    /// Device id (defaults to this machine's hostname)
    #[arg(long)]
    pub device_id: Option<String>,

    /// Target platform (defaults to this machine's OS)
    #[arg(long)]
    pub target_platform: Option<String>,

    /// Build mode
    #[arg(long, default_value = "debug")]
    pub mode: String,

    /// Framework version string
    #[arg(long, default_value = "unknown")]
    pub flutter_version: String,

    /// SDK version string
    #[arg(long, default_value = "unknown")]
    pub dart_version: String,

    /// Disable local discovery regardless of configuration
    #[arg(long)]
    pub no_local_discovery: bool,
}

impl AdvertiseArgs {
    fn device(&self) -> StaticDevice {
        let host = StaticDevice::host();
        StaticDevice::new(
            self.device_name.clone().unwrap_or(host.name),
            self.device_id.clone().unwrap_or(host.id),
            self.target_platform.clone().unwrap_or(host.target_platform),
        )
    }
}

pub async fn run(args: AdvertiseArgs, config: &DiscoveryConfig) -> anyhow::Result<()> {
    let enable_local_discovery = config.enable_local_discovery && !args.no_local_discovery;

    let mut advertiser = Advertiser::new(
        Arc::new(CiBotDetector::new()),
        Arc::new(ZeroconfTransport::new()),
        Arc::new(args.device()),
        Arc::new(StaticVersions::new(
            args.flutter_version.as_str(),
            args.dart_version.as_str(),
        )),
    )
    .with_local_discovery(enable_local_discovery)
    .with_mode(args.mode.as_str());

    let outcome = advertiser
        .advertise(
            &args.app_name,
            args.vm_service_uri.as_deref(),
            args.dtd_uri.as_deref(),
        )
        .await?;

    match outcome {
        AdvertiseOutcome::Advertising(record) => {
            println!("Advertising {record}");
            println!("Press Ctrl-C to stop.");
            tokio::signal::ctrl_c().await?;
            info!(app_name = %args.app_name, "Interrupted; stopping advertisement");
            advertiser.stop().await;
        }
        AdvertiseOutcome::Suppressed(reason) => println!("Not advertising: {reason}"),
        AdvertiseOutcome::NoVmService => {
            println!("Not advertising: no VM service URI given.")
        }
        AdvertiseOutcome::Failed(error) => println!("Not advertising: {error}"),
    }

    Ok(())
}
