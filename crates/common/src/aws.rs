use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, SdkConfig};

/// Shared AWS configuration for every SDK client of the process.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(aws_config::Region::new(region.to_string()));

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}
