use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::Storefront;
use crate::Result;

impl Storefront {
    pub async fn reap_carts(&self) -> Result<u64> { self.reap_carts_at(Utc::now()).await }

    /// Deletes carts that expired, were marked abandoned/expired, or went
    /// untouched for the stale window. The delete is one conditional statement,
    /// so a cart saved after the sweep read it fails its version check and is
    /// recreated instead of silently resurrecting deleted state.
    pub async fn reap_carts_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let deleted = self.carts.delete_reapable(now, now - self.settings.cart_stale_after).await?;
        if deleted > 0 { info!(deleted, "Reaped carts"); }
        Ok(deleted)
    }
}

/// Runs the cart sweep every `every`, starting immediately.
pub fn spawn_reaper(storefront: Arc<Storefront>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = storefront.reap_carts().await {
                error!(error = %e, "Cart sweep failed");
            }
        }
    })
}
