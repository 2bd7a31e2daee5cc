use std::time::Duration;

use appdeck_application::{ApiSubmitGateway, ApiSubmitRequest};
use appdeck_core::{AppError, AppResult};
use async_trait::async_trait;
use tracing::debug;

/// Preview gateway that never touches the network.
///
/// Each submission succeeds with the configured probability after an optional
/// artificial latency.
#[derive(Debug, Clone)]
pub struct SimulatedApiSubmitGateway {
    success_percent: u8,
    latency: Duration,
}

impl SimulatedApiSubmitGateway {
    /// Creates a simulated gateway. Percentages above 100 are clamped.
    #[must_use]
    pub fn new(success_percent: u8, latency_ms: u64) -> Self {
        Self {
            success_percent: success_percent.min(100),
            latency: Duration::from_millis(latency_ms),
        }
    }

    /// Creates a gateway whose submissions always succeed.
    #[must_use]
    pub fn always_succeeding() -> Self {
        Self::new(100, 0)
    }

    fn roll_succeeds(&self) -> AppResult<bool> {
        match self.success_percent {
            0 => return Ok(false),
            100 => return Ok(true),
            _ => {}
        }

        let mut bytes = [0_u8; 4];
        getrandom::fill(&mut bytes).map_err(|error| {
            AppError::Internal(format!("failed to draw simulated submit outcome: {error}"))
        })?;
        let roll = u32::from_le_bytes(bytes) % 100;
        Ok(roll < u32::from(self.success_percent))
    }
}

impl Default for SimulatedApiSubmitGateway {
    fn default() -> Self {
        Self::new(80, 0)
    }
}

#[async_trait]
impl ApiSubmitGateway for SimulatedApiSubmitGateway {
    async fn submit(&self, request: ApiSubmitRequest) -> AppResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let succeeded = self.roll_succeeds()?;
        debug!(
            endpoint = %request.endpoint,
            method = %request.method,
            fields = request.fields.len(),
            succeeded,
            "simulated api submit"
        );

        if succeeded {
            Ok(())
        } else {
            Err(AppError::Internal(format!(
                "simulated failure for '{}'",
                request.endpoint
            )))
        }
    }
}
