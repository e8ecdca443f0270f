use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    clock::Clock, config::AppConfig, db::OrmConn, pricing::PricingEngine,
    provider::PaymentProvider,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub clock: Arc<dyn Clock>,
    pub pricing: Arc<dyn PricingEngine>,
    pub provider: Arc<dyn PaymentProvider>,
    pub config: AppConfig,
}

impl AppState {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
