use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, mail::Mailer, payments::PaymentGateway};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
}
