use std::sync::Arc;

use crate::FireberryMcpServer;

#[derive(Clone)]
pub struct AppState {
    pub server: Arc<FireberryMcpServer>,
}
