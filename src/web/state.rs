use crate::model::ModelManager;

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
}

impl AppState {
    pub fn new(mm: ModelManager) -> Self {
        Self { mm }
    }

    /// Model manager shared by every handler.
    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }
}
