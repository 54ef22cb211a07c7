use std::sync::Arc;
use tokio::sync::RwLock;

/// Single slot holding the last saved program.
#[derive(Clone, Default)]
pub struct ProgramStore {
    program: Arc<RwLock<String>>,
}

impl ProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> String {
        self.program.read().await.clone()
    }

    pub async fn save(&self, program: String) {
        let mut slot = self.program.write().await;
        *slot = program;
        log::info!("Program saved (length): {}", slot.chars().count());
    }
}
