use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{constants::MAX_SUBMITTED_ECHOES, models::DisplayGame};

/// Echoes of confirmed submissions shown until the registry read catches up.
/// Every change happens under one write guard; the oldest echoes are dropped
/// past `capacity`.
#[derive(Clone)]
pub struct SubmittedGameCache {
    games: Arc<RwLock<Vec<DisplayGame>>>,
    capacity: usize,
}

impl Default for SubmittedGameCache {
    fn default() -> Self {
        Self::with_capacity(MAX_SUBMITTED_ECHOES)
    }
}

impl SubmittedGameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            games: Arc::new(RwLock::new(Vec::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn snapshot(&self) -> Vec<DisplayGame> {
        self.games.read().await.clone()
    }

    /// Adds an echo, replacing an older one with the same slug.
    pub async fn record(&self, game: DisplayGame) {
        let mut games = self.games.write().await;
        games.retain(|existing| existing.slug != game.slug);
        games.push(game);
        if games.len() > self.capacity {
            let overflow = games.len() - self.capacity;
            games.drain(..overflow);
        }
    }

    /// Drops every echo once the canonical registry read has returned data.
    pub async fn invalidate(&self) {
        let mut games = self.games.write().await;
        if !games.is_empty() {
            tracing::info!("Clearing {} submitted-game echoes", games.len());
            games.clear();
        }
    }

    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }
}
