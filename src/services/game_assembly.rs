use std::sync::Arc;

use futures_util::future::join_all;

use crate::{
    constants::{DEFAULT_BUTTON, DEFAULT_STATUS, DEFAULT_XP, PLACEHOLDER_IMAGE},
    integrations::MetadataSource,
    models::{DecodedGame, DisplayGame, GameMetadata},
};

/// Lowercases `name` and turns every run of whitespace into one hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
        } else {
            slug.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    slug
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// `metadata.name`, then `metadata.projectName`, then the on-chain name.
pub fn preferred_name<'a>(metadata: &'a GameMetadata, chain_name: &'a str) -> &'a str {
    non_empty(metadata.name.as_deref())
        .or_else(|| non_empty(metadata.project_name.as_deref()))
        .unwrap_or(chain_name)
}

/// Merges an on-chain record with its metadata document.
pub fn display_game(game: &DecodedGame, metadata: GameMetadata) -> DisplayGame {
    let title = preferred_name(&metadata, &game.name).to_string();
    let or_default = |value: Option<String>, default: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    DisplayGame {
        slug: slugify(&title),
        title,
        description: metadata.description,
        image: or_default(metadata.logo_url, PLACEHOLDER_IMAGE),
        status: or_default(metadata.status, DEFAULT_STATUS),
        xp: or_default(metadata.xp, DEFAULT_XP),
        button: or_default(metadata.button, DEFAULT_BUTTON),
        website_url: metadata.website_url,
        genre: metadata.genre,
        platforms: metadata.platforms.unwrap_or_default(),
        release_date: metadata.release_date,
        video_url: metadata.video_url,
        developer: Some(game.developer.clone()).filter(|d| !d.is_empty()),
        submitted_at: game.submitted_at.clone(),
        kind: Some(game.kind()),
        metadata_ipfs_hash: Some(game.metadata_ipfs_hash.clone()),
        tx_digest: None,
    }
}

fn static_game(
    title: &str,
    slug: &str,
    description: &str,
    image: &str,
    status: &str,
    xp: &str,
    button: &str,
) -> DisplayGame {
    DisplayGame {
        slug: slug.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        image: image.to_string(),
        status: status.to_string(),
        xp: xp.to_string(),
        button: button.to_string(),
        website_url: Some(format!("/games/{}", slug)),
        genre: None,
        platforms: Vec::new(),
        release_date: None,
        video_url: None,
        developer: None,
        submitted_at: None,
        kind: None,
        metadata_ipfs_hash: None,
        tx_digest: None,
    }
}

/// Demo listings always shown after real data.
pub fn static_games() -> Vec<DisplayGame> {
    const CLASH: &str = "In a world where strength is everything, challengers rise for glory. Master your skills, and clash to claim your place among legends.";
    vec![
        static_game(
            "Cosmic Clash",
            "cosmic-clash",
            CLASH,
            "/images/game1.jpg",
            "Open",
            "1500 XP",
            "Join Test",
        ),
        static_game(
            "Mystic Realms",
            "mystic-realms",
            "Step into a living world where every choice shapes your destiny. Forge alliances, battle powerful foes, and uncover ancient secrets in a land on the brink of chaos.",
            "/images/game2.jpg",
            "In progress",
            "1500 XP",
            "Give Feedback",
        ),
        static_game(
            "Cyberpunk Battle",
            "cyberpunk-battle",
            "The future is war. Enter a world of high-tech combat, bold heroes, and endless battles for supremacy.",
            "/images/game3.jpg",
            "Closed",
            "1,000 88T Tokens",
            "Closed",
        ),
        static_game(
            "Galactic Conquest",
            "galactic-conquest",
            CLASH,
            "/images/game4.jpg",
            "Open",
            "1500 XP",
            "Join Test",
        ),
    ]
}

/// On-chain games, then echoes of local submissions the registry does not
/// show yet, then the static listings.
pub fn discovery_list(onchain: Vec<DisplayGame>, echoes: Vec<DisplayGame>) -> Vec<DisplayGame> {
    let mut games = onchain;
    for echo in echoes {
        if !games.iter().any(|g| g.slug == echo.slug) {
            games.push(echo);
        }
    }
    games.extend(static_games());
    games
}

/// Joins decoded registry entries with their IPFS metadata.
#[derive(Clone)]
pub struct GameAssembler {
    metadata: Arc<dyn MetadataSource>,
}

impl GameAssembler {
    pub fn new(metadata: Arc<dyn MetadataSource>) -> Self {
        Self { metadata }
    }

    /// Fetches every metadata document concurrently and keeps on-chain order.
    /// Games without metadata are dropped.
    pub async fn assemble(&self, games: &[DecodedGame]) -> Vec<DisplayGame> {
        let fetches = games
            .iter()
            .map(|game| self.metadata.fetch_metadata(&game.metadata_ipfs_hash));
        let documents = join_all(fetches).await;

        let assembled: Vec<DisplayGame> = games
            .iter()
            .zip(documents)
            .filter_map(|(game, metadata)| match metadata {
                Some(metadata) => Some(display_game(game, metadata)),
                None => {
                    tracing::debug!("Dropping '{}': no metadata", game.name);
                    None
                }
            })
            .collect();

        tracing::info!("Assembled {} of {} on-chain games", assembled.len(), games.len());
        assembled
    }

    /// First on-chain game whose slug matches. Documents are fetched one at a
    /// time and the scan stops at the first hit.
    pub async fn find_by_slug(&self, games: &[DecodedGame], slug: &str) -> Option<DisplayGame> {
        for game in games {
            let Some(metadata) = self.metadata.fetch_metadata(&game.metadata_ipfs_hash).await else {
                continue;
            };
            let candidate = display_game(game, metadata);
            if candidate.slug == slug {
                return Some(candidate);
            }
        }
        None
    }
}
