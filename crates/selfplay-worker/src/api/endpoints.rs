//! Coordinator endpoint URL builders

/// Build next-game URL
pub fn next_game_url(base_url: &str) -> String {
    format!("{}/next_game", base_url.trim_end_matches('/'))
}

/// Build network download URL
pub fn get_network_url(base_url: &str, sha: &str) -> String {
    format!("{}/get_network?sha={}", base_url.trim_end_matches('/'), sha)
}

/// Build training-game upload URL
pub fn upload_game_url(base_url: &str) -> String {
    format!("{}/upload_game", base_url.trim_end_matches('/'))
}

/// Build match result URL
pub fn match_result_url(base_url: &str) -> String {
    format!("{}/match_result", base_url.trim_end_matches('/'))
}
