pub mod config;
pub mod countdown;
pub mod http_client;
pub mod leaderboard;
pub mod matrix;
pub mod provider;
pub mod range;
pub mod scores;
pub mod scorigami_fetch;
pub mod state;
