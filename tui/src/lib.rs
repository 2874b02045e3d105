//! ollama-vision TUI
//!
//! Full-screen terminal surface with two tabs:
//!
//! - **Prompt**: free-form chat with an optional system instruction
//! - **Vision**: point a vision model at an image on disk
//!
//! The surface is a thin client over `vision-core`: it validates input,
//! starts requests in per-tab runner slots, and drains runner events
//! once per frame. The UI thread never blocks on the network.

pub mod app;
pub mod ui;

pub use app::App;
