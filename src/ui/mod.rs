pub mod app;
mod board;
mod hud;
mod state;
