pub mod engine;
pub mod event;
pub mod history;
pub mod level;
pub mod progress;
pub mod session;
pub mod win;
