pub mod conversation;
pub mod game_save;
pub mod message;
pub mod player;
pub mod scene;
