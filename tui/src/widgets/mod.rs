//! Custom widgets for the game surface

pub mod dialogue_box;
pub mod room;
pub mod title;

pub use dialogue_box::DialogueBox;
pub use room::{RoomScale, RoomView};
pub use title::TitleCard;
