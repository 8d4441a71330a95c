pub mod draw_participants;
pub mod draws;

pub use draw_participants as draw_participant_entity;
pub use draws as draw_entity;
pub use draws::{DrawStatus, DrawType};
