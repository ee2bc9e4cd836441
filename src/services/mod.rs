pub mod progression;
pub mod quest;
pub mod scoring;
pub mod streaks;
pub mod validator;
