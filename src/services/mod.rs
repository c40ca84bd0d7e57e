pub mod credentials;
pub mod demos;
pub mod seeding;
