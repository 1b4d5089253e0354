pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod gamification;
pub mod lessons;
pub mod modules;
pub mod progress;
pub mod quizzes;
pub mod reactions;
pub mod subscriptions;
