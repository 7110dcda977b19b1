pub mod reconciliation;
pub mod seeding;
