pub mod resume_score;
