//! In-process call surface for the embedding app shell

pub mod adherence;
pub mod diary;
pub mod diet_plans;
pub mod onboarding;
