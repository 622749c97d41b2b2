// src/models/mod.rs

pub mod course;
pub mod practice;
pub mod topic;
pub mod user;
