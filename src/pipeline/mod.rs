pub mod stage1_prepare;
pub mod stage2_model;
pub mod stage3_score;
