pub mod config;
pub mod flat;
pub mod hash;
pub mod info;
pub mod match_cmd;
pub mod run;
pub mod scale;
pub mod stack;
