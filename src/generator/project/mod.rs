mod generate;

pub use generate::{
    default_policy, generate, generate_from_table, plan_artifacts, GenerationReport, RunOptions,
};
