mod clean;
mod generate;
mod run;

pub use clean::cmd_clean;
pub use generate::cmd_generate;
pub use run::cmd_run;
