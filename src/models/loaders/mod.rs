pub mod toml_loader;

pub use toml_loader::{load_all_question_banks, load_question_bank};
