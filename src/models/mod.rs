pub mod board;
pub mod loaders;
pub mod mock;
pub mod question;

pub use board::Board;
pub use loaders::{load_all_question_banks, load_question_bank};
pub use mock::{MockExam, MockKind};
pub use question::{Question, QuestionBank};
