pub mod evaluator;
pub mod openai;
pub mod source;

pub use evaluator::{Completion, EvaluationRequest, Evaluator, FakeEvaluator, Usage};
pub use source::{FixtureSource, ResponseSource};
