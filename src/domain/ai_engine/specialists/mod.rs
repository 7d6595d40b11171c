//! Domain specialists.

mod fitness;
mod goal;
mod task;
mod technical;

pub use fitness::FitnessSpecialist;
pub use goal::GoalSpecialist;
pub use task::TaskSpecialist;
pub use technical::TechnicalSpecialist;
