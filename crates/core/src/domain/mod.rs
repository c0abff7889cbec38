pub mod answers;
pub mod estimate;
pub mod lead;
pub mod submission;
pub mod tier;
