pub mod translate;
pub mod detect;
pub mod batch;
