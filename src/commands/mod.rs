pub mod completion;
pub mod defaults;
pub mod run;
