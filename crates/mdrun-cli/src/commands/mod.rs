pub mod data;
pub mod inspect;
pub mod run;
