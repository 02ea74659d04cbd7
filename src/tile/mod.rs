pub mod descriptor;
pub mod spec;
