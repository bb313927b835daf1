mod common;
mod dependency;
mod variables;
