mod common;
mod transition;
