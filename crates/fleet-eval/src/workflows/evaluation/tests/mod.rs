mod common;
mod guard;
