mod common;

mod bulk;
mod health;
