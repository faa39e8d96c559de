mod common;
mod sqlite;
