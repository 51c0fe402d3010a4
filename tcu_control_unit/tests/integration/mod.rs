pub mod harness;

mod adaptive;
mod commands;
mod drive_scenarios;
mod lockup;
