pub mod block_color;
pub mod quadrant;
pub mod grid_position;
pub mod error;
pub mod shape_catalog;
pub mod config;
pub mod child_block;
pub mod block_unit;
pub mod unit_store;
pub mod board_grid;
pub mod board_context;
pub mod flow_event;
pub mod orchestrator;
pub mod level;
pub mod spawner;
pub mod generator;
