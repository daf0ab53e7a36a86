pub mod slashcommands;
