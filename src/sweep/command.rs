pub mod process_holds_cmd;
