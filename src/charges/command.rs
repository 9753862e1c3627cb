pub mod create_charge_cmd;
pub mod create_hold_cmd;
pub mod patron_charges_cmd;
pub mod return_charge_cmd;
